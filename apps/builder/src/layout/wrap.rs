//! Greedy word-wrap against measured glyph widths.
//!
//! Explicit newlines are honoured first (blank lines survive), then words are
//! packed onto a line until the next one would overflow `max_width`. A single
//! word wider than the line is broken between characters so that every
//! returned line measures at most `max_width`.

use crate::errors::EmissionError;
use crate::layout::font_metrics::{get_metrics, FontFace};

/// Wraps `text` to lines no wider than `max_width` at the given face and size.
///
/// Whitespace-only input yields no lines.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    face: FontFace,
    size: f32,
) -> Result<Vec<String>, EmissionError> {
    if !(max_width > 0.0) {
        return Err(EmissionError::Geometry(format!(
            "wrap width must be positive, got {max_width}"
        )));
    }
    let metrics = get_metrics(face);
    wrap_with(text, max_width, |s| metrics.measure_str(s, size))
}

/// Same packing as `wrap_text`, with widths supplied by `measure`.
///
/// `max_width` must be positive; the caller owns that check so it can report
/// it in its own error type.
pub fn wrap_with<E, M>(text: &str, max_width: f32, measure: M) -> Result<Vec<String>, E>
where
    M: Fn(&str) -> Result<f32, E>,
{
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let space_w = measure(" ")?;
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in words {
            let word_w = measure(word)?;

            if word_w > max_width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut pieces = break_word(word, max_width, &measure)?;
                // The tail of a broken word can still take following words.
                if let Some((tail, tail_w)) = pieces.pop() {
                    lines.extend(pieces.into_iter().map(|(piece, _)| piece));
                    current = tail;
                    current_width = tail_w;
                }
            } else if current.is_empty() {
                current.push_str(word);
                current_width = word_w;
            } else if current_width + space_w + word_w > max_width {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += space_w + word_w;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    Ok(lines)
}

/// Splits an over-long word into pieces that each fit `max_width`.
fn break_word<E, M>(word: &str, max_width: f32, measure: &M) -> Result<Vec<(String, f32)>, E>
where
    M: Fn(&str) -> Result<f32, E>,
{
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_w = 0.0_f32;

    for c in word.chars() {
        let mut buf = [0u8; 4];
        let cw = measure(c.encode_utf8(&mut buf))?;
        if !piece.is_empty() && piece_w + cw > max_width {
            pieces.push((std::mem::take(&mut piece), piece_w));
            piece_w = 0.0;
        }
        piece.push(c);
        piece_w += cw;
    }
    if !piece.is_empty() {
        pieces.push((piece, piece_w));
    }
    Ok(pieces)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
