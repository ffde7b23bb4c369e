//! Static font-metric tables for the PDF base-14 faces used by the templates.
//!
//! Widths are in 1/1000 em, taken from the Adobe AFM files, so measuring with
//! them matches what a PDF viewer draws for the non-embedded standard fonts.
//! Text is encoded as WinAnsi (CP1252): ASCII comes from the tables, a handful
//! of typographic extras have explicit widths, and the Latin-1 supplement
//! falls back to `average_char_width`. Anything else cannot be drawn with a
//! base-14 font and is reported as an `EmissionError`.
//!
//! ASCII table index = (char as usize) - 32.

use serde::{Deserialize, Serialize};

use crate::errors::EmissionError;

// ────────────────────────────────────────────────────────────────────────────
// Font face enum
// ────────────────────────────────────────────────────────────────────────────

/// Standard PDF faces available to the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFace {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
}

impl FontFace {
    pub const ALL: [FontFace; 4] = [
        FontFace::Helvetica,
        FontFace::HelveticaBold,
        FontFace::TimesRoman,
        FontFace::TimesBold,
    ];

    /// The PostScript name written into the PDF `/BaseFont` entry.
    pub fn base_font(&self) -> &'static str {
        match self {
            FontFace::Helvetica => "Helvetica",
            FontFace::HelveticaBold => "Helvetica-Bold",
            FontFace::TimesRoman => "Times-Roman",
            FontFace::TimesBold => "Times-Bold",
        }
    }

    /// Resource name used inside page content streams.
    pub fn resource_name(&self) -> &'static str {
        match self {
            FontFace::Helvetica => "F1",
            FontFace::HelveticaBold => "F2",
            FontFace::TimesRoman => "F3",
            FontFace::TimesBold => "F4",
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(self, FontFace::HelveticaBold | FontFace::TimesBold)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a font face.
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    pub face: FontFace,
    widths: [u16; 95],
    /// Widths for € … ‘ ’ “ ” • – — ™, in `WINANSI_EXTRAS` order.
    extras: [u16; 10],
    /// Fallback for the Latin-1 supplement (U+00A0..=U+00FF).
    pub average_char_width: u16,
}

/// Non-ASCII characters outside Latin-1 that WinAnsi still encodes, with their byte.
const WINANSI_EXTRAS: [(char, u8); 10] = [
    ('€', 0x80),
    ('…', 0x85),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('™', 0x99),
];

impl FontMetricTable {
    /// Width of one character in 1/1000 em, or an error if the face cannot draw it.
    pub fn char_units(&self, c: char) -> Result<u16, EmissionError> {
        let code = c as u32;
        if (32..=126).contains(&code) {
            return Ok(self.widths[(code - 32) as usize]);
        }
        if let Some(i) = WINANSI_EXTRAS.iter().position(|(ch, _)| *ch == c) {
            return Ok(self.extras[i]);
        }
        if (0xA0..=0xFF).contains(&code) {
            return Ok(self.average_char_width);
        }
        Err(self.unsupported(c))
    }

    /// Measures the rendered width of a string at `size` (result is in the same unit as `size`).
    pub fn measure_str(&self, s: &str, size: f32) -> Result<f32, EmissionError> {
        let mut units: u32 = 0;
        for c in s.chars() {
            units += u32::from(self.char_units(c)?);
        }
        Ok(units as f32 / 1000.0 * size)
    }

    /// Encodes a string to the single-byte WinAnsi form written into content streams.
    pub fn encode(&self, s: &str) -> Result<Vec<u8>, EmissionError> {
        s.chars()
            .map(|c| {
                let code = c as u32;
                if (32..=126).contains(&code) || (0xA0..=0xFF).contains(&code) {
                    Ok(code as u8)
                } else {
                    WINANSI_EXTRAS
                        .iter()
                        .find(|(ch, _)| *ch == c)
                        .map(|(_, b)| *b)
                        .ok_or_else(|| self.unsupported(c))
                }
            })
            .collect()
    }

    fn unsupported(&self, c: char) -> EmissionError {
        EmissionError::UnsupportedChar {
            ch: c,
            code: c as u32,
            font: self.face.base_font(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    face: FontFace::Helvetica,
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {    |    }    ~
        334, 260, 334, 584,
    ],
    extras: [556, 1000, 222, 222, 333, 333, 350, 556, 1000, 1000],
    average_char_width: 556,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    face: FontFace::HelveticaBold,
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        333, 333, 584, 584, 584, 611, 975,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 584, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        // {    |    }    ~
        389, 280, 389, 584,
    ],
    extras: [556, 1000, 278, 278, 500, 500, 350, 556, 1000, 1000],
    average_char_width: 611,
};

static TIMES_ROMAN_TABLE: FontMetricTable = FontMetricTable {
    face: FontFace::TimesRoman,
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
        // 0    1    2    3    4    5    6    7    8    9
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        // :    ;    <    =    >    ?    @
        278, 278, 564, 564, 564, 444, 921,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 469, 500, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
        // {    |    }    ~
        480, 200, 480, 541,
    ],
    extras: [500, 1000, 333, 333, 444, 444, 350, 500, 1000, 980],
    average_char_width: 500,
};

static TIMES_BOLD_TABLE: FontMetricTable = FontMetricTable {
    face: FontFace::TimesBold,
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %     &    '    (    )    *    +    ,    -    .    /
        250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
        // 0    1    2    3    4    5    6    7    8    9
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        // :    ;    <    =    >    ?    @
        333, 333, 570, 570, 570, 500, 930,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
        // N    O    P    Q    R    S    T    U    V    W     X    Y    Z
        722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
        // [    \    ]    ^    _    `
        333, 278, 333, 581, 500, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
        // {    |    }    ~
        394, 220, 394, 520,
    ],
    extras: [500, 1000, 333, 333, 500, 500, 350, 500, 1000, 1000],
    average_char_width: 556,
};

/// Returns the static metric table for a given face.
pub fn get_metrics(face: FontFace) -> &'static FontMetricTable {
    match face {
        FontFace::Helvetica => &HELVETICA_TABLE,
        FontFace::HelveticaBold => &HELVETICA_BOLD_TABLE,
        FontFace::TimesRoman => &TIMES_ROMAN_TABLE,
        FontFace::TimesBold => &TIMES_BOLD_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
