//! URL-style navigation for the shell.
//!
//! `/` is the landing page, `/builder` and `/builder/:templateId` open the
//! builder. A template id in the path is applied to the store only when it
//! names a known template; anything else is ignored.

use crate::store::ResumeStore;
use crate::templates::TemplateId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    /// `template` is the raw path segment, if one was given.
    Builder { template: Option<String> },
    NotFound(String),
}

impl Route {
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Home,
            ["builder"] => Route::Builder { template: None },
            ["builder", id] => Route::Builder {
                template: Some((*id).to_string()),
            },
            _ => Route::NotFound(path.to_string()),
        }
    }

    /// Applies the route's template parameter to `store`.
    ///
    /// Returns the template that was selected, if any.
    pub fn apply(&self, store: &mut ResumeStore) -> Option<TemplateId> {
        let Route::Builder {
            template: Some(raw),
        } = self
        else {
            return None;
        };
        match raw.parse::<TemplateId>() {
            Ok(id) => {
                store.select_template(id);
                Some(id)
            }
            Err(e) => {
                tracing::debug!("Ignoring route parameter: {e}");
                None
            }
        }
    }
}
