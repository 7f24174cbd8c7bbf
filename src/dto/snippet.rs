use serde::Deserialize;

use crate::middleware::CsrfField;

pub const FIELD_TITLE: &str = "title";
pub const FIELD_CONTENT: &str = "content";
pub const FIELD_EXPIRES: &str = "expires";

/// Body of `POST /snippet/create`. A missing or non-numeric `expires` fails
/// decoding and is answered with 400; any 64-bit integer decodes and is left
/// to validation.
#[derive(Debug, Clone, Deserialize)]
pub struct SnippetCreateForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub expires: i64,
    #[serde(default)]
    pub csrf_token: String,
}

impl Default for SnippetCreateForm {
    /// Blank form with the one-year expiry preselected.
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: 365,
            csrf_token: String::new(),
        }
    }
}

impl CsrfField for SnippetCreateForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}
