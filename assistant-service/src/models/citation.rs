//! Output contract of the grounded-agent route.

use serde::{Deserialize, Serialize};

/// Normalized agent answer: `{"content": ..., "citations": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub content: String,
    pub citations: Vec<Citation>,
}

impl NormalizedResult {
    /// Pretty-printed JSON with two-space indentation.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A numbered source reference. Ids are 1-based and contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub id: u32,
    #[serde(flatten)]
    pub source: CitationSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CitationSource {
    File {
        quote: Option<String>,
    },
    Url {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
}
