//! Conversation transcripts returned by the agent-run provider.
//!
//! A transcript is read once per grounded request and never persisted. Raw
//! annotation payloads are classified into [`Annotation`] variants as soon as
//! they are ingested, so nothing downstream has to probe for optional fields.

use crate::models::ChatRole;
use serde::Deserialize;

/// Ordered turns of one conversation thread, most recent last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub turns: Vec<Turn>,
}

impl Transcript {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}

/// A single message in the thread.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: ChatRole,
    pub segments: Vec<TextSegment>,
}

impl Turn {
    pub fn new(role: ChatRole, segments: Vec<TextSegment>) -> Self {
        Self { role, segments }
    }

    /// Turn with a single plain-text segment.
    pub fn text(role: ChatRole, value: impl Into<String>) -> Self {
        Self::new(role, vec![TextSegment::plain(value)])
    }
}

/// Text content of a turn along with its citation attachments.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    pub value: String,
    pub annotations: Vec<Annotation>,
}

impl TextSegment {
    pub fn new(value: impl Into<String>, annotations: Vec<Annotation>) -> Self {
        Self {
            value: value.into(),
            annotations,
        }
    }

    pub fn plain(value: impl Into<String>) -> Self {
        Self::new(value, Vec::new())
    }
}

/// Citation attachment on a text segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Excerpt quoted from an uploaded file.
    FileCitation { quote: Option<String> },
    /// Web source with an optional page title.
    UrlCitation { url: String, title: Option<String> },
    /// Web source carried as a bare `url` field.
    BareUrl { url: String },
    /// Shape we cannot extract anything from.
    Unknown,
}

/// Annotation exactly as the provider serializes it.
///
/// Providers emit several shapes (`file_citation`, `url_citation`, or a bare
/// `url`), discriminated only by which fields are populated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotationPayload {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub file_citation: Option<FileCitationPayload>,
    #[serde(default)]
    pub url_citation: Option<UrlCitationPayload>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileCitationPayload {
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub quote: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlCitationPayload {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl From<AnnotationPayload> for Annotation {
    /// File citations win over URL citations, which win over bare URLs.
    fn from(payload: AnnotationPayload) -> Self {
        if let Some(file) = payload.file_citation {
            return Annotation::FileCitation { quote: file.quote };
        }

        if let Some(UrlCitationPayload {
            url: Some(url),
            title,
        }) = payload.url_citation
        {
            if !url.is_empty() {
                return Annotation::UrlCitation { url, title };
            }
        }

        match payload.url {
            Some(url) if !url.is_empty() => Annotation::BareUrl { url },
            _ => Annotation::Unknown,
        }
    }
}
