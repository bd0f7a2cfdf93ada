//! Normalizes agent transcripts into the `{content, citations}` contract.
//!
//! Everything in here is a pure function of the fetched transcript, so it is
//! safe to call from any number of requests concurrently.

use crate::models::{
    Annotation, ChatRole, Citation, CitationSource, NormalizedResult, Transcript,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Reply rendered when the transcript holds no assistant answer.
pub const NO_RESPONSE: &str = "No response from agent";

/// Inline markers such as `【3:0†source】` that the agent weaves into its text.
static CITATION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"【\d+:\d+†[^】]+】").expect("citation marker pattern is valid"));

/// Outcome of normalizing one transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    Answer(NormalizedResult),
    NoResponse,
}

impl AgentReply {
    /// Render the reply in the form handed back to callers.
    pub fn render(&self) -> String {
        match self {
            AgentReply::Answer(result) => match result.to_pretty_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize normalized result");
                    format!("Error processing request: {}", e)
                }
            },
            AgentReply::NoResponse => NO_RESPONSE.to_string(),
        }
    }
}

/// Pick the latest assistant answer and normalize it.
///
/// The newest assistant turn carrying any text wins, and within it the last
/// text segment is the canonical message.
pub fn normalize(transcript: &Transcript) -> AgentReply {
    let segment = transcript
        .turns
        .iter()
        .rev()
        .filter(|turn| turn.role == ChatRole::Assistant)
        .find_map(|turn| turn.segments.last());

    let Some(segment) = segment else {
        return AgentReply::NoResponse;
    };

    AgentReply::Answer(NormalizedResult {
        content: strip_citation_markers(&segment.value),
        citations: extract_citations(&segment.annotations),
    })
}

/// Remove inline citation markers and trim surrounding whitespace.
pub fn strip_citation_markers(text: &str) -> String {
    CITATION_MARKER.replace_all(text, "").trim().to_string()
}

/// Build numbered citations in annotation order, skipping unknown shapes.
pub fn extract_citations(annotations: &[Annotation]) -> Vec<Citation> {
    let mut citations = Vec::with_capacity(annotations.len());

    for annotation in annotations {
        let source = match annotation {
            Annotation::FileCitation { quote } => CitationSource::File {
                quote: quote.clone(),
            },
            Annotation::UrlCitation { url, title } => CitationSource::Url {
                url: url.clone(),
                title: Some(title.clone().unwrap_or_else(|| url.clone())),
            },
            Annotation::BareUrl { url } => CitationSource::Url {
                url: url.clone(),
                title: None,
            },
            Annotation::Unknown => {
                tracing::debug!("Skipping annotation with no citation data");
                continue;
            }
        };

        citations.push(Citation {
            id: citations.len() as u32 + 1,
            source,
        });
    }

    citations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TextSegment, Turn};

    fn url(url: &str, title: Option<&str>) -> Annotation {
        Annotation::UrlCitation {
            url: url.to_string(),
            title: title.map(str::to_string),
        }
    }

    #[test]
    fn test_strips_marker_from_answer() {
        let transcript = Transcript::new(vec![
            Turn::text(ChatRole::User, "hi"),
            Turn::text(ChatRole::Assistant, "Paris【3:0†source】"),
        ]);

        let reply = normalize(&transcript);
        assert_eq!(
            reply,
            AgentReply::Answer(NormalizedResult {
                content: "Paris".to_string(),
                citations: vec![],
            })
        );
    }

    #[test]
    fn test_url_citation_is_numbered_from_one() {
        let transcript = Transcript::new(vec![
            Turn::text(ChatRole::User, "capital of france?"),
            Turn::new(
                ChatRole::Assistant,
                vec![TextSegment::new(
                    "Paris【3:0†source】",
                    vec![url("https://x.test", Some("X"))],
                )],
            ),
        ]);

        let AgentReply::Answer(result) = normalize(&transcript) else {
            panic!("expected an answer");
        };
        assert_eq!(
            result.citations,
            vec![Citation {
                id: 1,
                source: CitationSource::Url {
                    url: "https://x.test".to_string(),
                    title: Some("X".to_string()),
                },
            }]
        );
    }

    #[test]
    fn test_no_assistant_turn() {
        let transcript = Transcript::new(vec![Turn::text(ChatRole::User, "hi")]);
        let reply = normalize(&transcript);

        assert_eq!(reply, AgentReply::NoResponse);
        assert_eq!(reply.render(), "No response from agent");
        assert_eq!(normalize(&Transcript::default()), AgentReply::NoResponse);
    }

    #[test]
    fn test_assistant_turn_without_text_is_passed_over() {
        let transcript = Transcript::new(vec![
            Turn::text(ChatRole::Assistant, "older answer"),
            Turn::text(ChatRole::User, "follow up"),
            Turn::new(ChatRole::Assistant, vec![]),
        ]);

        let AgentReply::Answer(result) = normalize(&transcript) else {
            panic!("expected an answer");
        };
        assert_eq!(result.content, "older answer");
    }

    #[test]
    fn test_last_segment_of_turn_is_used() {
        let transcript = Transcript::new(vec![Turn::new(
            ChatRole::Assistant,
            vec![
                TextSegment::plain("draft"),
                TextSegment::new("final", vec![url("https://x.test", None)]),
            ],
        )]);

        let AgentReply::Answer(result) = normalize(&transcript) else {
            panic!("expected an answer");
        };
        assert_eq!(result.content, "final");
        assert_eq!(result.citations.len(), 1);
    }

    #[test]
    fn test_strip_removes_every_marker() {
        let markers = ["【3:0†source】", "【12:7†Wikipedia page】"];
        let text = format!(
            "Paris{} is the capital{} of France.",
            markers[0], markers[1]
        );

        let stripped = strip_citation_markers(&text);
        assert_eq!(stripped, "Paris is the capital of France.");
        assert!(!CITATION_MARKER.is_match(&stripped));
        let removed: usize = markers.iter().map(|m| m.len()).sum();
        assert_eq!(stripped.len(), text.len() - removed);
    }

    #[test]
    fn test_strip_trims_boundary_whitespace() {
        assert_eq!(
            strip_citation_markers("  Answer. 【1:2†a】\n"),
            "Answer."
        );
    }

    #[test]
    fn test_strip_is_idempotent_on_clean_text() {
        let clean = "Nothing to remove here [1] (2:3) 【not a marker】";
        assert_eq!(strip_citation_markers(clean), clean);
        let once = strip_citation_markers("A【1:1†x】B");
        assert_eq!(strip_citation_markers(&once), once);
    }

    #[test]
    fn test_strip_keeps_malformed_markers() {
        assert_eq!(strip_citation_markers("a【1:x†s】b"), "a【1:x†s】b");
        assert_eq!(strip_citation_markers("a【1:2†】b"), "a【1:2†】b");
    }

    #[test]
    fn test_unknown_annotations_do_not_consume_ids() {
        let annotations = vec![
            Annotation::Unknown,
            Annotation::FileCitation {
                quote: Some("q".to_string()),
            },
            Annotation::Unknown,
            url("https://x.test", None),
            Annotation::BareUrl {
                url: "https://y.test".to_string(),
            },
            Annotation::Unknown,
        ];

        let citations = extract_citations(&annotations);
        let ids: Vec<u32> = citations.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(
            citations[0].source,
            CitationSource::File {
                quote: Some("q".to_string())
            }
        );
        assert_eq!(
            citations[1].source,
            CitationSource::Url {
                url: "https://x.test".to_string(),
                title: Some("https://x.test".to_string()),
            }
        );
        assert_eq!(
            citations[2].source,
            CitationSource::Url {
                url: "https://y.test".to_string(),
                title: None,
            }
        );
    }

    #[test]
    fn test_render_answer_is_json() {
        let reply = AgentReply::Answer(NormalizedResult {
            content: "Paris".to_string(),
            citations: vec![],
        });

        let rendered = reply.render();
        let parsed: NormalizedResult = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed.content, "Paris");
        assert!(rendered.starts_with("{\n  \"content\""));
    }
}
