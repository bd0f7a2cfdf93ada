//! Domain models for the assistant service.

pub mod chat;
pub mod citation;
pub mod embedding;
pub mod transcript;

pub use chat::{ChatCompletion, ChatMessage, ChatRequest, ChatRole, CompletionQuery};
pub use citation::{Citation, CitationSource, NormalizedResult};
pub use embedding::Embeddings;
pub use transcript::{Annotation, AnnotationPayload, TextSegment, Transcript, Turn};
