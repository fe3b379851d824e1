//! # DocRouter Core
//!
//! Domain types, traits, and error definitions for the DocRouter document
//! agent. This crate has **no framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here: the reasoning oracle
//! ([`Provider`]), the embedding oracle ([`Embedder`]), text extraction
//! ([`TextExtractor`]) and callable capabilities ([`Tool`]). Implementations
//! live in their respective crates, so tests swap in scripted mocks.

pub mod document;
pub mod embedding;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod settings;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use document::{
    DocumentId, DocumentSource, ExtractedDocument, Page, Segment, SegmentMetadata, TextExtractor,
};
pub use embedding::Embedder;
pub use error::{
    ChunkingError, ExtractionError, IndexBuildError, ProviderError, ToolError,
};
pub use event::{DomainEvent, EventBus};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use settings::Settings;
pub use tool::{Tool, ToolResult};
