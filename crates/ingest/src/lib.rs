//! Document ingestion: turning files into page text and page text into
//! bounded-size segments.

pub mod chunker;
pub mod extract;

pub use chunker::{chunk_document, chunk_text};
pub use extract::PlainTextExtractor;
