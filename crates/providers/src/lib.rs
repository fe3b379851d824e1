//! Oracle implementations for DocRouter.
//!
//! The reasoning oracle implements `docrouter_core::Provider`; the embedding
//! oracle implements `docrouter_core::Embedder`. The router builds both from
//! configuration.

pub mod embedder;
pub mod openai_compat;
pub mod router;

pub use embedder::{HashEmbedder, ProviderEmbedder};
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_embedder, build_from_config, build_settings};
