//! # Annev Common Library
//!
//! Shared code for the annotation review session core:
//! - Data model (Document, Annotation, Vocabulary, InitData)
//! - Session event types (SessionEvent enum) and EventBus
//! - Configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod model;

pub use error::{Error, Result};
pub use model::{Annotation, Document, InitData, PageData, SelectionKey, Vocabulary};
