//! # Annev Session Core
//!
//! The annotation review session: the state machine that owns the
//! currently displayed document, sequences the asynchronous backend
//! fetches triggered by selection changes, and keeps that state
//! synchronized in both directions with the externally-mounted
//! annotation editor.
//!
//! # Architecture
//!
//! - `gateway` — stateless async backend access (`AnnotationStore`
//!   trait + reqwest implementation); failures are swallowed into
//!   documented default values
//! - `classify` — pure tag-to-label classification with the
//!   `"ambiguous"` multi-tag sentinel
//! - `editor` — lifecycle adapter over the external annotation editor
//!   instance (mount / push / event pump / destroy)
//! - `session` — the orchestrating `SessionController`
//! - `persist` — best-effort last-selection state file
//!
//! Everything around this core (selector rendering, legend, styling,
//! application bootstrap) lives in the embedding application; it reads
//! session state through the controller's accessors and the event bus
//! and mutates only through the controller's operations.

pub mod classify;
pub mod editor;
pub mod gateway;
pub mod persist;
pub mod session;

pub use editor::{AnnotationEditor, EditorAdapter, EditorConfig, EditorEvent, EditorFactory};
pub use gateway::{AnnotationStore, HttpGateway};
pub use session::SessionController;
