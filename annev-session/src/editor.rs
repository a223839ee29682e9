//! Annotation editor adapter
//!
//! The external annotation editor is a stateful widget with its own
//! internal lifecycle: it is constructed against a content element,
//! renders and edits spans on its own, and reports mutations through
//! events that carry no reliable payload. This module owns exactly one
//! instance of it at a time and bridges it to the session controller.
//!
//! Lifecycle: `Unmounted → Mounting → Mounted → Unmounted`, re-entering
//! `Mounting` only on an explicit remount. The previous instance is
//! always destroyed before a new one is created, so two editors are
//! never bound to the same content element. Mount/configure runs once
//! per mount; Document changes only trigger the annotation push.

use crate::classify;
use crate::session::SessionController;
use annev_common::model::{Annotation, Document, SelectionKey, Vocabulary};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Fixed relation vocabulary handed to the editor
pub const RELATION_VOCABULARY: [&str; 3] = ["isRelated", "isPartOf", "isSameAs"];

/// Mutation events emitted by the editor instance
///
/// None of these carries a usable payload: on every event the adapter
/// re-reads the editor's full current annotation set and hands it to
/// the session controller as a replace-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    CreateAnnotation,
    DeleteAnnotation,
    UpdateAnnotation,
}

/// Label formatter applied by the editor as CSS classes
pub type Formatter = Arc<dyn Fn(&Annotation) -> String + Send + Sync>;

/// Editor sub-widgets enabled at construction
pub enum EditorWidget {
    Comment,
    Tag { vocabulary: Vocabulary },
}

/// Construction parameters of one editor instance
pub struct EditorConfig {
    /// Id of the content element the editor binds to
    pub content_element: String,
    pub locale: String,
    pub mode: String,
    pub widgets: Vec<EditorWidget>,
    pub relation_vocabulary: Vec<String>,
    pub formatter: Formatter,
}

/// One live editor instance
///
/// The adapter is the only caller; user code never touches the
/// instance directly.
pub trait AnnotationEditor: Send {
    /// Replace the displayed annotation set
    fn set_annotations(&mut self, annotations: &[Annotation]);

    /// The editor's full current annotation set (the authority on the
    /// live edit set at the moment of any mutation)
    fn get_annotations(&self) -> Vec<Annotation>;

    /// The instance's single mutation-event stream
    ///
    /// Called exactly once per instance, immediately after
    /// construction.
    fn take_events(&mut self) -> mpsc::UnboundedReceiver<EditorEvent>;

    /// Release the instance and its DOM bindings
    fn destroy(&mut self);
}

/// Builds editor instances; supplied by the embedding application
/// (or a scripted double in tests)
pub trait EditorFactory: Send + Sync {
    fn create(&self, config: EditorConfig) -> Box<dyn AnnotationEditor>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdapterState {
    Unmounted,
    Mounting,
    Mounted,
}

/// Owns the lifecycle of the external editor instance
pub struct EditorAdapter {
    factory: Box<dyn EditorFactory>,
    content_element: String,
    vocabulary: Vocabulary,
    state: AdapterState,
    editor: Option<Arc<Mutex<Box<dyn AnnotationEditor>>>>,
    pump: Option<JoinHandle<()>>,
    /// Annotations pushed while not mounted: deferred, not dropped
    pending: Option<Vec<Annotation>>,
    /// Identity of the Document whose annotations were last pushed
    bound_key: Option<SelectionKey>,
}

impl EditorAdapter {
    pub fn new(
        factory: Box<dyn EditorFactory>,
        content_element: impl Into<String>,
        vocabulary: Vocabulary,
    ) -> Self {
        Self {
            factory,
            content_element: content_element.into(),
            vocabulary,
            state: AdapterState::Unmounted,
            editor: None,
            pump: None,
            pending: None,
            bound_key: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.state == AdapterState::Mounted
    }

    /// Instantiate and configure the editor, exactly once per mount
    ///
    /// Spawns one event pump for the instance: every mutation event
    /// re-reads the editor's full annotation set and hands it to
    /// [`SessionController::record_annotations`]. A second `mount`
    /// without an intervening [`EditorAdapter::unmount`] is a guarded
    /// no-op.
    pub async fn mount(&mut self, session: Arc<SessionController>) {
        if self.state != AdapterState::Unmounted {
            tracing::warn!("Editor already mounted; ignoring mount request");
            return;
        }
        self.state = AdapterState::Mounting;

        let vocabulary = self.vocabulary.clone();
        let formatter: Formatter =
            Arc::new(move |annotation| classify::css_class(annotation, &vocabulary));

        let config = EditorConfig {
            content_element: self.content_element.clone(),
            locale: "auto".to_string(),
            mode: "pre".to_string(),
            widgets: vec![
                EditorWidget::Comment,
                EditorWidget::Tag {
                    vocabulary: self.vocabulary.clone(),
                },
            ],
            relation_vocabulary: RELATION_VOCABULARY.iter().map(|s| s.to_string()).collect(),
            formatter,
        };

        let mut instance = self.factory.create(config);
        let mut events = instance.take_events();
        let editor = Arc::new(Mutex::new(instance));
        self.editor = Some(editor.clone());

        self.pump = Some(tokio::spawn(async move {
            while events.recv().await.is_some() {
                // The event payload is unreliable; always re-read the
                // full set
                let annotations = editor.lock().await.get_annotations();
                session.record_annotations(annotations).await;
            }
        }));

        self.state = AdapterState::Mounted;
        tracing::debug!(content_element = %self.content_element, "Editor mounted");

        if let Some(annotations) = self.pending.take() {
            self.push(&annotations).await;
        }
    }

    /// Push a Document's annotations into the editor display when its
    /// identity changed
    ///
    /// Replace-all semantics. While unmounted or mounting, the push is
    /// deferred and flushed on mount completion. Pushes for an
    /// unchanged `(id, version)` are skipped: document content changes
    /// reported *by* the editor must not echo back into it.
    pub async fn sync_document(&mut self, doc: &Document) {
        let key = doc.selection_key();
        if self.bound_key.as_ref() == Some(&key) {
            return;
        }
        self.bound_key = Some(key);

        if self.state == AdapterState::Mounted {
            self.push(&doc.annotations).await;
        } else {
            tracing::debug!("Editor not mounted; deferring annotation push");
            self.pending = Some(doc.annotations.clone());
        }
    }

    async fn push(&self, annotations: &[Annotation]) {
        if let Some(editor) = &self.editor {
            editor.lock().await.set_annotations(annotations);
        }
    }

    /// Tear down the live instance
    ///
    /// Stops the event pump, then destroys the editor, so a following
    /// remount can never end up with duplicate event subscriptions or
    /// two instances bound to the same element. Safe to call while
    /// unmounted.
    pub async fn unmount(&mut self) {
        if self.state == AdapterState::Unmounted {
            return;
        }

        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Some(editor) = self.editor.take() {
            editor.lock().await.destroy();
        }

        self.pending = None;
        self.bound_key = None;
        self.state = AdapterState::Unmounted;
        tracing::debug!(content_element = %self.content_element, "Editor unmounted");
    }
}
