//! Session controller
//!
//! The orchestrating state machine. It owns the authoritative current
//! Document, the startup lists, the per-document sign-off summary and
//! the loading indicator; it reacts to selection changes by fetching
//! and replacing the Document wholesale, and to editor mutation
//! callbacks by merging the editor's full annotation set back in.
//!
//! Concurrency model: one logical thread of execution; "concurrency"
//! means overlapping in-flight fetches, not parallelism. Two hazards
//! are handled explicitly:
//!
//! - Stale responses: every issued fetch carries a monotonically
//!   increasing request generation. A response whose generation is no
//!   longer the latest issued one is discarded, never applied. The
//!   network call itself is not cancelled — only its effect.
//! - Loading flag: an in-flight counter, so overlapping operations
//!   never clear the indicator prematurely; it clears when the last
//!   outstanding operation settles.

use crate::gateway::{AnnotationStore, ChecksSummary};
use crate::persist::SelectionStore;
use annev_common::config::{SessionConfig, VersionSwitchPolicy};
use annev_common::events::{EventBus, SessionEvent};
use annev_common::model::{Annotation, Document, InitData, SelectionKey, PLACEHOLDER_TEXT};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

const EVENT_BUS_CAPACITY: usize = 100;

/// Why a selection is being applied; decides autosave and the
/// version-switch edit policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectionTrigger {
    Initialize,
    SelectDocument,
    SelectVersion,
}

#[derive(Default)]
struct SessionState {
    init: InitData,
    document: Document,
    checks: ChecksSummary,
}

/// The annotation review session
///
/// All state mutation goes through the operations below; embedding
/// code gets read access via the accessors and the event bus.
pub struct SessionController {
    store: Arc<dyn AnnotationStore>,
    config: SessionConfig,
    bus: EventBus,
    state: RwLock<SessionState>,
    /// Outstanding async operations; loading while > 0
    in_flight: AtomicU64,
    /// Latest issued fetch generation, for stale-response suppression
    request_seq: AtomicU64,
    selection_store: Option<SelectionStore>,
}

impl SessionController {
    pub fn new(store: Arc<dyn AnnotationStore>, config: SessionConfig) -> Arc<Self> {
        let selection_store = SelectionStore::from_config(&config);
        Arc::new(Self {
            store,
            config,
            bus: EventBus::new(EVENT_BUS_CAPACITY),
            state: RwLock::new(SessionState {
                document: Document::placeholder(),
                ..SessionState::default()
            }),
            in_flight: AtomicU64::new(0),
            request_seq: AtomicU64::new(0),
            selection_store,
        })
    }

    // ========================================
    // Read access
    // ========================================

    /// Snapshot of the current Document
    pub async fn document(&self) -> Document {
        self.state.read().await.document.clone()
    }

    /// Snapshot of the startup lists
    pub async fn init_data(&self) -> InitData {
        self.state.read().await.init.clone()
    }

    /// Snapshot of the per-document sign-off summary
    pub async fn checks(&self) -> ChecksSummary {
        self.state.read().await.checks.clone()
    }

    /// Whether any operation is still in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.bus.subscribe()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ========================================
    // Operations
    // ========================================

    /// Fetch the startup lists and the first page, and build the
    /// initial Document
    ///
    /// Tolerates either list being empty: the Document then stays at
    /// its placeholder state. A previously persisted selection is
    /// restored when it still refers to entries present in the lists.
    pub async fn initialize(&self) {
        self.begin_load();

        let (base_names, annotation_versions, checks) = tokio::join!(
            self.store.list_base_names(),
            self.store.list_versions(),
            self.store.fetch_checks()
        );
        let init = InitData {
            base_names,
            annotation_versions,
        };
        tracing::info!(
            base_names = init.base_names.len(),
            versions = init.annotation_versions.len(),
            "Initialized session lists"
        );
        self.bus.emit_lossy(SessionEvent::InitDataLoaded {
            base_name_count: init.base_names.len(),
            version_count: init.annotation_versions.len(),
            timestamp: Utc::now(),
        });

        let mut key = init.first_selection();
        if let Some(store) = &self.selection_store {
            if let Some(saved) = store.load() {
                if init.contains(&saved) {
                    tracing::debug!(key = %saved, "Restored persisted selection");
                    key = saved;
                }
            }
        }

        {
            let mut state = self.state.write().await;
            state.init = init;
            state.checks = checks;
        }
        self.emit_checks_refreshed().await;

        self.apply_selection(key, SelectionTrigger::Initialize).await;
        self.end_load();
    }

    /// Switch to another basename, holding the version constant
    ///
    /// The Document is replaced wholesale; in-memory annotation edits
    /// for the previous basename are discarded. Reselecting the
    /// current basename is safe and simply refetches.
    pub async fn select_document(&self, new_id: &str) {
        let version = self.state.read().await.document.version.clone();
        self.apply_selection(
            SelectionKey::new(new_id, version),
            SelectionTrigger::SelectDocument,
        )
        .await;
    }

    /// Switch to another annotation version, holding the basename
    /// constant
    ///
    /// Edit retention across the switch follows the configured
    /// [`VersionSwitchPolicy`].
    pub async fn select_version(&self, new_version: &str) {
        let id = self.state.read().await.document.id.clone();
        self.apply_selection(
            SelectionKey::new(id, new_version),
            SelectionTrigger::SelectVersion,
        )
        .await;
    }

    /// Merge the editor's full annotation set back into the Document
    ///
    /// Invoked by the editor adapter's event pump on every mutation
    /// event. Replace-only: never triggers a refetch.
    pub async fn record_annotations(&self, annotations: Vec<Annotation>) {
        let mut state = self.state.write().await;
        state.document = state.document.with_annotations(annotations);
        self.bus.emit_lossy(SessionEvent::AnnotationsRecorded {
            id: state.document.id.clone(),
            version: state.document.version.clone(),
            annotation_count: state.document.annotations.len(),
            timestamp: Utc::now(),
        });
    }

    /// Flip a reviewer's sign-off flag; purely local until `save`
    pub async fn toggle_judgment(&self, reviewer: &str) {
        let mut state = self.state.write().await;
        state.document = state.document.with_judgment_toggled(reviewer);
        let value = state.document.judgments.get(reviewer).copied().unwrap_or(false);
        self.bus.emit_lossy(SessionEvent::JudgmentToggled {
            reviewer: reviewer.to_string(),
            value,
            timestamp: Utc::now(),
        });
    }

    /// Persist the current annotation set and judgments
    ///
    /// Saving an empty set is a user-visible no-op (the server-side
    /// baseline is never clobbered by accident). After an accepted
    /// write the per-document sign-off summary is re-synchronized.
    pub async fn save(&self) {
        let doc = self.document().await;
        if doc.annotations.is_empty() {
            tracing::info!(id = %doc.id, version = %doc.version, "Nothing to save");
            self.bus.emit_lossy(SessionEvent::SaveSkippedEmpty {
                id: doc.id,
                version: doc.version,
                timestamp: Utc::now(),
            });
            return;
        }

        self.begin_load();
        if self.store.save_annotations(&doc).await {
            self.bus.emit_lossy(SessionEvent::AnnotationsSaved {
                id: doc.id,
                version: doc.version,
                annotation_count: doc.annotations.len(),
                timestamp: Utc::now(),
            });

            let checks = self.store.fetch_checks().await;
            self.state.write().await.checks = checks;
            self.emit_checks_refreshed().await;
        }
        self.end_load();
    }

    // ========================================
    // Internals
    // ========================================

    /// Fetch a selection key and replace the Document, discarding the
    /// result if a newer selection superseded this one meanwhile
    async fn apply_selection(&self, key: SelectionKey, trigger: SelectionTrigger) {
        if self.config.autosave_on_switch && trigger != SelectionTrigger::Initialize {
            self.save().await;
        }

        let seq = self.request_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.begin_load();
        tracing::debug!(key = %key, seq, "Issuing page fetch");

        let page = self.store.fetch_page(&key).await;

        // Compare against the latest issued generation, read fresh at
        // settle time
        if self.request_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(key = %key, seq, "Discarding stale page response");
            self.bus.emit_lossy(SessionEvent::StaleResponseDiscarded {
                id: key.id,
                version: key.version,
                timestamp: Utc::now(),
            });
            self.end_load();
            return;
        }

        let mut doc = Document::from_page(&key, page);
        if !key.is_complete() {
            doc.text = PLACEHOLDER_TEXT.to_string();
        }

        {
            let mut state = self.state.write().await;
            if trigger == SelectionTrigger::SelectVersion
                && self.config.version_switch == VersionSwitchPolicy::PreserveEditsIfTextUnchanged
                && state.document.id == doc.id
                && state.document.text == doc.text
            {
                doc = doc.with_annotations(state.document.annotations.clone());
            }

            tracing::info!(
                key = %key,
                annotation_count = doc.annotations.len(),
                "Replacing current document"
            );
            state.document = doc;
            self.bus.emit_lossy(SessionEvent::DocumentReplaced {
                id: state.document.id.clone(),
                version: state.document.version.clone(),
                annotation_count: state.document.annotations.len(),
                timestamp: Utc::now(),
            });
        }

        if key.is_complete() {
            if let Some(store) = &self.selection_store {
                store.save(&key);
            }
        }
        self.end_load();
    }

    async fn emit_checks_refreshed(&self) {
        let count = self.state.read().await.checks.len();
        self.bus.emit_lossy(SessionEvent::ChecksRefreshed {
            document_count: count,
            timestamp: Utc::now(),
        });
    }

    fn begin_load(&self) {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            self.bus.emit_lossy(SessionEvent::LoadingChanged {
                loading: true,
                timestamp: Utc::now(),
            });
        }
    }

    fn end_load(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.bus.emit_lossy(SessionEvent::LoadingChanged {
                loading: false,
                timestamp: Utc::now(),
            });
        }
    }
}
