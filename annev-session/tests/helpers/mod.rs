//! Shared test doubles: an in-memory backend with scripted timing and
//! a scripted editor factory.

#![allow(dead_code)]

use annev_common::model::{
    Annotation, Body, Document, PageData, SavePayload, SelectionKey, Selector, Target,
};
use annev_session::editor::{AnnotationEditor, EditorConfig, EditorEvent, EditorFactory, Formatter};
use annev_session::gateway::{AnnotationStore, ChecksSummary};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

// ========================================
// Model builders
// ========================================

pub fn annotation(id: &str, tag: &str) -> Annotation {
    Annotation {
        context: Some("http://www.w3.org/ns/anno.jsonld".to_string()),
        id: id.to_string(),
        kind: "Annotation".to_string(),
        motivation: None,
        generated: None,
        generator: None,
        body: vec![Body::textual("tagging", tag)],
        target: Target {
            source: None,
            selector: vec![Selector::TextPositionSelector { start: 0, end: 4 }],
        },
    }
}

pub fn page(text: &str, annotations: Vec<Annotation>) -> PageData {
    PageData {
        text: text.to_string(),
        annotations,
        ..PageData::default()
    }
}

pub fn key(id: &str, version: &str) -> SelectionKey {
    SelectionKey::new(id, version)
}

// ========================================
// Backend double
// ========================================

/// In-memory `AnnotationStore` with per-operation call counters and
/// per-basename gates to control fetch resolution order
pub struct MockStore {
    base_names: Vec<String>,
    versions: Vec<String>,
    pages: Mutex<HashMap<SelectionKey, PageData>>,
    saved: Mutex<HashMap<SelectionKey, SavePayload>>,
    checks: Mutex<ChecksSummary>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    started: Mutex<HashSet<String>>,
    pub fetch_page_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
    pub checks_calls: AtomicUsize,
}

impl MockStore {
    pub fn new(base_names: &[&str], versions: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            base_names: base_names.iter().map(|s| s.to_string()).collect(),
            versions: versions.iter().map(|s| s.to_string()).collect(),
            pages: Mutex::new(HashMap::new()),
            saved: Mutex::new(HashMap::new()),
            checks: Mutex::new(ChecksSummary::new()),
            gates: Mutex::new(HashMap::new()),
            started: Mutex::new(HashSet::new()),
            fetch_page_calls: AtomicUsize::new(0),
            save_calls: AtomicUsize::new(0),
            checks_calls: AtomicUsize::new(0),
        })
    }

    pub fn insert_page(&self, key: SelectionKey, page: PageData) {
        self.pages.lock().unwrap().insert(key, page);
    }

    /// Make fetches for this basename block until [`MockStore::release`]
    pub fn gate(&self, id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(id.to_string(), gate.clone());
        gate
    }

    /// Whether a gated fetch for this basename has been issued and is
    /// now parked
    pub fn fetch_started(&self, id: &str) -> bool {
        self.started.lock().unwrap().contains(id)
    }

    pub fn release(&self, id: &str) {
        if let Some(gate) = self.gates.lock().unwrap().remove(id) {
            gate.notify_one();
        }
    }

    pub fn saved_payload(&self, key: &SelectionKey) -> Option<SavePayload> {
        self.saved.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl AnnotationStore for MockStore {
    async fn list_base_names(&self) -> Vec<String> {
        self.base_names.clone()
    }

    async fn list_versions(&self) -> Vec<String> {
        self.versions.clone()
    }

    async fn fetch_page(&self, key: &SelectionKey) -> PageData {
        self.fetch_page_calls.fetch_add(1, Ordering::SeqCst);
        if !key.is_complete() {
            return PageData::default();
        }

        let gate = self.gates.lock().unwrap().get(&key.id).cloned();
        if let Some(gate) = gate {
            self.started.lock().unwrap().insert(key.id.clone());
            gate.notified().await;
        }

        // A previous save shadows the scripted page, like a real
        // backend would
        let base = self.pages.lock().unwrap().get(key).cloned().unwrap_or_default();
        if let Some(saved) = self.saved.lock().unwrap().get(key).cloned() {
            return PageData {
                text: base.text,
                annotations: saved.annotations,
                checked: saved.checked,
                transkribus_url: base.transkribus_url,
            };
        }
        base
    }

    async fn save_annotations(&self, doc: &Document) -> bool {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if doc.annotations.is_empty() {
            return false;
        }
        self.saved
            .lock()
            .unwrap()
            .insert(doc.selection_key(), doc.save_payload());
        self.checks
            .lock()
            .unwrap()
            .insert(doc.id.clone(), doc.judgments.clone());
        true
    }

    async fn fetch_checks(&self) -> ChecksSummary {
        self.checks_calls.fetch_add(1, Ordering::SeqCst);
        self.checks.lock().unwrap().clone()
    }
}

// ========================================
// Editor double
// ========================================

/// Handle a test keeps on one created editor instance
#[derive(Clone)]
pub struct EditorProbe {
    pub events: mpsc::UnboundedSender<EditorEvent>,
    pub annotations: Arc<Mutex<Vec<Annotation>>>,
    pub destroyed: Arc<AtomicBool>,
    pub content_element: String,
    pub relation_vocabulary: Vec<String>,
    pub formatter: Formatter,
}

struct FakeEditor {
    annotations: Arc<Mutex<Vec<Annotation>>>,
    events: Option<mpsc::UnboundedReceiver<EditorEvent>>,
    destroyed: Arc<AtomicBool>,
    live: Arc<AtomicUsize>,
}

impl AnnotationEditor for FakeEditor {
    fn set_annotations(&mut self, annotations: &[Annotation]) {
        *self.annotations.lock().unwrap() = annotations.to_vec();
    }

    fn get_annotations(&self) -> Vec<Annotation> {
        self.annotations.lock().unwrap().clone()
    }

    fn take_events(&mut self) -> mpsc::UnboundedReceiver<EditorEvent> {
        self.events.take().expect("events stream taken once per instance")
    }

    fn destroy(&mut self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Factory double counting created and live instances
#[derive(Default)]
pub struct FakeFactory {
    pub created: Arc<AtomicUsize>,
    pub live: Arc<AtomicUsize>,
    pub probes: Arc<Mutex<Vec<EditorProbe>>>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Probe for the most recently created instance
///
/// Free function because the factory itself is boxed into the adapter;
/// tests keep the `probes` Arc from before the handoff.
pub fn last_probe(probes: &Arc<Mutex<Vec<EditorProbe>>>) -> EditorProbe {
    probes
        .lock()
        .unwrap()
        .last()
        .expect("an editor instance was created")
        .clone()
}

impl EditorFactory for FakeFactory {
    fn create(&self, config: EditorConfig) -> Box<dyn AnnotationEditor> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::unbounded_channel();
        let annotations = Arc::new(Mutex::new(Vec::new()));
        let destroyed = Arc::new(AtomicBool::new(false));

        self.probes.lock().unwrap().push(EditorProbe {
            events: tx,
            annotations: annotations.clone(),
            destroyed: destroyed.clone(),
            content_element: config.content_element.clone(),
            relation_vocabulary: config.relation_vocabulary.clone(),
            formatter: config.formatter.clone(),
        });

        Box::new(FakeEditor {
            annotations,
            events: Some(rx),
            destroyed,
            live: self.live.clone(),
        })
    }
}
