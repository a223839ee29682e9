//! Data model for the annotation review session
//!
//! The wire shapes follow the W3C Web Annotation model as produced by
//! the embedded span-annotation editor, plus the backend's page payload.
//! `Document` is the in-memory unit of work owned by the session
//! controller; it is always replaced wholesale when its `(id, version)`
//! identity changes, and every transition builds a new value instead of
//! mutating shared state in place.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Text shown while no document is selected (or none is available)
pub const PLACEHOLDER_TEXT: &str = "Please select a text (and version)";

// ========================================
// Annotation (W3C Web Annotation shape)
// ========================================

/// A single span-level markup object attached to a Document's text
///
/// Created and edited exclusively by the external annotation editor;
/// the session controller treats it as opaque payload and only
/// delegates tag extraction to the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// JSON-LD context, e.g. `http://www.w3.org/ns/anno.jsonld`
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Annotation id, unique within its Document
    pub id: String,

    /// Annotation type (`"Annotation"` on the wire)
    #[serde(rename = "type")]
    pub kind: String,

    /// Motivation, when the editor supplies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,

    /// Creation timestamp supplied by the editor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated: Option<DateTime<Utc>>,

    /// Identity of the generating tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<Generator>,

    /// Ordered annotation bodies (tags, comments)
    #[serde(default)]
    pub body: Vec<Body>,

    /// The addressed span of the owning Document's text
    pub target: Target,
}

/// Tool identity attached to an annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One annotation body: a tag, comment, or other purposed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(rename = "type")]
    pub kind: String,

    /// Distinguishes `"tagging"` bodies from `"commenting"` ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    #[serde(default)]
    pub value: String,
}

impl Body {
    /// Convenience constructor for a `TextualBody` with a purpose
    pub fn textual(purpose: &str, value: &str) -> Self {
        Self {
            kind: "TextualBody".to_string(),
            purpose: Some(purpose.to_string()),
            value: value.to_string(),
        }
    }
}

/// Annotation target: source reference plus ordered selectors
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Target {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default)]
    pub selector: Vec<Selector>,
}

/// Span selector, discriminated by its `type` field on the wire
///
/// `TextPositionSelector` offsets address a substring of the owning
/// Document's `text`; `TextQuoteSelector` carries the matched snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Selector {
    TextQuoteSelector {
        exact: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        suffix: Option<String>,
    },
    TextPositionSelector {
        start: usize,
        end: usize,
    },
}

// ========================================
// Selection key
// ========================================

/// The `(id, version)` pair identifying which Document a fetch was
/// issued for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SelectionKey {
    /// Document basename (stable string key)
    pub id: String,
    /// Annotation version, e.g. `"exp9"`
    pub version: String,
}

impl SelectionKey {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }

    /// Both halves present: a fetch for this key may touch the network
    pub fn is_complete(&self) -> bool {
        !self.id.is_empty() && !self.version.is_empty()
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.id, self.version)
    }
}

// ========================================
// Wire payloads
// ========================================

/// Response shape of `GET /pagedata/{id}/{version}`
///
/// `Default` is the documented empty payload that the gateway
/// substitutes for failed or short-circuited fetches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub annotations: Vec<Annotation>,

    /// Per-reviewer sign-off flags, keyed by reviewer name
    #[serde(default)]
    pub checked: BTreeMap<String, bool>,

    /// Link into the external page viewer, when the backend has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transkribus_url: Option<String>,
}

/// Request body of `PUT /annotations/{id}/{version}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavePayload {
    pub annotations: Vec<Annotation>,
    pub checked: BTreeMap<String, bool>,
}

/// Startup lists: available basenames and annotation versions
///
/// Read-only after `initialize()` except for full replacement on
/// refetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitData {
    pub base_names: Vec<String>,
    pub annotation_versions: Vec<String>,
}

impl InitData {
    /// First basename/version from each list; empty halves where a
    /// list is empty (yielding an incomplete key and the placeholder
    /// Document downstream)
    pub fn first_selection(&self) -> SelectionKey {
        SelectionKey::new(
            self.base_names.first().cloned().unwrap_or_default(),
            self.annotation_versions.first().cloned().unwrap_or_default(),
        )
    }

    /// Whether a (restored) selection refers to entries that actually
    /// exist in both lists
    pub fn contains(&self, key: &SelectionKey) -> bool {
        self.base_names.iter().any(|b| *b == key.id)
            && self.annotation_versions.iter().any(|v| *v == key.version)
    }
}

// ========================================
// Document
// ========================================

/// The in-memory unit of work: one text, one version, its annotation
/// set and reviewer judgments
///
/// `(id, version)` uniquely identifies the persisted text and
/// annotation baseline; `annotations` may diverge from that baseline
/// until an explicit save. A Document is replaced wholesale whenever
/// its identity changes: annotations never carry over across a
/// different `(id, version)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub version: String,

    /// Immutable plain text, rendered read-only
    pub text: String,

    /// Live annotation set; the editor is the source of truth for it
    /// between fetches
    pub annotations: Vec<Annotation>,

    /// Reviewer-name → accept flag, iterated generically so new
    /// reviewers never reshape this type
    pub judgments: BTreeMap<String, bool>,

    /// Link into the external page viewer, when available
    pub external_viewer_url: Option<String>,
}

impl Document {
    /// The empty-session Document shown before any selection resolves
    pub fn placeholder() -> Self {
        Self {
            text: PLACEHOLDER_TEXT.to_string(),
            ..Self::default()
        }
    }

    /// Build a fresh Document from a fetched page, adopting the key it
    /// was fetched for
    pub fn from_page(key: &SelectionKey, page: PageData) -> Self {
        Self {
            id: key.id.clone(),
            version: key.version.clone(),
            text: page.text,
            annotations: page.annotations,
            judgments: page.checked,
            external_viewer_url: page.transkribus_url,
        }
    }

    pub fn selection_key(&self) -> SelectionKey {
        SelectionKey::new(self.id.clone(), self.version.clone())
    }

    /// Transition: replace the annotation set, keeping identity, text
    /// and judgments
    pub fn with_annotations(&self, annotations: Vec<Annotation>) -> Self {
        Self {
            annotations,
            ..self.clone()
        }
    }

    /// Transition: flip one reviewer's sign-off flag (absent counts as
    /// `false`, so the first toggle sets it)
    pub fn with_judgment_toggled(&self, reviewer: &str) -> Self {
        let mut next = self.clone();
        let flag = next.judgments.entry(reviewer.to_string()).or_insert(false);
        *flag = !*flag;
        next
    }

    /// The persistence payload for this Document's current state
    pub fn save_payload(&self) -> SavePayload {
        SavePayload {
            annotations: self.annotations.clone(),
            checked: self.judgments.clone(),
        }
    }
}

// ========================================
// Vocabulary
// ========================================

/// One allowed tag label with its controlled-vocabulary reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub label: String,
    pub uri: String,
}

/// Fixed list of allowed tag labels, process-wide and read-only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    entries: Vec<VocabularyEntry>,
}

impl Vocabulary {
    pub fn new(entries: Vec<VocabularyEntry>) -> Self {
        Self { entries }
    }

    /// The review tool's builtin Getty AAT tag list
    pub fn builtin() -> &'static Vocabulary {
        static BUILTIN: Lazy<Vocabulary> = Lazy::new(|| {
            let entries = [
                ("firstname", "http://vocab.getty.edu/aat/300404651?"),
                ("familyname", "http://vocab.getty.edu/aat/300008347?"),
                ("person", "http://vocab.getty.edu/aat/300024979"),
                ("occupation", "http://vocab.getty.edu/aat/300263369?"),
                ("material", "http://vocab.getty.edu/aat/300010358"),
                ("property", "http://vocab.getty.edu/aat/300008347"),
                ("object", "http://vocab.getty.edu/aat/300311889"),
                ("picture", "http://vocab.getty.edu/aat/300008347"),
                ("animal", "http://vocab.getty.edu/aat/300008347"),
                ("currency", "http://vocab.getty.edu/aat/300037316"),
                ("country", "http://vocab.getty.edu/aat/300008347?"),
                ("region", "http://vocab.getty.edu/aat/300182722?"),
                ("streetname", "http://vocab.getty.edu/aat/300008347?"),
                ("room", "http://vocab.getty.edu/aat/300008347"),
                ("category", "http://vocab.getty.edu/aat/300008347"),
                ("quantifier", "http://vocab.getty.edu/aat/300008347"),
            ];
            Vocabulary::new(
                entries
                    .iter()
                    .map(|(label, uri)| VocabularyEntry {
                        label: label.to_string(),
                        uri: uri.to_string(),
                    })
                    .collect(),
            )
        });
        &BUILTIN
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.entries.iter().any(|e| e.label == label)
    }
}

// ========================================
// Tests
// ========================================
