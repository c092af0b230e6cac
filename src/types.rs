//! Core types for draftline

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};

/// Opaque, stable identifier of a saved record
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one asynchronous request issued by the pipeline
///
/// Results carry the token of the request that produced them and are only
/// applied while that token is still the session's active request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(pub u64);

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One outline section: a heading plus the points it should cover
///
/// Serialized with the wire names the model is asked to produce
/// (`section`, `subsections`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section heading, unique within its outline
    #[serde(rename = "section")]
    pub heading: String,

    /// Sub-topics the section body should cover
    #[serde(rename = "subsections", default)]
    pub bullets: Vec<String>,
}

impl Section {
    /// Create a section
    pub fn new(heading: impl Into<String>, bullets: Vec<String>) -> Self {
        Self {
            heading: heading.into(),
            bullets,
        }
    }
}

/// Structured article outline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    /// Article title
    pub title: String,

    /// Sections in article order
    #[serde(rename = "outline")]
    pub sections: Vec<Section>,
}

impl Outline {
    /// Create an outline
    pub fn new(title: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            title: title.into(),
            sections,
        }
    }

    /// Look up a section by heading
    pub fn section(&self, heading: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.heading == heading)
    }

    /// Section headings in outline order
    pub fn headings(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.heading.as_str())
    }

    /// Check the invariants an accepted outline must hold
    ///
    /// The title must be non-blank, there must be at least one section, and
    /// headings must be unique because they key generated content.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("outline title is empty".to_string()));
        }
        if self.sections.is_empty() {
            return Err(Error::Validation("outline has no sections".to_string()));
        }
        let mut seen = HashSet::with_capacity(self.sections.len());
        for section in &self.sections {
            if !seen.insert(section.heading.as_str()) {
                return Err(Error::Validation(format!(
                    "duplicate section heading '{}'",
                    section.heading
                )));
            }
        }
        Ok(())
    }
}

/// Generated body text keyed by section heading
///
/// Entries keep insertion order. Assembly always walks the outline, so this
/// order only matters for what gets stored with a saved article.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleContent(IndexMap<String, String>);

impl ArticleContent {
    /// Create empty content
    pub fn new() -> Self {
        Self::default()
    }

    /// Body for a heading, if one has been generated
    pub fn get(&self, heading: &str) -> Option<&str> {
        self.0.get(heading).map(String::as_str)
    }

    /// Whether a heading has an entry
    pub fn contains(&self, heading: &str) -> bool {
        self.0.contains_key(heading)
    }

    /// Set the body for a heading, replacing any previous value in place
    pub fn insert(&mut self, heading: impl Into<String>, body: impl Into<String>) {
        self.0.insert(heading.into(), body.into());
    }

    /// Remove a heading's entry, keeping the order of the others
    pub fn remove(&mut self, heading: &str) -> Option<String> {
        self.0.shift_remove(heading)
    }

    /// Number of sections with content
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no section has content yet
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(heading, body)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Convert into the stored `{section, content}` sequence
    pub fn to_parts(&self) -> Vec<ArticleContentPart> {
        self.0
            .iter()
            .map(|(section, content)| ArticleContentPart {
                section: section.clone(),
                content: content.clone(),
            })
            .collect()
    }

    /// Rebuild from a stored `{section, content}` sequence
    pub fn from_parts(parts: &[ArticleContentPart]) -> Self {
        Self(
            parts
                .iter()
                .map(|p| (p.section.clone(), p.content.clone()))
                .collect(),
        )
    }
}

/// One stored section body of a saved article
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleContentPart {
    /// Section heading
    pub section: String,
    /// Generated (or edited) body text
    pub content: String,
}

/// Saved outline record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedOutline {
    /// Record identifier (stable across updates)
    pub id: RecordId,
    /// Creation time in Unix milliseconds (preserved across updates)
    pub created_at: i64,
    /// The outline itself, stored flat next to `id` and `createdAt`
    #[serde(flatten)]
    pub outline: Outline,
}

/// Saved article record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedArticle {
    /// Record identifier (stable across updates)
    pub id: RecordId,
    /// Creation time in Unix milliseconds (preserved across updates)
    pub created_at: i64,
    /// Value copy of the outline at save time
    pub outline: Outline,
    /// Section bodies in stored order
    pub content: Vec<ArticleContentPart>,
}

/// Saved markdown document record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMarkdown {
    /// Record identifier (stable across updates)
    pub id: RecordId,
    /// Creation time in Unix milliseconds (preserved across updates)
    pub created_at: i64,
    /// Title derived from the document's first line
    pub title: String,
    /// Raw document text
    pub content: String,
}

/// Kind of persisted artifact
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Saved outlines
    Outline,
    /// Saved articles
    Article,
    /// Saved markdown documents
    Markdown,
}

impl ArtifactKind {
    /// Key under which the full collection is stored
    pub fn storage_key(&self) -> &'static str {
        match self {
            ArtifactKind::Outline => "draftline-saved-outlines",
            ArtifactKind::Article => "draftline-saved-articles",
            ArtifactKind::Markdown => "draftline-saved-markdowns",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ArtifactKind::Outline => "outline",
            ArtifactKind::Article => "article",
            ArtifactKind::Markdown => "markdown",
        };
        f.write_str(s)
    }
}

/// Pipeline phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing in progress
    #[default]
    Idle,
    /// Waiting for the outline response
    GeneratingOutline,
    /// An outline is held and editable
    OutlineReady,
    /// Sections are being generated
    GeneratingArticle,
    /// Every section has a body
    ArticleReady,
    /// The last generation failed
    Error,
}

impl Phase {
    /// Whether a provider request is in flight in this phase
    pub fn is_generating(&self) -> bool {
        matches!(self, Phase::GeneratingOutline | Phase::GeneratingArticle)
    }
}

/// Which provider path the pipeline uses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSelection {
    /// Batch adapter for the outline and every section
    #[default]
    Standard,
    /// Streaming adapter: batch call for the outline, chunk streams for sections
    Streaming,
}

/// Event emitted as the pipeline moves through its lifecycle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Phase changed
    PhaseChanged {
        /// Previous phase
        from: Phase,
        /// New phase
        to: Phase,
    },

    /// Advisory status text changed while generating the outline
    StatusMessage {
        /// Message to display
        message: String,
    },

    /// Outline accepted
    OutlineReady {
        /// Outline title
        title: String,
        /// Number of sections
        sections: usize,
    },

    /// Section generation started
    SectionStarted {
        /// Section heading
        heading: String,
        /// Zero-based position in the outline
        index: usize,
        /// Number of sections in the outline
        total: usize,
    },

    /// Section body grew (streaming) or arrived (batch)
    SectionProgress {
        /// Section heading
        heading: String,
        /// Accumulated body so far
        content: String,
    },

    /// Section finished
    SectionCompleted {
        /// Section heading
        heading: String,
    },

    /// All sections finished
    ArticleComplete {
        /// Number of sections generated
        sections: usize,
    },

    /// Outline or article generation failed
    GenerationFailed {
        /// User-facing error message
        error: String,
    },

    /// A record was inserted or updated
    Saved {
        /// Artifact kind
        kind: ArtifactKind,
        /// Record identifier
        id: RecordId,
        /// Whether an existing record was updated in place
        updated: bool,
    },

    /// A record was deleted
    Deleted {
        /// Artifact kind
        kind: ArtifactKind,
        /// Record identifier
        id: RecordId,
    },

    /// Session reset to idle
    Reset,
}

/// Current time in Unix milliseconds
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
