//! Core types for the skill registry.
//!
//! A skill is discovered as a [`SkillCandidate`], resolved into a
//! [`SkillDefinition`] and instantiated into a [`Tool`] by calling its
//! factory with the three collaborator handles.

use std::fmt;
use std::sync::Arc;

use crate::tool::Tool;
use sableye_core::{Collaborators, LanguageModel, NoteReader, VectorIndex};

/// Errors raised while discovering, building or running skills.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("Invalid skill manifest frontmatter: {0}")]
    InvalidFrontmatter(String),

    #[error("Skill manifest has no prompt body: {0}")]
    MissingEntryPoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Skill construction failed: {0}")]
    Instantiation(String),

    #[error("Prompt template not found: {0}")]
    TemplateNotFound(String),

    /// A collaborator call failed while the skill was running
    #[error("{context}: {source}")]
    Collaborator {
        context: String,
        #[source]
        source: sableye_core::Error,
    },
}

impl SkillError {
    pub fn instantiation(msg: impl Into<String>) -> Self {
        Self::Instantiation(msg.into())
    }

    /// Wrap a collaborator failure with what the skill was doing.
    pub fn collaborator(context: impl Into<String>, source: sableye_core::Error) -> Self {
        Self::Collaborator { context: context.into(), source }
    }
}

/// Result type for skill operations.
pub type Result<T> = std::result::Result<T, SkillError>;

impl From<SkillError> for sableye_core::Error {
    fn from(err: SkillError) -> Self {
        sableye_core::Error::skill(err.to_string())
    }
}

/// Builds a tool bound to the language model, vector index and note reader.
///
/// Calling it again yields a fresh, independent tool.
pub type SkillFactory = Arc<
    dyn Fn(Arc<dyn LanguageModel>, Arc<dyn VectorIndex>, Arc<dyn NoteReader>) -> Result<Tool> + Send + Sync,
>;

/// A named skill and the factory that builds its tool.
#[derive(Clone)]
pub struct SkillDefinition {
    pub name: String,
    pub factory: SkillFactory,
}

impl SkillDefinition {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Arc<dyn LanguageModel>, Arc<dyn VectorIndex>, Arc<dyn NoteReader>) -> Result<Tool>
            + Send
            + Sync
            + 'static,
    {
        Self { name: name.into(), factory: Arc::new(factory) }
    }

    /// Call the factory with the shared collaborator handles.
    pub fn instantiate(&self, collaborators: &Collaborators) -> Result<Tool> {
        (self.factory)(
            collaborators.llm.clone(),
            collaborators.index.clone(),
            collaborators.reader.clone(),
        )
    }
}

impl fmt::Debug for SkillDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillDefinition").field("name", &self.name).finish_non_exhaustive()
    }
}

/// One entry yielded by a skill source.
#[derive(Debug)]
pub struct SkillCandidate {
    /// Source identifier (manifest file stem or table key)
    pub identifier: String,
    /// The definition, or why the source item could not be turned into one
    pub definition: Result<SkillDefinition>,
}

impl SkillCandidate {
    pub fn found(definition: SkillDefinition) -> Self {
        Self { identifier: definition.name.clone(), definition: Ok(definition) }
    }

    pub fn failed(identifier: impl Into<String>, error: SkillError) -> Self {
        Self { identifier: identifier.into(), definition: Err(error) }
    }
}

/// Why a candidate did not become a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadFailureKind {
    /// The source item could not be read, parsed or lacks its entry point
    Discovery,
    /// The factory failed, panicked or produced an invalid tool
    Instantiation,
    /// Another tool already uses the name
    DuplicateName,
}

impl LoadFailureKind {
    pub const VALUES: &[LoadFailureKind] =
        &[LoadFailureKind::Discovery, LoadFailureKind::Instantiation, LoadFailureKind::DuplicateName];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadFailureKind::Discovery => "discovery",
            LoadFailureKind::Instantiation => "instantiation",
            LoadFailureKind::DuplicateName => "duplicate-name",
        }
    }
}

impl fmt::Display for LoadFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub identifier: String,
    pub kind: LoadFailureKind,
    pub reason: String,
}

/// Outcome of a registry build: loaded tool names and failures, both in
/// discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub(crate) fn record(&mut self, identifier: &str, kind: LoadFailureKind, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(skill = identifier, kind = %kind, reason = %reason, "skill failed to load");
        self.failures.push(LoadFailure { identifier: identifier.to_string(), kind, reason });
    }

    /// Failure recorded for `identifier`, if any.
    pub fn failure(&self, identifier: &str) -> Option<&LoadFailure> {
        self.failures.iter().find(|f| f.identifier == identifier)
    }

    pub fn failures_of(&self, kind: LoadFailureKind) -> impl Iterator<Item = &LoadFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// "8 skills loaded, 1 failed"
    pub fn summary(&self) -> String {
        let plural = if self.loaded.len() == 1 { "" } else { "s" };
        if self.failures.is_empty() {
            format!("{} skill{} loaded", self.loaded.len(), plural)
        } else {
            format!("{} skill{} loaded, {} failed", self.loaded.len(), plural, self.failures.len())
        }
    }
}
