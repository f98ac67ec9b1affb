//! Skill registry: discovery, instantiation and validation.
//!
//! The registry walks its sources in order, sorts each source's candidates
//! by identifier and turns them into tools. Nothing a single skill does can
//! abort the build; every problem ends up in the [`LoadReport`].

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use crate::builtin::BuiltinSource;
use crate::loader::ManifestSource;
use crate::template::PromptTemplates;
use crate::tool::{Tool, panic_message};
use crate::types::{LoadFailureKind, LoadReport, SkillCandidate, SkillDefinition};
use sableye_core::{Collaborators, SkillsConfig};

/// Identifiers with this prefix are skipped without a report entry.
pub const EXCLUDED_PREFIX: char = '_';

/// Produces skill candidates.
pub trait SkillSource: Send + Sync {
    /// Short name used in logs.
    fn label(&self) -> String;

    /// Every candidate this source knows about, in any order.
    fn candidates(&self) -> Vec<SkillCandidate>;
}

/// A fixed list of definitions.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    label: String,
    definitions: Vec<SkillDefinition>,
}

impl StaticSource {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), definitions: Vec::new() }
    }

    pub fn with_definition(mut self, definition: SkillDefinition) -> Self {
        self.definitions.push(definition);
        self
    }
}

impl SkillSource for StaticSource {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn candidates(&self) -> Vec<SkillCandidate> {
        self.definitions.iter().cloned().map(SkillCandidate::found).collect()
    }
}

/// Tools and load report from one registry build.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuild {
    pub tools: Vec<Tool>,
    pub report: LoadReport,
}

impl RegistryBuild {
    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(Tool::name).collect()
    }
}

/// Check that `name` is snake_case and starts with a letter.
pub fn is_valid_tool_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[derive(Default)]
pub struct SkillRegistry {
    sources: Vec<Box<dyn SkillSource>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl SkillSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Built-ins followed by each configured manifest directory.
    pub fn from_config(config: &SkillsConfig, search_limit: usize) -> Self {
        let templates = PromptTemplates::with_overrides(config.prompts_dir.as_deref());
        let mut registry = Self::new().with_source(BuiltinSource::new(templates, search_limit));

        if config.enabled {
            for dir in &config.dirs {
                registry = registry.with_source(ManifestSource::new(dir));
            }
        } else {
            tracing::info!("manifest skills disabled");
        }
        registry
    }

    pub fn source_labels(&self) -> Vec<String> {
        self.sources.iter().map(|source| source.label()).collect()
    }

    /// Discover and instantiate every skill.
    ///
    /// Every factory receives the same collaborator handles. Building twice
    /// over unchanged sources yields the same names and failures.
    #[tracing::instrument(skip_all, fields(sources = self.sources.len()))]
    pub fn build(&self, collaborators: &Collaborators) -> RegistryBuild {
        let mut build = RegistryBuild::default();
        let mut taken: HashSet<String> = HashSet::new();

        for source in &self.sources {
            let mut candidates = source.candidates();
            candidates.sort_by(|a, b| a.identifier.cmp(&b.identifier));
            tracing::debug!(source = %source.label(), candidates = candidates.len(), "scanning skill source");

            for candidate in candidates {
                if let Some(tool) = Self::admit(candidate, collaborators, &taken, &mut build.report) {
                    taken.insert(tool.name().to_string());
                    build.report.loaded.push(tool.name().to_string());
                    build.tools.push(tool);
                }
            }
        }

        tracing::info!(loaded = build.tools.len(), failed = build.report.failures.len(), "{}", build.report.summary());
        build
    }

    fn admit(
        candidate: SkillCandidate, collaborators: &Collaborators, taken: &HashSet<String>, report: &mut LoadReport,
    ) -> Option<Tool> {
        let SkillCandidate { identifier, definition } = candidate;

        if identifier.starts_with(EXCLUDED_PREFIX) {
            tracing::debug!(skill = %identifier, "skipping excluded skill");
            return None;
        }

        let definition = match definition {
            Ok(definition) => definition,
            Err(e) => {
                report.record(&identifier, LoadFailureKind::Discovery, e.to_string());
                return None;
            }
        };

        let tool = match catch_unwind(AssertUnwindSafe(|| definition.instantiate(collaborators))) {
            Ok(Ok(tool)) => tool,
            Ok(Err(e)) => {
                report.record(&identifier, LoadFailureKind::Instantiation, e.to_string());
                return None;
            }
            Err(panic) => {
                let reason = format!("factory panicked: {}", panic_message(panic.as_ref()));
                report.record(&identifier, LoadFailureKind::Instantiation, reason);
                return None;
            }
        };

        if !is_valid_tool_name(tool.name()) {
            report.record(
                &identifier,
                LoadFailureKind::Instantiation,
                format!("invalid tool name '{}' (expected snake_case)", tool.name()),
            );
            return None;
        }

        if tool.name() != identifier {
            tracing::warn!(skill = %identifier, tool = %tool.name(), "tool name differs from skill identifier");
        }

        if taken.contains(tool.name()) {
            report.record(
                &identifier,
                LoadFailureKind::DuplicateName,
                format!("tool name '{}' is already registered", tool.name()),
            );
            return None;
        }

        Some(tool)
    }
}

/// Registry over built-ins and the manifests in `dir`.
pub fn registry_for_dir(dir: &Path, search_limit: usize) -> SkillRegistry {
    SkillRegistry::new()
        .with_source(BuiltinSource::new(PromptTemplates::builtin(), search_limit))
        .with_source(ManifestSource::new(dir))
}
