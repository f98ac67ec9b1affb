//! Sableye skill registry.
//!
//! Skills are discovered from a static table of built-ins and from
//! directories of markdown manifests, then instantiated into [`Tool`]s bound
//! to a language model, a vector index and a note reader. A tool call never
//! fails: errors come back as strings starting with [`ERROR_MARKER`].

pub mod builtin;
mod loader;
mod parser;
mod prompt;
mod registry;
mod template;
mod tool;
mod types;

pub use builtin::{BUILTIN_SKILLS, BuiltinSource};
pub use loader::ManifestSource;
pub use parser::{parse_manifest, parse_manifest_file};
pub use prompt::{HeaderStyle, InputMode, Order, PromptSkill, PromptSkillSpec, TemplateSource};
pub use registry::{EXCLUDED_PREFIX, RegistryBuild, SkillRegistry, SkillSource, StaticSource, is_valid_tool_name, registry_for_dir};
pub use template::{PromptTemplates, placeholders, render};
pub use tool::{ERROR_MARKER, Tool, ToolHandler, ToolOutput};
pub use types::{
    LoadFailure, LoadFailureKind, LoadReport, Result, SkillCandidate, SkillDefinition, SkillError, SkillFactory,
};
