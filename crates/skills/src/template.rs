//! Markdown prompt templates with `{{placeholder}}` tokens.
//!
//! Substitution is plain string replacement. Built-in templates are compiled
//! in; a prompts directory can override any of them by file name.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{Result, SkillError};

const BUILTIN: &[(&str, &str)] = &[
    ("ask_past_self", include_str!("../prompts/ask_past_self.md")),
    ("energy_tracker", include_str!("../prompts/energy_tracker.md")),
    ("extract_goals", include_str!("../prompts/extract_goals.md")),
    ("extract_learnings", include_str!("../prompts/extract_learnings.md")),
    ("gaming_insights", include_str!("../prompts/gaming_insights.md")),
    ("track_progress", include_str!("../prompts/track_progress.md")),
];

/// Replace every `{{key}}` in `template` with its value.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |acc, (key, value)| acc.replace(&format!("{{{{{}}}}}", key), value))
}

/// Placeholder names used in `template`, in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let Ok(pattern) = regex::Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}") else {
        return Vec::new();
    };

    let mut names: Vec<String> = Vec::new();
    for capture in pattern.captures_iter(template) {
        let name = capture[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Named templates: compiled-in defaults plus overrides from disk.
#[derive(Debug, Clone, Default)]
pub struct PromptTemplates {
    overrides_dir: Option<PathBuf>,
    templates: BTreeMap<String, String>,
}

impl PromptTemplates {
    /// The compiled-in templates.
    pub fn builtin() -> Self {
        let templates = BUILTIN.iter().map(|(name, body)| (name.to_string(), body.to_string())).collect();
        Self { overrides_dir: None, templates }
    }

    /// Compiled-in templates, with `<dir>/<name>.md` taking precedence.
    pub fn with_overrides(dir: Option<&Path>) -> Self {
        Self { overrides_dir: dir.map(Path::to_path_buf), ..Self::builtin() }
    }

    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.templates.insert(name.into(), body.into());
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Look up a template, preferring the override directory.
    pub fn get(&self, name: &str) -> Result<String> {
        if let Some(dir) = &self.overrides_dir {
            let path = dir.join(format!("{}.md", name));
            if path.is_file() {
                tracing::debug!(template = name, path = %path.display(), "using prompt override");
                return Ok(fs::read_to_string(&path)?);
            }
        }

        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| SkillError::TemplateNotFound(name.to_string()))
    }
}
