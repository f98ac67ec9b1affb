//! Compiled-in skills.

pub mod analysis;
pub mod retrieval;

use crate::registry::SkillSource;
use crate::template::PromptTemplates;
use crate::types::{SkillCandidate, SkillDefinition};

/// Names of every built-in skill.
pub const BUILTIN_SKILLS: &[&str] = &[
    "analyze_mood_patterns",
    "ask_past_self",
    "energy_tracker",
    "extract_goals",
    "extract_learnings",
    "find_goals",
    "gaming_insights",
    "get_recent_entries",
    "search_notes",
    "track_progress",
];

/// The static registration table of built-in skills.
#[derive(Debug, Clone)]
pub struct BuiltinSource {
    templates: PromptTemplates,
    search_limit: usize,
}

impl BuiltinSource {
    /// `search_limit` is the `k` used by `search_notes`.
    pub fn new(templates: PromptTemplates, search_limit: usize) -> Self {
        Self { templates, search_limit }
    }

    pub fn definitions(&self) -> Vec<SkillDefinition> {
        let search_limit = self.search_limit;
        let mut definitions: Vec<SkillDefinition> = analysis::all()
            .into_iter()
            .map(|spec| spec.into_definition(self.templates.clone()))
            .collect();

        definitions.push(SkillDefinition::new("search_notes", move |_llm, index, _reader| {
            Ok(retrieval::search_notes(index, search_limit))
        }));
        definitions.push(SkillDefinition::new("get_recent_entries", |_llm, _index, reader| {
            Ok(retrieval::get_recent_entries(reader))
        }));
        definitions.push(SkillDefinition::new("analyze_mood_patterns", |_llm, index, _reader| {
            Ok(retrieval::analyze_mood_patterns(index))
        }));
        definitions.push(SkillDefinition::new("find_goals", |_llm, index, _reader| Ok(retrieval::find_goals(index))));
        definitions
    }
}

impl Default for BuiltinSource {
    fn default() -> Self {
        Self::new(PromptTemplates::builtin(), 5)
    }
}

impl SkillSource for BuiltinSource {
    fn label(&self) -> String {
        "builtin".to_string()
    }

    fn candidates(&self) -> Vec<SkillCandidate> {
        self.definitions().into_iter().map(SkillCandidate::found).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_names() {
        let mut names: Vec<String> = BuiltinSource::default().definitions().into_iter().map(|d| d.name).collect();
        names.sort();
        assert_eq!(names, BUILTIN_SKILLS);
    }
}
