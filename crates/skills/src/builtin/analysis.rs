//! Built-in skills that send retrieved notes to the language model.

use crate::prompt::{HeaderStyle, InputMode, Order, PromptSkillSpec, TemplateSource};

pub(crate) const GOAL_KEYWORDS: &[&str] = &[
    "goal",
    "objective",
    "want to",
    "plan to",
    "aspire",
    "achieve",
    "target",
    "aim",
    "working on",
    "working towards",
];

const ENERGY_KEYWORDS: &[&str] = &[
    "energy",
    "tired",
    "exhausted",
    "energized",
    "motivated",
    "focus",
    "focused",
    "productive",
    "unproductive",
    "lazy",
    "alert",
    "sleepy",
    "refreshed",
    "drained",
    "burnout",
];

const LEARNING_KEYWORDS: &[&str] = &[
    "learned",
    "discovered",
    "figured out",
    "TIL",
    "today I learned",
    "programming",
    "coding",
    "development",
    "bug",
    "solution",
    "technology",
    "framework",
    "library",
    "API",
    "tutorial",
];

const GAMING_KEYWORDS: &[&str] = &[
    "game",
    "gaming",
    "played",
    "playing",
    "finished",
    "Steam",
    "PlayStation",
    "Nintendo",
    "Xbox",
    "RPG",
    "strategy",
    "puzzle",
    "action",
    "indie",
    "boss",
    "level",
    "quest",
    "achievement",
];

fn named(name: &str, description: &str) -> PromptSkillSpec {
    PromptSkillSpec::new(name, description, TemplateSource::Named(name.to_string()))
}

pub fn ask_past_self() -> PromptSkillSpec {
    named(
        "ask_past_self",
        "Query your historical notes to find answers from your past experiences and thoughts. \
         Input should be a question (e.g., 'How did I solve the authentication bug last time?', \
         'What did I think about React hooks when I first learned them?'). \
         Searches past entries and synthesizes an answer with supporting evidence.",
    )
    .input_alias("question")
    .k(12)
    .input_hint("Please provide a question to search for in your past notes.")
    .empty_message("No relevant entries found for: {{input}}")
    .error_context("could not query past notes")
}

pub fn energy_tracker() -> PromptSkillSpec {
    named(
        "energy_tracker",
        "Analyze energy levels and productivity patterns from journal entries. \
         Input should be number of days to analyze (default: 30). \
         Identifies high/low energy periods, energy boosters and drains, and provides \
         recommendations for optimal daily schedule.",
    )
    .input(InputMode::Days)
    .recent_days(30)
    .keywords(ENERGY_KEYWORDS)
    .k(20)
    .order(Order::Chronological)
    .limit(25)
    .empty_message("No entries found in the last {{days}} days.")
    .error_context("could not track energy")
}

pub fn extract_goals() -> PromptSkillSpec {
    named(
        "extract_goals",
        "Extract and analyze personal goals from journal entries using AI. \
         This tool intelligently identifies both explicit and implicit goals, \
         aspirations, and long-term objectives mentioned in the notes. \
         Use this when you need a comprehensive understanding of the user's goals.",
    )
    .input(InputMode::None)
    .keywords(GOAL_KEYWORDS)
    .k(10)
    .header(HeaderStyle::File)
    .empty_message("No goal-related entries found in the notes.")
    .error_context("could not extract goals")
}

pub fn extract_learnings() -> PromptSkillSpec {
    named(
        "extract_learnings",
        "Extract and summarize technical learnings from development and programming notes. \
         Identifies new technologies, concepts, problem-solving patterns, and knowledge gained. \
         Useful for reviewing what you've learned or creating a knowledge summary.",
    )
    .keywords(LEARNING_KEYWORDS)
    .k(15)
    .header(HeaderStyle::FileDated)
    .empty_message("No development or learning-related entries found.")
    .error_context("could not extract learnings")
}

pub fn gaming_insights() -> PromptSkillSpec {
    named(
        "gaming_insights",
        "Analyze gaming habits, preferences, and patterns from your notes. \
         Identifies games played, favorite genres, gaming frequency, and explores \
         the relationship between gaming and mood/productivity. \
         Useful for understanding your gaming behavior and finding healthy balance.",
    )
    .keywords(GAMING_KEYWORDS)
    .k(20)
    .order(Order::Chronological)
    .empty_message("No gaming-related entries found in your notes.")
    .error_context("could not analyze gaming habits")
}

pub fn track_progress() -> PromptSkillSpec {
    named(
        "track_progress",
        "Track progress on a specific goal, habit, or project over time. \
         Input should be the goal/habit name (e.g., 'learning Python', 'daily meditation'). \
         Analyzes mentions over time, identifies patterns, and provides progress assessment.",
    )
    .input_alias("goal")
    .k(20)
    .order(Order::Chronological)
    .input_hint("Please specify a goal or habit to track (e.g., 'learning Rust', 'daily exercise').")
    .empty_message("No entries found mentioning '{{input}}'.")
    .error_context("could not track progress")
}

/// Every analysis skill, in registration order.
pub fn all() -> Vec<PromptSkillSpec> {
    vec![
        ask_past_self(),
        energy_tracker(),
        extract_goals(),
        extract_learnings(),
        gaming_insights(),
        track_progress(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::PromptTemplates;
    use sableye_core::testing::{ScriptedModel, StaticIndex, StaticReader, note};
    use std::sync::Arc;

    fn tool(
        spec: PromptSkillSpec, llm: &Arc<ScriptedModel>, index: &Arc<StaticIndex>, reader: &Arc<StaticReader>,
    ) -> crate::Tool {
        spec.build(&PromptTemplates::builtin(), llm.clone(), index.clone(), reader.clone()).unwrap()
    }

    #[test]
    fn test_every_template_resolves() {
        let templates = PromptTemplates::builtin();
        for spec in all() {
            let TemplateSource::Named(name) = &spec.template else {
                panic!("{} should use a named template", spec.name);
            };
            assert_eq!(name, &spec.name);
            assert!(templates.get(name).is_ok());
        }
    }

    #[tokio::test]
    async fn test_ask_past_self_prompt() {
        let llm = Arc::new(ScriptedModel::replying("You used JWT refresh tokens."));
        let index = Arc::new(StaticIndex::new(vec![note(
            "2024-01-10.md",
            "2024-01-10T21:00:00",
            "Fixed the auth bug with refresh tokens.",
        )]));
        let reader = Arc::new(StaticReader::empty());
        let tool = tool(ask_past_self(), &llm, &index, &reader);

        let answer = tool.call("How did I fix the auth bug?").await;
        assert_eq!(answer, "You used JWT refresh tokens.");
        assert_eq!(index.queries(), vec![("How did I fix the auth bug?".to_string(), 12)]);

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("How did I fix the auth bug?"));
        assert!(prompt.contains("--- 2024-01-10 - 2024-01-10.md ---\nFixed the auth bug with refresh tokens."));
        assert!(!prompt.contains("{{notes}}"));
        assert!(!prompt.contains("{{question}}"));
    }

    #[tokio::test]
    async fn test_ask_past_self_messages() {
        let llm = Arc::new(ScriptedModel::replying("unused"));
        let index = Arc::new(StaticIndex::empty());
        let reader = Arc::new(StaticReader::empty());
        let tool = tool(ask_past_self(), &llm, &index, &reader);

        assert_eq!(tool.call("  ").await, "Please provide a question to search for in your past notes.");
        assert_eq!(tool.call("kayaking").await, "No relevant entries found for: kayaking");
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_energy_tracker_window() {
        let llm = Arc::new(ScriptedModel::replying("unused"));
        let index = Arc::new(StaticIndex::empty());
        let reader = Arc::new(StaticReader::empty());
        let tool = tool(energy_tracker(), &llm, &index, &reader);

        assert_eq!(tool.call("not a number").await, "No entries found in the last 30 days.");
        assert_eq!(tool.call("14").await, "No entries found in the last 14 days.");
        assert_eq!(reader.windows(), vec![30, 14]);
    }

    #[tokio::test]
    async fn test_energy_tracker_searches_keywords() {
        let llm = Arc::new(ScriptedModel::replying("Energy peaks mid-morning."));
        let index = Arc::new(StaticIndex::new(vec![note("b.md", "2024-02-02T08:00:00", "Felt drained")]));
        let reader = Arc::new(StaticReader::new(vec![note("a.md", "2024-02-01T08:00:00", "Great focus")]));
        let tool = tool(energy_tracker(), &llm, &index, &reader);

        assert_eq!(tool.call("7").await, "Energy peaks mid-morning.");
        let (query, k) = &index.queries()[0];
        assert!(query.starts_with("energy tired exhausted"));
        assert_eq!(*k, 20);
        assert!(llm.prompts()[0].contains("Great focus"));
        assert!(llm.prompts()[0].contains("Felt drained"));
    }

    #[tokio::test]
    async fn test_extract_goals_ignores_input() {
        let llm = Arc::new(ScriptedModel::replying("Goals: run a marathon."));
        let index = Arc::new(StaticIndex::new(vec![note("g.md", "2024-02-01T08:00:00", "I want to run a marathon")]));
        let reader = Arc::new(StaticReader::empty());
        let tool = tool(extract_goals(), &llm, &index, &reader);

        assert_eq!(tool.call("whatever").await, "Goals: run a marathon.");
        assert_eq!(index.queries()[0].0, GOAL_KEYWORDS.join(" "));
        assert_eq!(index.queries()[0].1, 10);
        assert!(llm.prompts()[0].contains("--- g.md ---\nI want to run a marathon"));
    }

    #[tokio::test]
    async fn test_extract_learnings_empty() {
        let llm = Arc::new(ScriptedModel::replying("unused"));
        let index = Arc::new(StaticIndex::empty());
        let reader = Arc::new(StaticReader::empty());
        let tool = tool(extract_learnings(), &llm, &index, &reader);

        assert_eq!(tool.call("").await, "No development or learning-related entries found.");
        assert_eq!(index.queries()[0].1, 15);
    }

    #[tokio::test]
    async fn test_gaming_insights_uses_input_as_query() {
        let llm = Arc::new(ScriptedModel::replying("Mostly RPGs."));
        let index = Arc::new(StaticIndex::new(vec![note("g.md", "2024-02-01T08:00:00", "Played Zelda")]));
        let reader = Arc::new(StaticReader::empty());
        let tool = tool(gaming_insights(), &llm, &index, &reader);

        assert_eq!(tool.call("zelda").await, "Mostly RPGs.");
        assert_eq!(index.queries(), vec![("zelda".to_string(), 20)]);
    }

    #[tokio::test]
    async fn test_track_progress_without_entries() {
        let llm = Arc::new(ScriptedModel::replying("unused"));
        let index = Arc::new(StaticIndex::empty());
        let reader = Arc::new(StaticReader::empty());
        let tool = tool(track_progress(), &llm, &index, &reader);

        assert_eq!(
            tool.call("").await,
            "Please specify a goal or habit to track (e.g., 'learning Rust', 'daily exercise')."
        );
        assert_eq!(tool.call("exercise habit").await, "No entries found mentioning 'exercise habit'.");
    }
}
