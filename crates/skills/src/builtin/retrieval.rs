//! Built-in skills that return raw note excerpts without calling the model.

use std::sync::Arc;

use crate::tool::{Tool, ToolHandler};
use crate::types::{Result, SkillError};
use sableye_core::{Chunk, NoteReader, VectorIndex};

use super::analysis::GOAL_KEYWORDS;

const RECENT_DEFAULT_DAYS: u32 = 7;
const RECENT_MAX_ENTRIES: usize = 10;
const PREVIEW_CHARS: usize = 500;

const MOOD_KEYWORDS: &[&str] = &[
    "mood",
    "emotion",
    "feeling",
    "mental state",
    "happiness",
    "sadness",
    "anxiety",
    "stress",
    "joy",
    "depression",
    "calm",
    "peaceful",
];

fn dated(chunk: &Chunk) -> &str {
    if chunk.metadata.modified_time.is_empty() { "Unknown" } else { chunk.metadata.modified_date() }
}

/// Similarity search over the index with the tool argument as query.
pub struct SearchNotes {
    index: Arc<dyn VectorIndex>,
    k: usize,
}

#[async_trait::async_trait]
impl ToolHandler for SearchNotes {
    async fn run(&self, input: &str) -> Result<String> {
        let hits = self
            .index
            .similarity_search(input, self.k)
            .await
            .map_err(|e| SkillError::collaborator("could not search notes", e))?;

        if hits.is_empty() {
            return Ok("No relevant entries found for this query.".to_string());
        }

        Ok(hits
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                format!(
                    "--- Entry {}: {} (Modified: {}) ---\n{}\n",
                    i + 1,
                    chunk.metadata.display_name(),
                    dated(chunk),
                    chunk.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Newest notes from the last N days, truncated to a preview.
pub struct RecentEntries {
    reader: Arc<dyn NoteReader>,
}

#[async_trait::async_trait]
impl ToolHandler for RecentEntries {
    async fn run(&self, input: &str) -> Result<String> {
        let days = input.trim().parse().unwrap_or(RECENT_DEFAULT_DAYS);
        let mut notes = self
            .reader
            .read_recent_notes(days)
            .await
            .map_err(|e| SkillError::collaborator("could not retrieve recent entries", e))?;

        if notes.is_empty() {
            return Ok(format!("No entries found in the last {} days.", days));
        }

        notes.sort_by(|a, b| b.metadata.modified_time.cmp(&a.metadata.modified_time));

        Ok(notes
            .iter()
            .take(RECENT_MAX_ENTRIES)
            .map(|note| {
                let preview: String = note.content.chars().take(PREVIEW_CHARS).collect();
                let ellipsis = if note.content.chars().count() > PREVIEW_CHARS { "..." } else { "" };
                format!(
                    "--- {} (Modified: {}) ---\n{}{}\n",
                    note.metadata.display_name(),
                    dated(note),
                    preview,
                    ellipsis
                )
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Fixed-keyword search returned as a titled list of entries.
pub struct KeywordDigest {
    index: Arc<dyn VectorIndex>,
    query: String,
    k: usize,
    title: &'static str,
    empty_message: &'static str,
    error_context: &'static str,
}

#[async_trait::async_trait]
impl ToolHandler for KeywordDigest {
    async fn run(&self, _input: &str) -> Result<String> {
        let hits = self
            .index
            .similarity_search(&self.query, self.k)
            .await
            .map_err(|e| SkillError::collaborator(self.error_context, e))?;

        if hits.is_empty() {
            return Ok(self.empty_message.to_string());
        }

        let entries = hits
            .iter()
            .map(|chunk| format!("--- {} ---\n{}\n", chunk.metadata.display_name(), chunk.content))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!("{}:\n\n{}", self.title, entries))
    }
}

pub fn search_notes(index: Arc<dyn VectorIndex>, k: usize) -> Tool {
    Tool::new(
        "search_notes",
        "Search through journal entries and notes for specific information. \
         Input should be a search query about goals, activities, thoughts, \
         emotions, or any topic you want to find in the notes.",
        SearchNotes { index, k },
    )
}

pub fn get_recent_entries(reader: Arc<dyn NoteReader>) -> Tool {
    Tool::new(
        "get_recent_entries",
        "Get recent journal entries from the last N days. \
         Input should be a number representing days (e.g., '7' for last 7 days, \
         '30' for last 30 days).",
        RecentEntries { reader },
    )
}

pub fn analyze_mood_patterns(index: Arc<dyn VectorIndex>) -> Tool {
    Tool::new(
        "analyze_mood_patterns",
        "Analyze mood and emotional patterns from journal entries. \
         Use this to understand mental state, emotional well-being, \
         and identify trends in emotions over time.",
        KeywordDigest {
            index,
            query: MOOD_KEYWORDS.join(" "),
            k: 10,
            title: "Mood-related entries",
            empty_message: "No mood-related entries found.",
            error_context: "could not analyze mood patterns",
        },
    )
}

pub fn find_goals(index: Arc<dyn VectorIndex>) -> Tool {
    Tool::new(
        "find_goals",
        "Search for goals, objectives, and aspirations mentioned in notes. \
         Use this to understand what the person is working towards or wants to achieve.",
        KeywordDigest {
            index,
            query: GOAL_KEYWORDS.join(" "),
            k: 8,
            title: "Goal-related entries",
            empty_message: "No goals found in the notes.",
            error_context: "could not find goals",
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sableye_core::testing::{StaticIndex, StaticReader, note};

    #[tokio::test]
    async fn test_search_notes_format() {
        let index = Arc::new(StaticIndex::new(vec![
            note("a.md", "2024-03-01T09:30:00", "Slept well"),
            note("b.md", "2024-03-02T09:30:00", "Long run"),
        ]));
        let tool = search_notes(index.clone(), 5);

        let out = tool.call("sleep").await;
        assert_eq!(
            out,
            "--- Entry 1: a.md (Modified: 2024-03-01) ---\nSlept well\n\n--- Entry 2: b.md (Modified: 2024-03-02) ---\nLong run\n"
        );
        assert_eq!(index.queries(), vec![("sleep".to_string(), 5)]);
    }

    #[tokio::test]
    async fn test_search_notes_empty_and_failing() {
        let empty = search_notes(Arc::new(StaticIndex::empty()), 5);
        assert_eq!(empty.call("x").await, "No relevant entries found for this query.");

        let failing = search_notes(Arc::new(StaticIndex::failing("offline")), 5);
        assert_eq!(failing.call("x").await, "Error: could not search notes: store error: offline");
    }

    #[tokio::test]
    async fn test_recent_entries_newest_first_with_preview() {
        let long = "x".repeat(600);
        let reader = Arc::new(StaticReader::new(vec![
            note("old.md", "2024-03-01T08:00:00", "old"),
            note("new.md", "2024-03-05T08:00:00", &long),
        ]));
        let tool = get_recent_entries(reader.clone());

        let out = tool.call("3").await;
        assert!(out.starts_with("--- new.md (Modified: 2024-03-05) ---\n"));
        assert!(out.contains(&format!("{}...\n", "x".repeat(500))));
        assert!(out.ends_with("--- old.md (Modified: 2024-03-01) ---\nold\n"));
        assert_eq!(reader.windows(), vec![3]);
    }

    #[tokio::test]
    async fn test_recent_entries_caps_and_defaults() {
        let notes = (0..12).map(|i| note(&format!("{i:02}.md"), &format!("2024-03-{:02}T08:00:00", i + 1), "n")).collect();
        let reader = Arc::new(StaticReader::new(notes));
        let tool = get_recent_entries(reader.clone());

        let out = tool.call("soon").await;
        assert_eq!(out.matches("--- ").count(), 10);
        assert!(!out.contains("00.md"));
        assert_eq!(reader.windows(), vec![7]);

        let empty = get_recent_entries(Arc::new(StaticReader::empty()));
        assert_eq!(empty.call("").await, "No entries found in the last 7 days.");
    }

    #[tokio::test]
    async fn test_keyword_digests() {
        let index = Arc::new(StaticIndex::new(vec![note("m.md", "2024-03-01T08:00:00", "Calm day")]));

        let mood = analyze_mood_patterns(index.clone());
        assert_eq!(mood.call("").await, "Mood-related entries:\n\n--- m.md ---\nCalm day\n");

        let goals = find_goals(index.clone());
        assert!(goals.call("ignored").await.starts_with("Goal-related entries:"));

        let queries = index.queries();
        assert_eq!(queries[0].1, 10);
        assert!(queries[0].0.starts_with("mood emotion feeling"));
        assert_eq!(queries[1], (GOAL_KEYWORDS.join(" "), 8));

        let none = find_goals(Arc::new(StaticIndex::empty()));
        assert_eq!(none.call("").await, "No goals found in the notes.");
        let none = analyze_mood_patterns(Arc::new(StaticIndex::empty()));
        assert_eq!(none.call("").await, "No mood-related entries found.");
    }
}
