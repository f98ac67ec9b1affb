//! Parser for markdown skill manifests with YAML frontmatter.
//!
//! Manifest format:
//! ```markdown
//! ---
//! name: sleep_patterns
//! description: Summarize how sleep is described in the notes. Input is ignored.
//! input: none
//! query: sleep slept tired rest insomnia nap
//! k: 15
//! order: chronological
//! ---
//!
//! Describe sleep patterns in these entries:
//!
//! {{notes}}
//! ```
//!
//! The body is the prompt template. `{{notes}}` receives the retrieved
//! entries and `{{input}}` the tool argument.

use std::fs;
use std::path::Path;

use crate::prompt::{HeaderStyle, InputMode, Order, PromptSkillSpec, TemplateSource};
use crate::template::placeholders;
use crate::types::{Result, SkillError};

const MAX_DESCRIPTION_LEN: usize = 1024;
const KNOWN_PLACEHOLDERS: &[&str] = &["input", "days", "notes"];

/// Read and parse a manifest file.
pub fn parse_manifest_file(path: &Path) -> Result<PromptSkillSpec> {
    let content = fs::read_to_string(path)?;
    parse_manifest(&content).map_err(|e| match e {
        SkillError::MissingEntryPoint(_) => SkillError::MissingEntryPoint(path.display().to_string()),
        other => other,
    })
}

/// Parse manifest text into a prompt skill.
pub fn parse_manifest(content: &str) -> Result<PromptSkillSpec> {
    let (frontmatter, body) = extract_frontmatter(content)?;

    if body.is_empty() {
        return Err(SkillError::MissingEntryPoint(frontmatter.name));
    }

    let input = match &frontmatter.input {
        Some(input) => input.parse::<InputMode>()?,
        None => InputMode::default(),
    };
    if input == InputMode::None && frontmatter.query.as_ref().is_none_or(|q| q.trim().is_empty()) {
        return Err(SkillError::InvalidFrontmatter("input: none requires a query".to_string()));
    }

    let order = match &frontmatter.order {
        Some(order) => order.parse::<Order>()?,
        None => Order::default(),
    };
    let header = match &frontmatter.header {
        Some(header) => header.parse::<HeaderStyle>()?,
        None => HeaderStyle::default(),
    };

    for placeholder in placeholders(&body) {
        if !KNOWN_PLACEHOLDERS.contains(&placeholder.as_str()) {
            tracing::warn!(skill = %frontmatter.name, placeholder = %placeholder, "unknown template placeholder");
        }
    }

    if frontmatter.k == Some(0) {
        return Err(SkillError::InvalidFrontmatter("k must be at least 1".to_string()));
    }

    let mut spec = PromptSkillSpec::new(frontmatter.name, frontmatter.description, TemplateSource::Inline(body))
        .input(input)
        .order(order)
        .header(header);

    spec.keywords = frontmatter.query.map(|q| q.trim().to_string()).filter(|q| !q.is_empty());
    spec.limit = frontmatter.limit;
    if let Some(k) = frontmatter.k {
        spec = spec.k(k);
    }
    if let Some(days) = frontmatter.recent_days {
        spec = spec.recent_days(days);
    }
    if input == InputMode::Days {
        spec = spec.empty_message("No entries found in the last {{days}} days.");
    }
    if let Some(message) = frontmatter.empty_message {
        spec = spec.empty_message(message);
    }
    if let Some(hint) = frontmatter.input_hint {
        spec = spec.input_hint(hint);
    }
    let context = format!("could not run {}", spec.name);
    Ok(spec.error_context(context))
}

/// Split manifest text into validated frontmatter and a trimmed body.
fn extract_frontmatter(content: &str) -> Result<(Frontmatter, String)> {
    let Some(rest) = content.trim_start().strip_prefix("---") else {
        return Err(SkillError::InvalidFrontmatter("manifest must start with ---".to_string()));
    };

    let frontmatter_end = rest
        .find("\n---")
        .ok_or_else(|| SkillError::InvalidFrontmatter("Closing --- not found".to_string()))?;

    let frontmatter_str = &rest[..frontmatter_end];
    let body = &rest[frontmatter_end + 4..];

    let frontmatter: Frontmatter = serde_yml::from_str(frontmatter_str)
        .map_err(|e| SkillError::InvalidFrontmatter(format!("YAML parse error: {e}")))?;

    if frontmatter.name.is_empty() {
        return Err(SkillError::InvalidFrontmatter("name is required".to_string()));
    }

    if frontmatter.description.is_empty() {
        return Err(SkillError::InvalidFrontmatter("description is required".to_string()));
    }

    if frontmatter.description.len() > MAX_DESCRIPTION_LEN {
        return Err(SkillError::InvalidFrontmatter(format!(
            "description must be <= {MAX_DESCRIPTION_LEN} characters"
        )));
    }

    Ok((frontmatter, body.trim().to_string()))
}

/// YAML frontmatter structure.
#[derive(Debug, serde::Deserialize)]
struct Frontmatter {
    #[serde(default)]
    name: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    input: Option<String>,

    /// Fixed search keywords
    #[serde(default)]
    query: Option<String>,

    #[serde(default)]
    k: Option<usize>,

    #[serde(default)]
    order: Option<String>,

    #[serde(default)]
    header: Option<String>,

    #[serde(default)]
    recent_days: Option<u32>,

    #[serde(default)]
    limit: Option<usize>,

    #[serde(default)]
    empty_message: Option<String>,

    #[serde(default)]
    input_hint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_manifest() {
        let content = r#"---
name: sleep_patterns
description: Summarize sleep. Input is ignored.
input: none
query: sleep slept tired
k: 15
order: chronological
header: file
limit: 5
---

Describe sleep patterns:

{{notes}}
"#;

        let spec = parse_manifest(content).unwrap();
        assert_eq!(spec.name, "sleep_patterns");
        assert_eq!(spec.description, "Summarize sleep. Input is ignored.");
        assert_eq!(spec.input, InputMode::None);
        assert_eq!(spec.keywords.as_deref(), Some("sleep slept tired"));
        assert_eq!(spec.k, 15);
        assert_eq!(spec.order, Order::Chronological);
        assert_eq!(spec.header, HeaderStyle::File);
        assert_eq!(spec.limit, Some(5));
        assert_eq!(spec.error_context, "could not run sleep_patterns");
        assert_eq!(spec.template, TemplateSource::Inline("Describe sleep patterns:\n\n{{notes}}".to_string()));
    }

    #[test]
    fn test_defaults() {
        let spec = parse_manifest("---\nname: recall\ndescription: Recall things\n---\n{{input}}\n{{notes}}").unwrap();
        assert_eq!(spec.input, InputMode::Query);
        assert_eq!(spec.keywords, None);
        assert_eq!(spec.k, 10);
        assert_eq!(spec.order, Order::Relevance);
        assert_eq!(spec.header, HeaderStyle::Dated);
        assert_eq!(spec.limit, None);
    }

    #[test]
    fn test_days_input_message() {
        let spec = parse_manifest(
            "---\nname: weekly_review\ndescription: Review\ninput: days\nrecent_days: 7\n---\n{{notes}}",
        )
        .unwrap();
        assert_eq!(spec.input, InputMode::Days);
        assert_eq!(spec.recent_days, 7);
        assert_eq!(spec.empty_message, "No entries found in the last {{days}} days.");
    }

    #[test]
    fn test_missing_body() {
        let err = parse_manifest("---\nname: hollow\ndescription: No body\n---\n\n").unwrap_err();
        assert!(matches!(err, SkillError::MissingEntryPoint(name) if name == "hollow"));
    }

    #[test]
    fn test_missing_name() {
        let result = parse_manifest("---\ndescription: A skill\n---\n{{notes}}");
        assert!(matches!(result, Err(SkillError::InvalidFrontmatter(_))));
    }

    #[test]
    fn test_missing_description() {
        let result = parse_manifest("---\nname: a_skill\n---\n{{notes}}");
        assert!(matches!(result, Err(SkillError::InvalidFrontmatter(_))));
    }

    #[test]
    fn test_no_frontmatter() {
        assert!(parse_manifest("# Just markdown\n{{notes}}").is_err());
        assert!(parse_manifest("---\nname: open\n").is_err());
    }

    #[test]
    fn test_invalid_values() {
        let bad_input = "---\nname: a\ndescription: d\ninput: weeks\n---\n{{notes}}";
        assert!(parse_manifest(bad_input).is_err());

        let none_without_query = "---\nname: a\ndescription: d\ninput: none\n---\n{{notes}}";
        assert!(parse_manifest(none_without_query).is_err());

        let zero_k = "---\nname: a\ndescription: d\nk: 0\n---\n{{notes}}";
        assert!(parse_manifest(zero_k).is_err());

        let bad_yaml = "---\nname: [unclosed\n---\n{{notes}}";
        assert!(parse_manifest(bad_yaml).is_err());
    }

    #[test]
    fn test_parse_file_reports_path_for_missing_body() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty_body.md");
        std::fs::write(&path, "---\nname: empty_body\ndescription: d\n---\n").unwrap();

        let err = parse_manifest_file(&path).unwrap_err();
        assert!(err.to_string().contains("empty_body.md"));
    }
}
