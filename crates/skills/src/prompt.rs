//! Prompt-driven skills: retrieve notes, fill a template, ask the model.
//!
//! Every analysis skill, built-in or manifest, is a [`PromptSkillSpec`]. The
//! spec decides how the tool argument is read, which notes are gathered and
//! how they are laid out in the prompt.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::template::{PromptTemplates, render};
use crate::tool::{Tool, ToolHandler};
use crate::types::{Result, SkillDefinition, SkillError};
use sableye_core::{Chunk, LanguageModel, NoteReader, VectorIndex};

/// How the single tool argument is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// The argument is the search query. Falls back to the fixed keywords
    /// when empty; without keywords an argument is required.
    #[default]
    Query,
    /// The argument is a number of days of recent notes to include.
    Days,
    /// The argument is ignored; the fixed keywords are searched.
    None,
}

impl InputMode {
    pub const VALUES: &[InputMode] = &[InputMode::Query, InputMode::Days, InputMode::None];

    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Query => "query",
            InputMode::Days => "days",
            InputMode::None => "none",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputMode {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        InputMode::VALUES
            .iter()
            .copied()
            .find(|mode| mode.as_str() == s.to_lowercase())
            .ok_or_else(|| SkillError::InvalidFrontmatter(format!("invalid input: {s} (must be query, days, or none)")))
    }
}

/// Order of entries in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// As returned by the vector index
    #[default]
    Relevance,
    /// Oldest modification time first
    Chronological,
}

impl Order {
    pub const VALUES: &[Order] = &[Order::Relevance, Order::Chronological];

    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Relevance => "relevance",
            Order::Chronological => "chronological",
        }
    }
}

impl FromStr for Order {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        Order::VALUES
            .iter()
            .copied()
            .find(|order| order.as_str() == s.to_lowercase())
            .ok_or_else(|| {
                SkillError::InvalidFrontmatter(format!("invalid order: {s} (must be relevance or chronological)"))
            })
    }
}

/// Separator line placed above each entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderStyle {
    /// `--- 2024-03-01 - day.md ---`
    #[default]
    Dated,
    /// `--- day.md ---`
    File,
    /// `--- day.md (2024-03-01) ---`
    FileDated,
}

impl HeaderStyle {
    pub const VALUES: &[HeaderStyle] = &[HeaderStyle::Dated, HeaderStyle::File, HeaderStyle::FileDated];

    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderStyle::Dated => "dated",
            HeaderStyle::File => "file",
            HeaderStyle::FileDated => "file_dated",
        }
    }

    pub fn format(&self, chunk: &Chunk) -> String {
        let meta = &chunk.metadata;
        match self {
            HeaderStyle::Dated => {
                let date = if meta.modified_time.is_empty() { "Unknown" } else { meta.modified_date() };
                format!("--- {} - {} ---\n{}", date, meta.display_name(), chunk.content)
            }
            HeaderStyle::File => format!("--- {} ---\n{}", meta.display_name(), chunk.content),
            HeaderStyle::FileDated => {
                format!("--- {} ({}) ---\n{}", meta.display_name(), meta.modified_date(), chunk.content)
            }
        }
    }
}

impl FromStr for HeaderStyle {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        HeaderStyle::VALUES
            .iter()
            .copied()
            .find(|style| style.as_str() == s.to_lowercase())
            .ok_or_else(|| {
                SkillError::InvalidFrontmatter(format!("invalid header: {s} (must be dated, file, or file_dated)"))
            })
    }
}

/// Where the prompt template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Looked up by name in [`PromptTemplates`] when the tool is built
    Named(String),
    /// Template text given directly, as in a manifest body
    Inline(String),
}

/// Declarative description of a prompt-driven skill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSkillSpec {
    pub name: String,
    pub description: String,
    pub input: InputMode,
    /// Extra placeholder bound to the argument (e.g. `question`, `goal`);
    /// `{{input}}` is always bound.
    pub input_alias: Option<String>,
    /// Fixed search keywords
    pub keywords: Option<String>,
    /// Chunks requested from the vector index
    pub k: usize,
    pub order: Order,
    /// Default window for [`InputMode::Days`]
    pub recent_days: u32,
    /// Cap on entries placed in the prompt
    pub limit: Option<usize>,
    pub header: HeaderStyle,
    pub template: TemplateSource,
    /// Returned when an argument is required but missing
    pub input_hint: String,
    /// Returned when nothing was retrieved; `{{input}}` and `{{days}}` are
    /// substituted
    pub empty_message: String,
    /// Prefix for collaborator failures, e.g. "could not track progress"
    pub error_context: String,
}

impl PromptSkillSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, template: TemplateSource) -> Self {
        let name = name.into();
        Self {
            input_hint: format!("Please provide input for {}.", name),
            empty_message: "No relevant entries found.".to_string(),
            error_context: format!("{} failed", name),
            description: description.into(),
            input: InputMode::default(),
            input_alias: None,
            keywords: None,
            k: 10,
            order: Order::default(),
            recent_days: 30,
            limit: None,
            header: HeaderStyle::default(),
            template,
            name,
        }
    }

    pub fn input(mut self, input: InputMode) -> Self {
        self.input = input;
        self
    }

    pub fn input_alias(mut self, alias: impl Into<String>) -> Self {
        self.input_alias = Some(alias.into());
        self
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = Some(keywords.join(" "));
        self
    }

    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn recent_days(mut self, days: u32) -> Self {
        self.recent_days = days;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn header(mut self, header: HeaderStyle) -> Self {
        self.header = header;
        self
    }

    pub fn input_hint(mut self, hint: impl Into<String>) -> Self {
        self.input_hint = hint.into();
        self
    }

    pub fn empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    pub fn error_context(mut self, context: impl Into<String>) -> Self {
        self.error_context = context.into();
        self
    }

    /// Resolve the template and bind the collaborators into a tool.
    pub fn build(
        &self, templates: &PromptTemplates, llm: Arc<dyn LanguageModel>, index: Arc<dyn VectorIndex>,
        reader: Arc<dyn NoteReader>,
    ) -> Result<Tool> {
        let template = match &self.template {
            TemplateSource::Named(name) => templates.get(name)?,
            TemplateSource::Inline(body) => body.clone(),
        };
        if !template.contains("{{notes}}") {
            tracing::warn!(skill = %self.name, "prompt template has no notes placeholder");
        }

        let skill = PromptSkill { spec: self.clone(), template, llm, index, reader };
        Ok(Tool::new(self.name.clone(), self.description.clone(), skill))
    }

    /// Registry definition whose factory builds this skill.
    pub fn into_definition(self, templates: PromptTemplates) -> SkillDefinition {
        let name = self.name.clone();
        SkillDefinition::new(name, move |llm, index, reader| self.build(&templates, llm, index, reader))
    }
}

/// A [`PromptSkillSpec`] bound to its template and collaborators.
pub struct PromptSkill {
    spec: PromptSkillSpec,
    template: String,
    llm: Arc<dyn LanguageModel>,
    index: Arc<dyn VectorIndex>,
    reader: Arc<dyn NoteReader>,
}

/// What the argument resolved to.
enum Request {
    Search { query: String, input: String },
    Recent { days: u32 },
}

impl PromptSkill {
    fn resolve(&self, input: &str) -> Option<Request> {
        let input = input.trim();
        match self.spec.input {
            InputMode::Days => Some(Request::Recent { days: input.parse().unwrap_or(self.spec.recent_days) }),
            InputMode::Query if !input.is_empty() => {
                Some(Request::Search { query: input.to_string(), input: input.to_string() })
            }
            InputMode::Query | InputMode::None => self
                .spec
                .keywords
                .clone()
                .map(|query| Request::Search { query, input: input.to_string() }),
        }
    }

    fn fail(&self, source: sableye_core::Error) -> SkillError {
        SkillError::collaborator(self.spec.error_context.clone(), source)
    }

    async fn gather(&self, request: &Request) -> Result<Vec<Chunk>> {
        match request {
            Request::Search { query, .. } => {
                self.index.similarity_search(query, self.spec.k).await.map_err(|e| self.fail(e))
            }
            Request::Recent { days } => {
                let recent = self.reader.read_recent_notes(*days).await.map_err(|e| self.fail(e))?;
                if recent.is_empty() {
                    return Ok(recent);
                }

                let related = match &self.spec.keywords {
                    Some(keywords) => {
                        self.index.similarity_search(keywords, self.spec.k).await.map_err(|e| self.fail(e))?
                    }
                    None => Vec::new(),
                };

                let mut seen = HashSet::new();
                Ok(recent
                    .into_iter()
                    .chain(related)
                    .filter(|chunk| seen.insert(chunk.content.clone()))
                    .collect())
            }
        }
    }

    fn empty_message(&self, request: &Request) -> String {
        match request {
            Request::Search { input, .. } => render(&self.spec.empty_message, &[("input", input.as_str())]),
            Request::Recent { days } => render(&self.spec.empty_message, &[("days", days.to_string().as_str())]),
        }
    }

    fn prompt(&self, request: &Request, chunks: &[Chunk]) -> String {
        let notes = chunks
            .iter()
            .map(|chunk| self.spec.header.format(chunk))
            .collect::<Vec<_>>()
            .join("\n\n");

        let (input, days) = match request {
            Request::Search { input, .. } => (input.clone(), String::new()),
            Request::Recent { days } => (days.to_string(), days.to_string()),
        };

        let mut values: Vec<(&str, &str)> = vec![("input", input.as_str())];
        if let Some(alias) = &self.spec.input_alias {
            values.push((alias.as_str(), input.as_str()));
        }
        values.push(("days", days.as_str()));
        values.push(("notes", notes.as_str()));
        render(&self.template, &values)
    }
}

#[async_trait::async_trait]
impl ToolHandler for PromptSkill {
    async fn run(&self, input: &str) -> Result<String> {
        let Some(request) = self.resolve(input) else {
            return Ok(self.spec.input_hint.clone());
        };

        let mut chunks = self.gather(&request).await?;
        if chunks.is_empty() {
            return Ok(self.empty_message(&request));
        }

        if self.spec.order == Order::Chronological {
            chunks.sort_by(|a, b| a.metadata.modified_time.cmp(&b.metadata.modified_time));
        }
        if let Some(limit) = self.spec.limit {
            chunks.truncate(limit);
        }

        tracing::debug!(skill = %self.spec.name, entries = chunks.len(), "prompting model");
        let prompt = self.prompt(&request, &chunks);
        self.llm.invoke(&prompt).await.map_err(|e| self.fail(e))
    }
}
