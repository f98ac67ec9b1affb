//! Session bootstrap: configuration to a ready agent.
//!
//! Everything that can fail fatally happens here, before the first
//! message. Skill load failures are not fatal; they are kept in the
//! [`LoadReport`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use sableye_core::{Collaborators, Config, NoteReader, Result};
use sableye_providers::ProviderFactory;
use sableye_skills::{LoadReport, RegistryBuild, SkillRegistry};
use sableye_store::{IndexSummary, Indexer, TextSplitter, VaultReader};

use crate::agent::Agent;

/// Window used for the "recent notes" statistic.
pub const STATS_RECENT_DAYS: u32 = 30;

/// Vault and model figures shown by `/stats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultStats {
    pub total_notes: usize,
    pub recent_notes: usize,
    pub vault_path: PathBuf,
    pub model: String,
}

impl fmt::Display for VaultStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Notes: {}", self.total_notes)?;
        writeln!(f, "Recent Notes ({} days): {}", STATS_RECENT_DAYS, self.recent_notes)?;
        writeln!(f, "Vault Path: {}", self.vault_path.display())?;
        write!(f, "Model: {}", self.model)
    }
}

/// A validated configuration, a built index and an agent with its tools.
pub struct Session {
    config: Config,
    reader: Arc<VaultReader>,
    index: IndexSummary,
    report: LoadReport,
    agent: Agent,
}

impl Session {
    /// Validate `config`, index the vault and build the skill registry.
    ///
    /// `days` overrides `vault.load_days` when non-zero.
    #[tracing::instrument(skip_all)]
    pub async fn start(mut config: Config, days: Option<u32>) -> Result<Self> {
        config.validate()?;
        tracing::info!(model = %config.model.kind, name = %config.model.name, "initializing model");

        let provider = ProviderFactory::create_from_config(&config.model)?;
        let llm = ProviderFactory::language_model(&config.model, provider.clone());
        let embedder = ProviderFactory::create_embedder(&config.model)?;

        let reader = Arc::new(VaultReader::new(config.vault_path()?)?);
        let splitter = TextSplitter::new(config.vault.chunk_size, config.vault.chunk_overlap)?;
        let load_days = days.filter(|d| *d > 0).unwrap_or(config.vault.load_days);
        let (index, summary) = Indexer::new(reader.clone(), splitter, embedder).build(load_days).await?;

        let collaborators = Collaborators::new(llm, Arc::new(index), reader.clone());
        let RegistryBuild { tools, report } =
            SkillRegistry::from_config(&config.skills, config.agent.search_results_limit).build(&collaborators);

        let agent = Agent::new(provider, tools).configured(&config.agent, &config.model);
        tracing::info!(tools = agent.tools().len(), "agent ready");

        Ok(Self { config, reader, index: summary, report, agent })
    }

    /// Build the skill registry without a model or vault.
    ///
    /// Tools are bound to collaborators that report themselves unavailable,
    /// which is enough to list them and surface load failures.
    pub fn inspect_skills(config: &Config) -> RegistryBuild {
        SkillRegistry::from_config(&config.skills, config.agent.search_results_limit)
            .build(&Collaborators::unavailable())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index_summary(&self) -> &IndexSummary {
        &self.index
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut Agent {
        &mut self.agent
    }

    pub async fn chat(&mut self, message: &str) -> String {
        self.agent.chat(message).await
    }

    pub async fn stats(&self) -> Result<VaultStats> {
        let total_notes = self.reader.read_all_notes().await?.len();
        let recent_notes = self.reader.read_recent_notes(STATS_RECENT_DAYS).await?.len();
        Ok(VaultStats {
            total_notes,
            recent_notes,
            vault_path: self.reader.root().to_path_buf(),
            model: format!("{} ({})", self.config.model.kind, self.config.model.name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sableye_core::ModelKind;
    use sableye_skills::BUILTIN_SKILLS;
    use std::fs;
    use tempfile::TempDir;

    fn mock_config(vault: &TempDir, skills: &TempDir, responses: Option<PathBuf>) -> Config {
        let mut config = Config::default();
        config.model.kind = ModelKind::Mock;
        config.model.responses_file = responses;
        config.vault.path = Some(vault.path().to_path_buf());
        config.vault.chunk_size = 200;
        config.vault.chunk_overlap = 20;
        config.skills.dirs = vec![skills.path().to_path_buf()];
        config
    }

    fn vault() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("monday.md"), "Ran 5k and felt great. Goal: a half marathon.").unwrap();
        fs::write(dir.path().join("tuesday.md"), "Tired today, skipped the run.").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_start_with_mock_model() {
        let vault = vault();
        let skills = TempDir::new().unwrap();
        fs::write(
            skills.path().join("weekly_review.md"),
            "---\nname: weekly_review\ndescription: Review the week\ninput: days\nrecent_days: 7\n---\n{{notes}}",
        )
        .unwrap();

        let script = skills.path().join("responses.toml");
        fs::write(&script, "[[responses]]\ntype = \"text\"\ncontent = \"You ran twice.\"\n").unwrap();

        let mut session = Session::start(mock_config(&vault, &skills, Some(script)), None).await.unwrap();

        assert_eq!(session.index_summary().documents, 2);
        assert!(session.report().is_clean());
        assert_eq!(session.agent().tools().len(), BUILTIN_SKILLS.len() + 1);
        assert_eq!(session.chat("How often did I run?").await, "You ran twice.");

        let stats = session.stats().await.unwrap();
        assert_eq!(stats.total_notes, 2);
        assert_eq!(stats.recent_notes, 2);
        assert_eq!(stats.model, "mock (gpt-4)");
        assert!(stats.to_string().contains("Total Notes: 2"));
    }

    #[tokio::test]
    async fn test_start_requires_vault() {
        let skills = TempDir::new().unwrap();
        let mut config = Config::default();
        config.model.kind = ModelKind::Mock;
        config.skills.dirs = vec![skills.path().to_path_buf()];

        let err = Session::start(config, None).await.err().unwrap();
        assert!(err.to_string().contains("Vault path not configured"));
    }

    #[tokio::test]
    async fn test_start_fails_on_empty_vault() {
        let vault = TempDir::new().unwrap();
        let skills = TempDir::new().unwrap();

        let err = Session::start(mock_config(&vault, &skills, None), Some(7)).await.err().unwrap();
        assert!(err.to_string().contains("No documents found in vault"));
    }

    #[test]
    fn test_inspect_skills_reports_failures() {
        let vault = vault();
        let skills = TempDir::new().unwrap();
        fs::write(skills.path().join("broken.md"), "---\nname: broken\n---\n").unwrap();

        let build = Session::inspect_skills(&mock_config(&vault, &skills, None));
        assert_eq!(build.tools.len(), BUILTIN_SKILLS.len());
        assert_eq!(build.report.failures.len(), 1);
    }
}
