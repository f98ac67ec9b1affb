//! Skill discovery from manifest directories.
//!
//! Each `<identifier>.md` file directly inside a directory is one candidate.
//! Subdirectories and other files are ignored.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::parser::parse_manifest_file;
use crate::registry::SkillSource;
use crate::template::PromptTemplates;
use crate::types::SkillCandidate;
use sableye_core::config::expand_home;

const MANIFEST_EXTENSION: &str = "md";

/// A directory of markdown skill manifests.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    dir: PathBuf,
}

impl ManifestSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: expand_home(dir.as_ref()) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Manifest files in the directory, unsorted.
    fn manifest_paths(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(dir = %self.dir.display(), error = %e, "failed to read skills directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().is_some_and(|ext| ext == MANIFEST_EXTENSION))
            .collect()
    }
}

impl SkillSource for ManifestSource {
    fn label(&self) -> String {
        format!("manifests:{}", self.dir.display())
    }

    fn candidates(&self) -> Vec<SkillCandidate> {
        if !self.dir.is_dir() {
            tracing::debug!(dir = %self.dir.display(), "skills directory does not exist");
            return Vec::new();
        }

        self.manifest_paths()
            .into_iter()
            .filter_map(|path| {
                let identifier = path.file_stem()?.to_string_lossy().to_string();
                let candidate = match parse_manifest_file(&path) {
                    // Manifest bodies are inline templates; no named lookup happens.
                    Ok(spec) => SkillCandidate {
                        identifier,
                        definition: Ok(spec.into_definition(PromptTemplates::default())),
                    },
                    Err(e) => SkillCandidate::failed(identifier, e),
                };
                Some(candidate)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sableye_core::testing::{ScriptedModel, StaticIndex, StaticReader, collaborators, note};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, content: &str) {
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_missing_directory_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let source = ManifestSource::new(dir.path().join("absent"));
        assert!(source.candidates().is_empty());
    }

    #[test]
    fn test_candidates_from_manifests() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "recall.md", "---\nname: recall\ndescription: Recall\n---\n{{notes}}");
        write(dir.path(), "notes.txt", "not a manifest");
        fs::create_dir(dir.path().join("nested")).unwrap();
        write(&dir.path().join("nested"), "deep.md", "---\nname: deep\ndescription: Deep\n---\n{{notes}}");

        let source = ManifestSource::new(dir.path());
        let candidates = source.candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].identifier, "recall");
        assert_eq!(candidates[0].definition.as_ref().unwrap().name, "recall");
    }

    #[tokio::test]
    async fn test_manifest_body_is_the_prompt() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "recall.md", "---\nname: recall\ndescription: Recall\n---\nAbout {{input}}:\n{{notes}}");

        let llm = Arc::new(ScriptedModel::replying("Recalled."));
        let index = StaticIndex::new(vec![note("a.md", "2024-01-01T09:00:00", "Ran 5k")]);
        let collaborators = collaborators(llm.clone(), Arc::new(index), Arc::new(StaticReader::empty()));

        let candidates = ManifestSource::new(dir.path()).candidates();
        let tool = candidates[0].definition.as_ref().unwrap().instantiate(&collaborators).unwrap();

        assert_eq!(tool.call("running").await, "Recalled.");
        let prompts = llm.prompts();
        assert!(prompts[0].starts_with("About running:"));
        assert!(prompts[0].contains("Ran 5k"));
    }

    #[test]
    fn test_unparseable_manifest_is_failed_candidate() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "broken.md", "no frontmatter here");

        let candidates = ManifestSource::new(dir.path()).candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].identifier, "broken");
        assert!(candidates[0].definition.is_err());
    }

    #[test]
    fn test_label_names_directory() {
        let source = ManifestSource::new("/tmp/skills");
        assert_eq!(source.label(), "manifests:/tmp/skills");
        assert_eq!(source.dir(), Path::new("/tmp/skills"));
    }
}
