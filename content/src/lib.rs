//! Static story content loading for Gumshoe.
//!
//! [`ContentStore`] is a pure lookup service over a content directory:
//!
//! ```text
//! <root>/
//!   suspects/<key>.json            character profiles
//!   prompts/interrogation_prompt.txt
//!   clues/day<N>/ or "day <N>"/    per-day clue files (.json or .txt)
//!   story/solution.json            the ground-truth culprit key
//! ```
//!
//! Profiles tolerate missing optional fields (they default rather than fail),
//! and clue lookups never fail: a missing directory or file yields a fixed
//! "no new clue" placeholder. Only a missing profile, template, or solution
//! propagates as an error.

mod clue;
mod profile;
mod prompt;

pub use clue::clue_placeholder;
pub use profile::{CharacterProfile, Timeline};
pub use prompt::PromptTemplate;

use std::path::{Path, PathBuf};

use thiserror::Error;

use gumshoe_types::SuspectKey;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("no suspect profile found for {0}")]
    ProfileNotFound(SuspectKey),
    #[error("prompt template not found at {}", path.display())]
    TemplateMissing { path: PathBuf },
    #[error("story solution not found at {}", path.display())]
    SolutionMissing { path: PathBuf },
    #[error("malformed content file {}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read-only access to the game's narrative content.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load a suspect's profile.
    ///
    /// A missing file is [`ContentError::ProfileNotFound`]; a malformed file
    /// degrades to a default profile rather than failing, matching the
    /// tolerance for partially-authored content.
    pub fn profile(&self, suspect: &SuspectKey) -> Result<CharacterProfile, ContentError> {
        let path = self
            .root
            .join("suspects")
            .join(format!("{}.json", suspect.as_str()));
        if !path.exists() {
            return Err(ContentError::ProfileNotFound(suspect.clone()));
        }
        let raw = read_file(&path)?;
        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(profile),
            Err(e) => {
                tracing::warn!(suspect = %suspect, error = %e, "Malformed suspect profile; using defaults");
                Ok(CharacterProfile::default())
            }
        }
    }

    /// All suspect keys with a profile on disk, sorted.
    pub fn roster(&self) -> Result<Vec<SuspectKey>, ContentError> {
        let dir = self.root.join("suspects");
        let entries = std::fs::read_dir(&dir).map_err(|source| ContentError::Io {
            path: dir,
            source,
        })?;

        let mut roster = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && let Ok(key) = SuspectKey::new(stem)
            {
                roster.push(key);
            }
        }
        roster.sort();
        Ok(roster)
    }

    /// Load the interrogation prompt template. A missing template is an
    /// authoring error and propagates.
    pub fn prompt_template(&self) -> Result<PromptTemplate, ContentError> {
        let path = self.root.join("prompts").join("interrogation_prompt.txt");
        if !path.exists() {
            return Err(ContentError::TemplateMissing { path });
        }
        Ok(PromptTemplate::new(read_file(&path)?))
    }

    /// Resolve the clue text for a day/suspect pair.
    ///
    /// Never fails: any miss yields the fixed placeholder string.
    #[must_use]
    pub fn clue(&self, day: u8, suspect: &SuspectKey) -> String {
        clue::resolve(&self.root.join("clues"), day, suspect)
    }

    /// The ground-truth culprit key from the story content.
    pub fn solution(&self) -> Result<SuspectKey, ContentError> {
        #[derive(serde::Deserialize)]
        struct Solution {
            culprit: SuspectKey,
        }

        let path = self.root.join("story").join("solution.json");
        if !path.exists() {
            return Err(ContentError::SolutionMissing { path });
        }
        let raw = read_file(&path)?;
        let solution: Solution =
            serde_json::from_str(&raw).map_err(|source| ContentError::Malformed { path, source })?;
        Ok(solution.culprit)
    }
}

fn read_file(path: &Path) -> Result<String, ContentError> {
    std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })
}
