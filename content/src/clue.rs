//! Clue file resolution.
//!
//! Clues live under `clues/day<N>/` (with `clues/day <N>/` accepted as a
//! legacy spelling). A candidate file matches when its lowercase name starts
//! with the suspect key and its extension is a recognized format. Candidates
//! are sorted by filename so a tie between several matches resolves
//! deterministically rather than by directory listing order.

use std::path::{Path, PathBuf};

use gumshoe_types::SuspectKey;

/// Structured clue files expose one of these fields, checked in order.
const STRUCTURED_FIELDS: [&str; 3] = ["clue", "text", "content"];

/// A clue file in one of the two recognized formats.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ClueSource {
    /// JSON file carrying the clue body in a named field.
    Structured(PathBuf),
    /// Plain text file; the whole trimmed content is the clue body.
    PlainText(PathBuf),
}

impl ClueSource {
    fn from_path(path: PathBuf) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("json") {
            Some(Self::Structured(path))
        } else if ext.eq_ignore_ascii_case("txt") {
            Some(Self::PlainText(path))
        } else {
            None
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Structured(path) | Self::PlainText(path) => path,
        }
    }

    fn decode(&self) -> std::io::Result<String> {
        let raw = std::fs::read_to_string(self.path())?;
        match self {
            Self::Structured(path) => {
                let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("{}: {e}", path.display()),
                    )
                })?;
                let body = STRUCTURED_FIELDS
                    .iter()
                    .find_map(|field| value.get(field).and_then(serde_json::Value::as_str))
                    .unwrap_or("No clue text found in JSON");
                Ok(body.to_string())
            }
            Self::PlainText(_) => Ok(raw.trim().to_string()),
        }
    }
}

/// The fixed string returned when no clue file matches.
#[must_use]
pub fn clue_placeholder(suspect: &SuspectKey) -> String {
    format!("No new clues for {} today.", suspect.display_name())
}

pub(crate) fn resolve(clues_root: &Path, day: u8, suspect: &SuspectKey) -> String {
    for dir_name in [format!("day{day}"), format!("day {day}")] {
        let dir = clues_root.join(&dir_name);
        let Some(source) = first_match(&dir, suspect) else {
            continue;
        };
        match source.decode() {
            Ok(body) => {
                tracing::debug!(day, suspect = %suspect, path = %source.path().display(), "Clue resolved");
                return format!("Clue about {}: {body}", suspect.display_name());
            }
            Err(e) => {
                tracing::warn!(day, suspect = %suspect, error = %e, "Failed to read clue file");
            }
        }
    }

    tracing::debug!(day, suspect = %suspect, "No clue file matched");
    clue_placeholder(suspect)
}

fn first_match(dir: &Path, suspect: &SuspectKey) -> Option<ClueSource> {
    let entries = std::fs::read_dir(dir).ok()?;

    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.to_ascii_lowercase().starts_with(suspect.as_str()))
        })
        .collect();

    // Deterministic tie-break: lexicographic by filename.
    candidates.sort();
    candidates.into_iter().find_map(ClueSource::from_path)
}
