//! Suspect profile data.

use serde::{Deserialize, Serialize};

fn default_tone() -> String {
    "neutral".to_string()
}

fn default_relationship() -> String {
    "Unknown relationship".to_string()
}

/// A suspect's claimed whereabouts during the crime window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeline {
    pub time_range: String,
    pub location: String,
    pub claimed_location: String,
}

impl Timeline {
    /// The location to present during interrogation: the explicitly claimed
    /// one when authored, otherwise the plain location.
    #[must_use]
    pub fn claimed(&self) -> &str {
        if self.claimed_location.is_empty() {
            &self.location
        } else {
            &self.claimed_location
        }
    }
}

/// A fixed NPC identity the player can question.
///
/// Immutable once loaded; owned by the content store and shared read-only
/// across the whole run. Missing fields default rather than fail so a
/// partially-authored suspect still interrogates sensibly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterProfile {
    pub occupation: String,
    #[serde(default = "default_relationship")]
    pub relationship_to_victim: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    pub backstory: String,
    pub timeline: Timeline,
}

impl Default for CharacterProfile {
    fn default() -> Self {
        Self {
            occupation: String::new(),
            relationship_to_victim: default_relationship(),
            tone: default_tone(),
            backstory: String::new(),
            timeline: Timeline::default(),
        }
    }
}
