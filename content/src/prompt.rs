//! The interrogation prompt template.

use gumshoe_types::SuspectKey;

use crate::CharacterProfile;

/// A text template with named placeholders for one interrogation turn.
///
/// Recognized placeholders: `{name}`, `{question}`, `{tone}`, `{backstory}`,
/// `{time_range}`, `{location}`, `{relationship_to_victim}`. Fields the
/// profile does not resolve fill in as empty strings.
#[derive(Debug, Clone)]
pub struct PromptTemplate(String);

impl PromptTemplate {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fill every placeholder from the suspect's profile and the question.
    #[must_use]
    pub fn fill(&self, suspect: &SuspectKey, profile: &CharacterProfile, question: &str) -> String {
        self.0
            .replace("{name}", &suspect.display_name())
            .replace("{question}", question)
            .replace("{tone}", &profile.tone)
            .replace("{backstory}", &profile.backstory)
            .replace("{time_range}", &profile.timeline.time_range)
            .replace("{location}", profile.timeline.claimed())
            .replace("{relationship_to_victim}", &profile.relationship_to_victim)
    }
}
