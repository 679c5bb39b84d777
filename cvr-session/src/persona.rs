//! Reviewer personas.
//!
//! A persona only changes the voice of the reply. The retrieved passages and
//! the question are passed through untouched, so switching persona never
//! changes which facts the model is given.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Instruction text carried by a persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaTemplate {
    /// System prompt placed at position 0 of the conversation.
    pub system: &'static str,
    /// Directive that opens every composed question prompt.
    pub directive: &'static str,
}

const FORMAL: PersonaTemplate = PersonaTemplate {
    system: "You are a highly professional, friendly and supportive HR manager. \
Your task is to review the candidate's CV and answer the user's questions politely. \
Speak formally and constructively, encourage the candidate, and always look for the \
positive side of their profile even when their skills are limited. \
Base every statement on the CV excerpts you are given.",
    directive: "Answer as a formal, supportive CV reviewer. Be polite and constructive, \
and point out strengths before gaps. Use only the CV excerpts below as evidence; \
if they do not contain the answer, say so plainly.",
};

const SAVAGE: PersonaTemplate = PersonaTemplate {
    system: "You are a harsh, cynical and elitist HR manager from South Jakarta. \
Your task is to roast the candidate's CV. You look down on candidates with average skills. \
Mix English slang into every sentence: \"literally\", \"honestly\", \"prefer\", \"vibe\", \
\"red flag\", \"big no\", \"lowkey\", \"makes sense\", \"culture fit\", \"cringe\". \
Your tone is not angry but casually dismissive and passive-aggressive. Do not be polite; \
if a skill is weak, say it is weak. You are still strictly factual: never invent anything \
that is not in the CV excerpts you are given.",
    directive: "Answer as a savage, sardonic CV critic. Be blunt and dismissive in tone, \
but every fact you state must come from the CV excerpts below; \
if they do not contain the answer, say so plainly.",
};

/// The voice the reviewer answers in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Professional, supportive reviewer.
    #[default]
    Formal,
    /// Sardonic critic that still answers factually.
    Savage,
}

impl Persona {
    /// All personas in display order.
    pub const ALL: [Persona; 2] = [Persona::Formal, Persona::Savage];

    /// Instruction text for this persona.
    pub fn template(self) -> &'static PersonaTemplate {
        match self {
            Persona::Formal => &FORMAL,
            Persona::Savage => &SAVAGE,
        }
    }

    /// System prompt for this persona.
    pub fn system_prompt(self) -> &'static str {
        self.template().system
    }

    /// Per-question directive for this persona.
    pub fn directive(self) -> &'static str {
        self.template().directive
    }

    /// Sampling temperature used when no override is configured.
    pub fn default_temperature(self) -> f32 {
        match self {
            Persona::Formal => 0.7,
            Persona::Savage => 0.8,
        }
    }

    /// Stable lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Persona::Formal => "formal",
            Persona::Savage => "savage",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Persona::Formal => "Friendly HR (professional)",
            Persona::Savage => "Savage HR (brutal)",
        }
    }

    /// Avatar shown next to this persona's replies.
    pub fn icon(self) -> &'static str {
        match self {
            Persona::Formal => "😇",
            Persona::Savage => "😈",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a persona name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown persona '{0}', expected 'formal' or 'savage'")]
pub struct ParsePersonaError(pub String);

impl FromStr for Persona {
    type Err = ParsePersonaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "formal" | "friendly" => Ok(Persona::Formal),
            "savage" | "brutal" => Ok(Persona::Savage),
            other => Err(ParsePersonaError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Formal".parse::<Persona>().unwrap(), Persona::Formal);
        assert_eq!(" SAVAGE ".parse::<Persona>().unwrap(), Persona::Savage);
        assert!("grumpy".parse::<Persona>().is_err());
    }

    #[test]
    fn personas_differ_in_voice_and_temperature() {
        assert_ne!(Persona::Formal.directive(), Persona::Savage.directive());
        assert_ne!(Persona::Formal.system_prompt(), Persona::Savage.system_prompt());
        assert!(Persona::Savage.default_temperature() > Persona::Formal.default_temperature());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for persona in Persona::ALL {
            assert_eq!(persona.to_string().parse::<Persona>().unwrap(), persona);
        }
    }
}
