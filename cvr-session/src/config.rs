//! Session configuration.

use std::time::Duration;

use cvr_model::ChatClientConfig;
use cvr_model::openai::{DEFAULT_GROQ_MODEL, GROQ_API_BASE};
use cvr_rag::RagConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::persona::Persona;

/// Default generation timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Where and how replies are generated.
///
/// The API key is deliberately absent: it is supplied at runtime and never
/// written to a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Model identifier sent to the endpoint.
    pub model: String,
    /// OpenAI-compatible API base URL.
    pub base_url: String,
    /// Bound on one generation round trip, in seconds.
    pub timeout_secs: u64,
    /// Optional cap on reply length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_GROQ_MODEL.to_string(),
            base_url: GROQ_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: None,
        }
    }
}

impl GenerationSettings {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Client settings for these values and the given key.
    pub fn client_config(&self, api_key: impl Into<String>) -> ChatClientConfig {
        ChatClientConfig::compatible(api_key, &self.base_url, &self.model)
            .with_timeout(self.timeout())
    }
}

/// Sampling temperature per persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaTemperatures {
    /// Temperature for [`Persona::Formal`].
    pub formal: f32,
    /// Temperature for [`Persona::Savage`].
    pub savage: f32,
}

impl Default for PersonaTemperatures {
    fn default() -> Self {
        Self {
            formal: Persona::Formal.default_temperature(),
            savage: Persona::Savage.default_temperature(),
        }
    }
}

impl PersonaTemperatures {
    /// Temperature for the given persona.
    pub fn for_persona(&self, persona: Persona) -> f32 {
        match persona {
            Persona::Formal => self.formal,
            Persona::Savage => self.savage,
        }
    }
}

/// Everything a [`Session`](crate::Session) can be tuned with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Chunking and retrieval.
    pub rag: RagConfig,
    /// Generation endpoint.
    pub generation: GenerationSettings,
    /// Per-persona sampling temperatures.
    pub temperatures: PersonaTemperatures,
    /// Persona active when the session starts.
    pub persona: Persona,
}

impl SessionConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.rag.validate()?;

        if self.generation.model.trim().is_empty() {
            return Err(SessionError::Config("generation.model must not be empty".into()));
        }
        if self.generation.base_url.trim().is_empty() {
            return Err(SessionError::Config("generation.base_url must not be empty".into()));
        }
        if self.generation.timeout_secs == 0 {
            return Err(SessionError::Config("generation.timeout_secs must be greater than 0".into()));
        }
        for persona in Persona::ALL {
            let t = self.temperatures.for_persona(persona);
            if !(0.0..=2.0).contains(&t) {
                return Err(SessionError::Config(format!(
                    "temperature for {persona} must be between 0.0 and 2.0, got {t}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SessionConfig::default();
        assert_eq!(config.rag.chunk_size, 1000);
        assert_eq!(config.rag.chunk_overlap, 200);
        assert_eq!(config.rag.top_k, 4);
        assert_eq!(config.generation.timeout(), Duration::from_secs(120));
        assert_eq!(config.generation.model, "llama-3.1-8b-instant");
        assert_eq!(config.temperatures.for_persona(Persona::Formal), 0.7);
        assert_eq!(config.temperatures.for_persona(Persona::Savage), 0.8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn out_of_range_temperature_is_rejected() {
        let mut config = SessionConfig::default();
        config.temperatures.savage = 3.5;
        assert!(matches!(config.validate(), Err(SessionError::Config(_))));
    }

    #[test]
    fn invalid_rag_section_is_rejected() {
        let mut config = SessionConfig::default();
        config.rag.chunk_overlap = config.rag.chunk_size;
        assert!(matches!(config.validate(), Err(SessionError::Rag(_))));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: SessionConfig = toml::from_str(
            r#"
            persona = "savage"

            [rag]
            top_k = 2

            [generation]
            timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.persona, Persona::Savage);
        assert_eq!(config.rag.top_k, 2);
        assert_eq!(config.rag.chunk_size, 1000);
        assert_eq!(config.generation.timeout_secs, 30);
        assert_eq!(config.generation.base_url, GROQ_API_BASE);
    }
}
