use anyhow::Result;
use serde::Serialize;

use crate::config::GenerationConfig;

/// Payload for `POST /v1/music/generate`. The textual prompt fields are
/// always serialized, even when empty, because the service distinguishes
/// "empty" from "absent". Optional tuning knobs are omitted when unset so
/// the service applies its own defaults.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub caption: String,
    pub lyrics: String,
    pub sample_query: String,
    pub thinking: bool,
    pub use_format: bool,
    pub use_cot_caption: bool,
    pub use_cot_language: bool,
    pub vocal_language: String,
    pub audio_format: String,
    pub use_random_seed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bpm: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
}

impl GenerateRequest {
    /// Builds a request with generation options taken from config defaults.
    /// CLI overrides are applied on top by the caller.
    pub fn new(
        caption: String,
        lyrics: String,
        sample_query: String,
        defaults: &GenerationConfig,
    ) -> Self {
        Self {
            caption,
            lyrics,
            sample_query,
            thinking: defaults.thinking,
            use_format: defaults.use_format,
            use_cot_caption: defaults.use_cot_caption,
            use_cot_language: defaults.use_cot_language,
            vocal_language: defaults.vocal_language.clone(),
            audio_format: defaults.audio_format.clone(),
            use_random_seed: true,
            model: None,
            inference_steps: None,
            guidance_scale: None,
            seed: None,
            audio_duration: None,
            bpm: None,
            batch_size: None,
        }
    }

    /// A fixed seed disables random seeding.
    pub fn set_seed(&mut self, seed: i64) {
        self.seed = Some(seed);
        self.use_random_seed = false;
    }

    /// Exactly one of caption or sample_query must be non-empty.
    pub fn validate(&self) -> Result<()> {
        match (self.caption.is_empty(), self.sample_query.is_empty()) {
            (true, true) => anyhow::bail!(
                "A caption or a description is required (pass CAPTION, -c, or -d)"
            ),
            (false, false) => anyhow::bail!(
                "Caption and description are mutually exclusive; provide one"
            ),
            _ => Ok(()),
        }
    }
}

/// Payload for `POST /v1/music/random`.
#[derive(Debug, Clone, Serialize)]
pub struct RandomRequest {
    pub thinking: bool,
}
