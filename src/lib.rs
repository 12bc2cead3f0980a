mod client;
mod config;
mod fields;
mod models;
mod output;

// Re-export types needed for the public API
pub use client::{
    classify, ensure_connection, extract_job_id, poll_job_with, ApiClient, PollOutcome,
    PollState, POLL_INTERVAL,
};
pub use config::{Config, GenerationConfig, CONFIG_KEYS, DEFAULT_API_URL};
pub use fields::{strings_at, text_at, value_at};
pub use models::{GenerateRequest, RandomRequest};
pub use output::{
    artifact_path, artifact_paths, download_artifacts, result_path, save_result, OUTPUT_DIR,
};

// Re-export command line types
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "ACE-Step music generation client", long_about = None)]
#[command(after_help = "Examples:
  acestep-client generate \"Pop music with guitar\"
  acestep-client generate -d \"an upbeat summer festival track\" --seed 42
  acestep-client random --no-wait
  acestep-client status <JOB_ID>
  acestep-client config --set generation.audio_format flac")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit a generation job from a caption, description, or lyrics
    Generate(GenerateArgs),
    /// Submit a fully random generation job
    Random(RandomArgs),
    /// Fetch the current status of a job
    Status {
        /// Job identifier returned at submission
        #[arg(value_name = "JOB_ID")]
        job_id: String,
    },
    /// List the models available on the service
    Models,
    /// Check that the configured service endpoint is reachable
    Health,
    /// Inspect or modify the persisted configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Caption describing the track to generate
    #[arg(value_name = "CAPTION")]
    pub caption: Option<String>,

    /// Caption as a flag instead of the positional argument
    #[arg(short = 'c', long = "caption", value_name = "TEXT", conflicts_with = "caption")]
    pub caption_flag: Option<String>,

    /// Free-form description the service samples a caption from
    #[arg(short, long)]
    pub description: Option<String>,

    /// Lyrics to sing
    #[arg(short, long)]
    pub lyrics: Option<String>,

    /// Enable LM thinking mode
    #[arg(long, overrides_with = "no_thinking")]
    pub thinking: bool,

    /// Disable LM thinking mode
    #[arg(long = "no-thinking", overrides_with = "thinking")]
    pub no_thinking: bool,

    /// Skip the LM lyric formatting pass
    #[arg(long = "no-format")]
    pub no_format: bool,

    /// Model to generate with (service default when omitted)
    #[arg(long)]
    pub model: Option<String>,

    /// Vocal language (config default when omitted)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// DiT inference steps
    #[arg(long)]
    pub steps: Option<u32>,

    /// Guidance scale
    #[arg(long)]
    pub guidance: Option<f64>,

    /// Fixed seed (disables random seeding)
    #[arg(long, allow_hyphen_values = true)]
    pub seed: Option<i64>,

    /// Audio duration in seconds (-1 for auto)
    #[arg(long, allow_hyphen_values = true)]
    pub duration: Option<f64>,

    /// Tempo in beats per minute
    #[arg(long)]
    pub bpm: Option<u32>,

    /// Number of tracks to generate in one job
    #[arg(long)]
    pub batch: Option<u32>,

    /// Print the job id and exit without polling
    #[arg(long = "no-wait")]
    pub no_wait: bool,
}

impl GenerateArgs {
    /// Caption, lyrics, and description with the flag form winning over
    /// the positional caption.
    pub fn prompt_fields(&self) -> (String, String, String) {
        let caption = self
            .caption_flag
            .clone()
            .or_else(|| self.caption.clone())
            .unwrap_or_default();
        let lyrics = self.lyrics.clone().unwrap_or_default();
        let description = self.description.clone().unwrap_or_default();
        (caption, lyrics, description)
    }

    pub fn thinking_override(&self) -> Option<bool> {
        if self.thinking {
            Some(true)
        } else if self.no_thinking {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Args, Debug)]
pub struct RandomArgs {
    /// Enable LM thinking mode
    #[arg(long, overrides_with = "no_thinking")]
    pub thinking: bool,

    /// Disable LM thinking mode
    #[arg(long = "no-thinking", overrides_with = "thinking")]
    pub no_thinking: bool,

    /// Print the job id and exit without polling
    #[arg(long = "no-wait")]
    pub no_wait: bool,
}

impl RandomArgs {
    pub fn thinking_override(&self) -> Option<bool> {
        if self.thinking {
            Some(true)
        } else if self.no_thinking {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print the value of a single key
    #[arg(long, value_name = "KEY")]
    pub get: Option<String>,

    /// Set a key to a value
    #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"])]
    pub set: Option<Vec<String>>,

    /// Restore the compiled-in defaults
    #[arg(long)]
    pub reset: bool,

    /// Print every key and its current value
    #[arg(long)]
    pub list: bool,
}
