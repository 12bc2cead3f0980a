use anyhow::Result;
use clap::Parser;
use colored::*;
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;

use acestep_client::{
    download_artifacts, ensure_connection, save_result, text_at, ApiClient, Cli, Command, Config,
    ConfigArgs, GenerateArgs, GenerateRequest, PollOutcome, PollState, RandomArgs, CONFIG_KEYS,
    OUTPUT_DIR,
};

/// A job that the service reports as failed is not a client crash; it gets
/// its own exit code so scripts can tell the two apart.
const EXIT_JOB_FAILED: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            println!("{} Error: {:#}", "✗".red(), e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Generate(args) => generate(args).await,
        Command::Random(args) => random(args).await,
        Command::Status { job_id } => status(&job_id).await,
        Command::Models => models().await,
        Command::Health => health().await,
        Command::Config(args) => config_command(args),
    }
}

async fn generate(args: GenerateArgs) -> Result<i32> {
    let (caption, lyrics, description) = args.prompt_fields();

    let mut config = Config::load()?;
    let mut request = GenerateRequest::new(caption, lyrics, description, &config.generation);

    if let Some(thinking) = args.thinking_override() {
        request.thinking = thinking;
    }
    if args.no_format {
        request.use_format = false;
    }
    if let Some(language) = args.language {
        request.vocal_language = language;
    }
    request.model = args.model;
    request.inference_steps = args.steps;
    request.guidance_scale = args.guidance;
    request.audio_duration = args.duration;
    request.bpm = args.bpm;
    request.batch_size = args.batch;
    if let Some(seed) = args.seed {
        request.set_seed(seed);
    }

    // Usage errors never reach the network.
    request.validate()?;

    let client = ensure_connection(&mut config).await?;
    let job_id = client.submit_generate(&request).await?;
    println!("{} Submitted job {}", "✓".green(), job_id.bold());

    if args.no_wait {
        return Ok(0);
    }

    wait_for_job(&client, &config, &job_id).await
}

async fn random(args: RandomArgs) -> Result<i32> {
    let mut config = Config::load()?;
    let thinking = args
        .thinking_override()
        .unwrap_or(config.generation.thinking);

    let client = ensure_connection(&mut config).await?;
    let job_id = client.submit_random(thinking).await?;
    println!("{} Submitted job {}", "✓".green(), job_id.bold());

    if args.no_wait {
        return Ok(0);
    }

    wait_for_job(&client, &config, &job_id).await
}

async fn status(job_id: &str) -> Result<i32> {
    let mut config = Config::load()?;
    let client = ensure_connection(&mut config).await?;

    let body = client.fetch_job(job_id).await?;
    let state = acestep_client::classify(&body);

    if !state.is_terminal() {
        match &state {
            PollState::Queued { position: Some(p) } => {
                println!("{} Job {} is queued (position {})", "⋯".blue(), job_id, p);
            }
            PollState::Queued { position: None } => {
                println!("{} Job {} is queued", "⋯".blue(), job_id);
            }
            PollState::InProgress { status } => {
                println!("{} Job {} is in progress ({})", "⋯".blue(), job_id, status);
            }
            _ => {}
        }
        return Ok(0);
    }

    finalize(&client, &config, job_id, &PollOutcome { state, body }).await
}

async fn models() -> Result<i32> {
    let mut config = Config::load()?;
    let client = ensure_connection(&mut config).await?;

    println!("{}", client.list_models().await?);
    Ok(0)
}

async fn health() -> Result<i32> {
    let config = Config::load()?;
    let client = ApiClient::new(config.api_url.clone());

    client.check_health().await?;
    println!("{} Service at {} is healthy", "✓".green(), config.api_url);
    Ok(0)
}

fn config_command(args: ConfigArgs) -> Result<i32> {
    let mut config = Config::load()?;

    if let Some(key) = args.get {
        let value = config
            .get(&key)
            .ok_or_else(|| anyhow::anyhow!("Unknown config key: {}", key))?;
        println!("{}", value);
    } else if let Some(pair) = args.set {
        config.set(&pair[0], &pair[1])?;
        config.save()?;
        println!("{} {} = {}", "✓".green(), pair[0], pair[1]);
    } else if args.reset {
        config.reset();
        config.save()?;
        println!("{} Configuration restored to defaults", "✓".green());
    } else {
        // --list, and the bare `config` command
        for key in CONFIG_KEYS {
            println!("{} = {}", key, config.get(key).unwrap_or_default());
        }
    }

    Ok(0)
}

/// Drives the poll loop with an inline spinner: queue position and the
/// generating indicator redraw in place rather than logging a line per poll.
async fn wait_for_job(client: &ApiClient, config: &Config, job_id: &str) -> Result<i32> {
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Waiting for job...");

    let outcome = client
        .poll_job(job_id, |state| match state {
            PollState::Queued { position: Some(p) } => {
                spinner.set_message(format!("Queued (position {})", p));
            }
            PollState::Queued { position: None } => {
                spinner.set_message("Queued");
            }
            PollState::InProgress { .. } => {
                spinner.set_message("Generating...");
            }
            _ => {}
        })
        .await;

    spinner.finish_and_clear();
    finalize(client, config, job_id, &outcome?).await
}

/// Terminal-state handling shared by `generate`, `random`, and `status`:
/// persist the document, then download artifacts on success or surface the
/// service's error on failure.
async fn finalize(
    client: &ApiClient,
    config: &Config,
    job_id: &str,
    outcome: &PollOutcome,
) -> Result<i32> {
    let output_dir = Path::new(OUTPUT_DIR);
    let saved = save_result(output_dir, job_id, &outcome.body)?;
    println!("{} Saved result to {}", "✓".green(), saved.display());

    match &outcome.state {
        PollState::Succeeded => {
            let doc: serde_json::Value =
                serde_json::from_str(&outcome.body).unwrap_or(serde_json::Value::Null);
            for key in ["bpm", "keyscale", "duration"] {
                if let Some(value) = text_at(&doc, key) {
                    println!("  {}: {}", key.bold(), value);
                }
            }

            download_artifacts(
                client,
                output_dir,
                job_id,
                &outcome.body,
                &config.generation.audio_format,
            )
            .await?;

            println!("{} Generation complete!", "✓".green());
            Ok(0)
        }
        PollState::Failed { error } => {
            let reason = if error.is_empty() {
                "unknown error"
            } else {
                error.as_str()
            };
            println!("{} Generation failed: {}", "✗".red(), reason);
            Ok(EXIT_JOB_FAILED)
        }
        // Callers only hand terminal outcomes to finalize.
        other => anyhow::bail!("Job {} is not in a terminal state: {:?}", job_id, other),
    }
}
