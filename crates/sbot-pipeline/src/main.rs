//! Topic-to-short-video pipeline binary.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sbot_pipeline::pipeline::summarize;
use sbot_pipeline::scheduler::default_topics;
use sbot_pipeline::{Pipeline, PipelineConfig, Scheduler};

#[derive(Parser)]
#[command(name = "sbot", about = "Turn a text topic into a short vertical video")]
struct Cli {
    /// Topic for the video (defaults to the configured topic)
    #[arg(long)]
    topic: Option<String>,

    /// Enable the publish stage for this run
    #[arg(long)]
    publish: bool,

    /// Print the final run report as JSON instead of a summary line
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run daily at a fixed local time, rotating through a topic list
    Schedule {
        /// Local time of day, HH:MM
        #[arg(long, default_value = "10:00")]
        at: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("sbot=info".parse().expect("valid directive"));

    if use_json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let cli = Cli::parse();

    let mut config = PipelineConfig::from_env();
    if cli.publish {
        config.upload_enabled = true;
    }

    info!("Starting sbot");

    if let Err(e) = sbot_pipeline::renderer::check_toolchain() {
        tracing::warn!("{} (the video stage will fail without it)", e);
    }

    let pipeline = Pipeline::from_env(config);

    match cli.command {
        Some(Command::Schedule { at }) => {
            let at = chrono::NaiveTime::parse_from_str(&at, "%H:%M")
                .with_context(|| format!("invalid --at time '{at}', expected HH:MM"))?;
            Scheduler::new(pipeline, at, default_topics())
                .run_forever()
                .await;
        }
        None => {
            let report = pipeline.run(cli.topic.as_deref()).await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", summarize(&report));
            }

            if !report.is_success() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
