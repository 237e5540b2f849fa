//! vtvguide - virtual TV guide CLI.

/// Application configuration (TOML).
mod config;
/// Guide window parsing.
mod window;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::{API_KEY_ENV, AppConfig, resolve_cache_dir, resolve_config_path};
use crate::window::resolve_guide_window;
use vtvguide_api::library::LibraryClient;
use vtvguide_schedule::{LocalTunerHost, VirtualTuner, channel_lineup};
use vtvguide_store::{FsRecordStore, ScheduleStore};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/cache directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List the channels of a tuner.
    Channels(ChannelsArgs),
    /// Show guide programs of a channel.
    Guide(GuideArgs),
    /// Show playback sources of the program airing now.
    Play(PlayArgs),
    /// Delete every cached schedule of a tuner.
    Reset(ResetArgs),
}

/// Arguments for the `channels` subcommand.
#[derive(clap::Args)]
struct ChannelsArgs {
    /// Configured tuner ID.
    #[arg(long, required = true)]
    tuner: String,
}

/// Arguments for the `guide` subcommand.
#[derive(clap::Args)]
struct GuideArgs {
    /// Configured tuner ID.
    #[arg(long, required = true)]
    tuner: String,

    /// Channel ID (e.g. "favoritemovies").
    #[arg(long, required = true)]
    channel: String,

    /// Window start in UTC (default: now).
    /// Formats: "2024-01-01T00:00:00", "2024-01-01 00:00:00", "2024-01-01".
    #[arg(long)]
    time_since: Option<String>,

    /// Window end in UTC (default: now + 1 day). Same formats as --time-since.
    #[arg(long)]
    time_until: Option<String>,
}

/// Arguments for the `play` subcommand.
#[derive(clap::Args)]
struct PlayArgs {
    /// Configured tuner ID.
    #[arg(long, required = true)]
    tuner: String,

    /// Channel ID (e.g. "favoritemovies").
    #[arg(long, required = true)]
    channel: String,
}

/// Arguments for the `reset` subcommand.
#[derive(clap::Args)]
struct ResetArgs {
    /// Configured tuner ID.
    #[arg(long, required = true)]
    tuner: String,
}

/// Loads the application config from `--dir` or the default location.
fn load_config(dir: Option<&PathBuf>) -> Result<AppConfig> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    AppConfig::load(&config_path).context("failed to load config")
}

/// Builds a tuner for `tuner_id` backed by the configured library server.
///
/// # Errors
///
/// Returns an error if the tuner is unknown, the API key is missing, or the
/// client fails to build.
fn build_tuner(
    config: &AppConfig,
    tuner_id: &str,
    dir: Option<&PathBuf>,
) -> Result<VirtualTuner<LibraryClient, FsRecordStore>> {
    let tuner = config.tuner(tuner_id)?.to_tuner_config();
    let cache_dir = resolve_cache_dir(config.guide.cache_dir.as_deref(), dir)?;
    let api_key = config.resolve_api_key(std::env::var(API_KEY_ENV).ok())?;
    let base_url = Url::parse(&config.server.url)
        .with_context(|| format!("invalid server URL: {}", config.server.url))?;

    let client = LibraryClient::builder()
        .base_url(base_url)
        .api_key(api_key)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context("failed to build library client")?;

    tracing::debug!(cache_dir = %cache_dir.display(), "Using schedule cache");
    let options = config.guide_options(cache_dir);
    Ok(VirtualTuner::new(tuner, &options, client, FsRecordStore::new()))
}

/// Runs the `channels` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or the tuner is unknown.
#[instrument(skip_all)]
fn run_channels(args: &ChannelsArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let tuner = config.tuner(&args.tuner)?;

    tracing::info!("ID\t\tKind\tName");
    let channels = channel_lineup(&tuner.id);
    for channel in &channels {
        tracing::info!(
            "{}\t{}\t{}",
            channel.id,
            channel.kind.as_str(),
            channel.name
        );
    }
    tracing::info!("Total: {} channels", channels.len());

    Ok(())
}

/// Runs the `guide` subcommand.
///
/// Builds or refreshes the channel schedule as needed, then lists the
/// programs overlapping the window.
///
/// # Errors
///
/// Returns an error if the window is invalid, the tuner cannot be built, or
/// the catalog query fails.
#[instrument(skip_all)]
async fn run_guide(args: &GuideArgs, dir: Option<&PathBuf>) -> Result<()> {
    let (start, end) = resolve_guide_window(
        args.time_since.as_deref(),
        args.time_until.as_deref(),
        Utc::now(),
    )?;
    tracing::info!(
        "Time range: {} .. {}",
        start.format("%Y-%m-%d %H:%M:%S"),
        end.format("%Y-%m-%d %H:%M:%S"),
    );

    let config = load_config(dir)?;
    let tuner = build_tuner(&config, &args.tuner, dir)?;

    let programs = tuner
        .query_programs(&args.channel, start, end)
        .await
        .with_context(|| format!("failed to query programs for {}", args.channel))?;

    tracing::info!("StartTime\t\tEndTime\t\t\tShowID\t\tTitle");
    for program in &programs {
        let title = program.episode_title.as_deref().map_or_else(
            || program.name.clone(),
            |episode| format!("{} - {episode}", program.name),
        );
        tracing::info!(
            "{}\t{}\t{}\t{}",
            program.start.format("%Y-%m-%d %H:%M:%S"),
            program.end.format("%Y-%m-%d %H:%M:%S"),
            program.show_id,
            title,
        );
    }
    tracing::info!("Total: {} programs", programs.len());

    Ok(())
}

/// Runs the `play` subcommand.
///
/// # Errors
///
/// Returns an error if the tuner cannot be built, nothing is airing on the
/// channel, or a collaborator fails.
#[instrument(skip_all)]
async fn run_play(args: &PlayArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let tuner = build_tuner(&config, &args.tuner, dir)?;

    let sources = tuner
        .resolve_playback_source(&args.channel)
        .await
        .with_context(|| format!("failed to resolve playback for {}", args.channel))?;

    tracing::info!("ID\t\tProtocol\tContainer\tPath");
    for source in &sources {
        tracing::info!(
            "{}\t{}\t{}\t{}",
            source.id,
            source.protocol.as_deref().unwrap_or("-"),
            source.container.as_deref().unwrap_or("-"),
            source.path.as_deref().unwrap_or("-"),
        );
    }
    tracing::info!("Total: {} sources", sources.len());

    Ok(())
}

/// Runs the `reset` subcommand.
///
/// # Errors
///
/// Returns an error if the tuner is unknown or the cache cannot be removed.
#[instrument(skip_all)]
fn run_reset(args: &ResetArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let tuner = config.tuner(&args.tuner)?;
    let cache_dir = resolve_cache_dir(config.guide.cache_dir.as_deref(), dir)?;

    let store = ScheduleStore::new(FsRecordStore::new(), cache_dir);
    store.reset(&tuner.id)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Channels(args) => run_channels(&args, cli.dir.as_ref()),
        Commands::Guide(args) => run_guide(&args, cli.dir.as_ref()).await,
        Commands::Play(args) => run_play(&args, cli.dir.as_ref()).await,
        Commands::Reset(args) => run_reset(&args, cli.dir.as_ref()),
    }
}
