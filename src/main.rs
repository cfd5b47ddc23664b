use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use release_audit::config::{
    DEFAULT_REPOSITORY, Overrides, PolicyType, RECENT_RELEASES_COUNT, RepositoryConfig,
    github_token,
};
use release_audit::report::{self, OutputFormat};
use release_audit::version::analysis::Status;
use release_audit::version::analyzer::{Analyzer, on_signal};
use release_audit::version::cache::SnapshotLoader;
use release_audit::version::refresh::{fetch_snapshot, inspect_cache};
use release_audit::version::source::ReleaseSource;
use release_audit::version::sources::GitHubSource;

/// Exit code reported when the audited version has expired
const EXIT_EXPIRED: u8 = 2;

#[derive(Parser)]
#[command(name = "release-audit")]
#[command(
    version,
    about = "Audit an installed version against a project's GitHub releases",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Installed version to audit; prints the latest release when omitted
    #[arg(value_name = "VERSION")]
    installed: Option<String>,

    /// Repository alias, owner/repo or GitHub URL
    #[arg(short, long, global = true, default_value = DEFAULT_REPOSITORY)]
    repo: String,

    /// Output format: terminal, json or ci
    #[arg(short, long, default_value_t = OutputFormat::Terminal)]
    format: OutputFormat,

    /// JSON repository configuration, replacing the one selected by --repo
    #[arg(long)]
    config: Option<PathBuf>,

    /// Expiry policy: days or versions
    #[arg(long)]
    policy: Option<PolicyType>,

    #[arg(long, allow_negative_numbers = true)]
    critical_days: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    max_days: Option<i64>,

    #[arg(long)]
    max_versions_behind: Option<u64>,

    /// Release cache file used instead of the embedded snapshot
    #[arg(long, global = true)]
    cache_file: Option<PathBuf>,

    /// Ignore every cache and fetch all releases
    #[arg(long)]
    no_cache: bool,

    /// GitHub token (falls back to GH_TOKEN)
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every release and write a cache file
    Snapshot {
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Report whether the release cache is still fresh
    CacheStatus,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose {
        "warn,release_audit=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(&cli)?;
    let source: Arc<dyn ReleaseSource> = Arc::new(GitHubSource::for_repository(
        &config.owner,
        &config.repo,
        github_token(cli.token.clone()),
    )?);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match &cli.command {
        Some(Command::Snapshot { output }) => {
            runtime.block_on(write_snapshot(source.as_ref(), &config, output))
        }
        Some(Command::CacheStatus) => runtime.block_on(cache_status(
            source.as_ref(),
            &config,
            cli.cache_file.clone(),
        )),
        None => runtime.block_on(audit(&cli, config, source)),
    }
}

/// Alias or `--config` file, then individual flags
fn resolve_config(cli: &Cli) -> Result<RepositoryConfig> {
    let base = match &cli.config {
        Some(path) => RepositoryConfig::load(path)?,
        None => RepositoryConfig::resolve(&cli.repo)?,
    };
    let overrides = Overrides {
        policy: cli.policy,
        critical_days: cli.critical_days,
        max_days: cli.max_days,
        max_versions_behind: cli.max_versions_behind,
        no_cache: cli.no_cache,
    };

    let config = overrides.apply(base);
    debug!("Resolved configuration: {:?}", config);
    Ok(config)
}

async fn audit(
    cli: &Cli,
    config: RepositoryConfig,
    source: Arc<dyn ReleaseSource>,
) -> Result<ExitCode> {
    let analyzer = Analyzer::new(config, source)
        .with_cache_loader(Arc::new(SnapshotLoader::new(cli.cache_file.clone())))
        .bypass_cache(cli.no_cache);

    let result = analyzer
        .analyze_until(cli.installed.as_deref(), on_signal(tokio::signal::ctrl_c()))
        .await?;
    println!("{}", report::render(cli.format, &result)?);

    Ok(if result.status() == Status::Expired {
        ExitCode::from(EXIT_EXPIRED)
    } else {
        ExitCode::SUCCESS
    })
}

async fn write_snapshot(
    source: &dyn ReleaseSource,
    config: &RepositoryConfig,
    output: &Path,
) -> Result<ExitCode> {
    let snapshot = fetch_snapshot(source, config).await?;
    snapshot.write(output)?;
    info!("Wrote snapshot to {:?}", output);

    println!(
        "Wrote {} releases of {} to {}",
        snapshot.releases.len(),
        config.full_name(),
        output.display()
    );
    Ok(ExitCode::SUCCESS)
}

async fn cache_status(
    source: &dyn ReleaseSource,
    config: &RepositoryConfig,
    cache_file: Option<PathBuf>,
) -> Result<ExitCode> {
    let loader = SnapshotLoader::new(cache_file);
    let Some(status) = inspect_cache(source, &loader, config, Utc::now()).await? else {
        println!("No release cache is configured for {}", config.full_name());
        return Ok(ExitCode::SUCCESS);
    };

    let age = status
        .age_days
        .map_or_else(|| "unknown".to_string(), |days| format!("{} days", days));
    let cached_latest = status
        .cached_latest
        .map_or_else(|| "none".to_string(), |v| v.to_string());
    let freshness = if status.is_fresh {
        "fresh".to_string()
    } else {
        format!(
            "stale (its latest release is not among the {} most recent)",
            RECENT_RELEASES_COUNT
        )
    };

    println!("Repository:      {}", status.repository);
    println!("Snapshot age:    {}", age);
    println!("Cached releases: {}", status.cached_releases);
    println!("Cached latest:   {}", cached_latest);
    println!("Live latest:     {}", status.live_latest);
    println!("Cache:           {}", freshness);
    Ok(ExitCode::SUCCESS)
}
