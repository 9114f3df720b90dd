//! `signflow`: run the signature hooks against local files.
//!
//! The host's process fields live in a JSON file, documents in a directory,
//! and the token/polling cache in another JSON file, so consecutive runs
//! behave like consecutive hook triggers.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use signflow_api::{HttpTransport, JwtGrantSource, ProxyTokenSource, ReqwestTransport, RsaPemSigner, TokenSource};
use signflow_engine::{DirectoryDocumentSource, HookContext, HookReport, HookServices, JsonFileFieldStore, SignatureHooks};
use signflow_util::config::{AuthMode, ConfigError, SignflowConfig, default_config_path, load_config_from_path};
use signflow_util::{Clock, FileCache, SystemClock};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "signflow", version, about = "Run the e-signature workflow hooks against local state")]
struct Cli {
    /// Configuration file (JSON or YAML). Defaults to $SIGNFLOW_CONFIG_PATH or the user config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON object holding the process fields.
    #[arg(long, global = true, default_value = "fields.json")]
    fields: PathBuf,

    /// JSON file backing the token and polling cache.
    #[arg(long, global = true, default_value = "signflow-cache.json")]
    cache: PathBuf,

    /// Directory containing documents named by their document id.
    #[arg(long, global = true, default_value = ".")]
    documents: PathBuf,

    /// Process instance number, appended to the email subject.
    #[arg(long, global = true)]
    instance: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send the process document for signature.
    Submit,
    /// Check the envelope status once.
    Poll,
    /// Validate the configuration and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    let config = match load_config_from_path(&config_path) {
        Ok(config) => config,
        Err(ConfigError::Invalid { violations }) => {
            eprintln!("invalid configuration {}:", config_path.display());
            for violation in violations {
                eprintln!("  - {violation}");
            }
            return Ok(ExitCode::from(2));
        }
        Err(error) => return Err(error).context("could not load configuration"),
    };

    match cli.command {
        Command::CheckConfig => print_config_summary(&config_path, &config),
        Command::Submit | Command::Poll => run_hook(Arc::new(config), &cli).await,
    }
}

fn print_config_summary(path: &Path, config: &SignflowConfig) -> Result<ExitCode> {
    let summary = json!({
        "config": path.display().to_string(),
        "auth_mode": config.auth.mode,
        "api_base_url": config.provider.api_base_url,
        "polling_interval_ms": config.polling.interval_ms,
        "max_polling_ms": config.timeouts.max_polling_ms,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(ExitCode::SUCCESS)
}

async fn run_hook(config: Arc<SignflowConfig>, cli: &Cli) -> Result<ExitCode> {
    let hooks = build_hooks(config.clone(), cli)?;
    let ctx = HookContext {
        process_instance: cli.instance.clone(),
    };
    let report = if matches!(cli.command, Command::Submit) {
        hooks.submit_report(&ctx).await
    } else {
        hooks.poll_report(&ctx).await
    };
    print_report(&config, &hooks, &report)?;
    Ok(if report.failure.is_some() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// `RUST_LOG`, or `info` when unset.
fn log_filter() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
}

fn init_tracing() {
    let filter = log_filter();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_hooks(config: Arc<SignflowConfig>, cli: &Cli) -> Result<SignatureHooks> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new().context("could not create HTTP client")?);
    let token_source: Arc<dyn TokenSource> = match config.auth.mode {
        AuthMode::Jwt => {
            let signer = RsaPemSigner::from_pem_file(Path::new(&config.provider.private_key_path))
                .context("could not load the JWT signing key")?;
            Arc::new(JwtGrantSource::new(&config, transport.clone(), Arc::new(signer), clock.clone()))
        }
        AuthMode::Proxy => Arc::new(ProxyTokenSource::new(&config, transport.clone(), clock.clone())),
    };
    let cache = FileCache::open_with_clock(&cli.cache, clock.clone())
        .with_context(|| format!("could not open cache {}", cli.cache.display()))?;
    let fields = JsonFileFieldStore::open(&cli.fields)
        .with_context(|| format!("could not open process fields {}", cli.fields.display()))?;
    info!(
        mode = ?config.auth.mode,
        fields = %cli.fields.display(),
        cache = %cli.cache.display(),
        "hooks configured"
    );

    Ok(SignatureHooks::new(
        config,
        HookServices {
            token_source,
            transport,
            cache: Arc::new(cache),
            clock,
            fields: Arc::new(fields),
            documents: Arc::new(DirectoryDocumentSource::new(&cli.documents)),
        },
    ))
}

fn print_report(config: &SignflowConfig, hooks: &SignatureHooks, report: &HookReport) -> Result<()> {
    let bridge = hooks.bridge();
    let out = json!({
        "advance": report.advance,
        "recorded": report.recorded.map(|code| config.status_values.literal(code).to_string()),
        "envelope_id": report.envelope_id.clone().or_else(|| bridge.envelope_id()),
        "signature_status": bridge.signature_status_literal(),
        "failure": report.failure.as_ref().map(|failure| failure.to_string()),
        "bookkeeping_error": report.bookkeeping_error.as_ref().map(|error| error.to_string()),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
