use clap::Parser;
use statlookup_core::{LookupTable, StatConfig, WdsClient};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use statlookup_server::http::{self, HttpState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "statlookup.toml")]
    config: String,

    /// Validate config and the lookup file, then exit
    #[arg(long)]
    check: bool,
}

/// RUST_LOG when it is set and parses, otherwise the configured level
/// (INFO if that does not parse either).
fn log_filter(rust_log: Option<&str>, configured: &str) -> EnvFilter {
    let rust_log = rust_log.filter(|s| !s.trim().is_empty());
    if let Some(Ok(filter)) = rust_log.map(EnvFilter::try_new) {
        return filter;
    }
    let level = configured
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy("")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match StatConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), &config.service.log_level))
        .init();

    let wds = match WdsClient::new(&config.upstream) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to build WDS client: {}", e);
            std::process::exit(1);
        }
    };

    let lookup = match LookupTable::load(&config.data.lookup_path) {
        Ok(t) => t,
        Err(e) if args.check => {
            println!("❌ Lookup file {}: {}", config.data.lookup_path, e);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::warn!(
                path = %config.data.lookup_path,
                error = %e,
                "Lookup table unavailable — serving an empty /data.json"
            );
            LookupTable::default()
        }
    };

    if args.check {
        println!("✅ Config loaded from {}", args.config);
        println!("✅ Upstream: {}", wds.base_url());
        println!("✅ Lookup entries: {}", lookup.len());
        return Ok(());
    }

    let (tx, rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = tx.send(());
    });

    let state = HttpState {
        config,
        wds,
        lookup,
    };
    http::start_http_server(state, rx).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_rust_log_takes_precedence_over_config() {
        let filter = log_filter(Some("warn"), "debug");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_configured_level_without_rust_log() {
        assert_eq!(log_filter(None, "debug").max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(None, "nonsense").max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some(" "), "error").max_level_hint(), Some(LevelFilter::ERROR));
    }
}
