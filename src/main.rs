// =============================================================================
// Supertrend Watch — Main Entry Point
// =============================================================================
//
// Runs one evaluation cycle immediately, then one per wall-clock slot
// (default every 30 minutes), until Ctrl+C.  Signal state is in-memory only;
// a restart reports every series once more.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod indicators;
mod market_data;
mod notify;
mod report;
mod runtime_config;
mod schedule;
mod signals;
mod types;
mod watcher;

use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::market_data::YahooChartClient;
use crate::notify::{LogNotifier, Notifier, SmtpNotifier, WebhookNotifier};
use crate::runtime_config::{NotifierConfig, NotifierKind, RuntimeConfig};
use crate::watcher::SignalWatcher;

const DEFAULT_CONFIG_PATH: &str = "watch_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Supertrend Watch starting up");

    let config_path = std::env::var("SUPERTREND_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Leave an editable copy of the defaults behind on first run.
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!(error = %e, "Failed to write default config");
        }
    }

    config.apply_env_overrides();
    config.validate()?;

    info!(
        symbols = ?config.symbols,
        timeframes = ?config.timeframes,
        period = config.supertrend.period,
        multiplier = config.supertrend.multiplier,
        every_minutes = config.schedule_minutes,
        "Configured watchlist"
    );

    // ── 2. Collaborators ─────────────────────────────────────────────────
    let provider = YahooChartClient::new()?;

    let notifier = build_notifier(&config.notifier)?;
    info!(kind = ?config.notifier.kind, "Notifier ready");

    let mut watcher = SignalWatcher::new(config.supertrend)?;
    let keys = config.series_keys();

    // ── 3. Cycle loop ────────────────────────────────────────────────────
    loop {
        let cycle = watcher.run_cycle(&provider, notifier.as_ref(), &keys, &config.lookback_range);
        let report = tokio::select! {
            report = cycle => report,
            res = tokio::signal::ctrl_c() => {
                res?;
                warn!("Shutdown signal received during cycle");
                break;
            }
        };

        println!("{}", report::render(&report));

        let wait = schedule::until_next_boundary(&chrono::Local::now(), config.schedule_minutes);
        info!(wait_secs = wait.as_secs(), "Sleeping until next cycle");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            res = tokio::signal::ctrl_c() => {
                res?;
                warn!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Supertrend Watch shut down complete.");
    Ok(())
}

/// Build the configured notifier.  `RuntimeConfig::validate` has already
/// checked that the chosen kind has its settings.
fn build_notifier(cfg: &NotifierConfig) -> anyhow::Result<Box<dyn Notifier>> {
    let missing = |field: &str| anyhow::anyhow!("notifier setting `{field}` is missing");

    let notifier: Box<dyn Notifier> = match cfg.kind {
        NotifierKind::Log => Box::new(LogNotifier),
        NotifierKind::Webhook => Box::new(WebhookNotifier::new(
            cfg.webhook_url.clone().ok_or_else(|| missing("webhook_url"))?,
            cfg.sender.clone(),
            cfg.recipient.clone(),
        )?),
        NotifierKind::Smtp => Box::new(SmtpNotifier::new(
            &cfg.smtp_host,
            cfg.smtp_port,
            cfg.sender.as_deref().ok_or_else(|| missing("sender"))?,
            cfg.recipient.as_deref().ok_or_else(|| missing("recipient"))?,
            cfg.smtp_login().ok_or_else(|| missing("smtp_username"))?.to_string(),
            cfg.smtp_password.clone().ok_or_else(|| missing("smtp_password"))?,
        )?),
    };
    Ok(notifier)
}
