// =============================================================================
// Runtime Configuration — watchlist, indicator and notifier settings
// =============================================================================
//
// Every field carries a serde default so that a partial (or empty) JSON file
// still loads, and adding new fields never breaks an older config file.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::SupertrendParams;
use crate::market_data::SeriesKey;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbols() -> Vec<String> {
    [
        "^GSPC",    // S&P 500
        "^DJI",     // Dow Jones Industrial Average
        "^IXIC",    // NASDAQ Composite
        "^VIX",     // CBOE Volatility Index
        "NVDA",
        "XU100.IS", // BIST 100
        "AMZN",
        "TSLA",
        "GC=F",     // Gold futures
        "SI=F",     // Silver futures
        "BZ=F",     // Brent crude
        "UNG",      // US Natural Gas Fund
        "CC=F",     // Cocoa futures
        "TRY=X",    // USD/TRY
        "EURUSD=X",
        "JPY=X",    // USD/JPY
        "BTC-USD",
        "ETH-USD",
        "AVAX-USD",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_timeframes() -> Vec<String> {
    vec!["30m".to_string()]
}

fn default_lookback_range() -> String {
    "5d".to_string()
}

fn default_schedule_minutes() -> u32 {
    30
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

// =============================================================================
// NotifierConfig
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Log,
    Smtp,
    Webhook,
}

/// Where transition notifications go.
#[derive(Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,

    /// Endpoint for `kind = "webhook"`.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Email sender (also the SMTP login unless `smtp_username` is set).
    #[serde(default)]
    pub sender: Option<String>,

    /// Email recipient.
    #[serde(default)]
    pub recipient: Option<String>,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: Option<String>,

    /// Only ever taken from `SUPERTREND_SMTP_PASSWORD`; never read from or
    /// written to the config file.
    #[serde(skip)]
    pub smtp_password: Option<String>,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::default(),
            webhook_url: None,
            sender: None,
            recipient: None,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
        }
    }
}

impl NotifierConfig {
    /// SMTP login, falling back to the sender address.
    pub fn smtp_login(&self) -> Option<&str> {
        self.smtp_username.as_deref().or(self.sender.as_deref())
    }
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("kind", &self.kind)
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "<redacted>"))
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Watchlist -----------------------------------------------------------

    /// Provider symbols, evaluated in this order every cycle.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Bar intervals evaluated for every symbol.
    #[serde(default = "default_timeframes")]
    pub timeframes: Vec<String>,

    /// How much history to request per fetch (provider range syntax).
    #[serde(default = "default_lookback_range")]
    pub lookback_range: String,

    // --- Indicator -----------------------------------------------------------

    #[serde(default)]
    pub supertrend: SupertrendParams,

    // --- Scheduling ----------------------------------------------------------

    /// Cycles align to wall-clock multiples of this many minutes.
    #[serde(default = "default_schedule_minutes")]
    pub schedule_minutes: u32,

    // --- Delivery ------------------------------------------------------------

    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            timeframes: default_timeframes(),
            lookback_range: default_lookback_range(),
            supertrend: SupertrendParams::default(),
            schedule_minutes: default_schedule_minutes(),
            notifier: NotifierConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = config.symbols.len(),
            timeframes = ?config.timeframes,
            "config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "config saved (atomic)");
        Ok(())
    }

    /// Apply `SUPERTREND_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(syms) = var("SUPERTREND_SYMBOLS") {
            let parsed: Vec<String> = syms
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.symbols = parsed;
            }
        }
        if let Some(url) = var("SUPERTREND_WEBHOOK_URL").filter(|u| !u.trim().is_empty()) {
            self.notifier.kind = NotifierKind::Webhook;
            self.notifier.webhook_url = Some(url.trim().to_string());
        }
        if let Some(password) = var("SUPERTREND_SMTP_PASSWORD").filter(|p| !p.is_empty()) {
            self.notifier.smtp_password = Some(password);
        }
    }

    /// Reject configurations the watcher cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.supertrend
            .validate()
            .context("invalid supertrend parameters")?;
        if self.symbols.is_empty() {
            anyhow::bail!("no symbols configured");
        }
        if self.timeframes.is_empty() {
            anyhow::bail!("no timeframes configured");
        }
        if self.schedule_minutes == 0 || 60 % self.schedule_minutes != 0 {
            anyhow::bail!(
                "schedule_minutes must divide an hour evenly, got {}",
                self.schedule_minutes
            );
        }
        match self.notifier.kind {
            NotifierKind::Log => {}
            NotifierKind::Webhook => {
                if self.notifier.webhook_url.is_none() {
                    anyhow::bail!("webhook notifier selected but webhook_url is not set");
                }
            }
            NotifierKind::Smtp => self.validate_smtp()?,
        }
        Ok(())
    }

    fn validate_smtp(&self) -> Result<()> {
        let n = &self.notifier;
        if n.sender.is_none() || n.recipient.is_none() {
            anyhow::bail!("smtp notifier needs both sender and recipient");
        }
        if n.smtp_host.trim().is_empty() || n.smtp_port == 0 {
            anyhow::bail!("smtp notifier needs smtp_host and a non-zero smtp_port");
        }
        if n.smtp_password.is_none() {
            anyhow::bail!("smtp notifier selected but SUPERTREND_SMTP_PASSWORD is not set");
        }
        Ok(())
    }

    /// Every `(symbol, timeframe)` pair in evaluation order: symbols outer,
    /// timeframes inner.
    pub fn series_keys(&self) -> Vec<SeriesKey> {
        self.symbols
            .iter()
            .flat_map(|sym| {
                self.timeframes
                    .iter()
                    .map(move |tf| SeriesKey::new(sym.clone(), tf.clone()))
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.symbols.len(), 19);
        assert_eq!(cfg.symbols[0], "^GSPC");
        assert_eq!(cfg.symbols[18], "AVAX-USD");
        assert_eq!(cfg.timeframes, vec!["30m"]);
        assert_eq!(cfg.lookback_range, "5d");
        assert_eq!(cfg.supertrend.period, 10);
        assert_eq!(cfg.schedule_minutes, 30);
        assert_eq!(cfg.notifier.kind, NotifierKind::Log);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.symbols.len(), 19);
        assert!((cfg.supertrend.multiplier - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "symbols": ["NVDA"],
            "supertrend": { "period": 7 },
            "notifier": { "kind": "webhook", "webhook_url": "https://relay.example/hook" }
        }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.symbols, vec!["NVDA"]);
        assert_eq!(cfg.supertrend.period, 7);
        assert!((cfg.supertrend.multiplier - 3.0).abs() < f64::EPSILON);
        assert_eq!(cfg.notifier.kind, NotifierKind::Webhook);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn series_keys_order_symbols_then_timeframes() {
        let cfg = RuntimeConfig {
            symbols: vec!["A".into(), "B".into()],
            timeframes: vec!["30m".into(), "1h".into()],
            ..RuntimeConfig::default()
        };
        let keys: Vec<String> = cfg.series_keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["A@30m", "A@1h", "B@30m", "B@1h"]);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = RuntimeConfig::default();
        cfg.supertrend.period = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = RuntimeConfig::default();
        cfg.schedule_minutes = 7;
        assert!(cfg.validate().is_err());

        let mut cfg = RuntimeConfig::default();
        cfg.symbols.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = RuntimeConfig::default();
        cfg.notifier.kind = NotifierKind::Webhook;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SUPERTREND_SYMBOLS", " nvda, btc-usd ,,"),
            ("SUPERTREND_WEBHOOK_URL", "https://relay.example/hook"),
        ]
        .into_iter()
        .collect();

        let mut cfg = RuntimeConfig::default();
        cfg.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(cfg.symbols, vec!["NVDA", "BTC-USD"]);
        assert_eq!(cfg.notifier.kind, NotifierKind::Webhook);
        assert_eq!(cfg.notifier.webhook_url.as_deref(), Some("https://relay.example/hook"));
    }

    fn smtp_config() -> RuntimeConfig {
        let mut cfg: RuntimeConfig = serde_json::from_str(
            r#"{ "notifier": { "kind": "smtp", "sender": "watcher@example.com", "recipient": "trader@example.com" } }"#,
        )
        .unwrap();
        cfg.apply_overrides(|name| (name == "SUPERTREND_SMTP_PASSWORD").then(|| "app-password".to_string()));
        cfg
    }

    #[test]
    fn smtp_defaults_and_login() {
        let cfg = smtp_config();
        assert_eq!(cfg.notifier.kind, NotifierKind::Smtp);
        assert_eq!(cfg.notifier.smtp_host, "smtp.gmail.com");
        assert_eq!(cfg.notifier.smtp_port, 587);
        assert_eq!(cfg.notifier.smtp_login(), Some("watcher@example.com"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn smtp_validation() {
        let mut cfg = smtp_config();
        cfg.notifier.smtp_password = None;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("SUPERTREND_SMTP_PASSWORD"));

        let mut cfg = smtp_config();
        cfg.notifier.recipient = None;
        assert!(cfg.validate().is_err());

        let mut cfg = smtp_config();
        cfg.notifier.smtp_port = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn smtp_password_never_touches_the_file() {
        let cfg: RuntimeConfig =
            serde_json::from_str(r#"{ "notifier": { "kind": "smtp", "smtp_password": "from-file" } }"#).unwrap();
        assert_eq!(cfg.notifier.smtp_password, None);

        let json = serde_json::to_string(&smtp_config()).unwrap();
        assert!(!json.contains("app-password"));
        assert!(!format!("{:?}", smtp_config()).contains("app-password"));
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("supertrend-watch-{}.json", uuid::Uuid::new_v4()));
        let mut cfg = RuntimeConfig::default();
        cfg.symbols = vec!["XU100.IS".into()];
        cfg.save(&path).unwrap();

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded.symbols, vec!["XU100.IS"]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_missing_file_errors() {
        assert!(RuntimeConfig::load("/definitely/not/here.json").is_err());
    }
}
