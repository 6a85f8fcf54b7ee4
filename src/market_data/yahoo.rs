// =============================================================================
// Yahoo Finance chart client — public OHLC bars for indices, futures, FX, crypto
// =============================================================================
//
// Endpoint: GET /v8/finance/chart/{symbol}?range=5d&interval=30m
//
// The response carries parallel arrays (timestamp + quote.open/high/low/close)
// in which any element may be `null` for bars the exchange never printed.
// Those rows are dropped by `Series::new`.
// =============================================================================

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::provider::{ProviderError, SeriesProvider};
use super::series::{Bar, Series, SeriesKey};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Browser-like agent; the chart endpoint rejects empty user agents.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) supertrend-watch/1.0";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct YahooChartClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooChartClient {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at another host (mirrors, local fixtures).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "YahooChartClient initialised");

        Ok(Self { base_url, client })
    }

    /// Build the chart URL.  The symbol is pushed as a single escaped path
    /// segment so tickers like `^GSPC` or `GC=F` survive intact.
    fn chart_url(&self, key: &SeriesKey, range: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&format!("{}/v8/finance/chart/", self.base_url))
            .map_err(|e| ProviderError::Decode(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Decode("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(&key.symbol);
        url.query_pairs_mut()
            .append_pair("range", range)
            .append_pair("interval", &key.interval)
            .append_pair("includePrePost", "false");
        Ok(url)
    }
}

#[async_trait]
impl SeriesProvider for YahooChartClient {
    #[instrument(skip(self), name = "yahoo::fetch", fields(key = %key))]
    async fn fetch(&self, key: &SeriesKey, range: &str) -> Result<Series, ProviderError> {
        let url = self.chart_url(key, range)?;

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        // The chart endpoint reports unknown symbols as 404 with a JSON error
        // body, so try the envelope before falling back to the raw status.
        let envelope: ChartEnvelope = match serde_json::from_str(&body) {
            Ok(env) => env,
            Err(e) if status.is_success() => {
                return Err(ProviderError::Decode(format!("chart JSON: {e}")));
            }
            Err(_) => {
                return Err(ProviderError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
        };

        let series = parse_chart(key, envelope)?;
        debug!(count = series.len(), "chart bars fetched");
        Ok(series)
    }
}

impl std::fmt::Debug for YahooChartClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooChartClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn parse_chart(key: &SeriesKey, envelope: ChartEnvelope) -> Result<Series, ProviderError> {
    if let Some(err) = envelope.chart.error {
        return Err(ProviderError::Api {
            code: err.code,
            description: err.description,
        });
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Series::empty(key.clone()));
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let bars = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let open = quote.open.get(i).copied().flatten()?;
            let high = quote.high.get(i).copied().flatten()?;
            let low = quote.low.get(i).copied().flatten()?;
            let close = quote.close.get(i).copied().flatten()?;
            Some(Bar::new(ts, open, high, low, close))
        });

    Ok(Series::new(key.clone(), bars))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
