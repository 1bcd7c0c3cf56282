// Currency preference and USD-based price display
// Conversion accuracy is best-effort: rates refresh from an external provider
// and fall back to fixed defaults when the fetch fails

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::storage::{KeyValueStore, CURRENCY_KEY};

// Callers re-fetch rates on this interval
pub const RATE_REFRESH_INTERVAL: Duration = Duration::from_secs(3 * 60 * 60);

pub const DEFAULT_RATES_ENDPOINT: &str = "https://open.er-api.com/v6/latest/USD";

const FALLBACK_EUR_RATE: f64 = 0.92;
const FALLBACK_GBP_RATE: f64 = 0.79;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "GBP" => Some(Currency::Gbp),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum RateError {
    #[error("rate endpoint error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed rate payload: {0}")]
    Malformed(String),
}

// Provider of USD-based exchange rates, keyed by currency code
#[async_trait]
pub trait RatesProvider: Send + Sync + 'static {
    async fn usd_rates(&self) -> Result<HashMap<String, f64>, RateError>;
}

#[derive(Debug, Deserialize)]
struct OpenRatesResponse {
    rates: HashMap<String, f64>,
}

// Fetches rates from the open.er-api.com public endpoint
pub struct OpenRatesProvider {
    http: reqwest::Client,
    endpoint: String,
}

impl OpenRatesProvider {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_RATES_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

impl Default for OpenRatesProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RatesProvider for OpenRatesProvider {
    async fn usd_rates(&self) -> Result<HashMap<String, f64>, RateError> {
        let response = self.http.get(&self.endpoint).send().await?;
        let payload: OpenRatesResponse = response
            .json()
            .await
            .map_err(|e| RateError::Malformed(e.to_string()))?;
        Ok(payload.rates)
    }
}

// Holds the selected display currency and the current rate table.
// The preference is persisted under the "currency" key; an unknown or missing
// stored value falls back to USD.
pub struct CurrencyService {
    store: Arc<dyn KeyValueStore>,
    current: Mutex<Currency>,
    rates: DashMap<Currency, f64>,
}

impl CurrencyService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let current = store
            .get(CURRENCY_KEY)
            .and_then(|code| Currency::from_code(&code))
            .unwrap_or(Currency::Usd);

        let rates = DashMap::new();
        rates.insert(Currency::Usd, 1.0);
        rates.insert(Currency::Eur, FALLBACK_EUR_RATE);
        rates.insert(Currency::Gbp, FALLBACK_GBP_RATE);

        Self {
            store,
            current: Mutex::new(current),
            rates,
        }
    }

    pub fn currency(&self) -> Currency {
        *self.current.lock()
    }

    pub fn symbol(&self) -> &'static str {
        self.currency().symbol()
    }

    pub fn set_currency(&self, currency: Currency) {
        *self.current.lock() = currency;
        self.store.set(CURRENCY_KEY, currency.code());
    }

    pub fn rate(&self, currency: Currency) -> f64 {
        self.rates.get(&currency).map(|r| *r.value()).unwrap_or(1.0)
    }

    pub fn convert(&self, usd_price: f64) -> f64 {
        usd_price * self.rate(self.currency())
    }

    // Display form: symbol plus the converted amount rounded to a whole unit
    pub fn format_price(&self, usd_price: f64) -> String {
        format!("{}{}", self.symbol(), self.convert(usd_price).round() as i64)
    }

    // Pull fresh rates from the provider. USD stays pinned at 1.0; a failed
    // fetch or a missing currency keeps the previous rate.
    pub async fn refresh(&self, provider: &dyn RatesProvider) {
        match provider.usd_rates().await {
            Ok(fetched) => {
                for currency in [Currency::Eur, Currency::Gbp] {
                    if let Some(rate) = fetched.get(currency.code()) {
                        self.rates.insert(currency, *rate);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "exchange rate fetch failed, keeping previous rates");
            }
        }
    }
}
