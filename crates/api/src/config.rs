//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use domain::{Money, PricingPolicy};
use fulfillment::{FulfillmentConfig, SimulatedPaymentConfig};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` (default `"0.0.0.0"`), `PORT` (default `3000`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `PAYMENT_SUCCESS_RATE` (`0.9`), `PAYMENT_MIN_LATENCY_MS` (`50`),
///   `PAYMENT_MAX_LATENCY_MS` (`500`), `PAYMENT_TIMEOUT_MS` (`5000`)
/// - `PAYMENT_SEED`: seeds the simulated gateway; random when unset
/// - `TAX_RATE_PERCENT` (`10`), `FREE_SHIPPING_THRESHOLD` (`5000`),
///   `SHIPPING_FEE` (`500`)
/// - `SEED_DEMO_DATA`: load demo catalog, stock and users (default `true`)
///
/// Unparsable values fall back to the default.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub payment_success_rate: f64,
    pub payment_min_latency_ms: u64,
    pub payment_max_latency_ms: u64,
    pub payment_timeout_ms: u64,
    pub payment_seed: Option<u64>,
    pub tax_rate_percent: u32,
    pub free_shipping_threshold: i64,
    pub shipping_fee: i64,
    pub seed_demo_data: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parse = |key: &str| lookup(key).and_then(|v| v.trim().parse().ok());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            payment_success_rate: parse_or(
                &lookup,
                "PAYMENT_SUCCESS_RATE",
                defaults.payment_success_rate,
            ),
            payment_min_latency_ms: parse_or(
                &lookup,
                "PAYMENT_MIN_LATENCY_MS",
                defaults.payment_min_latency_ms,
            ),
            payment_max_latency_ms: parse_or(
                &lookup,
                "PAYMENT_MAX_LATENCY_MS",
                defaults.payment_max_latency_ms,
            ),
            payment_timeout_ms: parse_or(&lookup, "PAYMENT_TIMEOUT_MS", defaults.payment_timeout_ms),
            payment_seed: parse("PAYMENT_SEED"),
            tax_rate_percent: parse_or(&lookup, "TAX_RATE_PERCENT", defaults.tax_rate_percent),
            free_shipping_threshold: parse_or(
                &lookup,
                "FREE_SHIPPING_THRESHOLD",
                defaults.free_shipping_threshold,
            ),
            shipping_fee: parse_or(&lookup, "SHIPPING_FEE", defaults.shipping_fee),
            seed_demo_data: parse_or(&lookup, "SEED_DEMO_DATA", defaults.seed_demo_data),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn pricing(&self) -> PricingPolicy {
        PricingPolicy {
            tax_rate_percent: self.tax_rate_percent,
            free_shipping_threshold: Money::from_minor(self.free_shipping_threshold),
            shipping_fee: Money::from_minor(self.shipping_fee),
        }
    }

    pub fn fulfillment(&self) -> FulfillmentConfig {
        FulfillmentConfig {
            payment_timeout: Duration::from_millis(self.payment_timeout_ms),
        }
    }

    pub fn payment(&self) -> SimulatedPaymentConfig {
        SimulatedPaymentConfig {
            success_rate: self.payment_success_rate,
            min_latency: Duration::from_millis(self.payment_min_latency_ms),
            max_latency: Duration::from_millis(self.payment_max_latency_ms),
        }
    }
}

fn parse_or<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            payment_success_rate: 0.9,
            payment_min_latency_ms: 50,
            payment_max_latency_ms: 500,
            payment_timeout_ms: 5000,
            payment_seed: None,
            tax_rate_percent: 10,
            free_shipping_threshold: 5000,
            shipping_fee: 500,
            seed_demo_data: true,
        }
    }
}
