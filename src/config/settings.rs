//! Application settings loaded from config.toml
//!
//! Every section has defaults, so an empty file (or a file that only lists
//! consultants) yields a working configuration. Pricing constants, the revenue
//! fallback rate and the simulated checkout latency all live here instead of being
//! hard-coded in the business logic.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cart pricing constants
    pub pricing: PricingConfig,
    /// Dashboard and revenue reporting
    pub reporting: ReportingConfig,
    /// Checkout behaviour
    pub checkout: CheckoutConfig,
    /// Device-local storage for cart and wishlist
    pub storage: StorageConfig,
    /// Consultant directory entries to seed
    pub consultants: Vec<ConsultantConfig>,
}

/// Constants consumed by the pricing derivation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// VAT applied to the subtotal, e.g. 0.15 for 15%
    pub vat_rate: f64,
    /// Flat shipping cost charged at or below the threshold
    pub shipping_cost: f64,
    /// Subtotals strictly above this ship for free
    pub free_shipping_threshold: f64,
    /// Single coupon code accepted at checkout, matched case-insensitively
    pub coupon_code: String,
    /// Share of the subtotal taken off by the coupon
    pub coupon_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            vat_rate: 0.15,
            shipping_cost: 30.0,
            free_shipping_threshold: 200.0,
            coupon_code: "DISCOUNT20".to_string(),
            coupon_rate: 0.20,
        }
    }
}

/// Reporting settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Hourly rate used for revenue when a consultant has not published one
    pub default_hourly_rate: f64,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            default_hourly_rate: 150.0,
        }
    }
}

/// Checkout settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Simulated latency of order submission in milliseconds
    pub latency_ms: u64,
}

impl CheckoutConfig {
    /// Latency as a [`Duration`].
    #[must_use]
    pub const fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self { latency_ms: 1500 }
    }
}

/// Where cart and wishlist snapshots are kept.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the local storage
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/local_storage.json"),
        }
    }
}

/// One consultant directory entry
#[derive(Debug, Deserialize, Clone)]
pub struct ConsultantConfig {
    /// User id of the consultant
    pub id: String,
    /// Display name
    pub name: String,
    /// Job title
    pub title: String,
    /// Areas covered
    #[serde(default)]
    pub specialties: Vec<String>,
    /// Directory rating
    #[serde(default)]
    pub rating: f64,
    /// Number of reviews
    #[serde(default)]
    pub reviews_count: i32,
    /// Experience label
    #[serde(default)]
    pub experience: String,
    /// Published hourly rate
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    /// Availability label
    #[serde(default)]
    pub availability: String,
    /// Spoken languages
    #[serde(default)]
    pub languages: Vec<String>,
    /// City or region
    #[serde(default)]
    pub location: String,
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A consultant entry is missing a required field
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.pricing.vat_rate, 0.15);
        assert_eq!(config.pricing.shipping_cost, 30.0);
        assert_eq!(config.pricing.free_shipping_threshold, 200.0);
        assert_eq!(config.pricing.coupon_code, "DISCOUNT20");
        assert_eq!(config.reporting.default_hourly_rate, 150.0);
        assert_eq!(config.checkout.latency(), Duration::from_millis(1500));
        assert!(config.consultants.is_empty());
    }

    #[test]
    fn test_parse_sections() {
        let toml_str = r#"
            [pricing]
            vat_rate = 0.05
            coupon_code = "WELCOME"

            [reporting]
            default_hourly_rate = 90.0

            [[consultants]]
            id = "c-1"
            name = "Dr. Sara Ahmed"
            title = "Senior Software Engineer"
            specialties = ["Web Development", "React"]
            hourly_rate = 200.0

            [[consultants]]
            id = "c-2"
            name = "Omar Hassan"
            title = "Career Coach"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.pricing.vat_rate, 0.05);
        assert_eq!(config.pricing.coupon_code, "WELCOME");
        // untouched keys keep their defaults
        assert_eq!(config.pricing.shipping_cost, 30.0);
        assert_eq!(config.reporting.default_hourly_rate, 90.0);
        assert_eq!(config.consultants.len(), 2);
        assert_eq!(config.consultants[0].specialties.len(), 2);
        assert_eq!(config.consultants[1].hourly_rate, None);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = parse_config("[pricing\nvat_rate = ");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
