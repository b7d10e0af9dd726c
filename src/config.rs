use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::time::Duration;

use crate::domain::checkout::CheckoutSettings;
use crate::domain::order::DeliveryFees;
use crate::utils::CircuitBreakerConfig;

// ============================================================================
// Configuration
// ============================================================================
//
// Command-line flags with environment fallbacks. A `.env` file in the working
// directory is loaded first when present.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Boutique mall checkout and order server
#[derive(Debug, Clone, Parser)]
#[command(name = "boutique-mall", about = "Boutique mall checkout and order server", long_about = None)]
pub struct MallConfig {
    /// Server host address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Log filter used when RUST_LOG is unset
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info,boutique_mall=debug")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Fee for `retrait_boutique`
    #[arg(long, env = "FEE_STORE_PICKUP", default_value = "0")]
    pub fee_store_pickup: Decimal,

    /// Fee for `livraison_standard`
    #[arg(long, env = "FEE_STANDARD", default_value = "5.00")]
    pub fee_standard: Decimal,

    /// Fee for `livraison_express`
    #[arg(long, env = "FEE_EXPRESS", default_value = "10.00")]
    pub fee_express: Decimal,

    /// Vendors are told when remaining stock drops to this or below
    #[arg(long, env = "LOW_STOCK_THRESHOLD", default_value = "3")]
    pub low_stock_threshold: u32,

    /// Outbox relay poll interval in milliseconds
    #[arg(long, env = "RELAY_INTERVAL_MS", default_value = "500")]
    pub relay_interval_ms: u64,

    #[arg(long, env = "RELAY_BATCH_SIZE", default_value = "100")]
    pub relay_batch_size: usize,

    /// Outbox backlog above which health reports degraded
    #[arg(long, env = "OUTBOX_BACKLOG_THRESHOLD", default_value = "1000")]
    pub outbox_backlog_threshold: usize,

    /// Comma-separated `token:role:uuid` entries
    #[arg(long, env = "IDENTITY_TOKENS", default_value = "", hide_env_values = true)]
    pub identity_tokens: String,

    #[arg(long, env = "IDENTITY_BREAKER_FAILURES", default_value = "5")]
    pub breaker_failure_threshold: u32,

    /// Seconds the identity breaker stays open
    #[arg(long, env = "IDENTITY_BREAKER_OPEN_SECS", default_value = "30")]
    pub breaker_open_secs: u64,

    #[arg(long, env = "IDENTITY_BREAKER_SUCCESSES", default_value = "2")]
    pub breaker_success_threshold: u32,

    /// Seed demo boutiques, products and tokens on startup
    #[arg(long, env = "SEED_DEMO", default_value_t = false)]
    pub seed_demo: bool,
}

impl Default for MallConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info,boutique_mall=debug".to_string(),
            log_format: LogFormat::Pretty,
            fee_store_pickup: Decimal::ZERO,
            fee_standard: Decimal::new(500, 2),
            fee_express: Decimal::new(1000, 2),
            low_stock_threshold: 3,
            relay_interval_ms: 500,
            relay_batch_size: 100,
            outbox_backlog_threshold: 1000,
            identity_tokens: String::new(),
            breaker_failure_threshold: 5,
            breaker_open_secs: 30,
            breaker_success_threshold: 2,
            seed_demo: false,
        }
    }
}

impl MallConfig {
    /// Load from `.env`, the environment and CLI arguments
    pub fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn delivery_fees(&self) -> DeliveryFees {
        DeliveryFees {
            store_pickup: self.fee_store_pickup,
            standard: self.fee_standard,
            express: self.fee_express,
        }
    }

    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            fees: self.delivery_fees(),
            low_stock_threshold: self.low_stock_threshold,
        }
    }

    pub fn relay_interval(&self) -> Duration {
        Duration::from_millis(self.relay_interval_ms.max(10))
    }

    pub fn identity_breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.breaker_failure_threshold.max(1),
            open_timeout: Duration::from_secs(self.breaker_open_secs),
            success_threshold: self.breaker_success_threshold.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_parser_defaults() {
        let parsed = MallConfig::try_parse_from(["boutique-mall"]).unwrap();
        let defaults = MallConfig::default();

        assert_eq!(parsed.port, defaults.port);
        assert_eq!(parsed.delivery_fees().standard, defaults.delivery_fees().standard);
        assert_eq!(parsed.delivery_fees().express, Decimal::new(10, 0));
        assert_eq!(parsed.low_stock_threshold, 3);
        assert_eq!(parsed.log_format, LogFormat::Pretty);
        assert!(!parsed.seed_demo);
    }

    #[test]
    fn flags_override_defaults() {
        let parsed = MallConfig::try_parse_from([
            "boutique-mall",
            "--port",
            "9000",
            "--fee-express",
            "12.50",
            "--log-format",
            "json",
            "--seed-demo",
        ])
        .unwrap();

        assert_eq!(parsed.socket_addr(), "0.0.0.0:9000");
        assert_eq!(parsed.checkout_settings().fees.express, Decimal::new(1250, 2));
        assert_eq!(parsed.log_format, LogFormat::Json);
        assert!(parsed.seed_demo);
    }
}
