use config::ConfigError;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Alert classification thresholds.
///
/// These are the initial values; the continuous query registry can swap
/// them at runtime, and the new values apply to subsequently processed
/// notifications across every active subscription.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct AlertConfig {
    /// A balance strictly below this value classifies as LOW_BALANCE
    #[serde(default = "default_low_balance_threshold")]
    pub low_balance_threshold: Decimal,

    /// An absolute change strictly above this value classifies as
    /// LARGE_TRANSACTION (unless LOW_BALANCE already matched)
    #[serde(default = "default_large_transaction_threshold")]
    pub large_transaction_threshold: Decimal,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            low_balance_threshold: default_low_balance_threshold(),
            large_transaction_threshold: default_large_transaction_threshold(),
        }
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<()> {
        if self.low_balance_threshold.is_sign_negative() {
            return Err(Error::Config(ConfigError::Message(
                "low_balance_threshold must not be negative".into(),
            )));
        }
        if self.large_transaction_threshold.is_sign_negative() {
            return Err(Error::Config(ConfigError::Message(
                "large_transaction_threshold must not be negative".into(),
            )));
        }
        Ok(())
    }
}

fn default_low_balance_threshold() -> Decimal {
    Decimal::from(100)
}

fn default_large_transaction_threshold() -> Decimal {
    Decimal::from(1000)
}
