//! Fee presets for binary outcome markets.
//!
//! The evaluator applies a flat proportional fee to the payout term. These
//! presets mirror Polymarket's taker tiers so a run can be configured by tier
//! instead of by raw rate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fee tier for Polymarket's tiered fee structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeTier {
    /// Tier 0: 2% taker fee (new users)
    Tier0,
    /// Tier 1: 1.5% taker fee
    Tier1,
    /// Tier 2: 1% taker fee
    Tier2,
    /// Tier 3: 0.5% taker fee (highest volume traders)
    Tier3,
    /// Maker: 0% fee (providing liquidity)
    Maker,
}

impl FeeTier {
    /// Fee rate as a fraction (e.g. 0.02 for 2%).
    #[must_use]
    pub fn rate(&self) -> f64 {
        match self {
            Self::Tier0 => 0.02,
            Self::Tier1 => 0.015,
            Self::Tier2 => 0.01,
            Self::Tier3 => 0.005,
            Self::Maker => 0.0,
        }
    }

    /// Fee rate as a percentage for display.
    #[must_use]
    pub fn rate_percent(&self) -> f64 {
        self.rate() * 100.0
    }
}

impl FromStr for FeeTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "tier0" => Ok(Self::Tier0),
            "1" | "tier1" => Ok(Self::Tier1),
            "2" | "tier2" => Ok(Self::Tier2),
            "3" | "tier3" => Ok(Self::Tier3),
            "maker" => Ok(Self::Maker),
            _ => Err(format!(
                "Invalid fee tier '{s}'. Valid options: 0, 1, 2, 3, maker"
            )),
        }
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tier0 => write!(f, "tier0"),
            Self::Tier1 => write!(f, "tier1"),
            Self::Tier2 => write!(f, "tier2"),
            Self::Tier3 => write!(f, "tier3"),
            Self::Maker => write!(f, "maker"),
        }
    }
}
