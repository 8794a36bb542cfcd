//! Pricing table.

use serde::{Deserialize, Serialize};

use super::{ProductType, SizeTier};

/// Pricing configuration, all amounts in integer cents.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_digital_cents")]
    pub digital_cents: i64,
    #[serde(default)]
    pub physical: PhysicalPricingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhysicalPricingConfig {
    #[serde(default = "default_small_cents")]
    pub small_cents: i64,
    #[serde(default = "default_medium_cents")]
    pub medium_cents: i64,
    #[serde(default = "default_large_cents")]
    pub large_cents: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            digital_cents: default_digital_cents(),
            physical: PhysicalPricingConfig::default(),
        }
    }
}

impl Default for PhysicalPricingConfig {
    fn default() -> Self {
        Self {
            small_cents: default_small_cents(),
            medium_cents: default_medium_cents(),
            large_cents: default_large_cents(),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_digital_cents() -> i64 {
    1999
}

fn default_small_cents() -> i64 {
    3999
}

fn default_medium_cents() -> i64 {
    4999
}

fn default_large_cents() -> i64 {
    5999
}

impl PricingConfig {
    /// Price for a product, or None when a physical order lacks a size tier.
    pub fn amount_cents(&self, product: ProductType, tier: Option<SizeTier>) -> Option<i64> {
        match product {
            ProductType::Digital => Some(self.digital_cents),
            ProductType::Physical => tier.map(|tier| match tier {
                SizeTier::Small => self.physical.small_cents,
                SizeTier::Medium => self.physical.medium_cents,
                SizeTier::Large => self.physical.large_cents,
            }),
        }
    }
}
