//! Configuration for the expression core
//!
//! Holds the type-system limits and charset defaults the builder and the
//! default type factory consult. Values can be loaded from JSON.

use crate::common::error::{RexError, RexResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for type limits and literal defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RexConfig {
    /// Maximum precision of exact numeric types
    pub max_numeric_precision: u32,
    /// Maximum scale of exact numeric types
    pub max_numeric_scale: u32,
    /// Maximum fractional-second precision of TIME and TIMESTAMP
    pub max_datetime_precision: u32,
    /// Default leading-field precision of interval types
    pub default_interval_precision: u32,
    /// Default fractional-second precision of interval types
    pub default_interval_fraction_precision: u32,
    /// Character set given to character literals
    pub default_charset: String,
    /// Collation given to character literals
    pub default_collation: String,
}

impl RexConfig {
    /// Parse a configuration from JSON text; missing keys keep their defaults
    pub fn from_json_str(text: &str) -> RexResult<Self> {
        let config: RexConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> RexResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check that limits are mutually consistent
    pub fn validate(&self) -> RexResult<()> {
        if self.max_numeric_precision == 0 {
            return Err(RexError::Config(
                "max_numeric_precision must be positive".to_string(),
            ));
        }
        if self.max_numeric_scale > self.max_numeric_precision {
            return Err(RexError::Config(format!(
                "max_numeric_scale ({}) cannot exceed max_numeric_precision ({})",
                self.max_numeric_scale, self.max_numeric_precision
            )));
        }
        // rust_decimal carries at most 28 fractional digits
        if self.max_numeric_scale > 28 {
            return Err(RexError::Config(format!(
                "max_numeric_scale must be at most 28, got {}",
                self.max_numeric_scale
            )));
        }
        if self.max_datetime_precision > 9 {
            return Err(RexError::Config(format!(
                "max_datetime_precision must be at most 9, got {}",
                self.max_datetime_precision
            )));
        }
        if self.default_charset.is_empty() {
            return Err(RexError::Config("default_charset must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for RexConfig {
    fn default() -> Self {
        RexConfig {
            max_numeric_precision: 19,
            max_numeric_scale: 19,
            max_datetime_precision: 3,
            default_interval_precision: 2,
            default_interval_fraction_precision: 6,
            default_charset: "ISO-8859-1".to_string(),
            default_collation: "ISO-8859-1$en_US$primary".to_string(),
        }
    }
}
