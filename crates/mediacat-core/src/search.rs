//! Search tuning knobs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// How constraints on different metadata keys combine.
///
/// Values within one key are always "any of the included, none of the
/// excluded". Across keys the catalog has historically accepted a movie when
/// ANY key's constraint holds; `All` requires every key's constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataMatch {
    #[default]
    Any,
    All,
}

impl fmt::Display for MetadataMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataMatch::Any => f.write_str("any"),
            MetadataMatch::All => f.write_str("all"),
        }
    }
}

impl FromStr for MetadataMatch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(MetadataMatch::Any),
            "all" => Ok(MetadataMatch::All),
            other => Err(Error::Config(format!(
                "metadata match mode must be 'any' or 'all', got '{}'",
                other
            ))),
        }
    }
}

/// Configuration for the fuzzy movie search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Drop ranked candidates scoring below this similarity (None = keep all).
    pub min_similarity: Option<f64>,
    pub metadata_match: MetadataMatch,
    /// Largest `limit` a request may ask for.
    pub max_limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_similarity: None,
            metadata_match: MetadataMatch::Any,
            max_limit: defaults::SEARCH_MAX_LIMIT,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum similarity; must be within `[0, 1]`.
    pub fn min_similarity(mut self, threshold: Option<f64>) -> Self {
        self.min_similarity = threshold;
        self
    }

    pub fn metadata_match(mut self, mode: MetadataMatch) -> Self {
        self.metadata_match = mode;
        self
    }

    pub fn max_limit(mut self, max_limit: i64) -> Self {
        self.max_limit = max_limit;
        self
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if let Some(threshold) = self.min_similarity {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(Error::Config(format!(
                    "min similarity must be within [0, 1], got {}",
                    threshold
                )));
            }
        }
        if self.max_limit < 1 {
            return Err(Error::Config(format!(
                "max search limit must be at least 1, got {}",
                self.max_limit
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.min_similarity, None);
        assert_eq!(config.metadata_match, MetadataMatch::Any);
        assert_eq!(config.max_limit, defaults::SEARCH_MAX_LIMIT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SearchConfig::new()
            .min_similarity(Some(0.7))
            .metadata_match(MetadataMatch::All)
            .max_limit(50);
        assert_eq!(config.min_similarity, Some(0.7));
        assert_eq!(config.metadata_match, MetadataMatch::All);
        assert_eq!(config.max_limit, 50);
    }

    #[test]
    fn test_validate_rejects_out_of_range_similarity() {
        assert!(SearchConfig::new()
            .min_similarity(Some(1.5))
            .validate()
            .is_err());
        assert!(SearchConfig::new()
            .min_similarity(Some(-0.1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_rejects_zero_max_limit() {
        assert!(SearchConfig::new().max_limit(0).validate().is_err());
    }

    #[test]
    fn test_metadata_match_parse() {
        assert_eq!("any".parse::<MetadataMatch>().unwrap(), MetadataMatch::Any);
        assert_eq!("ALL".parse::<MetadataMatch>().unwrap(), MetadataMatch::All);
        assert!("some".parse::<MetadataMatch>().is_err());
    }
}
