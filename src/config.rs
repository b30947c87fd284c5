//! Query limits and thresholds.
//!
//! Precedence: values from an explicit TOML file, then `CBLITE_MANGO_*`
//! environment variables, then built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Maximum nesting of logical/array operators in a selector.
    pub max_selector_depth: usize,
    /// Maximum number of segments in a dotted path.
    pub max_path_depth: usize,
    /// Maximum literal count for `$in`, `$nin` and `$all`.
    pub max_in_set: usize,
    pub max_sort_fields: usize,
    pub max_projection_fields: usize,
    /// Queries slower than this are logged at warn level and counted.
    pub slow_query_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_selector_depth: 32,
            max_path_depth: 32,
            max_in_set: 1000,
            max_sort_fields: 8,
            max_projection_fields: 64,
            slow_query_ms: 500,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    max_selector_depth: Option<usize>,
    max_path_depth: Option<usize>,
    max_in_set: Option<usize>,
    max_sort_fields: Option<usize>,
    max_projection_fields: Option<usize>,
    slow_query_ms: Option<u64>,
}

impl QueryConfig {
    /// Parses a full or partial TOML document; missing keys keep defaults.
    ///
    /// # Errors
    /// Returns the TOML error when the document does not parse.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Loads the configuration: file values first, then env, then defaults.
    ///
    /// # Errors
    /// Returns an error if `path` is given but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let file_cfg = match path {
            Some(p) => toml::from_str::<PartialConfig>(&std::fs::read_to_string(p)?)?,
            None => PartialConfig::default(),
        };
        let env_cfg = PartialConfig::from_env(|k| std::env::var(k).ok());
        let base = Self::default();
        let cfg = Self {
            max_selector_depth: file_cfg
                .max_selector_depth
                .or(env_cfg.max_selector_depth)
                .unwrap_or(base.max_selector_depth),
            max_path_depth: file_cfg
                .max_path_depth
                .or(env_cfg.max_path_depth)
                .unwrap_or(base.max_path_depth),
            max_in_set: file_cfg.max_in_set.or(env_cfg.max_in_set).unwrap_or(base.max_in_set),
            max_sort_fields: file_cfg
                .max_sort_fields
                .or(env_cfg.max_sort_fields)
                .unwrap_or(base.max_sort_fields),
            max_projection_fields: file_cfg
                .max_projection_fields
                .or(env_cfg.max_projection_fields)
                .unwrap_or(base.max_projection_fields),
            slow_query_ms: file_cfg
                .slow_query_ms
                .or(env_cfg.slow_query_ms)
                .unwrap_or(base.slow_query_ms),
        };
        log::debug!("query config loaded: {cfg:?}");
        Ok(cfg)
    }

    /// Defaults overridden by whatever `CBLITE_MANGO_*` variables are set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_overrides(|k| std::env::var(k).ok())
    }

    fn with_overrides(get: impl Fn(&str) -> Option<String>) -> Self {
        let env = PartialConfig::from_env(get);
        let base = Self::default();
        Self {
            max_selector_depth: env.max_selector_depth.unwrap_or(base.max_selector_depth),
            max_path_depth: env.max_path_depth.unwrap_or(base.max_path_depth),
            max_in_set: env.max_in_set.unwrap_or(base.max_in_set),
            max_sort_fields: env.max_sort_fields.unwrap_or(base.max_sort_fields),
            max_projection_fields: env.max_projection_fields.unwrap_or(base.max_projection_fields),
            slow_query_ms: env.slow_query_ms.unwrap_or(base.slow_query_ms),
        }
    }
}

impl PartialConfig {
    fn from_env(get: impl Fn(&str) -> Option<String>) -> Self {
        let num = |k: &str| get(k).and_then(|s| s.trim().parse::<usize>().ok());
        Self {
            max_selector_depth: num("CBLITE_MANGO_MAX_SELECTOR_DEPTH"),
            max_path_depth: num("CBLITE_MANGO_MAX_PATH_DEPTH"),
            max_in_set: num("CBLITE_MANGO_MAX_IN_SET"),
            max_sort_fields: num("CBLITE_MANGO_MAX_SORT_FIELDS"),
            max_projection_fields: num("CBLITE_MANGO_MAX_PROJECTION_FIELDS"),
            slow_query_ms: get("CBLITE_MANGO_SLOW_QUERY_MS").and_then(|s| s.trim().parse::<u64>().ok()),
        }
    }
}
