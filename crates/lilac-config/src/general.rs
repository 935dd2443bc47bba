//! Execution defaults shared across the enrichment executor, the query
//! planner, and the task manager.

use serde::{Deserialize, Serialize};

const fn default_batch_size() -> usize {
    64
}

const fn default_result_limit() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Default `local_batch_size` fallback for signals that don't override it.
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,

    /// Default `SelectRowsRequest` row limit when a caller doesn't set one.
    #[serde(default = "default_result_limit")]
    pub default_result_limit: usize,

    /// Default for `EnrichmentRequest::overwrite` when a caller doesn't set it.
    #[serde(default)]
    pub overwrite_enrichments: bool,

    /// If set, enrichment runs without an attached task manager are rejected
    /// rather than silently running unobserved.
    #[serde(default)]
    pub require_task_manager: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_batch_size: default_batch_size(),
            default_result_limit: default_result_limit(),
            overwrite_enrichments: false,
            require_task_manager: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = GeneralConfig::default();
        assert_eq!(config.default_batch_size, 64);
        assert_eq!(config.default_result_limit, 20);
        assert!(!config.overwrite_enrichments);
        assert!(!config.require_task_manager);
    }
}
