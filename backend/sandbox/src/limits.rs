//! Resource ceilings enforced at the host boundary.
//!
//! Limits are applied from the Rust side (heap and stack caps on the
//! QuickJS runtime, an interrupt-based wall clock, and per-request caps on
//! `fetch`), so a plugin script cannot loosen them from inside.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Hard caps applied to every sandboxed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxLimits {
    /// QuickJS heap ceiling in bytes.
    pub memory_bytes: usize,
    /// QuickJS stack ceiling in bytes.
    pub stack_bytes: usize,
    /// Wall-clock budget for the whole call, including time spent in host
    /// functions like `fetch`.
    pub time_budget: Duration,
    /// Timeout for a single `fetch` request.
    pub fetch_timeout: Duration,
    /// Response body cap for `fetch`; longer bodies are truncated.
    pub fetch_max_bytes: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            memory_bytes: 32 * 1024 * 1024,
            stack_bytes: 512 * 1024,
            time_budget: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(10),
            fetch_max_bytes: 200_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_nonzero() {
        let limits = SandboxLimits::default();
        assert!(limits.memory_bytes > 0);
        assert!(limits.stack_bytes > 0);
        assert!(limits.time_budget > Duration::ZERO);
        assert!(limits.fetch_max_bytes > 0);
    }

    #[test]
    fn limits_round_trip_through_json() {
        let limits = SandboxLimits::default();
        let encoded = serde_json::to_string(&limits).unwrap();
        let decoded: SandboxLimits = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, limits);
    }
}
