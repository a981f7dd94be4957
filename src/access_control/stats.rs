//! Decision statistics
//!
//! Lock-free counters of evaluations and their outcomes, broken down by
//! reason code.

use crate::access_control::types::{Decision, ReasonCode};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct DecisionStats {
    start_time: Instant,
    evaluations: AtomicU64,
    allowed: AtomicU64,
    not_login: AtomicU64,
    role_denied: AtomicU64,
    permission_denied: AtomicU64,
    provider_error: AtomicU64,
    custom: AtomicU64,
}

/// Point-in-time copy of [`DecisionStats`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub evaluations: u64,
    pub allowed: u64,
    pub denied: DeniedCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeniedCounts {
    pub not_login: u64,
    pub role_denied: u64,
    pub permission_denied: u64,
    pub provider_error: u64,
    pub custom: u64,
}

impl DeniedCounts {
    pub fn total(&self) -> u64 {
        self.not_login + self.role_denied + self.permission_denied + self.provider_error + self.custom
    }
}

impl DecisionStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            evaluations: AtomicU64::new(0),
            allowed: AtomicU64::new(0),
            not_login: AtomicU64::new(0),
            role_denied: AtomicU64::new(0),
            permission_denied: AtomicU64::new(0),
            provider_error: AtomicU64::new(0),
            custom: AtomicU64::new(0),
        }
    }

    /// Count one finished evaluation
    pub fn record(&self, decision: &Decision) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let counter = match decision.reason() {
            None => &self.allowed,
            Some(ReasonCode::NotLogin) => &self.not_login,
            Some(ReasonCode::RoleDenied) => &self.role_denied,
            Some(ReasonCode::PermissionDenied) => &self.permission_denied,
            Some(ReasonCode::ProviderError) => &self.provider_error,
            Some(ReasonCode::Custom) => &self.custom,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            denied: DeniedCounts {
                not_login: self.not_login.load(Ordering::Relaxed),
                role_denied: self.role_denied.load(Ordering::Relaxed),
                permission_denied: self.permission_denied.load(Ordering::Relaxed),
                provider_error: self.provider_error.load(Ordering::Relaxed),
                custom: self.custom.load(Ordering::Relaxed),
            },
        }
    }
}

impl Default for DecisionStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Denial;

    #[test]
    fn test_record_by_reason() {
        let stats = DecisionStats::new();
        stats.record(&Decision::Allow);
        stats.record(&Decision::Allow);
        stats.record(&Decision::Deny(Denial::not_login()));
        stats.record(&Decision::Deny(Denial::custom(403, "nope")));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.evaluations, 4);
        assert_eq!(snapshot.allowed, 2);
        assert_eq!(snapshot.denied.not_login, 1);
        assert_eq!(snapshot.denied.custom, 1);
        assert_eq!(snapshot.denied.total(), 2);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = DecisionStats::new().snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["evaluations"], 0);
        assert_eq!(json["denied"]["provider_error"], 0);
    }
}
