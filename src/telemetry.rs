//! Telemetry metric name constants.
//!
//! Centralised metric names for vordr operations. Hosts install their own
//! `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `vordr_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `class`: request class (e.g. "api", "navigation", "asset", "other")
//! - `source`: where the answer came from: "network", "cache",
//!   "fallback", "synthesized" or "none"
//! - `store`: cache store name (the version token)

/// Total intercepted requests that reached a strategy.
///
/// Labels: `class`, `source`.
pub const REQUESTS_TOTAL: &str = "vordr_requests_total";

/// Total store lookups that found an entry.
///
/// Labels: `store`.
pub const CACHE_HITS_TOTAL: &str = "vordr_cache_hits_total";

/// Total store lookups that found nothing.
///
/// Labels: `store`.
pub const CACHE_MISSES_TOTAL: &str = "vordr_cache_misses_total";

/// Total store writes that were rejected or failed and then absorbed.
///
/// Labels: `store`.
pub const STORE_WRITE_FAILURES_TOTAL: &str = "vordr_store_write_failures_total";

/// Total stale stores deleted during activation.
pub const STORES_DELETED_TOTAL: &str = "vordr_stores_deleted_total";

/// Total per-endpoint background refresh attempts.
///
/// Labels: `status` ("ok" | "error").
pub const SYNC_REFRESHES_TOTAL: &str = "vordr_sync_refreshes_total";
