//! Invariant enforcement with contract tracking.
//!
//! Non-real-time paths (start-up, registry mutation, swap) assert their
//! invariants here; the log lets contract tests prove each check actually ran.
//! The draw path never calls into this module.

#[cfg(feature = "ppt")]
use lazy_static::lazy_static;
#[cfg(feature = "ppt")]
use std::collections::HashSet;
#[cfg(feature = "ppt")]
use std::sync::Mutex;

pub const LADDER_ALIGNMENT: u32 = 1;
pub const CONFIG_VALID: u32 = 2;
pub const POOL_EXCLUSIVITY: u32 = 3;
pub const REGISTRY_REJECTS_INVALID: u32 = 4;
pub const ACTIVE_ORDER: u32 = 5;
pub const TRANSITION_FENCE: u32 = 6;
pub const HARD_CUT_CLEARS: u32 = 7;
pub const RETIRE_RELEASES_PIXELS: u32 = 8;
pub const QUEUE_DRAINED: u32 = 9;

#[cfg(feature = "ppt")]
lazy_static! {
    static ref INVARIANT_LOG: Mutex<HashSet<u32>> = Mutex::new(HashSet::new());
}

#[cfg(feature = "ppt")]
/// Assert an invariant: logs it and panics on failure.
pub(crate) fn assert_invariant(id: u32, condition: bool, message: &str, context: Option<&str>) {
    if !condition {
        let full_message = match context {
            Some(ctx) => format!("invariant {id} failed: {message} ({ctx})"),
            None => format!("invariant {id} failed: {message}"),
        };
        tracing::error!(invariant = id, "{}", full_message);
        panic!("{}", full_message);
    }
    if let Ok(mut log) = INVARIANT_LOG.lock() {
        log.insert(id);
    }
}

#[cfg(not(feature = "ppt"))]
/// Assert an invariant: checks condition and panics on failure.
pub(crate) fn assert_invariant(_id: u32, condition: bool, message: &str, _context: Option<&str>) {
    if !condition {
        panic!("invariant failed: {}", message);
    }
}

/// Record an invariant as exercised without a condition to check, for paths
/// where the check is the rejection itself.
pub(crate) fn note_invariant(id: u32) {
    assert_invariant(id, true, "", None);
}

#[cfg(feature = "ppt")]
/// Contract test: checks that specified invariants were asserted.
pub fn contract_test(test_name: &str, required_invariants: &[u32]) {
    let missing: Vec<u32> = {
        let log = INVARIANT_LOG.lock().unwrap_or_else(|e| e.into_inner());
        required_invariants
            .iter()
            .copied()
            .filter(|inv| !log.contains(inv))
            .collect()
    };
    if !missing.is_empty() {
        panic!(
            "contract '{}' failed: invariants not enforced: {:?}",
            test_name, missing
        );
    }
}

#[cfg(not(feature = "ppt"))]
/// Contract test: no-op when PPT feature is disabled.
pub fn contract_test(_test_name: &str, _required_invariants: &[u32]) {}

#[cfg(feature = "ppt")]
/// Clear invariant log (for between test runs).
pub fn clear_invariant_log() {
    INVARIANT_LOG
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clear();
}

#[cfg(not(feature = "ppt"))]
/// Clear invariant log: no-op when PPT feature is disabled.
pub fn clear_invariant_log() {}
