//! Tracking number issuance.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::TrackingNumber;

/// Issues tracking numbers of the form `<prefix>-<digits>`.
///
/// The numeric part starts at the creation time in milliseconds and only
/// ever increases, so a number is never handed out twice by one issuer and
/// numbers from successive restarts do not collide in practice. The store
/// still rejects duplicates.
#[derive(Debug)]
pub struct TrackingNumberIssuer {
    prefix: String,
    next: AtomicU64,
}

impl TrackingNumberIssuer {
    /// Create an issuer seeded from the current time.
    pub fn new(prefix: impl Into<String>) -> Self {
        let seed = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        Self::starting_at(prefix, seed)
    }

    /// Create an issuer with an explicit first number.
    pub fn starting_at(prefix: impl Into<String>, first: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(first),
        }
    }

    /// Issue the next tracking number.
    pub fn issue(&self) -> TrackingNumber {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        TrackingNumber::new(format!("{}-{}", self.prefix, n))
    }
}
