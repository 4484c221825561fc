//! # Utilities Module
//!
//! This module contains helper functions and utilities used
//! across the backend service.

use uuid::Uuid;

/// Truncate a currency amount to whole cents.
///
/// Truncates rather than rounds, so `5.005` becomes `5.00`. A tiny
/// epsilon absorbs binary representation error: `0.29 * 100.0` is
/// `28.999999999999996`, which must still give `0.29`.
///
/// ## Examples
///
/// ```rust,ignore
/// assert_eq!(truncate_cents(5.005), 5.00);
/// assert_eq!(truncate_cents(12.349), 12.34);
/// ```
pub fn truncate_cents(amount: f64) -> f64 {
    ((amount * 100.0) + 1e-6).floor() / 100.0
}

/// Generate a new document identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
