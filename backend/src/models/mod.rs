//! # API Models
//!
//! This module defines the request and response structures for the REST API.
//! These are separate from the stored documents so that internal fields
//! (password hashes, storage keys) never leak into the wire format.
//!
//! ## Organization
//!
//! - `requests.rs` - Incoming request bodies
//! - `responses.rs` - Outgoing response bodies
//!
//! ## Serialization
//!
//! All models use Serde for JSON serialization/deserialization.
//! Field names stay snake_case, matching the stored documents.

pub mod requests;
pub mod responses;

pub use requests::*;
pub use responses::*;
