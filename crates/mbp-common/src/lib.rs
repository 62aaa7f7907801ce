//! MBP Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling, logging, and checksum utilities for the MBP
//! workspace members.
//!
//! # Example
//!
//! ```no_run
//! use mbp_common::Result;
//! use mbp_common::checksum::sha256_hex;
//!
//! fn fingerprint(payload: &[u8]) -> Result<String> {
//!     Ok(sha256_hex(payload))
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{PortalError, Result};
