//! # ShadowMgmt Test Suite
//!
//! Unified test crate for cross-module scenarios driven end to end
//! through the public management API against the in-memory provider.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── lifecycle.rs    # add / resize / disable / reclaim flows
//!     ├── protection.rs   # protection state machine scenarios
//!     └── queries.rs      # projection completeness and ordering
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p diffarea-tests
//!
//! # By category
//! cargo test -p diffarea-tests integration::lifecycle::
//! cargo test -p diffarea-tests integration::protection::
//! ```

#![allow(dead_code)]

pub mod integration;
