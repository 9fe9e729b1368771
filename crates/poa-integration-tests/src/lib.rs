//! Integration test crate for the reward scheduler.
//!
//! This crate has no library code; it only contains integration tests
//! that exercise end-to-end reward flows across multiple workspace crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p poa-integration-tests
//! ```
