//! Board module tests.
//!
//! - `positions.rs` - Codec behaviour on non-initial positions
//! - `proptest.rs` - Property-based tests
