//! Property-based tests for the safe merger.
//!
//! Run with: cargo test -p statsgate-orchestrator --test property_tests

mod property;
