//! Cross-module test suite for txgraph.
//!
//! Scenario tests drive the explorer end to end; property tests check the
//! engine's query results against straightforward reference computations
//! under randomized ledgers.

pub mod helpers;
