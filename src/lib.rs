//! EV Scout — positive-EV sports bet finder.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod quotes;
pub mod matching;
pub mod strategy;
pub mod ledger;
pub mod feeds;
pub mod engine;
pub mod storage;
pub mod dashboard;
