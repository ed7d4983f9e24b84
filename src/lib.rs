//! UPDOWN — Binary Price Prediction Game Engine
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod aggregator;
pub mod analyst;
pub mod config;
pub mod controller;
pub mod engine;
pub mod history;
pub mod sources;
pub mod storage;
pub mod types;
