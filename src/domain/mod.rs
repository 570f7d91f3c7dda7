//! Core domain types and logic. Nothing in here performs I/O apart from the
//! drivers calling through port traits.

pub mod candle;
pub mod timeframe;
pub mod indicator;
pub mod swing;
pub mod zone;
pub mod signal;
pub mod sizing;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod metrics;
pub mod strategy;
pub mod engine;
pub mod backtest;
pub mod live;
pub mod config_validation;
pub mod error;
