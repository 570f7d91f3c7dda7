//! zonetrader: swing-range zone and moving-average crossover strategy
//! engine, with a batch backtester and a polling live driver sharing one
//! execution core.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
