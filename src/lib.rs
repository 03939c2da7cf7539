//! cointrader: tick-driven paper-trading decision engine.
//!
//! Hexagonal architecture: domain logic in [`domain`], strategy
//! implementations in [`strategies`], port traits in [`ports`], concrete
//! implementations in [`adapters`].

pub mod domain;
pub mod strategies;
pub mod ports;
pub mod adapters;
pub mod cli;
