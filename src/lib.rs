//! clonebench library
//!
//! Times several `git clone` strategies against one remote host and keeps a
//! transcript of the run, free of terminal escape sequences, in a report file.

pub mod bench;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod git;
pub mod repo;
pub mod strategy;
pub mod style;
pub mod tee;

// Re-exports for ergonomics
pub use error::{BenchError, Result};
pub use repo::RepoSpec;
pub use strategy::{applicable_strategies, StrategyKind};
