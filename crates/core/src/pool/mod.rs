//! Bounded-concurrency job scheduling.
//!
//! A [`WorkerPool`] runs jobs through a caller-provided [`JobRunner`], at
//! most `max_concurrency` at a time, in submission order. Completions flow
//! back through a single dispatch loop so slot accounting has one owner and
//! failed jobs cannot strand capacity.

mod artifacts;
mod config;
mod error;
mod runner;
mod types;
mod worker_pool;

pub use artifacts::*;
pub use config::*;
pub use error::*;
pub use runner::*;
pub use types::*;
pub use worker_pool::*;
