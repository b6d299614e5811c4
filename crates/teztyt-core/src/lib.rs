//! teztyt-core: Assembly, identifier codec, and scoring engine.
//!
//! This crate defines the problem bank, the randomized test assembler with
//! its page-fit retry loop, the solution key store, and the scoring engine
//! that the rest of the teztyt workspace builds on.

pub mod assembler;
pub mod bank;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod merge;
pub mod model;
pub mod pagefit;
pub mod report;
pub mod scoring;
pub mod shuffle;
pub mod solution;
pub mod statistics;
pub mod traits;

#[cfg(test)]
mod test_support;

pub use error::ExamError;
