//! MediaSync CLI - Sync orchestration and run history for media libraries
//!
//! This crate provides the core functionality for the `msync` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (Mode, SyncRequest, SyncResult, Account)
//! - [`storage`] - Result history (SQLite and in-memory)
//! - [`sync`] - Orchestrator, admission policy, progress and status text
//! - [`config`] - Path resolution and `config.json`
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod sync;

pub use error::{Error, Result};
