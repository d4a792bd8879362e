//! # EduPlan
//!
//! The async shell around `eduplan-core`: HTTP API, CLI, configuration and
//! the remote service client. The binary in `main.rs` only sets up tracing
//! and hands off to [`cli::execute`].

pub mod api;
pub mod cli;
pub mod config;
pub mod remote;
