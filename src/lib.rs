//! `nsclc-risk` library crate.
//!
//! The binary (`risk`) is a thin wrapper around this library so that:
//!
//! - the evaluator and explainer are testable without spawning processes
//! - the TUI and the line-oriented commands share one assessment pipeline
//! - model loading stays independent of any front end

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod explain;
pub mod io;
pub mod logging;
pub mod model;
pub mod plot;
pub mod report;
pub mod tui;
