//! Core infrastructure for commentator.
//!
//! This crate provides the language-agnostic pieces:
//! - Error types and exit codes
//! - Configuration loading
//! - The diagnostic sink that records rejected attempts
//! - Source language classification by file name
//! - JSON output types for CLI responses
//! - Unified diff rendering for dry runs

pub mod config;
pub mod diagnostics;
pub mod diff;
pub mod error;
pub mod language;
pub mod output;
