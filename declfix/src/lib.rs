//! Core library for the declfix tool.
//!
//! declfix applies the "add missing type annotations on exports" combined fix
//! produced by a TypeScript analysis engine, rewrites the dynamic
//! `import("mod").Type` references that fix introduces into plain names, and
//! adds the matching import declarations.

// Allow common complexity warnings - these are intentional design choices
#![allow(
    clippy::similar_names,
    clippy::format_push_string,
    clippy::map_unwrap_or,
    clippy::items_after_statements
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Module for applying text changes and normalizing dynamic type references.
/// This includes the byte-range rewriter and the import consolidator.
pub mod fix;

/// Module for discovering the combined fix of every project file.
/// This defines the analysis-engine seam and its manifest-backed implementation.
pub mod discovery;

/// Module for loading configuration.
pub mod config;

/// Module containing utility functions.
/// This includes path helpers used across the application.
pub mod utils;

/// Module defining the entry point logic shared by the binaries.
pub mod entry_point;

/// Module containing shared constants and regex patterns.
pub mod constants;

/// Module for rich CLI output formatting with colored text and progress bars.
pub mod output;

/// Module defining the command-line interface arguments and structs.
pub mod cli;

/// Module for handling CLI commands and their execution logic.
pub mod commands;
