//! Utilities module for declfix.
//!
//! This module provides the path helpers used across the codebase.

mod paths;

pub use paths::{
    lexical_normalize, normalize_display_path, project_relative_path, validate_output_path,
};
