//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`Error`] covers the failure modes of the batch
//! compiler outside of per-variant backend failures:
//! - Source file I/O
//! - Pragma declaration parsing
//! - Command-line argument validation
//!
//! A failed backend compilation of an individual shader variant is *not* an
//! [`Error`]: it degrades the whole batch to an empty result instead (see
//! [`crate::compile::compile_shader`]).

use thiserror::Error;

/// The main error type for the shader generator.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A malformed pragma declaration in the shader source.
    #[error("invalid shader declaration at {path}:{line}: {message}")]
    Parse {
        /// Source file the declaration was read from
        path: String,
        /// 1-based line number of the declaration
        line: usize,
        /// What was wrong with it
        message: String,
    },

    /// The shader source declares no compilation target.
    #[error("missing `#pragma target` directive in {0}")]
    MissingTarget(String),

    /// The declared options do not fit the 64-bit variant key.
    #[error("shader options require {0} key bits, only 64 are available")]
    OptionSpaceTooLarge(u32),

    /// Invalid command-line argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
