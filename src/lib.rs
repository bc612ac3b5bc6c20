//! # shadergen
//!
//! Offline shader permutation compiler. A shader source declares its
//! compile-time options with pragma directives; the generator expands every
//! valid option combination, compiles each one concurrently through an
//! external compiler backend, and delivers the batch all-or-nothing as a
//! single shader-group file plus an optional generated include header.
//!
//! ```rust,ignore
//! use shadergen::{CompilationOptions, FxcBackend, ShaderInfo, compile_shader};
//!
//! let shader = ShaderInfo::from_file("Lighting.hlsl")?;
//! let backend = FxcBackend::new("fxc");
//! let compiled = compile_shader(&shader, &CompilationOptions::default(), &backend);
//! ```

pub mod compile;
pub mod defines;
pub mod errors;
pub mod options;
pub mod output;
pub mod source;

pub use compile::backend::{
    BlobPart, CompileBackend, CompileFlags, CompileOutput, FxcBackend, ShaderMacro,
};
pub use compile::{CompilationOptions, CompiledShader, compile_shader};
pub use defines::ShaderDefines;
pub use errors::{Error, Result};
pub use options::{OptionKind, OptionPermutation, ShaderOption, permutate};
pub use source::ShaderInfo;
