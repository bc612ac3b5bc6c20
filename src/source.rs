//! Shader Source Declarations
//!
//! Reads the pragma directives a shader source uses to describe itself to
//! the generator:
//!
//! ```hlsl
//! #pragma target cs_5_0                      // Compilation target
//! #pragma entry main                         // Entry point - optional, default is 'main'
//! #pragma namespace MyApp::Shaders           // Namespace for the include header
//! #pragma option bool IsSomethingEnabled     // A boolean option
//! #pragma option enum RenderMode {X, Y, Z}   // An enum option
//! #pragma option int SampleCount {1..4}      // An integer option
//! ```
//!
//! Pragmas other than the four above are left in place for the compiler
//! backend; the benign "unknown pragma" warnings the backend emits for the
//! generator's own directives are filtered out of the diagnostic stream
//! later (see [`crate::compile`]).

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Error, Result};
use crate::options::{OptionKind, ShaderOption};

/// Everything the generator knows about one shader source file.
#[derive(Debug, Clone)]
pub struct ShaderInfo {
    /// Path of the source file
    pub path: PathBuf,
    /// Entry point function name (`main` unless overridden)
    pub entry_point: String,
    /// Target profile handed to the compiler backend, e.g. `cs_5_0`
    pub target: String,
    /// Namespace for the generated include header
    pub namespace: Option<String>,
    /// Declared compile-time options, in declaration order
    pub options: Vec<ShaderOption>,
}

impl ShaderInfo {
    /// Read and parse a shader source file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        Self::parse(path, &source)
    }

    /// Parse shader declarations out of source text.
    pub fn parse(path: &Path, source: &str) -> Result<Self> {
        let mut entry_point = String::from("main");
        let mut target = None;
        let mut namespace = None;
        let mut options: Vec<ShaderOption> = Vec::new();

        for (index, raw) in source.lines().enumerate() {
            let Some(directive) = raw.trim().strip_prefix("#pragma") else {
                continue;
            };
            if !directive.starts_with(char::is_whitespace) {
                continue;
            }
            // Everything up to a trailing line comment.
            let directive = directive.split("//").next().unwrap_or("").trim();
            let parse_error = |message: String| Error::Parse {
                path: path.display().to_string(),
                line: index + 1,
                message,
            };

            let (keyword, rest) = split_word(directive);
            match keyword {
                "target" => {
                    target = Some(
                        single_token(rest)
                            .map_err(|()| parse_error("expected a target profile".into()))?,
                    );
                }
                "entry" => {
                    entry_point = single_token(rest)
                        .map_err(|()| parse_error("expected an entry point name".into()))?;
                }
                "namespace" => {
                    namespace = Some(
                        single_token(rest)
                            .map_err(|()| parse_error("expected a namespace".into()))?,
                    );
                }
                "option" => {
                    let option = parse_option(rest).map_err(parse_error)?;
                    if options.iter().any(|o| o.name == option.name) {
                        return Err(parse_error(format!(
                            "duplicate option '{}'",
                            option.name
                        )));
                    }
                    options.push(option);
                }
                // Not ours; the backend may still know it.
                _ => {}
            }
        }

        let Some(target) = target else {
            return Err(Error::MissingTarget(path.display().to_string()));
        };

        let key_bits: u32 = options.iter().map(ShaderOption::bit_width).sum();
        if key_bits > 64 {
            return Err(Error::OptionSpaceTooLarge(key_bits));
        }

        Ok(Self {
            path: path.to_path_buf(),
            entry_point,
            target,
            namespace,
            options,
        })
    }
}

/// Split off the first whitespace-delimited word.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

/// The directive's argument must be exactly one token.
fn single_token(rest: &str) -> std::result::Result<String, ()> {
    let mut tokens = rest.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(token), None) => Ok(token.to_owned()),
        _ => Err(()),
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse the remainder of an `option` directive.
fn parse_option(declaration: &str) -> std::result::Result<ShaderOption, String> {
    let (kind, rest) = split_word(declaration);
    match kind {
        "bool" => {
            let name = rest.trim();
            if !is_identifier(name) {
                return Err(format!("'{name}' is not a valid option name"));
            }
            Ok(ShaderOption {
                name: name.to_owned(),
                kind: OptionKind::Bool,
            })
        }
        "enum" => {
            let (name, values) = parse_braced(rest)?;
            let values: Vec<String> = values
                .split(',')
                .map(str::trim)
                .map(str::to_owned)
                .collect();
            if values.is_empty() || values.iter().any(|v| !is_identifier(v)) {
                return Err(format!("option '{name}' needs a list of variant names"));
            }
            for (index, value) in values.iter().enumerate() {
                if values[..index].contains(value) {
                    return Err(format!("option '{name}' repeats variant '{value}'"));
                }
            }
            Ok(ShaderOption {
                name,
                kind: OptionKind::Enum { values },
            })
        }
        "int" => {
            let (name, range) = parse_braced(rest)?;
            let (min, max) = range
                .split_once("..")
                .ok_or_else(|| format!("option '{name}' needs a range like {{lo..hi}}"))?;
            let min: i64 = min
                .trim()
                .parse()
                .map_err(|_| format!("option '{name}' has a malformed lower bound"))?;
            let max: i64 = max
                .trim()
                .parse()
                .map_err(|_| format!("option '{name}' has a malformed upper bound"))?;
            if min > max {
                return Err(format!("option '{name}' has an empty range {min}..{max}"));
            }
            Ok(ShaderOption {
                name,
                kind: OptionKind::Int { min, max },
            })
        }
        other => Err(format!("unknown option kind '{other}'")),
    }
}

/// Split `Name {body}` into the name and the brace contents.
fn parse_braced(rest: &str) -> std::result::Result<(String, String), String> {
    let (name, body) = rest
        .split_once('{')
        .ok_or_else(|| format!("expected '{{' after '{}'", rest.trim()))?;
    let name = name.trim();
    if !is_identifier(name) {
        return Err(format!("'{name}' is not a valid option name"));
    }
    let body = body
        .trim_end()
        .strip_suffix('}')
        .ok_or_else(|| format!("option '{name}' is missing a closing '}}'"))?;
    Ok((name.to_owned(), body.trim().to_owned()))
}
