//! Output & Header Writing
//!
//! Persists a successful batch: all compiled variants go into a single
//! shader-group container file, captured debug symbols are written next to
//! it, and an include header is generated so C++ applications can compute
//! variant keys with the same bit packing the generator used.
//!
//! ## Shader-group file layout
//!
//! ```text
//! "CSG1"                      4-byte magic
//! u32   shader count
//! per shader, ordered by key:
//!   u16 key length, key bytes (uppercase hex)
//!   u32 data length, data bytes
//! ```
//!
//! All integers little-endian.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::compile::CompiledShader;
use crate::errors::Result;
use crate::options::OptionKind;
use crate::source::ShaderInfo;

const GROUP_MAGIC: &[u8; 4] = b"CSG1";

/// Write a compiled shader group into `dir` as `<stem>.csg`, plus one symbol
/// file per variant that carries external debug symbols.
///
/// Returns the path of the group file. Callers must only pass complete
/// batches; a failed batch has no partial output to write.
pub fn write_shader_output(dir: &Path, stem: &str, shaders: &[CompiledShader]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let mut ordered: Vec<&CompiledShader> = shaders.iter().collect();
    ordered.sort_by(|a, b| a.key.cmp(&b.key));

    let path = dir.join(format!("{stem}.csg"));
    let mut writer = BufWriter::new(File::create(&path)?);
    writer.write_all(GROUP_MAGIC)?;
    writer.write_all(&(ordered.len() as u32).to_le_bytes())?;
    for shader in &ordered {
        writer.write_all(&(shader.key.len() as u16).to_le_bytes())?;
        writer.write_all(shader.key.as_bytes())?;
        writer.write_all(&(shader.data.len() as u32).to_le_bytes())?;
        writer.write_all(&shader.data)?;
    }
    writer.flush()?;

    for shader in &ordered {
        if let (Some(name), Some(data)) = (&shader.pdb_name, &shader.pdb_data) {
            // Symbol names come from the compiler; keep only the file name in
            // case one ever carries a directory.
            let name = Path::new(name).file_name().unwrap_or(name.as_ref());
            fs::write(dir.join(name), data)?;
        }
    }

    Ok(path)
}

/// Write the generated include header for a shader.
pub fn write_header(path: &Path, shader: &ShaderInfo) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_header(shader))?;
    Ok(())
}

/// Render the C++ include header for a shader.
///
/// The header declares one `enum class` per enum option and a `constexpr`
/// key builder reproducing the generator's bit packing, inside the shader's
/// declared namespace.
#[must_use]
pub fn render_header(shader: &ShaderInfo) -> String {
    let file_name = shader
        .path
        .file_name()
        .map_or_else(|| shader.path.display().to_string(), |n| n.display().to_string());
    let stem = shader
        .path
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());

    let mut header = String::new();
    header.push_str(&format!(
        "// Generated by shadergen from {file_name} - do not edit.\n"
    ));
    header.push_str("#pragma once\n#include <cstdint>\n\n");

    let indent = if let Some(namespace) = &shader.namespace {
        header.push_str(&format!("namespace {namespace}\n{{\n"));
        "  "
    } else {
        ""
    };

    for option in &shader.options {
        if let OptionKind::Enum { values } = &option.kind {
            header.push_str(&format!("{indent}enum class {} : uint64_t\n{indent}{{\n", option.name));
            for (index, value) in values.iter().enumerate() {
                header.push_str(&format!("{indent}  {value} = {index},\n"));
            }
            header.push_str(&format!("{indent}}};\n\n"));
        }
    }

    header.push_str(&format!(
        "{indent}// Builds the key selecting a compiled variant of {file_name}.\n"
    ));
    let parameters: Vec<String> = shader
        .options
        .iter()
        .map(|option| {
            let parameter = camel_case(&option.name);
            match &option.kind {
                OptionKind::Bool => format!("bool {parameter}"),
                OptionKind::Enum { .. } => format!("{} {parameter}", option.name),
                OptionKind::Int { .. } => format!("int64_t {parameter}"),
            }
        })
        .collect();
    header.push_str(&format!(
        "{indent}constexpr uint64_t Make{}Key({})\n{indent}{{\n{indent}  uint64_t key = 0;\n",
        pascal_case(&stem),
        parameters.join(", ")
    ));

    let mut shift = 0u32;
    for option in &shader.options {
        let parameter = camel_case(&option.name);
        let value = match &option.kind {
            OptionKind::Bool => format!("({parameter} ? 1ull : 0ull)"),
            OptionKind::Enum { .. } => format!("static_cast<uint64_t>({parameter})"),
            OptionKind::Int { min, .. } => {
                if *min == 0 {
                    format!("static_cast<uint64_t>({parameter})")
                } else if *min > 0 {
                    format!("static_cast<uint64_t>({parameter} - {min})")
                } else {
                    format!("static_cast<uint64_t>({parameter} + {})", min.unsigned_abs())
                }
            }
        };
        header.push_str(&format!("{indent}  key |= {value} << {shift};\n"));
        shift += option.bit_width();
    }

    header.push_str(&format!("{indent}  return key;\n{indent}}}\n"));
    if shader.namespace.is_some() {
        header.push_str("}\n");
    }
    header
}

/// `SampleCount` -> `sampleCount`, for key-builder parameter names.
fn camel_case(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_ascii_lowercase().to_string() + chars.as_str()
    })
}

/// `lighting_pass` -> `LightingPass`, for the key-builder function name.
fn pascal_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper_next = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            result.push(if upper_next {
                c.to_ascii_uppercase()
            } else {
                c
            });
            upper_next = false;
        } else {
            upper_next = true;
        }
    }
    result
}
