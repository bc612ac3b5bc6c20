//! Output Writing Tests
//!
//! Tests for:
//! - write_shader_output: shader-group file layout, key ordering, symbol files
//! - write_header: file creation, parent directory handling

use std::fs;
use std::path::PathBuf;

use shadergen::output::{write_header, write_shader_output};
use shadergen::{CompiledShader, OptionKind, ShaderInfo, ShaderOption};

fn variant(key: &str, data: &[u8]) -> CompiledShader {
    CompiledShader {
        key: key.to_owned(),
        data: data.to_vec(),
        pdb_name: None,
        pdb_data: None,
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
}

// ============================================================================
// Shader group file
// ============================================================================

#[test]
fn group_file_layout_and_key_ordering() {
    let dir = tempfile::tempdir().unwrap();
    let shaders = [variant("A", b"second"), variant("2", b"first")];

    let path = write_shader_output(dir.path(), "lighting", &shaders).unwrap();
    assert_eq!(path, dir.path().join("lighting.csg"));

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], b"CSG1");
    assert_eq!(read_u32(&bytes, 4), 2);

    // Entries are ordered by key: "2" before "A".
    let mut cursor = 8;
    let mut entries = Vec::new();
    for _ in 0..2 {
        let key_len = read_u16(&bytes, cursor) as usize;
        cursor += 2;
        let key = String::from_utf8(bytes[cursor..cursor + key_len].to_vec()).unwrap();
        cursor += key_len;
        let data_len = read_u32(&bytes, cursor) as usize;
        cursor += 4;
        let data = bytes[cursor..cursor + data_len].to_vec();
        cursor += data_len;
        entries.push((key, data));
    }
    assert_eq!(cursor, bytes.len());
    assert_eq!(entries[0], ("2".to_string(), b"first".to_vec()));
    assert_eq!(entries[1], ("A".to_string(), b"second".to_vec()));
}

#[test]
fn symbol_files_are_written_next_to_the_group() {
    let dir = tempfile::tempdir().unwrap();
    let mut with_symbols = variant("0", b"stripped");
    with_symbols.pdb_name = Some("lighting.pdb".into());
    with_symbols.pdb_data = Some(b"symbol data".to_vec());

    write_shader_output(dir.path(), "lighting", &[with_symbols, variant("1", b"plain")]).unwrap();

    let pdb = fs::read(dir.path().join("lighting.pdb")).unwrap();
    assert_eq!(pdb, b"symbol data");
}

#[test]
fn output_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("build").join("shaders");

    write_shader_output(&nested, "fog", &[variant("0", b"x")]).unwrap();
    assert!(nested.join("fog.csg").is_file());
}

// ============================================================================
// Include header
// ============================================================================

#[test]
fn header_is_written_with_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("include").join("fog.h");
    let shader = ShaderInfo {
        path: PathBuf::from("Fog.hlsl"),
        entry_point: "main".into(),
        target: "ps_5_0".into(),
        namespace: Some("App::Shaders".into()),
        options: vec![ShaderOption {
            name: "Density".into(),
            kind: OptionKind::Int { min: 0, max: 7 },
        }],
    };

    write_header(&path, &shader).unwrap();

    let header = fs::read_to_string(&path).unwrap();
    assert!(header.contains("namespace App::Shaders"));
    assert!(header.contains("constexpr uint64_t MakeFogKey(int64_t density)"));
}
