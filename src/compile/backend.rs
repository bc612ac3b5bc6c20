//! Compiler Backend Abstraction
//!
//! The batch engine treats the shading-language compiler as an opaque
//! service: one [`compile`](CompileBackend::compile) call per shader
//! variant, plus debug-blob extraction and debug-info stripping on a
//! produced binary. [`FxcBackend`] is the production implementation driving
//! an `fxc`-compatible compiler executable; tests substitute their own
//! in-memory implementations.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::{env, fs, process};

use bitflags::bitflags;

use super::container;

bitflags! {
    /// Backend-independent compilation switches derived from
    /// [`CompilationOptions`](super::CompilationOptions).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CompileFlags: u32 {
        /// Generate debug information.
        const DEBUG                 = 1 << 0;
        /// Derive the debug name from the binary contents only, so
        /// recompiling identical code yields an identical symbol file name.
        const DEBUG_NAME_FOR_BINARY = 1 << 1;
        /// Disable optimization entirely.
        const SKIP_OPTIMIZATION     = 1 << 2;
        /// Fixed optimization tier 0.
        const OPTIMIZATION_LEVEL0   = 1 << 3;
        /// Fixed optimization tier 1.
        const OPTIMIZATION_LEVEL1   = 1 << 4;
        /// Fixed optimization tier 2.
        const OPTIMIZATION_LEVEL2   = 1 << 5;
        /// Fixed optimization tier 3.
        const OPTIMIZATION_LEVEL3   = 1 << 6;
    }
}

/// One preprocessor macro handed to the backend.
///
/// Backend macro lists follow the C calling convention of the underlying
/// compilers: the list is terminated by a sentinel entry with an empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderMacro {
    /// Macro name
    pub name: String,
    /// Macro replacement text
    pub definition: String,
}

impl ShaderMacro {
    /// A regular `NAME=VALUE` entry.
    #[must_use]
    pub fn new(name: &str, definition: &str) -> Self {
        Self {
            name: name.to_owned(),
            definition: definition.to_owned(),
        }
    }

    /// The sentinel entry closing a macro list.
    #[must_use]
    pub fn list_terminator() -> Self {
        Self {
            name: String::new(),
            definition: String::new(),
        }
    }

    /// Whether this entry is the list-closing sentinel.
    #[must_use]
    pub fn is_list_terminator(&self) -> bool {
        self.name.is_empty()
    }
}

/// The debug blobs extractable from a compiled binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobPart {
    /// The debug symbol data itself.
    Pdb,
    /// The blob naming the symbol file the symbols should be saved as.
    DebugName,
}

/// Result of one backend compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    /// The compiled binary; `None` when compilation failed
    pub binary: Option<Vec<u8>>,
    /// Diagnostic text, populated on success and failure alike
    pub diagnostics: String,
}

/// An external shading-language compiler.
///
/// Implementations must be callable from multiple compile workers at once;
/// none of the methods may rely on exclusive access.
pub trait CompileBackend: Sync {
    /// Compile one shader variant.
    fn compile(
        &self,
        path: &Path,
        macros: &[ShaderMacro],
        entry_point: &str,
        target: &str,
        flags: CompileFlags,
    ) -> CompileOutput;

    /// Extract a debug blob from a compiled binary, if present.
    fn extract_blob(&self, binary: &[u8], blob: BlobPart) -> Option<Vec<u8>>;

    /// Remove all debug information from a compiled binary.
    fn strip_debug_info(&self, binary: &[u8]) -> Vec<u8>;
}

/// Backend driving an `fxc`-compatible compiler executable.
///
/// Each [`compile`](CompileBackend::compile) spawns one compiler process
/// writing its object file to a unique temporary path; stdout and stderr are
/// captured as the diagnostic text. Blob extraction and debug stripping work
/// on the produced container bytes directly (see [`container`]) without
/// another process spawn.
pub struct FxcBackend {
    program: PathBuf,
}

static TEMP_SERIAL: AtomicU64 = AtomicU64::new(0);

impl FxcBackend {
    /// A backend invoking the given compiler executable.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn switches(flags: CompileFlags) -> Vec<&'static str> {
        let mut switches = Vec::new();
        if flags.contains(CompileFlags::DEBUG) {
            switches.push("/Zi");
        }
        if flags.contains(CompileFlags::DEBUG_NAME_FOR_BINARY) {
            switches.push("/Zsb");
        }
        if flags.contains(CompileFlags::SKIP_OPTIMIZATION) {
            switches.push("/Od");
        }
        if flags.contains(CompileFlags::OPTIMIZATION_LEVEL0) {
            switches.push("/O0");
        }
        if flags.contains(CompileFlags::OPTIMIZATION_LEVEL1) {
            switches.push("/O1");
        }
        if flags.contains(CompileFlags::OPTIMIZATION_LEVEL2) {
            switches.push("/O2");
        }
        if flags.contains(CompileFlags::OPTIMIZATION_LEVEL3) {
            switches.push("/O3");
        }
        switches
    }

    fn object_path() -> PathBuf {
        let serial = TEMP_SERIAL.fetch_add(1, Ordering::Relaxed);
        env::temp_dir().join(format!("shadergen-{}-{serial}.cso", process::id()))
    }
}

impl CompileBackend for FxcBackend {
    fn compile(
        &self,
        path: &Path,
        macros: &[ShaderMacro],
        entry_point: &str,
        target: &str,
        flags: CompileFlags,
    ) -> CompileOutput {
        let object = Self::object_path();

        let mut command = Command::new(&self.program);
        command
            .arg("/nologo")
            .args(["/T", target, "/E", entry_point])
            .args(Self::switches(flags));
        for entry in macros.iter().filter(|m| !m.is_list_terminator()) {
            command.arg("/D");
            command.arg(format!("{}={}", entry.name, entry.definition));
        }
        command.arg("/Fo").arg(&object).arg(path);

        let spawned = match command.output() {
            Ok(spawned) => spawned,
            Err(error) => {
                return CompileOutput {
                    binary: None,
                    diagnostics: format!(
                        "failed to launch compiler '{}': {error}",
                        self.program.display()
                    ),
                };
            }
        };

        let mut diagnostics = String::from_utf8_lossy(&spawned.stderr).into_owned();
        diagnostics.push_str(&String::from_utf8_lossy(&spawned.stdout));

        let binary = if spawned.status.success() {
            match fs::read(&object) {
                Ok(bytes) => Some(bytes),
                Err(error) => {
                    diagnostics.push_str(&format!(
                        "\nfailed to read compiled object '{}': {error}",
                        object.display()
                    ));
                    None
                }
            }
        } else {
            None
        };
        let _ = fs::remove_file(&object);

        CompileOutput {
            binary,
            diagnostics,
        }
    }

    fn extract_blob(&self, binary: &[u8], blob: BlobPart) -> Option<Vec<u8>> {
        let payload = match blob {
            BlobPart::Pdb => container::part(binary, container::PART_DEBUG_BITCODE)
                .or_else(|| container::part(binary, container::PART_LEGACY_DEBUG)),
            BlobPart::DebugName => container::part(binary, container::PART_DEBUG_NAME),
        };
        payload.map(<[u8]>::to_vec)
    }

    fn strip_debug_info(&self, binary: &[u8]) -> Vec<u8> {
        container::strip_debug(binary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_list_terminator() {
        let sentinel = ShaderMacro::list_terminator();
        assert!(sentinel.is_list_terminator());
        assert!(!ShaderMacro::new("SAMPLES", "4").is_list_terminator());
    }

    #[test]
    fn switches_cover_every_flag() {
        let all = FxcBackend::switches(CompileFlags::all());
        assert_eq!(all, ["/Zi", "/Zsb", "/Od", "/O0", "/O1", "/O2", "/O3"]);
        assert!(FxcBackend::switches(CompileFlags::empty()).is_empty());
    }

    #[test]
    fn blob_extraction_reads_the_container() {
        let backend = FxcBackend::new("fxc");
        let binary = container::build(&[
            (*b"SHDR", b"code"),
            (container::PART_DEBUG_BITCODE, b"symbols"),
            (container::PART_DEBUG_NAME, b"\x00\x00\x08\x00name.pdb"),
        ]);

        assert_eq!(
            backend.extract_blob(&binary, BlobPart::Pdb).as_deref(),
            Some(b"symbols".as_slice())
        );
        assert_eq!(
            backend
                .extract_blob(&binary, BlobPart::DebugName)
                .as_deref(),
            Some(b"\x00\x00\x08\x00name.pdb".as_slice())
        );
        assert_eq!(backend.extract_blob(b"raw", BlobPart::Pdb), None);
    }

    #[test]
    fn legacy_debug_part_is_a_fallback() {
        let backend = FxcBackend::new("fxc");
        let binary = container::build(&[(container::PART_LEGACY_DEBUG, b"legacy")]);
        assert_eq!(
            backend.extract_blob(&binary, BlobPart::Pdb).as_deref(),
            Some(b"legacy".as_slice())
        );
    }

    #[test]
    fn unique_object_paths() {
        assert_ne!(FxcBackend::object_path(), FxcBackend::object_path());
    }
}
