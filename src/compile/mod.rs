//! Concurrent Batch Compilation
//!
//! Turns the full permutation set of one shader source into compiled
//! binaries. A fixed pool of worker threads drains a shared work queue; each
//! worker converts one permutation at a time into a [`CompiledShader`]
//! (macro list, derived flags, backend invocation, optional debug-symbol
//! extraction) and every backend diagnostic line is deduplicated batch-wide
//! before it reaches the log.
//!
//! ## Batch policy
//!
//! - Every queued permutation is always attempted: a failing variant never
//!   cancels its siblings, and there is no timeout. The user gets complete
//!   diagnostic coverage of the whole batch in one run.
//! - The result is all-or-nothing: if any variant fails, the batch result is
//!   empty even when every other variant compiled cleanly. A variant family
//!   is only useful to downstream packaging as a complete set.
//!
//! ## Shared state
//!
//! The work queue, the output list and the diagnostic seen-set are guarded
//! by three independent locks, each held only for the touch of its own
//! structure; the expensive backend call runs with no lock held. The
//! failure flag is a saturating atomic OR, read once after the join
//! barrier.

pub mod backend;
pub mod container;
mod diagnostics;

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use parking_lot::Mutex;

use crate::options::{OptionPermutation, permutate};
use crate::source::ShaderInfo;
use backend::{BlobPart, CompileBackend, CompileFlags, ShaderMacro};
use diagnostics::DiagnosticLog;

/// Batch-wide compilation settings, shared read-only across all workers.
#[derive(Debug, Clone, Copy)]
pub struct CompilationOptions {
    /// Generate debug information.
    pub is_debug: bool,
    /// Move debug symbols out of the binaries into separate symbol files.
    pub use_external_debug_symbols: bool,
    /// Optimization level: `-1` disables optimization, `0..=3` selects the
    /// corresponding fixed tier. Any other value leaves the backend at its
    /// default; the CLI rejects such values upfront.
    pub optimization_level: i32,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            is_debug: false,
            use_external_debug_symbols: false,
            optimization_level: 3,
        }
    }
}

impl CompilationOptions {
    /// Derive the backend compilation switches.
    #[must_use]
    pub fn compile_flags(&self) -> CompileFlags {
        let mut flags = CompileFlags::empty();
        if self.is_debug {
            flags |= CompileFlags::DEBUG | CompileFlags::DEBUG_NAME_FOR_BINARY;
        }
        flags |= match self.optimization_level {
            -1 => CompileFlags::SKIP_OPTIMIZATION,
            0 => CompileFlags::OPTIMIZATION_LEVEL0,
            1 => CompileFlags::OPTIMIZATION_LEVEL1,
            2 => CompileFlags::OPTIMIZATION_LEVEL2,
            3 => CompileFlags::OPTIMIZATION_LEVEL3,
            _ => CompileFlags::empty(),
        };
        flags
    }
}

/// One compiled shader variant.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    /// Variant key, copied from the permutation
    pub key: String,
    /// Final binary; debug-stripped when external symbols were captured
    pub data: Vec<u8>,
    /// Symbol file name, when external symbols were captured
    pub pdb_name: Option<String>,
    /// Symbol file contents, when external symbols were captured
    pub pdb_data: Option<Vec<u8>>,
}

/// Shared state of one compilation batch.
///
/// Lives for exactly one [`compile_shader`] call. The three lock domains
/// (queue, output, diagnostics) are independent so workers only contend on
/// the structure they are actually touching.
struct CompilationContext<'a> {
    shader: &'a ShaderInfo,
    options: &'a CompilationOptions,
    queue: Mutex<VecDeque<&'a OptionPermutation>>,
    failed: AtomicBool,
    output: Mutex<Vec<CompiledShader>>,
    diagnostics: DiagnosticLog,
}

impl<'a> CompilationContext<'a> {
    fn new(
        shader: &'a ShaderInfo,
        options: &'a CompilationOptions,
        permutations: &'a [OptionPermutation],
    ) -> Self {
        Self {
            shader,
            options,
            queue: Mutex::new(permutations.iter().collect()),
            failed: AtomicBool::new(false),
            output: Mutex::new(Vec::with_capacity(permutations.len())),
            diagnostics: DiagnosticLog::new(),
        }
    }

    /// Atomically take the next unit of work. `None` ends the worker.
    fn next_permutation(&self) -> Option<&'a OptionPermutation> {
        self.queue.lock().pop_front()
    }
}

/// Layout of the debug-name blob: a 4-byte header (`u16` flags, `u16`
/// declared name length) followed directly by the symbol file name bytes.
///
/// The declared length field is not consulted; the name is read up to the
/// first NUL, matching the layout produced by existing toolchains. A bounded
/// copy using the length field would be the safer reading if that layout is
/// ever authoritatively documented.
fn parse_debug_name(blob: &[u8]) -> Option<String> {
    let name = blob.get(4..)?;
    let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
    std::str::from_utf8(&name[..end])
        .ok()
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
}

/// Pool size for a batch: one worker per unit of parallelism, but never
/// more workers than there is work.
fn worker_count(available: usize, variants: usize) -> usize {
    available.min(variants)
}

/// Worker loop: drain the queue until empty.
///
/// A backend failure marks the batch degraded and the loop moves on; a slow
/// or failing variant never blocks or cancels its siblings.
fn compile_worker(context: &CompilationContext<'_>, backend: &dyn CompileBackend) {
    while let Some(permutation) = context.next_permutation() {
        let mut macros: Vec<ShaderMacro> = permutation
            .defines
            .iter()
            .map(|(name, value)| ShaderMacro::new(name, value))
            .collect();
        macros.push(ShaderMacro::list_terminator());

        let output = backend.compile(
            &context.shader.path,
            &macros,
            &context.shader.entry_point,
            &context.shader.target,
            context.options.compile_flags(),
        );

        for line in context.diagnostics.filter_new(&output.diagnostics) {
            log::warn!(target: "shadergen::backend", "{line}");
        }

        match output.binary {
            Some(binary) => {
                let shader = finish_variant(context, backend, &permutation.key, binary);
                context.output.lock().push(shader);
            }
            None => context.failed.store(true, Ordering::Relaxed),
        }
    }
}

/// Postprocess a successful compilation into its final artifact.
///
/// When external debug symbols are requested and both debug blobs are
/// extractable, the symbols move into `pdb_name`/`pdb_data` and the binary
/// is replaced by its debug-stripped form. Missing blobs are not an error:
/// the binary is kept untouched and carries no symbol data.
fn finish_variant(
    context: &CompilationContext<'_>,
    backend: &dyn CompileBackend,
    key: &str,
    mut data: Vec<u8>,
) -> CompiledShader {
    let mut pdb_name = None;
    let mut pdb_data = None;

    if context.options.is_debug && context.options.use_external_debug_symbols {
        let symbols = backend.extract_blob(&data, BlobPart::Pdb);
        let name_blob = backend.extract_blob(&data, BlobPart::DebugName);
        if let (Some(symbols), Some(name_blob)) = (symbols, name_blob)
            && let Some(name) = parse_debug_name(&name_blob)
        {
            data = backend.strip_debug_info(&data);
            pdb_name = Some(name);
            pdb_data = Some(symbols);
        }
    }

    CompiledShader {
        key: key.to_owned(),
        data,
        pdb_name,
        pdb_data,
    }
}

/// Compile every permutation of a shader, all-or-nothing.
///
/// Expands the shader's options, sizes a worker pool to
/// `min(available_parallelism, permutation_count)` and blocks until every
/// permutation has been attempted. Returns one [`CompiledShader`] per
/// permutation in completion order (sort by key for a stable order), or an
/// empty vector when any variant failed to compile — partial delivery is
/// treated as equivalent to total failure.
#[must_use]
pub fn compile_shader(
    shader: &ShaderInfo,
    options: &CompilationOptions,
    backend: &dyn CompileBackend,
) -> Vec<CompiledShader> {
    let permutations = permutate(&shader.options);

    log::info!(
        "compiling {} at optimization level {}{}",
        shader.path.display(),
        options.optimization_level,
        if options.is_debug {
            " with debug symbols"
        } else {
            ""
        }
    );
    log::info!("generating {} shader variants", permutations.len());

    let context = CompilationContext::new(shader, options, &permutations);
    let available = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    let workers = worker_count(available, permutations.len());

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| compile_worker(&context, backend));
        }
    });

    if context.failed.load(Ordering::Relaxed) {
        log::error!("shader group compilation failed");
        Vec::new()
    } else {
        log::info!("shader group compilation succeeded");
        context.output.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimization_levels_map_to_distinct_flags() {
        let flags_for = |level| CompilationOptions {
            optimization_level: level,
            ..Default::default()
        }
        .compile_flags();

        assert_eq!(flags_for(-1), CompileFlags::SKIP_OPTIMIZATION);
        assert_eq!(flags_for(0), CompileFlags::OPTIMIZATION_LEVEL0);
        assert_eq!(flags_for(1), CompileFlags::OPTIMIZATION_LEVEL1);
        assert_eq!(flags_for(2), CompileFlags::OPTIMIZATION_LEVEL2);
        assert_eq!(flags_for(3), CompileFlags::OPTIMIZATION_LEVEL3);
    }

    #[test]
    fn out_of_range_levels_contribute_no_flag() {
        for level in [-3, -2, 4, 17] {
            let options = CompilationOptions {
                optimization_level: level,
                ..Default::default()
            };
            assert_eq!(options.compile_flags(), CompileFlags::empty());
        }
    }

    #[test]
    fn debug_enables_debug_name_generation() {
        let options = CompilationOptions {
            is_debug: true,
            optimization_level: -1,
            ..Default::default()
        };
        assert_eq!(
            options.compile_flags(),
            CompileFlags::DEBUG | CompileFlags::DEBUG_NAME_FOR_BINARY | CompileFlags::SKIP_OPTIMIZATION
        );
    }

    #[test]
    fn debug_name_is_read_after_the_header() {
        // 2 bytes flags, 2 bytes declared length, then the name.
        let blob = b"\x01\x00\x08\x00shader.pdb\x00trailing";
        assert_eq!(parse_debug_name(blob).as_deref(), Some("shader.pdb"));

        // Without a NUL the name runs to the end of the blob.
        assert_eq!(
            parse_debug_name(b"\x00\x00\x04\x00a.pdb").as_deref(),
            Some("a.pdb")
        );
    }

    #[test]
    fn malformed_debug_name_blobs_yield_nothing() {
        assert_eq!(parse_debug_name(b""), None);
        assert_eq!(parse_debug_name(b"\x00\x00\x04"), None);
        assert_eq!(parse_debug_name(b"\x00\x00\x00\x00"), None);
        assert_eq!(parse_debug_name(b"\x00\x00\x02\x00\xff\xfe"), None);
    }

    #[test]
    fn pool_never_outnumbers_the_work() {
        assert_eq!(worker_count(8, 3), 3);
        assert_eq!(worker_count(4, 100), 4);
        assert_eq!(worker_count(8, 0), 0);
        assert_eq!(worker_count(1, 1), 1);
    }
}
