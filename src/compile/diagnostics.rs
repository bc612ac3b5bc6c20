//! Diagnostic Filtering & Deduplication
//!
//! The compiler backend is invoked once per shader variant, so a systemic
//! warning in the source would be reported once per variant — hundreds of
//! times for an option-heavy shader. [`DiagnosticLog`] keeps a batch-wide
//! set of already-seen lines and surfaces each distinct line exactly once.
//!
//! The generator's own pragma directives are unknown to the generic backend,
//! which answers them with an "unknown pragma ignored" warning. Those lines
//! are expected noise and are dropped outright.

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

/// Pragma keywords owned by the generator; warnings about them are noise.
const IGNORED_PRAGMA_TOKENS: [&str; 4] = ["target", "namespace", "entry", "option"];

/// True for the benign `warning X3568: '<token>' : unknown pragma ignored`
/// lines the backend emits for the generator's own directives.
pub(crate) fn is_ignored_diagnostic(line: &str) -> bool {
    let Some((_, rest)) = line.split_once(": warning X3568: '") else {
        return false;
    };
    let Some((token, tail)) = rest.split_once('\'') else {
        return false;
    };
    tail == " : unknown pragma ignored" && IGNORED_PRAGMA_TOKENS.contains(&token)
}

/// Batch-wide deduplicating diagnostic filter.
///
/// Shared by all compile workers; the seen-set has its own lock so filtering
/// never contends with the work queue or the output list.
#[derive(Default)]
pub(crate) struct DiagnosticLog {
    seen: Mutex<FxHashSet<String>>,
}

impl DiagnosticLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Split backend diagnostic text into lines and return the ones that are
    /// neither ignorable noise nor repeats of an already-returned line.
    pub(crate) fn filter_new<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut fresh = Vec::new();
        for line in text.lines() {
            if line.is_empty() || is_ignored_diagnostic(line) {
                continue;
            }
            if self.seen.lock().insert(line.to_owned()) {
                fresh.push(line);
            }
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRAGMA_WARNING: &str =
        "shader.hlsl(1,1): warning X3568: 'target' : unknown pragma ignored";

    #[test]
    fn generator_pragma_warnings_are_ignored() {
        for token in IGNORED_PRAGMA_TOKENS {
            let line =
                format!("shader.hlsl(3,1): warning X3568: '{token}' : unknown pragma ignored");
            assert!(is_ignored_diagnostic(&line), "{line}");
        }
    }

    #[test]
    fn other_diagnostics_are_kept() {
        for line in [
            "shader.hlsl(9,5): error X3004: undeclared identifier 'foo'",
            "shader.hlsl(3,1): warning X3568: 'pack_matrix' : unknown pragma ignored",
            "warning X3568: 'target' : unknown pragma ignored", // no location prefix
            "shader.hlsl(3,1): warning X3568: 'target' : unknown pragma ignored and more",
        ] {
            assert!(!is_ignored_diagnostic(line), "{line}");
        }
    }

    #[test]
    fn repeated_lines_surface_once_across_calls() {
        let log = DiagnosticLog::new();
        let text = "warning X4000: first\nwarning X4001: second\n";

        assert_eq!(
            log.filter_new(text),
            ["warning X4000: first", "warning X4001: second"]
        );
        // A second variant reporting the same lines adds nothing.
        assert!(log.filter_new(text).is_empty());
        // But a new line still gets through.
        assert_eq!(log.filter_new("error X3004: third\n"), ["error X3004: third"]);
    }

    #[test]
    fn ignored_lines_never_surface() {
        let log = DiagnosticLog::new();
        let text = format!("{PRAGMA_WARNING}\nwarning X4000: real\n");
        assert_eq!(log.filter_new(&text), ["warning X4000: real"]);
    }
}
