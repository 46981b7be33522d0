//! Compilation options.

use crate::stdlib::{QELIB1, StandardLibrary};

/// Default limit on nested `include` files.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 16;

/// Options controlling a compilation.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    /// Gate table spliced in by `include "qelib1.inc";`.
    pub library: &'static StandardLibrary,
    /// Maximum nesting depth of included files.
    pub max_include_depth: usize,
    /// Treat warnings as errors.
    pub strict: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            library: &QELIB1,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            strict: false,
        }
    }
}

impl CompileOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the standard library table.
    #[must_use]
    pub fn with_library(mut self, library: &'static StandardLibrary) -> Self {
        self.library = library;
        self
    }

    /// Set the include depth limit.
    #[must_use]
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Enable or disable strict mode.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdlib::QELIB1_EXTENDED;

    #[test]
    fn test_defaults() {
        let options = CompileOptions::new();
        assert_eq!(options.library.version, "qelib1");
        assert_eq!(options.max_include_depth, 16);
        assert!(!options.strict);
    }

    #[test]
    fn test_builder() {
        let options = CompileOptions::new()
            .with_library(&QELIB1_EXTENDED)
            .with_max_include_depth(2)
            .with_strict(true);
        assert_eq!(options.library.len(), 42);
        assert_eq!(options.max_include_depth, 2);
        assert!(options.strict);
    }
}
