//! Include resolution.
//!
//! The compiler never touches the filesystem itself. Non-library `include`
//! targets are fetched through an [`IncludeResolver`] supplied by the caller.

use rustc_hash::FxHashMap;

/// Error type returned by resolvers.
pub type ResolveError = Box<dyn std::error::Error + Send + Sync>;

/// Supplies the source text of `include` targets.
pub trait IncludeResolver: Send + Sync {
    /// Return the contents of the file named by `path` as written in the
    /// `include` statement.
    fn resolve(&self, path: &str) -> Result<String, ResolveError>;
}

/// A resolver that refuses every include.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn resolve(&self, path: &str) -> Result<String, ResolveError> {
        Err(format!("no include resolver is configured for '{path}'").into())
    }
}

/// A resolver backed by an in-memory map of path to source.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIncludes {
    files: FxHashMap<String, String>,
}

impl InMemoryIncludes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous contents under the same path.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.files.insert(path.into(), source.into());
    }
}

impl IncludeResolver for InMemoryIncludes {
    fn resolve(&self, path: &str) -> Result<String, ResolveError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| format!("file not found: {path}").into())
    }
}

impl<F> IncludeResolver for F
where
    F: Fn(&str) -> Result<String, ResolveError> + Send + Sync,
{
    fn resolve(&self, path: &str) -> Result<String, ResolveError> {
        self(path)
    }
}
