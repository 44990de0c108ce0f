//! Resolution of external (non-`data:`) URIs.

use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::data_uri::percent_decode;

/// Failure to fetch an external resource.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("external resources are not available")]
    Unavailable,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Fetches the bytes behind an external URI.
///
/// `base_dir` is the directory of the document being decoded.
pub trait ResourceResolver: Send + Sync {
    fn resolve(&self, base_dir: &Path, uri: &str) -> Result<Vec<u8>, ResolveError>;
}

/// Reads URIs as paths relative to `base_dir`, after percent-decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsResolver;

impl ResourceResolver for FsResolver {
    fn resolve(&self, base_dir: &Path, uri: &str) -> Result<Vec<u8>, ResolveError> {
        let decoded = percent_decode(uri);
        let relative = String::from_utf8_lossy(&decoded);
        let path = base_dir.join(relative.as_ref());
        debug!("resolving '{}' as {}", uri, path.display());
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ResolveError::NotFound(path.display().to_string()),
            _ => ResolveError::Io(e),
        })
    }
}

/// Refuses every external URI. Useful for self-contained GLB input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalResources;

impl ResourceResolver for NoExternalResources {
    fn resolve(&self, _base_dir: &Path, _uri: &str) -> Result<Vec<u8>, ResolveError> {
        Err(ResolveError::Unavailable)
    }
}

impl<F> ResourceResolver for F
where
    F: Fn(&Path, &str) -> io::Result<Vec<u8>> + Send + Sync,
{
    fn resolve(&self, base_dir: &Path, uri: &str) -> Result<Vec<u8>, ResolveError> {
        self(base_dir, uri).map_err(ResolveError::from)
    }
}
