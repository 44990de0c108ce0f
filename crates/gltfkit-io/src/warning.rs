//! Non-fatal anomalies reported by the decoder.

use std::fmt;

/// Kind of a decode warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// An `extensionsUsed`/`extensionsRequired` entry this codec does not interpret.
    UnhandledExtension(String),
    /// Accessor `min`/`max` disagrees with the data or has the wrong arity.
    MinMaxMismatch,
    /// Sparse indices are not strictly increasing.
    UnorderedSparseIndices,
    /// Accessor offset is not a multiple of its component size.
    MisalignedAccessor,
}

/// A non-fatal anomaly with the path of the entity it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub path: String,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
