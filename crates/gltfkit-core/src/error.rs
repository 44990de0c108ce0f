//! Error taxonomy for gltfkit operations.
//!
//! Every input-driven failure is reported through [`GltfError`], which groups
//! the individual conditions into five categories:
//!
//! | Category | Covers |
//! |----------|--------|
//! | [`FormatError`] | malformed JSON, GLB container structure, missing `asset` |
//! | [`ReferenceError`] | dangling indices, node graph cycles |
//! | [`LayoutError`] | buffer / buffer view / accessor bounds and strides |
//! | [`ResourceError`] | unresolved URIs, malformed `data:` URIs |
//! | [`TypeError`] | invalid component/type pairs, narrowing overflow |

use std::io;

use thiserror::Error;

/// Errors in the container or JSON structure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("GLB header truncated: need {needed} bytes, have {available}")]
    TruncatedHeader { needed: usize, available: usize },

    #[error("Invalid GLB magic: 0x{0:08X}")]
    BadMagic(u32),

    #[error("Unsupported GLB version: {0}")]
    UnsupportedVersion(u32),

    #[error("GLB chunk at offset {offset} with length {length} runs past declared total length {total}")]
    ChunkOverrun {
        offset: usize,
        length: usize,
        total: usize,
    },

    #[error("GLB declares {declared} bytes but only {actual} are available")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("GLB has no leading JSON chunk")]
    MissingJsonChunk,

    #[error("GLB contains more than one {0} chunk")]
    DuplicateChunk(&'static str),

    #[error("GLB BIN chunk must immediately follow the JSON chunk")]
    MisplacedChunk,

    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Missing or invalid asset.version")]
    MissingAsset,

    #[error("Invalid value for {path}: {reason}")]
    InvalidField { path: String, reason: String },

    #[error("Non-finite number cannot be written at {path}")]
    NonFiniteNumber { path: String },
}

/// Errors in the index graph between model tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Dangling reference {field} = {index} (table has {len} entries)")]
    DanglingReference {
        field: String,
        index: usize,
        len: usize,
    },

    #[error("Node graph contains a cycle through node {node}")]
    CyclicNodeGraph { node: usize },

    #[error("Node {node} has more than one parent ({first} and {second})")]
    MultipleParents {
        node: usize,
        first: usize,
        second: usize,
    },
}

impl ReferenceError {
    /// Path of the offending field for dangling references.
    pub fn field(&self) -> Option<&str> {
        match self {
            ReferenceError::DanglingReference { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Errors in the byte layout of buffers, buffer views and accessors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{path}: buffer holds {actual} bytes but byteLength is {declared}")]
    BufferSizeMismatch {
        path: String,
        declared: usize,
        actual: usize,
    },

    #[error("{path}: range {offset}+{length} exceeds buffer of {buffer_len} bytes")]
    BufferViewOutOfBounds {
        path: String,
        offset: usize,
        length: usize,
        buffer_len: usize,
    },

    #[error("{path}: byteStride {stride} is invalid ({reason})")]
    InvalidByteStride {
        path: String,
        stride: usize,
        reason: String,
    },

    #[error("{path}: needs {required} bytes but buffer view holds {available}")]
    AccessorOutOfBounds {
        path: String,
        required: usize,
        available: usize,
    },

    #[error("{path}: sparse index {index} is not below accessor count {count}")]
    SparseIndexOutOfRange {
        path: String,
        index: usize,
        count: usize,
    },

    #[error("Element index {index} out of range (count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("{path}: accessor has no buffer view to write into")]
    NoBackingStorage { path: String },
}

/// Errors resolving external or embedded resources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("{path}: buffer has no uri and no GLB BIN chunk is present")]
    MissingBinaryChunk { path: String },

    #[error("{path}: buffer '{uri}' could not be resolved: {reason}")]
    BufferNotFound {
        path: String,
        uri: String,
        reason: String,
    },

    #[error("{path}: image '{uri}' could not be resolved: {reason}")]
    ImageNotFound {
        path: String,
        uri: String,
        reason: String,
    },

    #[error("{path}: malformed data URI: {reason}")]
    MalformedDataUri { path: String, reason: String },
}

/// Errors in numeric types and conversions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("{path}: invalid accessor type ({reason})")]
    InvalidAccessorType { path: String, reason: String },

    #[error("Value {value} does not fit in {component}")]
    NarrowingOverflow {
        value: String,
        component: &'static str,
    },

    #[error("Accessor is not a SCALAR unsigned index accessor ({0})")]
    NotAnIndexAccessor(String),
}

/// Top-level error type for every gltfkit operation.
#[derive(Error, Debug)]
pub enum GltfError {
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Type error: {0}")]
    Type(#[from] TypeError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, GltfError>;

impl GltfError {
    /// Short category name, useful for diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            GltfError::Format(_) => "FormatError",
            GltfError::Reference(_) => "ReferenceError",
            GltfError::Layout(_) => "LayoutError",
            GltfError::Resource(_) => "ResourceError",
            GltfError::Type(_) => "TypeError",
            GltfError::Io(_) => "IoError",
        }
    }
}
