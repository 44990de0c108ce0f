//! gltfkit Core Library
//!
//! In-memory glTF 2.0 scene model, generic extension values, the accessor
//! component codec table and typed accessor views.

#![allow(clippy::needless_range_loop)] // Component loops index several parallel arrays

// =============================================================================
// Modules
// =============================================================================

pub mod accessor_view;
pub mod component;
pub mod error;
pub mod model;
pub mod transform;
pub mod validate;
pub mod value;

// =============================================================================
// Re-exports
// =============================================================================

pub use accessor_view::{AccessorView, AccessorViewMut};
pub use component::{checked_layout, AccessorType, ComponentCodec, ComponentType, ElementLayout, Overflow};
pub use error::{
    FormatError, GltfError, LayoutError, ReferenceError, ResourceError, Result, TypeError,
};
pub use model::*;
pub use validate::{check_node_graph, validate_references};
pub use value::{Object, Value};
