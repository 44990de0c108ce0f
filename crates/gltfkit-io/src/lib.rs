//! glTF 2.0 decoding and encoding for both containers.
//!
//! The decoder turns `.gltf` JSON text or a `.glb` binary container into a
//! [`gltfkit_core::Model`], resolving buffers and images and collecting
//! non-fatal [`Warning`]s. The encoder writes a model back out as JSON text
//! (with external or embedded buffers) or as a GLB.
//!
//! ```ignore
//! use gltfkit_io::{load, EncodeOptions, Encoder};
//!
//! let decoded = load("scene.gltf")?;
//! for warning in &decoded.warnings {
//!     println!("{}", warning);
//! }
//!
//! let asset = Encoder::new(EncodeOptions::binary()).encode(&decoded.model)?;
//! asset.save("scene.glb")?;
//! ```
//!
//! # Features
//!
//! - `decoder` (default): [`Decoder`] and [`load`]
//! - `encoder` (default): [`Encoder`] and [`save`]

pub mod container;
pub mod data_uri;
pub mod options;
pub mod resolver;
pub mod warning;

#[cfg(feature = "decoder")]
pub mod decoder;

#[cfg(feature = "encoder")]
pub mod encoder;

pub use container::{pack_binary, parse_binary, sniff, ContainerKind, GlbChunks};
pub use options::{DecodeOptions, EncodeOptions};
pub use resolver::{FsResolver, NoExternalResources, ResolveError, ResourceResolver};
pub use warning::{Warning, WarningKind};

#[cfg(feature = "decoder")]
pub use decoder::{load, Decoded, Decoder};
#[cfg(feature = "encoder")]
pub use encoder::{save, EncodedAsset, Encoder, ExternalResource};
