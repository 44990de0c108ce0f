//! The glTF scene model.
//!
//! A [`Model`] owns one table per entity kind. All relationships between
//! entities are plain `usize` indices into these tables, so the node graph is
//! an index graph rather than a pointer graph; [`crate::validate`] is what
//! rejects dangling indices and cycles.

use indexmap::IndexMap;

use crate::component::{AccessorType, ComponentType, ElementLayout};
use crate::value::{Object, Value};

/// `extensions`, `extras` and unrecognised keys attached to a JSON object.
///
/// `unknown` keeps keys the decoder does not model, in their original order,
/// and the encoder writes them back at the same level.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtensionData {
    pub extensions: Option<Value>,
    pub extras: Option<Value>,
    pub unknown: Object,
}

impl ExtensionData {
    pub fn is_empty(&self) -> bool {
        self.extensions.is_none() && self.extras.is_none() && self.unknown.is_empty()
    }

    /// Looks up a named extension object.
    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions.as_ref().and_then(|e| e.get(name))
    }
}

/// Metadata about the glTF asset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Asset {
    pub version: String,
    pub min_version: Option<String>,
    pub generator: Option<String>,
    pub copyright: Option<String>,
    pub ext: ExtensionData,
}

impl Asset {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Default::default()
        }
    }
}

/// Where a buffer's bytes came from and where they go on encode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BufferSource {
    /// The GLB BIN chunk (no `uri`).
    #[default]
    BinaryChunk,
    /// An inline `data:` URI.
    DataUri,
    /// An external file, relative to the asset's directory.
    External(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Buffer {
    pub name: Option<String>,
    pub source: BufferSource,
    pub data: Vec<u8>,
    pub ext: ExtensionData,
}

impl Buffer {
    pub fn new(source: BufferSource, data: Vec<u8>) -> Self {
        Self {
            source,
            data,
            ..Default::default()
        }
    }

    pub fn byte_length(&self) -> usize {
        self.data.len()
    }
}

/// Advisory GPU binding hint for a buffer view.
pub const TARGET_ARRAY_BUFFER: u32 = 34962;
pub const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BufferView {
    pub name: Option<String>,
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
    pub target: Option<u32>,
    pub ext: ExtensionData,
}

impl BufferView {
    pub fn new(buffer: usize, byte_offset: usize, byte_length: usize) -> Self {
        Self {
            buffer,
            byte_offset,
            byte_length,
            ..Default::default()
        }
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.byte_stride = Some(stride);
        self
    }

    pub fn with_target(mut self, target: u32) -> Self {
        self.target = Some(target);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SparseIndices {
    pub buffer_view: usize,
    pub byte_offset: usize,
    pub component_type: ComponentType,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SparseValues {
    pub buffer_view: usize,
    pub byte_offset: usize,
    pub ext: ExtensionData,
}

/// Sparse overrides applied on top of an accessor's base data.
#[derive(Debug, Clone, PartialEq)]
pub struct Sparse {
    pub count: usize,
    pub indices: SparseIndices,
    pub values: SparseValues,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    pub name: Option<String>,
    /// `None` means the base data is all zeros.
    pub buffer_view: Option<usize>,
    pub byte_offset: usize,
    pub component_type: ComponentType,
    pub normalized: bool,
    pub count: usize,
    pub accessor_type: AccessorType,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
    pub sparse: Option<Sparse>,
    pub ext: ExtensionData,
}

impl Accessor {
    pub fn new(
        buffer_view: Option<usize>,
        component_type: ComponentType,
        accessor_type: AccessorType,
        count: usize,
    ) -> Self {
        Self {
            name: None,
            buffer_view,
            byte_offset: 0,
            component_type,
            normalized: false,
            count,
            accessor_type,
            min: Vec::new(),
            max: Vec::new(),
            sparse: None,
            ext: ExtensionData::default(),
        }
    }

    pub fn layout(&self) -> ElementLayout {
        ElementLayout::new(self.component_type, self.accessor_type)
    }

    pub fn num_components(&self) -> usize {
        self.accessor_type.num_components()
    }

    /// Distance between consecutive elements: the view's `byteStride` when
    /// set, otherwise the element size.
    pub fn effective_stride(&self, view: Option<&BufferView>) -> usize {
        view.and_then(|v| v.byte_stride)
            .unwrap_or_else(|| self.layout().size)
    }
}

/// Primitive topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
}

impl Mode {
    pub fn from_code(code: u64) -> Option<Self> {
        Some(match code {
            0 => Mode::Points,
            1 => Mode::Lines,
            2 => Mode::LineLoop,
            3 => Mode::LineStrip,
            4 => Mode::Triangles,
            5 => Mode::TriangleStrip,
            6 => Mode::TriangleFan,
            _ => return None,
        })
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Attribute semantic name to accessor index, in document order.
pub type AttributeMap = IndexMap<String, usize>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Primitive {
    pub attributes: AttributeMap,
    pub indices: Option<usize>,
    pub material: Option<usize>,
    /// `None` means triangles.
    pub mode: Option<Mode>,
    pub targets: Vec<AttributeMap>,
    pub ext: ExtensionData,
}

impl Primitive {
    pub fn mode_or_default(&self) -> Mode {
        self.mode.unwrap_or(Mode::Triangles)
    }

    pub fn attribute(&self, semantic: &str) -> Option<usize> {
        self.attributes.get(semantic).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
    pub weights: Vec<f64>,
    pub ext: ExtensionData,
}

/// A node's local transform, kept in the form it was authored in.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Column-major 4x4 matrix.
    Matrix([f64; 16]),
    Decomposed {
        translation: Option<[f64; 3]>,
        /// Unit quaternion `[x, y, z, w]`.
        rotation: Option<[f64; 4]>,
        scale: Option<[f64; 3]>,
    },
}

impl Default for Transform {
    fn default() -> Self {
        Transform::Decomposed {
            translation: None,
            rotation: None,
            scale: None,
        }
    }
}

impl Transform {
    pub const IDENTITY: [f64; 16] = [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ];

    /// Returns the column-major matrix, composing `T * R * S` if decomposed.
    pub fn matrix(&self) -> [f64; 16] {
        match self {
            Transform::Matrix(m) => *m,
            Transform::Decomposed {
                translation,
                rotation,
                scale,
            } => crate::transform::compose_trs(
                translation.unwrap_or([0.0; 3]),
                rotation.unwrap_or([0.0, 0.0, 0.0, 1.0]),
                scale.unwrap_or([1.0; 3]),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub name: Option<String>,
    pub camera: Option<usize>,
    pub children: Vec<usize>,
    pub skin: Option<usize>,
    pub mesh: Option<usize>,
    pub transform: Transform,
    pub weights: Vec<f64>,
    pub ext: ExtensionData,
}

impl Node {
    pub fn local_matrix(&self) -> [f64; 16] {
        self.transform.matrix()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub name: Option<String>,
    pub nodes: Vec<usize>,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextureInfo {
    pub index: usize,
    pub tex_coord: Option<usize>,
    pub ext: ExtensionData,
}

impl TextureInfo {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalTextureInfo {
    pub index: usize,
    pub tex_coord: Option<usize>,
    pub scale: Option<f64>,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OcclusionTextureInfo {
    pub index: usize,
    pub tex_coord: Option<usize>,
    pub strength: Option<f64>,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PbrMetallicRoughness {
    pub base_color_factor: Option<[f64; 4]>,
    pub base_color_texture: Option<TextureInfo>,
    pub metallic_factor: Option<f64>,
    pub roughness_factor: Option<f64>,
    pub metallic_roughness_texture: Option<TextureInfo>,
    pub ext: ExtensionData,
}

impl PbrMetallicRoughness {
    pub fn base_color_factor_or_default(&self) -> [f64; 4] {
        self.base_color_factor.unwrap_or([1.0; 4])
    }

    pub fn metallic_factor_or_default(&self) -> f64 {
        self.metallic_factor.unwrap_or(1.0)
    }

    pub fn roughness_factor_or_default(&self) -> f64 {
        self.roughness_factor.unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlphaMode {
    Opaque,
    Mask,
    Blend,
}

impl AlphaMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "OPAQUE" => Some(AlphaMode::Opaque),
            "MASK" => Some(AlphaMode::Mask),
            "BLEND" => Some(AlphaMode::Blend),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AlphaMode::Opaque => "OPAQUE",
            AlphaMode::Mask => "MASK",
            AlphaMode::Blend => "BLEND",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    pub name: Option<String>,
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
    pub normal_texture: Option<NormalTextureInfo>,
    pub occlusion_texture: Option<OcclusionTextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
    pub emissive_factor: Option<[f64; 3]>,
    pub alpha_mode: Option<AlphaMode>,
    pub alpha_cutoff: Option<f64>,
    pub double_sided: Option<bool>,
    pub ext: ExtensionData,
}

impl Material {
    pub fn alpha_mode_or_default(&self) -> AlphaMode {
        self.alpha_mode.unwrap_or(AlphaMode::Opaque)
    }

    pub fn alpha_cutoff_or_default(&self) -> f64 {
        self.alpha_cutoff.unwrap_or(0.5)
    }

    pub fn emissive_factor_or_default(&self) -> [f64; 3] {
        self.emissive_factor.unwrap_or([0.0; 3])
    }

    /// Texture indices referenced by this material, with their field names.
    pub fn texture_refs(&self) -> Vec<(&'static str, usize)> {
        let mut refs = Vec::new();
        if let Some(pbr) = &self.pbr_metallic_roughness {
            if let Some(t) = &pbr.base_color_texture {
                refs.push(("pbrMetallicRoughness.baseColorTexture.index", t.index));
            }
            if let Some(t) = &pbr.metallic_roughness_texture {
                refs.push(("pbrMetallicRoughness.metallicRoughnessTexture.index", t.index));
            }
        }
        if let Some(t) = &self.normal_texture {
            refs.push(("normalTexture.index", t.index));
        }
        if let Some(t) = &self.occlusion_texture {
            refs.push(("occlusionTexture.index", t.index));
        }
        if let Some(t) = &self.emissive_texture {
            refs.push(("emissiveTexture.index", t.index));
        }
        refs
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Texture {
    pub name: Option<String>,
    pub sampler: Option<usize>,
    pub source: Option<usize>,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageSource {
    /// Bytes live in a buffer view.
    BufferView(usize),
    /// An inline `data:` URI.
    DataUri,
    /// An external file, relative to the asset's directory.
    External(String),
    /// No source given (only valid under an extension that supplies one).
    #[default]
    None,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Image {
    pub name: Option<String>,
    pub source: ImageSource,
    pub mime_type: Option<String>,
    /// Encoded image file bytes for URI sources; empty for buffer view sources.
    pub data: Vec<u8>,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MagFilter {
    Nearest = 9728,
    Linear = 9729,
}

impl MagFilter {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            9728 => Some(MagFilter::Nearest),
            9729 => Some(MagFilter::Linear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinFilter {
    Nearest = 9728,
    Linear = 9729,
    NearestMipmapNearest = 9984,
    LinearMipmapNearest = 9985,
    NearestMipmapLinear = 9986,
    LinearMipmapLinear = 9987,
}

impl MinFilter {
    pub fn from_code(code: u64) -> Option<Self> {
        Some(match code {
            9728 => MinFilter::Nearest,
            9729 => MinFilter::Linear,
            9984 => MinFilter::NearestMipmapNearest,
            9985 => MinFilter::LinearMipmapNearest,
            9986 => MinFilter::NearestMipmapLinear,
            9987 => MinFilter::LinearMipmapLinear,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    ClampToEdge = 33071,
    MirroredRepeat = 33648,
    Repeat = 10497,
}

impl WrapMode {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            33071 => Some(WrapMode::ClampToEdge),
            33648 => Some(WrapMode::MirroredRepeat),
            10497 => Some(WrapMode::Repeat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sampler {
    pub name: Option<String>,
    pub mag_filter: Option<MagFilter>,
    pub min_filter: Option<MinFilter>,
    pub wrap_s: Option<WrapMode>,
    pub wrap_t: Option<WrapMode>,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
    Weights,
    /// Paths defined by extensions.
    Other(String),
}

impl TargetPath {
    pub fn from_name(name: &str) -> Self {
        match name {
            "translation" => TargetPath::Translation,
            "rotation" => TargetPath::Rotation,
            "scale" => TargetPath::Scale,
            "weights" => TargetPath::Weights,
            other => TargetPath::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TargetPath::Translation => "translation",
            TargetPath::Rotation => "rotation",
            TargetPath::Scale => "scale",
            TargetPath::Weights => "weights",
            TargetPath::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTarget {
    pub node: Option<usize>,
    pub path: TargetPath,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub sampler: usize,
    pub target: ChannelTarget,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interpolation {
    Linear,
    Step,
    CubicSpline,
}

impl Interpolation {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "LINEAR" => Some(Interpolation::Linear),
            "STEP" => Some(Interpolation::Step),
            "CUBICSPLINE" => Some(Interpolation::CubicSpline),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Interpolation::Linear => "LINEAR",
            Interpolation::Step => "STEP",
            Interpolation::CubicSpline => "CUBICSPLINE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSampler {
    pub input: usize,
    pub output: usize,
    /// `None` means linear.
    pub interpolation: Option<Interpolation>,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Animation {
    pub name: Option<String>,
    pub channels: Vec<Channel>,
    pub samplers: Vec<AnimationSampler>,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Skin {
    pub name: Option<String>,
    pub inverse_bind_matrices: Option<usize>,
    pub skeleton: Option<usize>,
    pub joints: Vec<usize>,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Perspective {
    pub aspect_ratio: Option<f64>,
    pub yfov: f64,
    /// `None` means an infinite projection.
    pub zfar: Option<f64>,
    pub znear: f64,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Orthographic {
    pub xmag: f64,
    pub ymag: f64,
    pub zfar: f64,
    pub znear: f64,
    pub ext: ExtensionData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Perspective(Perspective),
    Orthographic(Orthographic),
}

impl Projection {
    pub fn type_name(&self) -> &'static str {
        match self {
            Projection::Perspective(_) => "perspective",
            Projection::Orthographic(_) => "orthographic",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub name: Option<String>,
    pub projection: Projection,
    pub ext: ExtensionData,
}

/// A complete glTF document. Owns every entity; lifetime of all entities is
/// the lifetime of the model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    pub asset: Asset,
    pub scene: Option<usize>,
    pub scenes: Vec<Scene>,
    pub nodes: Vec<Node>,
    pub meshes: Vec<Mesh>,
    pub accessors: Vec<Accessor>,
    pub buffer_views: Vec<BufferView>,
    pub buffers: Vec<Buffer>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub images: Vec<Image>,
    pub samplers: Vec<Sampler>,
    pub animations: Vec<Animation>,
    pub skins: Vec<Skin>,
    pub cameras: Vec<Camera>,
    pub extensions_used: Vec<String>,
    pub extensions_required: Vec<String>,
    pub ext: ExtensionData,
}

impl Model {
    /// Creates an empty model with `asset.version = "2.0"`.
    pub fn new() -> Self {
        Self {
            asset: Asset::new("2.0"),
            ..Default::default()
        }
    }

    /// Bytes covered by a buffer view, if the view and its buffer are in range.
    pub fn buffer_view_bytes(&self, view: usize) -> Option<&[u8]> {
        let view = self.buffer_views.get(view)?;
        let buffer = self.buffers.get(view.buffer)?;
        let end = view.byte_offset.checked_add(view.byte_length)?;
        buffer.data.get(view.byte_offset..end)
    }

    /// Encoded bytes of an image, wherever they live.
    pub fn image_bytes(&self, image: usize) -> Option<&[u8]> {
        let image = self.images.get(image)?;
        match image.source {
            ImageSource::BufferView(view) => self.buffer_view_bytes(view),
            _ => Some(&image.data),
        }
    }

    /// Index of the scene to display: the default scene, else the first.
    pub fn default_scene(&self) -> Option<usize> {
        self.scene.or(if self.scenes.is_empty() { None } else { Some(0) })
    }

    /// Nodes not referenced as a child by any other node.
    pub fn root_nodes(&self) -> Vec<usize> {
        let mut is_child = vec![false; self.nodes.len()];
        for node in &self.nodes {
            for &child in &node.children {
                if let Some(flag) = is_child.get_mut(child) {
                    *flag = true;
                }
            }
        }
        (0..self.nodes.len()).filter(|&i| !is_child[i]).collect()
    }

    /// Appends a buffer and returns its index.
    pub fn push_buffer(&mut self, buffer: Buffer) -> usize {
        self.buffers.push(buffer);
        self.buffers.len() - 1
    }

    /// Appends a buffer view and returns its index.
    pub fn push_buffer_view(&mut self, view: BufferView) -> usize {
        self.buffer_views.push(view);
        self.buffer_views.len() - 1
    }

    /// Appends an accessor and returns its index.
    pub fn push_accessor(&mut self, accessor: Accessor) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    /// Records an extension name in `extensionsUsed` once.
    pub fn use_extension(&mut self, name: &str, required: bool) {
        if !self.extensions_used.iter().any(|e| e == name) {
            self.extensions_used.push(name.to_string());
        }
        if required && !self.extensions_required.iter().any(|e| e == name) {
            self.extensions_required.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_stride() {
        let accessor = Accessor::new(Some(0), ComponentType::Float, AccessorType::Vec3, 2);
        let tight = BufferView::new(0, 0, 24);
        let strided = BufferView::new(0, 0, 40).with_stride(20);
        assert_eq!(accessor.effective_stride(Some(&tight)), 12);
        assert_eq!(accessor.effective_stride(Some(&strided)), 20);
        assert_eq!(accessor.effective_stride(None), 12);
    }

    #[test]
    fn test_buffer_view_bytes() {
        let mut model = Model::new();
        model.push_buffer(Buffer::new(BufferSource::BinaryChunk, (0u8..16).collect()));
        model.push_buffer_view(BufferView::new(0, 4, 8));
        model.push_buffer_view(BufferView::new(0, 12, 8));
        assert_eq!(model.buffer_view_bytes(0), Some(&[4u8, 5, 6, 7, 8, 9, 10, 11][..]));
        assert_eq!(model.buffer_view_bytes(1), None);
        assert_eq!(model.buffer_view_bytes(2), None);
    }

    #[test]
    fn test_root_nodes_and_default_scene() {
        let mut model = Model::new();
        model.nodes = vec![
            Node { children: vec![1], ..Default::default() },
            Node::default(),
            Node::default(),
        ];
        assert_eq!(model.root_nodes(), vec![0, 2]);
        assert_eq!(model.default_scene(), None);
        model.scenes.push(Scene::default());
        assert_eq!(model.default_scene(), Some(0));
    }

    #[test]
    fn test_use_extension_deduplicates() {
        let mut model = Model::new();
        model.use_extension("KHR_materials_unlit", false);
        model.use_extension("KHR_materials_unlit", true);
        assert_eq!(model.extensions_used, vec!["KHR_materials_unlit"]);
        assert_eq!(model.extensions_required, vec!["KHR_materials_unlit"]);
    }

    #[test]
    fn test_material_defaults() {
        let material = Material::default();
        assert_eq!(material.alpha_mode_or_default(), AlphaMode::Opaque);
        assert_eq!(material.alpha_cutoff_or_default(), 0.5);
        assert!(material.texture_refs().is_empty());
    }
}
