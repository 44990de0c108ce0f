//! glTF / GLB decoding into a [`Model`].
//!
//! Decoding runs as a strict sequence: parse JSON, read `asset`, resolve
//! buffers and images, read the remaining tables, check buffer view and
//! accessor layouts, and finally validate cross-references. Any hard error
//! aborts the whole decode; non-fatal anomalies are collected as warnings.

use std::fs;
use std::path::Path;

use log::{debug, trace, warn};

use gltfkit_core::{
    validate_references, Accessor, AccessorType, AccessorView, AlphaMode, Animation,
    AnimationSampler, Asset, AttributeMap, Buffer, BufferSource, BufferView, Camera, Channel,
    ChannelTarget, ComponentType, ExtensionData, FormatError, GltfError, Image, ImageSource,
    Interpolation, LayoutError, MagFilter, Material, Mesh, MinFilter, Mode, Model, Node,
    NormalTextureInfo, Object, OcclusionTextureInfo, Orthographic, PbrMetallicRoughness,
    Perspective, Primitive, Projection, ReferenceError, ResourceError, Result, Sampler, Scene,
    Skin, Sparse, SparseIndices, SparseValues, TargetPath, Texture, TextureInfo, Transform,
    TypeError, Value, WrapMode,
};

use crate::container::{self, ContainerKind};
use crate::data_uri;
use crate::options::DecodeOptions;
use crate::resolver::{FsResolver, ResourceResolver};
use crate::warning::{Warning, WarningKind};

/// A decoded model together with the warnings raised while decoding it.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub model: Model,
    pub warnings: Vec<Warning>,
}

/// Decodes glTF documents, resolving external URIs through `R`.
#[derive(Debug, Clone, Default)]
pub struct Decoder<R = FsResolver> {
    resolver: R,
    options: DecodeOptions,
}

/// Reads and decodes a `.gltf` or `.glb` file from disk.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Decoded> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    debug!("loading {} ({} bytes)", path.display(), bytes.len());
    Decoder::new(FsResolver).decode_slice(&bytes, base_dir)
}

impl<R: ResourceResolver> Decoder<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            options: DecodeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decodes a byte stream holding either container.
    pub fn decode_slice(&self, bytes: &[u8], base_dir: &Path) -> Result<Decoded> {
        match container::sniff(bytes) {
            ContainerKind::Binary => {
                let chunks = container::parse_binary(bytes)?;
                self.decode(chunks.json, chunks.bin, base_dir)
            }
            ContainerKind::Text | ContainerKind::Unknown => self.decode(bytes, None, base_dir),
        }
    }

    /// Decodes JSON text plus an optional GLB BIN chunk.
    pub fn decode(&self, json: &[u8], bin: Option<&[u8]>, base_dir: &Path) -> Result<Decoded> {
        let mut state = DecodeState {
            resolver: &self.resolver,
            options: &self.options,
            base_dir,
            warnings: Vec::new(),
        };
        let model = state.run(json, bin)?;
        Ok(Decoded {
            model,
            warnings: state.warnings,
        })
    }
}

struct DecodeState<'a, R: ?Sized> {
    resolver: &'a R,
    options: &'a DecodeOptions,
    base_dir: &'a Path,
    warnings: Vec<Warning>,
}

fn invalid(path: String, reason: impl Into<String>) -> GltfError {
    FormatError::InvalidField {
        path,
        reason: reason.into(),
    }
    .into()
}

/// Consumes the keys of one JSON object, leaving unrecognised keys behind.
struct ObjectReader {
    map: Object,
    path: String,
}

impl ObjectReader {
    fn new(value: Value, path: String) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self { map, path }),
            other => Err(invalid(
                path,
                format!("expected an object, got {}", other.type_name()),
            )),
        }
    }

    fn field_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn take(&mut self, key: &str) -> Option<Value> {
        self.map.shift_remove(key)
    }

    fn wrong_type(&self, key: &str, expected: &str, got: &Value) -> GltfError {
        invalid(
            self.field_path(key),
            format!("expected {}, got {}", expected, got.type_name()),
        )
    }

    fn missing(&self, key: &str) -> GltfError {
        invalid(self.field_path(key), "missing required field")
    }

    fn opt_usize(&mut self, key: &str) -> Result<Option<usize>> {
        match self.take(key) {
            None => Ok(None),
            Some(v) => match v.as_u64().and_then(|n| usize::try_from(n).ok()) {
                Some(n) => Ok(Some(n)),
                None => Err(self.wrong_type(key, "a non-negative integer", &v)),
            },
        }
    }

    fn req_usize(&mut self, key: &str) -> Result<usize> {
        self.opt_usize(key)?.ok_or_else(|| self.missing(key))
    }

    fn opt_f64(&mut self, key: &str) -> Result<Option<f64>> {
        match self.take(key) {
            None => Ok(None),
            Some(v) => match v.as_f64() {
                Some(n) => Ok(Some(n)),
                None => Err(self.wrong_type(key, "a number", &v)),
            },
        }
    }

    fn req_f64(&mut self, key: &str) -> Result<f64> {
        self.opt_f64(key)?.ok_or_else(|| self.missing(key))
    }

    fn opt_bool(&mut self, key: &str) -> Result<Option<bool>> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(v) => Err(self.wrong_type(key, "a boolean", &v)),
        }
    }

    fn opt_string(&mut self, key: &str) -> Result<Option<String>> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(v) => Err(self.wrong_type(key, "a string", &v)),
        }
    }

    fn req_string(&mut self, key: &str) -> Result<String> {
        self.opt_string(key)?.ok_or_else(|| self.missing(key))
    }

    fn array(&mut self, key: &str) -> Result<Vec<Value>> {
        match self.take(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(v) => Err(self.wrong_type(key, "an array", &v)),
        }
    }

    fn usize_array(&mut self, key: &str) -> Result<Vec<usize>> {
        let items = self.array(key)?;
        items
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| {
                        invalid(
                            format!("{}[{}]", self.field_path(key), i),
                            "expected a non-negative integer",
                        )
                    })
            })
            .collect()
    }

    fn f64_array(&mut self, key: &str) -> Result<Vec<f64>> {
        let items = self.array(key)?;
        items
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_f64().ok_or_else(|| {
                    invalid(
                        format!("{}[{}]", self.field_path(key), i),
                        "expected a number",
                    )
                })
            })
            .collect()
    }

    fn string_array(&mut self, key: &str) -> Result<Vec<String>> {
        let items = self.array(key)?;
        items
            .into_iter()
            .enumerate()
            .map(|(i, v)| match v {
                Value::String(s) => Ok(s),
                _ => Err(invalid(
                    format!("{}[{}]", self.field_path(key), i),
                    "expected a string",
                )),
            })
            .collect()
    }

    fn opt_fixed<const N: usize>(&mut self, key: &str) -> Result<Option<[f64; N]>> {
        if !self.map.contains_key(key) {
            return Ok(None);
        }
        let values = self.f64_array(key)?;
        let len = values.len();
        <[f64; N]>::try_from(values).map(Some).map_err(|_| {
            invalid(
                self.field_path(key),
                format!("expected {} numbers, got {}", N, len),
            )
        })
    }

    fn opt_object(&mut self, key: &str) -> Result<Option<ObjectReader>> {
        match self.take(key) {
            None => Ok(None),
            Some(v) => ObjectReader::new(v, self.field_path(key)).map(Some),
        }
    }

    fn req_object(&mut self, key: &str) -> Result<ObjectReader> {
        self.opt_object(key)?.ok_or_else(|| self.missing(key))
    }

    /// Reads an array of objects; element paths use the singular `name`.
    fn objects(&mut self, key: &str, name: &str) -> Result<Vec<ObjectReader>> {
        let prefix = if self.path.is_empty() {
            String::new()
        } else {
            format!("{}.", self.path)
        };
        self.array(key)?
            .into_iter()
            .enumerate()
            .map(|(i, v)| ObjectReader::new(v, format!("{}{}[{}]", prefix, name, i)))
            .collect()
    }

    /// Reads an object mapping names to indices.
    fn index_map(&mut self, key: &str) -> Result<Option<AttributeMap>> {
        match self.opt_object(key)? {
            None => Ok(None),
            Some(reader) => reader.into_index_map().map(Some),
        }
    }

    fn into_index_map(self) -> Result<AttributeMap> {
        let path = self.path;
        self.map
            .into_iter()
            .map(|(name, v)| {
                match v.as_u64().and_then(|n| usize::try_from(n).ok()) {
                    Some(index) => Ok((name, index)),
                    None => Err(invalid(
                        format!("{}.{}", path, name),
                        "expected a non-negative integer",
                    )),
                }
            })
            .collect()
    }

    /// Ends reading: `extensions`, `extras` and every untouched key.
    fn finish(mut self) -> ExtensionData {
        let extensions = self.take("extensions");
        let extras = self.take("extras");
        if !self.map.is_empty() {
            trace!("{}: preserving unknown keys {:?}", self.path, self.map.keys());
        }
        ExtensionData {
            extensions,
            extras,
            unknown: self.map,
        }
    }
}

fn parse_root(json: &[u8]) -> Result<ObjectReader> {
    let json = json.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(json);
    let parsed: serde_json::Value =
        serde_json::from_slice(json).map_err(|e| FormatError::MalformedJson(e.to_string()))?;
    match Value::from(parsed) {
        Value::Object(map) => Ok(ObjectReader {
            map,
            path: String::new(),
        }),
        other => Err(FormatError::MalformedJson(format!(
            "root is {}, not an object",
            other.type_name()
        ))
        .into()),
    }
}

impl<R: ResourceResolver + ?Sized> DecodeState<'_, R> {
    fn warn(&mut self, kind: WarningKind, path: impl Into<String>, message: impl Into<String>) {
        let warning = Warning::new(kind, path, message);
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn run(&mut self, json: &[u8], bin: Option<&[u8]>) -> Result<Model> {
        let mut root = parse_root(json)?;
        let mut model = Model::new();

        model.asset = read_asset(&mut root)?;
        debug!("glTF asset version {}", model.asset.version);

        for reader in root.objects("buffers", "buffer")? {
            let index = model.buffers.len();
            let buffer = self.read_buffer(reader, index, bin)?;
            model.buffers.push(buffer);
        }
        let bin_used = model
            .buffers
            .first()
            .map_or(false, |b| b.source == BufferSource::BinaryChunk);
        if bin.is_some() && !bin_used {
            debug!("GLB BIN chunk is not referenced by buffer 0");
        }

        for reader in root.objects("images", "image")? {
            let image = self.read_image(reader)?;
            model.images.push(image);
        }

        for reader in root.objects("bufferViews", "bufferView")? {
            model.buffer_views.push(read_buffer_view(reader)?);
        }
        for reader in root.objects("accessors", "accessor")? {
            model.accessors.push(read_accessor(reader)?);
        }
        for reader in root.objects("meshes", "mesh")? {
            model.meshes.push(read_mesh(reader)?);
        }
        for reader in root.objects("nodes", "node")? {
            model.nodes.push(read_node(reader)?);
        }
        for reader in root.objects("scenes", "scene")? {
            model.scenes.push(read_scene(reader)?);
        }
        for reader in root.objects("materials", "material")? {
            model.materials.push(read_material(reader)?);
        }
        for reader in root.objects("textures", "texture")? {
            model.textures.push(read_texture(reader)?);
        }
        for reader in root.objects("samplers", "sampler")? {
            model.samplers.push(read_sampler(reader)?);
        }
        for reader in root.objects("animations", "animation")? {
            model.animations.push(read_animation(reader)?);
        }
        for reader in root.objects("skins", "skin")? {
            model.skins.push(read_skin(reader)?);
        }
        for reader in root.objects("cameras", "camera")? {
            model.cameras.push(read_camera(reader)?);
        }

        model.scene = root.opt_usize("scene")?;
        model.extensions_used = root.string_array("extensionsUsed")?;
        model.extensions_required = root.string_array("extensionsRequired")?;
        model.ext = root.finish();

        for name in model.extensions_used.clone() {
            self.warn(
                WarningKind::UnhandledExtension(name.clone()),
                "extensionsUsed",
                format!("extension {} is preserved but not interpreted", name),
            );
        }
        for name in model.extensions_required.clone() {
            if !model.extensions_used.contains(&name) {
                self.warn(
                    WarningKind::UnhandledExtension(name.clone()),
                    "extensionsRequired",
                    format!("required extension {} is not interpreted", name),
                );
            }
        }

        check_buffer_views(&model)?;
        self.check_accessors(&model)?;
        validate_references(&model)?;

        debug!(
            "decoded {} nodes, {} meshes, {} accessors, {} buffers ({} warnings)",
            model.nodes.len(),
            model.meshes.len(),
            model.accessors.len(),
            model.buffers.len(),
            self.warnings.len()
        );
        Ok(model)
    }

    fn read_buffer(
        &mut self,
        mut reader: ObjectReader,
        index: usize,
        bin: Option<&[u8]>,
    ) -> Result<Buffer> {
        let path = reader.path.clone();
        let byte_length = reader.req_usize("byteLength")?;
        let name = reader.opt_string("name")?;
        let uri = reader.opt_string("uri")?;

        let (source, data) = match uri {
            None => {
                let chunk = match bin {
                    Some(chunk) if index == 0 => chunk,
                    _ => return Err(ResourceError::MissingBinaryChunk { path }.into()),
                };
                // The BIN chunk may carry up to 3 bytes of padding.
                if chunk.len() < byte_length || chunk.len() - byte_length > 3 {
                    return Err(LayoutError::BufferSizeMismatch {
                        path,
                        declared: byte_length,
                        actual: chunk.len(),
                    }
                    .into());
                }
                (BufferSource::BinaryChunk, chunk[..byte_length].to_vec())
            }
            Some(uri) if data_uri::is_data_uri(&uri) => {
                let decoded = data_uri::decode(&uri).map_err(|reason| {
                    ResourceError::MalformedDataUri {
                        path: format!("{}.uri", path),
                        reason,
                    }
                })?;
                (BufferSource::DataUri, decoded.data)
            }
            Some(uri) => {
                let data = self.resolver.resolve(self.base_dir, &uri).map_err(|e| {
                    ResourceError::BufferNotFound {
                        path: path.clone(),
                        uri: uri.clone(),
                        reason: e.to_string(),
                    }
                })?;
                (BufferSource::External(uri), data)
            }
        };

        if data.len() != byte_length {
            return Err(LayoutError::BufferSizeMismatch {
                path,
                declared: byte_length,
                actual: data.len(),
            }
            .into());
        }
        trace!("{}: {} bytes from {:?}", path, data.len(), source);

        Ok(Buffer {
            name,
            source,
            data,
            ext: reader.finish(),
        })
    }

    fn read_image(&mut self, mut reader: ObjectReader) -> Result<Image> {
        let path = reader.path.clone();
        let name = reader.opt_string("name")?;
        let mime_type = reader.opt_string("mimeType")?;
        let uri = reader.opt_string("uri")?;
        let buffer_view = reader.opt_usize("bufferView")?;

        let (source, data) = match (uri, buffer_view) {
            (Some(_), Some(_)) => {
                return Err(invalid(path, "uri and bufferView are mutually exclusive"));
            }
            (None, Some(view)) => (ImageSource::BufferView(view), Vec::new()),
            (None, None) => (ImageSource::None, Vec::new()),
            (Some(uri), None) if data_uri::is_data_uri(&uri) => {
                let decoded = data_uri::decode(&uri).map_err(|reason| {
                    ResourceError::MalformedDataUri {
                        path: format!("{}.uri", path),
                        reason,
                    }
                })?;
                (ImageSource::DataUri, decoded.data)
            }
            (Some(uri), None) => {
                let data = if self.options.load_images {
                    self.resolver.resolve(self.base_dir, &uri).map_err(|e| {
                        ResourceError::ImageNotFound {
                            path: path.clone(),
                            uri: uri.clone(),
                            reason: e.to_string(),
                        }
                    })?
                } else {
                    Vec::new()
                };
                (ImageSource::External(uri), data)
            }
        };

        Ok(Image {
            name,
            source,
            mime_type,
            data,
            ext: reader.finish(),
        })
    }

    fn check_accessors(&mut self, model: &Model) -> Result<()> {
        for (i, accessor) in model.accessors.iter().enumerate() {
            let path = format!("accessor[{}]", i);
            let view = AccessorView::new(model, i)?;

            if view.sparse_unordered() {
                self.warn(
                    WarningKind::UnorderedSparseIndices,
                    format!("{}.sparse.indices", path),
                    "sparse indices are not strictly increasing; later entries win",
                );
            }

            let component = accessor.component_type.size();
            let view_offset = accessor
                .buffer_view
                .and_then(|v| model.buffer_views.get(v))
                .map_or(0, |v| v.byte_offset);
            if (view_offset + accessor.byte_offset) % component != 0 {
                self.warn(
                    WarningKind::MisalignedAccessor,
                    path.clone(),
                    format!("data is not aligned to its {}-byte components", component),
                );
            }

            if self.options.check_min_max {
                self.check_min_max(&view, &path);
            }
        }
        Ok(())
    }

    fn check_min_max(&mut self, view: &AccessorView<'_>, path: &str) {
        let accessor = view.accessor();
        if accessor.min.is_empty() && accessor.max.is_empty() {
            return;
        }
        // min/max describe the stored values, not the normalized ones
        if accessor.normalized {
            return;
        }
        let n = accessor.num_components();
        for (key, declared) in [("min", &accessor.min), ("max", &accessor.max)] {
            if !declared.is_empty() && declared.len() != n {
                self.warn(
                    WarningKind::MinMaxMismatch,
                    format!("{}.{}", path, key),
                    format!("has {} entries, expected {}", declared.len(), n),
                );
                return;
            }
        }

        let (lo, hi) = match view.bounds() {
            Some(bounds) => bounds,
            None => return,
        };
        let tolerance = self.options.min_max_tolerance;
        let differs = |declared: &[f64], actual: &[f64]| {
            declared
                .iter()
                .zip(actual)
                .any(|(d, a)| (d - a).abs() > tolerance.max(tolerance * a.abs()))
        };
        if differs(&accessor.min, &lo) {
            self.warn(
                WarningKind::MinMaxMismatch,
                format!("{}.min", path),
                format!("declared {:?}, data has {:?}", accessor.min, lo),
            );
        }
        if differs(&accessor.max, &hi) {
            self.warn(
                WarningKind::MinMaxMismatch,
                format!("{}.max", path),
                format!("declared {:?}, data has {:?}", accessor.max, hi),
            );
        }
    }
}

fn read_asset(root: &mut ObjectReader) -> Result<Asset> {
    let mut reader = match root.opt_object("asset") {
        Ok(Some(reader)) => reader,
        _ => return Err(FormatError::MissingAsset.into()),
    };
    let version = match reader.opt_string("version") {
        Ok(Some(version)) => version,
        _ => return Err(FormatError::MissingAsset.into()),
    };
    Ok(Asset {
        version,
        min_version: reader.opt_string("minVersion")?,
        generator: reader.opt_string("generator")?,
        copyright: reader.opt_string("copyright")?,
        ext: reader.finish(),
    })
}

fn read_buffer_view(mut reader: ObjectReader) -> Result<BufferView> {
    let target = match reader.opt_usize("target")? {
        Some(t) => Some(u32::try_from(t).map_err(|_| {
            invalid(reader.field_path("target"), format!("{} does not fit in 32 bits", t))
        })?),
        None => None,
    };
    Ok(BufferView {
        buffer: reader.req_usize("buffer")?,
        byte_offset: reader.opt_usize("byteOffset")?.unwrap_or(0),
        byte_length: reader.req_usize("byteLength")?,
        byte_stride: reader.opt_usize("byteStride")?,
        target,
        name: reader.opt_string("name")?,
        ext: reader.finish(),
    })
}

fn read_component_type(reader: &mut ObjectReader, key: &str) -> Result<ComponentType> {
    let code = reader.req_usize(key)?;
    ComponentType::from_code(code as u64).ok_or_else(|| {
        TypeError::InvalidAccessorType {
            path: reader.field_path(key),
            reason: format!("unknown componentType {}", code),
        }
        .into()
    })
}

fn read_accessor(mut reader: ObjectReader) -> Result<Accessor> {
    let buffer_view = reader.opt_usize("bufferView")?;
    let byte_offset = reader.opt_usize("byteOffset")?.unwrap_or(0);
    let component_type = read_component_type(&mut reader, "componentType")?;
    let normalized = reader.opt_bool("normalized")?.unwrap_or(false);
    let count = reader.req_usize("count")?;
    let type_name = reader.req_string("type")?;
    let accessor_type = AccessorType::from_name(&type_name).ok_or_else(|| {
        TypeError::InvalidAccessorType {
            path: reader.field_path("type"),
            reason: format!("unknown type {}", type_name),
        }
    })?;
    let max = reader.f64_array("max")?;
    let min = reader.f64_array("min")?;

    let sparse = match reader.opt_object("sparse")? {
        Some(mut sparse) => {
            let count = sparse.req_usize("count")?;
            let mut indices = sparse.req_object("indices")?;
            let indices = SparseIndices {
                buffer_view: indices.req_usize("bufferView")?,
                byte_offset: indices.opt_usize("byteOffset")?.unwrap_or(0),
                component_type: read_component_type(&mut indices, "componentType")?,
                ext: indices.finish(),
            };
            let mut values = sparse.req_object("values")?;
            let values = SparseValues {
                buffer_view: values.req_usize("bufferView")?,
                byte_offset: values.opt_usize("byteOffset")?.unwrap_or(0),
                ext: values.finish(),
            };
            Some(Sparse {
                count,
                indices,
                values,
                ext: sparse.finish(),
            })
        }
        None => None,
    };

    Ok(Accessor {
        name: reader.opt_string("name")?,
        buffer_view,
        byte_offset,
        component_type,
        normalized,
        count,
        accessor_type,
        min,
        max,
        sparse,
        ext: reader.finish(),
    })
}

fn read_primitive(mut reader: ObjectReader) -> Result<Primitive> {
    let attributes = reader
        .index_map("attributes")?
        .ok_or_else(|| reader.missing("attributes"))?;
    let mode = match reader.opt_usize("mode")? {
        Some(code) => Some(
            Mode::from_code(code as u64)
                .ok_or_else(|| invalid(reader.field_path("mode"), format!("unknown mode {}", code)))?,
        ),
        None => None,
    };
    let targets = reader
        .objects("targets", "target")?
        .into_iter()
        .map(ObjectReader::into_index_map)
        .collect::<Result<Vec<_>>>()?;
    Ok(Primitive {
        attributes,
        indices: reader.opt_usize("indices")?,
        material: reader.opt_usize("material")?,
        mode,
        targets,
        ext: reader.finish(),
    })
}

fn read_mesh(mut reader: ObjectReader) -> Result<Mesh> {
    if !reader.map.contains_key("primitives") {
        return Err(reader.missing("primitives"));
    }
    let primitives = reader
        .objects("primitives", "primitive")?
        .into_iter()
        .map(read_primitive)
        .collect::<Result<Vec<_>>>()?;
    Ok(Mesh {
        name: reader.opt_string("name")?,
        primitives,
        weights: reader.f64_array("weights")?,
        ext: reader.finish(),
    })
}

fn read_node(mut reader: ObjectReader) -> Result<Node> {
    let matrix = reader.opt_fixed::<16>("matrix")?;
    let translation = reader.opt_fixed::<3>("translation")?;
    let rotation = reader.opt_fixed::<4>("rotation")?;
    let scale = reader.opt_fixed::<3>("scale")?;
    let transform = match matrix {
        Some(m) => {
            if translation.is_some() || rotation.is_some() || scale.is_some() {
                return Err(invalid(
                    reader.field_path("matrix"),
                    "matrix cannot be combined with translation, rotation or scale",
                ));
            }
            Transform::Matrix(m)
        }
        None => Transform::Decomposed {
            translation,
            rotation,
            scale,
        },
    };
    Ok(Node {
        name: reader.opt_string("name")?,
        camera: reader.opt_usize("camera")?,
        children: reader.usize_array("children")?,
        skin: reader.opt_usize("skin")?,
        mesh: reader.opt_usize("mesh")?,
        transform,
        weights: reader.f64_array("weights")?,
        ext: reader.finish(),
    })
}

fn read_scene(mut reader: ObjectReader) -> Result<Scene> {
    Ok(Scene {
        name: reader.opt_string("name")?,
        nodes: reader.usize_array("nodes")?,
        ext: reader.finish(),
    })
}

fn read_texture_info(reader: Option<ObjectReader>) -> Result<Option<TextureInfo>> {
    reader
        .map(|mut r| -> Result<TextureInfo> {
            Ok(TextureInfo {
                index: r.req_usize("index")?,
                tex_coord: r.opt_usize("texCoord")?,
                ext: r.finish(),
            })
        })
        .transpose()
}

fn read_material(mut reader: ObjectReader) -> Result<Material> {
    let pbr = match reader.opt_object("pbrMetallicRoughness")? {
        Some(mut pbr) => Some(PbrMetallicRoughness {
            base_color_factor: pbr.opt_fixed::<4>("baseColorFactor")?,
            base_color_texture: read_texture_info(pbr.opt_object("baseColorTexture")?)?,
            metallic_factor: pbr.opt_f64("metallicFactor")?,
            roughness_factor: pbr.opt_f64("roughnessFactor")?,
            metallic_roughness_texture: read_texture_info(
                pbr.opt_object("metallicRoughnessTexture")?,
            )?,
            ext: pbr.finish(),
        }),
        None => None,
    };
    let normal_texture = match reader.opt_object("normalTexture")? {
        Some(mut r) => Some(NormalTextureInfo {
            index: r.req_usize("index")?,
            tex_coord: r.opt_usize("texCoord")?,
            scale: r.opt_f64("scale")?,
            ext: r.finish(),
        }),
        None => None,
    };
    let occlusion_texture = match reader.opt_object("occlusionTexture")? {
        Some(mut r) => Some(OcclusionTextureInfo {
            index: r.req_usize("index")?,
            tex_coord: r.opt_usize("texCoord")?,
            strength: r.opt_f64("strength")?,
            ext: r.finish(),
        }),
        None => None,
    };
    let alpha_mode = match reader.opt_string("alphaMode")? {
        Some(name) => Some(AlphaMode::from_name(&name).ok_or_else(|| {
            invalid(
                reader.field_path("alphaMode"),
                format!("unknown alphaMode {}", name),
            )
        })?),
        None => None,
    };
    Ok(Material {
        name: reader.opt_string("name")?,
        pbr_metallic_roughness: pbr,
        normal_texture,
        occlusion_texture,
        emissive_texture: read_texture_info(reader.opt_object("emissiveTexture")?)?,
        emissive_factor: reader.opt_fixed::<3>("emissiveFactor")?,
        alpha_mode,
        alpha_cutoff: reader.opt_f64("alphaCutoff")?,
        double_sided: reader.opt_bool("doubleSided")?,
        ext: reader.finish(),
    })
}

fn read_texture(mut reader: ObjectReader) -> Result<Texture> {
    Ok(Texture {
        name: reader.opt_string("name")?,
        sampler: reader.opt_usize("sampler")?,
        source: reader.opt_usize("source")?,
        ext: reader.finish(),
    })
}

fn read_enum<T>(
    reader: &mut ObjectReader,
    key: &str,
    from_code: fn(u64) -> Option<T>,
) -> Result<Option<T>> {
    match reader.opt_usize(key)? {
        Some(code) => from_code(code as u64)
            .map(Some)
            .ok_or_else(|| invalid(reader.field_path(key), format!("unknown value {}", code))),
        None => Ok(None),
    }
}

fn read_sampler(mut reader: ObjectReader) -> Result<Sampler> {
    Ok(Sampler {
        name: reader.opt_string("name")?,
        mag_filter: read_enum(&mut reader, "magFilter", MagFilter::from_code)?,
        min_filter: read_enum(&mut reader, "minFilter", MinFilter::from_code)?,
        wrap_s: read_enum(&mut reader, "wrapS", WrapMode::from_code)?,
        wrap_t: read_enum(&mut reader, "wrapT", WrapMode::from_code)?,
        ext: reader.finish(),
    })
}

fn read_animation(mut reader: ObjectReader) -> Result<Animation> {
    let mut channels = Vec::new();
    for mut channel in reader.objects("channels", "channel")? {
        let sampler = channel.req_usize("sampler")?;
        let mut target = channel.req_object("target")?;
        let target = ChannelTarget {
            node: target.opt_usize("node")?,
            path: TargetPath::from_name(&target.req_string("path")?),
            ext: target.finish(),
        };
        channels.push(Channel {
            sampler,
            target,
            ext: channel.finish(),
        });
    }

    let mut samplers = Vec::new();
    for mut sampler in reader.objects("samplers", "sampler")? {
        let interpolation = match sampler.opt_string("interpolation")? {
            Some(name) => Some(Interpolation::from_name(&name).ok_or_else(|| {
                invalid(
                    sampler.field_path("interpolation"),
                    format!("unknown interpolation {}", name),
                )
            })?),
            None => None,
        };
        samplers.push(AnimationSampler {
            input: sampler.req_usize("input")?,
            output: sampler.req_usize("output")?,
            interpolation,
            ext: sampler.finish(),
        });
    }

    Ok(Animation {
        name: reader.opt_string("name")?,
        channels,
        samplers,
        ext: reader.finish(),
    })
}

fn read_skin(mut reader: ObjectReader) -> Result<Skin> {
    Ok(Skin {
        name: reader.opt_string("name")?,
        inverse_bind_matrices: reader.opt_usize("inverseBindMatrices")?,
        skeleton: reader.opt_usize("skeleton")?,
        joints: reader.usize_array("joints")?,
        ext: reader.finish(),
    })
}

fn read_camera(mut reader: ObjectReader) -> Result<Camera> {
    let kind = reader.req_string("type")?;
    let projection = match kind.as_str() {
        "perspective" => {
            let mut p = reader.req_object("perspective")?;
            Projection::Perspective(Perspective {
                aspect_ratio: p.opt_f64("aspectRatio")?,
                yfov: p.req_f64("yfov")?,
                zfar: p.opt_f64("zfar")?,
                znear: p.req_f64("znear")?,
                ext: p.finish(),
            })
        }
        "orthographic" => {
            let mut o = reader.req_object("orthographic")?;
            Projection::Orthographic(Orthographic {
                xmag: o.req_f64("xmag")?,
                ymag: o.req_f64("ymag")?,
                zfar: o.req_f64("zfar")?,
                znear: o.req_f64("znear")?,
                ext: o.finish(),
            })
        }
        other => {
            return Err(invalid(
                reader.field_path("type"),
                format!("unknown camera type {}", other),
            ))
        }
    };
    Ok(Camera {
        name: reader.opt_string("name")?,
        projection,
        ext: reader.finish(),
    })
}

fn check_buffer_views(model: &Model) -> Result<()> {
    for (i, view) in model.buffer_views.iter().enumerate() {
        let path = format!("bufferView[{}]", i);
        let buffer = model.buffers.get(view.buffer).ok_or_else(|| {
            ReferenceError::DanglingReference {
                field: format!("{}.buffer", path),
                index: view.buffer,
                len: model.buffers.len(),
            }
        })?;
        let fits = view
            .byte_offset
            .checked_add(view.byte_length)
            .map_or(false, |end| end <= buffer.data.len());
        if !fits {
            return Err(LayoutError::BufferViewOutOfBounds {
                path,
                offset: view.byte_offset,
                length: view.byte_length,
                buffer_len: buffer.data.len(),
            }
            .into());
        }
        if let Some(stride) = view.byte_stride {
            if !(4..=252).contains(&stride) || stride % 4 != 0 {
                return Err(LayoutError::InvalidByteStride {
                    path,
                    stride,
                    reason: "must be a multiple of 4 between 4 and 252".to_string(),
                }
                .into());
            }
        }
    }
    Ok(())
}
