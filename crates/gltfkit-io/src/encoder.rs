//! [`Model`] encoding to glTF JSON text or GLB.

use std::fs;
use std::path::{Component, Path, PathBuf};

use log::{debug, trace, warn};

use gltfkit_core::{
    validate_references, Accessor, Animation, Asset, AttributeMap, Buffer, BufferSource,
    BufferView, Camera, ExtensionData, FormatError, Image, ImageSource, Material, Mesh, Model,
    Node, Object, Primitive, Projection, Result, Sampler, Scene, Skin, Texture, TextureInfo,
    Transform, Value,
};

use crate::container::{self, ContainerKind};
use crate::data_uri::{self, OCTET_STREAM};
use crate::options::EncodeOptions;

/// A file that must be written next to the main document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalResource {
    /// URI as referenced from the JSON.
    pub uri: String,
    pub data: Vec<u8>,
}

/// Output of [`Encoder::encode`].
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAsset {
    pub json: String,
    /// BIN chunk payload (GLB only).
    pub bin: Option<Vec<u8>>,
    pub resources: Vec<ExternalResource>,
    /// [`ContainerKind::Binary`] for GLB, [`ContainerKind::Text`] otherwise.
    pub container: ContainerKind,
}

impl EncodedAsset {
    /// Bytes of the main file: a packed GLB or the JSON text.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self.container {
            ContainerKind::Binary => {
                Ok(container::pack_binary(self.json.as_bytes(), self.bin.as_deref())?)
            }
            _ => Ok(self.json.as_bytes().to_vec()),
        }
    }

    /// Writes the main file to `path` and every external resource beside it.
    ///
    /// Resource URIs must name files inside the output directory; absolute
    /// paths and `..` components are rejected before anything is written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut targets = Vec::with_capacity(self.resources.len());
        for (i, resource) in self.resources.iter().enumerate() {
            targets.push((dir.join(resource_path(i, &resource.uri)?), resource));
        }

        fs::write(path, self.to_bytes()?)?;
        for (target, resource) in targets {
            debug!("writing {} ({} bytes)", target.display(), resource.data.len());
            fs::write(target, &resource.data)?;
        }
        Ok(())
    }
}

/// Relative file path of a resource URI, confined to the output directory.
fn resource_path(index: usize, uri: &str) -> Result<PathBuf> {
    let decoded = data_uri::percent_decode(uri);
    let relative = PathBuf::from(String::from_utf8_lossy(&decoded).into_owned());
    let confined = relative
        .components()
        .any(|c| matches!(c, Component::Normal(_)))
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !confined {
        return Err(FormatError::InvalidField {
            path: format!("resource[{}].uri", index),
            reason: format!("'{}' escapes the output directory", uri),
        }
        .into());
    }
    Ok(relative)
}

/// Encodes models according to [`EncodeOptions`].
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    options: EncodeOptions,
}

/// Encodes `model` and writes it to `path` with its external resources.
pub fn save<P: AsRef<Path>>(model: &Model, path: P, options: EncodeOptions) -> Result<()> {
    Encoder::new(options).encode(model)?.save(path)
}

/// Builds one JSON object in key order.
struct ObjectWriter {
    map: Object,
}

impl ObjectWriter {
    fn new() -> Self {
        Self { map: Object::new() }
    }

    fn put(&mut self, key: &str, value: impl Into<Value>) {
        self.map.insert(key.to_string(), value.into());
    }

    fn opt<T: Into<Value>>(&mut self, key: &str, value: Option<T>) {
        if let Some(value) = value {
            self.put(key, value);
        }
    }

    fn opt_str(&mut self, key: &str, value: &Option<String>) {
        if let Some(value) = value {
            self.put(key, value.as_str());
        }
    }

    fn numbers(&mut self, key: &str, values: &[f64]) {
        if !values.is_empty() {
            self.put(key, numbers(values));
        }
    }

    fn indices(&mut self, key: &str, values: &[usize]) {
        if !values.is_empty() {
            self.put(key, values.iter().map(|&v| Value::from(v)).collect::<Vec<_>>());
        }
    }

    fn object(&mut self, key: &str, value: Option<Value>) {
        if let Some(value) = value {
            self.map.insert(key.to_string(), value);
        }
    }

    /// Appends preserved keys, `extensions` and `extras`.
    fn finish(mut self, ext: &ExtensionData) -> Value {
        for (key, value) in &ext.unknown {
            if !self.map.contains_key(key) {
                self.map.insert(key.clone(), value.clone());
            }
        }
        self.object("extensions", ext.extensions.clone());
        self.object("extras", ext.extras.clone());
        Value::Object(self.map)
    }
}

fn numbers(values: &[f64]) -> Vec<Value> {
    values.iter().map(|&v| Value::Real(v)).collect()
}

fn attribute_map(map: &AttributeMap) -> Value {
    Value::Object(
        map.iter()
            .map(|(name, &index)| (name.clone(), Value::from(index)))
            .collect(),
    )
}

impl Encoder {
    pub fn new(options: EncodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Encodes `model`. The model itself is not modified.
    pub fn encode(&self, model: &Model) -> Result<EncodedAsset> {
        if self.options.strict {
            validate_references(model)?;
        }

        let mut resources = Vec::new();
        let mut bin = None;
        let mut root = ObjectWriter::new();

        root.put("asset", write_asset(&model.asset));
        root.opt("scene", model.scene);
        self.put_table(&mut root, "scenes", &model.scenes, write_scene);
        self.put_table(&mut root, "nodes", &model.nodes, write_node);
        self.put_table(&mut root, "meshes", &model.meshes, write_mesh);
        self.put_table(&mut root, "accessors", &model.accessors, write_accessor);
        self.put_table(&mut root, "bufferViews", &model.buffer_views, write_buffer_view);

        let mut buffers = Vec::with_capacity(model.buffers.len());
        for (i, buffer) in model.buffers.iter().enumerate() {
            buffers.push(self.write_buffer(i, buffer, &mut bin, &mut resources));
        }
        if !buffers.is_empty() {
            root.put("buffers", buffers);
        }

        self.put_table(&mut root, "materials", &model.materials, write_material);
        self.put_table(&mut root, "textures", &model.textures, write_texture);

        let mut images = Vec::with_capacity(model.images.len());
        for (i, image) in model.images.iter().enumerate() {
            images.push(self.write_image(i, image, &mut resources));
        }
        if !images.is_empty() {
            root.put("images", images);
        }

        self.put_table(&mut root, "samplers", &model.samplers, write_sampler);
        self.put_table(&mut root, "animations", &model.animations, write_animation);
        self.put_table(&mut root, "skins", &model.skins, write_skin);
        self.put_table(&mut root, "cameras", &model.cameras, write_camera);

        if !model.extensions_used.is_empty() {
            root.put(
                "extensionsUsed",
                model.extensions_used.iter().map(|e| Value::from(e.as_str())).collect::<Vec<_>>(),
            );
        }
        if !model.extensions_required.is_empty() {
            root.put(
                "extensionsRequired",
                model
                    .extensions_required
                    .iter()
                    .map(|e| Value::from(e.as_str()))
                    .collect::<Vec<_>>(),
            );
        }

        let tree = root.finish(&model.ext);
        if let Some(path) = tree.find_non_finite() {
            return Err(FormatError::NonFiniteNumber {
                path: path.trim_start_matches('.').to_string(),
            }
            .into());
        }

        let json = if self.options.pretty {
            serde_json::to_string_pretty(&tree)
        } else {
            serde_json::to_string(&tree)
        }
        .map_err(|e| FormatError::MalformedJson(e.to_string()))?;

        let container = if self.options.binary_container {
            ContainerKind::Binary
        } else {
            ContainerKind::Text
        };
        debug!(
            "encoded {:?} asset: {} byte JSON, {} byte BIN, {} external resources",
            container,
            json.len(),
            bin.as_ref().map_or(0, Vec::len),
            resources.len()
        );

        Ok(EncodedAsset {
            json,
            bin,
            resources,
            container,
        })
    }

    fn put_table<T>(
        &self,
        root: &mut ObjectWriter,
        key: &str,
        items: &[T],
        write: fn(&T) -> Value,
    ) {
        if !items.is_empty() {
            root.put(key, items.iter().map(write).collect::<Vec<_>>());
        }
    }

    fn write_buffer(
        &self,
        index: usize,
        buffer: &Buffer,
        bin: &mut Option<Vec<u8>>,
        resources: &mut Vec<ExternalResource>,
    ) -> Value {
        let mut w = ObjectWriter::new();
        w.put("byteLength", buffer.data.len());

        if self.options.binary_container && index == 0 && !self.options.embed_buffers {
            trace!("buffer[0] -> BIN chunk");
            *bin = Some(buffer.data.clone());
        } else if self.options.embed_buffers || self.options.binary_container {
            // GLB carries one BIN chunk; every other buffer stays inside the file.
            trace!("buffer[{}] -> data URI", index);
            w.put("uri", data_uri::encode(OCTET_STREAM, &buffer.data));
        } else {
            match &buffer.source {
                BufferSource::DataUri => {
                    w.put("uri", data_uri::encode(OCTET_STREAM, &buffer.data));
                }
                BufferSource::External(uri) => {
                    w.put("uri", uri.as_str());
                    resources.push(ExternalResource {
                        uri: uri.clone(),
                        data: buffer.data.clone(),
                    });
                }
                BufferSource::BinaryChunk => {
                    let uri = format!("{}{}.bin", self.options.buffer_uri_stem, index);
                    trace!("buffer[{}] -> {}", index, uri);
                    w.put("uri", uri.as_str());
                    resources.push(ExternalResource {
                        uri,
                        data: buffer.data.clone(),
                    });
                }
            }
        }

        w.opt_str("name", &buffer.name);
        w.finish(&buffer.ext)
    }

    fn write_image(
        &self,
        index: usize,
        image: &Image,
        resources: &mut Vec<ExternalResource>,
    ) -> Value {
        let mut w = ObjectWriter::new();
        let embedded = || {
            let mime = image
                .mime_type
                .as_deref()
                .or_else(|| data_uri::sniff_mime(&image.data))
                .unwrap_or(OCTET_STREAM);
            data_uri::encode(mime, &image.data)
        };

        match &image.source {
            ImageSource::BufferView(view) => w.put("bufferView", *view),
            ImageSource::DataUri => w.put("uri", embedded()),
            ImageSource::External(uri) => {
                let inline = self.options.embed_images || self.options.binary_container;
                if inline && !image.data.is_empty() {
                    w.put("uri", embedded());
                } else {
                    if self.options.embed_images {
                        warn!("image[{}]: no data loaded for '{}', keeping the URI", index, uri);
                    }
                    w.put("uri", uri.as_str());
                    if !image.data.is_empty() {
                        resources.push(ExternalResource {
                            uri: uri.clone(),
                            data: image.data.clone(),
                        });
                    }
                }
            }
            ImageSource::None => {}
        }

        w.opt_str("mimeType", &image.mime_type);
        w.opt_str("name", &image.name);
        w.finish(&image.ext)
    }
}

fn write_asset(asset: &Asset) -> Value {
    let mut w = ObjectWriter::new();
    w.put("version", asset.version.as_str());
    w.opt_str("minVersion", &asset.min_version);
    w.opt_str("generator", &asset.generator);
    w.opt_str("copyright", &asset.copyright);
    w.finish(&asset.ext)
}

fn write_scene(scene: &Scene) -> Value {
    let mut w = ObjectWriter::new();
    w.indices("nodes", &scene.nodes);
    w.opt_str("name", &scene.name);
    w.finish(&scene.ext)
}

fn write_node(node: &Node) -> Value {
    let mut w = ObjectWriter::new();
    w.opt("camera", node.camera);
    w.indices("children", &node.children);
    w.opt("skin", node.skin);
    match &node.transform {
        Transform::Matrix(m) => w.numbers("matrix", m),
        Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => {
            if let Some(r) = rotation {
                w.numbers("rotation", r);
            }
            if let Some(s) = scale {
                w.numbers("scale", s);
            }
            if let Some(t) = translation {
                w.numbers("translation", t);
            }
        }
    }
    w.opt("mesh", node.mesh);
    w.numbers("weights", &node.weights);
    w.opt_str("name", &node.name);
    w.finish(&node.ext)
}

fn write_primitive(prim: &Primitive) -> Value {
    let mut w = ObjectWriter::new();
    w.put("attributes", attribute_map(&prim.attributes));
    w.opt("indices", prim.indices);
    w.opt("material", prim.material);
    w.opt("mode", prim.mode.map(|m| m.code()));
    if !prim.targets.is_empty() {
        w.put(
            "targets",
            prim.targets.iter().map(attribute_map).collect::<Vec<_>>(),
        );
    }
    w.finish(&prim.ext)
}

fn write_mesh(mesh: &Mesh) -> Value {
    let mut w = ObjectWriter::new();
    w.put(
        "primitives",
        mesh.primitives.iter().map(write_primitive).collect::<Vec<_>>(),
    );
    w.numbers("weights", &mesh.weights);
    w.opt_str("name", &mesh.name);
    w.finish(&mesh.ext)
}

fn write_accessor(accessor: &Accessor) -> Value {
    let mut w = ObjectWriter::new();
    w.opt("bufferView", accessor.buffer_view);
    if accessor.byte_offset != 0 {
        w.put("byteOffset", accessor.byte_offset);
    }
    w.put("componentType", accessor.component_type.code());
    if accessor.normalized {
        w.put("normalized", true);
    }
    w.put("count", accessor.count);
    w.put("type", accessor.accessor_type.name());
    w.numbers("max", &accessor.max);
    w.numbers("min", &accessor.min);

    if let Some(sparse) = &accessor.sparse {
        let mut indices = ObjectWriter::new();
        indices.put("bufferView", sparse.indices.buffer_view);
        if sparse.indices.byte_offset != 0 {
            indices.put("byteOffset", sparse.indices.byte_offset);
        }
        indices.put("componentType", sparse.indices.component_type.code());

        let mut values = ObjectWriter::new();
        values.put("bufferView", sparse.values.buffer_view);
        if sparse.values.byte_offset != 0 {
            values.put("byteOffset", sparse.values.byte_offset);
        }

        let mut s = ObjectWriter::new();
        s.put("count", sparse.count);
        s.put("indices", indices.finish(&sparse.indices.ext));
        s.put("values", values.finish(&sparse.values.ext));
        w.put("sparse", s.finish(&sparse.ext));
    }

    w.opt_str("name", &accessor.name);
    w.finish(&accessor.ext)
}

fn write_buffer_view(view: &BufferView) -> Value {
    let mut w = ObjectWriter::new();
    w.put("buffer", view.buffer);
    if view.byte_offset != 0 {
        w.put("byteOffset", view.byte_offset);
    }
    w.put("byteLength", view.byte_length);
    w.opt("byteStride", view.byte_stride);
    w.opt("target", view.target);
    w.opt_str("name", &view.name);
    w.finish(&view.ext)
}

fn write_texture_info(info: &TextureInfo) -> Value {
    let mut w = ObjectWriter::new();
    w.put("index", info.index);
    w.opt("texCoord", info.tex_coord);
    w.finish(&info.ext)
}

fn write_material(material: &Material) -> Value {
    let mut w = ObjectWriter::new();
    if let Some(pbr) = &material.pbr_metallic_roughness {
        let mut p = ObjectWriter::new();
        if let Some(f) = &pbr.base_color_factor {
            p.numbers("baseColorFactor", f);
        }
        p.object("baseColorTexture", pbr.base_color_texture.as_ref().map(write_texture_info));
        p.opt("metallicFactor", pbr.metallic_factor);
        p.opt("roughnessFactor", pbr.roughness_factor);
        p.object(
            "metallicRoughnessTexture",
            pbr.metallic_roughness_texture.as_ref().map(write_texture_info),
        );
        w.put("pbrMetallicRoughness", p.finish(&pbr.ext));
    }
    if let Some(normal) = &material.normal_texture {
        let mut t = ObjectWriter::new();
        t.put("index", normal.index);
        t.opt("texCoord", normal.tex_coord);
        t.opt("scale", normal.scale);
        w.put("normalTexture", t.finish(&normal.ext));
    }
    if let Some(occlusion) = &material.occlusion_texture {
        let mut t = ObjectWriter::new();
        t.put("index", occlusion.index);
        t.opt("texCoord", occlusion.tex_coord);
        t.opt("strength", occlusion.strength);
        w.put("occlusionTexture", t.finish(&occlusion.ext));
    }
    w.object(
        "emissiveTexture",
        material.emissive_texture.as_ref().map(write_texture_info),
    );
    if let Some(f) = &material.emissive_factor {
        w.numbers("emissiveFactor", f);
    }
    w.opt("alphaMode", material.alpha_mode.map(|m| m.name()));
    w.opt("alphaCutoff", material.alpha_cutoff);
    w.opt("doubleSided", material.double_sided);
    w.opt_str("name", &material.name);
    w.finish(&material.ext)
}

fn write_texture(texture: &Texture) -> Value {
    let mut w = ObjectWriter::new();
    w.opt("sampler", texture.sampler);
    w.opt("source", texture.source);
    w.opt_str("name", &texture.name);
    w.finish(&texture.ext)
}

fn write_sampler(sampler: &Sampler) -> Value {
    let mut w = ObjectWriter::new();
    w.opt("magFilter", sampler.mag_filter.map(|f| f as u32));
    w.opt("minFilter", sampler.min_filter.map(|f| f as u32));
    w.opt("wrapS", sampler.wrap_s.map(|m| m as u32));
    w.opt("wrapT", sampler.wrap_t.map(|m| m as u32));
    w.opt_str("name", &sampler.name);
    w.finish(&sampler.ext)
}

fn write_animation(animation: &Animation) -> Value {
    let channels: Vec<Value> = animation
        .channels
        .iter()
        .map(|channel| {
            let mut target = ObjectWriter::new();
            target.opt("node", channel.target.node);
            target.put("path", channel.target.path.name());
            let mut w = ObjectWriter::new();
            w.put("sampler", channel.sampler);
            w.put("target", target.finish(&channel.target.ext));
            w.finish(&channel.ext)
        })
        .collect();
    let samplers: Vec<Value> = animation
        .samplers
        .iter()
        .map(|sampler| {
            let mut w = ObjectWriter::new();
            w.put("input", sampler.input);
            w.opt("interpolation", sampler.interpolation.map(|i| i.name()));
            w.put("output", sampler.output);
            w.finish(&sampler.ext)
        })
        .collect();

    let mut w = ObjectWriter::new();
    w.put("channels", channels);
    w.put("samplers", samplers);
    w.opt_str("name", &animation.name);
    w.finish(&animation.ext)
}

fn write_skin(skin: &Skin) -> Value {
    let mut w = ObjectWriter::new();
    w.opt("inverseBindMatrices", skin.inverse_bind_matrices);
    w.opt("skeleton", skin.skeleton);
    w.put(
        "joints",
        skin.joints.iter().map(|&j| Value::from(j)).collect::<Vec<_>>(),
    );
    w.opt_str("name", &skin.name);
    w.finish(&skin.ext)
}

fn write_camera(camera: &Camera) -> Value {
    let mut w = ObjectWriter::new();
    w.put("type", camera.projection.type_name());
    match &camera.projection {
        Projection::Perspective(p) => {
            let mut o = ObjectWriter::new();
            o.opt("aspectRatio", p.aspect_ratio);
            o.put("yfov", p.yfov);
            o.opt("zfar", p.zfar);
            o.put("znear", p.znear);
            w.put("perspective", o.finish(&p.ext));
        }
        Projection::Orthographic(p) => {
            let mut o = ObjectWriter::new();
            o.put("xmag", p.xmag);
            o.put("ymag", p.ymag);
            o.put("zfar", p.zfar);
            o.put("znear", p.znear);
            w.put("orthographic", o.finish(&p.ext));
        }
    }
    w.opt_str("name", &camera.name);
    w.finish(&camera.ext)
}
