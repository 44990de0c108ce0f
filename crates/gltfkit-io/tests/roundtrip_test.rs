//! Encode then decode a populated model through every container.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use proptest::prelude::*;

use gltfkit_core::{
    Accessor, AccessorType, AccessorView, AlphaMode, Animation, AnimationSampler, Buffer,
    BufferSource, BufferView, Camera, Channel, ChannelTarget, ComponentType, Image, ImageSource,
    Interpolation, Material, Mesh, Mode, Model, Node, NormalTextureInfo, PbrMetallicRoughness,
    Perspective, Primitive, Projection, Sampler, Scene, Skin, Sparse, SparseIndices, SparseValues,
    TargetPath, Texture, TextureInfo, Transform, Value, WrapMode, TARGET_ARRAY_BUFFER,
    TARGET_ELEMENT_ARRAY_BUFFER,
};
use gltfkit_io::{
    pack_binary, parse_binary, Decoder, EncodeOptions, Encoder, NoExternalResources, WarningKind,
};

const SPARSE_ACCESSOR: usize = 2;

fn sample_model() -> Model {
    let mut data = Vec::new();
    for index in [0u16, 1, 2] {
        data.extend_from_slice(&index.to_le_bytes());
    }
    data.extend_from_slice(&[0, 0]);
    for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        data.extend_from_slice(&v.to_le_bytes());
    }
    // 44: sparse indices, out of order
    data.extend_from_slice(&[3, 1, 0, 0]);
    // 48: sparse values, then animation times and translations
    for v in [7.5f32, -2.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 3.0, 0.0] {
        data.extend_from_slice(&v.to_le_bytes());
    }
    assert_eq!(data.len(), 88);

    let mut model = Model::new();
    model.asset.generator = Some("gltfkit tests".into());
    model.push_buffer(Buffer::new(BufferSource::BinaryChunk, data));
    let indices_view = model
        .push_buffer_view(BufferView::new(0, 0, 6).with_target(TARGET_ELEMENT_ARRAY_BUFFER));
    let positions_view =
        model.push_buffer_view(BufferView::new(0, 8, 36).with_target(TARGET_ARRAY_BUFFER));
    let image_view = model.push_buffer_view(BufferView::new(0, 8, 12));

    let indices = model.push_accessor(Accessor::new(
        Some(indices_view),
        ComponentType::UnsignedShort,
        AccessorType::Scalar,
        3,
    ));
    let mut positions = Accessor::new(
        Some(positions_view),
        ComponentType::Float,
        AccessorType::Vec3,
        3,
    );
    positions.min = vec![0.0, 0.0, 0.0];
    positions.max = vec![1.0, 1.0, 0.0];
    let positions = model.push_accessor(positions);

    let sparse_indices_view = model.push_buffer_view(BufferView::new(0, 44, 2));
    let sparse_values_view = model.push_buffer_view(BufferView::new(0, 48, 8));
    let mut offsets = Accessor::new(None, ComponentType::Float, AccessorType::Scalar, 4);
    offsets.sparse = Some(Sparse {
        count: 2,
        indices: SparseIndices {
            buffer_view: sparse_indices_view,
            byte_offset: 0,
            component_type: ComponentType::UnsignedByte,
            ext: Default::default(),
        },
        values: SparseValues {
            buffer_view: sparse_values_view,
            byte_offset: 0,
            ext: Default::default(),
        },
        ext: Default::default(),
    });
    assert_eq!(model.push_accessor(offsets), SPARSE_ACCESSOR);

    let times_view = model.push_buffer_view(BufferView::new(0, 56, 8));
    let translations_view = model.push_buffer_view(BufferView::new(0, 64, 24));
    let mut times = Accessor::new(Some(times_view), ComponentType::Float, AccessorType::Scalar, 2);
    times.min = vec![0.0];
    times.max = vec![1.0];
    let times = model.push_accessor(times);
    let translations = model.push_accessor(Accessor::new(
        Some(translations_view),
        ComponentType::Float,
        AccessorType::Vec3,
        2,
    ));
    model.animations.push(Animation {
        name: Some("slide".into()),
        channels: vec![Channel {
            sampler: 0,
            target: ChannelTarget {
                node: Some(0),
                path: TargetPath::Translation,
                ext: Default::default(),
            },
            ext: Default::default(),
        }],
        samplers: vec![AnimationSampler {
            input: times,
            output: translations,
            interpolation: Some(Interpolation::Step),
            ext: Default::default(),
        }],
        ext: Default::default(),
    });

    let mut primitive = Primitive {
        indices: Some(indices),
        material: Some(0),
        mode: Some(Mode::Triangles),
        ..Default::default()
    };
    primitive.attributes.insert("POSITION".into(), positions);
    model.meshes.push(Mesh {
        name: Some("triangle".into()),
        primitives: vec![primitive],
        ..Default::default()
    });

    let mut root = Node {
        name: Some("root".into()),
        children: vec![1],
        mesh: Some(0),
        transform: Transform::Decomposed {
            translation: Some([1.0, 2.5, -3.0]),
            rotation: Some([0.0, 0.0, 0.0, 1.0]),
            scale: None,
        },
        ..Default::default()
    };
    root.ext.extras = Some(Value::from("authored"));
    root.ext.unknown.insert("vendorFlag".into(), Value::Bool(true));
    model.nodes.push(root);

    let mut matrix = Transform::IDENTITY;
    matrix[12] = 4.0;
    model.nodes.push(Node {
        camera: Some(0),
        transform: Transform::Matrix(matrix),
        ..Default::default()
    });
    model.scenes.push(Scene {
        nodes: vec![0],
        ..Default::default()
    });
    model.scene = Some(0);

    model.materials.push(Material {
        pbr_metallic_roughness: Some(PbrMetallicRoughness {
            base_color_factor: Some([1.0, 0.5, 0.25, 1.0]),
            base_color_texture: Some(TextureInfo::new(0)),
            metallic_factor: Some(0.0),
            ..Default::default()
        }),
        normal_texture: Some(NormalTextureInfo {
            index: 0,
            tex_coord: Some(1),
            scale: Some(0.5),
            ext: Default::default(),
        }),
        alpha_mode: Some(AlphaMode::Mask),
        alpha_cutoff: Some(0.25),
        double_sided: Some(true),
        ..Default::default()
    });
    model.textures.push(Texture {
        sampler: Some(0),
        source: Some(0),
        ..Default::default()
    });
    model.images.push(Image {
        source: ImageSource::BufferView(image_view),
        mime_type: Some("image/png".into()),
        ..Default::default()
    });
    model.samplers.push(Sampler {
        wrap_s: Some(WrapMode::MirroredRepeat),
        ..Default::default()
    });
    model.skins.push(Skin {
        joints: vec![1],
        skeleton: Some(0),
        ..Default::default()
    });
    model.cameras.push(Camera {
        name: Some("eye".into()),
        projection: Projection::Perspective(Perspective {
            aspect_ratio: Some(1.5),
            yfov: 0.8,
            zfar: None,
            znear: 0.01,
            ext: Default::default(),
        }),
        ext: Default::default(),
    });
    model.use_extension("EXT_example", false);
    model
}

fn decoder() -> Decoder<NoExternalResources> {
    Decoder::new(NoExternalResources)
}

#[test]
fn test_glb_roundtrip() {
    let model = sample_model();
    let asset = Encoder::new(EncodeOptions::binary().with_strict(true))
        .encode(&model)
        .unwrap();
    let bytes = asset.to_bytes().unwrap();

    let decoded = decoder().decode_slice(&bytes, Path::new(".")).unwrap();
    assert_eq!(decoded.model, model);
}

#[test]
fn test_embedded_text_roundtrip() {
    let mut model = sample_model();
    let asset = Encoder::new(EncodeOptions::new().with_embed_buffers(true).with_pretty(true))
        .encode(&model)
        .unwrap();
    assert!(asset.resources.is_empty());

    let decoded = decoder()
        .decode_slice(asset.json.as_bytes(), Path::new("."))
        .unwrap();
    // Embedding rewrites where the bytes live, nothing else.
    model.buffers[0].source = BufferSource::DataUri;
    assert_eq!(decoded.model, model);
}

#[test]
fn test_external_buffer_roundtrip() {
    let model = sample_model();
    let asset = Encoder::new(EncodeOptions::new().with_buffer_uri_stem("scene"))
        .encode(&model)
        .unwrap();
    assert_eq!(asset.resources.len(), 1);
    assert_eq!(asset.resources[0].uri, "scene0.bin");

    let files: HashMap<String, Vec<u8>> = asset
        .resources
        .iter()
        .map(|r| (r.uri.clone(), r.data.clone()))
        .collect();
    let resolver = move |_: &Path, uri: &str| -> io::Result<Vec<u8>> {
        files
            .get(uri)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, uri.to_string()))
    };
    let decoded = Decoder::new(resolver)
        .decode_slice(asset.json.as_bytes(), Path::new("."))
        .unwrap();

    let mut expected = model;
    expected.buffers[0].source = BufferSource::External("scene0.bin".into());
    assert_eq!(decoded.model, expected);
}

#[test]
fn test_save_and_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let model = sample_model();

    let gltf = dir.path().join("scene.gltf");
    gltfkit_io::save(&model, &gltf, EncodeOptions::new()).unwrap();
    assert!(dir.path().join("buffer0.bin").exists());
    let loaded = gltfkit_io::load(&gltf).unwrap();
    assert_eq!(loaded.model.buffers[0].data, model.buffers[0].data);
    assert_eq!(loaded.model.nodes, model.nodes);

    let glb = dir.path().join("scene.glb");
    gltfkit_io::save(&model, &glb, EncodeOptions::binary()).unwrap();
    let loaded = gltfkit_io::load(&glb).unwrap();
    assert_eq!(loaded.model, model);
}

#[test]
fn test_sparse_and_animation_survive_glb() {
    let model = sample_model();
    let bytes = Encoder::new(EncodeOptions::binary())
        .encode(&model)
        .unwrap()
        .to_bytes()
        .unwrap();
    let decoded = decoder().decode_slice(&bytes, Path::new(".")).unwrap();

    let unordered: Vec<_> = decoded
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::UnorderedSparseIndices)
        .collect();
    assert_eq!(unordered.len(), 1, "{:?}", decoded.warnings);
    assert_eq!(unordered[0].path, "accessor[2].sparse.indices");

    let offsets = AccessorView::new(&decoded.model, SPARSE_ACCESSOR).unwrap();
    let read: Vec<f64> = offsets.iter().map(|e| e[0]).collect();
    assert_eq!(read, vec![0.0, -2.0, 0.0, 7.5]);
    assert_eq!(offsets.bounds(), Some((vec![-2.0], vec![7.5])));

    let animation = &decoded.model.animations[0];
    assert_eq!(animation, &model.animations[0]);
    let sampler = &animation.samplers[0];
    let output = AccessorView::new(&decoded.model, sampler.output).unwrap();
    assert_eq!(output.read(1).unwrap(), vec![0.0, 3.0, 0.0]);
}

#[test]
fn test_glb_with_several_buffers() {
    let mut model = sample_model();
    let mut extra = Vec::new();
    for v in [5.0f32, 6.0] {
        extra.extend_from_slice(&v.to_le_bytes());
    }
    let second = model.push_buffer(Buffer::new(BufferSource::BinaryChunk, extra));
    let view = model.push_buffer_view(BufferView::new(second, 0, 8));
    let weights = model.push_accessor(Accessor::new(
        Some(view),
        ComponentType::Float,
        AccessorType::Scalar,
        2,
    ));

    let asset = Encoder::new(EncodeOptions::binary().with_strict(true))
        .encode(&model)
        .unwrap();
    assert!(asset.resources.is_empty(), "{:?}", asset.resources);
    let decoded = decoder()
        .decode_slice(&asset.to_bytes().unwrap(), Path::new("."))
        .unwrap();

    let positions = AccessorView::new(&decoded.model, 1).unwrap();
    assert_eq!(positions.read(2).unwrap(), vec![0.0, 1.0, 0.0]);
    let read = AccessorView::new(&decoded.model, weights).unwrap();
    assert_eq!(read.read(1).unwrap(), vec![6.0]);

    let mut expected = model;
    expected.buffers[second].source = BufferSource::DataUri;
    assert_eq!(decoded.model, expected);
}

proptest! {
    #[test]
    fn glb_chunks_survive_packing(
        body in "[a-z0-9]{0,40}",
        bin in proptest::option::of(proptest::collection::vec(any::<u8>(), 0..64)),
    ) {
        let json = format!("{{\"k\":\"{}\"}}", body);
        let packed = pack_binary(json.as_bytes(), bin.as_deref()).unwrap();
        prop_assert_eq!(packed.len() % 4, 0);

        let chunks = parse_binary(&packed).unwrap();
        prop_assert_eq!(chunks.json, json.as_bytes());
        match (bin, chunks.bin) {
            (None, None) => {}
            (Some(expected), Some(actual)) => {
                prop_assert!(actual.len() - expected.len() < 4);
                prop_assert_eq!(&actual[..expected.len()], &expected[..]);
                prop_assert!(actual[expected.len()..].iter().all(|&b| b == 0));
            }
            (expected, actual) => prop_assert!(false, "{:?} vs {:?}", expected, actual),
        }
    }
}
