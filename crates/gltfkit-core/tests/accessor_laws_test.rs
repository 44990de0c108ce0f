//! Property tests for accessor layout and sparse substitution.

use std::collections::BTreeMap;

use proptest::prelude::*;

use gltfkit_core::{
    Accessor, AccessorType, AccessorView, Buffer, BufferSource, BufferView, ComponentType,
    ElementLayout, GltfError, LayoutError, Model, Sparse, SparseIndices, SparseValues,
};

fn component_type() -> impl Strategy<Value = ComponentType> {
    prop::sample::select(ComponentType::ALL.to_vec())
}

fn accessor_type() -> impl Strategy<Value = AccessorType> {
    prop::sample::select(AccessorType::ALL.to_vec())
}

/// Builds a single-accessor model whose view sits between `pad` bytes of 0xFF.
fn strided_model(
    ct: ComponentType,
    ty: AccessorType,
    count: usize,
    stride: Option<usize>,
    pad: usize,
) -> Model {
    let layout = ElementLayout::new(ct, ty);
    let effective = stride.unwrap_or(layout.size);
    let view_len = effective * (count - 1) + layout.size;

    let mut data = vec![0xFF; pad];
    data.extend(std::iter::repeat(0u8).take(view_len));
    data.extend(std::iter::repeat(0xFFu8).take(pad));

    let mut model = Model::new();
    model.push_buffer(Buffer::new(BufferSource::BinaryChunk, data));
    let mut view = BufferView::new(0, pad, view_len);
    view.byte_stride = stride;
    model.push_buffer_view(view);
    model.push_accessor(Accessor::new(Some(0), ct, ty, count));
    model
}

proptest! {
    /// Without byteStride the stride is the element size; with it, the stride
    /// is exactly byteStride and never smaller than the packed size.
    #[test]
    fn stride_law(
        ct in component_type(),
        ty in accessor_type(),
        count in 1usize..8,
        extra in prop::option::of(0usize..16),
    ) {
        let layout = ElementLayout::new(ct, ty);
        let stride = extra.map(|e| ((layout.size + 3) & !3) + e * 4).filter(|s| *s <= 252);
        let model = strided_model(ct, ty, count, stride, 0);
        let view = AccessorView::new(&model, 0).unwrap();

        match stride {
            Some(s) => prop_assert_eq!(view.stride(), s),
            None => prop_assert_eq!(view.stride(), layout.size),
        }
        prop_assert!(view.stride() >= layout.packed_size());
        if !ty.is_matrix() {
            prop_assert_eq!(layout.size, ct.size() * ty.num_components());
        }
    }

    /// Reads past `count` fail; reads inside never touch bytes outside the view.
    #[test]
    fn bounds_law(
        ct in component_type(),
        ty in accessor_type(),
        count in 1usize..6,
        gap in prop::option::of(0usize..4),
        past in 0usize..10,
    ) {
        let layout = ElementLayout::new(ct, ty);
        let stride = gap.map(|g| ((layout.size + 3) & !3) + g * 4);
        let model = strided_model(ct, ty, count, stride, 16);
        let view = AccessorView::new(&model, 0).unwrap();

        for i in 0..count {
            // Only the zeroed view region may be observed.
            prop_assert!(view.read(i).unwrap().iter().all(|v| *v == 0.0));
        }
        let bad = count + past;
        prop_assert!(
            matches!(
                view.read(bad),
                Err(GltfError::Layout(LayoutError::IndexOutOfRange { .. }))
            ),
            "read({}) should be out of range", bad
        );
    }

    /// Sparse-indexed elements read the override; others read the base.
    #[test]
    fn sparse_patch_law(
        count in 1usize..48,
        overrides in prop::collection::btree_map(0usize..48, -1.0e6f32..1.0e6, 1..12),
    ) {
        let overrides: BTreeMap<usize, f32> =
            overrides.into_iter().filter(|(i, _)| *i < count).collect();
        prop_assume!(!overrides.is_empty());

        let mut data: Vec<u8> = (0..count).flat_map(|i| (i as f32).to_le_bytes()).collect();
        let base_len = data.len();
        let indices_offset = data.len();
        data.extend(overrides.keys().flat_map(|&i| (i as u16).to_le_bytes()));
        let values_offset = data.len();
        data.extend(overrides.values().flat_map(|v| v.to_le_bytes()));

        let mut model = Model::new();
        model.push_buffer(Buffer::new(BufferSource::BinaryChunk, data));
        model.push_buffer_view(BufferView::new(0, 0, base_len));
        model.push_buffer_view(BufferView::new(0, indices_offset, overrides.len() * 2));
        model.push_buffer_view(BufferView::new(0, values_offset, overrides.len() * 4));
        let mut accessor = Accessor::new(Some(0), ComponentType::Float, AccessorType::Scalar, count);
        accessor.sparse = Some(Sparse {
            count: overrides.len(),
            indices: SparseIndices {
                buffer_view: 1,
                byte_offset: 0,
                component_type: ComponentType::UnsignedShort,
                ext: Default::default(),
            },
            values: SparseValues {
                buffer_view: 2,
                byte_offset: 0,
                ext: Default::default(),
            },
            ext: Default::default(),
        });
        model.push_accessor(accessor);

        let view = AccessorView::new(&model, 0).unwrap();
        prop_assert!(!view.sparse_unordered());
        for i in 0..count {
            let expected = overrides.get(&i).map_or(i as f64, |v| *v as f64);
            prop_assert_eq!(view.read(i).unwrap(), vec![expected]);
        }
    }
}

#[test]
fn test_scenario_sparse_over_zero_base() {
    // 4-element base of zeros, element 2 overridden
    let mut data = vec![0u8; 16];
    data.push(2);
    data.extend_from_slice(&[0, 0, 0]);
    data.extend_from_slice(&42.0f32.to_le_bytes());

    let mut model = Model::new();
    model.push_buffer(Buffer::new(BufferSource::BinaryChunk, data));
    model.push_buffer_view(BufferView::new(0, 0, 16));
    model.push_buffer_view(BufferView::new(0, 16, 1));
    model.push_buffer_view(BufferView::new(0, 20, 4));
    let mut accessor = Accessor::new(Some(0), ComponentType::Float, AccessorType::Scalar, 4);
    accessor.sparse = Some(Sparse {
        count: 1,
        indices: SparseIndices {
            buffer_view: 1,
            byte_offset: 0,
            component_type: ComponentType::UnsignedByte,
            ext: Default::default(),
        },
        values: SparseValues {
            buffer_view: 2,
            byte_offset: 0,
            ext: Default::default(),
        },
        ext: Default::default(),
    });
    model.push_accessor(accessor);

    let view = AccessorView::new(&model, 0).unwrap();
    assert_eq!(view.read(2).unwrap(), vec![42.0]);
    for i in [0, 1, 3] {
        assert_eq!(view.read(i).unwrap(), vec![0.0]);
    }
}
