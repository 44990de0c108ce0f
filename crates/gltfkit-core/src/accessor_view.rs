//! Typed element access over accessor bytes.
//!
//! [`AccessorView`] resolves an accessor to its byte region once, checking
//! every layout rule, and then unpacks elements through the component codec
//! table. Sparse overrides are looked up in a sorted, de-duplicated table so
//! the dense array is never materialised.

use crate::component::{checked_layout, AccessorType, ElementLayout, Overflow};
use crate::error::{LayoutError, ReferenceError, Result, TypeError};
use crate::model::{Accessor, Model, Sparse};

/// A byte range inside one buffer.
#[derive(Debug, Clone, Copy)]
struct Region<'a> {
    buffer: usize,
    start: usize,
    bytes: &'a [u8],
}

#[derive(Debug)]
struct SparseTable<'a> {
    /// `(element index, slot in values)`, sorted by element, one entry per element.
    entries: Vec<(usize, usize)>,
    values: Region<'a>,
    unordered: bool,
}

impl SparseTable<'_> {
    fn slot(&self, element: usize) -> Option<usize> {
        self.entries
            .binary_search_by_key(&element, |&(e, _)| e)
            .ok()
            .map(|pos| self.entries[pos].1)
    }
}

/// Read-only view of one accessor.
#[derive(Debug)]
pub struct AccessorView<'a> {
    accessor: &'a Accessor,
    index: usize,
    layout: ElementLayout,
    stride: usize,
    base: Option<Region<'a>>,
    sparse: Option<SparseTable<'a>>,
}

fn path(index: usize) -> String {
    format!("accessor[{}]", index)
}

/// Resolves `bufferView` bytes, checking the view lies inside its buffer.
fn view_region<'a>(
    model: &'a Model,
    view_index: usize,
    field: String,
) -> Result<(Region<'a>, Option<usize>)> {
    let view = model
        .buffer_views
        .get(view_index)
        .ok_or_else(|| ReferenceError::DanglingReference {
            field,
            index: view_index,
            len: model.buffer_views.len(),
        })?;
    let view_path = format!("bufferView[{}]", view_index);
    let buffer = model
        .buffers
        .get(view.buffer)
        .ok_or_else(|| ReferenceError::DanglingReference {
            field: format!("{}.buffer", view_path),
            index: view.buffer,
            len: model.buffers.len(),
        })?;
    let bytes = view
        .byte_offset
        .checked_add(view.byte_length)
        .and_then(|end| buffer.data.get(view.byte_offset..end))
        .ok_or_else(|| LayoutError::BufferViewOutOfBounds {
            path: view_path,
            offset: view.byte_offset,
            length: view.byte_length,
            buffer_len: buffer.data.len(),
        })?;
    Ok((
        Region {
            buffer: view.buffer,
            start: view.byte_offset,
            bytes,
        },
        view.byte_stride,
    ))
}

/// Narrows `region` to `offset..offset + required`.
fn sub_region<'a>(
    region: Region<'a>,
    offset: usize,
    required: Option<usize>,
    path: String,
) -> Result<Region<'a>> {
    let bytes = required
        .and_then(|len| offset.checked_add(len))
        .and_then(|end| region.bytes.get(offset..end))
        .ok_or_else(|| LayoutError::AccessorOutOfBounds {
            path,
            required: required
                .and_then(|len| len.checked_add(offset))
                .unwrap_or(usize::MAX),
            available: region.bytes.len(),
        })?;
    Ok(Region {
        buffer: region.buffer,
        start: region.start + offset,
        bytes,
    })
}

impl<'a> AccessorView<'a> {
    /// Resolves accessor `index` of `model`, validating its layout.
    pub fn new(model: &'a Model, index: usize) -> Result<Self> {
        let accessor = model
            .accessors
            .get(index)
            .ok_or_else(|| ReferenceError::DanglingReference {
                field: "accessor".to_string(),
                index,
                len: model.accessors.len(),
            })?;
        let layout = checked_layout(
            accessor.component_type,
            accessor.accessor_type,
            accessor.normalized,
        )
        .map_err(|reason| TypeError::InvalidAccessorType {
            path: path(index),
            reason,
        })?;

        let mut stride = layout.size;
        let base = match accessor.buffer_view {
            Some(view_index) => {
                let (region, byte_stride) =
                    view_region(model, view_index, format!("{}.bufferView", path(index)))?;
                if let Some(s) = byte_stride {
                    if s < layout.size {
                        return Err(LayoutError::InvalidByteStride {
                            path: format!("bufferView[{}]", view_index),
                            stride: s,
                            reason: format!(
                                "smaller than the {}-byte element of {}",
                                layout.size,
                                path(index)
                            ),
                        }
                        .into());
                    }
                    stride = s;
                }
                let required = match accessor.count {
                    0 => Some(0),
                    n => stride
                        .checked_mul(n - 1)
                        .and_then(|v| v.checked_add(layout.size)),
                };
                Some(sub_region(region, accessor.byte_offset, required, path(index))?)
            }
            None => None,
        };

        let sparse = match &accessor.sparse {
            Some(sparse) => Some(Self::sparse_table(model, index, accessor, sparse, &layout)?),
            None => None,
        };

        Ok(Self {
            accessor,
            index,
            layout,
            stride,
            base,
            sparse,
        })
    }

    fn sparse_table(
        model: &'a Model,
        index: usize,
        accessor: &Accessor,
        sparse: &Sparse,
        layout: &ElementLayout,
    ) -> Result<SparseTable<'a>> {
        let sparse_path = format!("{}.sparse", path(index));
        let index_type = sparse.indices.component_type;
        if !index_type.is_unsigned_integer() {
            return Err(TypeError::InvalidAccessorType {
                path: format!("{}.indices", sparse_path),
                reason: format!("sparse indices must be unsigned, got {}", index_type),
            }
            .into());
        }

        let (region, _) = view_region(
            model,
            sparse.indices.buffer_view,
            format!("{}.indices.bufferView", sparse_path),
        )?;
        let indices = sub_region(
            region,
            sparse.indices.byte_offset,
            sparse.count.checked_mul(index_type.size()),
            format!("{}.indices", sparse_path),
        )?;

        let (region, _) = view_region(
            model,
            sparse.values.buffer_view,
            format!("{}.values.bufferView", sparse_path),
        )?;
        let values = sub_region(
            region,
            sparse.values.byte_offset,
            sparse.count.checked_mul(layout.size),
            format!("{}.values", sparse_path),
        )?;

        let codec = index_type.codec();
        let mut entries = Vec::with_capacity(sparse.count);
        let mut unordered = false;
        for slot in 0..sparse.count {
            let element = codec.decode(&indices.bytes[slot * index_type.size()..], false) as usize;
            if element >= accessor.count {
                return Err(LayoutError::SparseIndexOutOfRange {
                    path: format!("{}.indices", sparse_path),
                    index: element,
                    count: accessor.count,
                }
                .into());
            }
            if let Some(&(prev, _)) = entries.last() {
                if element <= prev {
                    unordered = true;
                }
            }
            entries.push((element, slot));
        }

        if unordered {
            // Stable sort keeps later slots after earlier ones for equal elements.
            entries.sort_by_key(|&(e, _)| e);
            let mut deduped: Vec<(usize, usize)> = Vec::with_capacity(entries.len());
            for entry in entries {
                match deduped.last_mut() {
                    Some(last) if last.0 == entry.0 => *last = entry,
                    _ => deduped.push(entry),
                }
            }
            entries = deduped;
        }

        Ok(SparseTable {
            entries,
            values,
            unordered,
        })
    }

    pub fn accessor(&self) -> &'a Accessor {
        self.accessor
    }

    pub fn len(&self) -> usize {
        self.accessor.count
    }

    pub fn is_empty(&self) -> bool {
        self.accessor.count == 0
    }

    pub fn element_layout(&self) -> ElementLayout {
        self.layout
    }

    /// Effective stride in bytes between consecutive base elements.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// True when sparse indices were not strictly increasing.
    pub fn sparse_unordered(&self) -> bool {
        self.sparse.as_ref().map_or(false, |s| s.unordered)
    }

    /// Distinct elements overridden by sparse values.
    pub fn sparse_overrides(&self) -> usize {
        self.sparse.as_ref().map_or(0, |s| s.entries.len())
    }

    fn check_index(&self, i: usize) -> Result<()> {
        if i >= self.accessor.count {
            return Err(LayoutError::IndexOutOfRange {
                index: i,
                count: self.accessor.count,
            }
            .into());
        }
        Ok(())
    }

    /// Bytes of element `i`, or `None` for a zero-filled virtual base.
    fn element_bytes(&self, i: usize) -> Option<&'a [u8]> {
        let size = self.layout.size;
        if let Some(sparse) = &self.sparse {
            if let Some(slot) = sparse.slot(i) {
                return Some(&sparse.values.bytes[slot * size..(slot + 1) * size]);
            }
        }
        self.base
            .map(|base| &base.bytes[i * self.stride..i * self.stride + size])
    }

    /// Where element `i` is stored as `(buffer, byte offset)`.
    fn element_location(&self, i: usize) -> Result<(usize, usize)> {
        self.check_index(i)?;
        if let Some(sparse) = &self.sparse {
            if let Some(slot) = sparse.slot(i) {
                let values = sparse.values;
                return Ok((values.buffer, values.start + slot * self.layout.size));
            }
        }
        match self.base {
            Some(base) => Ok((base.buffer, base.start + i * self.stride)),
            None => Err(LayoutError::NoBackingStorage {
                path: path(self.index),
            }
            .into()),
        }
    }

    fn decode_element(&self, i: usize, out: &mut [f64]) {
        match self.element_bytes(i) {
            Some(bytes) => {
                let codec = self.layout.component_type.codec();
                for (k, o) in out.iter_mut().enumerate() {
                    let offset = self.layout.component_offset(k);
                    *o = codec.decode(&bytes[offset..], self.accessor.normalized);
                }
            }
            None => out.fill(0.0),
        }
    }

    /// Reads element `i` into `out`, which must hold one slot per component.
    pub fn read_into(&self, i: usize, out: &mut [f64]) -> Result<()> {
        self.check_index(i)?;
        assert_eq!(
            out.len(),
            self.layout.num_components(),
            "output slice length must match the accessor's component count"
        );
        self.decode_element(i, out);
        Ok(())
    }

    /// Reads element `i` as one `f64` per component.
    pub fn read(&self, i: usize) -> Result<Vec<f64>> {
        let mut out = vec![0.0; self.layout.num_components()];
        self.read_into(i, &mut out)?;
        Ok(out)
    }

    /// Reads element `i` of a SCALAR unsigned-integer accessor.
    pub fn read_index(&self, i: usize) -> Result<u32> {
        let ct = self.layout.component_type;
        if self.layout.accessor_type != AccessorType::Scalar || !ct.is_unsigned_integer() {
            return Err(TypeError::NotAnIndexAccessor(format!(
                "{} is {} {}",
                path(self.index),
                self.layout.accessor_type,
                ct
            ))
            .into());
        }
        self.check_index(i)?;
        Ok(match self.element_bytes(i) {
            Some(bytes) => ct.codec().decode(bytes, false) as u32,
            None => 0,
        })
    }

    /// Iterates over all elements.
    pub fn iter(&self) -> impl Iterator<Item = Vec<f64>> + '_ {
        (0..self.accessor.count).map(move |i| {
            let mut out = vec![0.0; self.layout.num_components()];
            self.decode_element(i, &mut out);
            out
        })
    }

    /// Per-component minimum and maximum over all elements, after sparse
    /// substitution. `None` for an empty accessor.
    ///
    /// Without a buffer view only the sparse entries are visited, so the cost
    /// does not depend on `count`.
    pub fn bounds(&self) -> Option<(Vec<f64>, Vec<f64>)> {
        if self.is_empty() {
            return None;
        }
        let n = self.layout.num_components();
        let mut min = vec![f64::INFINITY; n];
        let mut max = vec![f64::NEG_INFINITY; n];
        let mut element = vec![0.0; n];
        let mut widen = |element: &[f64]| {
            for k in 0..n {
                min[k] = min[k].min(element[k]);
                max[k] = max[k].max(element[k]);
            }
        };

        if self.base.is_some() {
            for i in 0..self.accessor.count {
                self.decode_element(i, &mut element);
                widen(&element[..]);
            }
        } else {
            if self.sparse_overrides() < self.accessor.count {
                widen(&element[..]);
            }
            if let Some(sparse) = &self.sparse {
                for &(i, _) in &sparse.entries {
                    self.decode_element(i, &mut element);
                    widen(&element[..]);
                }
            }
        }
        Some((min, max))
    }
}

/// Write access to the elements of one accessor.
///
/// Every [`write`](Self::write) re-resolves the accessor, so changes made to
/// the model between writes are re-checked.
pub struct AccessorViewMut<'a> {
    model: &'a mut Model,
    index: usize,
}

impl<'a> AccessorViewMut<'a> {
    pub fn new(model: &'a mut Model, index: usize) -> Result<Self> {
        AccessorView::new(&*model, index)?;
        Ok(Self { model, index })
    }

    /// Borrows a read-only view of the same accessor.
    pub fn view(&self) -> Result<AccessorView<'_>> {
        AccessorView::new(&*self.model, self.index)
    }

    /// Packs `values` into element `i`.
    ///
    /// An element overridden by sparse data is written into the sparse values.
    /// On error nothing is written.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` differs from the component count.
    pub fn write(&mut self, i: usize, values: &[f64], overflow: Overflow) -> Result<()> {
        let (buffer, start, layout, normalized) = {
            let view = AccessorView::new(&*self.model, self.index)?;
            let (buffer, start) = view.element_location(i)?;
            (buffer, start, view.layout, view.accessor.normalized)
        };
        assert_eq!(
            values.len(),
            layout.num_components(),
            "value count must match the accessor's component count"
        );

        let codec = layout.component_type.codec();
        let data = &mut self.model.buffers[buffer].data;
        let mut packed = data[start..start + layout.size].to_vec();
        for (k, &value) in values.iter().enumerate() {
            codec.encode(
                value,
                normalized,
                overflow,
                &mut packed[layout.component_offset(k)..],
            )?;
        }
        data[start..start + layout.size].copy_from_slice(&packed);
        Ok(())
    }
}
