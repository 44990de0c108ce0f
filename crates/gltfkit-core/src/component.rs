//! Accessor component types and the numeric codec table.
//!
//! Every storage type is one row of [`CODECS`]: its byte size, a reader
//! widening one little-endian component to `f64`, and a writer narrowing an
//! `f64` back to storage. [`AccessorView`](crate::accessor_view::AccessorView),
//! the decoder and the encoder all dispatch through this table, so adding a
//! storage type is a table entry.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use num_traits::{Bounded, NumCast};

use crate::error::TypeError;

/// glTF accessor component types.
///
/// The discriminants are the GL enum values used in the JSON `componentType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ComponentType {
    /// 8-bit signed integer
    Byte = 5120,
    /// 8-bit unsigned integer
    UnsignedByte = 5121,
    /// 16-bit signed integer
    Short = 5122,
    /// 16-bit unsigned integer
    UnsignedShort = 5123,
    /// 32-bit signed integer
    Int = 5124,
    /// 32-bit unsigned integer
    UnsignedInt = 5125,
    /// 32-bit floating point number
    Float = 5126,
    /// 64-bit floating point number
    Double = 5127,
}

impl ComponentType {
    pub const ALL: [ComponentType; 8] = [
        ComponentType::Byte,
        ComponentType::UnsignedByte,
        ComponentType::Short,
        ComponentType::UnsignedShort,
        ComponentType::Int,
        ComponentType::UnsignedInt,
        ComponentType::Float,
        ComponentType::Double,
    ];

    /// Parses a JSON `componentType` code.
    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() as u64 == code)
    }

    /// Returns the GL enum value.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Returns the size of one component in bytes.
    pub const fn size(self) -> usize {
        match self {
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort => 2,
            ComponentType::Int | ComponentType::UnsignedInt | ComponentType::Float => 4,
            ComponentType::Double => 8,
        }
    }

    /// Returns the name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            ComponentType::Byte => "BYTE",
            ComponentType::UnsignedByte => "UNSIGNED_BYTE",
            ComponentType::Short => "SHORT",
            ComponentType::UnsignedShort => "UNSIGNED_SHORT",
            ComponentType::Int => "INT",
            ComponentType::UnsignedInt => "UNSIGNED_INT",
            ComponentType::Float => "FLOAT",
            ComponentType::Double => "DOUBLE",
        }
    }

    pub const fn is_floating_point(self) -> bool {
        matches!(self, ComponentType::Float | ComponentType::Double)
    }

    pub const fn is_signed_integer(self) -> bool {
        matches!(
            self,
            ComponentType::Byte | ComponentType::Short | ComponentType::Int
        )
    }

    pub const fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            ComponentType::UnsignedByte | ComponentType::UnsignedShort | ComponentType::UnsignedInt
        )
    }

    /// Only 8- and 16-bit integers may carry the `normalized` flag.
    pub const fn is_normalizable(self) -> bool {
        matches!(
            self,
            ComponentType::Byte
                | ComponentType::UnsignedByte
                | ComponentType::Short
                | ComponentType::UnsignedShort
        )
    }

    /// Returns the codec row for this type.
    pub fn codec(self) -> &'static ComponentCodec {
        let row = match self {
            ComponentType::Byte => 0,
            ComponentType::UnsignedByte => 1,
            ComponentType::Short => 2,
            ComponentType::UnsignedShort => 3,
            ComponentType::Int => 4,
            ComponentType::UnsignedInt => 5,
            ComponentType::Float => 6,
            ComponentType::Double => 7,
        };
        &CODECS[row]
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// glTF accessor element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AccessorType {
    pub const ALL: [AccessorType; 7] = [
        AccessorType::Scalar,
        AccessorType::Vec2,
        AccessorType::Vec3,
        AccessorType::Vec4,
        AccessorType::Mat2,
        AccessorType::Mat3,
        AccessorType::Mat4,
    ];

    /// Parses the JSON `type` string.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            AccessorType::Scalar => "SCALAR",
            AccessorType::Vec2 => "VEC2",
            AccessorType::Vec3 => "VEC3",
            AccessorType::Vec4 => "VEC4",
            AccessorType::Mat2 => "MAT2",
            AccessorType::Mat3 => "MAT3",
            AccessorType::Mat4 => "MAT4",
        }
    }

    /// Number of components per element.
    pub const fn num_components(self) -> usize {
        match self {
            AccessorType::Scalar => 1,
            AccessorType::Vec2 => 2,
            AccessorType::Vec3 => 3,
            AccessorType::Vec4 | AccessorType::Mat2 => 4,
            AccessorType::Mat3 => 9,
            AccessorType::Mat4 => 16,
        }
    }

    /// Number of matrix columns (1 for scalars and vectors).
    pub const fn columns(self) -> usize {
        match self {
            AccessorType::Mat2 => 2,
            AccessorType::Mat3 => 3,
            AccessorType::Mat4 => 4,
            _ => 1,
        }
    }

    pub const fn is_matrix(self) -> bool {
        matches!(
            self,
            AccessorType::Mat2 | AccessorType::Mat3 | AccessorType::Mat4
        )
    }
}

impl fmt::Display for AccessorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Behaviour of [`ComponentCodec::encode`] when a value does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    /// Fail with [`TypeError::NarrowingOverflow`].
    #[default]
    Error,
    /// Saturate to the nearest representable value.
    Clamp,
}

/// One row of the component codec table.
pub struct ComponentCodec {
    pub component: ComponentType,
    /// Largest magnitude of the integer type, used by normalization (0 for floats).
    pub norm_max: f64,
    read: fn(&[u8]) -> f64,
    write: fn(f64, Overflow, &mut [u8]) -> Result<(), TypeError>,
}

impl ComponentCodec {
    /// Reads one component from the front of `bytes`.
    ///
    /// `bytes` must hold at least `component.size()` bytes.
    pub fn decode(&self, bytes: &[u8], normalized: bool) -> f64 {
        let raw = (self.read)(bytes);
        if normalized && self.norm_max > 0.0 {
            if self.component.is_signed_integer() {
                (raw / self.norm_max).max(-1.0)
            } else {
                raw / self.norm_max
            }
        } else {
            raw
        }
    }

    /// Writes one component to the front of `out`.
    pub fn encode(
        &self,
        value: f64,
        normalized: bool,
        overflow: Overflow,
        out: &mut [u8],
    ) -> Result<(), TypeError> {
        let value = if normalized && self.norm_max > 0.0 {
            value * self.norm_max
        } else {
            value
        };
        (self.write)(value, overflow, out)
    }
}

static CODECS: [ComponentCodec; 8] = [
    ComponentCodec {
        component: ComponentType::Byte,
        norm_max: i8::MAX as f64,
        read: |b| b[0] as i8 as f64,
        write: |v, o, out| {
            out[0] = narrow::<i8>(v, o, "BYTE")? as u8;
            Ok(())
        },
    },
    ComponentCodec {
        component: ComponentType::UnsignedByte,
        norm_max: u8::MAX as f64,
        read: |b| b[0] as f64,
        write: |v, o, out| {
            out[0] = narrow::<u8>(v, o, "UNSIGNED_BYTE")?;
            Ok(())
        },
    },
    ComponentCodec {
        component: ComponentType::Short,
        norm_max: i16::MAX as f64,
        read: |b| LittleEndian::read_i16(b) as f64,
        write: |v, o, out| {
            LittleEndian::write_i16(out, narrow::<i16>(v, o, "SHORT")?);
            Ok(())
        },
    },
    ComponentCodec {
        component: ComponentType::UnsignedShort,
        norm_max: u16::MAX as f64,
        read: |b| LittleEndian::read_u16(b) as f64,
        write: |v, o, out| {
            LittleEndian::write_u16(out, narrow::<u16>(v, o, "UNSIGNED_SHORT")?);
            Ok(())
        },
    },
    ComponentCodec {
        component: ComponentType::Int,
        norm_max: 0.0,
        read: |b| LittleEndian::read_i32(b) as f64,
        write: |v, o, out| {
            LittleEndian::write_i32(out, narrow::<i32>(v, o, "INT")?);
            Ok(())
        },
    },
    ComponentCodec {
        component: ComponentType::UnsignedInt,
        norm_max: 0.0,
        read: |b| LittleEndian::read_u32(b) as f64,
        write: |v, o, out| {
            LittleEndian::write_u32(out, narrow::<u32>(v, o, "UNSIGNED_INT")?);
            Ok(())
        },
    },
    ComponentCodec {
        component: ComponentType::Float,
        norm_max: 0.0,
        read: |b| LittleEndian::read_f32(b) as f64,
        write: |v, o, out| {
            LittleEndian::write_f32(out, narrow_f32(v, o)?);
            Ok(())
        },
    },
    ComponentCodec {
        component: ComponentType::Double,
        norm_max: 0.0,
        read: LittleEndian::read_f64,
        write: |v, _, out| {
            LittleEndian::write_f64(out, v);
            Ok(())
        },
    },
];

fn narrow<T: NumCast + Bounded>(
    value: f64,
    overflow: Overflow,
    component: &'static str,
) -> Result<T, TypeError> {
    let rounded = value.round();
    if let Some(v) = <T as NumCast>::from(rounded) {
        return Ok(v);
    }
    match overflow {
        Overflow::Clamp if !value.is_nan() => Ok(if rounded < 0.0 {
            T::min_value()
        } else {
            T::max_value()
        }),
        _ => Err(TypeError::NarrowingOverflow {
            value: value.to_string(),
            component,
        }),
    }
}

fn narrow_f32(value: f64, overflow: Overflow) -> Result<f32, TypeError> {
    if !value.is_finite() || value.abs() <= f32::MAX as f64 {
        return Ok(value as f32);
    }
    match overflow {
        Overflow::Clamp => Ok(if value < 0.0 { f32::MIN } else { f32::MAX }),
        Overflow::Error => Err(TypeError::NarrowingOverflow {
            value: value.to_string(),
            component: "FLOAT",
        }),
    }
}

/// Byte layout of one accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementLayout {
    pub component_type: ComponentType,
    pub accessor_type: AccessorType,
    /// Bytes between consecutive matrix columns (the element size for non-matrices).
    pub column_stride: usize,
    /// Total element size in bytes, including column padding.
    pub size: usize,
}

impl ElementLayout {
    /// Computes the layout, padding matrix columns to 4-byte boundaries.
    pub fn new(component_type: ComponentType, accessor_type: AccessorType) -> Self {
        let columns = accessor_type.columns();
        let rows = accessor_type.num_components() / columns;
        let column_bytes = rows * component_type.size();
        let column_stride = if accessor_type.is_matrix() {
            (column_bytes + 3) & !3
        } else {
            column_bytes
        };
        Self {
            component_type,
            accessor_type,
            column_stride,
            size: column_stride * columns,
        }
    }

    pub fn num_components(&self) -> usize {
        self.accessor_type.num_components()
    }

    /// Size without any column padding.
    pub fn packed_size(&self) -> usize {
        self.num_components() * self.component_type.size()
    }

    /// Byte offset of component `k` within an element.
    pub fn component_offset(&self, k: usize) -> usize {
        let rows = self.num_components() / self.accessor_type.columns();
        (k / rows) * self.column_stride + (k % rows) * self.component_type.size()
    }
}

/// Checks that a component type, element type and normalized flag form a
/// permitted accessor description and returns its layout.
pub fn checked_layout(
    component_type: ComponentType,
    accessor_type: AccessorType,
    normalized: bool,
) -> Result<ElementLayout, String> {
    if normalized && !component_type.is_normalizable() {
        return Err(format!(
            "{} components cannot be normalized",
            component_type
        ));
    }
    Ok(ElementLayout::new(component_type, accessor_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_codes() {
        assert_eq!(ComponentType::from_code(5121), Some(ComponentType::UnsignedByte));
        assert_eq!(ComponentType::from_code(5127), Some(ComponentType::Double));
        assert_eq!(ComponentType::from_code(5119), None);
        assert_eq!(ComponentType::Float.code(), 5126);
        for c in ComponentType::ALL {
            assert_eq!(c.codec().component, c);
        }
    }

    #[test]
    fn test_accessor_type_names() {
        assert_eq!(AccessorType::from_name("MAT3"), Some(AccessorType::Mat3));
        assert_eq!(AccessorType::from_name("vec3"), None);
        let counts: Vec<usize> = AccessorType::ALL.iter().map(|t| t.num_components()).collect();
        assert_eq!(counts, [1, 2, 3, 4, 4, 9, 16]);
    }

    #[test]
    fn test_matrix_column_padding() {
        assert_eq!(ElementLayout::new(ComponentType::UnsignedByte, AccessorType::Mat2).size, 8);
        assert_eq!(ElementLayout::new(ComponentType::UnsignedByte, AccessorType::Mat3).size, 12);
        assert_eq!(ElementLayout::new(ComponentType::Short, AccessorType::Mat3).size, 24);
        assert_eq!(ElementLayout::new(ComponentType::Short, AccessorType::Mat2).size, 8);
        assert_eq!(ElementLayout::new(ComponentType::Float, AccessorType::Mat4).size, 64);
        assert_eq!(ElementLayout::new(ComponentType::Float, AccessorType::Vec3).size, 12);

        let layout = ElementLayout::new(ComponentType::UnsignedByte, AccessorType::Mat3);
        assert_eq!(layout.component_offset(2), 2);
        assert_eq!(layout.component_offset(3), 4);
        assert_eq!(layout.component_offset(8), 10);
    }

    #[test]
    fn test_normalized_decode() {
        let codec = ComponentType::Byte.codec();
        assert_eq!(codec.decode(&[0x7F], true), 1.0);
        assert_eq!(codec.decode(&[0x80], true), -1.0);
        assert_eq!(codec.decode(&[0x80], false), -128.0);

        let codec = ComponentType::UnsignedShort.codec();
        assert_eq!(codec.decode(&65535u16.to_le_bytes(), true), 1.0);
        assert_eq!(codec.decode(&0u16.to_le_bytes(), true), 0.0);
    }

    #[test]
    fn test_narrowing_overflow() {
        let codec = ComponentType::UnsignedByte.codec();
        let mut out = [0u8; 1];
        assert!(codec.encode(255.0, false, Overflow::Error, &mut out).is_ok());
        assert_eq!(out[0], 255);
        assert!(matches!(
            codec.encode(256.0, false, Overflow::Error, &mut out),
            Err(TypeError::NarrowingOverflow { .. })
        ));
        codec.encode(256.0, false, Overflow::Clamp, &mut out).unwrap();
        assert_eq!(out[0], 255);
        codec.encode(-3.0, false, Overflow::Clamp, &mut out).unwrap();
        assert_eq!(out[0], 0);
        assert!(codec.encode(f64::NAN, false, Overflow::Clamp, &mut out).is_err());
    }

    #[test]
    fn test_normalized_encode() {
        let codec = ComponentType::Short.codec();
        let mut out = [0u8; 2];
        codec.encode(-1.0, true, Overflow::Error, &mut out).unwrap();
        assert_eq!(i16::from_le_bytes(out), -32767);
        assert!(codec.encode(1.5, true, Overflow::Error, &mut out).is_err());
    }

    #[test]
    fn test_float_narrowing() {
        let codec = ComponentType::Float.codec();
        let mut out = [0u8; 4];
        codec.encode(0.5, false, Overflow::Error, &mut out).unwrap();
        assert_eq!(f32::from_le_bytes(out), 0.5);
        assert!(codec.encode(1e300, false, Overflow::Error, &mut out).is_err());
        codec.encode(-1e300, false, Overflow::Clamp, &mut out).unwrap();
        assert_eq!(f32::from_le_bytes(out), f32::MIN);
    }

    #[test]
    fn test_checked_layout() {
        assert!(checked_layout(ComponentType::Float, AccessorType::Vec3, true).is_err());
        assert!(checked_layout(ComponentType::UnsignedInt, AccessorType::Scalar, true).is_err());
        assert!(checked_layout(ComponentType::UnsignedByte, AccessorType::Vec4, true).is_ok());
    }
}
