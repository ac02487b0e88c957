//! Typed element storage handed to collaborators.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array, Int8Array,
    StringArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};

use crate::schema::DataType;

use super::error::StoreError;

/// Flat, row-major values in their stored element type
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValues {
    /// int8
    Int8(Vec<i8>),
    /// int16
    Int16(Vec<i16>),
    /// int32
    Int32(Vec<i32>),
    /// int64
    Int64(Vec<i64>),
    /// uint8
    UInt8(Vec<u8>),
    /// uint16
    UInt16(Vec<u16>),
    /// uint32
    UInt32(Vec<u32>),
    /// uint64
    UInt64(Vec<u64>),
    /// float32
    Float32(Vec<f32>),
    /// float64
    Float64(Vec<f64>),
    /// Single characters as bytes
    Char(Vec<u8>),
    /// Variable-length strings
    Str(Vec<String>),
}

/// Expands one arm per variant holding a `Vec`, binding it to `$v`
macro_rules! each_variant {
    ($value:expr, $v:ident => $body:expr) => {
        match $value {
            TypedValues::Int8($v) => $body,
            TypedValues::Int16($v) => $body,
            TypedValues::Int32($v) => $body,
            TypedValues::Int64($v) => $body,
            TypedValues::UInt8($v) => $body,
            TypedValues::UInt16($v) => $body,
            TypedValues::UInt32($v) => $body,
            TypedValues::UInt64($v) => $body,
            TypedValues::Float32($v) => $body,
            TypedValues::Float64($v) => $body,
            TypedValues::Char($v) => $body,
            TypedValues::Str($v) => $body,
        }
    };
}

impl TypedValues {
    /// Element type of the stored values
    pub fn dtype(&self) -> DataType {
        match self {
            TypedValues::Int8(_) => DataType::Int8,
            TypedValues::Int16(_) => DataType::Int16,
            TypedValues::Int32(_) => DataType::Int32,
            TypedValues::Int64(_) => DataType::Int64,
            TypedValues::UInt8(_) => DataType::UInt8,
            TypedValues::UInt16(_) => DataType::UInt16,
            TypedValues::UInt32(_) => DataType::UInt32,
            TypedValues::UInt64(_) => DataType::UInt64,
            TypedValues::Float32(_) => DataType::Float32,
            TypedValues::Float64(_) => DataType::Float64,
            TypedValues::Char(_) => DataType::Char,
            TypedValues::Str(_) => DataType::Str,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        each_variant!(self, v => v.len())
    }

    /// True when there are no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cast numbers into `dtype` with Rust `as` semantics (truncate, saturate, NaN to 0).
    ///
    /// Returns `None` for `str`.
    pub fn from_f64(dtype: DataType, values: &[f64]) -> Option<Self> {
        macro_rules! cast {
            ($variant:ident, $t:ty) => {
                TypedValues::$variant(values.iter().map(|&x| x as $t).collect())
            };
        }
        Some(match dtype {
            DataType::Int8 => cast!(Int8, i8),
            DataType::Int16 => cast!(Int16, i16),
            DataType::Int32 => cast!(Int32, i32),
            DataType::Int64 => cast!(Int64, i64),
            DataType::UInt8 => cast!(UInt8, u8),
            DataType::UInt16 => cast!(UInt16, u16),
            DataType::UInt32 => cast!(UInt32, u32),
            DataType::UInt64 => cast!(UInt64, u64),
            DataType::Float32 => cast!(Float32, f32),
            DataType::Float64 => cast!(Float64, f64),
            DataType::Char => cast!(Char, u8),
            DataType::Str => return None,
        })
    }

    /// Integers converted into `dtype` without a float round trip.
    ///
    /// Returns `None` for `str`.
    pub fn from_i64(dtype: DataType, values: &[i64]) -> Option<Self> {
        macro_rules! cast {
            ($variant:ident, $t:ty) => {
                TypedValues::$variant(
                    values
                        .iter()
                        .map(|&x| x.clamp(<$t>::MIN as i64, <$t>::MAX as i64) as $t)
                        .collect(),
                )
            };
        }
        Some(match dtype {
            DataType::Int8 => cast!(Int8, i8),
            DataType::Int16 => cast!(Int16, i16),
            DataType::Int32 => cast!(Int32, i32),
            DataType::Int64 => TypedValues::Int64(values.to_vec()),
            DataType::UInt8 => cast!(UInt8, u8),
            DataType::UInt16 => cast!(UInt16, u16),
            DataType::UInt32 => cast!(UInt32, u32),
            DataType::UInt64 => TypedValues::UInt64(values.iter().map(|&x| x.max(0) as u64).collect()),
            DataType::Float32 => TypedValues::Float32(values.iter().map(|&x| x as f32).collect()),
            DataType::Float64 => TypedValues::Float64(values.iter().map(|&x| x as f64).collect()),
            DataType::Char => cast!(Char, u8),
            DataType::Str => return None,
        })
    }

    /// Text into `char` (bytes of all strings, concatenated) or `str`.
    ///
    /// Returns `None` for numeric types.
    pub fn from_text(dtype: DataType, values: &[String]) -> Option<Self> {
        match dtype {
            DataType::Str => Some(TypedValues::Str(values.to_vec())),
            DataType::Char => Some(TypedValues::Char(
                values.iter().flat_map(|s| s.bytes()).collect(),
            )),
            _ => None,
        }
    }

    /// `n` copies of a fill value
    pub fn filled(dtype: DataType, fill: f64, n: usize) -> Self {
        match dtype {
            DataType::Str => TypedValues::Str(vec![String::new(); n]),
            other => TypedValues::from_f64(other, &vec![fill; n])
                .unwrap_or(TypedValues::Float64(vec![fill; n])),
        }
    }

    /// Numeric view widened to `f64`; `char` bytes count as numbers
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        macro_rules! widen {
            ($($variant:ident),*) => {
                match self {
                    $(TypedValues::$variant(v) => Some(v.iter().map(|&x| x as f64).collect()),)*
                    TypedValues::Str(_) => None,
                }
            };
        }
        widen!(Int8, Int16, Int32, Int64, UInt8, UInt16, UInt32, UInt64, Float32, Float64, Char)
    }

    /// Text view: `str` elements, or `char` bytes decoded as one string
    pub fn to_text(&self) -> Option<Vec<String>> {
        match self {
            TypedValues::Str(s) => Some(s.clone()),
            TypedValues::Char(c) => Some(vec![String::from_utf8_lossy(c)
                .trim_end_matches('\0')
                .to_string()]),
            _ => None,
        }
    }

    /// Re-lay values of shape `from` into shape `to`, filling new cells.
    ///
    /// Both shapes must have the same rank; cells outside `to` are dropped.
    pub fn pad(&self, from: &[usize], to: &[usize], fill: f64) -> Self {
        macro_rules! arms {
            ($($variant:ident: $t:ty),*) => {
                match self {
                    $(TypedValues::$variant(v) => {
                        TypedValues::$variant(pad_slice(v, from, to, fill as $t))
                    })*
                    TypedValues::Str(v) => TypedValues::Str(pad_slice(v, from, to, String::new())),
                }
            };
        }
        arms!(Int8: i8, Int16: i16, Int32: i32, Int64: i64, UInt8: u8, UInt16: u16,
              UInt32: u32, UInt64: u64, Float32: f32, Float64: f64, Char: u8)
    }

    /// Write one record of `record_len` elements at `index`, growing with `fill`.
    ///
    /// Fails when the record's element type differs.
    pub(crate) fn put_record(
        &mut self,
        index: usize,
        record_len: usize,
        record: &TypedValues,
        fill: f64,
    ) -> Result<(), TypedValues> {
        fn put<T: Clone>(dst: &mut Vec<T>, index: usize, len: usize, src: &[T], fill: T) {
            let end = (index + 1) * len;
            if dst.len() < end {
                dst.resize(end, fill);
            }
            dst[index * len..end].clone_from_slice(src);
        }

        macro_rules! arms {
            ($($variant:ident: $t:ty),*) => {
                match (self, record) {
                    $((TypedValues::$variant(dst), TypedValues::$variant(src)) => {
                        put(dst, index, record_len, src, fill as $t);
                        Ok(())
                    })*
                    (TypedValues::Str(dst), TypedValues::Str(src)) => {
                        put(dst, index, record_len, src, String::new());
                        Ok(())
                    }
                    (_, other) => Err(other.clone()),
                }
            };
        }
        arms!(Int8: i8, Int16: i16, Int32: i32, Int64: i64, UInt8: u8, UInt16: u16,
              UInt32: u32, UInt64: u64, Float32: f32, Float64: f64, Char: u8)
    }

    /// Arrow column holding these values
    pub(crate) fn to_arrow(&self) -> ArrayRef {
        match self {
            TypedValues::Int8(v) => Arc::new(Int8Array::from(v.clone())),
            TypedValues::Int16(v) => Arc::new(Int16Array::from(v.clone())),
            TypedValues::Int32(v) => Arc::new(Int32Array::from(v.clone())),
            TypedValues::Int64(v) => Arc::new(Int64Array::from(v.clone())),
            TypedValues::UInt8(v) => Arc::new(UInt8Array::from(v.clone())),
            TypedValues::UInt16(v) => Arc::new(UInt16Array::from(v.clone())),
            TypedValues::UInt32(v) => Arc::new(UInt32Array::from(v.clone())),
            TypedValues::UInt64(v) => Arc::new(UInt64Array::from(v.clone())),
            TypedValues::Float32(v) => Arc::new(Float32Array::from(v.clone())),
            TypedValues::Float64(v) => Arc::new(Float64Array::from(v.clone())),
            TypedValues::Char(v) => Arc::new(UInt8Array::from(v.clone())),
            TypedValues::Str(v) => Arc::new(StringArray::from(v.clone())),
        }
    }

    /// Values of `dtype` read back from an Arrow column
    pub(crate) fn from_arrow(dtype: DataType, array: &dyn Array) -> Result<Self, StoreError> {
        macro_rules! read {
            ($variant:ident, $arrow:ty) => {
                array
                    .as_any()
                    .downcast_ref::<$arrow>()
                    .map(|a| TypedValues::$variant(a.values().to_vec()))
            };
        }
        let values = match dtype {
            DataType::Int8 => read!(Int8, Int8Array),
            DataType::Int16 => read!(Int16, Int16Array),
            DataType::Int32 => read!(Int32, Int32Array),
            DataType::Int64 => read!(Int64, Int64Array),
            DataType::UInt8 => read!(UInt8, UInt8Array),
            DataType::UInt16 => read!(UInt16, UInt16Array),
            DataType::UInt32 => read!(UInt32, UInt32Array),
            DataType::UInt64 => read!(UInt64, UInt64Array),
            DataType::Float32 => read!(Float32, Float32Array),
            DataType::Float64 => read!(Float64, Float64Array),
            DataType::Char => read!(Char, UInt8Array),
            DataType::Str => array.as_any().downcast_ref::<StringArray>().map(|a| {
                TypedValues::Str(
                    a.iter()
                        .map(|s| s.unwrap_or_default().to_string())
                        .collect(),
                )
            }),
        };
        values.ok_or_else(|| {
            StoreError::InvalidFormat(format!(
                "column type {} does not match declared {dtype}",
                array.data_type()
            ))
        })
    }
}

/// Values plus the shape they are laid out in
#[derive(Debug, Clone, PartialEq)]
pub struct TypedArray {
    shape: Vec<usize>,
    values: TypedValues,
}

impl TypedArray {
    /// Pair values with a shape; the element count must match
    pub fn new(shape: Vec<usize>, values: TypedValues) -> Result<Self, StoreError> {
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(StoreError::InvalidFormat(format!(
                "shape {shape:?} needs {expected} values, found {}",
                values.len()
            )));
        }
        Ok(Self { shape, values })
    }

    /// An array of `shape` holding only the fill value
    pub fn filled(dtype: DataType, shape: Vec<usize>, fill: f64) -> Self {
        let n = shape.iter().product();
        Self {
            shape,
            values: TypedValues::filled(dtype, fill, n),
        }
    }

    /// Extent along each axis
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Stored values
    pub fn values(&self) -> &TypedValues {
        &self.values
    }

    /// Element type
    pub fn dtype(&self) -> DataType {
        self.values.dtype()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume into shape and values
    pub fn into_parts(self) -> (Vec<usize>, TypedValues) {
        (self.shape, self.values)
    }

    /// Same data laid out in a larger (or equal) shape of the same rank
    pub fn pad_to(&self, shape: &[usize], fill: f64) -> Self {
        if self.shape == shape {
            return self.clone();
        }
        Self {
            shape: shape.to_vec(),
            values: self.values.pad(&self.shape, shape, fill),
        }
    }

    pub(crate) fn shape_mut(&mut self) -> &mut Vec<usize> {
        &mut self.shape
    }

    pub(crate) fn values_mut(&mut self) -> &mut TypedValues {
        &mut self.values
    }
}

fn pad_slice<T: Clone>(src: &[T], from: &[usize], to: &[usize], fill: T) -> Vec<T> {
    let total: usize = to.iter().product();
    let mut out = vec![fill; total];
    if src.is_empty() || total == 0 {
        return out;
    }

    let rank = from.len();
    let mut idx = vec![0usize; rank];
    for value in src {
        if idx.iter().zip(to).all(|(i, n)| i < n) {
            let flat = idx.iter().zip(to).fold(0, |acc, (i, n)| acc * n + i);
            out[flat] = value.clone();
        }
        for d in (0..rank).rev() {
            idx[d] += 1;
            if idx[d] < from[d] {
                break;
            }
            idx[d] = 0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f64_truncates_and_saturates() {
        let v = TypedValues::from_f64(DataType::Int8, &[21.0, -3.7, 300.0, f64::NAN]).unwrap();
        assert_eq!(v, TypedValues::Int8(vec![21, -3, 127, 0]));
        assert!(TypedValues::from_f64(DataType::Str, &[1.0]).is_none());
    }

    #[test]
    fn test_from_i64_saturates() {
        let v = TypedValues::from_i64(DataType::UInt8, &[-5, 7, 1000]).unwrap();
        assert_eq!(v, TypedValues::UInt8(vec![0, 7, 255]));
        let v = TypedValues::from_i64(DataType::UInt64, &[-1, 2]).unwrap();
        assert_eq!(v, TypedValues::UInt64(vec![0, 2]));
    }

    #[test]
    fn test_text_roundtrip_through_char() {
        let v = TypedValues::from_text(DataType::Char, &["abc".to_string()]).unwrap();
        assert_eq!(v.len(), 3);
        assert_eq!(v.to_text(), Some(vec!["abc".to_string()]));
    }

    #[test]
    fn test_pad_grows_leading_and_inner_axes() {
        let a = TypedArray::new(vec![2, 2], TypedValues::Int32(vec![1, 2, 3, 4])).unwrap();
        let padded = a.pad_to(&[3, 3], -1.0);
        assert_eq!(
            padded.values(),
            &TypedValues::Int32(vec![1, 2, -1, 3, 4, -1, -1, -1, -1])
        );
    }

    #[test]
    fn test_put_record_extends() {
        let mut v = TypedValues::Float64(vec![]);
        v.put_record(1, 2, &TypedValues::Float64(vec![5.0, 6.0]), f64::NAN)
            .unwrap();
        assert_eq!(v.len(), 4);
        let f = v.to_f64().unwrap();
        assert!(f[0].is_nan());
        assert_eq!(&f[2..], &[5.0, 6.0]);
        assert!(v
            .put_record(0, 2, &TypedValues::Int8(vec![1, 2]), 0.0)
            .is_err());
    }

    #[test]
    fn test_arrow_roundtrip_for_each_type() {
        for dtype in DataType::ALL {
            let values = match dtype {
                DataType::Str => TypedValues::from_text(dtype, &["a".into(), "bc".into()]),
                _ => TypedValues::from_f64(dtype, &[1.0, 2.0]),
            }
            .unwrap();
            let array = values.to_arrow();
            let back = TypedValues::from_arrow(dtype, array.as_ref()).unwrap();
            assert_eq!(back, values, "{dtype}");
        }
    }

    #[test]
    fn test_new_checks_count() {
        assert!(TypedArray::new(vec![3], TypedValues::Int8(vec![1])).is_err());
    }
}
