//! Conversion of bound data into stored values.

use crate::data::{NdArray, Values};
use crate::schema::constants::UNCOERCED_ATTRIBUTES;
use crate::schema::{AttributeValue, DataType, PackingSpec, StorageOptions};
use crate::store::{TypedArray, TypedValues};

use super::error::CompileError;

/// How one variable's data is stored
#[derive(Debug, Clone, Copy)]
pub(crate) struct Encoding<'a> {
    pub(crate) dtype: DataType,
    pub(crate) storage: &'a StorageOptions,
    pub(crate) packing: Option<&'a PackingSpec>,
}

impl Encoding<'_> {
    /// Value stored for NaN input, if any
    fn missing_value(&self) -> Option<f64> {
        self.storage.fill_value.or_else(|| {
            if self.dtype.is_integer() {
                self.dtype.default_fill()
            } else {
                None
            }
        })
    }

    /// Convert `array` into the stored representation of this variable.
    ///
    /// Numeric data is packed (`round((x - add_offset) / scale_factor)`) or
    /// quantized to `least_significant_digit`, then cast. NaN becomes the
    /// fill value. `char` text gains a trailing axis of the longest string's
    /// byte length.
    pub(crate) fn encode(&self, variable: &str, array: &NdArray) -> Result<TypedArray, CompileError> {
        let (shape, values) = match array.values() {
            Values::Text(texts) => self.encode_text(variable, array.shape(), texts)?,
            Values::Int(ints) if self.packing.is_none() && self.dtype.is_integer() => {
                let values = TypedValues::from_i64(self.dtype, ints)
                    .ok_or_else(|| CompileError::data(variable, "integer data for str"))?;
                (array.shape().to_vec(), values)
            }
            numeric => {
                let mut raw = numeric.to_f64().unwrap_or_default();
                self.encode_numbers(&mut raw);
                let values = TypedValues::from_f64(self.dtype, &raw).ok_or_else(|| {
                    CompileError::data(
                        variable,
                        format!("{} data for a {} variable", numeric.kind(), self.dtype),
                    )
                })?;
                (array.shape().to_vec(), values)
            }
        };
        TypedArray::new(shape, values).map_err(|e| CompileError::data(variable, e.to_string()))
    }

    fn encode_numbers(&self, raw: &mut [f64]) {
        let missing = self.missing_value();
        let lsd = self
            .storage
            .least_significant_digit
            .filter(|_| self.dtype.is_float());
        for x in raw.iter_mut() {
            if x.is_nan() {
                if let Some(fill) = missing {
                    *x = fill;
                }
            } else if let Some(packing) = self.packing {
                *x = packing.pack(*x);
            } else if let Some(digits) = lsd {
                *x = quantize(*x, digits);
            }
        }
    }

    fn encode_text(
        &self,
        variable: &str,
        shape: &[usize],
        texts: &[String],
    ) -> Result<(Vec<usize>, TypedValues), CompileError> {
        match self.dtype {
            DataType::Str => Ok((shape.to_vec(), TypedValues::Str(texts.to_vec()))),
            DataType::Char => {
                let width = texts.iter().map(|s| s.len()).max().unwrap_or(0);
                let mut bytes = Vec::with_capacity(width * texts.len());
                for text in texts {
                    bytes.extend_from_slice(text.as_bytes());
                    bytes.resize(bytes.len() + width - text.len(), 0);
                }
                let mut shape = shape.to_vec();
                shape.push(width);
                Ok((shape, TypedValues::Char(bytes)))
            }
            other => Err(CompileError::data(
                variable,
                format!("text data for a {other} variable"),
            )),
        }
    }
}

/// Keep `digits` decimal digits of precision by rounding to a power-of-two grid.
pub(crate) fn quantize(x: f64, digits: i32) -> f64 {
    let bits = 10f64.powi(digits).log2().ceil();
    let scale = 2f64.powf(bits);
    (x * scale).round() / scale
}

/// Attribute value as written on a variable of `dtype`.
///
/// Packing attributes and `actual_range` keep their written type; other
/// numeric values take the variable's type.
pub(crate) fn coerce_attribute(
    name: &str,
    value: &AttributeValue,
    dtype: Option<DataType>,
) -> AttributeValue {
    match dtype {
        Some(dtype) if !UNCOERCED_ATTRIBUTES.contains(&name) => value.coerce_to(dtype),
        _ => value.clone(),
    }
}
