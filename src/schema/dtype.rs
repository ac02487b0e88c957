//! Element types supported by variables and coordinate dimensions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Element type of a variable.
///
/// The spelling accepted by [`DataType::from_str`] covers numpy-style codes
/// (`f4`, `i2`, `u1`, ...) and the long names used by netCDF tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit unsigned integer
    UInt32,
    /// 64-bit unsigned integer
    UInt64,
    /// IEEE 754 single precision
    Float32,
    /// IEEE 754 double precision
    Float64,
    /// Single character
    Char,
    /// Variable length string
    Str,
}

/// Error returned when a type name is not in the supported enumeration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported data type '{0}'")]
pub struct UnknownDataType(pub String);

impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dtype = match s.trim() {
            "i1" | "int8" | "b" | "byte" => DataType::Int8,
            "i2" | "int16" | "h" | "short" => DataType::Int16,
            "i4" | "int32" | "i" | "int" => DataType::Int32,
            "i8" | "int64" | "l" | "q" | "long" => DataType::Int64,
            "u1" | "uint8" | "B" | "ubyte" => DataType::UInt8,
            "u2" | "uint16" | "H" | "ushort" => DataType::UInt16,
            "u4" | "uint32" | "I" | "uint" => DataType::UInt32,
            "u8" | "uint64" | "L" | "Q" => DataType::UInt64,
            "f4" | "float32" | "f" | "float" | "real" => DataType::Float32,
            "f8" | "float64" | "d" | "double" => DataType::Float64,
            "c" | "S1" | "char" => DataType::Char,
            "str" | "string" | "U" => DataType::Str,
            other => return Err(UnknownDataType(other.to_string())),
        };
        Ok(dtype)
    }
}

impl DataType {
    /// Every supported type, in declaration order
    pub const ALL: [DataType; 12] = [
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::UInt8,
        DataType::UInt16,
        DataType::UInt32,
        DataType::UInt64,
        DataType::Float32,
        DataType::Float64,
        DataType::Char,
        DataType::Str,
    ];

    /// True for the signed and unsigned integer types
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
        )
    }

    /// True for `float32` and `float64`
    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// True for numeric (integer or float) types
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// True for `char` and `str`
    pub fn is_text(&self) -> bool {
        matches!(self, DataType::Char | DataType::Str)
    }

    /// Storage width in bits (text types report 8)
    pub fn bit_width(&self) -> u32 {
        match self {
            DataType::Int8 | DataType::UInt8 | DataType::Char | DataType::Str => 8,
            DataType::Int16 | DataType::UInt16 => 16,
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => 32,
            DataType::Int64 | DataType::UInt64 | DataType::Float64 => 64,
        }
    }

    /// Name used by CDL (`ncdump`) output
    pub fn cdl_name(&self) -> &'static str {
        match self {
            DataType::Int8 => "byte",
            DataType::Int16 => "short",
            DataType::Int32 => "int",
            DataType::Int64 => "int64",
            DataType::UInt8 => "ubyte",
            DataType::UInt16 => "ushort",
            DataType::UInt32 => "uint",
            DataType::UInt64 => "uint64",
            DataType::Float32 => "float",
            DataType::Float64 => "double",
            DataType::Char => "char",
            DataType::Str => "string",
        }
    }

    /// Default fill value for numeric types, matching netCDF's `NC_FILL_*`
    pub fn default_fill(&self) -> Option<f64> {
        match self {
            DataType::Int8 => Some(-127.0),
            DataType::Int16 => Some(-32767.0),
            DataType::Int32 => Some(-2147483647.0),
            DataType::Int64 => Some(-9223372036854775806.0),
            DataType::UInt8 => Some(255.0),
            DataType::UInt16 => Some(65535.0),
            DataType::UInt32 => Some(4294967295.0),
            DataType::UInt64 => Some(18446744073709551614.0),
            DataType::Float32 | DataType::Float64 => Some(9.969_209_968_386_869e36),
            DataType::Char | DataType::Str => None,
        }
    }

    /// Round-trip a float through this type, as a typed attribute would be stored.
    ///
    /// Integer conversions truncate toward zero and saturate at the type bounds.
    pub fn cast_f64(&self, value: f64) -> f64 {
        match self {
            DataType::Int8 => value as i8 as f64,
            DataType::Int16 => value as i16 as f64,
            DataType::Int32 => value as i32 as f64,
            DataType::Int64 => value as i64 as f64,
            DataType::UInt8 => value as u8 as f64,
            DataType::UInt16 => value as u16 as f64,
            DataType::UInt32 => value as u32 as f64,
            DataType::UInt64 => value as u64 as f64,
            DataType::Float32 => value as f32 as f64,
            DataType::Float64 | DataType::Char | DataType::Str => value,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::UInt64 => "uint64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Char => "char",
            DataType::Str => "str",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numpy_codes() {
        assert_eq!("f4".parse::<DataType>().unwrap(), DataType::Float32);
        assert_eq!("f8".parse::<DataType>().unwrap(), DataType::Float64);
        assert_eq!("i1".parse::<DataType>().unwrap(), DataType::Int8);
        assert_eq!("u2".parse::<DataType>().unwrap(), DataType::UInt16);
        assert_eq!("S1".parse::<DataType>().unwrap(), DataType::Char);
        assert_eq!("str".parse::<DataType>().unwrap(), DataType::Str);
    }

    #[test]
    fn test_display_parses_back() {
        for dtype in DataType::ALL {
            assert_eq!(dtype.to_string().parse::<DataType>().unwrap(), dtype);
        }
    }

    #[test]
    fn test_unknown_type() {
        let err = "complex128".parse::<DataType>().unwrap_err();
        assert_eq!(err.0, "complex128");
    }

    #[test]
    fn test_cast_truncates_and_saturates() {
        assert_eq!(DataType::Int8.cast_f64(3.7), 3.0);
        assert_eq!(DataType::Int8.cast_f64(-300.0), -128.0);
        assert_eq!(DataType::UInt8.cast_f64(-1.0), 0.0);
        assert_eq!(DataType::Float32.cast_f64(0.1), 0.1f32 as f64);
    }

    #[test]
    fn test_classification() {
        assert!(DataType::UInt32.is_integer());
        assert!(!DataType::Float32.is_integer());
        assert!(DataType::Float64.is_numeric());
        assert!(DataType::Char.is_text());
        assert_eq!(DataType::Int16.bit_width(), 16);
    }
}
