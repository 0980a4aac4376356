//! WebAssembly value representation

use crate::module::ValueType;
use fhex::ToHex;
use std::fmt;

/// Runtime representation of WebAssembly values
///
/// The type tag is observable: binary and comparison operations require
/// both operands to carry the same tag, and memory stores accept only a
/// value whose tag matches the opcode's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    /// Get the WebAssembly type of this value
    pub fn typ(&self) -> ValueType {
        match self {
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
        }
    }

    /// The zero value of the given type, used for local and result slots
    pub fn default_for(typ: ValueType) -> Self {
        match typ {
            ValueType::I32 => Value::I32(0),
            ValueType::I64 => Value::I64(0),
            ValueType::F32 => Value::F32(0.0),
            ValueType::F64 => Value::F64(0.0),
        }
    }

    /// Convert to i32, returning None if wrong type
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to i64, returning None if wrong type
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to f32, returning None if wrong type
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to f64, returning None if wrong type
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "i32:{v}"),
            Value::I64(v) => write!(f, "i64:{v}"),
            Value::F32(v) => write!(f, "f32:{}", v.to_hex()),
            Value::F64(v) => write!(f, "f64:{}", v.to_hex()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type() {
        assert_eq!(Value::I32(42).typ(), ValueType::I32);
        assert_eq!(Value::I64(42).typ(), ValueType::I64);
        assert_eq!(Value::F32(42.0).typ(), ValueType::F32);
        assert_eq!(Value::F64(42.0).typ(), ValueType::F64);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::I32(42).as_i32(), Some(42));
        assert_eq!(Value::I32(42).as_i64(), None);
        assert_eq!(Value::I64(42).as_i64(), Some(42));
        assert_eq!(Value::F32(42.0).as_f32(), Some(42.0));
        assert_eq!(Value::F64(42.0).as_f64(), Some(42.0));
    }

    #[test]
    fn test_default_for() {
        assert_eq!(Value::default_for(ValueType::I32), Value::I32(0));
        assert_eq!(Value::default_for(ValueType::I64), Value::I64(0));
        assert_eq!(Value::default_for(ValueType::F32), Value::F32(0.0));
        assert_eq!(Value::default_for(ValueType::F64), Value::F64(0.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Value::I32(42)), "i32:42");
        assert_eq!(format!("{}", Value::I64(-7)), "i64:-7");
        // fhex renders C-style hex floats, just check the prefix
        assert!(format!("{}", Value::F32(42.0)).starts_with("f32:"));
        assert!(format!("{}", Value::F64(42.0)).starts_with("f64:"));
    }
}
