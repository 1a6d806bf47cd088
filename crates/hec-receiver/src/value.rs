// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Attribute and body values carried by log records.
//!
//! [`Value`] is a closed set of types. Conversion from an untyped source either lands on one
//! of its variants or fails with [`ValueError::UnsupportedType`]; numeric width and sign are
//! never widened or narrowed along the way.

use std::any::Any;
use std::collections::HashMap;

use bytes::Bytes;

use crate::errors::ValueError;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Str(String),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Map(HashMap<String, Value>),
    Array(Vec<Value>),
}

macro_rules! downcast_into {
    ($source:expr, $($ty:ty => $variant:expr),+ $(,)?) => {
        $(
            if let Some(v) = $source.downcast_ref::<$ty>() {
                return Ok($variant(v.clone()));
            }
        )+
    };
}

impl Value {
    /// Converts a dynamically typed value into a [`Value`].
    ///
    /// Any type outside the supported set is an error, never a partial value.
    pub fn from_dynamic(source: &dyn Any) -> Result<Value, ValueError> {
        if source.is::<()>() {
            return Ok(Value::Null);
        }
        downcast_into!(
            source,
            Value => |v: Value| v,
            String => Value::Str,
            &'static str => |s: &str| Value::Str(s.to_string()),
            i8 => Value::I8,
            i16 => Value::I16,
            i32 => Value::I32,
            i64 => Value::I64,
            u8 => Value::U8,
            u16 => Value::U16,
            u32 => Value::U32,
            u64 => Value::U64,
            f32 => Value::F32,
            f64 => Value::F64,
            bool => Value::Bool,
            Vec<u8> => Value::Bytes,
            Bytes => |b: Bytes| Value::Bytes(b.to_vec()),
            HashMap<String, Value> => Value::Map,
            Vec<Value> => Value::Array,
            serde_json::Value => Value::from,
        );
        Err(ValueError::UnsupportedType(
            "value is not a string, number, bool, bytes, map or array",
        ))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Value::I8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Value::I16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Value::U8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Value::U16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::I64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::U64(u)
                } else {
                    // without arbitrary_precision every number is representable as f64
                    Value::F64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
