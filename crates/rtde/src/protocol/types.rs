// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field types and decoded values.

use crate::error::RtdeError;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

/// RTDE field type, as named in recipes and setup replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Uint8,
    Uint32,
    Uint64,
    Int32,
    Double,
    Vector3d,
    Vector6d,
    Vector6Int32,
    Vector6Uint32,
}

impl FieldType {
    /// Protocol name (`DOUBLE`, `VECTOR6D`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "BOOL",
            Self::Uint8 => "UINT8",
            Self::Uint32 => "UINT32",
            Self::Uint64 => "UINT64",
            Self::Int32 => "INT32",
            Self::Double => "DOUBLE",
            Self::Vector3d => "VECTOR3D",
            Self::Vector6d => "VECTOR6D",
            Self::Vector6Int32 => "VECTOR6INT32",
            Self::Vector6Uint32 => "VECTOR6UINT32",
        }
    }

    /// Number of scalar components (1 for scalars, 3 or 6 for vectors).
    pub fn components(self) -> usize {
        match self {
            Self::Vector3d => 3,
            Self::Vector6d | Self::Vector6Int32 | Self::Vector6Uint32 => 6,
            _ => 1,
        }
    }

    /// Encoded size in bytes.
    pub fn wire_size(self) -> usize {
        match self {
            Self::Bool | Self::Uint8 => 1,
            Self::Uint32 | Self::Int32 => 4,
            Self::Uint64 | Self::Double => 8,
            Self::Vector3d => 3 * 8,
            Self::Vector6d => 6 * 8,
            Self::Vector6Int32 | Self::Vector6Uint32 => 6 * 4,
        }
    }

    /// Whether values of this type can be compared component-wise as `f64`.
    pub fn is_numeric(self) -> bool {
        self != Self::Bool
    }

    /// Decode one value of this type from a big-endian reader.
    pub fn decode<R: Read>(self, r: &mut R) -> io::Result<Value> {
        Ok(match self {
            Self::Bool => Value::Bool(r.read_u8()? != 0),
            Self::Uint8 => Value::Uint8(r.read_u8()?),
            Self::Uint32 => Value::Uint32(r.read_u32::<BigEndian>()?),
            Self::Uint64 => Value::Uint64(r.read_u64::<BigEndian>()?),
            Self::Int32 => Value::Int32(r.read_i32::<BigEndian>()?),
            Self::Double => Value::Double(r.read_f64::<BigEndian>()?),
            Self::Vector3d => {
                let mut v = [0f64; 3];
                r.read_f64_into::<BigEndian>(&mut v)?;
                Value::Vector3d(v)
            }
            Self::Vector6d => {
                let mut v = [0f64; 6];
                r.read_f64_into::<BigEndian>(&mut v)?;
                Value::Vector6d(v)
            }
            Self::Vector6Int32 => {
                let mut v = [0i32; 6];
                r.read_i32_into::<BigEndian>(&mut v)?;
                Value::Vector6Int32(v)
            }
            Self::Vector6Uint32 => {
                let mut v = [0u32; 6];
                r.read_u32_into::<BigEndian>(&mut v)?;
                Value::Vector6Uint32(v)
            }
        })
    }
}

impl FromStr for FieldType {
    type Err = RtdeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "BOOL" => Ok(Self::Bool),
            "UINT8" => Ok(Self::Uint8),
            "UINT32" => Ok(Self::Uint32),
            "UINT64" => Ok(Self::Uint64),
            "INT32" => Ok(Self::Int32),
            "DOUBLE" => Ok(Self::Double),
            "VECTOR3D" => Ok(Self::Vector3d),
            "VECTOR6D" => Ok(Self::Vector6d),
            "VECTOR6INT32" => Ok(Self::Vector6Int32),
            "VECTOR6UINT32" => Ok(Self::Vector6Uint32),
            other => Err(RtdeError::UnknownType(other.to_string())),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Uint8(u8),
    Uint32(u32),
    Uint64(u64),
    Int32(i32),
    Double(f64),
    Vector3d([f64; 3]),
    Vector6d([f64; 6]),
    Vector6Int32([i32; 6]),
    Vector6Uint32([u32; 6]),
}

impl Value {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Bool(_) => FieldType::Bool,
            Self::Uint8(_) => FieldType::Uint8,
            Self::Uint32(_) => FieldType::Uint32,
            Self::Uint64(_) => FieldType::Uint64,
            Self::Int32(_) => FieldType::Int32,
            Self::Double(_) => FieldType::Double,
            Self::Vector3d(_) => FieldType::Vector3d,
            Self::Vector6d(_) => FieldType::Vector6d,
            Self::Vector6Int32(_) => FieldType::Vector6Int32,
            Self::Vector6Uint32(_) => FieldType::Vector6Uint32,
        }
    }

    /// Encode as big-endian wire bytes.
    pub fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Self::Bool(v) => w.write_u8(u8::from(*v)),
            Self::Uint8(v) => w.write_u8(*v),
            Self::Uint32(v) => w.write_u32::<BigEndian>(*v),
            Self::Uint64(v) => w.write_u64::<BigEndian>(*v),
            Self::Int32(v) => w.write_i32::<BigEndian>(*v),
            Self::Double(v) => w.write_f64::<BigEndian>(*v),
            Self::Vector3d(v) => v.iter().try_for_each(|x| w.write_f64::<BigEndian>(*x)),
            Self::Vector6d(v) => v.iter().try_for_each(|x| w.write_f64::<BigEndian>(*x)),
            Self::Vector6Int32(v) => v.iter().try_for_each(|x| w.write_i32::<BigEndian>(*x)),
            Self::Vector6Uint32(v) => v.iter().try_for_each(|x| w.write_u32::<BigEndian>(*x)),
        }
    }

    /// Components as `f64`, or `None` for booleans.
    pub fn to_f64_components(&self) -> Option<Vec<f64>> {
        match self {
            Self::Bool(_) => None,
            Self::Uint8(v) => Some(vec![f64::from(*v)]),
            Self::Uint32(v) => Some(vec![f64::from(*v)]),
            Self::Uint64(v) => Some(vec![*v as f64]),
            Self::Int32(v) => Some(vec![f64::from(*v)]),
            Self::Double(v) => Some(vec![*v]),
            Self::Vector3d(v) => Some(v.to_vec()),
            Self::Vector6d(v) => Some(v.to_vec()),
            Self::Vector6Int32(v) => Some(v.iter().map(|x| f64::from(*x)).collect()),
            Self::Vector6Uint32(v) => Some(v.iter().map(|x| f64::from(*x)).collect()),
        }
    }
}
