// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recipes and decoded samples.
//!
//! A recipe is the ordered list of fields a client subscribes to. The order is
//! fixed once setup succeeds: every data package carries exactly these fields,
//! in this order, with no per-field tags on the wire.

use crate::error::RtdeError;
use crate::protocol::{Command, FieldType, Value};
use std::io::Cursor;
use std::sync::Arc;

/// Ordered (name, type) field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    names: Vec<String>,
    types: Vec<FieldType>,
}

impl Recipe {
    /// Build a recipe from `(name, type)` pairs, keeping their order.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldType)>,
        S: Into<String>,
    {
        let mut names = Vec::new();
        let mut types = Vec::new();
        for (name, ty) in fields {
            names.push(name.into());
            types.push(ty);
        }
        Self { names, types }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn types(&self) -> &[FieldType] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate `(name, type)` pairs in recipe order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.types.iter().copied())
    }

    /// Position of a field by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Encoded size of one data package payload (excluding recipe id).
    pub fn payload_len(&self) -> usize {
        self.types.iter().map(|t| t.wire_size()).sum()
    }

    /// Comma-separated field names, as sent in the setup request.
    pub fn names_csv(&self) -> String {
        self.names.join(",")
    }
}

/// One decoded data package.
///
/// Holds the recipe it was decoded against, the values in recipe order and the
/// raw big-endian payload bytes (without the recipe id).
#[derive(Debug, Clone)]
pub struct Sample {
    recipe: Arc<Recipe>,
    values: Vec<Value>,
    payload: Vec<u8>,
}

impl Sample {
    /// Decode a payload (recipe id already stripped).
    pub fn decode(recipe: Arc<Recipe>, payload: Vec<u8>) -> Result<Self, RtdeError> {
        let expected = recipe.payload_len();
        if payload.len() != expected {
            return Err(RtdeError::malformed(
                Command::DataPackage,
                format!("expected {} payload bytes, got {}", expected, payload.len()),
            ));
        }

        let mut cursor = Cursor::new(&payload[..]);
        let values = recipe
            .types()
            .iter()
            .map(|ty| ty.decode(&mut cursor))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            recipe,
            values,
            payload,
        })
    }

    /// Build a sample from values, encoding the payload.
    pub fn from_values(recipe: Arc<Recipe>, values: Vec<Value>) -> Result<Self, RtdeError> {
        if values.len() != recipe.len()
            || values
                .iter()
                .zip(recipe.types())
                .any(|(v, ty)| v.field_type() != *ty)
        {
            return Err(RtdeError::malformed(
                Command::DataPackage,
                "values do not match recipe",
            ));
        }

        let mut payload = Vec::with_capacity(recipe.payload_len());
        for value in &values {
            value.encode(&mut payload)?;
        }

        Ok(Self {
            recipe,
            values,
            payload,
        })
    }

    pub fn recipe(&self) -> &Arc<Recipe> {
        &self.recipe
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Raw payload bytes as received.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.recipe.index_of(name).map(|i| &self.values[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe() -> Arc<Recipe> {
        Arc::new(Recipe::new([
            ("timestamp", FieldType::Double),
            ("actual_q", FieldType::Vector6d),
            ("robot_mode", FieldType::Int32),
        ]))
    }

    #[test]
    fn test_recipe_layout() {
        let recipe = recipe();
        assert_eq!(recipe.len(), 3);
        assert_eq!(recipe.payload_len(), 8 + 48 + 4);
        assert_eq!(recipe.index_of("actual_q"), Some(1));
        assert_eq!(recipe.index_of("missing"), None);
        assert_eq!(recipe.names_csv(), "timestamp,actual_q,robot_mode");

        let fields: Vec<_> = recipe.fields().collect();
        assert_eq!(fields[2], ("robot_mode", FieldType::Int32));
    }

    #[test]
    fn test_sample_from_values_then_decode() {
        let recipe = recipe();
        let sample = Sample::from_values(
            Arc::clone(&recipe),
            vec![
                Value::Double(12.5),
                Value::Vector6d([0.0, -1.57, 0.0, -1.57, 0.0, 0.0]),
                Value::Int32(7),
            ],
        )
        .expect("sample");

        let decoded = Sample::decode(recipe, sample.payload().to_vec()).expect("decode");
        assert_eq!(decoded.values(), sample.values());
        assert_eq!(decoded.get("robot_mode"), Some(&Value::Int32(7)));
        assert!(decoded.get("speed_scaling").is_none());
    }

    #[test]
    fn test_decode_wrong_length() {
        let err = Sample::decode(recipe(), vec![0u8; 12]).expect_err("short payload");
        assert!(matches!(err, RtdeError::Malformed { .. }));
    }

    #[test]
    fn test_from_values_type_mismatch() {
        let err = Sample::from_values(
            recipe(),
            vec![
                Value::Double(0.0),
                Value::Vector3d([0.0; 3]),
                Value::Int32(0),
            ],
        )
        .expect_err("mismatch");
        assert!(matches!(err, RtdeError::Malformed { .. }));
    }
}
