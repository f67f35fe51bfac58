// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! XML recipe configuration.
//!
//! ```xml
//! <?xml version="1.0"?>
//! <rtde_config>
//!     <recipe key="out">
//!         <field name="timestamp" type="DOUBLE"/>
//!         <field name="actual_q" type="VECTOR6D"/>
//!     </recipe>
//! </rtde_config>
//! ```

use crate::protocol::FieldType;
use crate::recipe::Recipe;
use roxmltree::{Document, Node};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Recipe configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Recipe '{0}' not found")]
    RecipeNotFound(String),

    #[error("<{element}> is missing the '{attribute}' attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Field '{field}' has unknown type '{type_name}'")]
    UnknownType { field: String, type_name: String },

    #[error("Recipe '{0}' has no fields")]
    EmptyRecipe(String),
}

/// Parsed recipe file.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    recipes: Vec<(String, Recipe)>,
}

impl ConfigFile {
    /// Load and parse a recipe file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&xml)?;
        log::debug!(
            "[config] loaded {} recipe(s) from {}",
            config.recipes.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse recipe XML.
    pub fn parse(xml: &str) -> Result<Self, ConfigError> {
        let doc = Document::parse(xml)?;

        let recipes = doc
            .root_element()
            .children()
            .filter(|n| n.has_tag_name("recipe"))
            .map(Self::parse_recipe)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { recipes })
    }

    fn parse_recipe(node: Node) -> Result<(String, Recipe), ConfigError> {
        let key = node
            .attribute("key")
            .ok_or(ConfigError::MissingAttribute {
                element: "recipe",
                attribute: "key",
            })?
            .to_string();

        let mut fields = Vec::new();
        for field in node.children().filter(|n| n.has_tag_name("field")) {
            let name = field.attribute("name").ok_or(ConfigError::MissingAttribute {
                element: "field",
                attribute: "name",
            })?;
            let type_name = field.attribute("type").ok_or(ConfigError::MissingAttribute {
                element: "field",
                attribute: "type",
            })?;
            let ty: FieldType = type_name.parse().map_err(|_| ConfigError::UnknownType {
                field: name.to_string(),
                type_name: type_name.to_string(),
            })?;
            fields.push((name.to_string(), ty));
        }

        if fields.is_empty() {
            return Err(ConfigError::EmptyRecipe(key));
        }

        Ok((key, Recipe::new(fields)))
    }

    /// Resolve a recipe by key.
    pub fn get_recipe(&self, key: &str) -> Result<Recipe, ConfigError> {
        self.recipes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, recipe)| recipe.clone())
            .ok_or_else(|| ConfigError::RecipeNotFound(key.to_string()))
    }

    /// Recipe keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.recipes.iter().map(|(k, _)| k.as_str())
    }
}
