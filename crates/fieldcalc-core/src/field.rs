//! Field declarations
//!
//! A field has two names: the display name users type into formulas
//! (e.g. `年龄`) and the source name the data layer uses (e.g. `age`).

use crate::error::{Error, Result};
use crate::value::ValueType;
use ahash::AHashMap;
use std::fmt;
use std::str::FromStr;

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldType {
    Text,
    Number,
    #[cfg_attr(feature = "serde", serde(alias = "date"))]
    DateTime,
}

impl FieldType {
    /// Static type a variable of this field has inside a formula
    pub fn value_type(&self) -> ValueType {
        match self {
            FieldType::Text => ValueType::Text,
            FieldType::Number => ValueType::Number,
            FieldType::DateTime => ValueType::Date,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::DateTime => "datetime",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Ok(FieldType::Text),
            "number" => Ok(FieldType::Number),
            "datetime" | "date" => Ok(FieldType::DateTime),
            _ => Err(Error::UnknownFieldType(s.to_string())),
        }
    }
}

/// A single field declaration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FieldDescriptor {
    /// Name used in user-facing formulas
    pub display_name: String,
    /// Name used by the data source
    pub source_name: String,
    /// Declared type
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub field_type: FieldType,
}

impl FieldDescriptor {
    pub fn new(
        display_name: impl Into<String>,
        source_name: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            source_name: source_name.into(),
            field_type,
        }
    }
}

/// An ordered set of field declarations with unique names on both sides
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: Vec<FieldDescriptor>,
    by_display: AHashMap<String, usize>,
    by_source: AHashMap<String, usize>,
}

impl FieldCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, rejecting duplicate or malformed names
    pub fn from_fields<I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = FieldDescriptor>,
    {
        let mut catalog = Self::new();
        for field in fields {
            catalog.add(field)?;
        }
        Ok(catalog)
    }

    /// Add a field declaration
    pub fn add(&mut self, field: FieldDescriptor) -> Result<()> {
        validate_name(&field.display_name)?;
        validate_name(&field.source_name)?;
        if self.by_display.contains_key(&field.display_name) {
            return Err(Error::DuplicateDisplayName(field.display_name));
        }
        if self.by_source.contains_key(&field.source_name) {
            return Err(Error::DuplicateSourceName(field.source_name));
        }

        let index = self.fields.len();
        self.by_display.insert(field.display_name.clone(), index);
        self.by_source.insert(field.source_name.clone(), index);
        self.fields.push(field);
        Ok(())
    }

    /// Look up a field by its display name
    pub fn by_display_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_display.get(name).map(|&i| &self.fields[i])
    }

    /// Look up a field by its source name
    pub fn by_source_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_source.get(name).map(|&i| &self.fields[i])
    }

    /// Look up a field by either name, display name first
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_display_name(name)
            .or_else(|| self.by_source_name(name))
    }

    /// Map variable names to their declarations, skipping unknown names
    pub fn resolve<'a, I, S>(&'a self, names: I) -> Vec<&'a FieldDescriptor>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| self.get(name.as_ref()))
            .collect()
    }

    /// Iterate over declarations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldCatalog {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// A field name must be non-empty, contain no whitespace, quotes, commas or
/// parentheses, and must not start with a digit
fn validate_name(name: &str) -> Result<()> {
    let valid = match name.chars().next() {
        None => false,
        Some(first) if first.is_ascii_digit() => false,
        Some(_) => name
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | ',' | '"' | '\'')),
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidFieldName(name.to_string()))
    }
}
