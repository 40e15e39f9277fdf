//! Schema metadata types for tables, columns, keys, and generators.
//!
//! These are plain snapshots of what the catalog reports. They are built once
//! per export run and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::typemap;

/// Column metadata as reported by the system catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,

    /// Native field type code (`RDB$FIELD_TYPE`).
    pub type_code: i32,

    /// Field subtype; `None` when the catalog stores NULL.
    #[serde(default)]
    pub subtype: Option<i32>,

    /// Storage length in bytes.
    #[serde(default)]
    pub length: i32,

    /// Numeric precision; `None` when the catalog stores NULL.
    #[serde(default)]
    pub precision: Option<i32>,

    /// Native scale, zero or negative (number of decimal places, negated).
    #[serde(default)]
    pub scale: Option<i32>,

    /// Length in characters for character types.
    #[serde(default)]
    pub char_length: Option<i32>,

    /// Whether the column carries a NOT NULL constraint.
    #[serde(default)]
    pub not_null: bool,
}

impl ColumnDescriptor {
    /// Create a descriptor with only a name and a type code.
    pub fn new(name: impl Into<String>, type_code: i32) -> Self {
        Self {
            name: name.into(),
            type_code,
            subtype: None,
            length: 0,
            precision: None,
            scale: None,
            char_length: None,
            not_null: false,
        }
    }

    pub fn with_subtype(mut self, subtype: i32) -> Self {
        self.subtype = Some(subtype);
        self
    }

    pub fn with_length(mut self, length: i32) -> Self {
        self.length = length;
        self
    }

    pub fn with_char_length(mut self, char_length: i32) -> Self {
        self.char_length = Some(char_length);
        self
    }

    pub fn with_numeric(mut self, precision: i32, scale: i32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Canonical SQL type name, recomputed from the native descriptor.
    pub fn canonical_type(&self) -> String {
        typemap::map_type(
            self.type_code,
            self.subtype,
            self.length,
            self.precision,
            self.scale,
            self.char_length,
        )
    }
}

/// Foreign key metadata. Referenced objects are not cross-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,

    /// Local column name.
    pub column: String,

    /// Referenced table name.
    pub ref_table: String,

    /// Referenced column name.
    pub ref_column: String,
}

impl ForeignKey {
    /// `TABLE(COLUMN)` form used in the `references` attribute.
    pub fn references(&self) -> String {
        format!("{}({})", self.ref_table, self.ref_column)
    }
}

/// Named counter maintained by the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generator {
    pub name: String,
    pub value: i64,
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,

    /// Column definitions in declared field-position order.
    pub columns: Vec<ColumnDescriptor>,

    /// Primary key column names.
    #[serde(default)]
    pub primary_key: Vec<String>,

    /// Foreign key constraints in catalog order.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    /// Check whether a column participates in the primary key.
    pub fn is_pk_column(&self, column: &str) -> bool {
        self.primary_key.iter().any(|c| c == column)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}
