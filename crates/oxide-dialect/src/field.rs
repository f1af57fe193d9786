//! Declared field descriptors and introspected column metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of logical field types a model can declare.
///
/// Unknown names are kept in [`LogicalType::Other`] and map to the dialect's
/// default column type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogicalType {
    Boolean,
    Byte,
    Number,
    Float,
    Counter,
    Currency,
    Decimal,
    Date,
    DateTime,
    Time,
    Long,
    Duration,
    Integer,
    Url,
    Text,
    Note,
    Image,
    Binary,
    Guid,
    Short,
    /// Any other type name.
    Other(String),
}

impl LogicalType {
    /// Returns the name used in model definitions.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Number => "Number",
            Self::Float => "Float",
            Self::Counter => "Counter",
            Self::Currency => "Currency",
            Self::Decimal => "Decimal",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
            Self::Time => "Time",
            Self::Long => "Long",
            Self::Duration => "Duration",
            Self::Integer => "Integer",
            Self::Url => "URL",
            Self::Text => "Text",
            Self::Note => "Note",
            Self::Image => "Image",
            Self::Binary => "Binary",
            Self::Guid => "Guid",
            Self::Short => "Short",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for LogicalType {
    fn from(name: &str) -> Self {
        match name {
            "Boolean" => Self::Boolean,
            "Byte" => Self::Byte,
            "Number" => Self::Number,
            "Float" => Self::Float,
            "Counter" => Self::Counter,
            "Currency" => Self::Currency,
            "Decimal" => Self::Decimal,
            "Date" => Self::Date,
            "DateTime" => Self::DateTime,
            "Time" => Self::Time,
            "Long" => Self::Long,
            "Duration" => Self::Duration,
            "Integer" => Self::Integer,
            "URL" => Self::Url,
            "Text" => Self::Text,
            "Note" => Self::Note,
            "Image" => Self::Image,
            "Binary" => Self::Binary,
            "Guid" => Self::Guid,
            "Short" => Self::Short,
            other => Self::Other(String::from(other)),
        }
    }
}

impl From<String> for LogicalType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<LogicalType> for String {
    fn from(ty: LogicalType) -> Self {
        match ty {
            LogicalType::Other(name) => name,
            known => String::from(known.as_str()),
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes one column's intended shape.
///
/// `nullable` is tri-state: `None` means "not specified" and renders as
/// nullable. Fields flagged `one_to_many` model application-level relations
/// and never produce columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Column name.
    pub name: String,
    /// Logical type.
    #[serde(rename = "type")]
    pub logical_type: LogicalType,
    /// Size (text length, numeric precision).
    #[serde(default)]
    pub size: Option<u32>,
    /// Numeric scale.
    #[serde(default)]
    pub scale: Option<u32>,
    /// Numeric precision.
    #[serde(default)]
    pub precision: Option<u32>,
    /// Whether the field is part of the primary key.
    #[serde(default)]
    pub primary: bool,
    /// Declared nullability.
    #[serde(default)]
    pub nullable: Option<bool>,
    /// Whether the field is a one-to-many relation.
    #[serde(default)]
    pub one_to_many: bool,
}

impl FieldDescriptor {
    /// Creates a nullable, non-primary field.
    #[must_use]
    pub fn new(name: impl Into<String>, logical_type: impl Into<LogicalType>) -> Self {
        Self {
            name: name.into(),
            logical_type: logical_type.into(),
            size: None,
            scale: None,
            precision: None,
            primary: false,
            nullable: None,
            one_to_many: false,
        }
    }

    /// Sets the size.
    #[must_use]
    pub const fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the scale.
    #[must_use]
    pub const fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Sets the precision.
    #[must_use]
    pub const fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Marks the field as part of the primary key.
    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Sets the declared nullability.
    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Marks the field as a one-to-many relation.
    #[must_use]
    pub const fn one_to_many(mut self) -> Self {
        self.one_to_many = true;
        self
    }

    /// Returns true if the field is a relation and has no column.
    #[must_use]
    pub const fn is_relation(&self) -> bool {
        self.one_to_many
    }

    /// Returns whether the column accepts NULL.
    #[must_use]
    pub fn accepts_null(&self) -> bool {
        !self.primary && self.nullable != Some(false)
    }
}

/// The introspected shape of an existing column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,
    /// Native type name as reported by the catalog.
    pub data_type: String,
    /// Position in the table.
    pub ordinal: Option<i64>,
    /// Length in characters or bytes.
    pub size: Option<i64>,
    /// Numeric scale.
    pub scale: Option<i64>,
    /// Numeric precision.
    pub precision: Option<i64>,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Whether the column belongs to the primary key.
    pub primary: bool,
}
