//! Typed intermediate representation of generated resources
//!
//! Entities and fields are built once by the parser from a descriptor
//! snapshot and are read-only for the rest of the run. No descriptor handle
//! outlives the parser.

use heck::ToSnakeCase;
use std::fmt;

/// Name of the field treated as the table's primary key
pub const PRIMARY_KEY: &str = "id";

/// A persisted resource derived from one top-level proto message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// PascalCase message name, unique within a run
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<Field>,
}

impl Entity {
    /// Create an entity, marking the final field as `is_last`
    pub fn new(name: impl Into<String>, mut fields: Vec<Field>) -> Self {
        let count = fields.len();
        for (idx, field) in fields.iter_mut().enumerate() {
            field.is_last = idx + 1 == count;
        }

        Self {
            name: name.into(),
            fields,
        }
    }

    /// Lower-cased name, used for per-entity directories and modules
    pub fn lower_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// snake_case name, used in migration file names
    pub fn snake_name(&self) -> String {
        self.name.to_snake_case()
    }

    /// SQL table name
    pub fn table_name(&self) -> String {
        format!("{}s", self.snake_name())
    }

    /// Fields stored as regular columns (everything but the primary key)
    pub fn columns(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_primary_key())
    }
}

/// One attribute of an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Declared name, source casing
    pub name: String,
    /// Semantic kind
    pub kind: FieldKind,
    /// lowerCamelCase JSON name
    pub json_name: String,
    /// snake_case column name
    pub db_name: String,
    /// SQL column type
    pub column_type: ColumnType,
    /// True for the final field in declaration order
    pub is_last: bool,
}

impl Field {
    /// Whether this field is the entity's primary key
    ///
    /// Only a field declared exactly as `id` qualifies. Other spellings that
    /// snake_case to `id` (`Id`, `_id`) collide with the key column and are
    /// rejected by the parser.
    pub fn is_primary_key(&self) -> bool {
        self.name == PRIMARY_KEY
    }

    /// The `<prefix>` of a `<prefix>_id` field, if the name follows the
    /// foreign key convention
    pub fn foreign_key_prefix(&self) -> Option<&str> {
        self.name
            .strip_suffix("_id")
            .filter(|prefix| !prefix.is_empty())
    }
}

/// Semantic type of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// 64-bit signed integer
    Int64,
    /// UTF-8 text; also the fallback for unsupported kinds
    String,
    /// Boolean
    Bool,
    /// 64-bit float
    Float64,
    /// Message-typed field, carrying the nested message name
    Reference(String),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Int64 => f.write_str("int64"),
            FieldKind::String => f.write_str("string"),
            FieldKind::Bool => f.write_str("bool"),
            FieldKind::Float64 => f.write_str("float64"),
            FieldKind::Reference(name) => write!(f, "reference({})", name),
        }
    }
}

/// SQL column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// INTEGER
    Integer,
    /// BIGINT
    BigInt,
    /// REAL
    Real,
    /// DOUBLE PRECISION
    DoublePrecision,
    /// BOOLEAN
    Boolean,
    /// TEXT
    Text,
    /// BYTEA
    Bytea,
}

impl ColumnType {
    /// SQL spelling of the type
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Real => "REAL",
            ColumnType::DoublePrecision => "DOUBLE PRECISION",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Text => "TEXT",
            ColumnType::Bytea => "BYTEA",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> Field {
        Field {
            name: name.to_string(),
            kind: FieldKind::String,
            json_name: name.to_string(),
            db_name: name.to_snake_case(),
            column_type: ColumnType::Text,
            is_last: false,
        }
    }

    #[test]
    fn test_new_marks_only_last_field() {
        let entity = Entity::new("Courier", vec![field("name"), field("email"), field("phone")]);
        let flags: Vec<bool> = entity.fields.iter().map(|f| f.is_last).collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn test_new_without_fields() {
        let entity = Entity::new("Empty", Vec::new());
        assert!(entity.fields.is_empty());
    }

    #[test]
    fn test_names() {
        let entity = Entity::new("DeliveryZone", Vec::new());
        assert_eq!(entity.lower_name(), "deliveryzone");
        assert_eq!(entity.snake_name(), "delivery_zone");
        assert_eq!(entity.table_name(), "delivery_zones");
    }

    #[test]
    fn test_columns_skip_primary_key() {
        let entity = Entity::new("Courier", vec![field("id"), field("name")]);
        let names: Vec<&str> = entity.columns().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name"]);
    }

    #[test]
    fn test_only_exact_id_is_primary_key() {
        assert!(field("id").is_primary_key());
        assert!(!field("Id").is_primary_key());
        assert!(!field("_id").is_primary_key());
    }

    #[test]
    fn test_foreign_key_prefix() {
        assert_eq!(field("courier_id").foreign_key_prefix(), Some("courier"));
        assert_eq!(field("_id").foreign_key_prefix(), None);
        assert_eq!(field("courier").foreign_key_prefix(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldKind::Reference("Point".into()).to_string(), "reference(Point)");
        assert_eq!(ColumnType::DoublePrecision.to_string(), "DOUBLE PRECISION");
    }
}
