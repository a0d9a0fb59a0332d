//! Protobuf type mapping
//!
//! Maps proto field kinds to semantic kinds and SQL column types. The
//! mapping fails open: anything without an explicit mapping becomes
//! `{string, TEXT}`.

use crate::model::{ColumnType, FieldKind};
use prost_reflect::Kind;

/// Result of mapping a proto field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    /// Semantic kind
    pub kind: FieldKind,
    /// SQL column type
    pub column_type: ColumnType,
}

/// Map a proto field kind, taking the `_id` foreign key convention into account
pub fn map_proto_type(kind: &Kind, field_name: &str) -> MappedType {
    MappedType {
        kind: field_kind(kind),
        column_type: column_type(kind, field_name),
    }
}

/// Semantic kind of a proto field
pub fn field_kind(kind: &Kind) -> FieldKind {
    match kind {
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => FieldKind::Int64,
        Kind::String => FieldKind::String,
        Kind::Bool => FieldKind::Bool,
        Kind::Double => FieldKind::Float64,
        Kind::Message(message) => FieldKind::Reference(message.name().to_string()),
        _ => FieldKind::String,
    }
}

/// SQL column type of a proto field
///
/// Fields named `*_id` are foreign keys and always map to BIGINT.
pub fn column_type(kind: &Kind, field_name: &str) -> ColumnType {
    if field_name.ends_with("_id") {
        return ColumnType::BigInt;
    }

    match kind {
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 | Kind::Uint32 | Kind::Fixed32 => {
            ColumnType::Integer
        }
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 | Kind::Uint64 | Kind::Fixed64 => {
            ColumnType::BigInt
        }
        Kind::Bool => ColumnType::Boolean,
        Kind::String => ColumnType::Text,
        Kind::Bytes => ColumnType::Bytea,
        Kind::Float => ColumnType::Real,
        Kind::Double => ColumnType::DoublePrecision,
        Kind::Message(_) | Kind::Enum(_) => ColumnType::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_mapping() {
        assert_eq!(
            map_proto_type(&Kind::Int64, "count"),
            MappedType {
                kind: FieldKind::Int64,
                column_type: ColumnType::BigInt
            }
        );
        assert_eq!(
            map_proto_type(&Kind::Double, "latitude"),
            MappedType {
                kind: FieldKind::Float64,
                column_type: ColumnType::DoublePrecision
            }
        );
        assert_eq!(
            map_proto_type(&Kind::Bool, "active"),
            MappedType {
                kind: FieldKind::Bool,
                column_type: ColumnType::Boolean
            }
        );
    }

    #[test]
    fn test_unmapped_kinds_fall_back_to_string() {
        assert_eq!(field_kind(&Kind::Int32), FieldKind::String);
        assert_eq!(field_kind(&Kind::Float), FieldKind::String);
        assert_eq!(field_kind(&Kind::Bytes), FieldKind::String);
        assert_eq!(field_kind(&Kind::Uint64), FieldKind::String);
    }

    #[test]
    fn test_column_types_keep_storage_width() {
        assert_eq!(column_type(&Kind::Int32, "age"), ColumnType::Integer);
        assert_eq!(column_type(&Kind::Float, "ratio"), ColumnType::Real);
        assert_eq!(column_type(&Kind::Bytes, "avatar"), ColumnType::Bytea);
        assert_eq!(column_type(&Kind::String, "name"), ColumnType::Text);
    }

    #[test]
    fn test_id_suffix_forces_bigint() {
        assert_eq!(column_type(&Kind::String, "courier_id"), ColumnType::BigInt);
        assert_eq!(column_type(&Kind::Bool, "flag_id"), ColumnType::BigInt);
        assert_eq!(column_type(&Kind::Bytes, "blob_id"), ColumnType::BigInt);
        // The semantic kind is left alone.
        assert_eq!(
            map_proto_type(&Kind::String, "courier_id").kind,
            FieldKind::String
        );
    }
}
