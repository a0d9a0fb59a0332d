//! Column generation for entity fields
//!
//! This module turns [`Field`]s into the Rust identifiers, Rust types and SQL
//! column definitions shared by the model, repository and migration
//! templates.

use crate::model::{ColumnType, Entity, Field, FieldKind};
use heck::ToSnakeCase;
use once_cell::sync::Lazy;
use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};
use std::collections::HashSet;

/// Keywords that need a raw identifier in generated code
static RUST_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
        "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
        "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
        "where", "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override",
        "priv", "try", "typeof", "unsized", "virtual", "yield",
    ]
    .into_iter()
    .collect()
});

/// Keywords that cannot be raw identifiers
const RESERVED: [&str; 4] = ["crate", "self", "super", "Self"];

/// A field as it appears in generated code
pub struct ColumnDef<'a> {
    /// The source field
    pub field: &'a Field,
    /// Rust identifier of the struct field
    pub ident: Ident,
    /// Rust type of the struct field
    pub rust_type: TokenStream,
}

impl<'a> ColumnDef<'a> {
    /// Build the column definition for a field
    pub fn new(field: &'a Field) -> Self {
        Self {
            field,
            ident: rust_ident(&field.name.to_snake_case()),
            rust_type: rust_type(field),
        }
    }

    /// Column definition inside `CREATE TABLE`
    pub fn sql(&self) -> String {
        format!(
            "{} {} NOT NULL",
            self.field.db_name,
            self.field.column_type.as_sql()
        )
    }
}

/// Column definitions of an entity, primary key excluded
pub fn columns(entity: &Entity) -> Vec<ColumnDef<'_>> {
    entity.columns().map(ColumnDef::new).collect()
}

/// Identifier for a snake_case name, escaping keywords
pub fn rust_ident(name: &str) -> Ident {
    if RESERVED.contains(&name) {
        format_ident!("{}_", name)
    } else if RUST_KEYWORDS.contains(name) {
        Ident::new_raw(name, Span::call_site())
    } else {
        format_ident!("{}", name)
    }
}

/// Module identifier for an entity
pub fn module_ident(entity: &Entity) -> Ident {
    rust_ident(&entity.lower_name())
}

/// Rust type stored for a field
///
/// Fields with a dedicated kind use it directly. Fallback kinds take the
/// type sqlx decodes from their column, so `int32` is `i32`, `float` is
/// `f32` and `bytes` is `Vec<u8>`. Foreign keys end up `i64` to match their
/// BIGINT column.
pub fn rust_type(field: &Field) -> TokenStream {
    if field.name.ends_with("_id") {
        return column_rust_type(field.column_type);
    }

    match field.kind {
        FieldKind::Int64 => quote!(i64),
        FieldKind::Bool => quote!(bool),
        FieldKind::Float64 => quote!(f64),
        FieldKind::String | FieldKind::Reference(_) => column_rust_type(field.column_type),
    }
}

/// Rust type sqlx maps a Postgres column type to
pub fn column_rust_type(column_type: ColumnType) -> TokenStream {
    match column_type {
        ColumnType::Integer => quote!(i32),
        ColumnType::BigInt => quote!(i64),
        ColumnType::Real => quote!(f32),
        ColumnType::DoublePrecision => quote!(f64),
        ColumnType::Boolean => quote!(bool),
        ColumnType::Text => quote!(String),
        ColumnType::Bytea => quote!(Vec<u8>),
    }
}
