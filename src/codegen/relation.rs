//! Foreign key relations between generated tables
//!
//! Relations follow the `<name>_id` convention used by the resolver: a
//! column referencing another entity of the run becomes a `REFERENCES`
//! constraint plus an index in that entity's migration.

use crate::model::{Entity, Field, PRIMARY_KEY};
use crate::resolver::referenced_entity;

/// A foreign key column of a generated table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey<'a> {
    /// The referencing field
    pub field: &'a Field,
    /// The referenced entity
    pub target: &'a Entity,
}

impl ForeignKey<'_> {
    /// `REFERENCES` clause appended to the column definition
    pub fn references_clause(&self) -> String {
        format!(
            "REFERENCES {} ({}) ON DELETE CASCADE",
            self.target.table_name(),
            PRIMARY_KEY
        )
    }

    /// Index statement for the foreign key column
    pub fn index_statement(&self, owner: &Entity) -> String {
        let table = owner.table_name();
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table} ({column});",
            table = table,
            column = self.field.db_name
        )
    }
}

/// Foreign keys of `owner` that resolve to entities of the run
pub fn foreign_keys<'a>(owner: &'a Entity, entities: &'a [Entity]) -> Vec<ForeignKey<'a>> {
    owner
        .columns()
        .filter_map(|field| foreign_key_for(owner, field, entities))
        .collect()
}

/// The foreign key declared by `field`, if it resolves
pub fn foreign_key_for<'a>(
    owner: &'a Entity,
    field: &'a Field,
    entities: &'a [Entity],
) -> Option<ForeignKey<'a>> {
    referenced_entity(owner, field, entities).map(|target| ForeignKey { field, target })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnType, FieldKind};

    fn entity(name: &str, fields: &[&str]) -> Entity {
        let fields = fields
            .iter()
            .map(|f| Field {
                name: f.to_string(),
                kind: FieldKind::Int64,
                json_name: f.to_string(),
                db_name: f.to_string(),
                column_type: ColumnType::BigInt,
                is_last: false,
            })
            .collect();
        Entity::new(name, fields)
    }

    #[test]
    fn test_foreign_keys_resolve_known_entities_only() {
        let entities = vec![
            entity("Courier", &["id"]),
            entity("Location", &["id", "courier_id", "warehouse_id"]),
        ];
        let keys = foreign_keys(&entities[1], &entities);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].field.name, "courier_id");
        assert_eq!(keys[0].target.name, "Courier");
        assert_eq!(
            keys[0].references_clause(),
            "REFERENCES couriers (id) ON DELETE CASCADE"
        );
        assert_eq!(
            keys[0].index_statement(&entities[1]),
            "CREATE INDEX IF NOT EXISTS idx_locations_courier_id ON locations (courier_id);"
        );
    }

    #[test]
    fn test_foreign_key_for_self_reference() {
        let entities = vec![entity("Employee", &["employee_id"])];
        assert!(foreign_key_for(&entities[0], &entities[0].fields[0], &entities).is_none());
    }
}
