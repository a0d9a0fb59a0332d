//! `CREATE TABLE` migrations

use super::render_text;
use crate::codegen::column::columns;
use crate::codegen::relation::{foreign_key_for, foreign_keys};
use crate::codegen::{RenderContext, TemplateData};
use crate::model::PRIMARY_KEY;
use std::fmt::Write;

pub(super) fn migration(ctx: &RenderContext<'_>, data: TemplateData<'_>) -> Result<String, String> {
    let entity = data.entity()?;
    let table = entity.table_name();

    let mut definitions = vec![format!("{} BIGSERIAL PRIMARY KEY", PRIMARY_KEY)];
    for column in columns(entity) {
        let mut definition = column.sql();
        if let Some(fk) = foreign_key_for(entity, column.field, ctx.entities) {
            definition.push(' ');
            definition.push_str(&fk.references_clause());
        }
        definitions.push(definition);
    }

    render_text(|out| {
        writeln!(out, "-- Code generated by proto-scaffold. DO NOT EDIT.")?;
        writeln!(out, "-- Entity: {}", entity.name)?;
        writeln!(out)?;
        writeln!(out, "CREATE TABLE IF NOT EXISTS {} (", table)?;
        writeln!(out, "    {}", definitions.join(",\n    "))?;
        writeln!(out, ");")?;
        for fk in foreign_keys(entity, ctx.entities) {
            writeln!(out)?;
            writeln!(out, "{}", fk.index_statement(entity))?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnType, Entity, Field, FieldKind};

    fn field(name: &str, column_type: ColumnType) -> Field {
        Field {
            name: name.to_string(),
            kind: FieldKind::Int64,
            json_name: name.to_string(),
            db_name: name.to_string(),
            column_type,
            is_last: false,
        }
    }

    #[test]
    fn test_migration_with_foreign_key() {
        let entities = vec![
            Entity::new(
                "Courier",
                vec![field("id", ColumnType::BigInt), field("name", ColumnType::Text)],
            ),
            Entity::new(
                "Location",
                vec![
                    field("courier_id", ColumnType::BigInt),
                    field("latitude", ColumnType::DoublePrecision),
                ],
            ),
        ];
        let ctx = RenderContext {
            project: "app",
            entities: &entities,
        };

        let out = migration(&ctx, TemplateData::Entity(&entities[1])).unwrap();
        assert_eq!(
            out,
            "-- Code generated by proto-scaffold. DO NOT EDIT.\n\
             -- Entity: Location\n\
             \n\
             CREATE TABLE IF NOT EXISTS locations (\n    \
             id BIGSERIAL PRIMARY KEY,\n    \
             courier_id BIGINT NOT NULL REFERENCES couriers (id) ON DELETE CASCADE,\n    \
             latitude DOUBLE PRECISION NOT NULL\n\
             );\n\
             \n\
             CREATE INDEX IF NOT EXISTS idx_locations_courier_id ON locations (courier_id);\n"
        );
    }

    #[test]
    fn test_migration_skips_declared_primary_key() {
        let entities = vec![Entity::new(
            "Courier",
            vec![field("id", ColumnType::BigInt), field("name", ColumnType::Text)],
        )];
        let ctx = RenderContext {
            project: "app",
            entities: &entities,
        };

        let out = migration(&ctx, TemplateData::Entity(&entities[0])).unwrap();
        assert_eq!(out.matches("id ").count(), 1);
        assert!(out.contains("    name TEXT NOT NULL\n);"));
    }
}
