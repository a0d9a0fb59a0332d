//! Per-entity Rust sources: model, repository, service and RPC stub

use super::format_rust;
use crate::codegen::column::{columns, module_ident, ColumnDef};
use crate::codegen::relation::foreign_key_for;
use crate::codegen::{RenderContext, TemplateData};
use crate::model::{Entity, FieldKind, PRIMARY_KEY};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

/// Identifiers shared by every per-entity template
struct Names {
    module: Ident,
    model: Ident,
    input: Ident,
    repository: Ident,
    service: Ident,
    server: Ident,
    label: String,
}

impl Names {
    fn new(entity: &Entity) -> Self {
        Self {
            module: module_ident(entity),
            model: format_ident!("{}", entity.name),
            input: format_ident!("New{}", entity.name),
            repository: format_ident!("{}Repository", entity.name),
            service: format_ident!("{}Service", entity.name),
            server: format_ident!("{}Server", entity.name),
            label: entity.snake_name().replace('_', " "),
        }
    }
}

fn field_doc(ctx: &RenderContext<'_>, entity: &Entity, column: &ColumnDef<'_>) -> Option<String> {
    if let Some(fk) = foreign_key_for(entity, column.field, ctx.entities) {
        return Some(format!(" Foreign key to `{}`", fk.target.name));
    }
    match &column.field.kind {
        FieldKind::Reference(name) => Some(format!(" Serialized `{}`", name)),
        _ => None,
    }
}

fn struct_fields(ctx: &RenderContext<'_>, entity: &Entity) -> Vec<TokenStream> {
    columns(entity)
        .iter()
        .map(|column| {
            let ident = &column.ident;
            let ty = &column.rust_type;
            let json_name = &column.field.json_name;
            let doc = field_doc(ctx, entity, column).map(|doc| quote! { #[doc = #doc] });
            quote! {
                #doc
                #[serde(rename = #json_name)]
                pub #ident: #ty,
            }
        })
        .collect()
}

pub(super) fn model(ctx: &RenderContext<'_>, data: TemplateData<'_>) -> Result<String, String> {
    let entity = data.entity()?;
    let names = Names::new(entity);
    let (model, input) = (&names.model, &names.input);
    let fields = struct_fields(ctx, entity);
    let model_doc = format!(" `{}` record", entity.name);
    let input_doc = format!(" Values accepted when creating or updating a {}", names.label);
    let table = entity.table_name();

    format_rust(quote! {
        use serde::{Deserialize, Serialize};

        pub const TABLE: &str = #table;

        #[doc = #model_doc]
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
        pub struct #model {
            pub id: i64,
            #(#fields)*
        }

        #[doc = #input_doc]
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct #input {
            #(#fields)*
        }
    })
}

/// SQL statements of an entity repository
struct Statements {
    insert: String,
    select: String,
    list: String,
    update: String,
    delete: String,
}

impl Statements {
    fn new(entity: &Entity) -> Self {
        let table = entity.table_name();
        let names: Vec<&str> = entity.columns().map(|f| f.db_name.as_str()).collect();
        let returning = std::iter::once(PRIMARY_KEY)
            .chain(names.iter().copied())
            .collect::<Vec<_>>()
            .join(", ");
        let select = format!("SELECT {} FROM {} WHERE {} = $1", returning, table, PRIMARY_KEY);

        let insert = if names.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
        } else {
            let params: Vec<String> = (1..=names.len()).map(|i| format!("${}", i)).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                table,
                names.join(", "),
                params.join(", "),
                returning
            )
        };

        let update = if names.is_empty() {
            select.clone()
        } else {
            let assignments: Vec<String> = names
                .iter()
                .enumerate()
                .map(|(i, name)| format!("{} = ${}", name, i + 1))
                .collect();
            format!(
                "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
                table,
                assignments.join(", "),
                PRIMARY_KEY,
                names.len() + 1,
                returning
            )
        };

        Self {
            insert,
            list: format!("SELECT {} FROM {} ORDER BY {}", returning, table, PRIMARY_KEY),
            delete: format!("DELETE FROM {} WHERE {} = $1", table, PRIMARY_KEY),
            select,
            update,
        }
    }
}

pub(super) fn repository(
    _ctx: &RenderContext<'_>,
    data: TemplateData<'_>,
) -> Result<String, String> {
    let entity = data.entity()?;
    let names = Names::new(entity);
    let (module, model, input, repository) =
        (&names.module, &names.model, &names.input, &names.repository);
    let sql = Statements::new(entity);
    let (insert, select, list, update, delete) =
        (&sql.insert, &sql.select, &sql.list, &sql.update, &sql.delete);

    let binds: Vec<TokenStream> = columns(entity)
        .iter()
        .map(|column| {
            let ident = &column.ident;
            quote! { .bind(input.#ident) }
        })
        .collect();
    // The empty-column update is a plain select keyed on $1.
    let update_query = if binds.is_empty() {
        quote! {
            let _ = input;
            let record = sqlx::query_as::<_, #model>(#update)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        }
    } else {
        quote! {
            let record = sqlx::query_as::<_, #model>(#update)
                #(#binds)*
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        }
    };

    format_rust(quote! {
        use sqlx::PgPool;

        use super::{Repository, RepositoryError, Result};
        use crate::models::#module::{#model, #input};

        #[derive(Debug, Clone)]
        pub struct #repository {
            pool: PgPool,
        }

        impl #repository {
            pub fn new(pool: PgPool) -> Self {
                Self { pool }
            }
        }

        impl Repository<#model, #input> for #repository {
            async fn create(&self, input: #input) -> Result<#model> {
                let record = sqlx::query_as::<_, #model>(#insert)
                    #(#binds)*
                    .fetch_one(&self.pool)
                    .await?;
                Ok(record)
            }

            async fn get(&self, id: i64) -> Result<#model> {
                sqlx::query_as::<_, #model>(#select)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or(RepositoryError::NotFound(id))
            }

            async fn list(&self) -> Result<Vec<#model>> {
                let records = sqlx::query_as::<_, #model>(#list)
                    .fetch_all(&self.pool)
                    .await?;
                Ok(records)
            }

            async fn update(&self, id: i64, input: #input) -> Result<#model> {
                #update_query
                record.ok_or(RepositoryError::NotFound(id))
            }

            async fn delete(&self, id: i64) -> Result<()> {
                let result = sqlx::query(#delete)
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound(id));
                }
                Ok(())
            }
        }
    })
}

pub(super) fn service(
    _ctx: &RenderContext<'_>,
    data: TemplateData<'_>,
) -> Result<String, String> {
    let entity = data.entity()?;
    let names = Names::new(entity);
    let (module, model, input, repository, service) = (
        &names.module,
        &names.model,
        &names.input,
        &names.repository,
        &names.service,
    );
    let created = format!("created {}", names.label);
    let updated = format!("updated {}", names.label);
    let deleted = format!("deleted {}", names.label);

    format_rust(quote! {
        use crate::models::#module::{#model, #input};
        use crate::repository::#module::#repository;
        use crate::repository::{Repository, Result};

        #[derive(Debug, Clone)]
        pub struct #service {
            repository: #repository,
        }

        impl #service {
            pub fn new(repository: #repository) -> Self {
                Self { repository }
            }

            pub async fn create(&self, input: #input) -> Result<#model> {
                let record = self.repository.create(input).await?;
                tracing::info!(id = record.id, #created);
                Ok(record)
            }

            pub async fn get(&self, id: i64) -> Result<#model> {
                self.repository.get(id).await
            }

            pub async fn list(&self) -> Result<Vec<#model>> {
                self.repository.list().await
            }

            pub async fn update(&self, id: i64, input: #input) -> Result<#model> {
                let record = self.repository.update(id, input).await?;
                tracing::info!(id, #updated);
                Ok(record)
            }

            pub async fn delete(&self, id: i64) -> Result<()> {
                self.repository.delete(id).await?;
                tracing::info!(id, #deleted);
                Ok(())
            }
        }
    })
}

pub(super) fn grpc(_ctx: &RenderContext<'_>, data: TemplateData<'_>) -> Result<String, String> {
    let entity = data.entity()?;
    let names = Names::new(entity);
    let (module, model, input, service, server) = (
        &names.module,
        &names.model,
        &names.input,
        &names.service,
        &names.server,
    );

    format_rust(quote! {
        use tonic::{Request, Response, Status};

        use crate::models::#module::{#model, #input};
        use crate::repository::RepositoryError;
        use crate::service::#module::#service;

        #[derive(Debug, Clone)]
        pub struct #server {
            service: #service,
        }

        impl #server {
            pub fn new(service: #service) -> Self {
                Self { service }
            }

            pub async fn create(&self, request: Request<#input>) -> Result<Response<#model>, Status> {
                let record = self.service.create(request.into_inner()).await.map_err(to_status)?;
                Ok(Response::new(record))
            }

            pub async fn get(&self, request: Request<i64>) -> Result<Response<#model>, Status> {
                let record = self.service.get(request.into_inner()).await.map_err(to_status)?;
                Ok(Response::new(record))
            }

            pub async fn list(&self, _request: Request<()>) -> Result<Response<Vec<#model>>, Status> {
                let records = self.service.list().await.map_err(to_status)?;
                Ok(Response::new(records))
            }

            pub async fn update(
                &self,
                request: Request<(i64, #input)>,
            ) -> Result<Response<#model>, Status> {
                let (id, input) = request.into_inner();
                let record = self.service.update(id, input).await.map_err(to_status)?;
                Ok(Response::new(record))
            }

            pub async fn delete(&self, request: Request<i64>) -> Result<Response<()>, Status> {
                self.service.delete(request.into_inner()).await.map_err(to_status)?;
                Ok(Response::new(()))
            }
        }

        fn to_status(err: RepositoryError) -> Status {
            match &err {
                RepositoryError::NotFound(_) => Status::not_found(err.to_string()),
                RepositoryError::Database(_) => Status::internal(err.to_string()),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnType, Field};
    use heck::ToSnakeCase;

    fn field(name: &str, kind: FieldKind, column_type: ColumnType) -> Field {
        Field {
            name: name.to_string(),
            kind,
            json_name: name.to_string(),
            db_name: name.to_snake_case(),
            column_type,
            is_last: false,
        }
    }

    fn entities() -> Vec<Entity> {
        vec![
            Entity::new(
                "Courier",
                vec![
                    field("id", FieldKind::Int64, ColumnType::BigInt),
                    field("name", FieldKind::String, ColumnType::Text),
                ],
            ),
            Entity::new(
                "Location",
                vec![
                    field("courier_id", FieldKind::Int64, ColumnType::BigInt),
                    field("latitude", FieldKind::Float64, ColumnType::DoublePrecision),
                    field("origin", FieldKind::Reference("Point".into()), ColumnType::Text),
                ],
            ),
        ]
    }

    #[test]
    fn test_model_fields() {
        let entities = entities();
        let ctx = RenderContext {
            project: "app",
            entities: &entities,
        };
        let out = model(&ctx, TemplateData::Entity(&entities[1])).unwrap();
        assert!(out.contains("pub struct Location {"));
        assert!(out.contains("pub struct NewLocation {"));
        assert!(out.contains("pub id: i64,"));
        assert!(out.contains("/// Foreign key to `Courier`"));
        assert!(out.contains("pub courier_id: i64,"));
        assert!(out.contains("pub latitude: f64,"));
        assert!(out.contains("/// Serialized `Point`"));
        assert!(out.contains("pub const TABLE: &str = \"locations\";"));
    }

    #[test]
    fn test_model_does_not_repeat_primary_key() {
        let entities = entities();
        let ctx = RenderContext {
            project: "app",
            entities: &entities,
        };
        let out = model(&ctx, TemplateData::Entity(&entities[0])).unwrap();
        assert_eq!(out.matches("pub id: i64").count(), 1);
    }

    #[test]
    fn test_statements() {
        let entities = entities();
        let sql = Statements::new(&entities[0]);
        assert_eq!(
            sql.insert,
            "INSERT INTO couriers (name) VALUES ($1) RETURNING id, name"
        );
        assert_eq!(sql.select, "SELECT id, name FROM couriers WHERE id = $1");
        assert_eq!(sql.list, "SELECT id, name FROM couriers ORDER BY id");
        assert_eq!(
            sql.update,
            "UPDATE couriers SET name = $1 WHERE id = $2 RETURNING id, name"
        );
        assert_eq!(sql.delete, "DELETE FROM couriers WHERE id = $1");
    }

    #[test]
    fn test_statements_without_columns() {
        let sql = Statements::new(&Entity::new("Marker", Vec::new()));
        assert_eq!(sql.insert, "INSERT INTO markers DEFAULT VALUES RETURNING id");
        assert_eq!(sql.update, sql.select);
    }

    #[test]
    fn test_repository_service_and_grpc_render() {
        let entities = entities();
        let ctx = RenderContext {
            project: "app",
            entities: &entities,
        };
        let data = TemplateData::Entity(&entities[1]);

        let repo = repository(&ctx, data).unwrap();
        assert!(repo.contains("impl Repository<Location, NewLocation> for LocationRepository"));
        assert!(repo.contains(".bind(input.courier_id)"));

        let svc = service(&ctx, data).unwrap();
        assert!(svc.contains("pub struct LocationService"));

        let stub = grpc(&ctx, data).unwrap();
        assert!(stub.contains("pub struct LocationServer"));
        assert!(stub.contains("Status::not_found"));
    }

    #[test]
    fn test_entity_templates_reject_shared_data() {
        let entities = entities();
        let ctx = RenderContext {
            project: "app",
            entities: &entities,
        };
        assert!(model(&ctx, TemplateData::Entities(&entities)).is_err());
    }
}
