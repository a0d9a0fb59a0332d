//! HTTP handlers: a JSON CRUD router per entity under `/api/v1/<table>`

use super::format_rust;
use crate::codegen::column::module_ident;
use crate::codegen::{RenderContext, TemplateData};
use crate::model::Entity;
use quote::{format_ident, quote};

/// Collection route of an entity; items live under `<route>/:id`
fn route(entity: &Entity) -> String {
    format!("/api/v1/{}", entity.table_name())
}

pub(super) fn handler_mod(
    _ctx: &RenderContext<'_>,
    data: TemplateData<'_>,
) -> Result<String, String> {
    let entities = data.entities()?;
    let modules: Vec<_> = entities.iter().map(module_ident).collect();
    let merges = entities.iter().map(|entity| {
        let module = module_ident(entity);
        let service = format_ident!("{}Service", entity.name);
        quote! {
            .merge(#module::routes(crate::service::#module::#service::new(
                repositories.#module.clone(),
            )))
        }
    });

    format_rust(quote! {
        #(pub mod #modules;)*

        use axum::http::StatusCode;
        use axum::response::{IntoResponse, Response};
        use axum::{Json, Router};

        use crate::repository::{RepositoryError, Repositories};

        /// Repository failure rendered as `{"error": "..."}`
        #[derive(Debug)]
        pub struct ApiError(RepositoryError);

        impl From<RepositoryError> for ApiError {
            fn from(err: RepositoryError) -> Self {
                Self(err)
            }
        }

        impl IntoResponse for ApiError {
            fn into_response(self) -> Response {
                let status = match &self.0 {
                    RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
                    RepositoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let body = serde_json::json!({ "error": self.0.to_string() });
                (status, Json(body)).into_response()
            }
        }

        /// Routes of every entity
        #[allow(unused_variables)]
        pub fn router(repositories: &Repositories) -> Router {
            Router::new()
                #(#merges)*
        }
    })
}

pub(super) fn handler(_ctx: &RenderContext<'_>, data: TemplateData<'_>) -> Result<String, String> {
    let entity = data.entity()?;
    let module = module_ident(entity);
    let model = format_ident!("{}", entity.name);
    let input = format_ident!("New{}", entity.name);
    let service = format_ident!("{}Service", entity.name);
    let collection = route(entity);
    let item = format!("{}/:id", collection);

    format_rust(quote! {
        use axum::extract::{Path, State};
        use axum::http::StatusCode;
        use axum::routing::get;
        use axum::{Json, Router};

        use super::ApiError;
        use crate::models::#module::{#model, #input};
        use crate::service::#module::#service;

        pub fn routes(service: #service) -> Router {
            Router::new()
                .route(#collection, get(list).post(create))
                .route(#item, get(fetch).put(update).delete(remove))
                .with_state(service)
        }

        async fn create(
            State(service): State<#service>,
            Json(input): Json<#input>,
        ) -> Result<Json<#model>, ApiError> {
            Ok(Json(service.create(input).await?))
        }

        async fn fetch(
            State(service): State<#service>,
            Path(id): Path<i64>,
        ) -> Result<Json<#model>, ApiError> {
            Ok(Json(service.get(id).await?))
        }

        async fn list(State(service): State<#service>) -> Result<Json<Vec<#model>>, ApiError> {
            Ok(Json(service.list().await?))
        }

        async fn update(
            State(service): State<#service>,
            Path(id): Path<i64>,
            Json(input): Json<#input>,
        ) -> Result<Json<#model>, ApiError> {
            Ok(Json(service.update(id, input).await?))
        }

        async fn remove(
            State(service): State<#service>,
            Path(id): Path<i64>,
        ) -> Result<StatusCode, ApiError> {
            service.delete(id).await?;
            Ok(StatusCode::NO_CONTENT)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities() -> Vec<Entity> {
        vec![Entity::new("Courier", Vec::new()), Entity::new("DeliveryZone", Vec::new())]
    }

    #[test]
    fn test_handler_routes() {
        let entities = entities();
        let ctx = RenderContext {
            project: "app",
            entities: &entities,
        };
        let out = handler(&ctx, TemplateData::Entity(&entities[1])).unwrap();
        assert!(out.contains("pub fn routes(service: DeliveryZoneService) -> Router"));
        assert!(out.contains(".route(\"/api/v1/delivery_zones\", get(list).post(create))"));
        assert!(out.contains("\"/api/v1/delivery_zones/:id\""));
        assert!(out.contains("StatusCode::NO_CONTENT"));
    }

    #[test]
    fn test_handler_mod_merges_every_entity() {
        let entities = entities();
        let ctx = RenderContext {
            project: "app",
            entities: &entities,
        };
        let out = handler_mod(&ctx, TemplateData::Entities(&entities)).unwrap();
        assert!(out.contains("pub mod courier;"));
        assert!(out.contains("pub mod deliveryzone;"));
        assert!(out.contains("deliveryzone::routes("));
        assert!(out.contains("RepositoryError::NotFound(_) => StatusCode::NOT_FOUND"));
    }
}
