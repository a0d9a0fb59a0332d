//! Shared Rust sources: entry point, module indexes and the repository
//! abstraction

use super::format_rust;
use crate::codegen::column::module_ident;
use crate::codegen::{RenderContext, TemplateData};
use crate::model::Entity;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

fn module_decls(entities: &[Entity]) -> TokenStream {
    let modules = entities.iter().map(module_ident);
    quote! {
        #(pub mod #modules;)*
    }
}

fn type_ident(entity: &Entity, suffix: &str) -> Ident {
    format_ident!("{}{}", entity.name, suffix)
}

pub(super) fn main(_ctx: &RenderContext<'_>, data: TemplateData<'_>) -> Result<String, String> {
    let entities = data.entities()?;
    let names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();

    let servers = entities.iter().map(|entity| {
        let module = module_ident(entity);
        let binding = format_ident!("_{}", entity.lower_name());
        let server = type_ident(entity, "Server");
        let service = type_ident(entity, "Service");
        quote! {
            let #binding = grpc::#module::#server::new(
                service::#module::#service::new(repositories.#module.clone()),
            );
        }
    });

    format_rust(quote! {
        mod grpc;
        mod handler;
        mod models;
        mod repository;
        mod service;

        use sqlx::postgres::PgPoolOptions;
        use tracing_subscriber::EnvFilter;

        #[tokio::main]
        async fn main() -> Result<(), Box<dyn std::error::Error>> {
            dotenvy::dotenv().ok();

            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"));
            tracing_subscriber::fmt().with_env_filter(filter).init();

            let database_url = std::env::var("DATABASE_URL")?;
            let port = std::env::var("GRPC_PORT").unwrap_or_else(|_| "50051".to_string());
            let http_port = std::env::var("HTTP_PORT").unwrap_or_else(|_| "8080".to_string());

            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;

            let repositories = repository::Repositories::new(pool);
            #(#servers)*

            let app = handler::router(&repositories);
            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", http_port)).await?;

            tracing::info!(%port, %http_port, entities = ?[#(#names),*], "services ready");
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
            tracing::info!("shutting down");

            Ok(())
        }
    })
}

pub(super) fn models_mod(
    _ctx: &RenderContext<'_>,
    data: TemplateData<'_>,
) -> Result<String, String> {
    let entities = data.entities()?;
    let modules = module_decls(entities);
    let exports = entities.iter().map(|entity| {
        let module = module_ident(entity);
        let model = type_ident(entity, "");
        let input = format_ident!("New{}", entity.name);
        quote! { pub use #module::{#model, #input}; }
    });

    format_rust(quote! {
        #modules
        #(#exports)*
    })
}

pub(super) fn repository(
    _ctx: &RenderContext<'_>,
    data: TemplateData<'_>,
) -> Result<String, String> {
    let entities = data.entities()?;
    let modules = module_decls(entities);
    let fields: Vec<(Ident, Ident)> = entities
        .iter()
        .map(|entity| (module_ident(entity), type_ident(entity, "Repository")))
        .collect();
    let field_decls = fields.iter().map(|(module, repo)| {
        quote! { pub #module: #module::#repo, }
    });
    let field_inits = fields.iter().map(|(module, repo)| {
        quote! { #module: #module::#repo::new(pool.clone()), }
    });

    format_rust(quote! {
        #modules

        use sqlx::PgPool;

        /// Errors returned by every repository
        #[derive(Debug, thiserror::Error)]
        pub enum RepositoryError {
            #[error("record {0} not found")]
            NotFound(i64),
            #[error(transparent)]
            Database(#[from] sqlx::Error),
        }

        pub type Result<T> = std::result::Result<T, RepositoryError>;

        /// CRUD operations shared by all entity repositories
        #[allow(async_fn_in_trait)]
        pub trait Repository<T, N> {
            async fn create(&self, input: N) -> Result<T>;
            async fn get(&self, id: i64) -> Result<T>;
            async fn list(&self) -> Result<Vec<T>>;
            async fn update(&self, id: i64, input: N) -> Result<T>;
            async fn delete(&self, id: i64) -> Result<()>;
        }

        /// One repository per entity, sharing a connection pool
        #[derive(Debug, Clone)]
        pub struct Repositories {
            #(#field_decls)*
        }

        impl Repositories {
            #[allow(unused_variables)]
            pub fn new(pool: PgPool) -> Self {
                Self {
                    #(#field_inits)*
                }
            }
        }
    })
}

pub(super) fn service_mod(
    _ctx: &RenderContext<'_>,
    data: TemplateData<'_>,
) -> Result<String, String> {
    format_rust(module_decls(data.entities()?))
}

pub(super) fn grpc_mod(
    _ctx: &RenderContext<'_>,
    data: TemplateData<'_>,
) -> Result<String, String> {
    format_rust(module_decls(data.entities()?))
}
