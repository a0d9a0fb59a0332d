//! Built-in templates
//!
//! Rust sources are assembled as token streams and pretty-printed with
//! prettyplease; everything else is plain text.

mod app;
mod entity;
mod handler;
mod manifest;
mod migration;

use super::TemplateRegistry;
use proc_macro2::TokenStream;
use std::fmt;

/// `Cargo.toml` of the generated crate
pub const CARGO_TOML: &str = "cargo_toml";
/// Binary entry point wiring every entity
pub const MAIN: &str = "main";
/// `models` module index
pub const MODELS_MOD: &str = "models_mod";
/// Shared repository abstraction and module index
pub const REPOSITORY: &str = "repository";
/// `service` module index
pub const SERVICE_MOD: &str = "service_mod";
/// `grpc` module index
pub const GRPC_MOD: &str = "grpc_mod";
/// `handler` module index, error mapping and merged HTTP router
pub const HANDLER_MOD: &str = "handler_mod";
/// Compose file with the database and the app
pub const DOCKER_COMPOSE: &str = "docker_compose";
/// Container build for the app
pub const DOCKERFILE: &str = "dockerfile";
/// Environment defaults
pub const ENV: &str = "env";
/// Model struct of one entity
pub const MODEL: &str = "model";
/// sqlx repository of one entity
pub const ENTITY_REPOSITORY: &str = "entity_repository";
/// Service layer of one entity
pub const SERVICE: &str = "service";
/// RPC server stub of one entity
pub const GRPC: &str = "grpc";
/// HTTP handlers of one entity
pub const HANDLER: &str = "handler";
/// `CREATE TABLE` migration of one entity
pub const MIGRATION: &str = "migration";

/// First line of every generated Rust file
const RUST_HEADER: &str = "// Code generated by proto-scaffold. DO NOT EDIT.\n\n";

/// Register every built-in template
pub fn register_builtin(registry: &mut TemplateRegistry) {
    registry.register(CARGO_TOML, manifest::cargo_toml);
    registry.register(DOCKER_COMPOSE, manifest::docker_compose);
    registry.register(DOCKERFILE, manifest::dockerfile);
    registry.register(ENV, manifest::env);
    registry.register(MAIN, app::main);
    registry.register(MODELS_MOD, app::models_mod);
    registry.register(REPOSITORY, app::repository);
    registry.register(SERVICE_MOD, app::service_mod);
    registry.register(GRPC_MOD, app::grpc_mod);
    registry.register(HANDLER_MOD, handler::handler_mod);
    registry.register(MODEL, entity::model);
    registry.register(ENTITY_REPOSITORY, entity::repository);
    registry.register(SERVICE, entity::service);
    registry.register(GRPC, entity::grpc);
    registry.register(HANDLER, handler::handler);
    registry.register(MIGRATION, migration::migration);
}

/// Pretty-print a token stream as a Rust source file
fn format_rust(tokens: TokenStream) -> Result<String, String> {
    let file: syn::File =
        syn::parse2(tokens).map_err(|e| format!("generated code does not parse: {}", e))?;
    Ok(format!("{}{}", RUST_HEADER, prettyplease::unparse(&file)))
}

/// Build a text file with `std::fmt::Write`
fn render_text(build: impl FnOnce(&mut String) -> fmt::Result) -> Result<String, String> {
    let mut out = String::new();
    build(&mut out).map_err(|e| e.to_string())?;
    Ok(out)
}
