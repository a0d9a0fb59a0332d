//! Template rendering engine
//!
//! The engine pairs a fixed [`CATALOG`] of template keys, data shapes and
//! output path patterns with a [`TemplateRegistry`] of renderers. Shared
//! templates render once against the whole entity set, per-entity templates
//! once per entity, and the migration template once per entity with a
//! version token.
//!
//! Every write creates missing parent directories and overwrites the target
//! unconditionally.

pub mod column;
pub mod relation;
pub mod templates;

use crate::model::Entity;
use crate::{GeneratorError, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// What a template renders against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataShape {
    /// The whole ordered entity set, rendered once per run
    Shared,
    /// A single entity, rendered once per entity
    PerEntity,
    /// A single entity plus a migration version
    Migration,
}

/// One entry of the template catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Template key looked up in the registry
    pub key: &'static str,
    /// Data the template renders against
    pub shape: DataShape,
    /// Output path pattern relative to the output root
    ///
    /// Supported placeholders: `{entity}` (lower-cased name), `{snake}`
    /// (snake_case name) and `{version}`.
    pub path: &'static str,
}

/// The built-in template catalog, in rendering order
pub const CATALOG: &[CatalogEntry] = &[
    shared(templates::CARGO_TOML, "Cargo.toml"),
    shared(templates::MAIN, "src/main.rs"),
    shared(templates::MODELS_MOD, "src/models/mod.rs"),
    shared(templates::REPOSITORY, "src/repository/mod.rs"),
    shared(templates::SERVICE_MOD, "src/service/mod.rs"),
    shared(templates::GRPC_MOD, "src/grpc/mod.rs"),
    shared(templates::HANDLER_MOD, "src/handler/mod.rs"),
    shared(templates::DOCKER_COMPOSE, "docker-compose.yml"),
    shared(templates::DOCKERFILE, "Dockerfile"),
    shared(templates::ENV, ".env"),
    per_entity(templates::MODEL, "src/models/{entity}.rs"),
    per_entity(templates::ENTITY_REPOSITORY, "src/repository/{entity}/mod.rs"),
    per_entity(templates::SERVICE, "src/service/{entity}/mod.rs"),
    per_entity(templates::GRPC, "src/grpc/{entity}/mod.rs"),
    per_entity(templates::HANDLER, "src/handler/{entity}/mod.rs"),
    CatalogEntry {
        key: templates::MIGRATION,
        shape: DataShape::Migration,
        path: "migrations/{version}_create_{snake}.sql",
    },
];

const fn shared(key: &'static str, path: &'static str) -> CatalogEntry {
    CatalogEntry {
        key,
        shape: DataShape::Shared,
        path,
    }
}

const fn per_entity(key: &'static str, path: &'static str) -> CatalogEntry {
    CatalogEntry {
        key,
        shape: DataShape::PerEntity,
        path,
    }
}

/// Run-wide values available to every template
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Package name of the generated crate
    pub project: &'a str,
    /// All entities in resolved order
    pub entities: &'a [Entity],
}

/// Data a single render call receives
#[derive(Debug, Clone, Copy)]
pub enum TemplateData<'a> {
    /// The whole entity set
    Entities(&'a [Entity]),
    /// One entity
    Entity(&'a Entity),
}

impl<'a> TemplateData<'a> {
    /// The single entity, or an error for shared data
    pub fn entity(&self) -> std::result::Result<&'a Entity, String> {
        match *self {
            TemplateData::Entity(entity) => Ok(entity),
            TemplateData::Entities(_) => Err("template expects a single entity".to_string()),
        }
    }

    /// The entity set, or an error for single-entity data
    pub fn entities(&self) -> std::result::Result<&'a [Entity], String> {
        match *self {
            TemplateData::Entities(entities) => Ok(entities),
            TemplateData::Entity(_) => Err("template expects the entity set".to_string()),
        }
    }
}

/// A renderer producing file contents
pub trait Template {
    /// Render the template, returning the file contents
    fn render(
        &self,
        ctx: &RenderContext<'_>,
        data: TemplateData<'_>,
    ) -> std::result::Result<String, String>;
}

impl<F> Template for F
where
    F: Fn(&RenderContext<'_>, TemplateData<'_>) -> std::result::Result<String, String>,
{
    fn render(
        &self,
        ctx: &RenderContext<'_>,
        data: TemplateData<'_>,
    ) -> std::result::Result<String, String> {
        self(ctx, data)
    }
}

/// Templates addressable by key
#[derive(Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Box<dyn Template>>,
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("TemplateRegistry")
            .field("templates", &keys)
            .finish()
    }
}

impl TemplateRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in template of [`CATALOG`]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        templates::register_builtin(&mut registry);
        registry
    }

    /// Register (or replace) the template for `key`
    pub fn register(&mut self, key: impl Into<String>, template: impl Template + 'static) {
        self.templates.insert(key.into(), Box::new(template));
    }

    /// Look up a template by key
    pub fn get(&self, key: &str) -> Result<&dyn Template> {
        self.templates
            .get(key)
            .map(|t| &**t)
            .ok_or_else(|| GeneratorError::TemplateNotFound {
                key: key.to_string(),
            })
    }

    /// Whether a template is registered for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }
}

/// Values substituted into catalog path patterns
#[derive(Debug, Clone, Default)]
pub struct PathVars<'a> {
    /// Entity being rendered
    pub entity: Option<&'a Entity>,
    /// Migration version token
    pub version: Option<&'a str>,
}

/// Expand a catalog path pattern
pub fn expand_path(pattern: &str, vars: &PathVars<'_>) -> PathBuf {
    let mut path = pattern.to_string();
    if let Some(entity) = vars.entity {
        path = path
            .replace("{entity}", &entity.lower_name())
            .replace("{snake}", &entity.snake_name());
    }
    if let Some(version) = vars.version {
        path = path.replace("{version}", version);
    }
    PathBuf::from(path)
}

/// Renders catalog entries into an output directory
#[derive(Debug)]
pub struct Renderer<'a> {
    registry: &'a TemplateRegistry,
    catalog: &'a [CatalogEntry],
    output_dir: &'a Path,
}

impl<'a> Renderer<'a> {
    /// Create a renderer over the built-in catalog
    pub fn new(registry: &'a TemplateRegistry, output_dir: &'a Path) -> Self {
        Self::with_catalog(registry, CATALOG, output_dir)
    }

    /// Create a renderer over a custom catalog
    pub fn with_catalog(
        registry: &'a TemplateRegistry,
        catalog: &'a [CatalogEntry],
        output_dir: &'a Path,
    ) -> Self {
        Self {
            registry,
            catalog,
            output_dir,
        }
    }

    /// Render every shared template once
    pub fn render_shared(&self, ctx: &RenderContext<'_>) -> Result<Vec<PathBuf>> {
        self.entries(DataShape::Shared)
            .map(|entry| {
                self.emit(
                    entry,
                    ctx,
                    TemplateData::Entities(ctx.entities),
                    &PathVars::default(),
                )
            })
            .collect()
    }

    /// Render every per-entity template for `entity`
    pub fn render_entity(&self, ctx: &RenderContext<'_>, entity: &Entity) -> Result<Vec<PathBuf>> {
        let vars = PathVars {
            entity: Some(entity),
            version: None,
        };
        self.entries(DataShape::PerEntity)
            .map(|entry| self.emit(entry, ctx, TemplateData::Entity(entity), &vars))
            .collect()
    }

    /// Render the migration templates for `entity` under `version`
    pub fn render_migration(
        &self,
        ctx: &RenderContext<'_>,
        entity: &Entity,
        version: &str,
    ) -> Result<Vec<PathBuf>> {
        let vars = PathVars {
            entity: Some(entity),
            version: Some(version),
        };
        self.entries(DataShape::Migration)
            .map(|entry| self.emit(entry, ctx, TemplateData::Entity(entity), &vars))
            .collect()
    }

    fn entries(&self, shape: DataShape) -> impl Iterator<Item = &'a CatalogEntry> {
        let catalog: &'a [CatalogEntry] = self.catalog;
        catalog.iter().filter(move |entry| entry.shape == shape)
    }

    fn emit(
        &self,
        entry: &CatalogEntry,
        ctx: &RenderContext<'_>,
        data: TemplateData<'_>,
        vars: &PathVars<'_>,
    ) -> Result<PathBuf> {
        let template = self.registry.get(entry.key)?;
        let target = vars
            .entity
            .map(|e| e.name.clone())
            .unwrap_or_else(|| "*".to_string());

        let contents = template
            .render(ctx, data)
            .map_err(|message| GeneratorError::Render {
                template: entry.key.to_string(),
                target,
                message,
            })?;

        let path = self.output_dir.join(expand_path(entry.path, vars));
        write_file(&path, &contents)?;
        Ok(path)
    }
}

/// Write `contents` to `path`, creating parent directories and replacing any
/// existing file
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| GeneratorError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    info!(path = %path.display(), "generating file");
    std::fs::write(path, contents).map_err(|source| GeneratorError::Write {
        path: path.to_path_buf(),
        source,
    })
}
