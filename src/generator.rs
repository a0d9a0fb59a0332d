//! Generation pipeline
//!
//! parse → resolve → shared artifacts → per-entity artifacts → migrations.
//! Everything runs synchronously and the first error aborts the run. Files
//! written before a failure stay on disk; rerunning on corrected input
//! overwrites them.

use crate::codegen::{RenderContext, Renderer, TemplateRegistry};
use crate::config::GeneratorConfig;
use crate::model::Entity;
use crate::parser::{DescriptorParser, ProtoCompiler, Protoc};
use crate::resolver::sort_entities;
use crate::versioner::MigrationVersioner;
use crate::{GeneratorError, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::info;

/// Summary of a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Entity names in resolved order
    pub order: Vec<String>,
    /// Shared and per-entity files written, in write order
    pub files: Vec<PathBuf>,
    /// Migration files written, in version order
    pub migrations: Vec<PathBuf>,
}

/// Drives a full generation run
#[derive(Debug)]
pub struct Generator<C = Protoc> {
    parser: DescriptorParser<C>,
    registry: TemplateRegistry,
    config: GeneratorConfig,
}

impl Generator<Protoc> {
    /// Create a generator that compiles protos with `protoc`
    pub fn new(config: GeneratorConfig) -> Self {
        let compiler = Protoc::new(config.protoc.clone(), config.include_paths.clone());
        Self::with_compiler(config, compiler)
    }
}

impl<C: ProtoCompiler> Generator<C> {
    /// Create a generator with a custom proto compiler
    pub fn with_compiler(config: GeneratorConfig, compiler: C) -> Self {
        Self {
            parser: DescriptorParser::new(compiler),
            registry: TemplateRegistry::builtin(),
            config,
        }
    }

    /// Replace the template registry
    pub fn with_registry(mut self, registry: TemplateRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate from proto files, stamping migrations with the current time
    pub fn generate(&self, protos: &[PathBuf]) -> Result<GenerationReport> {
        self.generate_at(protos, Utc::now())
    }

    /// Generate from proto files, stamping migrations with `generated_at`
    pub fn generate_at(
        &self,
        protos: &[PathBuf],
        generated_at: DateTime<Utc>,
    ) -> Result<GenerationReport> {
        if protos.is_empty() {
            return Err(GeneratorError::InvalidConfig(
                "no proto files given".to_string(),
            ));
        }

        let entities = self.parser.parse_all(protos)?;
        self.generate_entities(entities, generated_at)
    }

    /// Generate from already extracted entities
    ///
    /// Resolution happens before anything is written, so a dependency cycle
    /// leaves the output directory untouched.
    pub fn generate_entities(
        &self,
        entities: Vec<Entity>,
        generated_at: DateTime<Utc>,
    ) -> Result<GenerationReport> {
        let entities = sort_entities(entities)?;
        let order: Vec<String> = entities.iter().map(|e| e.name.clone()).collect();
        info!(entities = ?order, "resolved generation order");

        let ctx = RenderContext {
            project: &self.config.project_name,
            entities: &entities,
        };
        let renderer = Renderer::new(&self.registry, &self.config.output_dir);

        let mut files = renderer.render_shared(&ctx)?;
        for entity in &entities {
            files.extend(renderer.render_entity(&ctx, entity)?);
        }

        let versioner = MigrationVersioner::new(generated_at, entities.len());
        let mut migrations = Vec::with_capacity(entities.len());
        for (position, entity) in entities.iter().enumerate() {
            let version = versioner.version(position);
            migrations.extend(renderer.render_migration(&ctx, entity, &version)?);
        }

        info!(
            files = files.len(),
            migrations = migrations.len(),
            output = %self.config.output_dir.display(),
            "generation complete"
        );

        Ok(GenerationReport {
            order,
            files,
            migrations,
        })
    }
}
