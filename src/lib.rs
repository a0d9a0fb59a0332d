//! proto-scaffold library
//!
//! This crate turns Protocol Buffer message definitions into a Rust backend
//! scaffold: models, repositories, services, RPC server stubs and SQL
//! migrations, one entity per top-level message.
//!
//! The pipeline is parse → resolve → render shared artifacts → render each
//! entity → render migrations. Generated paths are overwritten on every run,
//! so generated files must never be edited in place.

#![deny(warnings)]
#![deny(missing_docs)]

pub mod codegen;
pub mod config;
pub mod generator;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod types;
pub mod versioner;

use std::path::PathBuf;
use thiserror::Error;

pub use config::GeneratorConfig;
pub use generator::{GenerationReport, Generator};
pub use model::{ColumnType, Entity, Field, FieldKind};

/// Errors that can occur during scaffold generation
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// The proto compiler could not produce a descriptor set
    #[error("failed to compile {}: {message}", .path.display())]
    Compile {
        /// Proto source that failed to compile
        path: PathBuf,
        /// Compiler diagnostic or spawn failure
        message: String,
    },

    /// The compiled descriptor set does not contain the requested file
    #[error("descriptor for {path} not found in compiled descriptor set")]
    DescriptorNotFound {
        /// File name looked up in the descriptor set
        path: String,
    },

    /// Failed to decode a descriptor set
    #[error("failed to decode descriptor set for {path}: {message}")]
    Decode {
        /// File the descriptor set was compiled for
        path: String,
        /// Decoder message
        message: String,
    },

    /// The dependency graph between entities has no topological order
    #[error("circular dependency between entities: {}", .cycle.join(" -> "))]
    Cycle {
        /// Entity names along the cycle, with the first repeated at the end
        cycle: Vec<String>,
    },

    /// Two messages produced the same entity name
    #[error("entity {name} is defined more than once")]
    DuplicateEntity {
        /// The duplicated entity name
        name: String,
    },

    /// Two fields of an entity map to the same column
    #[error("field {field} of {entity} maps to column {column}, which is already in use")]
    ColumnConflict {
        /// Entity declaring the field
        entity: String,
        /// Declared field name
        field: String,
        /// Column name both fields map to
        column: String,
    },

    /// A catalog entry refers to a template key missing from the registry
    #[error("template {key} not found")]
    TemplateNotFound {
        /// Missing template key
        key: String,
    },

    /// A template failed while rendering
    #[error("failed to render template {template} for {target}: {message}")]
    Render {
        /// Template key
        template: String,
        /// Entity name, or `*` for shared templates
        target: String,
        /// Render failure
        message: String,
    },

    /// Writing an output file failed
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// Output path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid generator configuration or inputs
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Generate a scaffold for the given proto files using `protoc`
///
/// This is the main entry point for the generator.
pub fn generate(config: GeneratorConfig, protos: &[PathBuf]) -> Result<GenerationReport> {
    Generator::new(config).generate(protos)
}
