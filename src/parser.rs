//! Descriptor parsing
//!
//! Parsing is a two-step pipeline: a [`ProtoCompiler`] turns a `.proto`
//! source into a serialized `FileDescriptorSet`, then [`parse_descriptor_set`]
//! decodes it with prost-reflect and extracts one [`Entity`] per top-level
//! message of the requested file.

use crate::model::{Entity, Field, PRIMARY_KEY};
use crate::types::map_proto_type;
use crate::{GeneratorError, Result};
use heck::ToSnakeCase;
use prost_reflect::{DescriptorPool, FieldDescriptor, MessageDescriptor};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Message name suffixes that mark RPC envelopes rather than resources
const ENVELOPE_SUFFIXES: [&str; 2] = ["Request", "Response"];

/// Output of a compiler run
#[derive(Debug, Clone)]
pub struct CompiledProto {
    /// Name of the compiled file inside the descriptor set
    pub file_name: String,
    /// Serialized `FileDescriptorSet`, including imports
    pub descriptor_set: Vec<u8>,
}

/// Turns proto sources into serialized descriptor sets
pub trait ProtoCompiler {
    /// Compile a single proto file
    fn compile(&self, proto: &Path) -> Result<CompiledProto>;
}

/// [`ProtoCompiler`] backed by the `protoc` binary
#[derive(Debug, Clone)]
pub struct Protoc {
    program: PathBuf,
    include_paths: Vec<PathBuf>,
}

impl Protoc {
    /// Create a compiler invoking `program` with extra include paths
    pub fn new(program: impl Into<PathBuf>, include_paths: Vec<PathBuf>) -> Self {
        Self {
            program: program.into(),
            include_paths,
        }
    }
}

impl Default for Protoc {
    fn default() -> Self {
        Self::new("protoc", Vec::new())
    }
}

impl ProtoCompiler for Protoc {
    fn compile(&self, proto: &Path) -> Result<CompiledProto> {
        let compile_error = |message: String| GeneratorError::Compile {
            path: proto.to_path_buf(),
            message,
        };

        let file_name = proto
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| compile_error("path has no file name".to_string()))?;
        let proto_dir = proto
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // Scratch descriptor set, removed when `scratch` is dropped
        let scratch = tempfile::Builder::new()
            .prefix("proto-scaffold-")
            .suffix(".pb")
            .tempfile()
            .map_err(|e| compile_error(format!("failed to create scratch file: {}", e)))?;

        let mut command = Command::new(&self.program);
        command
            .arg(format!("--descriptor_set_out={}", scratch.path().display()))
            .arg("--include_imports")
            .arg(format!("--proto_path={}", proto_dir.display()));
        for include in &self.include_paths {
            command.arg(format!("--proto_path={}", include.display()));
        }
        command.arg(proto);

        debug!(?command, "invoking proto compiler");
        let output = command.output().map_err(|e| {
            compile_error(format!(
                "failed to run {}: {}",
                self.program.display(),
                e
            ))
        })?;

        if !output.status.success() {
            return Err(compile_error(format!(
                "{}, output: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let descriptor_set = std::fs::read(scratch.path())
            .map_err(|e| compile_error(format!("failed to read descriptor set: {}", e)))?;

        Ok(CompiledProto {
            file_name,
            descriptor_set,
        })
    }
}

/// Extracts entities from proto files through a [`ProtoCompiler`]
#[derive(Debug, Clone, Default)]
pub struct DescriptorParser<C> {
    compiler: C,
}

impl<C: ProtoCompiler> DescriptorParser<C> {
    /// Create a parser using the given compiler
    pub fn new(compiler: C) -> Self {
        Self { compiler }
    }

    /// Parse a single proto file
    pub fn parse(&self, proto: &Path) -> Result<Vec<Entity>> {
        info!(path = %proto.display(), "parsing proto file");
        let compiled = self.compiler.compile(proto)?;
        parse_descriptor_set(&compiled.descriptor_set, &compiled.file_name)
    }

    /// Parse every file in order, returning the union of their entities
    ///
    /// The first failure aborts the whole parse.
    pub fn parse_all(&self, protos: &[PathBuf]) -> Result<Vec<Entity>> {
        let mut entities = Vec::new();
        for proto in protos {
            entities.extend(self.parse(proto)?);
        }
        Ok(entities)
    }
}

/// Decode a serialized descriptor set and extract the entities of `file_name`
pub fn parse_descriptor_set(bytes: &[u8], file_name: &str) -> Result<Vec<Entity>> {
    let pool = DescriptorPool::decode(bytes).map_err(|e| GeneratorError::Decode {
        path: file_name.to_string(),
        message: e.to_string(),
    })?;

    let file = pool
        .get_file_by_name(file_name)
        .ok_or_else(|| GeneratorError::DescriptorNotFound {
            path: file_name.to_string(),
        })?;

    let mut entities = Vec::new();
    for message in file.messages() {
        if is_envelope(message.name()) {
            debug!(message = message.name(), "skipping request/response message");
            continue;
        }
        info!(message = message.name(), "found entity");
        entities.push(extract_entity(&message)?);
    }

    Ok(entities)
}

/// Whether a message name denotes an RPC envelope type
pub fn is_envelope(name: &str) -> bool {
    ENVELOPE_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

fn extract_entity(message: &MessageDescriptor) -> Result<Entity> {
    let fields: Vec<Field> = message.fields().map(|f| extract_field(&f)).collect();

    // The primary key column always exists, declared or not.
    let mut taken = HashSet::from([PRIMARY_KEY]);
    for field in &fields {
        if field.is_primary_key() {
            continue;
        }
        if !taken.insert(field.db_name.as_str()) {
            return Err(GeneratorError::ColumnConflict {
                entity: message.name().to_string(),
                field: field.name.clone(),
                column: field.db_name.clone(),
            });
        }
    }

    Ok(Entity::new(message.name(), fields))
}

fn extract_field(field: &FieldDescriptor) -> Field {
    let name = field.name().to_string();
    let mapped = map_proto_type(&field.kind(), &name);

    Field {
        db_name: name.to_snake_case(),
        json_name: field.json_name().to_string(),
        kind: mapped.kind,
        column_type: mapped.column_type,
        name,
        is_last: false,
    }
}
