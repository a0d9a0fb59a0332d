//! proto-scaffold - generate a Rust backend scaffold from proto messages
//!
//! Compiles the given proto files with `protoc`, turns every top-level
//! message (except `*Request`/`*Response` envelopes) into an entity and
//! writes models, repositories, services, RPC stubs and migrations into the
//! output directory. Generated files are overwritten on every run.

use clap::Parser;
use proto_scaffold::config::{collect_proto_inputs, GeneratorConfig};
use proto_scaffold::Generator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "proto-scaffold")]
#[command(about = "Generate a backend scaffold from protobuf message definitions")]
struct Args {
    /// Proto files or directories (repeatable, comma-separated lists allowed)
    #[arg(short, long = "proto", required = true)]
    proto: Vec<String>,

    /// Output directory
    #[arg(short, long, default_value = "out")]
    output: PathBuf,

    /// Extra proto include paths
    #[arg(short = 'I', long = "include")]
    include: Vec<PathBuf>,

    /// Package name of the generated crate
    #[arg(long, default_value = proto_scaffold::config::DEFAULT_PROJECT_NAME)]
    name: String,

    /// Proto compiler binary
    #[arg(long, env = "PROTOC", default_value = "protoc")]
    protoc: PathBuf,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("proto-scaffold: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let protos = collect_proto_inputs(args.proto.as_slice())?;
    tracing::info!(files = ?protos, "processing proto files");

    let config = GeneratorConfig {
        output_dir: args.output,
        include_paths: args.include,
        project_name: args.name,
        protoc: args.protoc,
    };

    let report = Generator::new(config).generate(&protos)?;
    tracing::info!(
        entities = ?report.order,
        files = report.files.len() + report.migrations.len(),
        "done"
    );

    Ok(())
}
