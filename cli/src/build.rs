#![deny(missing_docs)]

//! # Build Command
//!
//! Loads a manifest, builds the document for the given request facts and
//! writes it as JSON or YAML.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use routedoc_core::{
    load_json, load_yaml, BuildOutput, DocumentBuilder, LoadedManifest, PathSort, RequestFacts,
};
use tracing::info;

use crate::error::{CliError, CliResult};

/// Output encoding of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty printed JSON.
    Json,
    /// YAML.
    Yaml,
}

/// Arguments for the build command.
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Route manifest; `.json` files are read as JSON, anything else as YAML.
    pub manifest: PathBuf,

    /// `host` header of the documentation request.
    #[clap(long, env = "ROUTEDOC_HOST")]
    pub host: Option<String>,

    /// `x-forwarded-host` header of the documentation request.
    #[clap(long)]
    pub forwarded_host: Option<String>,

    /// `x-forwarded-proto` header of the documentation request.
    #[clap(long)]
    pub forwarded_proto: Option<String>,

    /// Protocol the server saw, e.g. `http`.
    #[clap(long)]
    pub protocol: Option<String>,

    /// Only document routes carrying this tag.
    #[clap(long)]
    pub required_tag: Option<String>,

    /// Sort paths and their methods.
    #[clap(long)]
    pub sort_paths: bool,

    /// Output encoding.
    #[clap(long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Output file; stdout when absent.
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

impl BuildArgs {
    fn facts(&self) -> RequestFacts {
        RequestFacts {
            forwarded_host: self.forwarded_host.clone(),
            host: self.host.clone(),
            forwarded_proto: self.forwarded_proto.clone(),
            protocol: self.protocol.clone(),
        }
    }
}

/// Executes the build command.
pub fn execute(args: &BuildArgs) -> CliResult<()> {
    let rendered = render(args)?;
    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, rendered)?;
            info!(output = %path.display(), "wrote document");
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

/// Builds the document and encodes it.
fn render(args: &BuildArgs) -> CliResult<String> {
    let manifest = load(&args.manifest)?;
    // Warnings were already logged by the walker as they were found.
    let output = build(args, &manifest)?;
    info!(warnings = output.warnings.len(), "built document");

    let value = output
        .document
        .to_value()
        .map_err(|e| CliError::General(format!("Failed to encode document: {}", e)))?;
    match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&value)
            .map_err(|e| CliError::General(format!("Failed to encode JSON: {}", e))),
        OutputFormat::Yaml => serde_yaml::to_string(&value)
            .map_err(|e| CliError::General(format!("Failed to encode YAML: {}", e))),
    }
}

fn load(path: &Path) -> CliResult<LoadedManifest> {
    if !path.exists() {
        return Err(CliError::General(format!(
            "Manifest not found: {:?}",
            path
        )));
    }
    let source = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let manifest = if is_json {
        load_json(&source)?
    } else {
        load_yaml(&source)?
    };
    info!(
        manifest = %path.display(),
        schemas = manifest.schemas.len(),
        routes = manifest.routes.len(),
        "loaded manifest"
    );
    Ok(manifest)
}

fn build(args: &BuildArgs, manifest: &LoadedManifest) -> CliResult<BuildOutput> {
    let mut config = manifest.config.clone();
    if let Some(tag) = &args.required_tag {
        config = config.with_required_tag(tag.clone());
    }
    if args.sort_paths {
        config = config.with_sort_paths(PathSort::PathMethod);
    }
    let output = DocumentBuilder::new(config).build(
        &manifest.options,
        &args.facts(),
        &manifest.schemas,
        &manifest.routes,
    )?;
    Ok(output)
}
