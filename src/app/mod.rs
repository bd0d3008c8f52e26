use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assemble::assemble;
use crate::config::{JobConfig, RuntimeConfig};
use crate::kind::GeometryKind;
use crate::logging::TracingLogger;
use crate::parser::{self, CoordinateParser, CoordinateRecord, ParseOptions, Separator};
use crate::sinks::{FeatureStore, GeoJsonSink, GeoJsonlSink, persist};
use crate::sniff::{self, FileImporter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Coordinate file (.txt, .csv, .dat, .xyz); stdin when omitted or '-'
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file (.geojson, .geojsonl), or '-' for stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Job configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Geometry to build: point, linestring or polygon
    #[arg(short, long)]
    pub geometry: Option<GeometryKind>,

    /// Column separator: space, comma, tab or a literal string (auto-detected if omitted)
    #[arg(short, long)]
    pub separator: Option<Separator>,

    /// First column holds point ids
    #[arg(long)]
    pub has_id: bool,

    /// Leave open polygon rings open
    #[arg(long)]
    pub no_auto_close: bool,

    /// Fill length, area and perimeter fields from the geometry
    #[arg(long)]
    pub measure: bool,

    /// Output format (auto-detected if omitted)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Number of threads (default: parse on the main thread)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Print a summary of the geometry instead of writing it
    #[arg(long)]
    pub preview: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum OutputFormat {
    #[value(name = "geojson")]
    GeoJson,
    #[value(name = "geojsonl", alias = "jsonl")]
    GeoJsonl,
}

pub fn output_format_label(format: &OutputFormat) -> &'static str {
    match format {
        OutputFormat::GeoJson => "geojson",
        OutputFormat::GeoJsonl => "geojsonl",
    }
}

/// Format from `--format`, else from the output extension. Stdout gets
/// newline-delimited features.
pub fn resolve_format(format: Option<OutputFormat>, output: &Path) -> Result<OutputFormat> {
    if let Some(format) = format {
        return Ok(format);
    }
    if output == Path::new("-") {
        return Ok(OutputFormat::GeoJsonl);
    }
    output
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| match ext.to_lowercase().as_str() {
            "geojson" => Some(OutputFormat::GeoJson),
            "geojsonl" | "jsonl" | "json" => Some(OutputFormat::GeoJsonl),
            _ => None,
        })
        .context("CLI: Could not detect output format from extension; use --format")
}

pub fn init_sink(format: &OutputFormat, output: &Path) -> Result<Box<dyn FeatureStore>> {
    match format {
        OutputFormat::GeoJson => {
            if output == Path::new("-") {
                anyhow::bail!(
                    "CLI: GeoJSON output to stdout is not supported; use geojsonl instead"
                );
            }
            tracing::info!("Sink: {} -> {:?}", output_format_label(format), output);
            Ok(Box::new(GeoJsonSink::new(output)))
        }
        OutputFormat::GeoJsonl => {
            if output == Path::new("-") {
                tracing::info!("Sink: {} -> stdout", output_format_label(format));
                Ok(Box::new(GeoJsonlSink::stdout()))
            } else {
                tracing::info!("Sink: {} -> {:?}", output_format_label(format), output);
                Ok(Box::new(GeoJsonlSink::new(output)))
            }
        }
    }
}

/// The job configuration with command-line flags applied on top.
pub fn resolve_job(cli: &Cli) -> Result<JobConfig> {
    let mut job = match &cli.config {
        Some(path) => JobConfig::load(path)
            .with_context(|| format!("CLI: Failed to load config {:?}", path))?,
        None => JobConfig::default(),
    };

    if let Some(kind) = cli.geometry {
        job.geometry = kind;
    }
    if let Some(separator) = &cli.separator {
        job.separator = Some(separator.clone());
    }
    if cli.has_id {
        job.has_id = true;
    }
    if cli.no_auto_close {
        job.auto_close = false;
    }
    if cli.measure {
        job.measure = true;
    }

    Ok(job)
}

/// Read the input text and work out how to parse it.
fn load_input(cli: &Cli, job: &JobConfig) -> Result<(String, ParseOptions)> {
    let options = job.parse_options();

    let path = match cli.input.as_deref() {
        Some(path) if path != Path::new("-") => path,
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("CLI: Failed to read stdin")?;
            return Ok((text, options));
        }
    };

    sniff::validate_file(path).context("CLI: Invalid input file")?;
    let importer = FileImporter::new(Arc::new(TracingLogger::new("sniff")));
    let text = importer
        .read_file(path)
        .context("CLI: Failed to read input file")?;

    if options.separator.is_some() {
        return Ok((text, options));
    }

    match sniff::detect(&text) {
        Some(format) => {
            tracing::info!(
                "Detected {} separator, {} columns, ids: {}",
                format.separator,
                format.field_count,
                format.has_id
            );
            let detected = ParseOptions {
                extra_columns: options.extra_columns,
                ..format.parse_options()
            };
            Ok((text, detected))
        }
        None => {
            tracing::warn!("Could not detect a coordinate format in {:?}", path);
            Ok((String::new(), options))
        }
    }
}

fn parse_records(
    text: &str,
    options: &ParseOptions,
    runtime: &RuntimeConfig,
) -> Vec<CoordinateRecord> {
    let parser = CoordinateParser::new(Arc::new(TracingLogger::new("parser")));
    if runtime.threads.is_some() {
        parser.parse_parallel(text, options)
    } else {
        parser.parse(text, options)
    }
}

/// Run one conversion. Returns the number of features written, or zero in
/// preview mode.
pub fn run(cli: &Cli, runtime: &RuntimeConfig) -> Result<usize> {
    let job = resolve_job(cli)?;
    let kind = job.geometry;

    if !job.layer.is_empty() && !kind.matches_layer(&job.layer) {
        tracing::debug!("Layer '{}' does not name {} geometry", job.layer, kind);
    }

    let (text, options) = load_input(cli, &job)?;
    let records = parse_records(&text, &options, runtime);
    tracing::info!("Parsed {} coordinate record(s)", records.len());

    parser::validate(&records, kind).context("Validation: Coordinates rejected")?;

    if cli.preview {
        println!("{}", parser::preview_summary(&records, kind));
        return Ok(0);
    }

    let output = cli
        .output
        .as_deref()
        .context("CLI: --output is required unless --preview is set")?;
    let format = resolve_format(cli.format, output)?;

    let schema = job.schema().context("Schema: Invalid field definitions")?;
    let features = assemble(&records, kind, &schema, job.assemble_options());
    tracing::info!(
        "Layer '{}': {} {} feature(s), {} field(s)",
        job.layer,
        features.len(),
        kind,
        schema.len()
    );

    let mut sink = init_sink(&format, output)?;
    persist(sink.as_mut(), &schema, kind, features)
}
