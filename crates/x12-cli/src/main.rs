//! # x12-cli
//!
//! Command-line interface for the X12 structural parser.
//!
//! This crate provides the `x12` binary for converting interchanges
//! into JSON structure documents and inspecting interchange headers.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use x12_convert::{JsonTreeSink, X12Converter};
use x12_schema::{SchemaRegistry, loader};
use x12_stream::InterchangeReader;

#[derive(Parser)]
#[command(name = "x12")]
#[command(about = "X12 interchange structural parser")]
#[command(version)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an interchange into a JSON structure document
    Convert {
        /// Input file path
        input: PathBuf,

        /// Schema file (JSON or YAML); repeatable
        #[arg(short, long)]
        schema: Vec<PathBuf>,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Decode and print the interchange header
    Header {
        /// Input file path
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            schema,
            output,
            pretty,
        } => convert(&input, &schema, output.as_deref(), pretty),
        Commands::Header { input } => header(&input),
    }
}

fn convert(
    input: &Path,
    schemas: &[PathBuf],
    output: Option<&Path>,
    pretty: bool,
) -> anyhow::Result<()> {
    let mut registry = SchemaRegistry::new();
    for path in schemas {
        let sets = loader::load_file(path)
            .with_context(|| format!("loading schema {}", path.display()))?;
        for ts in sets {
            registry.register(ts);
        }
    }
    tracing::info!("loaded {} transaction set schema(s)", registry.len());

    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let mut sink = JsonTreeSink::new();
    X12Converter::with_registry(&registry)
        .convert(BufReader::new(file), &mut sink)
        .with_context(|| format!("converting {}", input.display()))?;

    let doc = sink.finish();
    let rendered = if pretty {
        serde_json::to_string_pretty(&doc)?
    } else {
        serde_json::to_string(&doc)?
    };

    match output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", rendered),
    }
    Ok(())
}

fn header(input: &Path) -> anyhow::Result<()> {
    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let mut reader = InterchangeReader::new(BufReader::new(file));
    let isa = reader
        .read_header()
        .with_context(|| format!("reading interchange header from {}", input.display()))?;

    println!(
        "sender:          {} ({})",
        isa.sender_id().trim_end(),
        isa.sender_id_qualifier()
    );
    println!(
        "receiver:        {} ({})",
        isa.receiver_id().trim_end(),
        isa.receiver_id_qualifier()
    );
    match isa.interchange_datetime() {
        Some(dt) => println!("date/time:       {}", dt.format("%Y-%m-%d %H:%M")),
        None => println!(
            "date/time:       {} {} (unparsed)",
            isa.interchange_date(),
            isa.interchange_time()
        ),
    }
    println!("control version: {}", isa.control_version());
    println!("control number:  {}", isa.control_number());
    println!("usage indicator: {}", isa.usage_indicator() as char);
    let delimiters = isa.delimiters();
    println!(
        "delimiters:      element='{}' component='{}' repetition='{}' segment='{}'",
        delimiters.element as char,
        delimiters.component as char,
        delimiters.repetition as char,
        delimiters.segment as char
    );
    Ok(())
}
