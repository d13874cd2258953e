mod config;

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use quire_core::{
    Converter, SerializeOptions, StyledBuffer, add_source_formatting, remove_source_formatting,
    to_html,
};
use serde::Serialize;

use crate::config::CliConfig;

#[derive(Parser)]
#[command(version, about = "Quire - convert between HTML and styled text", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to config file
    #[arg(long, env = "QUIRE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert HTML and print the styled text as JSON
    Spans {
        /// Input file, stdin when omitted
        input: Option<PathBuf>,
    },
    /// Convert HTML to styled text and back
    Roundtrip {
        /// Input file, stdin when omitted
        input: Option<PathBuf>,

        /// Pretty-print block structure
        #[arg(long)]
        source_format: bool,

        /// Keep cursor markers in the output
        #[arg(long)]
        with_cursor: bool,
    },
    /// Put block tags on their own lines
    Format {
        /// Input file, stdin when omitted
        input: Option<PathBuf>,
    },
    /// Undo `format`
    Unformat {
        /// Input file, stdin when omitted
        input: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct SpanDump<'a> {
    text: String,
    spans: Vec<&'a quire_core::Span>,
}

fn main() -> Result<()> {
    init_miette();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Spans { input } => {
            let buffer = convert(&config, &read_input(input.as_deref())?)?;
            let dump = SpanDump {
                text: buffer.to_plain_string(),
                spans: buffer.spans().map(|(_, span)| span).collect(),
            };
            let json = serde_json::to_string_pretty(&dump).into_diagnostic()?;
            println!("{json}");
        }
        Commands::Roundtrip {
            input,
            source_format,
            with_cursor,
        } => {
            let buffer = convert(&config, &read_input(input.as_deref())?)?;
            let options = SerializeOptions {
                with_cursor,
                source_format,
                cursor_tag: Some(config.converter.cursor_tag.clone()),
            };
            println!("{}", to_html(&buffer, &options, &config.plugin_set()));
        }
        Commands::Format { input } => {
            println!("{}", add_source_formatting(&read_input(input.as_deref())?));
        }
        Commands::Unformat { input } => {
            println!("{}", remove_source_formatting(&read_input(input.as_deref())?));
        }
    }

    Ok(())
}

fn convert(config: &CliConfig, html: &str) -> Result<StyledBuffer> {
    let plugins = config.plugin_set();
    let buffer = Converter::new(&config.converter, &plugins).convert(html)?;
    tracing::info!(chars = buffer.len(), "converted input");
    Ok(buffer)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).into_diagnostic(),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .into_diagnostic()?;
            Ok(text)
        }
    }
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .context_lines(3)
                .tab_width(2)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
