//! Command-line interface for featline
//! Parses a file of training lines and prints every resulting example.
//!
//! Usage:
//!   featline `<path>` [--config `<toml>`] [--format json|yaml] [--input text|json|dsjson] [--strict] [--audit]
//!
//! Warnings go to stderr through `tracing`; set `RUST_LOG` to change the level.

use clap::{Arg, ArgAction, Command};
use featline::featline::config::ParserConfig;
use featline::featline::example::Example;
use featline::featline::json::{DsJsonOutcome, JsonParser};
use featline::featline::label::{SimpleLabelParser, WordsLabelParser};
use featline::featline::pool::ExamplePool;
use featline::featline::reader::LineReader;
use featline::featline::splitter::TextParser;
use featline::featline::summary::ExampleSummary;
use featline_config::{InputFormat, Loader};
use serde::Serialize;
use std::error::Error;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Yaml,
}

fn main() {
    let matches = Command::new("featline")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parse training example lines and print the hashed features")
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .help("Path to the input file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML file layered over the built-in defaults"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format")
                .value_parser(["json", "yaml"])
                .default_value("json"),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .help("Input format (overrides the configuration)")
                .value_parser(["text", "json", "dsjson"]),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Stop at the first malformed line")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("audit")
                .long("audit")
                .help("Record feature names next to hashes")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let path = matches.get_one::<String>("path").unwrap();
    let output = match matches.get_one::<String>("format").map(String::as_str) {
        Some("yaml") => OutputFormat::Yaml,
        _ => OutputFormat::Json,
    };

    let result = load_config(
        matches.get_one::<String>("config"),
        matches.get_one::<String>("input"),
        matches.get_flag("strict"),
        matches.get_flag("audit"),
    )
    .and_then(|(config, input)| handle_parse(path, config, input, output));

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(
    file: Option<&String>,
    input: Option<&String>,
    strict: bool,
    audit: bool,
) -> CliResult<(ParserConfig, InputFormat)> {
    let mut loader = Loader::new();
    if let Some(file) = file {
        loader = loader.with_file(file);
    }
    if let Some(name) = input {
        let format = InputFormat::from_name(name)
            .ok_or_else(|| format!("unknown input format '{}'", name))?;
        loader = loader.with_input_format(format)?;
    }
    let loader = loader.with_parser_flags(strict, audit)?;
    let settings = loader.build()?;
    let config = ParserConfig::from_settings(&settings.parser)?;
    Ok((config, settings.input.format))
}

/// Handle the parse of one input file
fn handle_parse(
    path: &str,
    config: ParserConfig,
    input: InputFormat,
    output: OutputFormat,
) -> CliResult<()> {
    let config = Arc::new(config);
    let strict = config.strict;
    let mut reader = LineReader::from_path(path)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match input {
        InputFormat::Text => {
            let mut parser = TextParser::new(config, SimpleLabelParser);
            let mut pool = ExamplePool::new();
            while let Some(line) = reader.read_line()? {
                let mut example = pool.acquire_empty();
                let parsed = parser.parse_line(line, &mut example);
                if let Err(e) = parsed {
                    pool.release([example]);
                    return Err(e.into());
                }
                write_example(&mut out, output, &example)?;
                pool.release([example]);
            }
        }
        InputFormat::Json | InputFormat::Dsjson => {
            let mut parser = JsonParser::new(config, WordsLabelParser);
            let mut pool = ExamplePool::new();
            let mut examples = Vec::new();
            while let Some(line) = reader.read_line()? {
                if line.is_empty() {
                    continue;
                }
                let parsed = if input == InputFormat::Json {
                    parser.parse_line(line, &mut pool, &mut examples).map(|_| None)
                } else {
                    parser
                        .parse_decision_service_line(line, &mut pool, &mut examples)
                        .map(Some)
                };
                match parsed {
                    Ok(Some(DsJsonOutcome::Reread)) => continue,
                    Ok(Some(DsJsonOutcome::Skipped(interaction))) => {
                        tracing::debug!(event_id = %interaction.event_id, "skipping learn");
                    }
                    Ok(_) => {}
                    Err(e) if !strict => {
                        tracing::warn!(line = reader.lines_read(), "{}", e);
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
                for example in &examples {
                    write_example(&mut out, output, example)?;
                }
                pool.release(examples.drain(..));
            }
        }
    }

    tracing::info!(lines = reader.lines_read(), "done");
    out.flush()?;
    Ok(())
}

fn write_example<W, L>(out: &mut W, format: OutputFormat, example: &Example<L>) -> CliResult<()>
where
    W: Write,
    L: Serialize,
{
    let summary = ExampleSummary::of(example);
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&summary)?)?,
        OutputFormat::Yaml => write!(out, "---\n{}", serde_yaml::to_string(&summary)?)?,
    }
    Ok(())
}
