//! Command-line front end for `mmgrid-core` (§6).
//!
//! Reads Mermaid flowchart source from a file argument or stdin, renders it
//! to a character grid, and writes the result to stdout or `--output`.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mmgrid_core::{render_dsl, Direction, ParseError, RenderConfig};

/// Render a Mermaid flowchart to an ASCII/Unicode character grid.
#[derive(Parser, Debug)]
#[command(name = "mmgrid", version, about = "Mermaid flowchart to character-grid compiler")]
struct Args {
    /// Path to a Mermaid flowchart source file. Reads stdin when omitted.
    path: Option<PathBuf>,

    /// Use the plain-ASCII charset instead of Unicode box-drawing characters.
    #[arg(short = 'a', long = "ascii")]
    ascii: bool,

    /// Override the direction declared in the source (TD, BT, LR, RL).
    #[arg(short = 'd', long = "direction", value_parser = parse_direction)]
    direction: Option<Direction>,

    /// Horizontal label padding inside each node box.
    #[arg(short = 'p', long = "padding", default_value_t = 1)]
    padding: usize,

    /// Write the rendered grid to this path instead of stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
}

fn parse_direction(s: &str) -> Result<Direction, String> {
    match s.to_ascii_uppercase().as_str() {
        "TD" | "TB" => Ok(Direction::Td),
        "BT" => Ok(Direction::Bt),
        "LR" => Ok(Direction::Lr),
        "RL" => Ok(Direction::Rl),
        other => Err(format!("unknown direction `{other}` (expected TD, BT, LR, or RL)")),
    }
}

fn read_source(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn run(args: Args) -> Result<String, CliError> {
    let source = read_source(args.path.as_ref()).map_err(CliError::Io)?;
    let config = RenderConfig {
        ascii: args.ascii,
        direction: args.direction,
        padding: args.padding,
    };
    let grid = render_dsl(&source, &config).map_err(CliError::Parse)?;

    if let Some(output) = args.output.as_ref() {
        fs::write(output, &grid).map_err(CliError::Io)?;
    }
    Ok(grid)
}

enum CliError {
    Io(io::Error),
    Parse(ParseError),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let write_to_stdout = args.output.is_none();

    match run(args) {
        Ok(grid) => {
            if write_to_stdout {
                print!("{grid}");
            }
            ExitCode::SUCCESS
        }
        Err(CliError::Parse(err)) => {
            eprintln!("mmgrid: {err}");
            ExitCode::from(1)
        }
        Err(CliError::Io(err)) => {
            eprintln!("mmgrid: {err}");
            ExitCode::from(2)
        }
    }
}
