use crate::config::load_config;
use crate::layout::compute_scene;
use crate::resource::KindRegistry;
use crate::scene_dump::SceneDump;
use crate::snapshot::parse_snapshot_str;
use anyhow::Result;
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "kappmap",
    version,
    about = "Infer application groupings from a cluster snapshot and lay them out"
)]
pub struct Args {
    /// Snapshot file (JSON or YAML) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the scene dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Compact output instead of pretty-printed JSON
    #[arg(long = "compact")]
    pub compact: bool,
}

pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let input = read_input(args.input.as_deref())?;
    let registry = KindRegistry::builtin();
    let snapshot = parse_snapshot_str(&input, &registry)?;

    let scene = compute_scene(&snapshot, &config);
    let dump = SceneDump::from_scene(&scene);
    let json = if args.compact {
        serde_json::to_string(&dump)?
    } else {
        serde_json::to_string_pretty(&dump)?
    };

    match args.output.as_deref() {
        Some(path) => std::fs::write(path, json)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
