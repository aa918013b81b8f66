use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use memsim::{AccessEvent, Config, Memory, TraceReader};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replays a memory reference trace through TLBs, a page table and split caches", long_about = None)]
struct Args {
    /// Path to the hierarchy configuration
    #[arg(short, long, default_value = "trace.config")]
    config: PathBuf,

    /// Trace to replay (reads stdin when omitted)
    trace: Option<PathBuf>,

    /// Only print the configuration and the final statistics
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let env = Env::default()
        .filter_or("MEMSIM_LOG", "warn")
        .write_style_or("MEMSIM_LOG_STYLE", "auto");
    env_logger::init_from_env(env);

    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("failed to load configuration {}", args.config.display()))?;
    info!("loaded configuration from {}", args.config.display());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", config)?;

    let mut memory = Memory::new(config)?;

    let input: Box<dyn BufRead> = match &args.trace {
        Some(path) => {
            info!("replaying trace {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("failed to open trace {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => {
            info!("replaying trace from stdin");
            Box::new(BufReader::new(io::stdin()))
        }
    };

    if !args.quiet {
        writeln!(out, "{}", AccessEvent::header(memory.config().virtual_addrs_enabled))?;
    }

    for reference in TraceReader::new(input) {
        let event = memory.access(reference?)?;
        if !args.quiet {
            writeln!(out, "{}", event)?;
        }
    }

    writeln!(out)?;
    write!(out, "{}", memory.stats().summary(memory.config()))?;
    Ok(())
}
