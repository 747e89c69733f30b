use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "md2docs")]
#[command(about = "Compile Markdown into document batch-update requests")]
struct Cli {
    /// Input Markdown file, or `-` for stdin
    input: PathBuf,

    /// Output JSON file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Document index to insert at
    #[arg(long, default_value_t = 1)]
    index: usize,

    /// Tab to address every request to
    #[arg(long)]
    tab: Option<String>,

    /// Config file
    #[arg(long, default_value = "md2docs.toml")]
    config: PathBuf,

    /// Maximum requests per batch (overrides the config file)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Emit compact instead of pretty-printed JSON
    #[arg(long)]
    compact: bool,
}

fn read_input(path: &Path) -> io::Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        fs::read_to_string(path)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = md2docs::Config::load(&cli.config);
    if let Some(batch_size) = cli.batch_size {
        config.batch.max_requests = batch_size;
    }

    let markdown = match read_input(&cli.input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {}", cli.input.display(), e);
            std::process::exit(1);
        }
    };

    let batches = match md2docs::markdown_to_batches(
        &markdown,
        cli.index,
        cli.tab.as_deref(),
        Vec::new(),
        &config,
    ) {
        Ok(batches) => batches,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let json = if cli.compact {
        serde_json::to_string(&batches)
    } else {
        serde_json::to_string_pretty(&batches)
    };
    let json = match json {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error encoding requests: {}", e);
            std::process::exit(1);
        }
    };

    match cli.output {
        Some(output) => {
            if let Err(e) = fs::write(&output, json) {
                eprintln!("Error writing {}: {}", output.display(), e);
                std::process::exit(1);
            }
        }
        None => println!("{json}"),
    }
}
