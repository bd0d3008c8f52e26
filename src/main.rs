use anyhow::{Context, Result};
use clap::Parser;

use coordgeom::app::{Cli, run};
use coordgeom::config::RuntimeConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("CLI: Failed to initialize thread pool")?;
    }

    let runtime = RuntimeConfig {
        threads: cli.threads,
    };

    let start = std::time::Instant::now();
    let count = run(&cli, &runtime)?;

    if !cli.preview {
        let elapsed = start.elapsed();
        tracing::info!(
            "Done! Written {} features in {:.2}s",
            count,
            elapsed.as_secs_f64()
        );
    }

    Ok(())
}
