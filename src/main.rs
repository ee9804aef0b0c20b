use clap::Parser;
use devproxy::{config, logger, server};

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = cli::Cli::parse();
    let cfg = config::Config::load_from(&args.config, &args.overrides())?;
    logger::init(&cfg)?;

    // Multi-threaded runtime; each connection gets its own task
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_info(&format!("Using {workers} worker threads"));
    } else {
        logger::log_debug("Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(server::run(cfg))?;
    Ok(())
}
