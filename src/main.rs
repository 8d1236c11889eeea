use std::sync::Arc;

use clap::Parser;
use log::info;

use sentinel_core::config::Config;
use sentinel_core::runtime::Runtime;

/// CLI flags. Everything else lives in the TOML config file or the
/// environment — this only covers what an operator needs to override
/// at process-start time, before any config has been read.
#[derive(Parser, Debug)]
#[command(name = "sentinel-core", about = "Real-time anti-nuke detection and enforcement engine")]
struct Cli {
    /// Overrides ANTINUKE_CONFIG for this run.
    #[arg(long, env = "ANTINUKE_CONFIG")]
    config: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Some(path) = cli.config {
        // SAFETY: single-threaded at this point, before any worker
        // thread reads the environment.
        unsafe {
            std::env::set_var("ANTINUKE_CONFIG", path);
        }
    }

    let config = Config::load();
    info!(target: "antinuke_audit", "starting anti-nuke runtime");

    let runtime = Arc::new(Runtime::new(config)?);
    let handles = runtime.start()?;

    let shutdown_runtime = runtime.clone();
    ctrlc_shutdown(move || {
        info!(target: "antinuke_audit", "shutdown signal received, draining pipeline");
        shutdown_runtime.shutdown();
    })?;

    for handle in handles {
        if handle.join().is_err() {
            log::error!(target: "antinuke_audit", "a pipeline thread panicked");
        }
    }

    info!(target: "antinuke_audit", "anti-nuke runtime stopped");
    Ok(())
}

/// Installs a Ctrl-C / SIGTERM handler that calls `on_signal` once.
/// Kept as a thin wrapper so `main` doesn't need to know which signal
/// crate is behind it.
fn ctrlc_shutdown(on_signal: impl Fn() + Send + 'static) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    std::thread::spawn(move || {
        rt.block_on(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_signal();
            }
        });
    });
    Ok(())
}
