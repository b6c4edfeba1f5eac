use std::process::ExitCode;
use std::sync::Arc;

use filesrv::config::{Config, ServerContext};
use filesrv::error::StartupError;
use filesrv::server::shutdown::{start_signal_handler, SignalHandler};
use filesrv::{logger, server};

fn main() -> ExitCode {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "filesrv".to_string());
    let Some(config_path) = args.next() else {
        eprintln!("Usage: {program} <config-file>");
        return ExitCode::FAILURE;
    };

    match run(&config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[FATAL] {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: &str) -> Result<(), StartupError> {
    let cfg = Config::load_from(config_path)?;
    cfg.validate()?;
    logger::init(&cfg).map_err(StartupError::Logging)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build().map_err(StartupError::Runtime)?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), StartupError> {
    let http_addr = cfg.http_addr()?;
    let https_addr = cfg.https_addr()?;

    let http_listener = server::create_listener(http_addr).map_err(|source| StartupError::Bind {
        addr: http_addr,
        source,
    })?;

    let tls_listener = server::setup_https_listener(https_addr, &cfg.tls);

    let bound_https_addr = tls_listener
        .as_ref()
        .and_then(|(l, _)| l.local_addr().ok());
    logger::log_server_start(&http_addr, bound_https_addr.as_ref(), &cfg);

    let state = Arc::new(ServerContext::new(cfg));
    let signal = Arc::new(SignalHandler::new());
    start_signal_handler(Arc::clone(&signal));

    server::run(state, http_listener, tls_listener, signal).await;
    Ok(())
}
