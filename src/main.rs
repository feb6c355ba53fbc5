use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use tailstat::args::{Args, WindowArg};
use tailstat::store::Store;
use tailstat::tui;
use tailstat::{config, logging, parser};

fn main() -> Result<()> {
    let args = Args::parse();

    // Stdin carries the log stream; a TTY there means nothing was piped in
    if std::io::stdin().is_terminal() {
        eprintln!("error: tailstat requires log input via stdin");
        eprintln!();
        eprintln!("usage: heroku logs --tail -a myapp | tailstat");
        eprintln!("   or: tailstat < router.log");
        std::process::exit(1);
    }

    let _guard = logging::init_logging(args.headless);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    let (config, source) = config::load_config_with_fallback(&args.config)?;
    info!("loaded configuration from {}", source.description());

    let top_n = args.effective_top(&config);
    let refresh = args.effective_refresh(&config);
    let WindowArg(window) = args.window;
    match window {
        Some(window) => info!(?window, "statistics window"),
        None => info!("unbounded statistics window (subject to capacity cap)"),
    }

    let store = Arc::new(Store::with_path_filter(window, config.path_filter()));

    let (eof_tx, eof_rx) = mpsc::channel::<()>(1);
    let reader = tokio::spawn(read_stdin(store.clone(), eof_tx));

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    spawn_signal_handler(shutdown_tx);

    let result = if args.headless {
        run_headless(store, refresh, shutdown_rx, eof_rx).await
    } else {
        let app = tui::App::new(store, top_n);
        tui::run_tui(app, refresh, shutdown_rx, eof_rx).await
    };

    reader.abort();
    result
}

/// Read router log lines from stdin into the store until EOF
async fn read_stdin(store: Arc<Store>, eof_tx: mpsc::Sender<()>) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut parsed = 0u64;
    let mut skipped = 0u64;

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parser::parse(&line) {
                Some(entry) => {
                    store.add(entry);
                    parsed += 1;
                }
                None => skipped += 1,
            },
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read from stdin");
                break;
            }
        }
    }

    info!(parsed, skipped, "input stream ended");
    let _ = eof_tx.send(()).await;
}

/// Forward Ctrl-C / SIGTERM as a shutdown message
fn spawn_signal_handler(shutdown_tx: mpsc::Sender<()>) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut sigterm =
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        warn!(error = %e, "failed to install SIGTERM handler");
                        let _ = tokio::signal::ctrl_c().await;
                        let _ = shutdown_tx.send(()).await;
                        return;
                    }
                };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        let _ = shutdown_tx.send(()).await;
    });
}

/// Log one summary line per refresh tick instead of drawing a dashboard
///
/// Exits after the final summary once the input stream ends, which makes
/// `tailstat --headless < router.log` usable as a batch report.
async fn run_headless(
    store: Arc<Store>,
    refresh: std::time::Duration,
    mut shutdown_rx: mpsc::Receiver<()>,
    mut eof_rx: mpsc::Receiver<()>,
) -> Result<()> {
    let mut interval = tokio::time::interval(refresh);
    let mut stream_ended = false;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,

            notice = eof_rx.recv(), if !stream_ended => {
                let _ = notice;
                stream_ended = true;
            }

            _ = interval.tick() => {
                log_summary(&store);
                if stream_ended {
                    break;
                }
            }
        }
    }

    log_summary(&store);
    Ok(())
}

fn log_summary(store: &Store) {
    store.prune();
    let stats = store.stats();
    let rates = store.error_rates();
    let unique = store.unique_counts();
    info!(
        total = stats.total_count,
        avg_ms = stats.avg_service_ms,
        p50_ms = stats.p50_service_ms,
        p95_ms = stats.p95_service_ms,
        p99_ms = stats.p99_service_ms,
        rate_4xx = format!("{:.1}%", rates.rate_4xx),
        rate_5xx = format!("{:.1}%", rates.rate_5xx),
        hosts = unique.hosts,
        ips = unique.ips,
        "summary"
    );
}
