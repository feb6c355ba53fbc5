//! Terminal user interface
//!
//! Full-screen dashboard over the aggregation store. The event loop
//! redraws on a fixed refresh interval, polls the keyboard without
//! blocking, and reacts to stream-end and finished-lookup messages from
//! background tasks.

mod app;
mod constants;
mod helpers;
mod lookup;
mod ui;

pub use app::{Action, App, Section};
pub use lookup::LookupOutcome;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs::File;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Setup the terminal for TUI rendering
///
/// Renders to `/dev/tty` directly: stdin is the log pipe and stdout may be
/// redirected, so the controlling terminal is the only safe target.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<File>>> {
    let mut tty = File::options()
        .read(true)
        .write(true)
        .open("/dev/tty")
        .map_err(|e| anyhow::anyhow!("failed to open /dev/tty: {e}"))?;

    enable_raw_mode()?;
    execute!(tty, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(tty);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

/// Restore the terminal to its original state
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<File>>) -> Result<()> {
    terminal.clear()?;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the TUI until the user quits or a shutdown signal arrives
///
/// # Arguments
/// * `app` - dashboard state
/// * `refresh` - redraw and query-cycle interval
/// * `shutdown_rx` - external shutdown signal (e.g. SIGTERM handler)
/// * `eof_rx` - stream-ended notice from the stdin reader
pub async fn run_tui(
    mut app: App,
    refresh: Duration,
    mut shutdown_rx: mpsc::Receiver<()>,
    mut eof_rx: mpsc::Receiver<()>,
) -> Result<()> {
    let mut terminal = setup_terminal()?;

    // Panic hook so a crash cannot leave the terminal in raw mode
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_app(&mut terminal, &mut app, refresh, &mut shutdown_rx, &mut eof_rx).await;

    restore_terminal(&mut terminal)?;
    result
}

/// Main TUI event loop
async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    refresh: Duration,
    shutdown_rx: &mut mpsc::Receiver<()>,
    eof_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    let mut interval = tokio::time::interval(refresh);
    // Lookup tasks report back here; the sender stays alive in this scope
    let (lookup_tx, mut lookup_rx) = mpsc::channel::<LookupOutcome>(8);

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        tokio::select! {
            _ = shutdown_rx.recv() => break,

            // A closed channel also means the producer is gone
            notice = eof_rx.recv(), if !app.stream_ended() => {
                let _ = notice;
                app.set_stream_ended();
            }

            Some(outcome) = lookup_rx.recv() => {
                app.apply_lookup(outcome);
            }

            _ = interval.tick() => {
                app.refresh();

                // Drain all pending key events without blocking
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        match app.handle_key(key.code, key.modifiers) {
                            Action::Quit => return Ok(()),
                            Action::Whois(ip) => lookup::spawn_whois(ip, lookup_tx.clone()),
                            Action::Ipinfo(ip) => lookup::spawn_ipinfo(ip, lookup_tx.clone()),
                            Action::None => {}
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
