//! Command-line argument parsing
//!
//! Flags override config-file values, which override built-in defaults.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Statistics window from the command line
///
/// `None` means "all": keep everything, bounded only by the store's hard
/// capacity cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowArg(pub Option<Duration>);

fn parse_window(s: &str) -> Result<WindowArg, String> {
    if s.eq_ignore_ascii_case("all") {
        return Ok(WindowArg(None));
    }
    humantime::parse_duration(s)
        .map(|d| WindowArg(Some(d)))
        .map_err(|e| format!("invalid window '{s}': {e}"))
}

fn parse_refresh(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s).map_err(|e| format!("invalid refresh interval '{s}': {e}"))
}

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Real-time router access log dashboard",
    long_about = "Real-time router access log dashboard with interactive filtering.\n\n\
                  Pipe router logs in on stdin:\n\n    \
                  heroku logs --tail -a myapp | tailstat\n    \
                  tailstat < router.log"
)]
pub struct Args {
    /// Statistics window (e.g. 30s, 5m, 1h), or 'all' to keep everything
    #[arg(
        short,
        long,
        env = "TAILSTAT_WINDOW",
        default_value = "5m",
        value_parser = parse_window
    )]
    pub window: WindowArg,

    /// Rows per hosts/IPs/paths table (overrides config file)
    #[arg(short = 'n', long = "top", env = "TAILSTAT_TOP")]
    pub top: Option<usize>,

    /// Screen refresh interval (overrides config file)
    #[arg(short, long, env = "TAILSTAT_REFRESH", value_parser = parse_refresh)]
    pub refresh: Option<Duration>,

    /// Configuration file path
    #[arg(short, long, default_value = "tailstat.toml", env = "TAILSTAT_CONFIG")]
    pub config: PathBuf,

    /// Disable the TUI and log periodic summaries instead
    #[arg(long, default_value = "false")]
    pub headless: bool,
}

impl Args {
    /// Effective rows per table (flag over config file)
    #[must_use]
    pub fn effective_top(&self, config: &Config) -> usize {
        self.top.unwrap_or(config.display.top)
    }

    /// Effective refresh interval (flag over config file)
    #[must_use]
    pub fn effective_refresh(&self, config: &Config) -> Duration {
        self.refresh
            .unwrap_or(Duration::from_millis(config.display.refresh_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TOP_N;

    #[test]
    fn window_parses_durations() {
        assert_eq!(
            parse_window("5m").unwrap(),
            WindowArg(Some(Duration::from_secs(300)))
        );
        assert_eq!(
            parse_window("90s").unwrap(),
            WindowArg(Some(Duration::from_secs(90)))
        );
        assert_eq!(
            parse_window("1h").unwrap(),
            WindowArg(Some(Duration::from_secs(3600)))
        );
    }

    #[test]
    fn window_all_is_unbounded() {
        assert_eq!(parse_window("all").unwrap(), WindowArg(None));
        assert_eq!(parse_window("ALL").unwrap(), WindowArg(None));
    }

    #[test]
    fn window_rejects_garbage() {
        assert!(parse_window("5 parsecs").is_err());
        assert!(parse_window("").is_err());
    }

    #[test]
    fn defaults_from_parse() {
        let args = Args::parse_from(["tailstat"]);
        assert_eq!(args.window, WindowArg(Some(Duration::from_secs(300))));
        assert!(args.top.is_none());
        assert!(args.refresh.is_none());
        assert!(!args.headless);
        assert_eq!(args.config, PathBuf::from("tailstat.toml"));
    }

    #[test]
    fn flags_override_config_values() {
        let args = Args::parse_from(["tailstat", "-n", "30", "-r", "250ms"]);
        let config = Config::default();
        assert_eq!(args.effective_top(&config), 30);
        assert_eq!(args.effective_refresh(&config), Duration::from_millis(250));
    }

    #[test]
    fn config_values_apply_without_flags() {
        let args = Args::parse_from(["tailstat"]);
        let config = Config::default();
        assert_eq!(args.effective_top(&config), DEFAULT_TOP_N);
        assert_eq!(args.effective_refresh(&config), Duration::from_secs(1));
    }

    #[test]
    fn short_window_flag() {
        let args = Args::parse_from(["tailstat", "-w", "10m"]);
        assert_eq!(args.window, WindowArg(Some(Duration::from_secs(600))));
    }
}
