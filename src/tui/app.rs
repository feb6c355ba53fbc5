//! TUI application state and logic

use super::constants::{CURRENT_RATE_WINDOW, TREND_WINDOW, TREND_WINDOW_5M};
use super::lookup::LookupOutcome;
use crate::store::{
    CountItem, ErrorRates, Filter, Stats, StatusCountItem, Store, Trend, TrendReading,
    UniqueCounts,
};
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Diff magnitude below which a held trend reverts to stable
///
/// Entering Up/Down requires the store's significance threshold; exiting
/// uses this smaller one so a rate oscillating near the boundary does not
/// flicker the indicator.
const TREND_EXIT_THRESHOLD: f64 = 0.01;

/// Navigable dashboard section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Hosts,
    Ips,
}

/// Modal overlay content (lookup results)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub title: String,
    pub content: String,
    pub loading: bool,
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    /// Run a whois lookup for the given IP
    Whois(String),
    /// Run an ipinfo.io lookup for the given IP
    Ipinfo(String),
}

/// Cached query results for one refresh cycle
///
/// Everything the renderer needs, pulled from the store in a single query
/// cycle so a frame never mixes data from different windows.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub stats: Stats,
    pub status_counts: Vec<StatusCountItem>,
    pub top_hosts: Vec<CountItem>,
    pub top_ips: Vec<CountItem>,
    pub top_paths: Vec<CountItem>,
    pub other_hosts: u64,
    pub other_ips: u64,
    pub error_rates: ErrorRates,
    pub unique: UniqueCounts,
    pub current_rate: f64,
    pub host_error_rates: HashMap<String, ErrorRates>,
    pub ip_error_rates: HashMap<String, ErrorRates>,
    pub path_error_rates: HashMap<String, ErrorRates>,
}

/// TUI application state
pub struct App {
    store: Arc<Store>,
    top_n: usize,
    started_at: Instant,

    section: Section,
    host_cursor: usize,
    ip_cursor: usize,
    filter: Filter,
    stream_ended: bool,
    show_help: bool,
    modal: Option<Modal>,

    data: DashboardData,
    trend: Trend,
    trend_5m: Trend,
}

impl App {
    #[must_use]
    pub fn new(store: Arc<Store>, top_n: usize) -> Self {
        let mut app = Self {
            store,
            top_n,
            started_at: Instant::now(),
            section: Section::Hosts,
            host_cursor: 0,
            ip_cursor: 0,
            filter: Filter::None,
            stream_ended: false,
            show_help: false,
            modal: None,
            data: DashboardData::default(),
            trend: Trend::Stable,
            trend_5m: Trend::Stable,
        };
        app.refresh();
        app
    }

    /// Prune the store and pull a fresh query cycle
    pub fn refresh(&mut self) {
        self.store.prune();

        let mut data = DashboardData {
            stats: self.store.stats(),
            status_counts: self.store.status_counts(&self.filter),
            top_hosts: self.store.top_hosts(self.top_n, &self.filter),
            top_ips: self.store.top_ips(self.top_n, &self.filter),
            error_rates: self.store.error_rates(),
            unique: self.store.unique_counts(),
            current_rate: self.store.current_rate(CURRENT_RATE_WINDOW),
            ..DashboardData::default()
        };

        data.top_paths = if self.filter.is_none() {
            self.store.all_paths(self.top_n)
        } else {
            self.store.top_paths(self.top_n, &self.filter)
        };

        // The "(other)" bucket only makes sense for an unfiltered ranking
        if !matches!(self.filter, Filter::Ip(_)) {
            data.other_hosts = self.store.other_hosts(&data.top_hosts);
        }
        if !matches!(self.filter, Filter::Host(_)) {
            data.other_ips = self.store.other_ips(&data.top_ips);
        }

        for host in &data.top_hosts {
            data.host_error_rates.insert(
                host.label.clone(),
                self.store.error_rates_for_host(&host.label),
            );
        }
        for ip in &data.top_ips {
            data.ip_error_rates
                .insert(ip.label.clone(), self.store.error_rates_for_ip(&ip.label));
        }
        for path in &data.top_paths {
            data.path_error_rates.insert(
                path.label.clone(),
                self.store.error_rates_for_path(&path.label),
            );
        }

        self.trend = apply_hysteresis(self.trend, self.store.trend_with_diff(TREND_WINDOW));
        self.trend_5m =
            apply_hysteresis(self.trend_5m, self.store.trend_with_diff(TREND_WINDOW_5M));

        self.host_cursor = self.host_cursor.min(data.top_hosts.len().saturating_sub(1));
        self.ip_cursor = self.ip_cursor.min(data.top_ips.len().saturating_sub(1));

        self.data = data;
    }

    /// Handle one key press; returns what the event loop should do
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Action {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        if self.modal.is_some() {
            if matches!(code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter) {
                self.modal = None;
            }
            return Action::None;
        }

        if self.show_help {
            if matches!(code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return Action::None;
        }

        match code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('?') => {
                self.show_help = true;
                Action::None
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.section = match self.section {
                    Section::Hosts => Section::Ips,
                    Section::Ips => Section::Hosts,
                };
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_cursor(-1);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_cursor(1);
                Action::None
            }
            KeyCode::Enter => {
                self.apply_filter();
                Action::None
            }
            KeyCode::Esc => {
                if !self.filter.is_none() {
                    self.filter = Filter::None;
                    self.refresh();
                }
                Action::None
            }
            KeyCode::Char('w') => self
                .selected_ip()
                .map_or(Action::None, |ip| {
                    self.open_loading_modal(format!("whois {ip}"));
                    Action::Whois(ip)
                }),
            KeyCode::Char('i') => self
                .selected_ip()
                .map_or(Action::None, |ip| {
                    self.open_loading_modal(format!("ipinfo {ip}"));
                    Action::Ipinfo(ip)
                }),
            _ => Action::None,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let (cursor, len) = match self.section {
            Section::Hosts => (&mut self.host_cursor, self.data.top_hosts.len()),
            Section::Ips => (&mut self.ip_cursor, self.data.top_ips.len()),
        };
        if len == 0 {
            return;
        }
        let next = cursor.saturating_add_signed(delta);
        *cursor = next.min(len - 1);
    }

    /// Drill down into the label under the cursor
    fn apply_filter(&mut self) {
        let filter = match self.section {
            Section::Hosts => self
                .data
                .top_hosts
                .get(self.host_cursor)
                .map(|item| Filter::Host(item.label.clone())),
            Section::Ips => self
                .data
                .top_ips
                .get(self.ip_cursor)
                .map(|item| Filter::Ip(item.label.clone())),
        };
        if let Some(filter) = filter {
            self.filter = filter;
            self.refresh();
        }
    }

    /// IP under the cursor, when the IPs section is active
    fn selected_ip(&self) -> Option<String> {
        match self.section {
            Section::Ips => self
                .data
                .top_ips
                .get(self.ip_cursor)
                .map(|item| item.label.clone()),
            Section::Hosts => None,
        }
    }

    fn open_loading_modal(&mut self, title: String) {
        self.modal = Some(Modal {
            title,
            content: String::new(),
            loading: true,
        });
    }

    /// Fill the open modal with a finished lookup result
    pub fn apply_lookup(&mut self, outcome: LookupOutcome) {
        if let Some(modal) = &mut self.modal {
            modal.loading = false;
            modal.content = match outcome.result {
                Ok(content) => content,
                Err(err) => format!("lookup failed: {err}"),
            };
        }
    }

    pub fn set_stream_ended(&mut self) {
        self.stream_ended = true;
    }

    // Accessors for the renderer

    #[must_use]
    pub fn data(&self) -> &DashboardData {
        &self.data
    }

    #[must_use]
    pub fn section(&self) -> Section {
        self.section
    }

    #[must_use]
    pub fn cursor(&self, section: Section) -> usize {
        match section {
            Section::Hosts => self.host_cursor,
            Section::Ips => self.ip_cursor,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    #[must_use]
    pub fn trends(&self) -> (Trend, Trend) {
        (self.trend, self.trend_5m)
    }

    #[must_use]
    pub fn stream_ended(&self) -> bool {
        self.stream_ended
    }

    #[must_use]
    pub fn show_help(&self) -> bool {
        self.show_help
    }

    #[must_use]
    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// Sticky trend: follow any clear signal, but only revert to stable once
/// the diff drops inside the exit threshold
fn apply_hysteresis(current: Trend, reading: TrendReading) -> Trend {
    if reading.direction != Trend::Stable {
        return reading.direction;
    }
    match current {
        Trend::Up if reading.diff > TREND_EXIT_THRESHOLD => Trend::Up,
        Trend::Down if reading.diff < -TREND_EXIT_THRESHOLD => Trend::Down,
        _ => Trend::Stable,
    }
}
