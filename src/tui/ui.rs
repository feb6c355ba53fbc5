//! TUI rendering and layout

use super::app::{App, Modal, Section};
use super::constants::{layout, status_class_color, styles, text};
use super::helpers::{centered_rect, format_number, format_uptime, group_status_classes};
use crate::store::{CountItem, ErrorRates, Filter, Trend};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
};

/// Render the whole dashboard
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(layout::main_sections())
        .split(f.area());

    render_header(f, chunks[0], app);
    render_latency(f, chunks[1], app);
    render_status_codes(f, chunks[2], app);
    render_tables(f, chunks[3], app);
    render_footer(f, chunks[4], app);

    if app.show_help() {
        render_help(f);
    } else if let Some(modal) = app.modal() {
        render_modal(f, modal);
    }
}

fn label(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().fg(styles::LABEL))
}

fn value(text: String) -> Span<'static> {
    Span::styled(
        text,
        Style::default()
            .fg(styles::VALUE_PRIMARY)
            .add_modifier(Modifier::BOLD),
    )
}

fn trend_span(trend: Trend) -> Span<'static> {
    // Up means the error rate is rising, so it gets the alarming color
    let (arrow, color) = match trend {
        Trend::Up => (text::ARROW_UP, ratatui::style::Color::Red),
        Trend::Down => (text::ARROW_DOWN, ratatui::style::Color::Green),
        Trend::Stable => (text::ARROW_STABLE, styles::DIM),
    };
    Span::styled(arrow, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let data = app.data();
    let uptime = format_uptime(app.started_at().elapsed());
    let (trend, trend_5m) = app.trends();

    let mut spans = vec![
        Span::styled(
            "tailstat",
            Style::default()
                .fg(styles::VALUE_INFO)
                .add_modifier(Modifier::BOLD),
        ),
        label("  up "),
        value(uptime),
        label("  reqs "),
        value(format_number(data.stats.total_count)),
        label("  rate "),
        value(format!("{:.1}/s", data.current_rate)),
        label("  trend 60s "),
        trend_span(trend),
        label(" 5m "),
        trend_span(trend_5m),
    ];

    if app.stream_ended() {
        spans.push(Span::styled(
            "  [stream ended]",
            Style::default().fg(styles::VALUE_SECONDARY),
        ));
    }

    match app.filter() {
        Filter::Host(host) => spans.push(Span::styled(
            format!("  [host={host}] esc to clear"),
            Style::default().fg(styles::VALUE_SECONDARY),
        )),
        Filter::Ip(ip) => spans.push(Span::styled(
            format!("  [ip={ip}] esc to clear"),
            Style::default().fg(styles::VALUE_SECONDARY),
        )),
        Filter::None => {}
    }

    let header = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(styles::VALUE_INFO)),
        )
        .alignment(Alignment::Left);
    f.render_widget(header, area);
}

fn render_latency(f: &mut Frame, area: Rect, app: &App) {
    let data = app.data();
    let stats = &data.stats;

    let service_line = Line::from(vec![
        label("service ms  "),
        label("avg "),
        value(format!("{:>5}", stats.avg_service_ms)),
        label("  p50 "),
        value(format!("{:>5}", stats.p50_service_ms)),
        label("  p95 "),
        value(format!("{:>5}", stats.p95_service_ms)),
        label("  p99 "),
        value(format!("{:>5}", stats.p99_service_ms)),
        label("  max "),
        value(format!("{:>5}", stats.max_service_ms)),
    ]);

    let connect_line = Line::from(vec![
        label("connect ms  "),
        label("avg "),
        value(format!("{:>5}", stats.avg_connect_ms)),
        label("  max "),
        value(format!("{:>5}", stats.max_connect_ms)),
        label("      uniq "),
        Span::styled(
            format!(
                "{} hosts · {} ips · {} paths",
                data.unique.hosts, data.unique.ips, data.unique.paths
            ),
            Style::default().fg(styles::VALUE_INFO),
        ),
    ]);

    let block = Block::default().borders(Borders::ALL).title("Latency");
    let paragraph = Paragraph::new(vec![service_line, connect_line]).block(block);
    f.render_widget(paragraph, area);
}

fn render_status_codes(f: &mut Frame, area: Rect, app: &App) {
    let data = app.data();
    let mut lines = Vec::new();

    lines.push(Line::from(vec![
        label("errors  4xx "),
        Span::styled(
            format!("{:.1}%", data.error_rates.rate_4xx),
            Style::default().fg(status_class_color(4)),
        ),
        label("  5xx "),
        Span::styled(
            format!("{:.1}%", data.error_rates.rate_5xx),
            Style::default().fg(status_class_color(5)),
        ),
    ]));

    let classes = group_status_classes(&data.status_counts);
    if classes.is_empty() {
        lines.push(Line::from(Span::styled(
            "no data",
            Style::default().fg(styles::DIM),
        )));
    }
    for class in &classes {
        let mut spans = vec![
            Span::styled(
                format!("{}xx ", class.class),
                Style::default()
                    .fg(status_class_color(class.class))
                    .add_modifier(Modifier::BOLD),
            ),
            value(format!("{:>8}", format_number(class.total))),
            Span::styled(
                format!("  {:>5.1}%   ", class.percentage),
                Style::default().fg(styles::LABEL),
            ),
        ];
        for code in class.codes.iter().take(5) {
            spans.push(Span::styled(
                format!("{}×{}  ", code.status, format_number(code.count)),
                Style::default().fg(status_class_color(class.class)),
            ));
        }
        lines.push(Line::from(spans));
    }

    let block = Block::default().borders(Borders::ALL).title("Status Codes");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_tables(f: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(layout::table_columns())
        .split(area);

    let data = app.data();

    render_ranking(
        f,
        columns[0],
        "Hosts",
        &data.top_hosts,
        data.other_hosts,
        &data.host_error_rates,
        app.section() == Section::Hosts,
        Some(app.cursor(Section::Hosts)),
    );
    render_ranking(
        f,
        columns[1],
        "IPs",
        &data.top_ips,
        data.other_ips,
        &data.ip_error_rates,
        app.section() == Section::Ips,
        Some(app.cursor(Section::Ips)),
    );
    render_ranking(
        f,
        columns[2],
        "Paths",
        &data.top_paths,
        0,
        &data.path_error_rates,
        false,
        None,
    );
}

#[allow(clippy::too_many_arguments)]
fn render_ranking(
    f: &mut Frame,
    area: Rect,
    title: &str,
    items: &[CountItem],
    other: u64,
    error_rates: &std::collections::HashMap<String, ErrorRates>,
    active: bool,
    cursor: Option<usize>,
) {
    let mut rows: Vec<Row> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let rates = error_rates.get(&item.label).copied().unwrap_or_default();
            let mut row = Row::new(vec![
                item.label.clone(),
                format_number(item.count),
                format!("{:.0}%", rates.rate_4xx),
                format!("{:.0}%", rates.rate_5xx),
            ]);
            if active && cursor == Some(idx) {
                row = row.style(
                    Style::default()
                        .fg(styles::VALUE_INFO)
                        .add_modifier(Modifier::REVERSED),
                );
            }
            row
        })
        .collect();

    if other > 0 {
        rows.push(
            Row::new(vec![
                text::OTHER_LABEL.to_string(),
                format_number(other),
                String::new(),
                String::new(),
            ])
            .style(Style::default().fg(styles::DIM)),
        );
    }

    let border_color = if active {
        styles::BORDER_ACTIVE
    } else {
        styles::BORDER_NORMAL
    };

    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(9),
            Constraint::Length(5),
            Constraint::Length(5),
        ],
    )
    .header(Row::new(vec!["", "count", "4xx", "5xx"]).style(Style::default().fg(styles::LABEL)))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title),
    );

    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, area: Rect, _app: &App) {
    let hints = Paragraph::new(Line::from(Span::styled(
        "tab section  ↑↓ move  enter filter  esc clear  w whois  i ipinfo  ? help  q quit",
        Style::default().fg(styles::DIM),
    )))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    f.render_widget(hints, area);
}

fn render_modal(f: &mut Frame, modal: &Modal) {
    let area = centered_rect(70, 60, f.area());
    f.render_widget(Clear, area);

    let content = if modal.loading {
        "loading...".to_string()
    } else {
        modal.content.clone()
    };

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(styles::BORDER_ACTIVE))
            .title(modal.title.clone()),
    );
    f.render_widget(paragraph, area);
}

fn render_help(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, area);

    let lines = vec![
        Line::from("tab / shift-tab   switch between hosts and IPs"),
        Line::from("↑ / k, ↓ / j      move the cursor"),
        Line::from("enter             filter by the selected host or IP"),
        Line::from("esc               clear the filter / close overlays"),
        Line::from("w                 whois for the selected IP"),
        Line::from("i                 ipinfo.io for the selected IP"),
        Line::from("?                 toggle this help"),
        Line::from("q / ctrl-c        quit"),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(styles::BORDER_ACTIVE))
            .title("Help"),
    );
    f.render_widget(paragraph, area);
}
