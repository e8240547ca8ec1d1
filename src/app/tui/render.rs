use std::collections::HashSet;

use chrono::Datelike;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, Padding, Paragraph, Row, Table, TableState, Wrap,
};

use super::super::calendar::MonthGrid;
use super::super::data::truncate;
use super::super::rankings::{RankedItem, SortKey, format_rank, format_score};
use super::{PendingDetail, Tab};

#[allow(clippy::too_many_arguments)]
pub(super) fn draw_tui(
    frame: &mut Frame,
    tab: Tab,
    sort_key: SortKey,
    favorites_only: bool,
    rows: &[RankedItem],
    grid: Option<&MonthGrid>,
    favorite_set: &HashSet<String>,
    status: &str,
    detail: Option<&PendingDetail>,
    table_state: &mut TableState,
) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], tab, sort_key, favorites_only, rows, grid);

    match tab {
        Tab::Rankings => draw_rankings(frame, chunks[1], rows, favorite_set, table_state),
        Tab::Calendar => draw_calendar(frame, chunks[1], grid),
    }

    let controls = match tab {
        Tab::Rankings => sort_selector_line(sort_key),
        Tab::Calendar => Line::from(Span::styled(
            "←/→ month   v favorites-only   Tab/1/2 switch view   q quit",
            Style::default().fg(Color::Rgb(185, 195, 210)),
        )),
    };
    let command_bar = Paragraph::new(controls)
        .alignment(Alignment::Center)
        .block(panel_block("Controls"));
    frame.render_widget(command_bar, chunks[2]);

    let status_widget = Paragraph::new(status.to_string())
        .style(status_style(status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[3]);

    if let Some(detail) = detail {
        let popup_area = popup_rect_for_text(frame.area(), &detail.message);
        render_popup_shadow(frame, popup_area);
        frame.render_widget(Clear, popup_area);
        let popup = Paragraph::new(detail.message.clone())
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false })
            .block(modal_block(detail.title.clone()));
        frame.render_widget(popup, popup_area);
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_header(
    frame: &mut Frame,
    area: Rect,
    tab: Tab,
    sort_key: SortKey,
    favorites_only: bool,
    rows: &[RankedItem],
    grid: Option<&MonthGrid>,
) {
    let context = match tab {
        Tab::Rankings => format!("{} shown   sort {}", rows.len(), sort_key.label()),
        Tab::Calendar => grid.map(|g| g.label()).unwrap_or_else(|| "-".to_string()),
    };
    let mut spans = vec![
        Span::styled(
            "ANIVIEW",
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            format!(" {} ", Tab::Rankings.label()),
            tab_pill_style(Tab::Rankings, tab),
        ),
        Span::styled(" ", Style::default()),
        Span::styled(
            format!(" {} ", Tab::Calendar.label()),
            tab_pill_style(Tab::Calendar, tab),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(context, Style::default().fg(Color::Rgb(185, 195, 210))),
    ];
    if favorites_only {
        spans.push(Span::styled("   ", Style::default()));
        spans.push(Span::styled(
            " ♥ ONLY ",
            Style::default()
                .bg(Color::Rgb(220, 170, 60))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    }
    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(panel_block("Dashboard"));
    frame.render_widget(header, area);
}

fn draw_rankings(
    frame: &mut Frame,
    area: Rect,
    rows: &[RankedItem],
    favorite_set: &HashSet<String>,
    table_state: &mut TableState,
) {
    let table_rows: Vec<Row> = rows
        .iter()
        .map(|entry| {
            let item = entry.item;
            let heart = if favorite_set.contains(&item.id) {
                "♥"
            } else {
                ""
            };
            Row::new(vec![
                Cell::from(entry.rank_text()),
                Cell::from(heart),
                Cell::from(truncate(&item.name, 48)),
                Cell::from(format_score(item.overall_score)),
                Cell::from(format_rank(item.anilist_rank)),
                Cell::from(format_score(item.mal_score)),
                Cell::from(format_rank(item.anitrendz_rank)),
                Cell::from(format_score(item.weekly_score)),
            ])
        })
        .collect();

    let table = Table::new(
        table_rows,
        [
            Constraint::Length(5),
            Constraint::Length(2),
            Constraint::Min(24),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(7),
        ],
    )
    .header(
        Row::new(vec![
            "Rank",
            "",
            "Title",
            "Overall",
            "AniList",
            "MAL",
            "AniTrendz",
            "Weekly",
        ])
        .style(
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
    )
    .block(panel_block("Rankings"))
    .row_highlight_style(
        Style::default()
            .bg(Color::Rgb(110, 170, 255))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, area, table_state);
}

fn draw_calendar(frame: &mut Frame, area: Rect, grid: Option<&MonthGrid>) {
    let Some(grid) = grid else {
        let fallback = Paragraph::new("Invalid calendar month.").block(panel_block("Calendar"));
        frame.render_widget(fallback, area);
        return;
    };

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(area);

    let weeks: Vec<Row> = grid
        .weeks
        .iter()
        .map(|week| {
            let cells: Vec<Cell> = week
                .iter()
                .map(|cell| match cell {
                    Some(cell) => {
                        let day_style = if cell.is_today {
                            Style::default()
                                .fg(Color::Rgb(220, 170, 60))
                                .add_modifier(Modifier::BOLD)
                        } else if cell.is_weekend {
                            Style::default().fg(Color::Rgb(150, 160, 175))
                        } else {
                            Style::default().fg(Color::Rgb(230, 235, 242))
                        };
                        let mut lines = vec![Line::from(Span::styled(
                            cell.date.day().to_string(),
                            day_style,
                        ))];
                        for item in cell.items.iter().take(2) {
                            lines.push(Line::from(Span::styled(
                                truncate(&item.name, 14),
                                Style::default().fg(Color::Rgb(130, 190, 255)),
                            )));
                        }
                        if cell.items.len() > 2 {
                            lines.push(Line::from(Span::styled(
                                format!("+{} more", cell.items.len() - 2),
                                Style::default().fg(Color::Rgb(150, 160, 175)),
                            )));
                        }
                        Cell::from(Text::from(lines))
                    }
                    None => Cell::from(""),
                })
                .collect();
            Row::new(cells).height(4)
        })
        .collect();

    let calendar_table = Table::new(weeks, [Constraint::Ratio(1, 7); 7])
        .header(
            Row::new(vec!["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]).style(
                Style::default()
                    .fg(Color::Rgb(110, 170, 255))
                    .add_modifier(Modifier::BOLD),
            ),
        )
        .block(panel_block("Calendar"));
    frame.render_widget(calendar_table, body_chunks[0]);

    let mut airing_lines = Vec::new();
    for week in &grid.weeks {
        for cell in week.iter().flatten() {
            for item in &cell.items {
                airing_lines.push(format!("{}  {}", cell.date, truncate(&item.name, 26)));
            }
        }
    }
    let airing_text = if airing_lines.is_empty() {
        "Nothing airing this month.".to_string()
    } else {
        airing_lines.join("\n")
    };
    let airing = Paragraph::new(airing_text)
        .style(Style::default().fg(Color::Rgb(230, 230, 230)))
        .block(panel_block("Airing"));
    frame.render_widget(airing, body_chunks[1]);
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn modal_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(
            Style::default()
                .fg(Color::Rgb(160, 190, 235))
                .add_modifier(Modifier::BOLD),
        )
        .title(title)
        .padding(Padding::new(2, 2, 1, 1))
}

fn pill_active() -> Style {
    Style::default()
        .bg(Color::Rgb(110, 170, 255))
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn pill_inactive() -> Style {
    Style::default()
        .bg(Color::Rgb(72, 82, 96))
        .fg(Color::Rgb(230, 235, 242))
}

fn tab_pill_style(tab: Tab, current: Tab) -> Style {
    if tab == current { pill_active() } else { pill_inactive() }
}

fn sort_pill_style(key: SortKey, current: SortKey) -> Style {
    if key == current { pill_active() } else { pill_inactive() }
}

fn sort_selector_line(current: SortKey) -> Line<'static> {
    let mut spans = Vec::new();
    for key in SortKey::ALL {
        spans.push(Span::styled(
            format!(" {} ", key.label()),
            sort_pill_style(key, current),
        ));
        spans.push(Span::styled(" ", Style::default()));
    }
    spans.push(Span::styled(
        "  ↑/↓ select  ←/→ sort  f favorite  v favorites-only  Enter details  q quit",
        Style::default().fg(Color::Rgb(185, 195, 210)),
    ));
    Line::from(spans)
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}

fn centered_fixed_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width.max(1));
    let clamped_height = height.min(area.height.max(1));
    let x = area.x + area.width.saturating_sub(clamped_width) / 2;
    let y = area.y + area.height.saturating_sub(clamped_height) / 2;
    Rect::new(x, y, clamped_width, clamped_height)
}

fn render_popup_shadow(frame: &mut Frame, popup_area: Rect) {
    let area = frame.area();
    let shadow = Rect::new(
        (popup_area.x + 1).min(area.x + area.width.saturating_sub(1)),
        (popup_area.y + 1).min(area.y + area.height.saturating_sub(1)),
        popup_area.width.saturating_sub(1),
        popup_area.height.saturating_sub(1),
    );
    if shadow.width == 0 || shadow.height == 0 {
        return;
    }
    let shadow_block = Block::default().style(Style::default().bg(Color::Rgb(14, 16, 24)));
    frame.render_widget(shadow_block, shadow);
}

fn popup_rect_for_text(area: Rect, text: &str) -> Rect {
    let max_line_width = text
        .lines()
        .map(|line| line.chars().count() as u16)
        .max()
        .unwrap_or(0);
    let line_count = text.lines().count() as u16;

    let available_width = area.width.saturating_sub(2).max(1);
    let min_width = 48.min(available_width);
    let max_width = 76.min(available_width);
    let desired_width = max_line_width.saturating_add(8);
    let width = desired_width.clamp(min_width, max_width);

    let available_height = area.height.saturating_sub(2).max(1);
    let min_height = 10.min(available_height);
    let max_height = 22.min(available_height);
    let desired_height = line_count.saturating_add(4);
    let height = desired_height.clamp(min_height, max_height);

    centered_fixed_rect(width, height, area)
}
