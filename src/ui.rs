use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use drafter_core::ControlView;

use crate::app::App;

const INPUT_HEIGHT: u16 = 6;

/// Split text into rows of at most `width` characters, honoring newlines.
/// Hard wrapping keeps the cursor position a simple function of its index.
fn hard_wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            rows.push(String::new());
            continue;
        }
        for chunk in chars.chunks(width) {
            rows.push(chunk.iter().collect());
        }
    }
    rows
}

/// Row and column of the cursor inside `hard_wrap(text, width)`.
fn cursor_row_col(text: &str, cursor: usize, width: usize) -> (usize, usize) {
    let width = width.max(1);
    let mut row = 0;
    let mut col = 0;
    for c in text.chars().take(cursor) {
        if c == '\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
            if col == width {
                row += 1;
                col = 0;
            }
        }
    }
    (row, col)
}

pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();
    let view = app.view();

    let [header_area, tabs_area, input_area, status_area, draft_area, footer_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(app, frame, header_area);
    render_tabs(app, frame, tabs_area);
    render_context_input(app, &view, frame, input_area);
    render_status(app, &view, frame, status_area);
    if view.result_visible {
        render_draft(app, &view, frame, draft_area);
    }
    render_footer(&view, frame, footer_area);

    if let Some(notice) = &app.notice {
        render_notice(notice, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Drafter ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" {} ", app.provider_label),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let tabs = app.tabs.tabs();
    let active = app.active_tab().map(|tab| tab.id);

    let line = if tabs.is_empty() {
        Line::from(Span::styled(
            " No tabs open. Add pages to the config file. ",
            Style::default().fg(Color::Yellow),
        ))
    } else {
        let mut spans = vec![Span::raw(" ")];
        for tab in &tabs {
            let style = if Some(tab.id) == active {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(format!(" {} ", tab.title), style));
            spans.push(Span::raw(" "));
        }
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_context_input(app: &App, view: &ControlView, frame: &mut Frame, area: Rect) {
    let border = if view.generate_enabled {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(" Context: who is this and what do you want? ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let height = inner.height as usize;
    let rows = hard_wrap(&app.context_input, width);
    let (cursor_row, cursor_col) = cursor_row_col(&app.context_input, app.context_cursor, width);

    // Keep the cursor row on screen
    let first_row = (cursor_row + 1).saturating_sub(height.max(1));
    let lines: Vec<Line> = rows
        .into_iter()
        .skip(first_row)
        .take(height)
        .map(Line::from)
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);

    if app.notice.is_none() && inner.width > 0 && inner.height > 0 {
        frame.set_cursor_position(Position::new(
            inner.x + cursor_col.min(width.saturating_sub(1)) as u16,
            inner.y + (cursor_row - first_row) as u16,
        ));
    }
}

fn render_status(app: &App, view: &ControlView, frame: &mut Frame, area: Rect) {
    let line = if view.loading_visible {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Line::from(Span::styled(
            format!(" Generating draft{}", dots),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))
    } else {
        Line::from(vec![
            Span::styled(" Enter ", Style::default().bg(Color::Blue).fg(Color::White)),
            Span::raw(" generate email"),
        ])
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_draft(app: &App, view: &ControlView, frame: &mut Frame, area: Rect) {
    let (title, color) = if view.draft_is_error {
        (" Error ", Color::Red)
    } else {
        (" Draft ", Color::Green)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
        .title_bottom(Line::from(vec![
            Span::raw(" "),
            Span::styled(
                format!(" ^Y {} ", view.copy.label()),
                Style::default().fg(Color::White).bg(Color::DarkGray),
            ),
            Span::raw(" "),
            Span::styled(
                " ^S Send ",
                Style::default().fg(Color::White).bg(Color::DarkGray),
            ),
            Span::raw(" "),
            Span::styled(
                " ^R Improve ",
                Style::default().fg(Color::White).bg(Color::DarkGray),
            ),
            Span::raw(" "),
        ]));

    let style = if view.draft_is_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    let draft = Paragraph::new(view.draft_text.as_str())
        .style(style)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.draft_scroll, 0));
    frame.render_widget(draft, area);
}

fn render_footer(view: &ControlView, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::Gray);

    let mut hints = vec![
        Span::styled(" Tab ", key_style),
        Span::styled(" switch tab ", label_style),
        Span::styled(" Alt+Enter ", key_style),
        Span::styled(" newline ", label_style),
        Span::styled(" ^U ", key_style),
        Span::styled(" clear ", label_style),
    ];
    if view.result_visible {
        hints.extend([
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
        ]);
    }
    hints.extend([
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn render_notice(notice: &str, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = (notice.chars().count() as u16 + 6)
        .max(30)
        .min(area.width.saturating_sub(4));
    let popup_height = 5.min(area.height);

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Notice (Enter to dismiss) ");

    let text = Paragraph::new(vec![Line::raw(""), Line::raw(notice.to_string()).centered()])
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(text, popup_area);
}
