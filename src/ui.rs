use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use geoint_agent_core::{ChatMessage, ChatRole, ChatView};

use crate::app::App;
use crate::router::Page;

/// Render `**bold**` runs in agent replies; everything else is literal
fn parse_markdown_line(text: &str) -> Line<'static> {
    let spans: Vec<Span<'static>> = text
        .split("**")
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            // Odd segments sit between a pair of markers
            if i % 2 == 1 && text.matches("**").count() >= i + 1 {
                Span::styled(part.to_string(), Style::default().add_modifier(Modifier::BOLD))
            } else {
                Span::raw(part.to_string())
            }
        })
        .collect();
    Line::from(spans)
}

pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();
    let chat = app.dispatcher.snapshot();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    if chat.is_open && !chat.is_minimized {
        let [page_area, chat_area] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(body_area);
        render_page(app, frame, page_area);
        render_chat(app, &chat, frame, chat_area);
    } else {
        render_page(app, frame, body_area);
    }

    render_footer(app, &chat, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let current = app.page();
    let mut spans = vec![
        Span::styled(" GEOINT Dashboard ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    for (i, page) in Page::all().into_iter().enumerate() {
        let label = format!(" F{} {} ", i + 1, page.display_name());
        let style = if page == current {
            Style::default().bg(Color::Cyan).fg(Color::Black)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(label, style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_page(app: &App, frame: &mut Frame, area: Rect) {
    let location = app.router.location();
    let title = if location.query.is_empty() {
        format!(" {} ", location.path)
    } else {
        let query: Vec<String> = location
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!(" {}?{} ", location.path, query.join("&"))
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);

    if app.page() == Page::Geoint {
        render_geoint(app, frame, block, area);
        return;
    }

    let text = Text::from(vec![
        Line::from(Span::styled(
            app.page().display_name(),
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::default(),
        Line::from(Span::styled(
            "This page is served by the web dashboard. Ask the assistant to take you somewhere.",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    frame.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), area);
}

fn render_geoint(app: &App, frame: &mut Frame, block: Block, area: Rect) {
    let state = app.workspace.state();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [keywords_area, status_area, activity_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(4),
        Constraint::Length(10),
    ])
    .areas(inner);

    let items: Vec<ListItem> = state
        .keywords
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let selected = state.selected.as_ref().map(|s| s.id.as_str()) == Some(entry.id.as_str());
            let marker = if selected { "●" } else { " " };
            let mut style = Style::default();
            if i == app.keyword_cursor {
                style = style.bg(Color::DarkGray);
            }
            if selected {
                style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
            }
            ListItem::new(format!(" {} {}", marker, entry.keyword)).style(style)
        })
        .collect();
    let keywords = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled(
            " No keywords configured",
            Style::default().fg(Color::DarkGray),
        ))])
    } else {
        List::new(items)
    };
    frame.render_widget(
        keywords.block(Block::default().borders(Borders::BOTTOM).title(" Keywords (j/k, Enter) ")),
        keywords_area,
    );

    let budget = state
        .budget_amount
        .map(|amount| format!("{:.0}", amount))
        .unwrap_or_else(|| "not set".to_string());
    let map = match (&state.focused_province, &state.district_view) {
        (_, Some(province)) => format!("{} (districts)", province),
        (Some(province), None) => province.clone(),
        (None, None) => "Country view".to_string(),
    };
    let status = Text::from(vec![
        Line::from(vec![Span::styled("Budget: ", Style::default().fg(Color::Yellow)), Span::raw(budget)]),
        Line::from(vec![Span::styled("Map:    ", Style::default().fg(Color::Yellow)), Span::raw(map)]),
    ]);
    frame.render_widget(Paragraph::new(status), status_area);

    let activity: Vec<ListItem> = state
        .activity
        .iter()
        .map(|entry| ListItem::new(entry.as_str()))
        .collect();
    frame.render_widget(
        List::new(activity).block(Block::default().borders(Borders::TOP).title(" Activity ")),
        activity_area,
    );
}

fn message_lines(msg: &ChatMessage, lines: &mut Vec<Line<'static>>) {
    match msg.role {
        ChatRole::User => {
            lines.push(Line::from(Span::styled(
                "You:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(msg.content.clone()));
        }
        ChatRole::Assistant => {
            lines.push(Line::from(Span::styled(
                "Assistant:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            for line in msg.content.lines() {
                lines.push(parse_markdown_line(line));
            }
            for result in msg.action_results.iter().flatten() {
                let (mark, color) = if result.success {
                    ("✓", Color::Green)
                } else {
                    ("✗", Color::Red)
                };
                let detail = match &result.message {
                    Some(message) => format!(" {} {}", mark, message),
                    None => format!(" {} {}", mark, result.tool),
                };
                lines.push(Line::from(Span::styled(detail, Style::default().fg(color))));
            }
        }
    }
    lines.push(Line::default());
}

fn render_chat(app: &App, chat: &ChatView, frame: &mut Frame, area: Rect) {
    let [messages_area, actions_area, input_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(if chat.suggestions.is_empty() { 3 } else { 4 }),
        Constraint::Length(3),
    ])
    .areas(area);

    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in &chat.messages {
        message_lines(msg, &mut lines);
    }
    if chat.is_loading {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat(app.animation_frame + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // Pin to the bottom unless the user scrolled back
    let visible = messages_area.height.saturating_sub(2);
    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let scroll = total.saturating_sub(visible).saturating_sub(app.chat_scroll);

    let messages_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Assistant ({} to close, Esc to minimize) ", app.toggle_chord));
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(messages_block)
            .wrap(Wrap { trim: true })
            .scroll((scroll, 0)),
        messages_area,
    );

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let mut action_spans = Vec::new();
    for (i, action) in app.quick_actions().iter().take(4).enumerate() {
        action_spans.push(Span::styled(format!(" M-{} ", i + 1), key_style));
        let label = match action.icon {
            Some(icon) => format!(" {} {} ", icon, action.label),
            None => format!(" {} ", action.label),
        };
        action_spans.push(Span::raw(label));
    }
    let mut action_lines = vec![Line::from(action_spans)];
    if !chat.suggestions.is_empty() {
        let mut suggestion_spans = Vec::new();
        for (i, suggestion) in chat.suggestions.iter().take(5).enumerate() {
            suggestion_spans.push(Span::styled(format!(" M-{} ", i + 5), key_style));
            suggestion_spans.push(Span::styled(
                format!(" {} ", suggestion),
                Style::default().fg(Color::Magenta),
            ));
        }
        action_lines.push(Line::from(suggestion_spans));
    }
    frame.render_widget(
        Paragraph::new(action_lines)
            .block(Block::default().borders(Borders::TOP).title(" Quick actions "))
            .wrap(Wrap { trim: true }),
        actions_area,
    );

    let input_color = if chat.is_loading { Color::DarkGray } else { Color::Yellow };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_color))
        .title(" Message ");

    // Horizontal scroll keeps the cursor visible
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else {
        app.cursor.saturating_sub(inner_width.saturating_sub(1))
    };
    let visible_input: String = app.input.chars().skip(scroll_offset).take(inner_width).collect();
    frame.render_widget(Paragraph::new(visible_input).block(input_block), input_area);

    if !chat.is_loading {
        let cursor_x = input_area.x + 1 + (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((cursor_x, input_area.y + 1));
    }
}

fn render_footer(app: &App, chat: &ChatView, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![
        Span::styled(format!(" {} ", app.toggle_chord), key_style),
        Span::styled(" assistant ", label_style),
    ];
    if chat.is_open && !chat.is_minimized {
        hints.extend([
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" C-r ", key_style),
            Span::styled(" retry ", label_style),
            Span::styled(" C-l ", key_style),
            Span::styled(" clear ", label_style),
        ]);
    } else {
        if chat.is_open {
            hints.extend([
                Span::styled(" Tab ", key_style),
                Span::styled(" restore chat ", label_style),
            ]);
        }
        hints.extend([
            Span::styled(" F1-F6 ", key_style),
            Span::styled(" pages ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]);
    }
    if chat.is_open && chat.is_minimized && chat.is_loading {
        hints.push(Span::styled(" assistant is working… ", Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}
