use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{AppState, FocusPane};
use crate::highlight::{build_highlight_regex, highlight_body, highlight_line};
use crate::note::NoteField;
use crate::notice::NoticeKind;
use crate::search::SearchFilter;
use crate::selection::{EditorMode, FieldBuffer};

pub fn draw_app(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(2)])
        .split(frame.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(vertical[0]);

    draw_list_pane(frame, state, list_state, columns[0]);
    draw_editor_pane(frame, state, columns[1]);
    frame.render_widget(Paragraph::new(build_status_line(state)), vertical[1]);

    if state.controller().is_delete_pending() {
        draw_delete_overlay(frame, state);
    }
}

fn draw_list_pane(frame: &mut Frame, state: &AppState, list_state: &mut ListState, area: Rect) {
    let highlight = state.highlight();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(2)])
        .split(area);

    let search_focused = state.focus() == FocusPane::Search;
    let query = state.controller().search();
    let mut search_spans = vec![Span::raw(query.to_string())];
    if search_focused {
        search_spans.push(Span::styled("▌", highlight.focus_border()));
    } else if query.is_empty() {
        search_spans = vec![Span::styled(
            "press / to search",
            Style::default().fg(Color::DarkGray),
        )];
    }
    let search = Paragraph::new(Line::from(search_spans)).block(
        Block::default()
            .title("Search")
            .borders(Borders::ALL)
            .border_style(border_style(state, search_focused)),
    );
    frame.render_widget(search, rows[0]);

    let visible = state.visible_notes();
    let regex = build_highlight_regex(&SearchFilter::new(query));
    let items: Vec<ListItem> = if visible.is_empty() {
        let message = if state.controller().store().is_empty() {
            "No notes yet. Press n to add one."
        } else {
            "No matches found."
        };
        vec![ListItem::new(Span::styled(
            message,
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        visible
            .iter()
            .enumerate()
            .map(|(idx, note)| {
                let mut spans = vec![Span::styled(
                    format!("{}. ", idx + 1),
                    Style::default().fg(Color::DarkGray),
                )];
                spans.extend(highlight_line(
                    &note.title,
                    regex.as_ref(),
                    highlight.search_match(),
                    Style::default(),
                ));
                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    list_state.select(state.selected_index(&visible));
    let total = state.controller().store().len();
    let title = if visible.len() == total {
        format!("Notes ({total})")
    } else {
        format!("Notes ({}/{total})", visible.len())
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border_style(state, state.focus() == FocusPane::List)),
        )
        .highlight_style(highlight.selection())
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, rows[1], list_state);
}

fn draw_editor_pane(frame: &mut Frame, state: &AppState, area: Rect) {
    let controller = state.controller();
    let editing = state.focus() == FocusPane::Editor;
    let header = match controller.mode() {
        EditorMode::Closed => {
            let placeholder = Paragraph::new(Span::styled(
                state.placeholder(),
                Style::default().fg(Color::DarkGray),
            ))
            .block(Block::default().title("Note").borders(Borders::ALL));
            frame.render_widget(placeholder, area);
            return;
        }
        EditorMode::CreatingNew => "New Note",
        EditorMode::EditingExisting => "Note",
    };

    let form = controller.form();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let highlight = state.highlight();
    let regex = if editing {
        None
    } else {
        build_highlight_regex(&SearchFilter::new(controller.search()))
    };
    let dirty = if form.is_dirty() { " *" } else { "" };

    let title_field = form.field(NoteField::Title);
    let title = Paragraph::new(Line::from(highlight_line(
        title_field.text(),
        regex.as_ref(),
        highlight.search_match(),
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .block(
        Block::default()
            .title(format!(
                "{header}{dirty} · Title {}/{}",
                title_field.char_count(),
                title_field.max_chars()
            ))
            .borders(Borders::ALL)
            .border_style(border_style(state, editing && form.focus() == NoteField::Title)),
    );
    frame.render_widget(title, rows[0]);

    let description_field = form.field(NoteField::Description);
    let description = Paragraph::new(Text::from(highlight_body(
        description_field.text(),
        regex.as_ref(),
        highlight.search_match(),
    )))
    .block(
        Block::default()
            .title(format!(
                "Description {}/{}",
                description_field.char_count(),
                description_field.max_chars()
            ))
            .borders(Borders::ALL)
            .border_style(border_style(
                state,
                editing && form.focus() == NoteField::Description,
            )),
    )
    .wrap(Wrap { trim: false });
    frame.render_widget(description, rows[1]);

    if editing {
        let (field, field_area) = match form.focus() {
            NoteField::Title => (title_field, rows[0]),
            NoteField::Description => (description_field, rows[1]),
        };
        if let Some((x, y)) = cursor_screen_position(field, field_area) {
            frame.set_cursor(x, y);
        }
    }
}

fn draw_delete_overlay(frame: &mut Frame, state: &AppState) {
    let title = state
        .controller()
        .pending_delete()
        .map(|note| note.title.clone())
        .unwrap_or_else(|| String::from("this note"));
    let area = centered_rect(50, 30, frame.size());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            "Delete Note",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Delete \"{title}\"? This cannot be undone.")),
        Line::from(""),
        Line::from(Span::styled(
            "y/Enter delete • n/Esc keep",
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(
        Block::default()
            .title("Confirm Delete")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    )
    .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn build_status_line(state: &AppState) -> Text<'static> {
    let notice = state.controller().notice();
    let first = match (notice.message(), notice.kind()) {
        (Some(message), Some(NoticeKind::Error)) => Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        (Some(message), _) => Line::from(Span::styled(
            message.to_string(),
            state.highlight().focus_border(),
        )),
        (None, _) => Line::from(""),
    };
    let hints = Line::from(Span::styled(
        state.status_hints(),
        Style::default().fg(Color::DarkGray),
    ));
    Text::from(vec![first, hints])
}

fn border_style(state: &AppState, focused: bool) -> Style {
    if focused {
        state.highlight().focus_border()
    } else {
        Style::default()
    }
}

/// Terminal cell for the cursor of `field` rendered with wrapping inside
/// the bordered `area`.
fn cursor_screen_position(field: &FieldBuffer, area: Rect) -> Option<(u16, u16)> {
    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2);
    if inner_width == 0 || inner_height == 0 {
        return None;
    }

    let text = field.text();
    let cursor = field.cursor().min(text.len());
    let mut row: u16 = 0;
    let mut col = 0usize;
    for grapheme in text[..cursor].graphemes(true) {
        if grapheme == "\n" {
            row += 1;
            col = 0;
            continue;
        }
        let glyph_width = UnicodeWidthStr::width(grapheme);
        if glyph_width > 0 && col + glyph_width > inner_width {
            row += 1;
            col = 0;
        }
        col += glyph_width;
    }

    let row = row.min(inner_height - 1);
    let col = col.min(inner_width - 1) as u16;
    Some((area.x + 1 + col, area.y + 1 + row))
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
