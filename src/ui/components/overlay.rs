use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

use super::input::TextInput;

/// Rows of the suggestion list shown under a prompt
const MAX_ROWS: usize = 10;

/// Draw a prompt box (":" command, "/" search) with optional suggestion rows
pub fn draw_prompt_overlay(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  prefix: &str,
  input: &TextInput,
  rows: Vec<Line<'_>>,
  selected: Option<usize>,
) {
  let width = (area.width * 60 / 100).clamp(30, 64).min(area.width);
  let row_count = rows.len().min(MAX_ROWS) as u16;
  let height = (3 + row_count).min(area.height);

  // Top-left of the content area with a small margin
  let overlay_area = Rect::new(area.x + 1, area.y + 1, width, height).intersection(area);
  frame.render_widget(Clear, overlay_area);

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow))
    .title(format!(" {} ", title));
  let inner = block.inner(overlay_area);
  frame.render_widget(block, overlay_area);

  if inner.height == 0 {
    return;
  }

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(1), Constraint::Min(0)])
    .split(inner);

  let (before, after) = input.split_at_cursor();
  let input_line = Line::from(vec![
    Span::styled(prefix.to_string(), Style::default().fg(Color::Yellow)),
    Span::raw(before.to_string()),
    Span::styled("_", Style::default().fg(Color::Yellow)),
    Span::raw(after.to_string()),
  ]);
  frame.render_widget(Paragraph::new(input_line), chunks[0]);

  if rows.is_empty() || chunks[1].height == 0 {
    return;
  }

  let items: Vec<ListItem> = rows.into_iter().take(MAX_ROWS).map(ListItem::new).collect();
  let list =
    List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

  let mut state = ListState::default();
  state.select(selected);
  frame.render_stateful_widget(list, chunks[1], &mut state);
}
