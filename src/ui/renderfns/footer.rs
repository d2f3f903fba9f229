use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::sync::PageState;

/// Label for the "load more" affordance in each pagination state
pub fn pagination_label(state: &PageState) -> (String, Style) {
  match state {
    PageState::Idle => (
      "<n> Load beers".to_string(),
      Style::default().fg(Color::Cyan),
    ),
    PageState::Loading { page } => (
      format!("Loading page {}...", page),
      Style::default().fg(Color::Yellow),
    ),
    PageState::Loaded { page } => (
      format!("<n> Load more (page {})", page + 1),
      Style::default().fg(Color::Cyan),
    ),
    PageState::Exhausted { .. } => (
      "All beers loaded".to_string(),
      Style::default().fg(Color::DarkGray),
    ),
    PageState::Failed { page, .. } => (
      format!("<n> Retry page {}", page),
      Style::default().fg(Color::Red),
    ),
  }
}

/// Draw the footer: pagination state on the left, last status message after it
pub fn draw_footer(frame: &mut Frame, area: Rect, state: &PageState, status: Option<&str>) {
  let (label, style) = pagination_label(state);

  let mut spans = vec![Span::raw(" "), Span::styled(label, style)];
  if let Some(message) = status {
    spans.push(Span::styled("  │  ", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(message.to_string(), Style::default().fg(Color::White)));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
