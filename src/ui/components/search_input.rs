use super::input::{InputResult, TextInput};
use super::overlay::draw_prompt_overlay;
use super::KeyResult;
use crate::catalog::Record;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

/// Events emitted by search input that the parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Query changed (each keystroke; empty string on cancel)
  Changed(String),
  /// A suggestion was chosen, by index into the current suggestions
  Picked(usize),
  /// Overlay closed with Enter, the filter stays applied
  Submitted,
}

/// Search box with a suggestion list, opened with `/`
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
  selected: Option<usize>,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn query(&self) -> &str {
    self.input.value()
  }

  /// Replace the query text, e.g. with a picked suggestion's name
  pub fn set_query(&mut self, query: &str) {
    self.input.set_value(query);
    self.selected = None;
  }

  pub fn selected(&self) -> Option<usize> {
    self.selected
  }

  /// Handle a key event, including the `/` that opens the box.
  ///
  /// `suggestion_count` is the length of the list currently shown.
  pub fn handle_key(&mut self, key: KeyEvent, suggestion_count: usize) -> KeyResult<SearchEvent> {
    if !self.active {
      if key.code == KeyCode::Char('/') {
        // Reopening keeps the current query so it can be refined
        self.active = true;
        self.selected = None;
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        if suggestion_count > 0 {
          self.selected = Some(match self.selected {
            Some(i) => (i + 1) % suggestion_count,
            None => 0,
          });
        }
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        if suggestion_count > 0 {
          self.selected = Some(match self.selected {
            Some(0) | None => suggestion_count - 1,
            Some(i) => i - 1,
          });
        }
        return KeyResult::Handled;
      }
      _ => {}
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(_) => {
        self.active = false;
        match self.selected.take() {
          Some(i) if i < suggestion_count => KeyResult::Event(SearchEvent::Picked(i)),
          _ => KeyResult::Event(SearchEvent::Submitted),
        }
      }
      InputResult::Cancelled => {
        self.active = false;
        self.selected = None;
        self.input.clear();
        KeyResult::Event(SearchEvent::Changed(String::new()))
      }
      InputResult::Consumed => {
        self.selected = None;
        KeyResult::Event(SearchEvent::Changed(self.input.value().to_string()))
      }
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Render the search box and its suggestions if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect, suggestions: &[&Record]) {
    if !self.active {
      return;
    }

    let rows = suggestions
      .iter()
      .map(|record| {
        Line::from(vec![
          Span::styled(record.name.clone(), Style::default().fg(Color::Cyan)),
          Span::styled(
            format!("  {}% ABV", record.strength),
            Style::default().fg(Color::DarkGray),
          ),
        ])
      })
      .collect();

    draw_prompt_overlay(frame, area, "Search", "/", &self.input, rows, self.selected);
  }
}
