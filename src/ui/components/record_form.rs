use super::input::TextInput;
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

const LABELS: [&str; 3] = ["Name", "Description", "Strength (% ABV)"];

/// Raw field values submitted by the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues {
  pub name: String,
  pub description: String,
  pub strength: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  Submit(FormValues),
  Cancel,
}

/// Popup form for adding a beer
#[derive(Debug, Clone, Default)]
pub struct RecordForm {
  fields: [TextInput; 3],
  focus: usize,
  error: Option<String>,
}

impl RecordForm {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_error(&mut self, message: impl Into<String>) {
    self.error = Some(message.into());
  }

  /// Enter moves to the next field, and submits from the last one
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    match key.code {
      KeyCode::Esc => KeyResult::Event(FormEvent::Cancel),
      KeyCode::Tab | KeyCode::Down => {
        self.focus = (self.focus + 1) % LABELS.len();
        KeyResult::Handled
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus = (self.focus + LABELS.len() - 1) % LABELS.len();
        KeyResult::Handled
      }
      KeyCode::Enter if self.focus + 1 < LABELS.len() => {
        self.focus += 1;
        KeyResult::Handled
      }
      KeyCode::Enter => KeyResult::Event(FormEvent::Submit(FormValues {
        name: self.fields[0].value().trim().to_string(),
        description: self.fields[1].value().trim().to_string(),
        strength: self.fields[2].value().trim().to_string(),
      })),
      _ => {
        self.fields[self.focus].handle_key(key);
        self.error = None;
        KeyResult::Handled
      }
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let width = 60.min(area.width);
    let height = 9.min(area.height);
    let popup = Rect::new(
      area.x + (area.width - width) / 2,
      area.y + (area.height - height) / 2,
      width,
      height,
    );
    frame.render_widget(Clear, popup);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" New beer ");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines: Vec<Line> = Vec::new();
    for (i, (label, field)) in LABELS.iter().zip(self.fields.iter()).enumerate() {
      let focused = i == self.focus;
      let label_style = if focused {
        Style::default().fg(Color::Yellow).bold()
      } else {
        Style::default().fg(Color::DarkGray)
      };

      let mut spans = vec![Span::styled(format!("{:<18}", label), label_style)];
      if focused {
        let (before, after) = field.split_at_cursor();
        spans.push(Span::raw(before.to_string()));
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(after.to_string()));
      } else {
        spans.push(Span::raw(field.value().to_string()));
      }
      lines.push(Line::from(spans));
    }

    lines.push(Line::raw(""));
    match &self.error {
      Some(message) => lines.push(Line::styled(
        message.clone(),
        Style::default().fg(Color::Red),
      )),
      None => lines.push(Line::raw("")),
    }
    lines.push(Line::styled(
      "Tab: next field  Enter: save  Esc: cancel",
      Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(lines), inner);
  }
}
