mod components;
mod renderfns;
mod views;

pub use components::{
  FormEvent, FormValues, InputResult, KeyResult, RecordForm, SearchEvent, SearchInput, TextInput,
};

use crate::app::{App, Mode};
use crate::commands::Command;
use crate::sync::PageState;
use ratatui::prelude::*;

use components::draw_prompt_overlay;
use renderfns::{draw_footer, draw_header};
use views::{draw_catalog, CatalogScreen};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  let records = app.records();
  draw_header(
    frame,
    chunks[0],
    app.catalog_url(),
    records.len(),
    records.iter().filter(|r| r.is_user_created).count(),
    app.is_persistent(),
  );

  let visible = app.visible();
  let page_state = app.page_state();
  let image_base_url = app.image_base_url();
  let screen = CatalogScreen {
    visible: &visible,
    selected: app.selected(),
    query: app.search().query(),
    load_error: app.load_error(),
    loading: matches!(page_state, PageState::Loading { .. }),
    excerpt_len: app.excerpt_len(),
    image_base_url: &image_base_url,
  };
  draw_catalog(frame, chunks[1], &screen);

  draw_footer(frame, chunks[2], &page_state, app.status());

  match app.mode() {
    Mode::Command => draw_command_prompt(frame, chunks[1], app),
    Mode::Form => app.form().render(frame, chunks[1]),
    Mode::Normal => app.search().render_overlay(frame, chunks[1], &app.suggestions()),
  }
}

fn draw_command_prompt(frame: &mut Frame, area: Rect, app: &App) {
  let rows = app
    .command_suggestions()
    .iter()
    .map(|cmd: &&Command| {
      Line::from(vec![
        Span::styled(format!("{:<10}", cmd.name), Style::default().fg(Color::Cyan)),
        Span::styled(cmd.description, Style::default().fg(Color::DarkGray)),
      ])
    })
    .collect();

  draw_prompt_overlay(
    frame,
    area,
    "Command",
    ":",
    app.command_input(),
    rows,
    Some(app.selected_command()),
  );
}
