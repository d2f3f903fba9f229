use crate::catalog::Record;
use crate::projection::excerpt;
use crate::ui::renderfns::{format_strength, strength_color, truncate};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

/// Below this width the detail pane is hidden
const DETAIL_MIN_WIDTH: u16 = 90;

/// Everything the catalog screen needs for one frame
pub struct CatalogScreen<'a> {
  pub visible: &'a [&'a Record],
  pub selected: usize,
  pub query: &'a str,
  pub load_error: Option<&'a str>,
  pub loading: bool,
  pub excerpt_len: usize,
  pub image_base_url: &'a str,
}

pub fn draw_catalog(frame: &mut Frame, area: Rect, screen: &CatalogScreen<'_>) {
  if area.width < DETAIL_MIN_WIDTH {
    draw_cards(frame, area, screen);
    return;
  }

  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
    .split(area);

  draw_cards(frame, chunks[0], screen);
  draw_detail(
    frame,
    chunks[1],
    screen.visible.get(screen.selected).copied(),
    screen.image_base_url,
  );
}

fn draw_cards(frame: &mut Frame, area: Rect, screen: &CatalogScreen<'_>) {
  let title = if screen.query.trim().is_empty() {
    format!(" Beers ({}) ", screen.visible.len())
  } else {
    format!(" Beers matching \"{}\" ({}) ", screen.query.trim(), screen.visible.len())
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  // A failed fetch replaces the list until the next successful load or reload
  if let Some(error) = screen.load_error {
    let text = vec![
      Line::styled("Failed to load beers.", Style::default().fg(Color::Red).bold()),
      Line::styled(error.to_string(), Style::default().fg(Color::Red)),
      Line::raw(""),
      Line::styled(
        "Press 'n' to retry or 'r' to show cached beers.",
        Style::default().fg(Color::DarkGray),
      ),
    ];
    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
    return;
  }

  if screen.visible.is_empty() {
    let content = if screen.loading {
      "Loading beers..."
    } else if !screen.query.trim().is_empty() {
      "No beers match your search."
    } else {
      "No beers yet. Press 'n' to load the catalog."
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  // Two lines per card: title row and description excerpt
  let text_width = area.width.saturating_sub(6) as usize;
  let items: Vec<ListItem> = screen
    .visible
    .iter()
    .map(|record| card(record, text_width, screen.excerpt_len))
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut state = ListState::default();
  state.select(Some(screen.selected));
  frame.render_stateful_widget(list, area, &mut state);
}

fn card(record: &Record, width: usize, excerpt_len: usize) -> ListItem<'static> {
  let mut title = vec![
    Span::styled(format!("#{:<5}", record.id), Style::default().fg(Color::DarkGray)),
    Span::styled(
      truncate(&record.name, 40),
      Style::default().fg(Color::Cyan).bold(),
    ),
    Span::raw("  "),
    Span::styled(
      format_strength(record.strength),
      Style::default().fg(strength_color(record.strength)),
    ),
  ];
  if record.is_user_created {
    title.push(Span::raw(" "));
    title.push(Span::styled(
      " custom ",
      Style::default().fg(Color::Black).bg(Color::Green),
    ));
  }

  let summary = truncate(&excerpt(&record.description, excerpt_len), width.max(10));
  ListItem::new(vec![
    Line::from(title),
    Line::styled(format!("       {}", summary), Style::default().fg(Color::Gray)),
  ])
}

fn draw_detail(frame: &mut Frame, area: Rect, record: Option<&Record>, image_base_url: &str) {
  let block = Block::default()
    .title(" Details ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let Some(record) = record else {
    frame.render_widget(block, area);
    return;
  };

  let label = Style::default().fg(Color::DarkGray);
  let mut lines = vec![
    Line::styled(record.name.clone(), Style::default().fg(Color::Cyan).bold()),
  ];
  if !record.tagline.is_empty() {
    lines.push(Line::styled(
      record.tagline.clone(),
      Style::default().add_modifier(Modifier::ITALIC),
    ));
  }
  lines.push(Line::raw(""));
  lines.push(Line::from(vec![
    Span::styled("Id          ", label),
    Span::raw(record.id.to_string()),
  ]));
  lines.push(Line::from(vec![
    Span::styled("Strength    ", label),
    Span::styled(
      format_strength(record.strength),
      Style::default().fg(strength_color(record.strength)),
    ),
  ]));
  if !record.created_date.is_empty() {
    lines.push(Line::from(vec![
      Span::styled("First brewed ", label),
      Span::raw(record.created_date.clone()),
    ]));
  }
  lines.push(Line::from(vec![
    Span::styled("Image       ", label),
    Span::raw(
      record
        .image_url(image_base_url)
        .unwrap_or_else(|| "no image".to_string()),
    ),
  ]));
  if record.is_user_created {
    lines.push(Line::styled("Created by you", Style::default().fg(Color::Green)));
  }
  lines.push(Line::raw(""));
  lines.push(Line::raw(if record.description.is_empty() {
    "No description".to_string()
  } else {
    record.description.clone()
  }));

  let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
  frame.render_widget(paragraph, area);
}
