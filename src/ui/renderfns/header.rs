use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, source, counts, and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  catalog_url: &str,
  total: usize,
  custom: usize,
  persistent: bool,
) {
  let domain = extract_domain(catalog_url);

  let cache_label = if persistent {
    Span::styled(" cached ", Style::default().fg(Color::Green))
  } else {
    Span::styled(" memory only ", Style::default().fg(Color::Red))
  };

  let mut spans = vec![
    Span::styled(" hopdex ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", domain), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} beers ", total),
      Style::default().fg(Color::Yellow).bold(),
    ),
  ];
  if custom > 0 {
    spans.push(Span::styled(
      format!("({} custom) ", custom),
      Style::default().fg(Color::Green),
    ));
  }
  spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
  spans.push(cache_label);
  spans.push(Span::raw("  "));

  for (key, label) in [("n", "more"), ("/", "search"), ("a", "add"), (":", "command"), ("q", "quit")] {
    spans.push(Span::styled(format!("<{}>", key), Style::default().fg(Color::Cyan)));
    spans.push(Span::styled(format!(" {}   ", label), Style::default().fg(Color::DarkGray)));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Host part of the catalog url
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_domain() {
    assert_eq!(extract_domain("https://punkapi.online/v3"), "punkapi.online");
    assert_eq!(extract_domain("http://localhost:8080"), "localhost:8080");
    assert_eq!(extract_domain("punkapi.online"), "punkapi.online");
  }
}
