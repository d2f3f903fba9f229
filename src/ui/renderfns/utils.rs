use ratatui::prelude::Color;

/// Truncate a string to at most `max_chars` characters, adding "..." if truncated
pub fn truncate(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    s.to_string()
  } else {
    let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", head)
  }
}

/// Display color for a strength badge
pub fn strength_color(strength: f64) -> Color {
  if strength >= 8.0 {
    Color::Red
  } else if strength >= 5.0 {
    Color::Yellow
  } else {
    Color::Green
  }
}

/// "5.5% ABV", without trailing zeros
pub fn format_strength(strength: f64) -> String {
  let rounded = (strength * 10.0).round() / 10.0;
  if rounded.fract() == 0.0 {
    format!("{:.0}% ABV", rounded)
  } else {
    format!("{:.1}% ABV", rounded)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate() {
    assert_eq!(truncate("hello", 10), "hello");
    assert_eq!(truncate("hello", 5), "hello");
    assert_eq!(truncate("hello world", 8), "hello...");
    assert_eq!(truncate("Brassée à Lyon", 9), "Brassé...");
  }

  #[test]
  fn test_strength_color() {
    assert_eq!(strength_color(4.5), Color::Green);
    assert_eq!(strength_color(5.0), Color::Yellow);
    assert_eq!(strength_color(12.5), Color::Red);
  }

  #[test]
  fn test_format_strength() {
    assert_eq!(format_strength(4.5), "4.5% ABV");
    assert_eq!(format_strength(7.0), "7% ABV");
    assert_eq!(format_strength(5.56), "5.6% ABV");
  }
}
