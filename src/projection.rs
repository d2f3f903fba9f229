//! Derived views of the record set.
//!
//! Pure functions only: nothing here touches the store. The record set
//! handed in is expected to be sorted by id already (see [`sort_by_id`]).

use crate::catalog::Record;

/// What the list shows for a given search
#[derive(Debug, PartialEq)]
pub struct Projection<'a> {
  /// Records for the main list, never truncated
  pub visible: Vec<&'a Record>,
  /// Name suggestions for the search box, capped
  pub suggestions: Vec<&'a Record>,
}

/// Display order: ascending by id
pub fn sort_by_id(records: &mut [Record]) {
  records.sort_by_key(|r| r.id);
}

/// Case-insensitive substring match on name. An empty query matches everything.
pub fn filter<'a>(records: &'a [Record], query: &str) -> Vec<&'a Record> {
  let needle = query.trim().to_lowercase();
  if needle.is_empty() {
    return records.iter().collect();
  }

  records
    .iter()
    .filter(|r| r.name.to_lowercase().contains(&needle))
    .collect()
}

/// The main list plus at most `suggestion_limit` suggestions.
/// An empty query suggests nothing.
pub fn project<'a>(records: &'a [Record], query: &str, suggestion_limit: usize) -> Projection<'a> {
  let visible = filter(records, query);
  let suggestions = if query.trim().is_empty() {
    Vec::new()
  } else {
    visible.iter().copied().take(suggestion_limit).collect()
  };

  Projection {
    visible,
    suggestions,
  }
}

/// First `max_chars` characters of a description for a card
pub fn excerpt(description: &str, max_chars: usize) -> String {
  if description.trim().is_empty() {
    return "No description".to_string();
  }
  let mut chars = description.chars();
  let head: String = chars.by_ref().take(max_chars).collect();
  if chars.next().is_some() {
    format!("{}...", head.trim_end())
  } else {
    head
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(id: i64, name: &str) -> Record {
    Record {
      id,
      name: name.to_string(),
      description: String::new(),
      strength: 5.0,
      image_ref: String::new(),
      tagline: String::new(),
      created_date: String::new(),
      is_user_created: false,
    }
  }

  fn ids(records: &[&Record]) -> Vec<i64> {
    records.iter().map(|r| r.id).collect()
  }

  #[test]
  fn test_empty_query_returns_everything_in_order() {
    let mut records = vec![record(3, "c"), record(1, "a"), record(2, "b")];
    sort_by_id(&mut records);

    let projection = project(&records, "", 10);
    assert_eq!(ids(&projection.visible), vec![1, 2, 3]);
    assert!(projection.suggestions.is_empty());
  }

  #[test]
  fn test_case_insensitive_match() {
    let records = vec![record(1, "Punk IPA"), record(2, "Stout")];
    assert_eq!(ids(&filter(&records, "ipa")), vec![1]);
    assert_eq!(ids(&filter(&records, "  STOUT ")), vec![2]);
    assert!(filter(&records, "lager").is_empty());
  }

  #[test]
  fn test_suggestions_are_capped_but_list_is_not() {
    let records: Vec<Record> = (1..=25).map(|i| record(i, &format!("Punk {}", i))).collect();

    let projection = project(&records, "punk", 10);
    assert_eq!(projection.visible.len(), 25);
    assert_eq!(ids(&projection.suggestions), (1..=10).collect::<Vec<_>>());

    assert_eq!(project(&records, "punk 2", 3).suggestions.len(), 3);
    assert!(project(&records, " ", 3).suggestions.is_empty());
  }

  #[test]
  fn test_excerpt() {
    assert_eq!(excerpt("", 100), "No description");
    assert_eq!(excerpt("Short and hoppy.", 100), "Short and hoppy.");
    assert_eq!(excerpt("A light, crisp and bitter IPA", 8), "A light,...");
    // Multi-byte characters are not split
    assert_eq!(excerpt("Bière brassée", 5), "Bière...");
  }
}
