//! Turn raw plan text into display blocks.
//!
//! The endpoint is asked to avoid markdown, but the model still slips
//! asterisks and bullet markers in. Formatting strips those, groups the
//! text into paragraphs, and marks "Day N:" paragraphs for emphasis so
//! the itinerary scans well in the terminal.

/// One renderable paragraph of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanBlock {
  pub text: String,
  /// Render bold ("Day N:" itinerary headings)
  pub emphasis: bool,
}

/// Split plan text into cleaned paragraphs.
pub fn format_plan(content: &str) -> Vec<PlanBlock> {
  let cleaned = content.replace('*', "").replace("\r\n", "\n");
  cleaned
    .split("\n\n")
    .filter_map(|paragraph| {
      let text = strip_list_marker(paragraph.trim());
      if text.is_empty() {
        return None;
      }
      let emphasis = is_day_heading(&text);
      Some(PlanBlock {
        text: text.to_string(),
        emphasis,
      })
    })
    .collect()
}

/// Drop a leading bullet or numbering marker ("• ", "- ", "3. ").
fn strip_list_marker(text: &str) -> &str {
  if let Some(rest) = text.strip_prefix("• ") {
    return rest.trim_start();
  }
  if let Some(rest) = text.strip_prefix("- ") {
    return rest.trim_start();
  }

  // "12. " style numbering
  let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
  if digits > 0 {
    if let Some(rest) = text[digits..].strip_prefix(". ") {
      return rest.trim_start();
    }
  }

  text
}

/// Whether a paragraph starts with "Day <number>:".
fn is_day_heading(text: &str) -> bool {
  let Some(rest) = text.strip_prefix("Day ") else {
    return false;
  };
  let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
  digits > 0 && rest[digits..].starts_with(':')
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_splits_paragraphs_and_drops_empties() {
    let blocks = format_plan("First paragraph\n\n\n\nSecond paragraph\n\n   ");
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].text, "First paragraph");
    assert_eq!(blocks[1].text, "Second paragraph");
  }

  #[test]
  fn test_strips_asterisks() {
    let blocks = format_plan("**Trip Overview**\n\nVisit the *old town*.");
    assert_eq!(blocks[0].text, "Trip Overview");
    assert_eq!(blocks[1].text, "Visit the old town.");
  }

  #[test]
  fn test_strips_bullets_and_numbering() {
    let blocks = format_plan("- Pack light\n\n• Bring sunscreen\n\n2. Book ahead");
    assert_eq!(blocks[0].text, "Pack light");
    assert_eq!(blocks[1].text, "Bring sunscreen");
    assert_eq!(blocks[2].text, "Book ahead");
  }

  #[test]
  fn test_day_headings_get_emphasis() {
    let blocks = format_plan("Day 1: Arrival and old town walk\n\nTake the tram up the hill.");
    assert!(blocks[0].emphasis);
    assert!(!blocks[1].emphasis);
  }

  #[test]
  fn test_day_prefix_without_number_is_not_heading() {
    let blocks = format_plan("Day trips are easy from here.");
    assert!(!blocks[0].emphasis);
  }
}
