use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::view::Shortcut;

/// Draw the header bar with logo, community context, and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  community_url: &str,
  title: Option<&str>,
  user: Option<&str>,
  shortcuts: &[Shortcut],
) {
  let context = title.unwrap_or_else(|| extract_domain(community_url));

  let mut spans = vec![
    Span::styled(" wayfarer ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", context), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
  ];

  match user {
    Some(name) => spans.push(Span::styled(
      format!(" {} ", name),
      Style::default().fg(Color::Green).bold(),
    )),
    None => spans.push(Span::styled(
      " signed out ",
      Style::default().fg(Color::DarkGray),
    )),
  }

  spans.push(Span::raw("  "));

  // Shortcuts - keys highlighted, descriptions dimmed
  for shortcut in shortcuts {
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
    spans.push(Span::raw("   "));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Extract domain from the community URL
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
    assert_eq!(
      extract_domain("https://community.travelers.example"),
      "community.travelers.example"
    );
    assert_eq!(
      extract_domain("http://localhost:8080/api"),
      "localhost:8080"
    );
    assert_eq!(extract_domain("weird-input"), "weird-input");
  }
}
