use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar with the view breadcrumb and an optional
/// transient notice on the right
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], notice: Option<&str>) {
  let notice_width = notice.map(|n| n.chars().count() as u16 + 2).unwrap_or(0);

  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Min(1), Constraint::Length(notice_width)])
    .split(area);

  let mut spans = Vec::new();

  spans.push(Span::raw(" "));

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      // Current view - highlighted
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  let line = Line::from(spans);
  let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, chunks[0]);

  if let Some(notice) = notice {
    let notice_line = Line::from(Span::styled(
      format!("{} ", notice),
      Style::default().fg(Color::Yellow).bold(),
    ));
    let notice_para = Paragraph::new(notice_line)
      .alignment(Alignment::Right)
      .style(Style::default().bg(Color::Black));
    frame.render_widget(notice_para, chunks[1]);
  }
}
