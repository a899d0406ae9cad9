pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::app::App;
use crate::session::{NoticeKind, PracticeSession, Screen};
use crate::timer::Timer;
use screen::current_view;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Countdown colour by remaining share: red at 10% or less, yellow at 25% or less.
pub fn countdown_color(timer: &Timer) -> Color {
    let ratio = timer.remaining_ratio();
    if ratio <= 0.10 {
        Color::Red
    } else if ratio <= 0.25 {
        Color::Yellow
    } else {
        Color::Green
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        (&self.session).render(area, buf);
    }
}

impl Widget for &PracticeSession {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // countdown
                Constraint::Min(1),    // body
                Constraint::Length(1), // notice
                Constraint::Length(1), // legend
            ])
            .split(area);

        if let Some(duration) = timed_duration(self) {
            let timer = self.session_timer();
            let style = Style::default()
                .fg(countdown_color(timer))
                .add_modifier(Modifier::BOLD);
            Paragraph::new(Line::from(vec![
                Span::styled(format!("⏳ {}", timer.formatted()), style),
                Span::styled(
                    format!(" / {}", crate::timer::format_clock(duration)),
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ]))
            .alignment(Alignment::Right)
            .render(chunks[0], buf);
        }

        let view = current_view(self.screen());
        view.render(self, chunks[1], buf);

        if let Some(notice) = self.notice() {
            let color = match notice.kind {
                NoticeKind::Success => Color::Green,
                NoticeKind::Failure => Color::Red,
            };
            Paragraph::new(Span::styled(
                notice.text.as_str(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
        }

        Paragraph::new(Span::styled(
            view.legend(self),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[3], buf);
    }
}

fn timed_duration(session: &PracticeSession) -> Option<u64> {
    match session.screen() {
        Screen::Practicing(practice) => practice.config.duration_secs,
        _ => None,
    }
}
