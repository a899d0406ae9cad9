use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::presenter::{OptionMark, Round};
use crate::selector::{Configurator, DifficultySelector};
use crate::session::{Phase, Practice, PracticeSession, Screen};
use crate::summary::{Grade, SessionSummary};

/// A UI screen boundary: draws the body area for one session screen
pub trait ScreenView {
    fn render(&self, session: &PracticeSession, area: Rect, buf: &mut Buffer);
    /// Key hints shown at the bottom
    fn legend(&self, session: &PracticeSession) -> &'static str;
}

pub struct SelectionView;

impl ScreenView for SelectionView {
    fn render(&self, session: &PracticeSession, area: Rect, buf: &mut Buffer) {
        let Screen::Selecting {
            selector,
            configurator,
        } = session.screen()
        else {
            return;
        };

        render_tiers(session, selector, area, buf);
        if let Some(configurator) = configurator {
            render_configurator(configurator, area, buf);
        }
    }

    fn legend(&self, session: &PracticeSession) -> &'static str {
        if session.configurator_open() {
            "(↑/↓ or 1-4) choose / (enter) start / (esc) cancel"
        } else {
            "(←/→) subject / (↑/↓) move / (1-3 or enter) practice / (t)imed session / (esc)ape"
        }
    }
}

fn render_tiers(session: &PracticeSession, selector: &DifficultySelector, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{}  {}", session.subject().glyph(), session.subject().name()),
            bold.fg(Color::Cyan),
        )),
        Line::from(""),
        Line::from(Span::styled("Choose a difficulty", bold)),
        Line::from(""),
    ];

    for (idx, tier) in selector.tiers().iter().enumerate() {
        let highlighted = idx == selector.cursor();
        let marker = if highlighted { "▶ " } else { "  " };
        let style = if highlighted {
            bold.fg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{}. {:<8}", idx + 1, tier.label()), style),
            Span::styled(tier.description(), dim),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  t. Timed    ", Style::default().fg(Color::Magenta)),
        Span::styled("Practice against the clock", dim),
    ]));

    Paragraph::new(lines)
        .alignment(Alignment::Left)
        .render(centered(area, 64, 12), buf);
}

fn render_configurator(configurator: &Configurator, area: Rect, buf: &mut Buffer) {
    let popup = centered(area, 44, configurator.options().len() as u16 + 6);
    Clear.render(popup, buf);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Timed session ")
        .border_style(Style::default().fg(Color::Magenta));
    let inner = block.inner(popup);
    block.render(popup, buf);

    let mut lines = vec![Line::from("How long do you want to practice?"), Line::from("")];
    for (idx, option) in configurator.options().iter().enumerate() {
        let chosen = configurator.pending() == Some(idx);
        let style = if chosen {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} {}. {:<7}", if chosen { "●" } else { "○" }, idx + 1, option.label()),
                style,
            ),
            Span::styled(option.description(), Style::default().add_modifier(Modifier::DIM)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        if configurator.can_confirm() {
            "Press enter to start"
        } else {
            "Pick a duration"
        },
        Style::default().add_modifier(Modifier::ITALIC),
    )));

    Paragraph::new(lines).render(inner, buf);
}

pub struct PracticeView;

impl ScreenView for PracticeView {
    fn render(&self, session: &PracticeSession, area: Rect, buf: &mut Buffer) {
        let Some(practice) = session.practice() else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
            ])
            .split(area);

        render_status(session, practice, chunks[0], buf);

        match &practice.phase {
            Phase::AwaitingGeneration { in_flight } => {
                let text = if in_flight.is_some() {
                    "Generating exercise…"
                } else {
                    "Press enter to generate an exercise"
                };
                Paragraph::new(Span::styled(
                    text,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD | Modifier::ITALIC),
                ))
                .alignment(Alignment::Center)
                .render(centered(chunks[2], chunks[2].width, 1), buf);
            }
            Phase::Presenting(round) | Phase::Submitted(round) => {
                render_round(round, chunks[2], buf);
            }
        }
    }

    fn legend(&self, session: &PracticeSession) -> &'static str {
        let Some(practice) = session.practice() else {
            return "";
        };
        match (&practice.phase, practice.config.is_timed()) {
            (Phase::AwaitingGeneration { .. }, _) => "(enter) generate / (backspace) back / (esc)ape",
            (Phase::Presenting(_), false) => {
                "(a-d or ↑/↓) select / (enter) submit / (p)ause timer / (backspace) back / (esc)ape"
            }
            (Phase::Presenting(_), true) => "(a-d or ↑/↓) select / (enter) submit / (backspace) back / (esc)ape",
            (Phase::Submitted(_), _) => "(enter or n)ext exercise / (backspace) back / (esc)ape",
        }
    }
}

fn render_status(session: &PracticeSession, practice: &Practice, area: Rect, buf: &mut Buffer) {
    let dim = Style::default().add_modifier(Modifier::DIM);
    let timer = session.exercise_timer();

    let mut spans = vec![
        Span::styled(
            format!("{} · {}", session.subject().name(), practice.config.difficulty.label()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ⏱ ", dim),
        Span::raw(timer.formatted()),
    ];
    if !practice.config.is_timed() && practice.round().is_some() && !timer.is_running() {
        spans.push(Span::styled(" (paused)", dim));
    }
    if practice.config.is_timed() {
        let stats = session.stats();
        spans.push(Span::styled(
            format!("   score {}/{}", stats.correct(), stats.attempted()),
            dim,
        ));
    }

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_round(round: &Round, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let question = &round.exercise().question;

    let width = area.width.max(1);
    let question_lines = if question.width() <= width as usize {
        1
    } else {
        (question.width() as f64 / width as f64).ceil() as u16 + 1
    };
    let explanation_lines = if round.explanation().is_some() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(question_lines),
            Constraint::Length(1),
            Constraint::Length(round.exercise().options.len() as u16),
            Constraint::Length(1),
            Constraint::Length(explanation_lines),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled(question.as_str(), bold))
        .alignment(if question_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[0], buf);

    let options: Vec<Line> = round
        .option_rows()
        .into_iter()
        .map(|(letter, text, mark)| {
            let (prefix, style) = match mark {
                OptionMark::Idle => ("  ", Style::default()),
                OptionMark::Selected => ("▶ ", bold.fg(Color::Yellow)),
                OptionMark::Correct => ("✔ ", bold.fg(Color::Green)),
                OptionMark::WronglySelected => ("✘ ", bold.fg(Color::Red)),
                OptionMark::Other => ("  ", Style::default().add_modifier(Modifier::DIM)),
            };
            Line::from(Span::styled(format!("{prefix}{letter}) {text}"), style))
        })
        .collect();
    let options_width = options.iter().map(Line::width).max().unwrap_or(0) as u16;
    Paragraph::new(options).render(centered(chunks[2], options_width, chunks[2].height), buf);

    if let Some(explanation) = round.explanation() {
        Paragraph::new(vec![
            Line::from(Span::styled("Explanation", bold.fg(Color::Cyan))),
            Line::from(Span::styled(
                explanation,
                Style::default().add_modifier(Modifier::ITALIC),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[4], buf);
    }
}

pub struct SummaryView;

impl ScreenView for SummaryView {
    fn render(&self, session: &PracticeSession, area: Rect, buf: &mut Buffer) {
        let Screen::Summary(summary) = session.screen() else {
            return;
        };
        render_summary(summary, area, buf);
    }

    fn legend(&self, _session: &PracticeSession) -> &'static str {
        "(c)ontinue / (n)ew session / (esc)ape"
    }
}

fn grade_color(grade: Grade) -> Color {
    match grade {
        Grade::Excellent => Color::Green,
        Grade::Good => Color::Cyan,
        Grade::Fair => Color::Yellow,
        Grade::KeepPracticing => Color::Red,
    }
}

fn render_summary(summary: &SessionSummary, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(Span::styled("Session complete", bold)),
        Line::from(""),
        Line::from(Span::styled(
            summary.grade.label(),
            bold.fg(grade_color(summary.grade)),
        )),
        Line::from(""),
        Line::from(Span::styled(format!("{}% accuracy", summary.accuracy()), bold)),
        Line::from(format!(
            "{} correct   {} attempted   {} elapsed",
            summary.score_line(),
            summary.attempted,
            summary.elapsed_line()
        )),
    ];

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(centered(area, area.width, 6), buf);
}

/// Rect of at most `width` x `height`, centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

/// Helper to construct the view for the current screen
pub fn current_view(screen: &Screen) -> Box<dyn ScreenView> {
    match screen {
        Screen::Selecting { .. } => Box::new(SelectionView),
        Screen::Practicing(_) => Box::new(PracticeView),
        Screen::Summary(_) => Box::new(SummaryView),
    }
}
