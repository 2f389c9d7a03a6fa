//! Full-screen terminal surface.
//!
//! Draws the countdown in the terminal's alternate screen with raw mode on
//! and the cursor hidden. Every render drains pending input so keystrokes
//! made during the block never reach the shell afterwards.

use std::io::{self, IsTerminal, Stdout};
use std::time::Duration;

use crossterm::{
    cursor::{Hide, Show},
    event, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Paragraph};

use super::countdown::CountdownFrame;
use super::surface::{Surface, SurfaceError};

/// Ratatui surface over stdout.
#[derive(Default)]
pub struct TerminalSurface {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
}

impl TerminalSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if stdout is attached to a terminal.
    #[must_use]
    pub fn is_available() -> bool {
        io::stdout().is_terminal()
    }

    fn drain_input() -> io::Result<()> {
        while event::poll(Duration::ZERO)? {
            let _ = event::read()?;
        }
        Ok(())
    }
}

impl Surface for TerminalSurface {
    fn show(&mut self) -> Result<(), SurfaceError> {
        if self.terminal.is_some() {
            return Ok(());
        }
        if !Self::is_available() {
            return Err(SurfaceError::Unavailable("stdout is not a terminal".to_string()));
        }

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;
        self.terminal = Some(terminal);
        Ok(())
    }

    fn render(&mut self, frame: &CountdownFrame) -> Result<(), SurfaceError> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Ok(());
        };

        Self::drain_input()?;
        terminal.draw(|f| draw(f, frame))?;
        Ok(())
    }

    fn hide(&mut self) -> Result<(), SurfaceError> {
        let Some(mut terminal) = self.terminal.take() else {
            return Ok(());
        };

        let _ = Self::drain_input();
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)?;
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = self.hide();
    }
}

fn draw(f: &mut Frame, frame: &CountdownFrame) {
    let area = f.area();
    f.render_widget(Block::default().style(Style::default().bg(Color::Black)), area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let countdown = Paragraph::new(vec![
        Line::from(Span::styled(CountdownFrame::HEADLINE, bold)),
        Line::from(""),
        Line::from(Span::styled(frame.time_line(), bold)),
    ])
    .alignment(Alignment::Center)
    .style(Style::default().fg(Color::White).bg(Color::Black));
    f.render_widget(countdown, rows[1]);

    let info = Paragraph::new(frame.info_line())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray).bg(Color::Black));
    f.render_widget(info, rows[3]);
}
