use std::io::{self, Stdout};

use ansi_to_tui::IntoText;
use anyhow::{Context, Result};
use crossterm::ExecutableCommand;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Text;
use ratatui::widgets::Paragraph;
use tracing::{debug, info};

use crate::ansi::strip;
use crate::app::App;
use crate::view::{self, Frame};

/// Raw mode and the alternate screen for as long as it lives.
pub struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    pub fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let terminal = unwind_on_err(open_terminal, restore)?;
        Ok(Self { terminal })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        let size = self.terminal.size()?;
        Ok((size.width, size.height))
    }

    pub fn draw(&mut self, frame: &Frame) -> Result<()> {
        let header = to_text(&frame.header);
        let body = to_text(&frame.body);
        let footer = to_text(&frame.footer);
        self.terminal.draw(|f| {
            let [top, middle, bottom] = Layout::vertical([
                Constraint::Length(height_of(&frame.header)),
                Constraint::Min(0),
                Constraint::Length(height_of(&frame.footer)),
            ])
            .areas(f.area());
            f.render_widget(Paragraph::new(header), top);
            f.render_widget(Paragraph::new(body), middle);
            f.render_widget(Paragraph::new(footer), bottom);
            if let Some((scroll, max)) = frame.scroll {
                render_scrollbar(f, middle, scroll, max);
            }
        })?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        restore();
    }
}

fn open_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    stdout
        .execute(EnterAlternateScreen)
        .context("failed to enter alternate screen")?;
    stdout.execute(Hide).context("failed to hide cursor")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("failed to create terminal")
}

/// Raw mode is already on when `setup` runs; `undo` puts the terminal back if
/// it fails, since no session exists yet to do it on drop.
fn unwind_on_err<T>(setup: impl FnOnce() -> Result<T>, undo: impl FnOnce()) -> Result<T> {
    setup().inspect_err(|_| undo())
}

fn restore() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = stdout.execute(Show);
    let _ = stdout.execute(LeaveAlternateScreen);
}

pub fn install_panic_hook() {
    let original = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        original(info);
    }));
}

fn height_of(lines: &[String]) -> u16 {
    u16::try_from(lines.len()).unwrap_or(u16::MAX)
}

fn to_text(lines: &[String]) -> Text<'static> {
    let joined = lines.join("\n");
    joined
        .into_text()
        .unwrap_or_else(|_| Text::raw(strip(&joined)))
}

fn render_scrollbar(f: &mut ratatui::Frame, area: Rect, scroll: usize, max_scroll: usize) {
    let track_height = f64::from(area.height.saturating_sub(1));
    let pos = if max_scroll == 0 {
        0
    } else {
        (scroll as f64 / max_scroll as f64 * track_height) as u16
    };

    let x = area.right().saturating_sub(1);
    let y = area.y + pos;

    if y < area.bottom() {
        f.render_widget(Paragraph::new("█"), Rect::new(x, y, 1, 1));
    }
}

/// Draws until the user quits. Slow effects get a busy notice first.
pub fn run(app: &mut App) -> Result<()> {
    install_panic_hook();
    let mut session = TerminalSession::enter()?;
    let (width, height) = session.size()?;
    app.resize(width, height);
    info!(width, height, "terminal session started");

    loop {
        session.draw(&app.frame())?;

        match event::read()? {
            Event::Key(key) => {
                let Some(effect) = app.handle_key(key) else {
                    continue;
                };
                if let Some(message) = effect.busy_message() {
                    session.draw(&view::busy(message, app.width()))?;
                }
                if app.apply(effect).is_break() {
                    break;
                }
            }
            Event::Resize(width, height) => {
                debug!(width, height, "resize");
                app.resize(width, height);
            }
            _ => {}
        }
    }

    info!("terminal session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_failed_setup_restores_terminal() {
        let restored = Cell::new(false);
        let result: Result<()> = unwind_on_err(|| Err(anyhow::anyhow!("no tty")), || restored.set(true));
        assert!(result.is_err());
        assert!(restored.get());
    }

    #[test]
    fn test_successful_setup_leaves_terminal_alone() {
        let restored = Cell::new(false);
        let result = unwind_on_err(|| Ok(7), || restored.set(true));
        assert_eq!(result.unwrap(), 7);
        assert!(!restored.get());
    }
}
