//! Terminal stand-ins for the tester's display and buttons.

use std::io::{self, Write};
use std::time::Duration;

use colored::Colorize;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use log::warn;
use wirecheck_core::{LayoutView, Presenter, Selection, SelectionInput, Slot};

const COLUMN_WIDTH: u16 = 36;
const ROW_HEIGHT: u16 = 4;
const TOP: u16 = 2;
const LEFT: u16 = 2;

const INDICATOR_IDLE: &str = "○";
const INDICATOR_DONE: &str = "●";

/// Raw mode plus alternate screen for as long as it lives.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Draws one indicator per net, two per row, labels under each indicator.
pub struct TerminalPresenter<W: Write> {
    out: W,
    view: Option<LayoutView>,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out, view: None }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn origin(slot: Slot) -> (u16, u16) {
        (
            LEFT + slot.column as u16 * COLUMN_WIDTH,
            TOP + slot.row as u16 * ROW_HEIGHT,
        )
    }

    fn render_layout(&mut self, view: &LayoutView) -> io::Result<()> {
        queue!(
            self.out,
            Clear(ClearType::All),
            MoveTo(0, 0),
            Print(format!("#{} {}", view.index + 1, view.name).bold())
        )?;

        for net in &view.nets {
            let (x, y) = Self::origin(net.slot);
            queue!(self.out, MoveTo(x, y), Print(INDICATOR_IDLE))?;
            for (line, text) in net.label.lines().enumerate() {
                queue!(self.out, MoveTo(x + 2, y + line as u16), Print(text))?;
            }
        }

        let footer = TOP + view.rows() as u16 * ROW_HEIGHT;
        queue!(
            self.out,
            MoveTo(0, footer),
            Print("1-9, a-c: select layout   q: quit".dimmed())
        )?;
        self.out.flush()
    }

    fn render_verdict(&mut self, net: usize, passed: bool) -> io::Result<()> {
        let Some(slot) = self
            .view
            .as_ref()
            .and_then(|view| view.nets.get(net))
            .map(|net| net.slot)
        else {
            return Ok(());
        };

        let (x, y) = Self::origin(slot);
        let indicator = if passed {
            INDICATOR_DONE.green().bold()
        } else {
            INDICATOR_DONE.red().bold()
        };
        queue!(self.out, MoveTo(x, y), Print(indicator))?;
        self.out.flush()
    }

    fn render_halt(&mut self, message: &str) -> io::Result<()> {
        let (width, height) = terminal::size().unwrap_or((80, 24));
        let banner = format!("  {message}  ");
        let x = width.saturating_sub(banner.chars().count() as u16) / 2;
        queue!(
            self.out,
            Clear(ClearType::All),
            MoveTo(x, height / 2),
            Print(banner.white().on_red().bold()),
            MoveTo(x, height / 2 + 2),
            Print("press q to quit".dimmed())
        )?;
        self.out.flush()
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn draw_layout(&mut self, view: &LayoutView) {
        if let Err(e) = self.render_layout(view) {
            warn!("Failed to draw layout: {e}");
        }
        self.view = Some(view.clone());
    }

    fn show_verdict(&mut self, net: usize, passed: bool) {
        if let Err(e) = self.render_verdict(net, passed) {
            warn!("Failed to draw verdict: {e}");
        }
    }

    fn halt(&mut self, message: &str) {
        self.view = None;
        if let Err(e) = self.render_halt(message) {
            warn!("Failed to draw halt banner: {e}");
        }
    }
}

/// Keys `1`..`9` select layouts by number; `a`, `b`, `c` stand in for the
/// three buttons of the reference fixture.
pub struct Keyboard;

impl SelectionInput for Keyboard {
    fn poll(&mut self, timeout: Duration) -> io::Result<Option<Selection>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(selection_for(key)),
            _ => Ok(None),
        }
    }
}

pub fn selection_for(key: KeyEvent) -> Option<Selection> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Selection::Quit)
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(Selection::Quit),
        KeyCode::Char(c @ '1'..='9') => Some(Selection::Layout(c as usize - '1' as usize)),
        KeyCode::Char(c @ 'a'..='c') => Some(Selection::Layout(c as usize - 'a' as usize)),
        _ => None,
    }
}

/// Block until the operator asks to quit.
pub fn wait_for_quit(input: &mut dyn SelectionInput) -> io::Result<()> {
    loop {
        if input.poll(Duration::from_millis(250))? == Some(Selection::Quit) {
            return Ok(());
        }
    }
}
