//! Terminal setup and the single-threaded event loop.
//!
//! The loop owns all mutable session state. Background command execution
//! reports back over an mpsc channel; completions are drained here and fed
//! into the state machine, which may hand back the next command to dispatch.

pub mod app;
pub mod flows;
pub mod input;
pub mod ui;
pub mod validation;
mod widgets;

use crate::config::Config;
use crate::exec::{self, CompletionMsg};
use anyhow::{bail, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::mpsc;
use std::time::Duration;

use app::{App, InputResult, Mode};

pub fn run(config: Config) -> Result<()> {
    if !io::stdout().is_tty() {
        bail!("deckhand needs an interactive terminal");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    let result = run_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let (tx, rx) = mpsc::channel::<CompletionMsg>();

    loop {
        let size = terminal.size()?;
        app.set_viewport_rows(ui::body_rows(size.height));
        terminal.draw(|f| ui::draw(f, app))?;

        // Poll with a timeout so the spinner keeps animating while a command
        // is outstanding.
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => match app.handle_key(key) {
                    InputResult::Quit => {
                        log::info!("👋 Operator quit.");
                        return Ok(());
                    }
                    InputResult::StartQueue => dispatch_first(app, &tx),
                    InputResult::Continue => {}
                },
                Event::Resize(_, rows) => app.set_viewport_rows(ui::body_rows(rows)),
                _ => {}
            }
        }

        // Exactly one command is in flight per queue; the next one is only
        // dispatched after its predecessor's completion message lands here.
        while let Ok(msg) = rx.try_recv() {
            if let Some(next) = app.apply_completion(msg) {
                exec::spawn(&app.config.shell, &next.command, tx.clone());
            }
        }
    }
}

fn dispatch_first(app: &mut App, tx: &mpsc::Sender<CompletionMsg>) {
    if let Some(first) = app.queue.start() {
        log::info!("🛠️ Queue started: {}", first.description);
        exec::spawn(&app.config.shell, &first.command, tx.clone());
    } else {
        // An empty queue never enters Processing.
        app.status_message = "ℹ️ Nothing to do.".to_string();
        app.mode = Mode::Menu;
    }
}
