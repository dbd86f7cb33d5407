use std::{env, fs::File, io, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use log::{error, info};
use mlp_viz::{TrainingRun, VizConfig};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::{runtime, task, time};

use crate::{
    state::session::{Action, Session},
    ui::draw,
};

const FRAME: Duration = Duration::from_millis(50);
const LOG_FILE: &str = "mlp-viz-tui.log";

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
    }
}

/// Logs go to a file, the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let file = File::create(LOG_FILE).with_context(|| format!("cannot create '{LOG_FILE}'"))?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn spawn_run(run: TrainingRun) {
    task::spawn_local(async move {
        match run.run().await {
            Ok(outcome) => info!(
                steps = outcome.steps,
                cancelled = outcome.cancelled,
                live_tensors = outcome.live_tensors;
                "run ended"
            ),
            Err(e) => error!("run failed: {e}"),
        }
    });
}

/// Runs the TUI application.
///
/// Everything, training included, runs on one thread. The training run yields after every
/// sampled step, which is when the UI gets to repaint and handle input.
///
/// # Errors
/// Returns an error if the config can't be loaded or terminal setup or rendering fails.
pub fn run() -> Result<()> {
    init_logging()?;

    let config = match env::args().nth(1) {
        Some(path) => VizConfig::load(&path).with_context(|| format!("cannot load '{path}'"))?,
        None => VizConfig::default(),
    };

    let rt = runtime::Builder::new_current_thread().enable_all().build()?;
    let local = task::LocalSet::new();
    local.block_on(&rt, event_loop(config))
}

async fn event_loop(config: VizConfig) -> Result<()> {
    let _guard = TerminalGuard::enter()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut session = Session::new(&config);
    let mut events = EventStream::new();
    let mut frames = time::interval(FRAME);

    loop {
        session.tick();
        terminal.draw(|f| draw::draw(f, &mut session))?;

        tokio::select! {
            _ = frames.tick() => {}
            event = events.next() => {
                let Some(event) = event else { break };
                match event? {
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        match session.handle_key(k.code) {
                            Action::Quit => break,
                            Action::Start(run) => spawn_run(run),
                            Action::None => {}
                        }
                    }
                    Event::Mouse(m) if matches!(m.kind, MouseEventKind::Moved) => {
                        session.handle_mouse(m.column, m.row);
                    }
                    _ => {}
                }
            }
        }
    }

    session.viz().cancel();
    terminal.show_cursor()?;
    Ok(())
}
