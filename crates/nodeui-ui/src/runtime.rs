use crate::component::Component;
use crate::setup::Setup;
use crate::{Command, Event, Exit, Theme, ThemeSettings, UiError};
use crossterm::{
    event::{self as term, Event as TermEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

const TICK_RATE: Duration = Duration::from_millis(100);
const INPUT_POLL: Duration = Duration::from_millis(100);

/// What one dispatch pass produced.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub commands: Vec<Command>,
    pub exit: Option<Exit>,
}

impl Dispatch {
    fn from_commands(commands: Vec<Command>) -> Self {
        let mut dispatch = Self::default();
        for command in commands {
            match command {
                Command::Quit(exit) => {
                    dispatch.exit.get_or_insert(exit);
                }
                task => dispatch.commands.push(task),
            }
        }
        dispatch
    }
}

/// Apply one event to the tree. Tasks are returned for scheduling; a quit
/// request ends up in `exit`.
pub fn dispatch(setup: &mut Setup, event: Event) -> Dispatch {
    Dispatch::from_commands(setup.update(&event))
}

/// Run the terminal UI until a component asks to quit.
///
/// # Errors
/// Returns `UiError` when terminal I/O fails.
pub async fn run(mut setup: Setup) -> Result<Exit, UiError> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut setup).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    setup: &mut Setup,
) -> Result<Exit, UiError> {
    let settings = ThemeSettings::resolve();
    let theme = Theme::for_mode(settings.mode, settings.color_level);

    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_input_thread(tx.clone());
    spawn_ticker(tx.clone());

    let initial = Dispatch::from_commands(setup.init());
    if let Some(exit) = initial.exit {
        return Ok(exit);
    }
    schedule(initial.commands, &tx);

    loop {
        terminal.draw(|f| setup.render(f.area(), f.buffer_mut(), &theme))?;

        let Some(event) = rx.recv().await else {
            return Ok(Exit::Requested);
        };
        let Dispatch { commands, exit } = dispatch(setup, event);
        if let Some(exit) = exit {
            info!(?exit, "Leaving dispatch loop");
            return Ok(exit);
        }
        schedule(commands, &tx);
    }
}

fn schedule(commands: Vec<Command>, tx: &UnboundedSender<Event>) {
    for command in commands {
        debug!(label = command.label(), delay = ?command.delay(), "Scheduling command");
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(event) = command.run().await {
                let _ = tx.send(event);
            }
        });
    }
}

fn spawn_ticker(tx: UnboundedSender<Event>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_RATE);
        loop {
            interval.tick().await;
            if tx.send(Event::Tick).is_err() {
                break;
            }
        }
    });
}

/// Crossterm reads block, so input gets its own thread.
fn spawn_input_thread(tx: UnboundedSender<Event>) {
    std::thread::spawn(move || {
        while !tx.is_closed() {
            match term::poll(INPUT_POLL) {
                Ok(false) => {}
                Ok(true) => {
                    let event = match term::read() {
                        Ok(TermEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                            Event::Key(key)
                        }
                        Ok(TermEvent::Resize(width, height)) => Event::Resize { width, height },
                        Ok(_) => continue,
                        Err(e) => {
                            warn!("Reading terminal input failed: {e}");
                            break;
                        }
                    };
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Polling terminal input failed: {e}");
                    break;
                }
            }
        }
    });
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, io::Error> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), io::Error> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
