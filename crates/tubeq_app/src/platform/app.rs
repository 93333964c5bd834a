use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use tubeq_core::{update, AppState, Effect, IdentityScheme, Msg};
use tubeq_engine::{BackendSettings, BackendVariant, OriginStorage};
use tubeq_logging::{tubeq_info, tubeq_warn};

use super::commands::{parse_command, Command, HELP};
use super::effects::EffectRunner;
use super::ui::palette::Palette;
use super::{logging, persistence, ui};
use crate::config::AppConfig;

/// Everything the dispatch loop reacts to, in arrival order.
pub enum AppEvent {
    Msg(Msg),
    Command(Command),
    InputClosed,
}

pub fn run_app(config: AppConfig, initial_links: Vec<String>) -> anyhow::Result<()> {
    logging::initialize(config.log.into());

    let settings = config.backend_settings();
    let storage = OriginStorage::for_origin(&config.storage_dir, &settings.base_url);
    tubeq_info!(
        "Starting tubeq backend={} variant={} storage={:?}",
        settings.base_url,
        settings.variant.as_str(),
        storage.dir()
    );

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(&settings, storage.clone(), event_tx.clone())
        .context("starting the network engine")?;

    let scheme = match settings.variant {
        BackendVariant::EventStream => IdentityScheme::ByUrl,
        BackendVariant::TaskPoll => IdentityScheme::ByTaskId,
    };
    let mut app = App {
        state: AppState::new(scheme),
        runner,
        settings,
        interactive: io::stdout().is_terminal(),
        outstanding_submits: 0,
        input_closed: false,
    };

    app.dispatch(Msg::RestoreHistory(persistence::load_history(&storage)));
    if let Some(theme) = persistence::load_theme(&storage) {
        app.dispatch(Msg::RestoreTheme(theme));
    }
    if !initial_links.is_empty() {
        app.submit_links(initial_links.join("\n"));
    }
    app.render();

    spawn_stdin_reader(event_tx);

    while let Ok(event) = event_rx.recv() {
        match event {
            AppEvent::Msg(msg) => app.dispatch(msg),
            AppEvent::Command(Command::Quit) => break,
            AppEvent::Command(command) => app.handle_command(command),
            AppEvent::InputClosed => {
                tubeq_info!("Input closed; exiting once the queue is idle");
                app.input_closed = true;
            }
        }
        app.render_if_dirty();
        if app.is_finished() {
            break;
        }
    }

    app.runner.shutdown();
    tubeq_info!("tubeq stopped");
    Ok(())
}

struct App {
    state: AppState,
    runner: EffectRunner,
    settings: BackendSettings,
    interactive: bool,
    /// Submissions sent to the backend and not answered yet.
    outstanding_submits: usize,
    input_closed: bool,
}

impl App {
    fn dispatch(&mut self, msg: Msg) {
        if matches!(
            msg,
            Msg::SubmissionAccepted { .. } | Msg::SubmissionFailed { .. }
        ) {
            self.outstanding_submits = self.outstanding_submits.saturating_sub(1);
        }
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.outstanding_submits += effects
            .iter()
            .filter(|effect| matches!(effect, Effect::Submit { .. }))
            .count();
        self.runner.run(effects);
    }

    fn submit_links(&mut self, input: String) {
        self.dispatch(Msg::InputChanged(input));
        self.dispatch(Msg::LinksSubmitted);
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Links(input) => self.submit_links(input),
            Command::Retry(row) => {
                let job_id = self
                    .state
                    .queue()
                    .all()
                    .get(row - 1)
                    .map(|record| record.id().clone());
                match job_id {
                    Some(job_id) => self.dispatch(Msg::RetryClicked { job_id }),
                    None => tubeq_warn!("No queue row {} to retry", row),
                }
            }
            Command::ClearQueue => self.dispatch(Msg::ClearQueueClicked),
            Command::ClearHistory => self.dispatch(Msg::ClearHistoryClicked),
            Command::ToggleTheme => self.dispatch(Msg::ThemeToggled),
            Command::DismissBanner => self.dispatch(Msg::DismissBanner),
            Command::Help => println!("{HELP}"),
            Command::Unknown(line) => println!("Unknown command {line:?}. {HELP}"),
            Command::Quit => {}
        }
    }

    fn is_finished(&self) -> bool {
        self.input_closed && self.outstanding_submits == 0 && !self.state.is_polling()
    }

    fn render_if_dirty(&mut self) {
        if self.state.consume_dirty() {
            self.render();
        }
    }

    fn render(&mut self) {
        self.state.consume_dirty();
        let view = self.state.view();
        let palette = Palette::new(view.theme, self.interactive);
        let lines = ui::render::render(&view, &self.settings, &palette);

        let mut out = io::stdout().lock();
        if self.interactive {
            let _ = write!(out, "\x1b[2J\x1b[H");
        }
        for line in lines {
            let _ = writeln!(out, "{line}");
        }
        let _ = out.flush();
    }
}

fn spawn_stdin_reader(events: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if let Some(command) = parse_command(&line) {
                let quit = command == Command::Quit;
                if events.send(AppEvent::Command(command)).is_err() || quit {
                    return;
                }
            }
        }
        let _ = events.send(AppEvent::InputClosed);
    });
}
