mod state;
mod text_editor;

use crate::config::Config;
use crate::deploy::DeployStep;
use crate::export::save_script;
use crate::worker::{Worker, WorkerMessage, WorkerResponse};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

pub use state::{AppState, Focus, NoticeKind, RenameState, RenameTarget, Tab};
use text_editor::handle_text_editor_input;

/// Main application controller
pub struct App {
    pub state: AppState,
    worker: Worker,
    out_dir: PathBuf,
    should_quit: bool,
}

impl App {
    pub fn new(worker: Worker, config: &Config) -> Self {
        Self {
            state: AppState::new(
                config.ollama.model.clone(),
                config.dialect,
                config.deploy.as_ref().map(|t| t.describe()),
            ),
            worker,
            out_dir: config.out_dir.clone(),
            should_quit: false,
        }
    }

    /// Check if application should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Ask the worker whether the model server is reachable
    pub fn probe_model(&mut self) {
        self.state.model_online = None;
        self.state.model_status = "Checking model server...".to_string();
        if let Err(e) = self.worker.send(WorkerMessage::Probe) {
            self.state.model_online = Some(false);
            self.state.model_status = format!("Worker unavailable: {}", e);
        }
    }

    /// Per-frame housekeeping
    pub fn tick(&mut self) {
        self.state.expire_notification(Instant::now());
    }

    /// Process worker responses
    pub fn process_worker_responses(&mut self) -> Result<(), io::Error> {
        while let Ok(Some(response)) = self.worker.try_recv() {
            match response {
                WorkerResponse::ModelOnline { version } => {
                    self.state.model_online = Some(true);
                    self.state.model_status = format!("Ollama {} · {}", version, self.state.model_name);
                }
                WorkerResponse::ModelOffline { message } => {
                    warn!(%message, "model server unreachable");
                    self.state.model_online = Some(false);
                    self.state.model_status = "Ollama is not running. Start it and press Ctrl+P".to_string();
                }
                WorkerResponse::Generated {
                    description,
                    generation,
                } => {
                    self.state.apply_generation(&description, generation);
                }
                WorkerResponse::GenerationFailed { .. } => {
                    self.state.fail_generation();
                }
                WorkerResponse::DeployProgress { step } => {
                    self.state.deploying = Some(step);
                }
                WorkerResponse::Deployed { report } => {
                    info!(executed = report.executed, target = %report.target, "deployment finished");
                    self.state.deploying = None;
                    self.state.notify(
                        NoticeKind::Success,
                        format!("Schema deployed to {} ({} statements)", report.target, report.executed),
                    );
                }
                WorkerResponse::DeployFailed { message } => {
                    self.state.deploying = None;
                    self.state.notify(NoticeKind::Error, message);
                }
            }
        }
        Ok(())
    }

    /// Handle a key event
    pub fn handle_key_event(&mut self, event: KeyEvent) -> Result<(), io::Error> {
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && event.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }

        // Overlays capture input first
        if self.state.deploying.is_some() {
            return Ok(());
        }
        if self.state.confirm_reset {
            match event.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.state.reset();
                    self.state.notify(NoticeKind::Success, "Conversation reset");
                }
                KeyCode::Char('n') | KeyCode::Esc => self.state.confirm_reset = false,
                _ => {}
            }
            return Ok(());
        }
        if self.state.show_help {
            if matches!(event.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.state.show_help = false;
            }
            return Ok(());
        }
        if self.state.rename.is_some() {
            self.handle_rename_key(event);
            return Ok(());
        }

        if ctrl {
            match event.code {
                KeyCode::Char('d') => {
                    self.start_deploy();
                    return Ok(());
                }
                KeyCode::Char('s') => {
                    self.save();
                    return Ok(());
                }
                KeyCode::Char('r') => {
                    self.state.confirm_reset = true;
                    return Ok(());
                }
                KeyCode::Char('p') => {
                    self.probe_model();
                    return Ok(());
                }
                _ => {}
            }
        }

        match event.code {
            KeyCode::Tab | KeyCode::BackTab => self.state.toggle_focus(),
            KeyCode::F(1) => self.state.show_help = true,
            _ => match self.state.focus {
                Focus::Chat => self.handle_chat_key(event),
                Focus::Content => self.handle_content_key(event),
            },
        }
        Ok(())
    }

    fn handle_chat_key(&mut self, event: KeyEvent) {
        match event.code {
            KeyCode::Enter => self.send_message(),
            KeyCode::Up => self.state.scroll_up(),
            KeyCode::Down => self.state.scroll_down(),
            KeyCode::Esc => self.state.focus = Focus::Content,
            _ => {
                handle_text_editor_input(event, &mut self.state.input, &mut self.state.input_cursor);
            }
        }
    }

    fn handle_content_key(&mut self, event: KeyEvent) {
        match event.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.show_help = true,
            KeyCode::Char('i') => self.state.focus = Focus::Chat,
            KeyCode::Char('1') => self.state.set_tab(Tab::Diagram),
            KeyCode::Char('2') => self.state.set_tab(Tab::Migrations),
            KeyCode::Left | KeyCode::Right => self.state.next_tab(),
            _ => match self.state.active_tab {
                Tab::Diagram => match event.code {
                    KeyCode::Up | KeyCode::Char('k') => self.state.select_prev_table(),
                    KeyCode::Down | KeyCode::Char('j') => self.state.select_next_table(),
                    KeyCode::Char(']') => self.state.select_next_field(),
                    KeyCode::Char('[') => self.state.select_prev_field(),
                    KeyCode::Char('r') => self.state.begin_rename(),
                    KeyCode::Esc => self.state.selected_field = None,
                    _ => {}
                },
                Tab::Migrations => match event.code {
                    KeyCode::Up | KeyCode::Char('k') => self.state.scroll_up(),
                    KeyCode::Down | KeyCode::Char('j') => self.state.scroll_down(),
                    KeyCode::PageUp => self.state.scroll_sql(-10),
                    KeyCode::PageDown => self.state.scroll_sql(10),
                    KeyCode::Home => self.state.sql_scroll = 0,
                    _ => {}
                },
            },
        }
    }

    fn handle_rename_key(&mut self, event: KeyEvent) {
        match event.code {
            KeyCode::Enter => {
                if self.state.commit_rename() {
                    self.state.notify(NoticeKind::Success, "Renamed; SQL script updated");
                }
            }
            KeyCode::Esc => self.state.rename = None,
            _ => {
                if let Some(rename) = self.state.rename.as_mut() {
                    handle_text_editor_input(event, &mut rename.buffer, &mut rename.cursor);
                }
            }
        }
    }

    /// Send the typed description to the model
    fn send_message(&mut self) {
        let description = self.state.input.trim().to_string();
        if description.is_empty() || self.state.generating {
            return;
        }
        if self.state.model_online == Some(false) {
            self.state.notify(
                NoticeKind::Error,
                "Ollama is not running. Start it and press Ctrl+P to retry",
            );
            return;
        }

        self.state.begin_generation(&description);
        self.state.input.clear();
        self.state.input_cursor = 0;
        if let Err(e) = self.worker.send(WorkerMessage::Generate { description }) {
            warn!(error = %e, "worker unavailable");
            self.state.fail_generation();
        }
    }

    /// Run the current script against the configured backend
    fn start_deploy(&mut self) {
        if !self.state.has_script() {
            self.state.notify(NoticeKind::Error, "Generate a schema before deploying");
            return;
        }
        if self.state.deploy_target.is_none() {
            self.state.notify(
                NoticeKind::Error,
                "No deployment target configured (use --sqlite or --supabase-url)",
            );
            return;
        }

        self.state.deploying = Some(DeployStep::PreparingSql);
        let script = self.state.sql_script.clone();
        if let Err(e) = self.worker.send(WorkerMessage::Deploy { script }) {
            self.state.deploying = None;
            self.state.notify(NoticeKind::Error, format!("Failed to start deployment: {}", e));
        }
    }

    /// Save the script as database_schema.sql in the output directory
    fn save(&mut self) {
        if !self.state.has_script() {
            self.state.notify(NoticeKind::Error, "There is no SQL script to save yet");
            return;
        }
        match save_script(&self.out_dir, &self.state.sql_script) {
            Ok(path) => {
                info!(path = %path.display(), "script saved");
                self.state
                    .notify(NoticeKind::Success, format!("Saved {}", path.display()));
            }
            Err(e) => self.state.notify(NoticeKind::Error, format!("{:#}", e)),
        }
    }

    /// Shutdown the application
    pub fn shutdown(self) -> Result<(), io::Error> {
        self.worker.shutdown().map_err(|e| {
            io::Error::new(io::ErrorKind::Other, format!("Failed to shutdown worker: {}", e))
        })
    }
}
