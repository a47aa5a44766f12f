use crate::deploy::DeployStep;
use crate::pipeline::{assistant_reply, Generation, GENERATION_ERROR_REPLY};
use crate::sql::{generate_sql, SqlDialect};
use crate::types::{ChatMessage, Schema};
use std::cell::Cell;
use std::time::{Duration, Instant};

/// How long a notification stays on screen
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// Tab shown in the content pane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Diagram,
    Migrations,
}

/// Which pane currently has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Chat,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient message shown above the status line
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NoticeKind,
    pub message: String,
    pub expires_at: Instant,
}

/// What a rename edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameTarget {
    Table(usize),
    Field(usize, usize),
}

#[derive(Debug, Clone)]
pub struct RenameState {
    pub target: RenameTarget,
    pub buffer: String,
    pub cursor: usize,
}

/// Application state
#[derive(Debug)]
pub struct AppState {
    // Chat pane
    pub messages: Vec<ChatMessage>,
    next_message_id: u64,
    pub input: String,
    pub input_cursor: usize,
    pub chat_scroll: u16,
    /// Furthest the transcript can scroll back, recorded by the renderer
    pub chat_scroll_max: Cell<u16>,
    pub generating: bool,

    // Model server
    pub model_name: String,
    /// `None` while a probe is in flight
    pub model_online: Option<bool>,
    pub model_status: String,

    // Current generation
    pub schema: Option<Schema>,
    pub schema_is_placeholder: bool,
    pub sql_script: String,
    pub dialect: SqlDialect,

    // Content pane
    pub active_tab: Tab,
    pub selected_table: usize,
    pub selected_field: Option<usize>,
    pub sql_scroll: u16,
    pub sql_scroll_max: Cell<u16>,

    // Deployment
    pub deploy_target: Option<String>,
    pub deploying: Option<DeployStep>,

    // UI state
    pub focus: Focus,
    pub show_help: bool,
    pub confirm_reset: bool,
    pub rename: Option<RenameState>,
    pub notification: Option<Notification>,
}

impl AppState {
    pub fn new(model_name: String, dialect: SqlDialect, deploy_target: Option<String>) -> Self {
        Self {
            messages: Vec::new(),
            next_message_id: 1,
            input: String::new(),
            input_cursor: 0,
            chat_scroll: 0,
            chat_scroll_max: Cell::new(0),
            generating: false,
            model_name,
            model_online: None,
            model_status: "Checking model server...".to_string(),
            schema: None,
            schema_is_placeholder: false,
            sql_script: String::new(),
            dialect,
            active_tab: Tab::Diagram,
            selected_table: 0,
            selected_field: None,
            sql_scroll: 0,
            sql_scroll_max: Cell::new(0),
            deploy_target,
            deploying: None,
            focus: Focus::Chat,
            show_help: false,
            confirm_reset: false,
            rename: None,
            notification: None,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_message_id;
        self.next_message_id += 1;
        id
    }

    /// Record the user's message and the pending assistant placeholder
    pub fn begin_generation(&mut self, description: &str) {
        let id = self.next_id();
        self.messages.push(ChatMessage::user(id, description));
        let id = self.next_id();
        self.messages.push(ChatMessage::loading(id));
        self.generating = true;
        self.chat_scroll = 0;
    }

    fn finish_generation(&mut self) {
        self.messages.retain(|m| !m.loading);
        self.generating = false;
        self.chat_scroll = 0;
    }

    /// Install a generation result; a placeholder schema clears the script
    pub fn apply_generation(&mut self, description: &str, generation: Generation) {
        self.finish_generation();
        let id = self.next_id();

        match generation.sql {
            Some(sql) if !generation.is_fallback() => {
                let (content, tables) = assistant_reply(description, &generation.schema);
                self.messages
                    .push(ChatMessage::assistant(id, content).with_tables(tables));
                self.sql_script = sql;
                self.schema_is_placeholder = false;
            }
            _ => {
                self.messages
                    .push(ChatMessage::assistant(id, GENERATION_ERROR_REPLY));
                self.sql_script.clear();
                self.schema_is_placeholder = true;
                if self.active_tab == Tab::Migrations {
                    self.active_tab = Tab::Diagram;
                }
            }
        }

        self.schema = Some(generation.schema);
        self.selected_table = 0;
        self.selected_field = None;
        self.sql_scroll = 0;
    }

    /// Generation failed outright; the diagram stays as it was
    pub fn fail_generation(&mut self) {
        self.finish_generation();
        let id = self.next_id();
        self.messages
            .push(ChatMessage::assistant(id, GENERATION_ERROR_REPLY));
    }

    /// Forget the conversation and the current schema
    pub fn reset(&mut self) {
        self.messages.clear();
        self.input.clear();
        self.input_cursor = 0;
        self.chat_scroll = 0;
        self.schema = None;
        self.schema_is_placeholder = false;
        self.sql_script.clear();
        self.active_tab = Tab::Diagram;
        self.selected_table = 0;
        self.selected_field = None;
        self.sql_scroll = 0;
        self.rename = None;
        self.confirm_reset = false;
    }

    pub fn has_script(&self) -> bool {
        !self.sql_script.is_empty()
    }

    /// Switch tabs; Migrations stays disabled until a script exists
    pub fn set_tab(&mut self, tab: Tab) {
        if tab == Tab::Migrations && !self.has_script() {
            return;
        }
        self.active_tab = tab;
    }

    pub fn next_tab(&mut self) {
        match self.active_tab {
            Tab::Diagram => self.set_tab(Tab::Migrations),
            Tab::Migrations => self.set_tab(Tab::Diagram),
        }
    }

    /// Switch to the other pane
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Chat => Focus::Content,
            Focus::Content => Focus::Chat,
        };
    }

    fn table_count(&self) -> usize {
        self.schema.as_ref().map_or(0, |s| s.tables.len())
    }

    fn field_count(&self) -> usize {
        self.schema
            .as_ref()
            .and_then(|s| s.tables.get(self.selected_table))
            .map_or(0, |t| t.fields.len())
    }

    /// Move table selection up
    pub fn select_prev_table(&mut self) {
        let n = self.table_count();
        if n > 0 {
            self.selected_table = (self.selected_table + n - 1) % n;
            self.selected_field = None;
        }
    }

    /// Move table selection down
    pub fn select_next_table(&mut self) {
        let n = self.table_count();
        if n > 0 {
            self.selected_table = (self.selected_table + 1) % n;
            self.selected_field = None;
        }
    }

    pub fn select_next_field(&mut self) {
        let n = self.field_count();
        if n > 0 {
            self.selected_field = Some(match self.selected_field {
                Some(i) => (i + 1) % n,
                None => 0,
            });
        }
    }

    pub fn select_prev_field(&mut self) {
        let n = self.field_count();
        if n > 0 {
            self.selected_field = Some(match self.selected_field {
                Some(i) => (i + n - 1) % n,
                None => n - 1,
            });
        }
    }

    /// Open the rename prompt for the selected field, or the table if none
    pub fn begin_rename(&mut self) {
        if self.schema_is_placeholder {
            return;
        }
        let Some(table) = self
            .schema
            .as_ref()
            .and_then(|s| s.tables.get(self.selected_table))
        else {
            return;
        };

        let (target, current) = match self.selected_field.and_then(|i| table.fields.get(i).map(|f| (i, f))) {
            Some((i, field)) => (RenameTarget::Field(self.selected_table, i), field.name.clone()),
            None => (RenameTarget::Table(self.selected_table), table.label.clone()),
        };
        self.rename = Some(RenameState {
            target,
            cursor: current.chars().count(),
            buffer: current,
        });
    }

    /// Apply the pending rename and re-emit the script
    pub fn commit_rename(&mut self) -> bool {
        let Some(rename) = self.rename.take() else {
            return false;
        };
        let new_name = rename.buffer.trim().to_string();
        if new_name.is_empty() {
            return false;
        }
        let Some(schema) = self.schema.as_mut() else {
            return false;
        };

        match rename.target {
            RenameTarget::Table(t) => {
                let Some(old) = schema.tables.get(t).map(|table| table.label.clone()) else {
                    return false;
                };
                schema.tables[t].label = new_name.clone();
                for field in schema.tables.iter_mut().flat_map(|table| table.fields.iter_mut()) {
                    if field.references.as_deref() == Some(old.as_str()) {
                        field.references = Some(new_name.clone());
                    }
                }
            }
            RenameTarget::Field(t, f) => {
                match schema.tables.get_mut(t).and_then(|table| table.fields.get_mut(f)) {
                    Some(field) => field.name = new_name,
                    None => return false,
                }
            }
        }

        self.sql_script = generate_sql(&schema.tables, self.dialect);
        true
    }

    pub fn notify(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notification = Some(Notification {
            kind,
            message: message.into(),
            expires_at: Instant::now() + NOTIFICATION_TTL,
        });
    }

    /// Drop the notification once it has expired
    pub fn expire_notification(&mut self, now: Instant) {
        if self
            .notification
            .as_ref()
            .is_some_and(|n| now >= n.expires_at)
        {
            self.notification = None;
        }
    }

    pub fn scroll_up(&mut self) {
        match self.focus {
            Focus::Chat => {
                self.chat_scroll = self.chat_scroll.saturating_add(1).min(self.chat_scroll_max.get())
            }
            Focus::Content => self.scroll_sql(-1),
        }
    }

    pub fn scroll_down(&mut self) {
        match self.focus {
            Focus::Chat => self.chat_scroll = self.chat_scroll.saturating_sub(1),
            Focus::Content => self.scroll_sql(1),
        }
    }

    /// Move the SQL view by `delta` lines, staying within the script
    pub fn scroll_sql(&mut self, delta: i32) {
        let max = i32::from(self.sql_scroll_max.get());
        self.sql_scroll = (i32::from(self.sql_scroll) + delta).clamp(0, max) as u16;
    }
}
