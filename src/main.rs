mod app;
mod config;
mod deploy;
mod export;
mod extract;
mod layout;
mod llm;
mod pipeline;
mod sql;
mod types;
mod ui;
mod worker;

use anyhow::{bail, Context, Result};
use app::App;
use clap::{Parser, Subcommand};
use config::{Config, DeployTarget, OllamaConfig, SupabaseConfig};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use export::{export, ExportFormat};
use llm::{ModelClient, OllamaClient};
use ratatui::{backend::CrosstermBackend, Terminal};
use sql::SqlDialect;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemachat")]
#[command(about = "Describe a database in plain language, get an ER diagram and a SQL migration")]
struct Cli {
    /// Ollama server URL
    #[arg(long, env = "OLLAMA_HOST", default_value = config::DEFAULT_OLLAMA_URL)]
    ollama_url: String,

    /// Model name
    #[arg(long, env = "SCHEMACHAT_MODEL", default_value = config::DEFAULT_MODEL)]
    model: String,

    /// Model request timeout in seconds (0 waits forever)
    #[arg(long, env = "SCHEMACHAT_TIMEOUT_SECS", default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Deploy to a local SQLite file
    #[arg(long, env = "SCHEMACHAT_SQLITE", value_name = "PATH", conflicts_with = "supabase_url")]
    sqlite: Option<PathBuf>,

    /// Deploy to a Supabase project
    #[arg(long, env = "SUPABASE_URL", value_name = "URL")]
    supabase_url: Option<String>,

    /// Supabase anonymous API key
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    supabase_anon_key: Option<String>,

    /// Access token of a signed-in Supabase session
    #[arg(long, env = "SUPABASE_ACCESS_TOKEN", hide_env_values = true)]
    supabase_access_token: Option<String>,

    /// SQL dialect (defaults from the deploy target)
    #[arg(long, value_enum)]
    dialect: Option<DialectArg>,

    /// Directory the script is saved to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Write logs to this file while the TUI is running
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a schema from a description without the TUI
    Generate {
        /// Plain-language description of the database
        prompt: String,

        /// Output file path (defaults to database_schema.<ext> in --out-dir)
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "sql")]
        format: ExportFormatArg,
    },
    /// Deploy a SQL script to the configured backend
    Deploy {
        /// Script to run
        sql_file: PathBuf,
    },
    /// Check that the model server is reachable
    Probe,
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum ExportFormatArg {
    Sql,
    Json,
    Csv,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(fmt: ExportFormatArg) -> Self {
        match fmt {
            ExportFormatArg::Sql => ExportFormat::Sql,
            ExportFormatArg::Json => ExportFormat::Json,
            ExportFormatArg::Csv => ExportFormat::Csv,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum DialectArg {
    Postgres,
    Sqlite,
}

impl From<DialectArg> for SqlDialect {
    fn from(dialect: DialectArg) -> Self {
        match dialect {
            DialectArg::Postgres => SqlDialect::Postgres,
            DialectArg::Sqlite => SqlDialect::Sqlite,
        }
    }
}

impl Cli {
    fn config(&self) -> Config {
        let deploy = match (&self.sqlite, &self.supabase_url) {
            (Some(path), _) => Some(DeployTarget::Sqlite(path.clone())),
            (None, Some(url)) => Some(DeployTarget::Supabase(SupabaseConfig {
                url: Some(url.clone()),
                anon_key: self.supabase_anon_key.clone(),
                access_token: self.supabase_access_token.clone(),
            })),
            (None, None) => None,
        };

        Config::new(
            OllamaConfig::new(self.ollama_url.clone(), self.model.clone(), self.timeout_secs),
            deploy,
            self.dialect.map(Into::into),
            self.out_dir.clone(),
        )
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Logs go to stderr for subcommands; the TUI owns the terminal, so there
/// they go to `log_file` or nowhere.
fn init_tracing(tui: bool, log_file: Option<&Path>) -> Result<()> {
    match (tui, log_file) {
        (_, Some(path)) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        (true, None) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(io::sink)
                .init();
        }
        (false, None) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.command.is_none(), cli.log_file.as_deref())?;
    let config = cli.config();

    match cli.command {
        Some(Commands::Generate {
            prompt,
            out,
            format,
        }) => run_generate(&config, &prompt, out, format.into()),
        Some(Commands::Deploy { sql_file }) => run_deploy(&config, &sql_file),
        Some(Commands::Probe) => run_probe(&config),
        None => run_tui(config),
    }
}

fn run_generate(config: &Config, prompt: &str, out: Option<PathBuf>, format: ExportFormat) -> Result<()> {
    let client = OllamaClient::new(&config.ollama)?;
    let generation = pipeline::generate(&client, prompt, config.dialect)?;

    let Some(sql) = generation.sql else {
        bail!(
            "{} ({})",
            pipeline::GENERATION_ERROR_REPLY,
            generation.fallback.unwrap_or_default()
        );
    };

    let output_path = out.unwrap_or_else(|| config.out_dir.join(format.default_file_name()));
    export(&generation.schema, &sql, config.dialect, format, &output_path)?;

    info!(tables = generation.schema.tables.len(), path = %output_path.display(), "schema exported");
    println!("Exported to: {}", output_path.display());
    Ok(())
}

fn run_deploy(config: &Config, sql_file: &Path) -> Result<()> {
    let script = std::fs::read_to_string(sql_file)
        .with_context(|| format!("Failed to read SQL file: {}", sql_file.display()))?;

    let mut executor = deploy::open_executor(config.deploy.as_ref())?;
    let report = deploy::deploy(&script, executor.as_mut(), |step| {
        eprintln!("[{}/{}] {}", step.number(), deploy::DeployStep::ALL.len(), step.label());
    })?;

    println!("Executed {} statements on {}", report.executed, report.target);
    Ok(())
}

fn run_probe(config: &Config) -> Result<()> {
    let client = OllamaClient::new(&config.ollama)?;
    let version = client.probe()?;
    println!(
        "Ollama {} reachable at {} (model: {})",
        version,
        config.ollama.base_url,
        client.model()
    );
    Ok(())
}

fn run_tui(config: Config) -> Result<()> {
    let client = OllamaClient::new(&config.ollama)?;

    // Create worker owning the model client and deploy target
    let worker = worker::Worker::new(Box::new(client), config.deploy.clone(), config.dialect);

    let mut app = App::new(worker, &config);
    app.probe_model();

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Main event loop
    loop {
        terminal.draw(|f| ui::render(f, &app))?;

        if app.should_quit() {
            break;
        }

        app.process_worker_responses()?;
        app.tick();

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key_event(key)?;
                }
                Event::Resize(_, _) => {
                    // Terminal will automatically redraw on next draw() call
                }
                _ => {}
            }
        }
    }

    // Cleanup
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app.shutdown()?;

    Ok(())
}
