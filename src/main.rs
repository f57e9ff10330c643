mod app;
mod event;
mod ui;

use anyhow::Result;
use app::{App, LiveSource};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tibm::config::Config;
use tibm::ibm::http::IbmHttpClient;
use tibm::ibm::{acquire_token, ApiKey, IbmClient};
use tibm::inventory::{validate_inputs, Inventory, Origin};
use tibm::resource::{
    export_to_file, export_to_url, fetch_all_configs, get_view, ResourceRecord, ServiceFilter,
};
use tibm::VERSION;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use ui::splash::{render as render_splash, SplashState};

/// Inventory of IBM Cloud resources from a config aggregator instance
#[derive(Parser, Debug)]
#[command(name = "tibm", version, about, long_about = None)]
struct Args {
    /// Config aggregator instance id
    #[arg(long, env = "TIBM_INSTANCE_ID")]
    instance_id: Option<String>,

    /// IBM Cloud API key
    #[arg(long, env = "IBMCLOUD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Region hosting the aggregator instance
    #[arg(short, long)]
    region: Option<String>,

    /// IAM endpoint override
    #[arg(long)]
    iam_url: Option<String>,

    /// Aggregator endpoint override (takes precedence over region)
    #[arg(long)]
    aggregator_url: Option<String>,

    /// Initial filter: all, vsi, kubernetes-worker or a literal service name
    #[arg(short, long)]
    service: Option<String>,

    /// Ask the server to filter by the selected service
    #[arg(long)]
    server_filter: bool,

    /// Load a previously exported snapshot instead of querying the service
    #[arg(long, value_name = "PATH")]
    from_file: Option<PathBuf>,

    /// Write the raw dataset to a file after the run
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// POST the raw dataset to a URL after the run
    #[arg(long, value_name = "URL")]
    export_url: Option<String>,

    /// How to present the results
    #[arg(short, long, value_enum, default_value = "tui")]
    output: OutputMode,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputMode {
    Tui,
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", log_path.display(), e);
            return None;
        },
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(tracing_level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("tibm {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("tibm").join("tibm.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tibm").join("tibm.log");
    }
    PathBuf::from("tibm.log")
}

/// Where the records of a run come from
enum Source {
    Snapshot(PathBuf),
    Live(LiveSource),
}

/// Everything a run needs, resolved from CLI flags and the config file
struct RunContext {
    config: Config,
    region: String,
    filter: ServiceFilter,
    source: Source,
}

impl RunContext {
    fn resolve(args: &Args) -> Result<Self> {
        let config = Config::load();
        let region = config.effective_region(args.region.as_deref());
        let filter = config.effective_filter(args.service.as_deref());

        let source = if let Some(path) = &args.from_file {
            Source::Snapshot(path.clone())
        } else {
            let endpoints = config.effective_endpoints(
                args.iam_url.as_deref(),
                args.aggregator_url.as_deref(),
                args.region.as_deref(),
            )?;
            let instance_id = config.effective_instance_id(args.instance_id.as_deref());
            Source::Live(LiveSource {
                client: IbmClient::new(endpoints, &instance_id)?,
                api_key: ApiKey::new(args.api_key.clone().unwrap_or_default()),
                server_filter: args.server_filter,
            })
        };

        Ok(Self {
            config,
            region,
            filter,
            source,
        })
    }

    fn live(&self) -> Option<&LiveSource> {
        match &self.source {
            Source::Live(live) => Some(live),
            Source::Snapshot(_) => None,
        }
    }

    fn server_service_name(&self) -> Option<&str> {
        match self.live() {
            Some(live) if live.server_filter => self.filter.server_service_name(),
            _ => None,
        }
    }

    /// Persist the inputs of a successful live run
    fn remember(&mut self, filter: &ServiceFilter) {
        let Source::Live(live) = &self.source else {
            return;
        };
        self.config
            .remember_run(&live.client.instance_id, &self.region, filter);
        if let Err(e) = self.config.save() {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_guard = setup_logging(args.log_level);

    let result = match args.output {
        OutputMode::Tui => run_tui(&args).await,
        OutputMode::Table | OutputMode::Json => run_batch(&args).await,
    };

    if let Err(err) = result {
        match upstream_status(&err) {
            Some(status) => tracing::error!(status, "Run failed: {:#}", err),
            None => tracing::error!("Run failed: {:#}", err),
        }
        eprintln!("{}", err);
        // Flush the log writer before exiting
        drop(log_guard);
        std::process::exit(1);
    }
}

/// HTTP status of the upstream call that ended the run, if one did
fn upstream_status(err: &anyhow::Error) -> Option<u16> {
    err.downcast_ref::<tibm::error::Error>()
        .and_then(tibm::error::Error::http_status)
}

/// Collect, export and print without a terminal UI
async fn run_batch(args: &Args) -> Result<()> {
    let mut ctx = RunContext::resolve(args)?;

    let inventory = match &ctx.source {
        Source::Snapshot(path) => Inventory::from_snapshot(path)?,
        Source::Live(live) => {
            Inventory::collect(&live.client, &live.api_key, ctx.server_service_name()).await?
        },
    };

    export_requested(args, &inventory).await?;

    let visible = inventory.visible(&ctx.filter);
    match args.output {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&visible)?);
        },
        _ => {
            for line in summary_lines(&inventory, visible.len()) {
                println!("{}", line);
            }
            print!("{}", format_table(&visible, &ctx.filter));
        },
    }

    let filter = ctx.filter.clone();
    ctx.remember(&filter);
    Ok(())
}

/// Count lines printed above the table: matches first, then run totals
fn summary_lines(inventory: &Inventory, shown: usize) -> Vec<String> {
    let mut lines = vec![format!("{} results loaded", shown)];
    if shown != inventory.records.len() || inventory.discarded > 0 {
        lines.push(format!(
            "{} records in total, {} discarded (missing about or config)",
            inventory.records.len(),
            inventory.discarded
        ));
    }
    lines
}

/// Apply `--export` and `--export-url` to a finished run
async fn export_requested(args: &Args, inventory: &Inventory) -> Result<()> {
    if let Some(path) = &args.export {
        export_to_file(&inventory.raw, path)?;
    }
    if let Some(url) = &args.export_url {
        let http = IbmHttpClient::new()?;
        export_to_url(&http, &inventory.raw, url).await?;
    }
    Ok(())
}

/// Render records as a fixed-width text table using the filter's columns
fn format_table(records: &[&ResourceRecord], filter: &ServiceFilter) -> String {
    const MAX_WIDTH: usize = 40;

    let Some(view) = get_view(filter) else {
        return String::new();
    };

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            let value = record.to_value();
            view.columns.iter().map(|col| col.render(&value)).collect()
        })
        .collect();

    let widths: Vec<usize> = view
        .columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(col.header.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_WIDTH)
        })
        .collect();

    let headers: Vec<&str> = view.columns.iter().map(|c| c.header.as_str()).collect();
    let mut out = pad_row(&headers, &widths);
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&pad_row(&cells, &widths));
    }
    out
}

fn pad_row(cells: &[&str], widths: &[usize]) -> String {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let clipped: String = cell.chars().take(*width).collect();
            format!("{:<width$}", clipped, width = *width)
        })
        .collect();
    format!("{}\n", line.join("  ").trim_end())
}

async fn run_tui(args: &Args) -> Result<()> {
    let ctx = RunContext::resolve(args)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = initialize_with_splash(&mut terminal, args, ctx).await;

    match result {
        Ok(Some((mut app, mut ctx))) => {
            let run_result = run_app(&mut terminal, &mut app).await;
            cleanup_terminal(&mut terminal)?;

            ctx.config = app.config.clone();
            if app.inventory.is_live() {
                ctx.remember(&app.service_filter);
            }
            run_result
        },
        Ok(None) => cleanup_terminal(&mut terminal),
        Err(err) => {
            cleanup_terminal(&mut terminal)?;
            Err(err)
        },
    }
}

fn cleanup_terminal<B: Backend + std::io::Write>(terminal: &mut Terminal<B>) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

async fn initialize_with_splash<B: Backend>(
    terminal: &mut Terminal<B>,
    args: &Args,
    ctx: RunContext,
) -> Result<Option<(App, RunContext)>>
where
    B::Error: Send + Sync + 'static,
{
    let mut splash = match &ctx.source {
        Source::Snapshot(_) => SplashState::snapshot(),
        Source::Live(_) => SplashState::new(),
    };
    terminal.draw(|f| render_splash(f, &splash))?;

    if check_abort()? {
        return Ok(None);
    }

    let inventory = match &ctx.source {
        Source::Snapshot(path) => {
            splash.set_message(&format!("Reading {}", path.display()));
            terminal.draw(|f| render_splash(f, &splash))?;
            let inventory = Inventory::from_snapshot(path)?;
            splash.complete_step();
            splash.complete_step();
            inventory
        },
        Source::Live(live) => {
            validate_inputs(&live.api_key, &live.client.instance_id)?;

            // Step 1: Exchange the API key
            splash.set_message("Authenticating with IAM");
            terminal.draw(|f| render_splash(f, &splash))?;
            let token = acquire_token(&live.client, &live.api_key).await?;
            splash.complete_step();

            if check_abort()? {
                return Ok(None);
            }

            // Step 2: Page through the listing
            splash.set_message(&format!("Fetching configs [{}]", live.client.instance_id));
            terminal.draw(|f| render_splash(f, &splash))?;
            let raw = fetch_all_configs(&live.client, &token, ctx.server_service_name()).await?;
            splash.complete_step();

            // Step 3: Normalize
            splash.set_message(&format!("Normalizing {} records", raw.len()));
            terminal.draw(|f| render_splash(f, &splash))?;
            let inventory = Inventory::from_raw(
                Origin::Live {
                    instance_id: live.client.instance_id.clone(),
                },
                raw,
            );
            splash.complete_step();
            inventory
        },
    };

    tracing::info!(
        "{} results loaded ({} discarded)",
        inventory.records.len(),
        inventory.discarded
    );

    export_requested(args, &inventory).await?;

    splash.set_message("Ready!");
    terminal.draw(|f| render_splash(f, &splash))?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut app = App::new(
        ctx.live().cloned(),
        inventory,
        ctx.region.clone(),
        ctx.filter.clone(),
        ctx.config.clone(),
    );
    if app.inventory.is_live() {
        app.status_message = Some("All configs loaded successfully!".to_string());
    }

    Ok(Some((app, ctx)))
}

fn check_abort() -> Result<bool> {
    if poll(Duration::from_millis(50))? {
        if let Event::Key(key) = read()? {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if app.needs_refresh() {
            app.refresh().await?;
            continue;
        }

        if event::handle_events(app).await? {
            return Ok(());
        }
    }
}
