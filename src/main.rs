use anyhow::{Context, Result};
use catadmin::api::{format_api_error, ApiClient, ApiError, Credentials, RetryPolicy};
use catadmin::config::Config;
use catadmin::hook::{HookOptions, ResourceHook};
use catadmin::model::{extract_json_value, ColumnDef, HttpMethod, ListParams, ModelConfig, ModelRegistry, SortOrder};
use catadmin::store::Store;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Admin console for catalog and customer data
#[derive(Parser, Debug)]
#[command(name = "catadmin", version, about, long_about = None)]
struct Args {
    /// Backend base URL
    #[arg(long)]
    base_url: Option<String>,

    /// API key
    #[arg(long)]
    api_key: Option<String>,

    /// Bearer token
    #[arg(long)]
    token: Option<String>,

    /// Extra model definitions (JSON or YAML)
    #[arg(long)]
    models: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Run in read-only mode (block all write operations)
    #[arg(long)]
    readonly: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the registered models
    Models,
    /// List one page of one or more models
    List {
        #[arg(required = true)]
        models: Vec<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        /// Sort field
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending (ascending otherwise)
        #[arg(long, requires = "sort")]
        desc: bool,
        /// Free-text search
        #[arg(long)]
        search: Option<String>,
        /// Filter as field=value (value parsed as JSON when possible)
        #[arg(long = "filter", value_name = "FIELD=VALUE")]
        filters: Vec<String>,
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one item
    Get { model: String, id: String },
    /// Create an item from a JSON object
    Create {
        model: String,
        #[arg(long)]
        data: String,
    },
    /// Update an item with a JSON object of changes
    Update {
        model: String,
        id: String,
        #[arg(long)]
        data: String,
    },
    /// Delete an item
    Delete { model: String, id: String },
    /// Run a custom action (activate, duplicate, reorder, ...)
    Action {
        model: String,
        action: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        data: Option<String>,
        #[arg(long, value_enum)]
        method: Option<MethodArg>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<MethodArg> for HttpMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Get => HttpMethod::Get,
            MethodArg::Post => HttpMethod::Post,
            MethodArg::Put => HttpMethod::Put,
            MethodArg::Patch => HttpMethod::Patch,
            MethodArg::Delete => HttpMethod::Delete,
        }
    }
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

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("catadmin started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = Config::config_dir() {
        return config_dir.join("catadmin.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".catadmin").join("catadmin.log");
    }
    PathBuf::from("catadmin.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let store = build_store(&args)?;

    if let Err(err) = run(&store, args.command).await {
        match err.downcast_ref::<ApiError>() {
            Some(api_err) => eprintln!("Error: {}", format_api_error(api_err)),
            None => eprintln!("Error: {err:?}"),
        }
        std::process::exit(1);
    }

    Ok(())
}

fn build_store(args: &Args) -> Result<Store> {
    let config = Config::load();
    let base_url = config.effective_base_url(args.base_url.as_deref());
    tracing::info!("Using backend: {}", base_url);

    let credentials = Credentials::new(
        args.api_key.clone().or(config.api_key.clone()),
        args.token.clone().or(config.token.clone()),
    );
    let retry: RetryPolicy = config.retry.into();
    let api = ApiClient::new(&base_url, credentials)?.with_retry(retry);

    let mut models = ModelRegistry::builtin().clone();
    if let Some(path) = args.models.as_ref().or(config.models_file.as_ref()) {
        models
            .load_overlay(path)
            .with_context(|| format!("Failed to load models from {}", path.display()))?;
    }
    if args.readonly {
        tracing::info!("Read-only mode: write operations disabled");
        models = models.read_only();
    }

    Ok(Store::new(models, api))
}

async fn run(store: &Store, command: Command) -> Result<()> {
    let hook = |name: &str| ResourceHook::from_store(store, name, HookOptions::default().with_auto_fetch(false));

    match command {
        Command::Models => {
            for name in store.models().names() {
                print_model(&store.models().get_config(name));
            }
        }
        Command::List {
            models,
            page,
            page_size,
            sort,
            desc,
            search,
            filters,
            json,
        } => {
            let mut params = ListParams::new();
            params.page = page;
            params.page_size = page_size;
            params.query = search;
            if let Some(field) = sort {
                let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
                params = params.sort(field, order);
            }
            for filter in &filters {
                let (field, value) = parse_filter(filter)?;
                params = params.filter(field, value);
            }

            let hooks: Vec<ResourceHook> = models.iter().map(|m| hook(m.as_str())).collect();
            let results =
                futures::future::join_all(hooks.iter().map(|h| h.fetch_list(params.clone()))).await;

            for (h, result) in hooks.iter().zip(results) {
                let result = result?;
                let config = h.container().config();
                if json {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                } else {
                    println!(
                        "{} - page {}/{} ({} total)",
                        config.display_name,
                        result.page,
                        result.total_pages.max(1),
                        result.total
                    );
                    print_table(config, &result.items);
                    println!();
                }
            }
        }
        Command::Get { model, id } => {
            let item = hook(model.as_str()).fetch_by_id(&id).await?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        Command::Create { model, data } => {
            let item = hook(model.as_str()).create(parse_json(&data)?).await?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        Command::Update { model, id, data } => {
            let item = hook(model.as_str()).update(&id, parse_json(&data)?).await?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        Command::Delete { model, id } => {
            let echo = hook(model.as_str()).remove(&id).await?;
            println!("{}", serde_json::to_string_pretty(&echo)?);
        }
        Command::Action {
            model,
            action,
            id,
            data,
            method,
        } => {
            let payload = data.as_deref().map(parse_json).transpose()?;
            let result = hook(model.as_str())
                .custom_action(&action, id.as_deref(), payload, method.map(Into::into))
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn parse_json(data: &str) -> Result<Value> {
    serde_json::from_str(data).context("--data must be valid JSON")
}

/// `field=value`; the value is parsed as JSON when possible, else kept as text
fn parse_filter(filter: &str) -> Result<(String, Value)> {
    let (field, raw) = filter
        .split_once('=')
        .with_context(|| format!("Filter '{}' must look like field=value", filter))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((field.trim().to_string(), value))
}

fn print_model(config: &ModelConfig) {
    let mut ops = Vec::new();
    if config.endpoints.list.is_some() {
        ops.push("list");
    }
    if config.endpoints.get.is_some() {
        ops.push("get");
    }
    if config.can_create() {
        ops.push("create");
    }
    if config.can_update() {
        ops.push("update");
    }
    if config.can_delete() {
        ops.push("delete");
    }
    let actions: Vec<&str> = config.custom_actions.keys().map(|s| s.as_str()).collect();

    println!(
        "{:<14} {:<20} {:<32} {}",
        config.name,
        config.display_name,
        ops.join(","),
        actions.join(",")
    );
}

fn print_table(config: &ModelConfig, items: &[Value]) {
    let columns = if config.columns.is_empty() {
        vec![
            ColumnDef {
                header: "ID".into(),
                json_path: "id".into(),
                width: 8,
            },
            ColumnDef {
                header: "NAME".into(),
                json_path: "name".into(),
                width: 32,
            },
        ]
    } else {
        config.columns.clone()
    };

    let header: Vec<String> = columns.iter().map(|c| fit(&c.header, c.width)).collect();
    println!("{}", header.join(" "));

    for item in items {
        let row: Vec<String> = columns
            .iter()
            .map(|c| fit(&extract_json_value(item, &c.json_path), c.width))
            .collect();
        println!("{}", row.join(" "));
    }
}

/// Pad or truncate to exactly `width` characters
fn fit(value: &str, width: u16) -> String {
    let width = usize::from(width);
    let count = value.chars().count();
    if count > width {
        let truncated: String = value.chars().take(width.saturating_sub(1)).collect();
        format!("{}~", truncated)
    } else {
        format!("{}{}", value, " ".repeat(width - count))
    }
}
