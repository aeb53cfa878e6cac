// FormRelay - relays form submissions to a workflow engine and renders the result
// License: Apache-2.0

use clap::{Parser, Subcommand};
use formrelay::config::Config;
use formrelay::content::ContentKind;
use formrelay::upstream::factory::create_forwarder;
use formrelay::upstream::{Forwarder, SubmissionPayload, UpstreamResult};
use formrelay::web::handlers::RenderResponse;
use formrelay::web::{self, AppState};
use formrelay::workflow::pipeline::{WorkoutPipeline, WorkoutRequest};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "formrelay",
    about = "FormRelay - relay form submissions to a workflow engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Config file path
        #[arg(short, long)]
        config: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Forward one submission and print the result
    Run {
        /// Workflow id (e.g. story, food, business, market-analysis)
        #[arg(short, long)]
        workflow: String,
        /// Form field as key=value (repeatable)
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
        /// Render the result as HTML using the workflow's content kind
        #[arg(long)]
        render: bool,
        /// Print the outcome as JSON
        #[arg(long, conflicts_with = "render")]
        json: bool,
        /// Config file path
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Run the two-step workout and meal plan pipeline
    Workout {
        #[arg(long)]
        bodypart: String,
        #[arg(long)]
        difficulty: String,
        #[arg(long)]
        time: String,
        /// Config file path
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Parse and render text from a file or stdin
    Render {
        /// Content kind: story, food, business or workout
        #[arg(short, long)]
        kind: String,
        /// Input file (stdin when omitted)
        file: Option<PathBuf>,
        /// Print parsed sections and blocks as JSON instead of HTML
        #[arg(long)]
        json: bool,
    },
    /// List the workflow catalog
    Workflows {
        /// Config file path
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Show configuration status
    Status {
        /// Config file path
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Show version information
    Version,
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.trim().is_empty() {
        return Err(format!("empty field name in '{}'", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // One-shot commands print results on stdout; keep the log quiet unless asked.
    let level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    formrelay::logger::init(level);

    match cli.command {
        Commands::Serve { config, port } => serve_cmd(config, port).await,
        Commands::Run {
            workflow,
            fields,
            render,
            json,
            config,
        } => run_cmd(workflow, fields, render, json, config).await,
        Commands::Workout {
            bodypart,
            difficulty,
            time,
            config,
        } => {
            let request = WorkoutRequest {
                bodypart,
                difficulty,
                time,
            };
            workout_cmd(request, config).await
        }
        Commands::Render { kind, file, json } => render_cmd(&kind, file, json),
        Commands::Workflows { config } => workflows_cmd(config),
        Commands::Status { config } => status_cmd(config),
        Commands::Version => version_cmd(),
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

async fn serve_cmd(config_path: Option<String>, port: Option<u16>) {
    let cfg = load_config(config_path.as_deref());
    let forwarder = forwarder_or_exit(&cfg);

    let port = port.unwrap_or(cfg.server.port);
    let addr = match format!("{}:{}", cfg.server.host, port).parse::<std::net::SocketAddr>() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Invalid server address {}:{}: {}", cfg.server.host, port, e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(Arc::new(forwarder)));
    println!("FormRelay listening on http://{}", addr);

    if let Err(e) = web::start_server(addr, state, cfg.server.cors).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// One-shot commands
// ---------------------------------------------------------------------------

async fn run_cmd(
    workflow: String,
    fields: Vec<(String, String)>,
    render: bool,
    json: bool,
    config_path: Option<String>,
) {
    let cfg = load_config(config_path.as_deref());
    let forwarder = forwarder_or_exit(&cfg);
    let payload = fields
        .into_iter()
        .fold(SubmissionPayload::new(workflow.as_str()), |p, (k, v)| p.field(k, v));

    let outcome = forwarder.submit(&payload).await;

    if json {
        let summary = UpstreamResult::from(&outcome);
        match serde_json::to_string_pretty(&summary) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Failed to encode result: {}", e),
        }
        if let Err(e) = &outcome {
            std::process::exit(e.exit_code());
        }
        return;
    }

    match outcome {
        Ok(reply) if render => {
            let kind = content_kind_for(&forwarder, &workflow);
            println!("{}", RenderResponse::build(kind, &reply.result).html);
        }
        Ok(reply) => println!("{}", reply.result),
        Err(e) => {
            eprintln!("Error: {}", e.client_message());
            std::process::exit(e.exit_code());
        }
    }
}

/// Workflows without a declared kind render as a plain document.
fn content_kind_for(forwarder: &Forwarder, workflow: &str) -> ContentKind {
    forwarder
        .catalog()
        .get(workflow)
        .and_then(|wf| wf.content_kind)
        .unwrap_or(ContentKind::Business)
}

async fn workout_cmd(request: WorkoutRequest, config_path: Option<String>) {
    let cfg = load_config(config_path.as_deref());
    let forwarder = Arc::new(forwarder_or_exit(&cfg));

    let Some(pipeline) = WorkoutPipeline::new(forwarder) else {
        eprintln!("Workout pipeline is not configured.");
        eprintln!("Set workflows.endpoints.workout and workflows.endpoints.meal in the config.");
        std::process::exit(4);
    };

    match pipeline.run(&request).await {
        Ok(outcome) => {
            println!("{}\n", outcome.workout.0);
            println!("--- Meal plan ---\n");
            println!("{}", outcome.meal.0);
        }
        Err(e) => {
            eprintln!("Error: {}", e.client_message());
            std::process::exit(e.exit_code());
        }
    }
}

fn render_cmd(kind: &str, file: Option<PathBuf>, json: bool) {
    let kind: ContentKind = match kind.parse() {
        Ok(k) => k,
        Err(_) => {
            eprintln!("Unknown content kind '{}' (expected story, food, business or workout)", kind);
            std::process::exit(4);
        }
    };

    let text = match read_input(file.as_ref()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to read input: {}", e);
            std::process::exit(1);
        }
    };

    let rendered = RenderResponse::build(kind, &text);
    if json {
        match serde_json::to_string_pretty(&rendered) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Failed to encode result: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        println!("{}", rendered.html);
    }
}

fn read_input(file: Option<&PathBuf>) -> std::io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn workflows_cmd(config_path: Option<String>) {
    let cfg = load_config(config_path.as_deref());
    let catalog = match cfg.build_catalog() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("{} workflows\n", catalog.len());
    for wf in catalog.iter() {
        let kind = wf.content_kind.map(|k| k.as_str()).unwrap_or("-");
        println!(
            "  {:<22} {:<9} {:<32} [{}]",
            wf.id,
            kind,
            wf.upstream_endpoint_id,
            wf.required_field_names.join(", ")
        );
    }
}

fn status_cmd(config_path: Option<String>) {
    println!("FormRelay Status\n");

    let path = config_path
        .as_deref()
        .map(PathBuf::from)
        .or_else(|| Config::default_path().ok());
    match &path {
        Some(p) if p.exists() => println!("  Config:    {}", p.display()),
        Some(p) => println!("  Config:    {} (not found, using defaults)", p.display()),
        None => println!("  Config:    could not resolve path"),
    }

    let cfg = load_config(config_path.as_deref());

    println!("  Upstream:  {}", cfg.upstream.api_base);
    if cfg.upstream.api_key.trim().is_empty() {
        println!("  API key:   missing (set upstream.api_key or FORMRELAY_API_KEY)");
    } else {
        println!("  API key:   configured");
    }
    println!("  Server:    {}:{}", cfg.server.host, cfg.server.port);
    println!(
        "  Required field checks: {}",
        if cfg.workflows.enforce_required_fields { "enforced" } else { "permissive" }
    );

    match cfg.build_catalog() {
        Ok(catalog) => {
            println!("  Workflows: {}", catalog.len());
            let pipeline = catalog.contains(formrelay::workflow::WORKOUT)
                && catalog.contains(formrelay::workflow::MEAL);
            println!("  Workout pipeline: {}", if pipeline { "enabled" } else { "disabled" });
        }
        Err(e) => println!("  Workflows: invalid ({})", e),
    }

    match cfg.validate() {
        Ok(()) => println!("\n  Ready."),
        Err(e) => println!("\n  Not ready: {}", e),
    }
}

fn version_cmd() {
    println!("FormRelay v{}", formrelay::VERSION);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&str>) -> Config {
    let config_path = match path {
        Some(p) => PathBuf::from(p),
        None => Config::default_path().unwrap_or_else(|_| PathBuf::from("config.json")),
    };

    match Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn forwarder_or_exit(cfg: &Config) -> Forwarder {
    match create_forwarder(cfg) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Configuration Error: {}", e);
            eprintln!("\nSet upstream.api_key in ~/.formrelay/config.json or export FORMRELAY_API_KEY.");
            std::process::exit(1);
        }
    }
}
