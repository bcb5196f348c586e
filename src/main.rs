use clap::{Args, ColorChoice, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::io::{IsTerminal, stderr, stdout};
use std::path::PathBuf;
use stegcheck::config::CliConfig;
use stegcheck::render::{self, RenderOptions};
use stegcheck::schema::DetectionResponse;
use stegcheck::transport::HttpTransport;
use stegcheck::upload::{ADVISORY_EXTENSIONS, ALLOWED_MIME_TYPES, Limits};
use stegcheck::{FileInput, SelectedFile, UiState, UploadController};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "STEGCHECK_LOG";

#[derive(Parser)]
#[command(
    name = "stegcheck",
    about = "Check files for hidden content using a remote detection service",
    arg_required_else_help = true
)]
struct Cli {
    /// Disable color
    #[arg(long = "no-color", global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file and show the detection result
    Scan(ScanArgs),
    /// Show a previously saved detection response
    Render(RenderArgs),
    /// List accepted file types
    Types,
    /// Print the JSON schema of a detection response
    Schema,
    /// Show the effective configuration
    Config,
}

#[derive(Args, Clone)]
struct ScanArgs {
    /// File to upload (PNG, JPEG, WAV, MP3 or TXT)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Output the service response as JSON
    #[arg(long)]
    json: bool,

    /// Declare the MIME type instead of inferring it from the extension
    #[arg(long, value_name = "TYPE")]
    mime: Option<String>,

    /// Detection endpoint URL
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Request timeout in seconds (0 = none)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Args, Clone)]
struct RenderArgs {
    /// Saved response JSON
    #[arg(value_name = "RESPONSE")]
    response: PathBuf,

    /// Output JSON instead of the report
    #[arg(long)]
    json: bool,
}

fn detect_color_choice() -> ColorChoice {
    // Scan args before clap so help/errors honor `--no-color`.
    let mut args = std::env::args_os();
    args.next();
    let mut flag = false;
    for arg in args {
        if arg == "--" {
            break;
        }
        if arg == "--no-color" {
            flag = true;
            break;
        }
    }
    if flag || std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("error"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

fn load_config() -> Result<CliConfig, i32> {
    CliConfig::load().map_err(|e| {
        eprintln!("Error: {}", e);
        2
    })
}

fn render_options(config: &CliConfig, color: ColorChoice) -> RenderOptions {
    RenderOptions {
        color: stdout().is_terminal() && !matches!(color, ColorChoice::Never),
        normalize_keys: config.display.normalize_keys,
    }
}

fn print_response(response: &DetectionResponse, json: bool, opts: RenderOptions) -> Result<(), i32> {
    if json {
        match render::render_json(response) {
            Ok(s) => println!("{}", s),
            Err(_) => return Err(3),
        }
    } else {
        println!("{}", render::render_human(response, opts));
    }
    Ok(())
}

async fn run_scan(args: ScanArgs, color: ColorChoice) -> Result<(), i32> {
    let mut config = load_config()?;
    if let Some(endpoint) = args.endpoint {
        config.service.endpoint = endpoint;
    }
    if let Some(timeout) = args.timeout {
        config.service.timeout_secs = timeout;
    }

    let mut file = match SelectedFile::from_path(&args.file).await {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(2);
        }
    };
    if let Some(mime) = args.mime {
        file = file.with_mime(mime);
    }

    let transport = match HttpTransport::from_config(&config) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(2);
        }
    };
    let controller = UploadController::new(transport, Limits::from(&config));

    let mut input = FileInput::default();
    input.select(file);
    if stderr().is_terminal() {
        eprintln!("Processing file...");
    }
    let outcome = controller.handle_input(&mut input).await;

    match controller.state() {
        UiState::Success(response) => {
            print_response(&response, args.json, render_options(&config, color))
        }
        UiState::Error(message) => {
            eprintln!("Error: {}", message);
            match outcome {
                Some(Err(e)) if e.is_validation() => Err(1),
                _ => Err(2),
            }
        }
        UiState::Idle | UiState::Loading => Err(2),
    }
}

fn run_render(args: RenderArgs, color: ColorChoice) -> Result<(), i32> {
    let config = load_config()?;
    let content = match std::fs::read_to_string(&args.response) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", args.response.display(), e);
            return Err(2);
        }
    };
    let response: DetectionResponse = match serde_json::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: invalid detection response: {}", e);
            return Err(2);
        }
    };
    print_response(&response, args.json, render_options(&config, color))
}

fn list_types() {
    println!("accepted types:");
    for mime in ALLOWED_MIME_TYPES {
        println!("  {}", mime);
    }
    println!("extensions:");
    println!("  {}", ADVISORY_EXTENSIONS.join(", "));
}

fn print_schema() -> Result<(), i32> {
    let schema = schemars::schema_for!(DetectionResponse);
    match serde_json::to_string_pretty(&schema) {
        Ok(s) => println!("{}", s),
        Err(_) => return Err(3),
    }
    Ok(())
}

fn show_config() -> Result<(), i32> {
    let config = load_config()?;
    if let Some(path) = CliConfig::config_file_path() {
        println!("# {}", path.display());
    }
    match config.to_toml() {
        Ok(s) => print!("{}", s),
        Err(_) => return Err(3),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    let color = detect_color_choice();
    let matches = Cli::command().color(color).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    let result = match cli.command {
        Some(Commands::Scan(args)) => run_scan(args, color).await,
        Some(Commands::Render(args)) => run_render(args, color),
        Some(Commands::Types) => {
            list_types();
            Ok(())
        }
        Some(Commands::Schema) => print_schema(),
        Some(Commands::Config) => show_config(),
        None => Ok(()),
    };
    if let Err(code) = result {
        std::process::exit(code);
    }
}
