use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use weather_widget::{
    config::RuntimeConfig,
    controller::{Controller, SearchOutcome},
    display::{TerminalSurface, WidgetState},
    error::{AppError, ErrorKind},
    model::{ValidationError, normalize_query},
    providers::{HttpProviders, ProviderApi},
    units::UnitPreference,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Weather lookup widget (Open-Meteo, no token required)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Look up one place and print the widget. Without --city the default
    /// place is shown.
    Show {
        #[arg(long)]
        city: Option<String>,
        #[arg(long, value_enum)]
        units: Option<UnitsArg>,
        #[arg(long, value_enum)]
        output: Option<OutputModeArg>,
        #[arg(long)]
        json: bool,
    },
    /// Read places from stdin; `:metric`, `:imperial` or `:units <u>` switch
    /// units and `:quit` exits.
    Interactive {
        #[arg(long, value_enum)]
        units: Option<UnitsArg>,
    },
}

const ENVELOPE_SCHEMA_VERSION: &str = "v1";
const COMMAND_SHOW: &str = "weather.show";
const COMMAND_INTERACTIVE: &str = "weather.interactive";

const ERROR_CODE_USER_INVALID_INPUT: &str = "user.invalid_input";
const ERROR_CODE_USER_OUTPUT_MODE_CONFLICT: &str = "user.output_mode_conflict";
const ERROR_CODE_USER_LOCATION_NOT_FOUND: &str = "user.location_not_found";
const ERROR_CODE_RUNTIME_PROVIDER_INIT: &str = "runtime.provider_init_failed";
const ERROR_CODE_RUNTIME_PROVIDER_FAILED: &str = "runtime.provider_failed";
const ERROR_CODE_RUNTIME_SERIALIZE: &str = "runtime.serialize_failed";
const ERROR_CODE_RUNTIME_IO: &str = "runtime.io_failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputModeArg {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum UnitsArg {
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliOutputMode {
    Human,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliError {
    kind: ErrorKind,
    code: &'static str,
    message: String,
}

impl CliError {
    fn user(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::User,
            code,
            message: message.into(),
        }
    }

    fn runtime(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Runtime,
            code,
            message: message.into(),
        }
    }

    fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::User => 2,
            ErrorKind::Runtime => 1,
        }
    }
}

impl From<OutputModeArg> for CliOutputMode {
    fn from(value: OutputModeArg) -> Self {
        match value {
            OutputModeArg::Human => CliOutputMode::Human,
            OutputModeArg::Json => CliOutputMode::Json,
        }
    }
}

impl From<UnitsArg> for UnitPreference {
    fn from(value: UnitsArg) -> Self {
        match value {
            UnitsArg::Metric => UnitPreference::Metric,
            UnitsArg::Imperial => UnitPreference::Imperial,
        }
    }
}

impl Cli {
    fn command_name(&self) -> &'static str {
        match &self.command {
            Commands::Show { .. } => COMMAND_SHOW,
            Commands::Interactive { .. } => COMMAND_INTERACTIVE,
        }
    }

    fn output_mode_hint(&self) -> CliOutputMode {
        match &self.command {
            Commands::Show { output, json, .. } => {
                if *json {
                    CliOutputMode::Json
                } else if let Some(explicit) = output {
                    (*explicit).into()
                } else {
                    CliOutputMode::Human
                }
            }
            Commands::Interactive { .. } => CliOutputMode::Human,
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let command = cli.command_name();
    let output_mode = cli.output_mode_hint();
    match run(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(error) => {
            emit_error(command, output_mode, &error);
            std::process::exit(error.exit_code());
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<String, CliError> {
    let config = RuntimeConfig::from_env();
    let providers = HttpProviders::new(config.request_timeout)
        .map_err(|error| runtime_error(ERROR_CODE_RUNTIME_PROVIDER_INIT, error.to_string()))?;
    let stdin = io::stdin();
    run_with(cli, &config, providers, stdin.lock(), io::stdout())
}

fn run_with<P, R, W>(
    cli: Cli,
    config: &RuntimeConfig,
    providers: P,
    input: R,
    output: W,
) -> Result<String, CliError>
where
    P: ProviderApi,
    R: BufRead,
    W: Write,
{
    match cli.command {
        Commands::Show {
            city,
            units,
            output: output_arg,
            json,
        } => run_show(
            config,
            providers,
            ShowArgs {
                city: city.as_deref(),
                units,
                output: output_arg,
                json,
            },
        ),
        Commands::Interactive { units } => {
            run_interactive(config, providers, units, input, output)?;
            Ok(String::new())
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ShowArgs<'a> {
    city: Option<&'a str>,
    units: Option<UnitsArg>,
    output: Option<OutputModeArg>,
    json: bool,
}

fn run_show<P: ProviderApi>(
    config: &RuntimeConfig,
    providers: P,
    args: ShowArgs<'_>,
) -> Result<String, CliError> {
    let output_mode = resolve_output_mode(args.output, args.json, CliOutputMode::Human)?;
    let config = with_units_override(config, args.units);
    let city = args
        .city
        .map(normalize_query)
        .transpose()
        .map_err(user_invalid_input)?;

    let mut controller = Controller::new(providers, WidgetState::default(), &config);
    let outcome = match city.as_deref() {
        Some(city) => controller.submit(city),
        None => controller.initial_load(),
    };

    match outcome {
        SearchOutcome::Rendered(_) => {}
        SearchOutcome::Failed(error) => return Err(map_app_error(error.into())),
        SearchOutcome::Ignored | SearchOutcome::Stale => {
            return Err(runtime_error(
                ERROR_CODE_RUNTIME_PROVIDER_FAILED,
                "no forecast was rendered",
            ));
        }
    }

    let query = controller.input().to_string();
    let units = controller.units();
    let state = controller.into_surface();
    match output_mode {
        CliOutputMode::Human => Ok(state.to_text()),
        CliOutputMode::Json => render_show_json_envelope(&query, units, &state),
    }
}

fn run_interactive<P, R, W>(
    config: &RuntimeConfig,
    providers: P,
    units: Option<UnitsArg>,
    input: R,
    output: W,
) -> Result<(), CliError>
where
    P: ProviderApi,
    R: BufRead,
    W: Write,
{
    let config = with_units_override(config, units);
    let mut controller = Controller::new(providers, TerminalSurface::new(output), &config);
    controller.initial_load();

    for line in input.lines() {
        let line = line.map_err(|error| {
            runtime_error(
                ERROR_CODE_RUNTIME_IO,
                format!("failed to read input: {error}"),
            )
        })?;

        match parse_prompt_command(&line) {
            PromptCommand::Quit => break,
            PromptCommand::Search(query) => {
                controller.submit(&query);
            }
            PromptCommand::Units(units) => {
                controller.set_units(units);
            }
            PromptCommand::Invalid(error) => {
                tracing::debug!(%error, "rejected prompt command");
                controller
                    .surface_mut()
                    .write_notice(&format!("error: {error}"));
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
enum PromptCommand {
    Search(String),
    Units(UnitPreference),
    Invalid(ValidationError),
    Quit,
}

fn parse_prompt_command(line: &str) -> PromptCommand {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix(':') else {
        return PromptCommand::Search(trimmed.to_string());
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let argument = parts.next().unwrap_or_default();
    match name.as_str() {
        "q" | "quit" | "exit" => PromptCommand::Quit,
        "metric" | "imperial" => unit_command(&name),
        "units" | "u" => unit_command(argument),
        _ => PromptCommand::Invalid(ValidationError::UnknownCommand(trimmed.to_string())),
    }
}

fn unit_command(raw: &str) -> PromptCommand {
    match UnitPreference::parse(raw) {
        Some(units) => PromptCommand::Units(units),
        None => PromptCommand::Invalid(ValidationError::UnknownUnits(raw.to_string())),
    }
}

fn with_units_override(config: &RuntimeConfig, units: Option<UnitsArg>) -> RuntimeConfig {
    let mut config = config.clone();
    if let Some(units) = units {
        config.units = units.into();
    }
    config
}

fn resolve_output_mode(
    output: Option<OutputModeArg>,
    json_flag: bool,
    default_mode: CliOutputMode,
) -> Result<CliOutputMode, CliError> {
    match (output.map(Into::into), json_flag) {
        (Some(mode), true) if mode != CliOutputMode::Json => Err(user_error(
            ERROR_CODE_USER_OUTPUT_MODE_CONFLICT,
            format!(
                "conflicting output flags: --json requires --output json (got {})",
                output_mode_label(mode)
            ),
        )),
        (Some(mode), _) => Ok(mode),
        (None, true) => Ok(CliOutputMode::Json),
        (None, false) => Ok(default_mode),
    }
}

fn render_show_json_envelope(
    query: &str,
    units: UnitPreference,
    state: &WidgetState,
) -> Result<String, CliError> {
    let widget = serde_json::to_value(state).map_err(|error| {
        runtime_error(
            ERROR_CODE_RUNTIME_SERIALIZE,
            format!("failed to serialize widget: {error}"),
        )
    })?;
    serde_json::to_string(&json!({
        "schema_version": ENVELOPE_SCHEMA_VERSION,
        "command": COMMAND_SHOW,
        "ok": true,
        "result": {
            "query": query,
            "units": units.as_str(),
            "widget": widget,
        },
    }))
    .map_err(|error| {
        runtime_error(
            ERROR_CODE_RUNTIME_SERIALIZE,
            format!("failed to serialize output envelope: {error}"),
        )
    })
}

fn emit_error(command: &str, output_mode: CliOutputMode, error: &CliError) {
    match output_mode {
        CliOutputMode::Json => {
            let payload = json!({
                "schema_version": ENVELOPE_SCHEMA_VERSION,
                "command": command,
                "ok": false,
                "error": {
                    "code": error.code,
                    "message": error.message,
                    "details": {
                        "kind": error_kind_label(error.kind),
                        "exit_code": error.exit_code(),
                    }
                }
            });
            let rendered = serde_json::to_string(&payload).unwrap_or_else(|_| {
                format!(
                    "{{\"schema_version\":\"{ENVELOPE_SCHEMA_VERSION}\",\"command\":\"{command}\",\"ok\":false,\"error\":{{\"code\":\"{ERROR_CODE_RUNTIME_SERIALIZE}\",\"message\":\"failed to serialize error envelope\"}}}}"
                )
            });
            println!("{rendered}");
        }
        CliOutputMode::Human => {
            eprintln!("error[{}]: {}", error.code, error.message);
        }
    }
}

fn user_invalid_input(error: ValidationError) -> CliError {
    user_error(ERROR_CODE_USER_INVALID_INPUT, error.to_string())
}

fn map_app_error(error: AppError) -> CliError {
    match error.kind {
        ErrorKind::User => user_error(ERROR_CODE_USER_LOCATION_NOT_FOUND, error.message),
        ErrorKind::Runtime => runtime_error(ERROR_CODE_RUNTIME_PROVIDER_FAILED, error.message),
    }
}

fn user_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError::user(code, message)
}

fn runtime_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError::runtime(code, message)
}

fn error_kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::User => "user",
        ErrorKind::Runtime => "runtime",
    }
}

fn output_mode_label(mode: CliOutputMode) -> &'static str {
    match mode {
        CliOutputMode::Human => "human",
        CliOutputMode::Json => "json",
    }
}
