use std::{
    fs, io,
    io::Write,
    path::Path,
    process,
};

use thiserror::Error;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

use punto::{
    config::{self, Command, DotArgs, RenderArgs, Settings},
    render::{
        DotInvokeError, RenderError, RenderPipelineConfig, RenderRequest, RenderService,
        configure_render_service, render_service,
    },
    telemetry,
};

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Telemetry(#[from] telemetry::TelemetryError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Invoke(#[from] DotInvokeError),
    #[error("failed to read `{path}`: {source}")]
    ReadInput { path: String, source: io::Error },
    #[error("failed to write `{path}`: {source}")]
    WriteOutput { path: String, source: io::Error },
    #[error("{0}")]
    Unexpected(String),
}

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Command::Render(args) => run_render(settings, args),
        Command::Dot(args) => run_dot(settings, args),
    }
}

fn run_render(settings: Settings, args: RenderArgs) -> Result<(), AppError> {
    configure_render_service(RenderPipelineConfig::from(&settings.render))
        .map_err(|err| AppError::Unexpected(err.to_string()))?;

    let markdown = read_input(&args.file)?;
    let output = render_service().render(&RenderRequest::new(markdown))?;

    info!(
        diagrams = output.diagram_count,
        contains_graphviz = output.contains_graphviz,
        "document rendered"
    );

    write_output(args.output.as_deref(), output.html.as_bytes())
}

fn run_dot(settings: Settings, args: DotArgs) -> Result<(), AppError> {
    configure_render_service(RenderPipelineConfig::from(&settings.render))
        .map_err(|err| AppError::Unexpected(err.to_string()))?;

    let source = read_input(&args.file)?;
    let payload = render_service().invoker().render(&source)?;

    info!(payload_bytes = payload.len(), "diagram rendered");

    write_output(args.output.as_deref(), &payload)
}

fn read_input(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path).map_err(|source| AppError::ReadInput {
        path: path.display().to_string(),
        source,
    })
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<(), AppError> {
    match path {
        Some(path) => fs::write(path, bytes).map_err(|source| AppError::WriteOutput {
            path: path.display().to_string(),
            source,
        }),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(bytes)
                .and_then(|()| stdout.flush())
                .map_err(|source| AppError::WriteOutput {
                    path: "stdout".to_string(),
                    source,
                })
        }
    }
}
