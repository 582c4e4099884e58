use assets_registrar_core::config::LogLevel;
use lambda_runtime::Error;
use tracing_subscriber::EnvFilter;

// SDK internals log every request at debug level.
const QUIET_DEPENDENCIES: &[&str] = &[
    "aws_config=warn",
    "aws_smithy_runtime=warn",
    "aws_smithy_runtime_api=warn",
    "hyper=warn",
    "rustls=warn",
];

pub fn env_filter(log_level: LogLevel) -> Result<EnvFilter, Error> {
    let mut directives = vec![log_level.as_directive().to_string()];
    directives.extend(QUIET_DEPENDENCIES.iter().map(|directive| directive.to_string()));
    EnvFilter::try_new(directives.join(","))
        .map_err(|error| Error::from(format!("invalid log filter: {error}")))
}

/// Installs the process-wide JSON subscriber. With tracing enabled every event
/// carries its enclosing span, so asset and domain identifiers recorded on
/// the handler spans appear on each line.
pub fn init(log_level: LogLevel, tracer_disabled: bool) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_env_filter(env_filter(log_level)?)
        .with_target(false)
        .json()
        .with_current_span(!tracer_disabled)
        .with_span_list(false)
        .flatten_event(true)
        .try_init()?;

    tracing::info!(
        service = assets_registrar_core::config::SERVICE_NAME,
        log_level = %log_level,
        tracer_disabled,
        "logger started"
    );
    Ok(())
}
