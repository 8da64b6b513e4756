//! Diagnostic logging setup.

use tracing_subscriber::EnvFilter;

/// Error returned when a global subscriber is already installed.
pub type LoggingError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Maps `-v` repetitions to a default filter directive.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "retitle=warn",
        1 => "retitle=info",
        _ => "retitle=debug",
    }
}

/// Initialize structured logging to stderr.
///
/// `RUST_LOG` takes precedence over the verbosity flag. Console output meant for
/// the user is printed separately by `OutputFormatter` on stdout.
pub fn init_logging(verbosity: u8) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()?;

    tracing::debug!(verbosity, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(0), "retitle=warn");
        assert_eq!(default_directive(1), "retitle=info");
        assert_eq!(default_directive(2), "retitle=debug");
        assert_eq!(default_directive(9), "retitle=debug");
    }
}
