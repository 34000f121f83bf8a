use thiserror::Error;

/// Where a configuration problem was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key, e.g. "batch_size" or "large_volume.delay_divisor"
    pub field_path: Option<String>,
    /// The offending value as read
    pub details: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Crate error type.
///
/// Item-level failures never surface here: they are recorded as
/// [`ItemOutcome::Failure`](crate::batch::ItemOutcome) data. This type only
/// covers malformed configuration and the I/O around loading it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", describe(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn describe(ctx: &ErrorContext) -> String {
    match (&ctx.field_path, &ctx.details) {
        (Some(field), Some(details)) => format!(" ({field} = {details})"),
        (Some(field), None) => format!(" ({field})"),
        (None, Some(details)) => format!(" ({details})"),
        (None, None) => String::new(),
    }
}

impl Error {
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}
