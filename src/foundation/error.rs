/// Convenience result type used across layercomp.
pub type LayercompResult<T> = Result<T, LayercompError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum LayercompError {
    /// Invalid user-provided layer or option data.
    #[error("validation error: {0}")]
    Validation(String),

    /// The scoped workspace could not be allocated or released.
    #[error("workspace error: {0}")]
    Workspace(String),

    /// A remote layer source could not be retrieved.
    #[error("download error: '{url}': {reason}")]
    Download {
        /// Remote reference that failed.
        url: String,
        /// Underlying cause.
        reason: String,
    },

    /// Intrinsic dimensions of an image layer could not be read.
    #[error("probe error: '{path}': {reason}")]
    Probe {
        /// Local file that was probed.
        path: String,
        /// Underlying cause.
        reason: String,
    },

    /// The external renderer could not be launched or driven.
    #[error("render error: {0}")]
    Render(String),

    /// An image layer reached the compositor without a file.
    #[error("missing source: image layer #{index} has no file")]
    MissingSource {
        /// Position of the offending layer in the effective stack.
        index: usize,
    },

    /// An external process exited unsuccessfully.
    #[error("process error: {command} exited with {}", describe_exit(.exit_code))]
    Process {
        /// Program name as invoked.
        command: String,
        /// Exit code, or `None` when the process was terminated by a signal.
        exit_code: Option<i32>,
    },

    /// Work was abandoned because a sibling task failed first.
    #[error("cancelled")]
    Cancelled,

    /// Errors when serializing or deserializing layer descriptors.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LayercompError {
    /// Build a [`LayercompError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LayercompError::Workspace`] value.
    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }

    /// Build a [`LayercompError::Download`] value.
    pub fn download(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`LayercompError::Probe`] value.
    pub fn probe(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Probe {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`LayercompError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`LayercompError::Process`] value.
    pub fn process(command: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::Process {
            command: command.into(),
            exit_code,
        }
    }

    /// Build a [`LayercompError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for errors raised by the external renderer (launch failure or non-zero exit).
    pub fn is_render_failure(&self) -> bool {
        matches!(self, Self::Render(_) | Self::Process { .. })
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
