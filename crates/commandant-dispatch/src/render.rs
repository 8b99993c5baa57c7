//! Render function abstraction.
//!
//! Dispatch does not format anything itself: for each run there is a
//! function that turns handler data into the text written to the output sink.

use std::sync::Arc;

/// The render function signature.
///
/// Takes handler data (as JSON) and returns the text to print.
pub type RenderFn = Arc<dyn Fn(&serde_json::Value) -> Result<String, RenderError> + Send + Sync>;

/// Errors that can occur during rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Data serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        RenderError::Serialization(e.to_string())
    }
}

/// Prints strings verbatim and everything else as pretty JSON.
pub fn default_render() -> RenderFn {
    Arc::new(|data| match data {
        serde_json::Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string_pretty(other)?),
    })
}

/// Creates a render function that formats data as pretty JSON.
pub fn json_render() -> RenderFn {
    Arc::new(|data| Ok(serde_json::to_string_pretty(data)?))
}
