use serde::Serialize;

use crate::error::{ErrorCategory, PipelineError};
use crate::pipeline::InstallSummary;

pub const SUCCESS_MESSAGE: &str = "Application installed successfully";

/// What the caller renders: no internal paths, no error chains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Outcome {
    pub fn from_result(result: &Result<InstallSummary, PipelineError>) -> Self {
        match result {
            Ok(summary) => Self::success(summary),
            Err(error) => Self::failure(error),
        }
    }

    pub fn success(summary: &InstallSummary) -> Self {
        let warnings = summary
            .normalize
            .warnings
            .iter()
            .map(|w| {
                let relative = w.path.strip_prefix(&summary.target).unwrap_or(w.path.as_path());
                if relative.as_os_str().is_empty() {
                    format!("{}: {}", w.step, w.message)
                } else {
                    format!("{}: {}: {}", w.step, relative.display(), w.message)
                }
            })
            .collect();

        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            category: None,
            warnings,
        }
    }

    pub fn failure(error: &PipelineError) -> Self {
        Self {
            success: false,
            message: error.user_message(),
            category: Some(error.category()),
            warnings: Vec::new(),
        }
    }
}
