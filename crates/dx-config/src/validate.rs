//! Configuration validation errors and semantic validation.

use crate::ExportConfig;
use dx_common::ViewId;
use std::collections::HashSet;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing binding for view '{0}'")]
    MissingView(String),

    #[error("View '{0}' is bound more than once")]
    DuplicateView(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingView(_) => 64,
            ValidationError::DuplicateView(_) => 65,
            ValidationError::InvalidValue { .. } => 66,
            ValidationError::VersionMismatch { .. } => 67,
        }
    }
}

/// Validate an export configuration semantically.
pub fn validate_config(config: &ExportConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    let readiness = &config.readiness;
    positive("readiness.interval_ms", readiness.interval_ms)?;
    positive("readiness.table_max_attempts", readiness.table_max_attempts as u64)?;
    positive(
        "readiness.numeric_max_attempts",
        readiness.numeric_max_attempts as u64,
    )?;
    positive("bundle.embed_size_limit_mb", config.bundle.embed_size_limit_mb)?;

    let mut concept_names = HashSet::new();
    for concept in &config.styles {
        if concept.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "styles.name".to_string(),
                message: "Must not be empty".to_string(),
            });
        }
        if !concept_names.insert(concept.name.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "Style concept '{}' is defined more than once",
                concept.name
            )));
        }
        positive(
            &format!("styles.{}.min_bytes", concept.name),
            concept.min_bytes as u64,
        )?;
    }

    let mut bound = HashSet::new();
    for binding in &config.views {
        let view = binding.view.as_str();
        if !bound.insert(binding.view) {
            return Err(ValidationError::DuplicateView(view.to_string()));
        }
        let fraction = binding.readiness.min_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ValidationError::InvalidValue {
                field: format!("views.{}.readiness.min_fraction", view),
                message: format!("Must be in [0, 1], got {}", fraction),
            });
        }
        if binding.open_label.trim().is_empty() || binding.dismiss_label.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("views.{}", view),
                message: "Open and dismiss labels must not be empty".to_string(),
            });
        }
        if !concept_names.contains(binding.style_concept.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "View '{}' references undefined style concept '{}'",
                view, binding.style_concept
            )));
        }
    }

    if let Some(missing) = ViewId::ALL.iter().find(|v| !bound.contains(v)) {
        return Err(ValidationError::MissingView(missing.as_str().to_string()));
    }

    Ok(())
}

fn positive(field: &str, value: u64) -> ValidationResult<()> {
    if value == 0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: "Must be positive".to_string(),
        });
    }
    Ok(())
}
