//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (worker count, listener tuning)
//! - Check cross-field limit relationships
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before any resource is acquired; a failure leaves zero side effects

use std::fmt;

use crate::config::schema::ServerConfig;

/// A single semantic violation in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check every cross-field invariant of the configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.workers == 0 {
        errors.push(ValidationError::new("workers", "must be greater than zero"));
    }

    let limits = &config.limits;
    if limits.max_request_line_size == 0 {
        errors.push(ValidationError::new(
            "limits.max_request_line_size",
            "must be greater than zero",
        ));
    }
    if limits.max_request_headers_size == 0 {
        errors.push(ValidationError::new(
            "limits.max_request_headers_size",
            "must be greater than zero",
        ));
    }
    if limits.max_request_header_count == 0 {
        errors.push(ValidationError::new(
            "limits.max_request_header_count",
            "must be greater than zero",
        ));
    }
    if let Some(buffer) = limits.max_request_buffer_size {
        if buffer < limits.max_request_line_size {
            errors.push(ValidationError::new(
                "limits.max_request_buffer_size",
                format!(
                    "must be at least max_request_line_size ({})",
                    limits.max_request_line_size
                ),
            ));
        }
        if buffer < limits.max_request_headers_size {
            errors.push(ValidationError::new(
                "limits.max_request_buffer_size",
                format!(
                    "must be at least max_request_headers_size ({})",
                    limits.max_request_headers_size
                ),
            ));
        }
    }

    if config.listener.backlog == 0 {
        errors.push(ValidationError::new(
            "listener.backlog",
            "must be greater than zero",
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new(
            "listener.max_connections",
            "must be greater than zero",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
