//! Configuration validation
//!
//! Rules:
//! - at least one sink
//! - sink names non-empty and unique
//! - file sinks have a location
//! - flush_interval_ms >= minimum, buffer_capacity > 0
//! - shutdown_timeout_ms > 0

use std::collections::HashSet;

use contracts::{ConfigError, Settings, SinkType, MIN_FLUSH_INTERVAL};

/// Validate `settings`, reporting every violated rule at once
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    let mut errors = Vec::new();
    validate_server(settings, &mut errors);
    validate_sinks(settings, &mut errors);

    match ConfigError::collect(errors) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn validate_server(settings: &Settings, errors: &mut Vec<ConfigError>) {
    if settings.server.shutdown_timeout_ms == 0 {
        errors.push(ConfigError::validation(
            "server.shutdown_timeout_ms",
            "shutdown timeout must be > 0",
        ));
    }
}

fn validate_sinks(settings: &Settings, errors: &mut Vec<ConfigError>) {
    if settings.sinks.is_empty() {
        errors.push(ConfigError::validation("sinks", "at least one sink is required"));
        return;
    }

    let minimum = MIN_FLUSH_INTERVAL.as_millis() as u64;
    let mut seen = HashSet::new();
    for (idx, sink) in settings.sinks.iter().enumerate() {
        if sink.name.trim().is_empty() {
            errors.push(ConfigError::validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        } else if !seen.insert(sink.name.as_str()) {
            errors.push(ConfigError::validation(
                format!("sinks[{idx}].name"),
                format!("duplicate sink name '{}'", sink.name),
            ));
        }

        if sink.sink_type == SinkType::File && sink.location.is_none() {
            errors.push(ConfigError::validation(
                format!("sinks[{idx}].location"),
                "file sink requires a location",
            ));
        }

        if sink.flush_interval_ms < minimum {
            errors.push(ConfigError::validation(
                format!("sinks[{idx}].flush_interval_ms"),
                format!(
                    "flush interval must be >= {minimum}ms, got {}ms",
                    sink.flush_interval_ms
                ),
            ));
        }

        if sink.buffer_capacity == 0 {
            errors.push(ConfigError::validation(
                format!("sinks[{idx}].buffer_capacity"),
                "buffer capacity must be > 0",
            ));
        }
    }
}
