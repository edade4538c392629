//! Logging subsystem.

pub mod manager;
pub mod types;

pub use manager::init;
pub use types::{FileLoggingConfig, LoggerConfig, StdoutConfig};

// Re-exported for configuring file rotation without a direct dep.
pub use tracing_appender::rolling::Rotation;

/// Formats a service name with an optional label suffix.
pub fn format_service_name(base: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_service_name() {
        assert_eq!(format_service_name("trestle", None), "trestle");
        assert_eq!(format_service_name("trestle", Some("dev")), "trestle%dev");
    }
}
