//! Error type shared by every metric, accumulator and the registry.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricsError {
    /// A constructor parameter or query argument is out of its valid range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The registry has no metric of the requested kind under these tags.
    #[error("metric not found: {0}")]
    NotFound(String),
    /// Configuration could not be parsed.
    #[error("config: {0}")]
    Config(String),
}

impl MetricsError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        MetricsError::InvalidArgument(msg.into())
    }
}

impl From<serde_json::Error> for MetricsError {
    fn from(e: serde_json::Error) -> Self {
        MetricsError::Config(e.to_string())
    }
}

/// Rejects quantiles outside `[0, 1]`, including NaN.
pub(crate) fn check_quantile(quantile: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&quantile) {
        return Err(MetricsError::invalid(format!(
            "quantile must be in [0; 1] range, got {quantile}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_bounds() {
        assert!(check_quantile(0.0).is_ok());
        assert!(check_quantile(1.0).is_ok());
        assert!(check_quantile(-0.5).is_err());
        assert!(check_quantile(1.5).is_err());
        assert!(check_quantile(f64::NAN).is_err());
    }
}
