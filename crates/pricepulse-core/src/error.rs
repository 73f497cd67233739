use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Domain-level failures raised by the pricing and experiment logic.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error(
        "invalid discount values (min={min}, max={max}); ensure 0 <= min_discount <= max_discount <= 1"
    )]
    InvalidDiscountBounds { min: f64, max: f64 },

    #[error("A/B test not found: {0}")]
    TestNotFound(String),

    #[error("unknown A/B test arm \"{0}\"; expected \"a\" or \"b\"")]
    UnknownArm(String),

    #[error("unknown A/B event type \"{0}\"; expected \"view\" or \"conversion\"")]
    UnknownEvent(String),

    #[error("traffic split must be within [0, 1], got {0}")]
    InvalidTrafficSplit(f64),
}
