use std::path::PathBuf;
use thiserror::Error;

/// Error type for failures while coupling models.
#[derive(Error, Debug)]
pub enum CouplingError {
    #[error("{0}")]
    Error(String),
    #[error("Component '{component}' does not recognise variable '{key}'")]
    UnknownVariable { component: String, key: String },
    #[error("Variable '{key}' on component '{component}' expected a {expected} value, got {found}")]
    WrongValueType {
        component: String,
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Failed to initialize '{component}' from {}: {reason}", path.display())]
    Initialization {
        component: String,
        path: PathBuf,
        reason: String,
    },
    #[error("Cannot {operation} component '{component}' while it is {state}")]
    Lifecycle {
        component: String,
        operation: &'static str,
        state: &'static str,
    },
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} does not provide forcing_file", path.display())]
    MissingForcingFile { path: PathBuf },
    #[error("Failed to parse {} line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("Forcing series has {available} values but the simulation requires {required} steps")]
    InsufficientForcing { available: usize, required: usize },
    #[error("Invalid clock: end_time={end_time}, time_step={time_step}. Both must be finite and time_step must be positive")]
    InvalidClock { end_time: f64, time_step: f64 },
    #[error("Unknown surface runoff scheme code {0}. Expected 1 (Schaake) or 2 (Xinanjiang)")]
    UnknownRunoffScheme(i64),
    #[error("Not a valid option for the soil moisture profile: {0}. Expected 1 (constant) or 2 (layered)")]
    UnknownSoilMoistureMethod(i64),
    #[error("Coupling edge '{edge}' uses '{key}' which '{component}' does not {direction}")]
    UnresolvedEdge {
        edge: String,
        component: String,
        key: String,
        direction: &'static str,
    },
    #[error("Variable '{key}' has {found} values but {expected} are required")]
    LengthMismatch {
        key: String,
        expected: usize,
        found: usize,
    },
    #[error("Consistency check failed at step {step}: {details}")]
    ConsistencyViolation { step: usize, details: String },
    #[error("Cannot {operation} while the scheduler is {state}")]
    InvalidSchedulerState {
        operation: &'static str,
        state: &'static str,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience type for `Result<T, CouplingError>`.
pub type CouplingResult<T> = Result<T, CouplingError>;

impl From<toml::de::Error> for CouplingError {
    fn from(err: toml::de::Error) -> Self {
        CouplingError::Config(err.to_string())
    }
}
