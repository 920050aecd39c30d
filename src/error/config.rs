use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Required environment variable is not set.
    ///
    /// `Fixtures::connect` needs a database URL. Set `FIXTURE_DATABASE_URL` or
    /// `DATABASE_URL`, in the environment or in a `.env` file.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable is set but cannot be parsed.
    #[error("Invalid value `{value}` for environment variable {name}")]
    InvalidEnvVar { name: String, value: String },

    /// A process-wide `Fixtures` handle was already installed.
    #[error("a global fixtures handle is already installed")]
    AlreadyInstalled,
}
