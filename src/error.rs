use thiserror::Error;

pub type FixResult<T> = Result<T, FixError>;

#[derive(Error, Debug)]
pub enum FixError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("failed to remove package '{0}'")]
    RemovalFailed(String),

    #[error("invalid package name: '{0}'")]
    InvalidPackageName(String),
}
