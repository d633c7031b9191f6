use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lookup data error in {path}: {message}")]
    Lookup { path: String, message: String },
}
