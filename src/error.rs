use thiserror::Error;

#[derive(Error, Debug)]
pub enum GreenStrainError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Unsupported tensor shape: expected 4 or 6 components, found {0}")]
    TensorShape(usize),

    #[error("Field error: {0}")]
    Field(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type GreenStrainResult<T> = Result<T, GreenStrainError>;
