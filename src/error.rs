pub type StageResult<T> = Result<T, StageError>;

#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("{pool} pool exhausted (capacity {capacity})")]
    PoolExhausted {
        pool: &'static str,
        capacity: usize,
    },

    #[error("invalid {pool} handle (index {index})")]
    InvalidHandle { pool: &'static str, index: usize },

    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    pub fn out_of_bounds(msg: impl Into<String>) -> Self {
        Self::OutOfBounds(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
