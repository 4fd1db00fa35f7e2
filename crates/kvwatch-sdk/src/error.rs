use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvWatchError {
    #[error("config error: {0}")]
    Config(#[from] kvwatch_accessor::ConfigError),

    #[error("accessor error: {0}")]
    Accessor(#[from] kvwatch_accessor::AccessorError),

    #[error("batch error: {0}")]
    Batch(#[from] kvwatch_batch::BatchError),
}

pub type KvWatchResult<T> = Result<T, KvWatchError>;
