use futures::task::SpawnError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to spawn task on the local executor: {0}")]
    Spawn(#[from] SpawnError),

    #[error("scheduler did not settle after {passes} flush passes")]
    FlushLimit { passes: usize },
}
