use super::Error;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error(transparent)]
    Action(#[from] Error),
}
