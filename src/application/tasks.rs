//! Failure boundaries for handler execution

use std::future::Future;

use crate::domain::entities::HandlerResult;

/// Why an isolated handler did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    Error(String),
    Panic(String),
}

impl std::fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskFailure::Error(e) => write!(f, "{}", e),
            TaskFailure::Panic(e) => write!(f, "panicked: {}", e),
        }
    }
}

/// Run `fut` in its own task so an error or panic stays contained.
pub async fn run_isolated<F>(fut: F) -> Result<(), TaskFailure>
where
    F: Future<Output = HandlerResult> + Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(TaskFailure::Error(e.to_string())),
        Err(join) => Err(TaskFailure::Panic(join.to_string())),
    }
}
