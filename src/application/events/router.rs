//! Event router - Runs the listeners of one category for a single event

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;

use crate::application::tasks::{run_isolated, TaskFailure};
use crate::domain::entities::{ClientEvent, EventContext, EventListener};
use crate::domain::traits::Bot;
use crate::infrastructure::config::EventExecution;

/// What happened when an event was routed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    /// Listeners invoked
    pub ran: usize,
    /// (position in dispatch order, failure)
    pub failures: Vec<(usize, TaskFailure)>,
}

impl RouteOutcome {
    pub fn succeeded(&self) -> usize {
        self.ran - self.failures.len()
    }
}

/// Run `listeners` in their given order. A failing listener is logged and
/// does not stop the others.
pub async fn route(
    category: &str,
    listeners: &[Arc<EventListener>],
    event: ClientEvent,
    bot: Arc<dyn Bot>,
    execution: EventExecution,
) -> RouteOutcome {
    let ctx = EventContext { event, bot };

    let results = match execution {
        EventExecution::Sequential => {
            let mut results = Vec::with_capacity(listeners.len());
            for listener in listeners {
                results.push(invoke(listener, &ctx).await);
            }
            results
        }
        EventExecution::Concurrent => {
            // join_all polls, and so spawns, in list order
            let started: Vec<_> = listeners.iter().map(|listener| invoke(listener, &ctx)).collect();
            join_all(started).await
        }
    };

    let mut outcome = RouteOutcome {
        ran: results.len(),
        failures: Vec::new(),
    };
    for (index, result) in results.into_iter().enumerate() {
        if let Err(failure) = result {
            tracing::error!("Event listener #{} of '{}' failed: {}", index, category, failure);
            outcome.failures.push((index, failure));
        }
    }
    outcome
}

/// Call the handler inside the spawned task, so a panic while building its
/// future is contained too.
fn invoke(
    listener: &EventListener,
    ctx: &EventContext,
) -> impl Future<Output = Result<(), TaskFailure>> + Send + 'static {
    let handler = Arc::clone(listener.handler());
    let ctx = ctx.clone();
    run_isolated(async move { handler(ctx).await })
}
