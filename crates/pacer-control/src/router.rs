//! Event routing under gate protection.

use std::collections::HashMap;
use std::sync::Arc;

use pacer_core::Event;
use tracing::{debug, warn};

use crate::gate::StateGate;
use crate::traits::{CycleContext, EventHandler};

/// What became of a dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran to completion.
    Handled,
    /// No handler is registered for the event type.
    NoHandler,
    /// An adjustment was already in flight; the event was dropped.
    Busy,
}

/// Dispatches events to registered handlers, one adjustment at a time.
///
/// The registry is built once by the assembly layer and is immutable
/// afterwards; the router itself is shared across intake tasks.
pub struct EventRouter {
    gate: Arc<StateGate>,
    ctx: Arc<CycleContext>,
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl EventRouter {
    pub fn new(gate: Arc<StateGate>, ctx: Arc<CycleContext>) -> Self {
        Self {
            gate,
            ctx,
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for an event type, replacing any previous one.
    pub fn register(&mut self, event_type: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.handlers.insert(event_type.into(), handler);
    }

    pub fn gate(&self) -> &Arc<StateGate> {
        &self.gate
    }

    /// Route an event to its handler.
    ///
    /// Unknown event types and gate contention are quiet non-errors; a
    /// handler failure propagates, but only after the gate permit has
    /// been released.
    pub async fn dispatch(&self, event: &Event) -> anyhow::Result<DispatchOutcome> {
        let Some(handler) = self.handlers.get(&event.event_type) else {
            debug!(event_type = %event.event_type, source = %event.source, "no handler registered");
            return Ok(DispatchOutcome::NoHandler);
        };

        let Some(permit) = self.gate.try_enter() else {
            warn!(
                event_type = %event.event_type,
                source = %event.source,
                "adjustment in flight, event dropped"
            );
            return Ok(DispatchOutcome::Busy);
        };

        let result = handler.handle(event, &self.ctx).await;
        drop(permit);
        result?;
        Ok(DispatchOutcome::Handled)
    }
}
