//! pacer-control — the adaptive control loop.
//!
//! Routes domain events to registered handlers under the protection of
//! the adjustment state gate, which guarantees at most one adjustment
//! cycle runs at a time process-wide. A cycle that arrives while
//! another is in flight is dropped, not queued.
//!
//! External collaborators (prober, dispatcher, strategy) are modeled as
//! capability traits with boxed-future methods; the in-memory
//! implementations in [`stubs`] serve tests and standalone wiring.

pub mod cycle;
pub mod gate;
pub mod handlers;
pub mod router;
pub mod strategy;
pub mod stubs;
pub mod traits;

pub use cycle::AdjustmentCycle;
pub use gate::{AdjustmentState, GatePermit, StateGate};
pub use router::{DispatchOutcome, EventRouter};
pub use strategy::{HeadroomStrategy, IdentityStrategy};
pub use traits::{BoxFuture, CycleContext, Dispatcher, EventHandler, FrequencyStrategy, Prober};
