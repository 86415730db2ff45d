//! The scheduler drives the coupled models through synchronised time steps.
//!
//! The step count is derived once, from the freeze-thaw model's end time and time step.
//! Each step runs a fixed sequence of model updates and variable transfers in which
//! every value is produced before it is consumed, followed by the consistency checks.
//! Once the final step has run the runoff model's water balance is checked and every
//! model is finalized.
//!
//! The scheduler moves through three states: uninitialized, running and finalized.
//! Work requested in the wrong state is an error rather than a no-op.

mod clock;
mod runtime;

#[cfg(test)]
mod tests;

pub use clock::SimulationClock;
pub use runtime::{ConfigPaths, RunSummary, Scheduler, SchedulerState};
