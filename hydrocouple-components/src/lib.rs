//! Reference process models for hydrocouple
//!
//! Small conceptual implementations of the five coupled models. Each one reads a
//! `key=value` configuration file and exchanges data only through its variable interface.

mod clock;
pub mod components;

pub use clock::ModelClock;

use hydrocouple_core::handle::ModelSet;

/// A model set made of the reference components, ready to be initialized
pub fn reference_models() -> ModelSet {
    ModelSet::new(
        Box::new(components::CsvForcing::new()),
        Box::new(components::PriestleyTaylor::new()),
        Box::new(components::BucketRunoff::new()),
        Box::new(components::FreezeThawColumn::new()),
        Box::new(components::SoilMoistureProfile::new()),
    )
}
