mod evapotranspiration;
mod forcing;
mod freeze_thaw;
mod runoff;
mod soil_moisture_profile;

pub use evapotranspiration::{PriestleyTaylor, PriestleyTaylorParameters};
pub use forcing::{relative_humidity, CsvForcing, ForcingRecord};
pub use freeze_thaw::{FreezeThawColumn, FreezeThawParameters};
pub use runoff::{BucketRunoff, BucketRunoffParameters};
pub use soil_moisture_profile::{SoilMoistureProfile, SoilMoistureProfileParameters};
