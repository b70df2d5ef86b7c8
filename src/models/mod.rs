pub mod measurements;
pub mod profile;
pub mod rate_limit;

pub use measurements::{FitPreference, MeasurementInput, MeasurementUpdate, MeasurementsRecord};
pub use profile::{Gender, ProfileRecord, PublicProfile};
pub use rate_limit::{RateLimitDecision, RateLimitEntry};
