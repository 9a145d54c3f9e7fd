// Load modules
mod observation;
mod reader;

// Expose to public
pub use observation::{Observation, ObservationSet};
pub use reader::{parse_data, read_data};
