mod camera;
mod coordinate;
mod location;
mod report;

pub use camera::*;
pub use coordinate::*;
pub use location::*;
pub use report::*;
