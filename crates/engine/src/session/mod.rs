mod composer;
mod controller;
mod snapshot;
mod state;

pub use composer::ReportComposer;
pub use controller::SessionController;
pub use snapshot::{MapSnapshot, ReportMarker};
pub use state::{
    MapSession, NavigationPhase, NavigationState, Notice, RouteOutcome, RouteRequest, TapOutcome,
};
