//! Health domain: component and overall verdicts, snapshots.

mod snapshot;
mod status;

pub use snapshot::{ComponentReport, HealthSnapshot};
pub use status::{ComponentHealth, ComponentStatus, OverallStatus};
