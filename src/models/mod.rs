pub mod settings;
pub mod telemetry;
pub mod workload;

pub use settings::{Bandwidth, SettingsRecord, SettingsUpdate};
pub use telemetry::{Completeness, TelemetrySample};
pub use workload::{ResourceUsage, WorkloadState};
