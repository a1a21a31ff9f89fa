/// How much of a telemetry line could be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Completeness {
    /// No tagged line was found.
    #[default]
    NoData,
    /// A tagged line was found but some fields were missing.
    Partial,
    Full,
}

/// Telemetry derived from the most recent `[STATS]` log line.
///
/// Never stored; recomputed from the log tail on every query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TelemetrySample {
    pub connecting: u64,
    pub connected: u64,
    pub upload_rate: String,
    pub download_rate: String,
    pub uptime: String,
    pub completeness: Completeness,
}

impl TelemetrySample {
    pub fn no_data() -> Self {
        Self::default()
    }

    pub fn is_degraded(&self) -> bool {
        self.completeness != Completeness::Full
    }
}
