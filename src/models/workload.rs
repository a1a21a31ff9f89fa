use std::fmt;

/// Lifecycle state of the supervised instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadState {
    Absent,
    Created,
    Running,
    Stopped,
    /// Reached only through uninstall.
    Removed,
}

impl WorkloadState {
    /// Map docker's `.State.Status` onto our lifecycle.
    ///
    /// `restarting` and `paused` count as running: the engine owns the
    /// process and a start would be rejected. They are not ready, though;
    /// readiness requires the literal `running` status. `dead` and `removing` are
    /// treated as stopped so a start or recreate is attempted.
    pub fn from_engine_status(status: &str) -> Self {
        match status.trim() {
            "created" => WorkloadState::Created,
            "running" | "restarting" | "paused" => WorkloadState::Running,
            _ => WorkloadState::Stopped,
        }
    }

    /// Valid transitions:
    /// - `Absent` -> `Created` | `Removed`
    /// - `Created` -> `Running` | `Absent` | `Removed`
    /// - `Running` -> `Stopped` | `Running` (restart) | `Absent` | `Removed`
    /// - `Stopped` -> `Running` | `Absent` | `Removed`
    /// - `Removed` is terminal
    pub fn can_transition_to(&self, next: WorkloadState) -> bool {
        use WorkloadState::*;
        match self {
            Absent => matches!(next, Created | Removed),
            Created => matches!(next, Running | Absent | Removed),
            Running => matches!(next, Stopped | Running | Absent | Removed),
            Stopped => matches!(next, Running | Absent | Removed),
            Removed => false,
        }
    }

    pub fn exists(&self) -> bool {
        matches!(
            self,
            WorkloadState::Created | WorkloadState::Running | WorkloadState::Stopped
        )
    }
}

impl fmt::Display for WorkloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkloadState::Absent => "not installed",
            WorkloadState::Created => "created",
            WorkloadState::Running => "running",
            WorkloadState::Stopped => "stopped",
            WorkloadState::Removed => "removed",
        };
        f.write_str(label)
    }
}

/// Engine-reported CPU and memory figures for a running instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUsage {
    Available { cpu_percent: String, memory: String },
    Unavailable,
}

impl ResourceUsage {
    /// Parse `docker stats --format '{{.CPUPerc}}|{{.MemUsage}}'` output.
    pub fn from_stats_line(line: &str) -> Self {
        let mut parts = line.trim().splitn(2, '|');
        match (parts.next(), parts.next()) {
            (Some(cpu), Some(mem)) if !cpu.trim().is_empty() && !mem.trim().is_empty() => {
                let cpu = cpu.trim();
                let mem = mem.trim();
                if cpu == "--" || mem == "--" {
                    return ResourceUsage::Unavailable;
                }
                ResourceUsage::Available {
                    cpu_percent: cpu.to_string(),
                    memory: mem.to_string(),
                }
            }
            _ => ResourceUsage::Unavailable,
        }
    }
}
