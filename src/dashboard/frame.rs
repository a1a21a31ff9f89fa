//! One dashboard frame: a snapshot plus its fixed-layout rendering.

use std::io::{self, Write};
use std::time::Duration;

use chrono::{DateTime, Local};
use colored::Colorize;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

use crate::models::{Completeness, ResourceUsage, SettingsRecord, TelemetrySample, WorkloadState};
use crate::utils::truncate;

const RULE_WIDTH: usize = 56;
const MAX_ERROR_CHARS: usize = 72;

/// How a frame reaches the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStyle {
    /// Overwrite the previous frame from the top-left corner.
    InPlace,
    /// Append below the previous frame; for logs and pipes.
    Append,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub taken_at: DateTime<Local>,
    /// Engine error text when the state could not be read.
    pub state: Result<WorkloadState, String>,
    pub usage: ResourceUsage,
    pub telemetry: TelemetrySample,
    pub settings: SettingsRecord,
    pub refresh: Duration,
    pub interactive: bool,
}

impl Frame {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(12);
        lines.push(format!(
            "{}  {}",
            "CONDUIT LIVE STATS".bold().cyan(),
            self.taken_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        ));
        lines.push("─".repeat(RULE_WIDTH));

        let state = match &self.state {
            Ok(WorkloadState::Running) => "● running".green().to_string(),
            Ok(state) => format!("○ {state}").yellow().to_string(),
            Err(e) => format!("✗ {}", truncate(e, MAX_ERROR_CHARS)).red().to_string(),
        };
        lines.push(format!("  Status:     {state}"));

        let usage = match &self.usage {
            ResourceUsage::Available {
                cpu_percent,
                memory,
            } => format!("{cpu_percent} CPU, {memory}"),
            ResourceUsage::Unavailable => "unavailable".dimmed().to_string(),
        };
        lines.push(format!("  Resources:  {usage}"));

        let t = &self.telemetry;
        lines.push(format!(
            "  Clients:    {} connected, {} connecting",
            t.connected.to_string().bold(),
            t.connecting
        ));
        lines.push(format!(
            "  Traffic:    ↑ {}   ↓ {}",
            or_dash(&t.upload_rate),
            or_dash(&t.download_rate)
        ));
        lines.push(format!("  Uptime:     {}", or_dash(&t.uptime)));
        lines.push(format!(
            "  Settings:   max-clients {}, bandwidth {}",
            self.settings.max_clients, self.settings.bandwidth
        ));

        match t.completeness {
            Completeness::Full => lines.push(String::new()),
            Completeness::Partial => {
                lines.push("  ⚠ some telemetry fields are missing".yellow().to_string())
            }
            Completeness::NoData => lines.push(
                "  ⚠ no [STATS] output yet; the node may still be starting"
                    .yellow()
                    .to_string(),
            ),
        }

        lines.push("─".repeat(RULE_WIDTH));
        let hint = if self.interactive {
            "Press any key to return, Ctrl+C to exit"
        } else {
            "Send SIGINT or SIGTERM to exit"
        };
        lines.push(
            format!("  Refreshing every {}s. {hint}.", self.refresh.as_secs())
                .dimmed()
                .to_string(),
        );
        lines
    }

    pub fn render<W: Write>(&self, out: &mut W, style: FrameStyle) -> io::Result<()> {
        let lines = self.lines();
        match style {
            FrameStyle::InPlace => {
                for (row, line) in lines.iter().enumerate() {
                    let row = u16::try_from(row).unwrap_or(u16::MAX);
                    queue!(out, MoveTo(0, row), Print(line), Clear(ClearType::UntilNewLine))?;
                }
                queue!(
                    out,
                    MoveTo(0, u16::try_from(lines.len()).unwrap_or(u16::MAX)),
                    Clear(ClearType::FromCursorDown)
                )?;
            }
            FrameStyle::Append => {
                for line in &lines {
                    writeln!(out, "{line}")?;
                }
                writeln!(out)?;
            }
        }
        out.flush()
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
