//! Sweep table and JSON export

use crate::error::{AppError, ErrorContext, Result};
use crate::sweep::Sweep;
use colored::*;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const HEADERS: [&str; 3] = ["Loss (%)", "UDP P99 (ms)", "TCP P99 (ms)"];

/// Renders a sweep as a bordered table
pub struct SweepFormatter {
    enable_color: bool,
}

impl SweepFormatter {
    pub fn new(enable_color: bool) -> Self {
        Self { enable_color }
    }

    pub fn format_table(&self, sweep: &Sweep) -> Result<String> {
        let rows: Vec<[String; 3]> = sweep
            .points
            .iter()
            .map(|p| {
                [
                    format!("{}", p.loss_pct),
                    format!("{:.3}", p.udp_p99_ms),
                    format!("{:.3}", p.tcp_p99_ms),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let border = horizontal_border(&widths);
        let mut output = String::new();
        let format_error = |e: std::fmt::Error| AppError::io(format!("Failed to format sweep table: {}", e));

        writeln!(output, "{}", self.header(&format!("P99 RTT vs Packet Loss ({})", sweep.harness)))
            .map_err(format_error)?;
        writeln!(output, "{}", border).map_err(format_error)?;
        writeln!(output, "{}", self.row(&HEADERS.map(String::from), &widths, true)).map_err(format_error)?;
        writeln!(output, "{}", border).map_err(format_error)?;
        for row in &rows {
            writeln!(output, "{}", self.row(row, &widths, false)).map_err(format_error)?;
        }
        write!(output, "{}", border).map_err(format_error)?;

        Ok(output)
    }

    fn header(&self, title: &str) -> String {
        if self.enable_color {
            title.bold().blue().to_string()
        } else {
            title.to_string()
        }
    }

    /// Cells are right-aligned; colors are applied after padding so widths stay exact
    fn row(&self, cells: &[String; 3], widths: &[usize; 3], is_header: bool) -> String {
        let mut row = String::from("|");
        for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
            let padded = format!("{:>width$}", cell, width = *width);
            let styled = match (self.enable_color, is_header, idx) {
                (false, _, _) => padded,
                (true, true, _) => padded.bold().to_string(),
                (true, false, 1) => padded.cyan().to_string(),
                (true, false, 2) => padded.magenta().to_string(),
                (true, false, _) => padded,
            };
            row.push(' ');
            row.push_str(&styled);
            row.push_str(" |");
        }
        row
    }
}

fn horizontal_border(widths: &[usize; 3]) -> String {
    let mut border = String::from("+");
    for width in widths {
        border.push_str(&"-".repeat(width + 2));
        border.push('+');
    }
    border
}

/// Write the sweep as pretty JSON, creating parent directories
pub fn export_json(sweep: &Sweep, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(sweep)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path.to_path_buf())
}

/// Line announcing where the series was written
pub fn saved_line(path: &Path) -> String {
    format!("sweep_saved={}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrialSettings;
    use crate::sweep::SweepPoint;
    use chrono::Utc;

    fn sweep() -> Sweep {
        Sweep {
            points: vec![
                SweepPoint { loss_pct: 1.0, udp_p99_ms: 0.5, tcp_p99_ms: 12.25 },
                SweepPoint { loss_pct: 2.5, udp_p99_ms: 0.75, tcp_p99_ms: 205.0 },
            ],
            settings: TrialSettings::default(),
            harness: "loopback".to_string(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_plain_table() {
        let table = SweepFormatter::new(false).format_table(&sweep()).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "P99 RTT vs Packet Loss (loopback)");
        assert_eq!(lines[1], "+----------+--------------+--------------+");
        assert_eq!(lines[2], "| Loss (%) | UDP P99 (ms) | TCP P99 (ms) |");
        assert_eq!(lines[4], "|        1 |        0.500 |       12.250 |");
        assert_eq!(lines[5], "|      2.5 |        0.750 |      205.000 |");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_colored_table_keeps_values() {
        colored::control::set_override(true);
        let table = SweepFormatter::new(true).format_table(&sweep()).unwrap();
        colored::control::unset_override();
        assert!(table.contains("205.000"));
        assert!(table.contains("\u{1b}["));
    }

    #[test]
    fn test_export_json_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots").join("sweep.json");

        let written = export_json(&sweep(), &path).unwrap();
        assert_eq!(written, path);

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["points"][1]["tcp_p99_ms"], 205.0);
        assert_eq!(value["settings"]["count"], 200);
        assert_eq!(saved_line(&written), format!("sweep_saved={}", path.display()));
    }
}
