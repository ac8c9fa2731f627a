//! Output formatting
//!
//! Reports go to stdout; everything else (logs, errors) goes to stderr so the
//! report text stays machine-parseable.

pub mod report;
pub mod sweep;

pub use report::{parse_p99, render_counts, render_probe_line, render_rtt_line, render_run, render_trial};
pub use sweep::{export_json, saved_line, SweepFormatter};
