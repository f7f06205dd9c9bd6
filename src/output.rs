//! Rendering of dashboard state for the command-line harness.
//!
//! Supports debug logging, JSON and a plain-text summary.

use std::fmt::Write;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::dashboard::view::DashboardView;

/// Logs the view using Rust's debug pretty-print format.
pub fn print_pretty(view: &DashboardView) {
    debug!("{:#?}", view);
}

pub fn render_json(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Human-readable summary of what the dashboard screen shows.
pub fn render_text(view: &DashboardView) -> String {
    let mut out = String::new();

    if !view.loaded {
        let _ = writeln!(out, "No parent record for '{}'.", view.parent_id);
        return out;
    }

    let _ = writeln!(out, "Welcome, {}", view.parent_label);
    if let Some(setup) = &view.setup {
        let _ = writeln!(
            out,
            "Profile setup required (name: '{}', contact: '{}', income: {})",
            setup.name, setup.contact, setup.income
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Announcement ({})", view.teacher_label);
    let _ = writeln!(out, "{}", view.announcement_preview());
    for item in view.announcements.iter().skip(1) {
        let _ = writeln!(out, "- {} [{}] {}", item.title, item.display_date, item.teacher_label);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## {}", view.quarter_label);
    for (label, test) in [("Pretest", &view.pretest), ("Post-test", &view.post_test)] {
        let _ = writeln!(
            out,
            "- {}: {}/{} ({}%) {}",
            label, test.score, test.total, test.percent, test.status
        );
    }
    for week in &view.week_progress {
        let _ = writeln!(out, "- Week {}: {}%", week.week, week.progress);
    }

    out
}
