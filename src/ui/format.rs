//! Text formatting shared by the widgets and the CLI tables

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::telemetry::{ProcessRecord, StatSnapshot};

pub const NOT_AVAILABLE: &str = "N/A";

pub fn text_or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => NOT_AVAILABLE,
    }
}

/// Zero reads as "no sample", matching how absent fields are normalized.
pub fn cpu_percent(snapshot: &StatSnapshot) -> String {
    if snapshot.cpu_usage > 0.0 {
        format!("{:.2}%", snapshot.cpu_usage)
    } else {
        NOT_AVAILABLE.to_string()
    }
}

pub fn memory_usage(snapshot: &StatSnapshot) -> String {
    used_of_total(snapshot.memory_used, snapshot.memory_total)
}

pub fn disk_usage(snapshot: &StatSnapshot) -> String {
    used_of_total(snapshot.disk_used, snapshot.disk_total)
}

fn used_of_total(used: f64, total: f64) -> String {
    if used > 0.0 {
        format!("{:.3} GB / {:.3} GB", used, total)
    } else {
        NOT_AVAILABLE.to_string()
    }
}

/// One row of the process table: name, user, CPU, memory.
pub fn process_row(process: &ProcessRecord) -> [String; 4] {
    [
        process.process_name.clone(),
        text_or_na(process.user.as_deref()).to_string(),
        format!("{:.2}%", process.cpu_usage),
        format!("{:.2} MB", process.memory_usage),
    ]
}

/// Cut `s` to at most `max_width` terminal columns, marking the cut with `…`.
pub fn truncate(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Truncate then right-pad to exactly `width` columns.
pub fn fit(s: &str, width: usize) -> String {
    let mut out = truncate(s, width);
    let pad = width.saturating_sub(out.width());
    out.extend(std::iter::repeat(' ').take(pad));
    out
}
