//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-width bars around a zero axis), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - contribution toward the explained class: `+` to the right of `|`
//! - contribution away from it: `-` to the left of `|`

use crate::domain::Attribution;
use crate::report::format::truncate;

const LABEL_WIDTH: usize = 16;

/// Render the ranked contributions of `attribution` as horizontal bars.
///
/// `width` is the total number of bar columns, split evenly around the axis.
pub fn render_contribution_bars(attribution: &Attribution, width: usize) -> String {
    let half = (width.max(10)) / 2;
    let ranked = attribution.ranked();

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: class {} | base={:+.4} | output={:+.4}\n",
        attribution.class_index,
        attribution.base_value,
        attribution.reconstructed_output()
    ));

    let scale = ranked
        .iter()
        .map(|f| f.contribution.abs())
        .filter(|c| c.is_finite())
        .fold(0.0_f64, f64::max);
    if ranked.is_empty() || scale <= 0.0 {
        out.push_str("(no non-zero contributions)\n");
        return out;
    }

    for f in ranked {
        let cells = bar_cells(f.contribution, scale, half);
        let (left, right) = if f.contribution < 0.0 {
            (format!("{}{}", " ".repeat(half - cells), "-".repeat(cells)), " ".repeat(half))
        } else {
            (" ".repeat(half), format!("{}{}", "+".repeat(cells), " ".repeat(half - cells)))
        };
        out.push_str(&format!(
            "{:<LABEL_WIDTH$} {left}|{right} {:+.4}\n",
            truncate(&f.name, LABEL_WIDTH),
            f.contribution
        ));
    }
    out
}

/// Bar length in cells; any non-zero value gets at least one cell.
fn bar_cells(contribution: f64, scale: f64, half: usize) -> usize {
    if !contribution.is_finite() {
        return 0;
    }
    let cells = (contribution.abs() / scale * half as f64).round() as usize;
    cells.clamp(1, half)
}
