//! Plotters-powered contribution chart widget for Ratatui.
//!
//! Plotters output is rendered into the Ratatui buffer using
//! `plotters-ratatui-backend`; the drawing itself is shared with the SVG export
//! (`plot::chart::draw_contributions`).

use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::plot::{draw_contributions, Bar, ChartStyle};

/// A lightweight, render-only chart description.
///
/// Bars are ranked and labelled outside the render call (`plot::chart_bars`).
pub struct ContributionChart<'a> {
    pub bars: &'a [Bar],
}

impl<'a> Widget for ContributionChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 30 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        if self.bars.is_empty() {
            buf.set_string(
                area.x,
                area.y,
                "No gene contributes to this prediction.",
                Style::default().fg(Color::Gray),
            );
            return;
        }

        let bars = self.bars;
        let widget = widget_fn(move |root| {
            draw_contributions(&root, bars, &ChartStyle::terminal())?;
            Ok(())
        });

        widget.render(area, buf);
    }
}
