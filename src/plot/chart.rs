//! Backend-agnostic Plotters drawing of the contribution chart.
//!
//! The same routine draws into the terminal (via `plotters-ratatui-backend`) and
//! into SVG files. All data prep happens in `chart_bars` / `x_bounds`, so the
//! draw call only paints.

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::Attribution;

/// Bars pushing the output toward the explained class.
pub const TOWARD_COLOR: RGBColor = RGBColor(255, 0, 81);
/// Bars pushing the output away from the explained class.
pub const AWAY_COLOR: RGBColor = RGBColor(0, 139, 251);

/// One horizontal bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub contribution: f64,
}

/// Visual parameters that differ between terminal and file output.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub text: RGBColor,
    pub background: Option<RGBColor>,
    pub font_size: u32,
    pub margin: u32,
    pub label_area_left: u32,
    pub label_area_bottom: u32,
    pub caption: Option<String>,
}

impl ChartStyle {
    /// High-contrast, compact layout for terminal cells.
    pub fn terminal() -> Self {
        Self {
            text: WHITE,
            background: None,
            font_size: 10,
            margin: 1,
            label_area_left: 16,
            label_area_bottom: 3,
            caption: None,
        }
    }

    /// Light layout for saved images.
    pub fn image(caption: String) -> Self {
        Self {
            text: BLACK,
            background: Some(WHITE),
            font_size: 14,
            margin: 16,
            label_area_left: 150,
            label_area_bottom: 40,
            caption: Some(caption),
        }
    }
}

/// The `max_bars - 1` largest contributions; anything beyond is folded into one bar.
pub fn chart_bars(attribution: &Attribution, max_bars: usize) -> Vec<Bar> {
    let ranked = attribution.ranked();
    let max_bars = max_bars.max(1);
    if ranked.len() <= max_bars {
        return ranked
            .iter()
            .map(|f| Bar {
                label: format!("{} = {:.0}", f.name, f.value),
                contribution: f.contribution,
            })
            .collect();
    }

    let keep = max_bars - 1;
    let mut bars: Vec<Bar> = ranked[..keep]
        .iter()
        .map(|f| Bar {
            label: format!("{} = {:.0}", f.name, f.value),
            contribution: f.contribution,
        })
        .collect();
    let rest = &ranked[keep..];
    bars.push(Bar {
        label: format!("{} other features", rest.len()),
        contribution: rest.iter().map(|f| f.contribution).sum(),
    });
    bars
}

/// X range covering zero and every bar, padded by 10%.
pub fn x_bounds(bars: &[Bar]) -> (f64, f64) {
    let mut lo = 0.0_f64;
    let mut hi = 0.0_f64;
    for b in bars {
        if b.contribution.is_finite() {
            lo = lo.min(b.contribution);
            hi = hi.max(b.contribution);
        }
    }
    if hi - lo <= 1e-12 {
        return (-1.0, 1.0);
    }
    let pad = (hi - lo) * 0.1;
    (lo - pad, hi + pad)
}

/// Paint the bars top-to-bottom in the given order.
pub fn draw_contributions<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    bars: &[Bar],
    style: &ChartStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    if let Some(bg) = style.background {
        root.fill(&bg)?;
    }

    let n = bars.len().max(1);
    let (x0, x1) = x_bounds(bars);
    let y_max = n as f64 - 0.5;

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(style.margin)
        .set_label_area_size(LabelAreaPosition::Left, style.label_area_left)
        .set_label_area_size(LabelAreaPosition::Bottom, style.label_area_bottom);
    if let Some(caption) = &style.caption {
        builder.caption(caption, ("sans-serif", style.font_size + 4).into_font().color(&style.text));
    }
    let mut chart = builder.build_cartesian_2d(x0..x1, -0.5..y_max)?;

    // Row `i` of `bars` is drawn at y = n - 1 - i so the largest bar is on top.
    let row_label = |y: &f64| -> String {
        let pos = y.round();
        if (y - pos).abs() > 0.01 || pos < 0.0 {
            return String::new();
        }
        let idx = n as i64 - 1 - pos as i64;
        if idx < 0 {
            return String::new();
        }
        bars.get(idx as usize).map(|b| b.label.clone()).unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc("SHAP value (impact on model output)")
        .x_labels(5)
        .y_labels(n)
        .x_label_formatter(&|v| format!("{v:+.2}"))
        .y_label_formatter(&row_label)
        .label_style(("sans-serif", style.font_size).into_font().color(&style.text))
        .axis_style(&style.text)
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, b)| {
        let y = (n - 1 - i) as f64;
        let color = if b.contribution >= 0.0 { TOWARD_COLOR } else { AWAY_COLOR };
        Rectangle::new([(0.0, y - 0.35), (b.contribution, y + 0.35)], color.filled())
    }))?;

    chart.draw_series(LineSeries::new([(0.0, -0.5), (0.0, y_max)], &style.text))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureContribution;

    fn attribution(contribs: &[f64]) -> Attribution {
        Attribution {
            class_index: 1,
            base_value: 0.0,
            features: contribs
                .iter()
                .enumerate()
                .map(|(i, &c)| FeatureContribution {
                    name: format!("G{i}"),
                    value: i as f64,
                    contribution: c,
                })
                .collect(),
        }
    }

    #[test]
    fn bars_are_ranked_and_folded() {
        let attr = attribution(&[0.1, -0.5, 0.3, 0.05, 0.0]);
        let bars = chart_bars(&attr, 3);
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].label, "G1 = 1");
        assert_eq!(bars[1].label, "G2 = 2");
        assert_eq!(bars[2].label, "2 other features");
        assert!((bars[2].contribution - 0.15).abs() < 1e-12);
    }

    #[test]
    fn bounds_include_zero_and_pad() {
        let bars = vec![Bar { label: "a".into(), contribution: 2.0 }];
        let (lo, hi) = x_bounds(&bars);
        assert!(lo < 0.0 && hi > 2.0);
        assert_eq!(x_bounds(&[]), (-1.0, 1.0));
    }
}
