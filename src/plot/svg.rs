//! SVG export of the contribution chart.

use std::path::Path;

use plotters::prelude::*;

use crate::domain::Attribution;
use crate::error::AppError;

use super::chart::{chart_bars, draw_contributions, ChartStyle};

/// Default image size in pixels.
pub const SVG_SIZE: (u32, u32) = (900, 520);

const MAX_IMAGE_BARS: usize = 12;

/// Draw `attribution` into a fresh SVG file at `path`.
pub fn write_attribution_svg(path: &Path, attribution: &Attribution, size: (u32, u32)) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::runtime(format!("Failed to create chart directory '{}': {e}", parent.display()))
        })?;
    }

    let bars = chart_bars(attribution, MAX_IMAGE_BARS);
    let style = ChartStyle::image(format!(
        "SHAP explanation (class {}) | base {:+.3} | output {:+.3}",
        attribution.class_index,
        attribution.base_value,
        attribution.reconstructed_output()
    ));

    let root = SVGBackend::new(path, size).into_drawing_area();
    draw_contributions(&root, &bars, &style)
        .map_err(|e| AppError::runtime(format!("Failed to draw chart '{}': {e}", path.display())))?;
    root.present()
        .map_err(|e| AppError::runtime(format!("Failed to write chart '{}': {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureContribution;

    #[test]
    fn writes_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chart.svg");
        let attr = Attribution {
            class_index: 0,
            base_value: -0.2,
            features: vec![
                FeatureContribution { name: "CYBB".into(), value: 5785.0, contribution: 0.3 },
                FeatureContribution { name: "ANLN".into(), value: 4870.0, contribution: -0.1 },
            ],
        };
        write_attribution_svg(&path, &attr, SVG_SIZE).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<svg"));
        assert!(text.contains("CYBB = 5785"));
    }
}
