use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use super::font::{FONT_FAMILY, ensure_font};
use crate::color::{CURVE_COLOR, generate_palette};
use crate::config::{CurveKind, RenderOptions};
use crate::error::{EvalError, Result};
use crate::eval::{Curve, Evaluation};

/// Output encodings, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// png, jpg/jpeg, bmp
    Bitmap,
    Svg,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "bmp" => Ok(ImageFormat::Bitmap),
            "svg" => Ok(ImageFormat::Svg),
            _ => Err(EvalError::UnsupportedImage { extension: ext }),
        }
    }
}

fn render_err(e: impl std::fmt::Display) -> EvalError {
    EvalError::Render(e.to_string())
}

// ---------------------------------------------------------------------------
// Figure
// ---------------------------------------------------------------------------

/// Everything needed to draw one precision plot. Consumed by [`Figure::save`].
#[derive(Debug, Clone)]
pub struct Figure {
    kind: CurveKind,
    area: f64,
    curve: Curve,
    /// `(label, curve)` per class; empty unless per-class curves were asked for.
    class_curves: Vec<(String, Curve)>,
    options: RenderOptions,
}

impl Figure {
    pub fn new(evaluation: &Evaluation, options: RenderOptions) -> Self {
        let class_curves = if options.per_class {
            evaluation
                .classes
                .iter()
                .map(|c| (c.label.clone(), c.curve.clone()))
                .collect()
        } else {
            Vec::new()
        };
        Figure {
            kind: evaluation.curve.kind,
            area: evaluation.area,
            curve: evaluation.curve.clone(),
            class_curves,
            options,
        }
    }

    /// Render to `path` and release the figure.
    pub fn save(self, path: &Path) -> Result<()> {
        let format = ImageFormat::from_path(path)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(EvalError::OutputDir(parent.to_path_buf()));
            }
        }

        let text = ensure_font(self.options.font.as_deref());
        let size = (self.options.width, self.options.height);
        match format {
            ImageFormat::Bitmap => {
                let root = BitMapBackend::new(path, size).into_drawing_area();
                self.draw(&root, text)?;
                root.present().map_err(render_err)?;
            }
            ImageFormat::Svg => {
                let root = SVGBackend::new(path, size).into_drawing_area();
                self.draw(&root, text)?;
                root.present().map_err(render_err)?;
            }
        }
        log::info!("Saved {} plot to {}", self.kind.label(), path.display());
        Ok(())
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>, text: bool) -> Result<()> {
        root.fill(&WHITE).map_err(render_err)?;

        let mut builder = ChartBuilder::on(root);
        builder.margin(20);
        if text {
            builder
                .caption(
                    format!("{} curve (area = {:.4})", self.kind.label(), self.area),
                    (FONT_FAMILY, 22),
                )
                .x_label_area_size(45)
                .y_label_area_size(55);
        }
        let mut chart = builder
            .build_cartesian_2d(0f64..1f64, 0f64..1.05f64)
            .map_err(render_err)?;

        if text {
            let x_desc = match self.kind {
                CurveKind::Imcp => "Fraction of instances (class-balanced)",
                CurveKind::Mcp => "Fraction of instances",
            };
            chart
                .configure_mesh()
                .x_desc(x_desc)
                .y_desc("Precision (1 - Hellinger distance)")
                .draw()
                .map_err(render_err)?;
        } else {
            chart
                .plotting_area()
                .draw(&Rectangle::new([(0.0, 0.0), (1.0, 1.05)], BLACK.stroke_width(1)))
                .map_err(render_err)?;
        }

        chart
            .draw_series(AreaSeries::new(
                self.curve.points.iter().copied(),
                0.0,
                &CURVE_COLOR.mix(0.2),
            ))
            .map_err(render_err)?;
        chart
            .draw_series(LineSeries::new(
                self.curve.points.iter().copied(),
                CURVE_COLOR.stroke_width(2),
            ))
            .map_err(render_err)?
            .label(format!("{} ({:.4})", self.kind.label(), self.area))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], CURVE_COLOR.stroke_width(2)));

        let palette = generate_palette(self.class_curves.len());
        for ((label, curve), color) in self.class_curves.iter().zip(palette) {
            chart
                .draw_series(LineSeries::new(curve.points.iter().copied(), color.stroke_width(1)))
                .map_err(render_err)?
                .label(format!("class {label} ({:.4})", curve.area(0.0)))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(1)));
        }

        if text {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::LowerLeft)
                .label_font((FONT_FAMILY, 14))
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(render_err)?;
        }
        Ok(())
    }
}
