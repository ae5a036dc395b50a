use crate::config::FigureConfig;
use crate::stats::TauSeries;
use anyhow::{Context, Result, bail};
use plotters::prelude::*;
use std::path::Path;

/// Resolve a configured color name to a drawing color.
pub fn color_by_name(name: &str) -> Result<RGBColor> {
    let color = match name {
        "blue" => BLUE,
        "green" => GREEN,
        "red" => RED,
        "cyan" => CYAN,
        "yellow" => YELLOW,
        "magenta" => MAGENTA,
        "black" => BLACK,
        "white" => WHITE,
        _ => bail!("unknown color name {name:?}"),
    };
    Ok(color)
}

/// Composite frequency figure: one bar layer per tau plus an optional
/// Poisson overlay curve. Layers are collected first so the y range can
/// cover all of them, then rendered in one pass.
pub struct Figure {
    cfg: FigureConfig,
    tick_seconds: u64,
    bars: Vec<BarLayer>,
    curve: Option<CurveLayer>,
}

struct BarLayer {
    ordinal: usize,
    tau: usize,
    points: Vec<(i64, f64)>,
}

struct CurveLayer {
    ordinal: usize,
    points: Vec<(f64, f64)>,
}

impl Figure {
    pub fn new(cfg: FigureConfig, tick_seconds: u64) -> Self {
        Self {
            cfg,
            tick_seconds,
            bars: Vec::new(),
            curve: None,
        }
    }

    /// Add a bar layer of the series frequencies, restricted to values
    /// within the x-axis limit.
    pub fn add_frequencies(&mut self, ordinal: usize, series: &TauSeries) {
        let points = series
            .frequencies()
            .into_iter()
            .filter(|&(val, _)| val <= self.cfg.x_lim)
            .collect();

        self.bars.push(BarLayer {
            ordinal,
            tau: series.tau(),
            points,
        });
    }

    /// Add the Poisson probability-mass curve for the given mean.
    pub fn add_poisson(&mut self, ordinal: usize, mean: f64) {
        self.curve = Some(CurveLayer {
            ordinal,
            points: poisson_pmf(mean, self.cfg.x_lim),
        });
    }

    pub fn render<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let root = BitMapBackend::new(file, (self.cfg.width, self.cfg.height)).into_drawing_area();
        root.fill(&WHITE)
            .with_context(|| format!("failed to fill {file:?}"))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..self.cfg.x_lim as f64, 0.0..self.y_max())
            .context("failed to build chart")?;

        chart
            .configure_mesh()
            .x_desc(self.cfg.x_label.as_str())
            .y_desc(self.cfg.y_label.as_str())
            .draw()
            .context("failed to draw mesh")?;

        for layer in &self.bars {
            let color = self.layer_color(layer.ordinal)?;

            for &(val, freq) in &layer.points {
                let x = val as f64;
                chart
                    .draw_series(std::iter::once(Rectangle::new(
                        [(x - 0.5, 0.0), (x + 0.5, freq)],
                        color.filled(),
                    )))
                    .context("failed to draw bar")?;
            }

            let label = format!("tau = {}s", layer.tau as u64 * self.tick_seconds);
            let y = self.cfg.annotation_base - self.cfg.annotation_step * layer.ordinal as f64;
            chart
                .draw_series(std::iter::once(Text::new(
                    label,
                    (0.0, y),
                    ("sans-serif", 18).into_font().color(&color),
                )))
                .context("failed to draw annotation")?;
        }

        if let Some(curve) = &self.curve {
            let color = self.layer_color(curve.ordinal)?;
            chart
                .draw_series(LineSeries::new(curve.points.iter().copied(), &color))
                .context("failed to draw overlay curve")?;
        }

        root.present()
            .with_context(|| format!("failed to present {file:?}"))?;

        Ok(())
    }

    fn layer_color(&self, ordinal: usize) -> Result<RGBColor> {
        color_by_name(&self.cfg.palette[ordinal % self.cfg.palette.len()])
    }

    fn y_max(&self) -> f64 {
        let mut y_max = self.cfg.annotation_base;
        for layer in &self.bars {
            for &(_, freq) in &layer.points {
                y_max = y_max.max(freq);
            }
        }
        if let Some(curve) = &self.curve {
            for &(_, mass) in &curve.points {
                y_max = y_max.max(mass);
            }
        }
        y_max * 1.1
    }
}

/// Poisson probability mass `mean^x e^-mean / x!` for `x` in `[0, x_lim]`.
///
/// Evaluated with the recurrence `P(x) = P(x - 1) * mean / x` to keep the
/// factorial out of the arithmetic.
fn poisson_pmf(mean: f64, x_lim: i64) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(x_lim as usize + 1);

    let mut mass = (-mean).exp();
    points.push((0.0, mass));
    for x in 1..=x_lim {
        mass *= mean / x as f64;
        points.push((x as f64, mass));
    }

    points
}
