use crate::plot;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Reduction run configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct Config {
    pub input: InputConfig,
    pub reduction: ReductionConfig,
    pub figure: FigureConfig,
    pub report: ReportConfig,
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct InputConfig {
    /// Pulse-count file, relative to the work directory.
    pub data_file: String,
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct ReductionConfig {
    /// Window sizes, in raw samples.
    pub taus: Vec<usize>,
    /// Duration of one raw sample in seconds.
    pub tick_seconds: u64,
    /// Window size whose mean parameterizes the Poisson overlay.
    pub overlay_tau: usize,
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct FigureConfig {
    /// Output image name, relative to the work directory.
    pub file: String,
    pub width: u32,
    pub height: u32,
    /// Largest pulse count shown on the x axis.
    pub x_lim: i64,
    pub x_label: String,
    pub y_label: String,
    /// Series colors, cycled by plot ordinal.
    pub palette: Vec<String>,
    /// Vertical position of the first tau annotation.
    pub annotation_base: f64,
    /// Vertical spacing between tau annotations.
    pub annotation_step: f64,
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct ReportConfig {
    /// Report file name template; `{tau}` is replaced by the window size.
    pub template: String,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to open {file:?}"))?;

        let config: Config =
            toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.input.data_file.is_empty() {
            bail!("data file name must not be empty");
        }

        if self.reduction.taus.is_empty() {
            bail!("tau list must not be empty");
        }
        for &tau in &self.reduction.taus {
            check_num(tau, 1..10_000).context("invalid tau")?;
        }
        check_num(self.reduction.tick_seconds, 1..100_000).context("invalid tick duration")?;
        check_num(self.reduction.overlay_tau, 1..10_000).context("invalid overlay tau")?;

        if self.figure.file.is_empty() {
            bail!("figure file name must not be empty");
        }
        check_num(self.figure.width, 64..16_384).context("invalid figure width")?;
        check_num(self.figure.height, 64..16_384).context("invalid figure height")?;
        check_num(self.figure.x_lim, 1..100_000).context("invalid x-axis limit")?;

        if self.figure.palette.is_empty() {
            bail!("palette must not be empty");
        }
        for name in &self.figure.palette {
            plot::color_by_name(name).context("invalid palette")?;
        }
        check_num(self.figure.annotation_base, 0.0..1.0).context("invalid annotation base")?;
        check_num(self.figure.annotation_step, 0.0..1.0).context("invalid annotation step")?;

        if !self.report.template.contains("{tau}") {
            bail!("report template must contain the {{tau}} placeholder");
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
