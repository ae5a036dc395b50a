use crate::config::Config;
use crate::data;
use crate::plot::Figure;
use crate::report;
use crate::stats::TauSeries;
use anyhow::{Context, Result};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub struct Manager {
    work_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(work_dir: P) -> Result<Self> {
        let work_dir = work_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(work_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { work_dir, cfg })
    }

    pub fn reduce(&self) -> Result<()> {
        let data_file = self.work_dir.join(&self.cfg.input.data_file);
        let counts = data::read_counts(&data_file).context("failed to read pulse counts")?;
        log::info!("loaded {} pulse counts from {data_file:?}", counts.len());

        let mut figure = Figure::new(self.cfg.figure.clone(), self.cfg.reduction.tick_seconds);

        for (ordinal, &tau) in self.cfg.reduction.taus.iter().enumerate() {
            log::info!("tau = {tau}");

            let series = TauSeries::new(&counts, tau).context("failed to construct series")?;
            log::debug!("grouped sequence: {:?}", series.grouped());

            let report_file = self.report_file(tau);
            report::write_report(&report_file, &series)
                .with_context(|| format!("failed to write {report_file:?}"))?;
            log::info!("wrote {report_file:?}");

            figure.add_frequencies(ordinal, &series);
        }

        // The overlay series occupies the ordinal after the bar layers;
        // its curve takes the next palette slot.
        let overlay = TauSeries::new(&counts, self.cfg.reduction.overlay_tau)
            .context("failed to construct overlay series")?;
        figure.add_poisson(self.cfg.reduction.taus.len() + 1, overlay.mean()?);

        let figure_file = self.figure_file();
        figure
            .render(&figure_file)
            .with_context(|| format!("failed to render {figure_file:?}"))?;
        log::info!("wrote {figure_file:?}");

        Ok(())
    }

    pub fn clean(&self) -> Result<()> {
        let pattern = self
            .work_dir
            .join(self.cfg.report.template.replace("{tau}", "*"));
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        for file in glob(pattern)
            .context("failed to glob report files")?
            .filter_map(Result::ok)
        {
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            log::info!("removed {file:?}");
        }

        let figure_file = self.figure_file();
        if figure_file.exists() {
            fs::remove_file(&figure_file)
                .with_context(|| format!("failed to remove {figure_file:?}"))?;
            log::info!("removed {figure_file:?}");
        }

        Ok(())
    }

    fn report_file(&self, tau: usize) -> PathBuf {
        self.work_dir
            .join(self.cfg.report.template.replace("{tau}", &tau.to_string()))
    }

    fn figure_file(&self) -> PathBuf {
        self.work_dir.join(&self.cfg.figure.file)
    }
}
