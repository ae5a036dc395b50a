use crate::stats::TauSeries;
use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

const SIGMA_LEVELS: [u32; 3] = [1, 2, 3];

/// Write the per-tau text report: one `<Label> = <value>` line per statistic.
pub fn write_report<P: AsRef<Path>>(file: P, series: &TauSeries) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);

    render_report(&mut writer, series)?;

    writer.flush().context("failed to flush writer stream")?;

    Ok(())
}

fn render_report<W: Write>(out: &mut W, series: &TauSeries) -> Result<()> {
    let tau = series.tau() as f64;

    writeln!(out, "Average particles = {}", series.mean()?)?;
    writeln!(out, "Dispersion = {}", series.dispersion()?)?;
    writeln!(out, "Error rate = {}", series.std_error()?)?;
    writeln!(out, "Average intensity = {}", series.mean()? / tau)?;
    writeln!(out, "Average intensity error = {}", series.std_error()? / tau)?;
    for sigmas in SIGMA_LEVELS {
        writeln!(
            out,
            "{sigmas} sigma inclusion = {}",
            series.sigma_inclusion(sigmas as f64)?
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lines_are_labeled_and_ordered() {
        let series = TauSeries::new(&[1, 2, 3, 4, 5, 6], 2).unwrap();

        let mut out = Vec::new();
        render_report(&mut out, &series).expect("failed to render report");
        let report = String::from_utf8(out).unwrap();
        let lines: Vec<_> = report.lines().collect();

        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "Average particles = 7");
        assert!(lines[1].starts_with("Dispersion = "));
        assert!(lines[2].starts_with("Error rate = "));
        assert_eq!(lines[3], "Average intensity = 3.5");
        assert!(lines[4].starts_with("Average intensity error = "));
        assert!(lines[5].starts_with("1 sigma inclusion = "));
        assert_eq!(lines[6], "2 sigma inclusion = 1");
        assert_eq!(lines[7], "3 sigma inclusion = 1");
    }

    #[test]
    fn empty_series_fails_the_report() {
        let series = TauSeries::new(&[5], 2).unwrap();

        let mut out = Vec::new();
        assert!(render_report(&mut out, &series).is_err());
    }
}
