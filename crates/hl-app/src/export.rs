//! Export of session rows to CSV or JSON lines.

use std::io::Write;

use crate::error::AppResult;
use crate::session::SessionRow;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    JsonLines,
}

const CSV_HEADER: &str = "time_s,boiler_temp,return_temp,setpoint,modulation,target_modulation,\
flame,enabled,pressure,indoor_temp,outdoor_temp,target_temp,heating_demand,windows_open,\
heat_loss_kj,heat_provided_kj";

pub fn write_rows<W: Write>(rows: &[SessionRow], format: ExportFormat, out: &mut W) -> AppResult<()> {
    match format {
        ExportFormat::Csv => write_csv(rows, out),
        ExportFormat::JsonLines => write_json_lines(rows, out),
    }
}

pub fn write_csv<W: Write>(rows: &[SessionRow], out: &mut W) -> AppResult<()> {
    writeln!(out, "{}", CSV_HEADER)?;
    for row in rows {
        let b = &row.boiler;
        let t = &row.thermal;
        writeln!(
            out,
            "{},{:.3},{:.3},{:.1},{:.2},{:.2},{},{},{:.2},{:.3},{:.3},{:.1},{:.2},{},{:.4},{:.4}",
            row.time_s,
            b.boiler_temp,
            b.return_temp,
            b.setpoint,
            b.modulation,
            b.target_modulation,
            b.flame as u8,
            b.enabled as u8,
            b.pressure,
            t.indoor_temp,
            t.outdoor_temp,
            t.target_temp,
            t.heating_demand,
            t.windows_open,
            t.heat_loss_kj,
            t.heat_provided_kj,
        )?;
    }
    Ok(())
}

/// One JSON object per line.
pub fn write_json_lines<W: Write>(rows: &[SessionRow], out: &mut W) -> AppResult<()> {
    for row in rows {
        serde_json::to_writer(&mut *out, row)?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::session::Session;

    fn rows(n: usize) -> Vec<SessionRow> {
        let config = Config {
            seed: Some(1),
            ..Config::default()
        };
        Session::new(&config).unwrap().run(n)
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let rows = rows(3);
        let mut buf = Vec::new();
        write_rows(&rows, ExportFormat::Csv, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER);
        let columns = CSV_HEADER.split(',').count();
        assert!(lines[1..].iter().all(|l| l.split(',').count() == columns));
        assert!(lines[1].starts_with("1,29.850,"));
    }

    #[test]
    fn json_lines_parse_back() {
        let rows = rows(2);
        let mut buf = Vec::new();
        write_rows(&rows, ExportFormat::JsonLines, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let parsed: Vec<SessionRow> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed.len(), rows.len());
        for (back, row) in parsed.iter().zip(&rows) {
            assert_eq!(back.time_s, row.time_s);
            assert_eq!(back.boiler.enabled, row.boiler.enabled);
            assert_eq!(back.thermal.windows_open, row.thermal.windows_open);
            assert!((back.thermal.indoor_temp - row.thermal.indoor_temp).abs() < 1e-9);
        }
    }
}
