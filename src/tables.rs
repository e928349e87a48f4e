//! Upstream table rows and CSV ingestion.
//!
//! The Morse-Smale complex is computed by an external pipeline (ParaView/TTK)
//! that exports three tabular artifacts. We only define the row shapes here;
//! a sample's id is its row position in the table.
//!
//! The CSV parsers accept the column layout the upstream export produces
//! (`Points_0`, `Points_1`, `CellId`, `ttkMaskScalarField`, `Point Index 0`,
//! `Point Index 1`). Columns are located by header name, so extra columns and
//! arbitrary column order are fine.

use crate::{Error, Result};

/// One separatrix point sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparatrixPoint {
    /// 2D sample coordinate.
    pub pos: [f64; 2],
    /// Cell identifier linking the sample to the complex cell it lies on.
    pub cell_id: u64,
    /// Boundary-mask scalar; `mask == 0` marks a critical-point sample.
    pub mask: i64,
}

impl SeparatrixPoint {
    /// Whether this sample sits on a critical point of the scalar field.
    #[inline]
    pub fn is_critical_sample(&self) -> bool {
        self.mask == 0
    }
}

/// One separatrix segment: an unordered pair of point-sample row indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeparatrixCell {
    pub points: [usize; 2],
}

/// One critical-point row; only the cell id matters to the graph core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriticalPoint {
    pub cell_id: u64,
}

fn split_row(line: &str) -> Vec<&str> {
    line.split(',').map(|f| f.trim().trim_matches('"')).collect()
}

fn column(header: &[&str], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|&h| h == name)
        .ok_or_else(|| Error::Consistency(format!("missing column {name:?} in CSV header")))
}

fn field<'a>(row: &'a [&'a str], idx: usize, line_no: usize) -> Result<&'a str> {
    row.get(idx).copied().ok_or_else(|| {
        Error::Consistency(format!("row {line_no} has too few fields (wanted index {idx})"))
    })
}

fn parse_f64(s: &str, line_no: usize) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|_| Error::Consistency(format!("row {line_no}: expected a number, got {s:?}")))
}

fn parse_u64(s: &str, line_no: usize) -> Result<u64> {
    // Upstream writes ids as plain integers, but some exporters float them.
    if let Ok(v) = s.parse::<u64>() {
        return Ok(v);
    }
    let v = parse_f64(s, line_no)?;
    if v < 0.0 || v.fract() != 0.0 {
        return Err(Error::Consistency(format!(
            "row {line_no}: expected a non-negative integer, got {s:?}"
        )));
    }
    Ok(v as u64)
}

fn parse_usize(s: &str, line_no: usize) -> Result<usize> {
    Ok(parse_u64(s, line_no)? as usize)
}

fn parse_i64(s: &str, line_no: usize) -> Result<i64> {
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    let v = parse_f64(s, line_no)?;
    if v.fract() != 0.0 {
        return Err(Error::Consistency(format!(
            "row {line_no}: expected an integer, got {s:?}"
        )));
    }
    Ok(v as i64)
}

fn rows(csv: &str) -> Result<(Vec<&str>, impl Iterator<Item = (usize, &str)>)> {
    let mut lines = csv.lines();
    let header = lines
        .next()
        .ok_or_else(|| Error::Consistency("empty CSV input".to_string()))?;
    let header = split_row(header);
    // Line numbers are 1-based and count the header, to match what an editor
    // shows when the caller goes looking.
    let body = csv
        .lines()
        .enumerate()
        .skip(1)
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !l.trim().is_empty());
    Ok((header, body))
}

/// Parse the separatrix point table from CSV text.
pub fn parse_separatrix_points(csv: &str) -> Result<Vec<SeparatrixPoint>> {
    let (header, body) = rows(csv)?;
    let c_x = column(&header, "Points_0")?;
    let c_y = column(&header, "Points_1")?;
    let c_cell = column(&header, "CellId")?;
    let c_mask = column(&header, "ttkMaskScalarField")?;

    let mut out = Vec::new();
    for (line_no, line) in body {
        let row = split_row(line);
        out.push(SeparatrixPoint {
            pos: [
                parse_f64(field(&row, c_x, line_no)?, line_no)?,
                parse_f64(field(&row, c_y, line_no)?, line_no)?,
            ],
            cell_id: parse_u64(field(&row, c_cell, line_no)?, line_no)?,
            mask: parse_i64(field(&row, c_mask, line_no)?, line_no)?,
        });
    }
    Ok(out)
}

/// Parse the separatrix cell (connectivity) table from CSV text.
pub fn parse_separatrix_cells(csv: &str) -> Result<Vec<SeparatrixCell>> {
    let (header, body) = rows(csv)?;
    let c_p0 = column(&header, "Point Index 0")?;
    let c_p1 = column(&header, "Point Index 1")?;

    let mut out = Vec::new();
    for (line_no, line) in body {
        let row = split_row(line);
        out.push(SeparatrixCell {
            points: [
                parse_usize(field(&row, c_p0, line_no)?, line_no)?,
                parse_usize(field(&row, c_p1, line_no)?, line_no)?,
            ],
        });
    }
    Ok(out)
}

/// Parse the critical-point table from CSV text.
pub fn parse_critical_points(csv: &str) -> Result<Vec<CriticalPoint>> {
    let (header, body) = rows(csv)?;
    let c_cell = column(&header, "CellId")?;

    let mut out = Vec::new();
    for (line_no, line) in body {
        let row = split_row(line);
        out.push(CriticalPoint {
            cell_id: parse_u64(field(&row, c_cell, line_no)?, line_no)?,
        });
    }
    Ok(out)
}
