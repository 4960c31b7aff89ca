//! [`PedalMap`] – measured pedal calibration table.
//!
//! A pedal map is a CSV grid.  The header row holds a label cell followed by
//! the speed breakpoints (m/s); every data row holds a pedal fraction as its
//! key followed by the acceleration (m/s²) measured at each breakpoint:
//!
//! ```text
//! default,0.0,10.0,20.0
//! 0.1,1.0,0.8,0.5
//! 0.5,3.0,2.5,2.0
//! ```
//!
//! [`PedalMap::lookup`] answers the inverse question: which pedal key yields
//! the target acceleration at the current speed.  The lookup is
//! nearest-neighbour on both axes, with no interpolation between rows or
//! breakpoints.
//!
//! # Example
//!
//! ```rust
//! use vpp_calibration::PedalMap;
//!
//! let map = PedalMap::parse("speed,0,10,20\n10,1.0,0.8,0.5\n50,3.0,2.5,2.0\n").unwrap();
//! assert_eq!(map.lookup(2.6, 9.0).unwrap(), 50.0);
//! ```

use std::path::Path;

use tracing::{info, warn};
use vpp_types::VppError;

/// An immutable pedal calibration table.  `PedalMap::default()` is empty and
/// every lookup on it fails with [`VppError::EmptyTable`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PedalMap {
    speed_breakpoints: Vec<f32>,
    /// `(key, values)` in file order; `values.len() == speed_breakpoints.len()`.
    rows: Vec<(f32, Vec<f32>)>,
    /// `columns[i][r] == rows[r].1[i]`.
    columns: Vec<Vec<f32>>,
}

impl PedalMap {
    /// Read and parse a calibration CSV from disk.
    ///
    /// # Errors
    ///
    /// [`VppError::Io`] if the file cannot be read, otherwise whatever
    /// [`parse`][Self::parse] reports.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VppError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| VppError::Io(format!("{}: {e}", path.display())))?;
        let map = Self::parse(&text)?;
        info!(
            path = %path.display(),
            rows = map.row_count(),
            breakpoints = map.speed_breakpoints.len(),
            "Pedal map loaded"
        );
        Ok(map)
    }

    /// Parse calibration CSV text.
    ///
    /// Blank lines are skipped and cells are trimmed.  A key that appears
    /// twice keeps its first position and takes the later values.
    ///
    /// # Errors
    ///
    /// [`VppError::MalformedCalibrationData`] with the 1-based line number
    /// when a cell is not a finite number or a data row's cell count differs from
    /// the header's.
    pub fn parse(text: &str) -> Result<Self, VppError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let Some((header_line, header)) = lines.next() else {
            return Ok(Self::default());
        };
        let header_cells: Vec<&str> = header.split(',').map(str::trim).collect();
        let speed_breakpoints = header_cells[1..]
            .iter()
            .map(|cell| parse_cell(cell, header_line))
            .collect::<Result<Vec<f32>, _>>()?;

        let mut rows: Vec<(f32, Vec<f32>)> = Vec::new();
        for (line_no, line) in lines {
            let cells: Vec<&str> = line.split(',').map(str::trim).collect();
            if cells.len() != header_cells.len() {
                return Err(VppError::MalformedCalibrationData {
                    line: line_no,
                    details: format!(
                        "expected {} cells, found {}",
                        header_cells.len(),
                        cells.len()
                    ),
                });
            }
            let key = parse_cell(cells[0], line_no)?;
            let values = cells[1..]
                .iter()
                .map(|cell| parse_cell(cell, line_no))
                .collect::<Result<Vec<f32>, _>>()?;

            match rows.iter_mut().find(|(k, _)| *k == key) {
                Some(existing) => {
                    warn!(key, line = line_no, "Duplicate pedal map row, later values win");
                    existing.1 = values;
                }
                None => rows.push((key, values)),
            }
        }

        let columns: Vec<Vec<f32>> = (0..speed_breakpoints.len())
            .map(|i| rows.iter().map(|(_, values)| values[i]).collect())
            .collect();

        Ok(Self {
            speed_breakpoints,
            rows,
            columns,
        })
    }

    /// Pedal key whose calibrated acceleration is nearest `target_accel` at
    /// the breakpoint nearest `current_speed`.
    ///
    /// The selected value is matched back to the first row holding an
    /// approximately equal value, so duplicate cells resolve to the earlier
    /// key.
    ///
    /// # Errors
    ///
    /// [`VppError::EmptyTable`] if the map holds no rows or no breakpoints.
    pub fn lookup(&self, target_accel: f32, current_speed: f32) -> Result<f32, VppError> {
        if self.is_empty() {
            return Err(VppError::EmptyTable);
        }
        let index = nearest_index(&self.speed_breakpoints, current_speed);
        let column = &self.columns[index];
        let row = nearest_index(column, target_accel);
        let nearest_accel = column[row];

        // The scan stops at `row` at the latest, whose value is the one chosen.
        Ok(self.rows[..=row]
            .iter()
            .find(|(_, values)| approximately(values[index], nearest_accel))
            .map_or(self.rows[row].0, |(key, _)| *key))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.speed_breakpoints.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn speed_breakpoints(&self) -> &[f32] {
        &self.speed_breakpoints
    }

    /// Row keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = f32> + '_ {
        self.rows.iter().map(|(key, _)| *key)
    }

    /// Calibrated accelerations for row `key`, one per breakpoint.
    pub fn row(&self, key: f32) -> Option<&[f32]> {
        self.rows
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, values)| values.as_slice())
    }

    /// Every row's value at breakpoint `index`.
    pub fn column(&self, index: usize) -> Option<&[f32]> {
        self.columns.get(index).map(Vec::as_slice)
    }
}

fn parse_cell(cell: &str, line: usize) -> Result<f32, VppError> {
    let value = cell
        .parse::<f32>()
        .map_err(|e| VppError::MalformedCalibrationData {
            line,
            details: format!("'{cell}' is not a number: {e}"),
        })?;
    if !value.is_finite() {
        return Err(VppError::MalformedCalibrationData {
            line,
            details: format!("'{cell}' is not a finite number"),
        });
    }
    Ok(value)
}

/// Index of the element nearest `target`.  An exact match wins immediately;
/// otherwise the first of equally distant candidates is kept.
fn nearest_index(values: &[f32], target: f32) -> usize {
    if let Some(exact) = values.iter().position(|&v| v == target) {
        return exact;
    }
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (i, &v) in values.iter().enumerate() {
        let distance = (v - target).abs();
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    best
}

/// Relative float equality.  The absolute floor only covers values at the
/// bottom of the normal range, so distinct cells near zero stay distinct.
fn approximately(a: f32, b: f32) -> bool {
    (b - a).abs() < (1e-6 * a.abs().max(b.abs())).max(f32::MIN_POSITIVE * 8.0)
}
