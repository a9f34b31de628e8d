//! # Layout Report
//!
//! The artifact downstream styling and rendering stages consume: per-column
//! utilization, the full decision log, and the coordinate table. Pure
//! aggregation over a finished balancing run; no layout logic lives here.

use serde::Serialize;

use crate::balance::{BalanceOutcome, Decision, Placement};
use crate::canvas::{Canvas, COLUMN_COUNT};

/// Geometry the report was produced against.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasInfo {
    pub width: f64,
    pub height: f64,
    pub content_width: f64,
    pub content_height: f64,
    pub column_width: f64,
    pub column_capacity: f64,
}

/// Utilization summary for one column.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnReport {
    pub index: usize,
    /// Bottom edge of the lowest element, in inches.
    pub used_height: f64,
    pub capacity: f64,
    /// `used_height / capacity`, as a fraction.
    pub utilization: f64,
}

/// The complete output of a balancing run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub canvas: CanvasInfo,
    pub columns: Vec<ColumnReport>,
    pub placements: Vec<Placement>,
    pub decisions: Vec<Decision>,
    /// True when the decision log contains truncation requests; the caller
    /// should re-drive the run once shortened text is available.
    pub truncation_pending: bool,
    /// Typography scale the final layout was measured at.
    pub final_scale: f64,
}

impl LayoutReport {
    /// Assemble the report from a finished run. Column usage is derived from
    /// the placements themselves (the lowest bottom edge per column).
    pub fn build(outcome: BalanceOutcome, canvas: &Canvas) -> Self {
        let capacity = canvas.column_capacity();
        let columns = (0..COLUMN_COUNT)
            .map(|index| {
                let used_height = outcome
                    .placements
                    .iter()
                    .filter(|p| p.column == index)
                    .map(|p| p.y + p.height)
                    .fold(0.0, f64::max);
                ColumnReport {
                    index,
                    used_height,
                    capacity,
                    utilization: used_height / capacity,
                }
            })
            .collect();

        LayoutReport {
            canvas: CanvasInfo {
                width: canvas.width,
                height: canvas.height,
                content_width: canvas.content_width,
                content_height: canvas.content_height,
                column_width: canvas.column_width(),
                column_capacity: capacity,
            },
            columns,
            placements: outcome.placements,
            decisions: outcome.decisions,
            truncation_pending: outcome.truncation_pending,
            final_scale: outcome.final_scale,
        }
    }
}
