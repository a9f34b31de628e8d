//! # Triptych
//!
//! A column-balancing layout engine for research posters.
//!
//! Most poster tooling treats layout as an afterthought: sections get poured
//! into columns in reading order and the author hand-tunes heights until
//! nothing falls off the bottom edge. Triptych does the opposite: **column
//! balance is the fundamental layout decision.** Every section and visual is
//! measured against real column geometry before anything is positioned, and
//! the three columns are balanced against each other with the canvas height
//! as a hard constraint.
//!
//! ## Architecture
//!
//! ```text
//! Storyboard (JSON/API)
//!       ↓
//!   [model]     — Sections, visuals, typography, config
//!       ↓
//!   [canvas]    — Validated poster geometry, 3-column grid
//!       ↓
//!   [estimate]  — Deterministic height estimation per column width
//!       ↓
//!   [balance]   — Greedy least-fill + bounded rebalancing + overflow
//!       ↓
//!   [report]    — Utilization, decision log, coordinate table
//! ```
//!
//! The engine is pure local computation: no I/O, no randomness, no shared
//! state. Each run owns fresh column state, so concurrent poster requests
//! simply construct independent runs. Upstream stages (PDF parsing,
//! curation) and downstream stages (styling, rendering) communicate with
//! this core only through the structured records in [`model`] and
//! [`report`].

pub mod balance;
pub mod canvas;
pub mod error;
pub mod estimate;
pub mod metrics;
pub mod model;
pub mod report;

use balance::Balancer;
use canvas::{Canvas, CanvasSpec};
use error::LayoutError;
use model::{BalanceRequest, BalancerConfig, Storyboard, Typography};
use report::LayoutReport;

/// Balance a storyboard onto a canvas.
///
/// This is the primary entry point. Validates the canvas, estimates every
/// element, runs the balance-and-resolve loop, and aggregates the result
/// into a [`LayoutReport`] for downstream styling and rendering stages.
pub fn balance(
    storyboard: &Storyboard,
    spec: &CanvasSpec,
    typography: &Typography,
    config: &BalancerConfig,
) -> Result<LayoutReport, LayoutError> {
    let canvas = Canvas::new(spec)?;
    let balancer = Balancer::new(canvas.clone(), typography.clone(), config.clone());
    let outcome = balancer.run(storyboard)?;
    Ok(LayoutReport::build(outcome, &canvas))
}

/// Balance a request described as JSON, returning the report as JSON.
///
/// When the request sets `normalize`, the canvas is snapped to the reference
/// print width via [`CanvasSpec::normalized`] before validation.
pub fn balance_json(json: &str) -> Result<String, LayoutError> {
    let request: BalanceRequest = serde_json::from_str(json)?;
    let spec = if request.normalize {
        request.canvas.normalized()
    } else {
        request.canvas
    };
    let report = balance(
        &request.storyboard,
        &spec,
        &request.typography,
        &request.config,
    )?;
    Ok(serde_json::to_string_pretty(&report)?)
}
