//! # Column Balancer
//!
//! This is the heart of Triptych and the reason it exists.
//!
//! ## The Problem
//!
//! A research poster lives or dies by its columns. Dump sections into three
//! columns in reading order and you get one column spilling past the bottom
//! edge while another sits half empty. Fixing that by hand means re-measuring
//! every block after every move.
//!
//! ## How Triptych Balances
//!
//! The balancer is a greedy assignment with bounded rebalancing passes:
//!
//! 1. Sections go into columns in narrative order, each into the column with
//!    the least used height so far. Order within a column is never changed.
//! 2. Visuals bound to a section ride immediately below it in the same
//!    column; unbound visuals are assigned afterwards by the same
//!    least-fill rule.
//! 3. If the utilization spread across columns exceeds the configured
//!    threshold, one group moves out of the fullest column into another
//!    column — but only when the move strictly reduces the spread, and the
//!    group is inserted at its rank position so in-column narrative order
//!    survives. Moves are capped, so the pass always terminates.
//! 4. Anything still past column capacity is handed to the overflow
//!    resolver, which shrinks visuals, requests text truncation, and steps
//!    the typography scale down before giving up with `LayoutInfeasible`.
//!
//! Every step is deterministic: equal column heights always tie-break to the
//! lowest column index, and the estimator has no randomness, so identical
//! inputs produce identical placements.

pub mod overflow;

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::canvas::{Canvas, COLUMN_COUNT};
use crate::error::LayoutError;
use crate::estimate::{estimate_section_height, estimate_visual};
use crate::model::{BalancerConfig, Storyboard, Typography, Visual};

/// Float slack for height comparisons.
const EPS: f64 = 1e-6;

/// What the balancer did to an element, one log entry per action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// Assigned a final position.
    Placed,
    /// Height reduced by the overflow resolver.
    Resized,
    /// Relocated by a rebalancing pass.
    MovedToColumn,
    /// Shortened text requested from an upstream collaborator.
    TruncationRequested,
    /// Global typography scale stepped down.
    Rescaled,
}

/// One append-only log entry describing a balancing decision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// Element id, or `*` for run-wide adjustments.
    pub element: String,
    pub action: Action,
    pub rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_height: Option<f64>,
}

/// Final coordinates for one element, in inches relative to the top-left
/// corner of the content area.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub element: String,
    pub column: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Everything a successful balancing run produces.
#[derive(Debug, Clone)]
pub struct BalanceOutcome {
    pub placements: Vec<Placement>,
    pub decisions: Vec<Decision>,
    /// True when the log contains truncation requests: the layout fits only
    /// after an upstream collaborator supplies shortened text and the caller
    /// re-drives the run.
    pub truncation_pending: bool,
    /// Typography scale the final pass was measured at.
    pub final_scale: f64,
}

// ── Internal working state ──────────────────────────────────────────

/// One placed unit: a section, or a visual.
#[derive(Debug, Clone)]
pub(crate) struct Member {
    pub(crate) id: String,
    /// Total occupied height (image plus caption for visuals).
    pub(crate) height: f64,
    pub(crate) detail: MemberDetail,
}

#[derive(Debug, Clone)]
pub(crate) enum MemberDetail {
    Section {
        /// Body length in characters; the resolver targets the longest.
        text_len: usize,
    },
    Visual {
        /// Estimated image height before any resolver shrinking.
        base_image_height: f64,
        /// Image height after the current shrink factor.
        image_height: f64,
        caption_height: f64,
        /// Display width preserving the intrinsic aspect ratio.
        display_width: f64,
    },
}

/// An indivisible assignment unit: a section with its bound visuals, or a
/// single unbound visual. Groups keep bound visuals in the same column as
/// their section by construction.
#[derive(Debug, Clone)]
pub(crate) struct Group {
    /// Ordering key: (narrative rank, input sequence). Unbound visuals sort
    /// after every section.
    pub(crate) order: (u64, usize),
    pub(crate) members: Vec<Member>,
    /// Member heights plus intra-group spacing.
    pub(crate) height: f64,
}

impl Group {
    fn lead_id(&self) -> &str {
        &self.members[0].id
    }
}

/// Per-column assignment state for a single balancing pass. Fresh per pass;
/// nothing persists across runs.
#[derive(Debug, Clone)]
pub(crate) struct ColumnState {
    pub(crate) index: usize,
    /// Indices into the pass's group list, in placement order.
    pub(crate) groups: Vec<usize>,
    pub(crate) used: f64,
}

impl ColumnState {
    fn new(index: usize) -> Self {
        Self {
            index,
            groups: Vec::new(),
            used: 0.0,
        }
    }

    fn push(&mut self, group_idx: usize, groups: &[Group], spacing: f64) {
        if !self.groups.is_empty() {
            self.used += spacing;
        }
        self.used += groups[group_idx].height;
        self.groups.push(group_idx);
    }

    pub(crate) fn remaining(&self, capacity: f64) -> f64 {
        capacity - self.used
    }
}

fn column_used(group_ids: &[usize], groups: &[Group], spacing: f64) -> f64 {
    let heights: f64 = group_ids.iter().map(|&g| groups[g].height).sum();
    let gaps = group_ids.len().saturating_sub(1) as f64 * spacing;
    heights + gaps
}

/// Index of the least-used column; ties go to the lowest index.
fn least_used(columns: &[ColumnState]) -> usize {
    let mut best = 0;
    for (i, col) in columns.iter().enumerate() {
        if col.used + EPS < columns[best].used {
            best = i;
        }
    }
    best
}

/// Index of the most-used column; ties go to the lowest index.
fn most_used(columns: &[ColumnState]) -> usize {
    let mut best = 0;
    for (i, col) in columns.iter().enumerate() {
        if col.used > columns[best].used + EPS {
            best = i;
        }
    }
    best
}

fn utilization_spread(columns: &[ColumnState], capacity: f64) -> f64 {
    (columns[most_used(columns)].used - columns[least_used(columns)].used) / capacity
}

// ── The balancer ────────────────────────────────────────────────────

/// Balances one storyboard onto one canvas. Owns its column state for the
/// duration of a run; construct a fresh one per poster-generation request.
pub struct Balancer {
    canvas: Canvas,
    typography: Typography,
    config: BalancerConfig,
}

impl Balancer {
    pub fn new(canvas: Canvas, typography: Typography, config: BalancerConfig) -> Self {
        Self {
            canvas,
            typography,
            config,
        }
    }

    /// Run the full balance-and-resolve loop for a storyboard.
    ///
    /// Terminates in bounded time: each balancing pass is linear in the
    /// element count with a capped number of rebalancing moves, and the
    /// overflow loop is capped by `max_overflow_retries`.
    pub fn run(&self, storyboard: &Storyboard) -> Result<BalanceOutcome, LayoutError> {
        let capacity = self.canvas.column_capacity();
        let spacing = self.typography.section_spacing;

        // Visual shrink factors and truncation requests persist across
        // typography-scale retries; everything else is rebuilt per pass.
        let mut shrink: HashMap<String, f64> = HashMap::new();
        let mut resolver_log: Vec<Decision> = Vec::new();
        let mut requested: HashSet<String> = HashSet::new();
        let mut scale = self.typography.scale;
        let mut attempt = 0u32;

        loop {
            let typography = self.typography.with_scale(scale);
            let mut groups = self.build_groups(storyboard, &typography, &shrink)?;
            let (mut columns, mut move_log) = self.assign(&groups, spacing, capacity);

            if columns.iter().all(|c| c.used <= capacity + EPS) {
                return Ok(self.finish(&columns, &groups, move_log, resolver_log, &requested, scale));
            }
            warn!(
                attempt,
                overflow = columns
                    .iter()
                    .map(|c| (c.used - capacity).max(0.0))
                    .sum::<f64>(),
                "columns overflow capacity, resolving"
            );

            // Resolution step 1: shrink visuals in the overflowing columns.
            if overflow::shrink_visuals(
                &columns,
                &groups,
                capacity,
                &self.config,
                &mut shrink,
                &mut resolver_log,
            ) {
                groups = self.build_groups(storyboard, &typography, &shrink)?;
                let pass = self.assign(&groups, spacing, capacity);
                columns = pass.0;
                move_log = pass.1;
                if columns.iter().all(|c| c.used <= capacity + EPS) {
                    return Ok(self.finish(
                        &columns,
                        &groups,
                        move_log,
                        resolver_log,
                        &requested,
                        scale,
                    ));
                }
            }

            // Resolution step 2: ask upstream for shorter text. Producing the
            // shortened variant is a collaborator's job; within this run the
            // request is a logged signal only.
            overflow::request_truncation(
                &columns,
                &groups,
                capacity,
                &mut requested,
                &mut resolver_log,
            );

            // Resolution step 3: step the typography scale down and re-run,
            // until the retry budget is spent.
            if attempt >= self.config.max_overflow_retries {
                let (placements, _) = self.place(&columns, &groups, spacing);
                let (overflow, elements) = overflow::summarize(&placements, &columns, capacity);
                return Err(LayoutError::LayoutInfeasible { overflow, elements });
            }
            let next = scale * self.config.scale_step;
            resolver_log.push(Decision {
                element: "*".to_string(),
                action: Action::Rescaled,
                rationale: format!(
                    "typography scale reduced from {:.3} to {:.3} to relieve overflow",
                    scale, next
                ),
                before_height: None,
                after_height: None,
            });
            debug!(from = scale, to = next, "stepping typography scale down");
            scale = next;
            attempt += 1;
        }
    }

    /// Estimate every element and fold bound visuals under their sections.
    fn build_groups(
        &self,
        storyboard: &Storyboard,
        typography: &Typography,
        shrink: &HashMap<String, f64>,
    ) -> Result<Vec<Group>, LayoutError> {
        let column_width = self.canvas.column_width();
        let capacity = self.canvas.column_capacity();

        let known: HashSet<&str> = storyboard.sections.iter().map(|s| s.id.as_str()).collect();
        let mut bound: HashMap<&str, Vec<&Visual>> = HashMap::new();
        let mut unbound: Vec<&Visual> = Vec::new();
        for visual in &storyboard.visuals {
            match visual.section.as_deref() {
                Some(owner) if known.contains(owner) => {
                    bound.entry(owner).or_default().push(visual);
                }
                Some(owner) => {
                    trace!(visual = %visual.id, owner, "owning section not found, placing unbound");
                    unbound.push(visual);
                }
                None => unbound.push(visual),
            }
        }

        let mut order: Vec<usize> = (0..storyboard.sections.len()).collect();
        order.sort_by_key(|&i| storyboard.sections[i].rank);

        let mut groups = Vec::new();
        for (seq, &idx) in order.iter().enumerate() {
            let section = &storyboard.sections[idx];
            let mut members = vec![Member {
                id: section.id.clone(),
                height: estimate_section_height(section, column_width, typography)?,
                detail: MemberDetail::Section {
                    text_len: section.body.chars().count(),
                },
            }];
            for &visual in bound.get(section.id.as_str()).into_iter().flatten() {
                members.push(self.visual_member(visual, typography, shrink, capacity)?);
            }
            groups.push(self.seal_group((section.rank as u64, seq), members));
        }
        for (seq, visual) in unbound.into_iter().enumerate() {
            let member = self.visual_member(visual, typography, shrink, capacity)?;
            groups.push(self.seal_group((u64::from(u32::MAX) + 1, seq), vec![member]));
        }
        Ok(groups)
    }

    fn visual_member(
        &self,
        visual: &Visual,
        typography: &Typography,
        shrink: &HashMap<String, f64>,
        capacity: f64,
    ) -> Result<Member, LayoutError> {
        let estimate = estimate_visual(
            visual,
            self.canvas.column_width(),
            capacity,
            typography,
            &self.config,
        )?;
        let factor = shrink.get(&visual.id).copied().unwrap_or(1.0);
        let image_height = estimate.image_height * factor;
        // aspect_ratio is validated inside estimate_visual
        let aspect = visual.aspect_ratio.unwrap_or(1.0);
        Ok(Member {
            id: visual.id.clone(),
            height: image_height + estimate.caption_height,
            detail: MemberDetail::Visual {
                base_image_height: estimate.image_height,
                image_height,
                caption_height: estimate.caption_height,
                display_width: image_height * aspect,
            },
        })
    }

    fn seal_group(&self, order: (u64, usize), members: Vec<Member>) -> Group {
        let heights: f64 = members.iter().map(|m| m.height).sum();
        let gaps = members.len().saturating_sub(1) as f64 * self.typography.visual_spacing;
        Group {
            order,
            members,
            height: heights + gaps,
        }
    }

    /// One balancing pass: greedy least-fill assignment plus capped
    /// rebalancing moves. Returns column state and the move log.
    fn assign(
        &self,
        groups: &[Group],
        spacing: f64,
        capacity: f64,
    ) -> (Vec<ColumnState>, Vec<Decision>) {
        let mut columns: Vec<ColumnState> = (0..COLUMN_COUNT).map(ColumnState::new).collect();

        let mut by_order: Vec<usize> = (0..groups.len()).collect();
        by_order.sort_by_key(|&g| groups[g].order);
        for g in by_order {
            let target = least_used(&columns);
            trace!(
                group = groups[g].lead_id(),
                column = target,
                height = groups[g].height,
                "assigning group"
            );
            columns[target].push(g, groups, spacing);
        }

        let mut log = Vec::new();
        for _ in 0..self.config.max_rebalance_iterations {
            let spread = utilization_spread(&columns, capacity);
            if spread <= self.config.imbalance_threshold + EPS {
                break;
            }
            if !self.try_rebalance_move(&mut columns, groups, spacing, capacity, spread, &mut log) {
                break;
            }
        }

        (columns, log)
    }

    /// Move one group out of the fullest column when that strictly reduces
    /// the utilization spread. Candidates are scanned from the bottom of the
    /// column upward, targets from the emptiest column upward, and the first
    /// strict improvement wins. The group is inserted at its rank position
    /// so in-column narrative order is preserved, and bound visuals travel
    /// with their section because they share its group.
    ///
    /// Scanning beyond the last group matters: under least-fill the last
    /// group landed when its column was the emptiest, so relocating it alone
    /// almost never narrows the spread. A small leading group above it often
    /// does.
    fn try_rebalance_move(
        &self,
        columns: &mut [ColumnState],
        groups: &[Group],
        spacing: f64,
        capacity: f64,
        current_spread: f64,
        log: &mut Vec<Decision>,
    ) -> bool {
        let from = most_used(columns);
        let mut targets: Vec<usize> = (0..columns.len()).filter(|&i| i != from).collect();
        targets.sort_by(|&a, &b| {
            columns[a]
                .used
                .total_cmp(&columns[b].used)
                .then(a.cmp(&b))
        });

        for ci in (0..columns[from].groups.len()).rev() {
            let candidate = columns[from].groups[ci];
            let mut new_from = columns[from].groups.clone();
            new_from.remove(ci);
            let from_used = column_used(&new_from, groups, spacing);

            for &to in &targets {
                let mut new_to = columns[to].groups.clone();
                let at = new_to
                    .iter()
                    .position(|&g| groups[g].order > groups[candidate].order)
                    .unwrap_or(new_to.len());
                new_to.insert(at, candidate);

                let mut used: Vec<f64> = columns.iter().map(|c| c.used).collect();
                used[from] = from_used;
                used[to] = column_used(&new_to, groups, spacing);
                let new_spread = (used.iter().fold(f64::MIN, |a, &b| a.max(b))
                    - used.iter().fold(f64::MAX, |a, &b| a.min(b)))
                    / capacity;

                if new_spread + EPS >= current_spread {
                    continue;
                }

                debug!(
                    group = groups[candidate].lead_id(),
                    from,
                    to,
                    spread_before = current_spread,
                    spread_after = new_spread,
                    "rebalancing move"
                );
                for member in &groups[candidate].members {
                    log.push(Decision {
                        element: member.id.clone(),
                        action: Action::MovedToColumn,
                        rationale: format!(
                            "moved from column {} to column {} to reduce utilization spread \
                             from {:.3} to {:.3}",
                            from, to, current_spread, new_spread
                        ),
                        before_height: Some(member.height),
                        after_height: Some(member.height),
                    });
                }
                columns[from].groups = new_from;
                columns[from].used = used[from];
                columns[to].groups = new_to;
                columns[to].used = used[to];
                return true;
            }
        }
        false
    }

    /// Compute final coordinates and the `Placed` log entries.
    fn place(
        &self,
        columns: &[ColumnState],
        groups: &[Group],
        spacing: f64,
    ) -> (Vec<Placement>, Vec<Decision>) {
        let column_width = self.canvas.column_width();
        let mut placements = Vec::new();
        let mut log = Vec::new();

        for col in columns {
            let x0 = self.canvas.column_x(col.index);
            let mut y = 0.0;
            for (gi, &g) in col.groups.iter().enumerate() {
                if gi > 0 {
                    y += spacing;
                }
                for (mi, member) in groups[g].members.iter().enumerate() {
                    if mi > 0 {
                        y += self.typography.visual_spacing;
                    }
                    let (x, width) = match &member.detail {
                        MemberDetail::Section { .. } => (x0, column_width),
                        MemberDetail::Visual { display_width, .. } => {
                            // center the image block in its column
                            (x0 + (column_width - display_width) / 2.0, *display_width)
                        }
                    };
                    placements.push(Placement {
                        element: member.id.clone(),
                        column: col.index,
                        x,
                        y,
                        width,
                        height: member.height,
                    });
                    log.push(Decision {
                        element: member.id.clone(),
                        action: Action::Placed,
                        rationale: format!(
                            "placed in column {} at y={:.2}in (column used {:.2}in of {:.2}in)",
                            col.index,
                            y,
                            col.used,
                            self.canvas.column_capacity()
                        ),
                        before_height: None,
                        after_height: Some(member.height),
                    });
                    y += member.height;
                }
            }
        }

        (placements, log)
    }

    fn finish(
        &self,
        columns: &[ColumnState],
        groups: &[Group],
        move_log: Vec<Decision>,
        resolver_log: Vec<Decision>,
        requested: &HashSet<String>,
        scale: f64,
    ) -> BalanceOutcome {
        let (placements, placed_log) = self.place(columns, groups, self.typography.section_spacing);
        let mut decisions = resolver_log;
        decisions.extend(move_log);
        decisions.extend(placed_log);
        debug!(
            placements = placements.len(),
            decisions = decisions.len(),
            scale,
            "balancing complete"
        );
        BalanceOutcome {
            placements,
            decisions,
            truncation_pending: !requested.is_empty(),
            final_scale: scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasSpec;
    use crate::model::Section;

    fn balancer() -> Balancer {
        let canvas = Canvas::new(&CanvasSpec::new(54.0, 36.0)).unwrap();
        Balancer::new(canvas, Typography::default(), BalancerConfig::default())
    }

    fn measured_sections(heights: &[f64]) -> Storyboard {
        Storyboard {
            sections: heights
                .iter()
                .enumerate()
                .map(|(i, &h)| Section::measured(&format!("s{i}"), i as u32, h))
                .collect(),
            visuals: vec![],
        }
    }

    #[test]
    fn equal_heights_tie_break_to_lowest_column() {
        let outcome = balancer().run(&measured_sections(&[4.0, 4.0])).unwrap();
        let col = |id: &str| {
            outcome
                .placements
                .iter()
                .find(|p| p.element == id)
                .unwrap()
                .column
        };
        // s0 goes to column 0; columns 1 and 2 then tie at zero, so s1
        // takes the lower index.
        assert_eq!(col("s0"), 0);
        assert_eq!(col("s1"), 1);
    }

    #[test]
    fn least_fill_prefers_emptiest_column() {
        let outcome = balancer()
            .run(&measured_sections(&[8.0, 3.0, 3.0, 2.0]))
            .unwrap();
        let col = |id: &str| {
            outcome
                .placements
                .iter()
                .find(|p| p.element == id)
                .unwrap()
                .column
        };
        // s0=8 -> col0, s1=3 -> col1, s2=3 -> col2, s3=2 -> col1 (ties with
        // col2 at 3.0, lower index wins)
        assert_eq!(col("s3"), 1);
    }

    #[test]
    fn bound_visual_follows_its_section() {
        let mut storyboard = measured_sections(&[4.0, 4.0, 4.0]);
        storyboard.visuals = vec![crate::model::Visual::figure("f1", 2.0).bound_to("s1")];
        let outcome = balancer().run(&storyboard).unwrap();
        let section = outcome
            .placements
            .iter()
            .find(|p| p.element == "s1")
            .unwrap();
        let visual = outcome
            .placements
            .iter()
            .find(|p| p.element == "f1")
            .unwrap();
        assert_eq!(section.column, visual.column);
        assert!(visual.y > section.y);
    }

    #[test]
    fn empty_storyboard_yields_empty_outcome() {
        let outcome = balancer()
            .run(&Storyboard {
                sections: vec![],
                visuals: vec![],
            })
            .unwrap();
        assert!(outcome.placements.is_empty());
        assert!(outcome.decisions.is_empty());
        assert!(!outcome.truncation_pending);
    }

    #[test]
    fn rebalance_relocates_a_group_out_of_the_fullest_column() {
        // Least-fill stacks s3 (9in) under s0 in column 0 for 11.3in against
        // 2in elsewhere. Relocating s3 itself cannot narrow the spread, but
        // relocating the 2in lead section above it can; the move search must
        // find it.
        let outcome = balancer()
            .run(&measured_sections(&[2.0, 2.0, 2.0, 9.0]))
            .unwrap();
        let moves: Vec<&Decision> = outcome
            .decisions
            .iter()
            .filter(|d| d.action == Action::MovedToColumn)
            .collect();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].element, "s0");
        let col = |id: &str| {
            outcome
                .placements
                .iter()
                .find(|p| p.element == id)
                .unwrap()
                .column
        };
        assert_eq!(col("s0"), 1);
        assert_eq!(col("s1"), 1);
        assert_eq!(col("s3"), 0);
    }

    #[test]
    fn rebalance_preserves_rank_order_within_columns() {
        // Ranks 0..5 with uneven heights force an imbalanced first pass.
        let outcome = balancer()
            .run(&measured_sections(&[12.0, 2.0, 2.0, 2.0, 2.0, 2.0]))
            .unwrap();
        for col in 0..3 {
            let ranks: Vec<usize> = outcome
                .placements
                .iter()
                .filter(|p| p.column == col)
                .map(|p| p.element[1..].parse::<usize>().unwrap())
                .collect();
            let mut sorted = ranks.clone();
            sorted.sort_unstable();
            assert_eq!(ranks, sorted, "column {col} reordered sections");
        }
    }
}
