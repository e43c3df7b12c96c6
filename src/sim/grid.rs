//! Uniform grid spatial hash over trail segments
//!
//! One cell per arena unit. Each cell lists the fragments of the trails that
//! pass through it. A fragment is a trail handle plus a point range that is
//! re-read from the trail store on every query, so amending a tail point in
//! place is seen by every fragment covering it.
//!
//! Updates are incremental: a tracker only walks the cells crossed by the
//! trail's newest segment, grows the fragment its tail already sits in and
//! allocates new fragments for cells it enters.

use std::fmt;

use glam::Vec2;

use super::collision::{
    ArenaRect, Bounds, Collider, CollisionError, Tracker, TrackerState, check_inside,
    tail_segment,
};
use super::segment::{clip, intersects};
use super::trail::{TrailId, Trails};
use crate::ground;

/// A trail's coverage of one cell: segments between points `offset..end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub trail: TrailId,
    /// Trail point that starts the coverage of this cell
    pub offset: usize,
    /// One past the last covered point
    pub end: usize,
}

/// Where a fragment lives: cell index and its slot in that cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentRef {
    pub cell: usize,
    pub slot: usize,
}

/// Spatial grid collider
pub struct GridCollider {
    arena: ArenaRect,
    bounds: Bounds,
    width: usize,
    height: usize,
    cells: Vec<Vec<Fragment>>,
    /// Bumped on reset; trackers from older rounds restart
    round: u64,
    /// Scratch buffer for cell walks
    walk: Vec<(i64, i64)>,
}

impl GridCollider {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell index of a ground-plane point, `None` outside the grid
    ///
    /// Points inside the arena always map to a cell.
    pub fn index(&self, x: f32, y: f32) -> Option<usize> {
        let p = Vec2::new(x, y);
        if self.bounds.contains(p) {
            let (col, row) = self.cell_of(p - self.bounds.min());
            return self.cell_at(col, row);
        }

        let col = (x - self.bounds.x1).floor();
        let row = (y - self.bounds.y1).floor();
        if !(col.is_finite() && row.is_finite()) {
            return None;
        }
        self.cell_at(col as i64, row as i64)
    }

    /// Cell of an arena-local point on the closed arena rectangle
    ///
    /// `x - x1` can round up onto the far wall for points just inside it, so
    /// the result is clamped to the last column and row.
    fn cell_of(&self, local: Vec2) -> (i64, i64) {
        let last_col = self.width.saturating_sub(1) as i64;
        let last_row = self.height.saturating_sub(1) as i64;
        (
            (local.x.floor() as i64).clamp(0, last_col),
            (local.y.floor() as i64).clamp(0, last_row),
        )
    }

    fn cell_at(&self, col: i64, row: i64) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.width as i64 || row >= self.height as i64 {
            return None;
        }
        Some(col as usize + row as usize * self.width)
    }

    /// Fragments stored in the cell containing `(x, y)`
    pub fn cell(&self, x: f32, y: f32) -> &[Fragment] {
        self.index(x, y)
            .map(|idx| self.cells[idx].as_slice())
            .unwrap_or(&[])
    }

    /// Points viewed by the fragments of one cell, summed per fragment
    pub fn cell_len(&self, x: f32, y: f32) -> usize {
        self.cell(x, y).iter().map(|f| f.end - f.offset).sum()
    }

    /// Total fragments across all cells
    pub fn fragment_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn fragment(&self, r: FragmentRef) -> Option<&Fragment> {
        self.cells.get(r.cell)?.get(r.slot)
    }

    fn fragment_mut(&mut self, r: FragmentRef) -> Option<&mut Fragment> {
        self.cells.get_mut(r.cell)?.get_mut(r.slot)
    }

    fn push_fragment(&mut self, cell: usize, fragment: Fragment) -> FragmentRef {
        let list = &mut self.cells[cell];
        list.push(fragment);
        FragmentRef {
            cell,
            slot: list.len() - 1,
        }
    }

    /// First stored segment in `cell` struck by `from -> to`
    ///
    /// Fragments of `own` stop before its newest point (`own_len - 1`) so the
    /// new segment is never tested against itself.
    pub fn cell_collision(
        &self,
        cell: usize,
        from: Vec2,
        to: Vec2,
        own: TrailId,
        own_len: usize,
        trails: &Trails,
    ) -> Option<CollisionError> {
        for fragment in self.cells.get(cell)? {
            let points = trails.points(fragment.trail);
            let mut end = fragment.end.min(points.len());
            if fragment.trail == own {
                end = end.min(own_len.saturating_sub(1));
            }

            for i in fragment.offset + 1..end {
                let (a, b) = (ground(points[i - 1]), ground(points[i]));
                if intersects(a, b, from, to) {
                    return Some(CollisionError::segment(a, b));
                }
            }
        }
        None
    }

    /// Cells crossed by `from -> to`, start to end, as (column, row)
    ///
    /// Grid traversal between the endpoint cells. Where the segment runs
    /// through (or within `CORNER_SLACK` of) a cell corner the two side cells
    /// are listed as well, so anything touching that corner shares a cell
    /// with it. Both points must lie on the closed arena rectangle.
    fn walk(&self, from: Vec2, to: Vec2, out: &mut Vec<(i64, i64)>) {
        out.clear();

        let origin = self.bounds.min();
        let (p0, p1) = (from - origin, to - origin);
        let d = p1 - p0;

        let (mut col, mut row) = self.cell_of(p0);
        let end = self.cell_of(p1);
        let step_col = if end.0 > col { 1 } else { -1 };
        let step_row = if end.1 > row { 1 } else { -1 };
        // Exit parameters this close count as passing through the corner
        let corner = CORNER_SLACK / d.length().max(f32::MIN_POSITIVE);

        out.push((col, row));
        while (col, row) != end {
            let (advance_col, advance_row) = match (col != end.0, row != end.1) {
                (true, false) => (true, false),
                (false, true) => (false, true),
                _ => {
                    let t_col = exit_t(p0.x, d.x, col, step_col);
                    let t_row = exit_t(p0.y, d.y, row, step_row);
                    if (t_col - t_row).abs() <= corner {
                        (true, true)
                    } else if t_col < t_row {
                        (true, false)
                    } else {
                        (false, true)
                    }
                }
            };

            if advance_col && advance_row {
                out.push((col + step_col, row));
                out.push((col, row + step_row));
            }
            if advance_col {
                col += step_col;
            }
            if advance_row {
                row += step_row;
            }
            out.push((col, row));
        }
    }
}

/// Distance from a cell corner, in arena units, inside which a walk visits
/// both side cells
const CORNER_SLACK: f32 = 1e-4;

/// Parameter along the segment where it leaves `cell` on one axis
#[inline]
fn exit_t(p: f32, d: f32, cell: i64, step: i64) -> f32 {
    let edge = if step > 0 { cell + 1 } else { cell };
    (edge as f32 - p) / d
}

impl Collider for GridCollider {
    type Tracker = GridTracker;

    fn new(arena: ArenaRect) -> Self {
        let (width, height) = (arena.width(), arena.height());
        Self {
            arena,
            bounds: arena.into(),
            width,
            height,
            cells: vec![Vec::new(); width * height],
            round: 0,
            walk: Vec::new(),
        }
    }

    fn track(&mut self, trail: TrailId) -> GridTracker {
        GridTracker::new(trail, self.round)
    }

    fn reset(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.round += 1;
        log::debug!("grid reset, round {}", self.round);
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl fmt::Display for GridCollider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, cell) in self.cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let x = (idx % self.width) as i32 + self.arena.min.x;
            let y = (idx / self.width) as i32 + self.arena.min.y;

            write!(f, "[{x},{y}] {} fragment(s):", cell.len())?;
            for fragment in cell {
                write!(
                    f,
                    " {}[{}..{}]",
                    fragment.trail, fragment.offset, fragment.end
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Per-trail cursor into a [`GridCollider`]
#[derive(Debug, Clone)]
pub struct GridTracker {
    trail: TrailId,
    round: u64,
    state: TrackerState,
    /// Fragment holding the trail's tail point
    anchor: Option<FragmentRef>,
    /// Fragments covering the newest segment, in walk order
    span: Vec<FragmentRef>,
    prev_span: Vec<FragmentRef>,
    /// Trail length at the last registration
    last_len: usize,
    /// Last update amended the tail point instead of appending one
    extending: bool,
}

impl GridTracker {
    fn new(trail: TrailId, round: u64) -> Self {
        Self {
            trail,
            round,
            state: TrackerState::Idle,
            anchor: None,
            span: Vec::new(),
            prev_span: Vec::new(),
            last_len: 0,
            extending: false,
        }
    }

    pub fn anchor(&self) -> Option<FragmentRef> {
        self.anchor
    }

    pub fn is_extending(&self) -> bool {
        self.extending
    }

    fn step(&mut self, grid: &mut GridCollider, trails: &Trails) -> Result<(), CollisionError> {
        let points = trails.points(self.trail);
        let (from, to) = tail_segment(points)?;
        let len = points.len();

        if self.last_len > 0 && len > self.last_len + 1 {
            log::warn!(
                "{} grew by {} points since its last update; only the newest segment is tracked",
                self.trail,
                len - self.last_len
            );
        }
        self.extending = len == self.last_len;

        let mut walk = std::mem::take(&mut grid.walk);
        let outcome = if check_inside(&grid.bounds, from, to).is_ok() {
            grid.walk(from, to, &mut walk);
            Ok(())
        } else {
            // Still register the part inside the arena so other trails see it
            match clip(from, to, grid.bounds.min(), grid.bounds.max()) {
                Some((a, b)) if a.is_finite() && b.is_finite() => grid.walk(a, b, &mut walk),
                _ => walk.clear(),
            }
            Err(CollisionError::Boundary)
        };

        std::mem::swap(&mut self.span, &mut self.prev_span);
        self.span.clear();

        let mut hit = None;
        let mut last = None;
        for &(col, row) in &walk {
            let Some(cell) = grid.cell_at(col, row) else {
                continue;
            };
            if last == Some(cell) {
                continue;
            }
            last = Some(cell);

            if outcome.is_ok() && hit.is_none() {
                hit = grid.cell_collision(cell, from, to, self.trail, len, trails);
            }
            let fragment = self.register(grid, cell, len);
            self.span.push(fragment);
        }
        grid.walk = walk;

        self.anchor = self.span.last().copied();
        self.last_len = len;

        outcome?;
        match hit {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Record that the segment ending at point `len - 1` crosses `cell`
    fn register(&mut self, grid: &mut GridCollider, cell: usize, len: usize) -> FragmentRef {
        // Amended tail: the previous walk already covers this cell
        if self.extending {
            if let Some(r) = self.prev_span.iter().find(|r| r.cell == cell) {
                return *r;
            }
        }

        // Tail point sits in this cell: grow the fragment holding it
        if let Some(r) = self.anchor.filter(|r| r.cell == cell) {
            if let Some(fragment) = grid.fragment_mut(r) {
                if fragment.end + 1 >= len {
                    fragment.end = len;
                    return r;
                }
            }
        }

        log::trace!("{} enters cell {cell} at point {}", self.trail, len - 2);
        grid.push_fragment(
            cell,
            Fragment {
                trail: self.trail,
                offset: len - 2,
                end: len,
            },
        )
    }
}

impl Tracker for GridTracker {
    type Collider = GridCollider;

    fn trail(&self) -> TrailId {
        self.trail
    }

    fn state(&self) -> TrackerState {
        self.state
    }

    fn update(&mut self, grid: &mut GridCollider, trails: &Trails) -> Result<(), CollisionError> {
        if self.round != grid.round {
            *self = Self::new(self.trail, grid.round);
        }
        if let Some(err) = self.state.terminal_error() {
            return Err(err);
        }

        let result = self.step(grid, trails);
        if let Err(err) = &result {
            if err.is_fatal() {
                log::debug!("{} stopped: {err}", self.trail);
            }
        }
        self.state.settle(result)
    }
}
