//! Block matching of gray-code planes inside one quadrant window.
//!
//! The cost of an offset `(dx, dy)` is the number of pixels `(x, y)` of the
//! window for which `current(x, y) != previous(x + dx, y + dy)`. Costs are
//! only ever compared within a single window.

use crate::config::SearchStrategy;
use crate::gray_code::GrayCodePlane;
use crate::window::SearchWindow;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// One evaluated offset and its mismatch count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Candidate {
    pub dx: i32,
    pub dy: i32,
    pub cost: u32,
}

impl Candidate {
    #[inline]
    fn magnitude(self) -> u32 {
        self.dx.unsigned_abs() + self.dy.unsigned_abs()
    }

    /// Lower cost wins; equal costs prefer the smaller displacement.
    #[inline]
    pub fn is_better_than(&self, other: &Self) -> bool {
        (self.cost, self.magnitude()) < (other.cost, other.magnitude())
    }
}

/// Row-major 3x3 neighbourhood in units of the current step.
const GRID: [(i32, i32); 9] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Matching context for one quadrant.
#[derive(Clone, Copy)]
pub struct QuadrantSearch<'a> {
    current: &'a GrayCodePlane,
    previous: &'a GrayCodePlane,
    window: SearchWindow,
    radius: i32,
}

impl<'a> QuadrantSearch<'a> {
    /// `window` expanded by `radius` must lie inside both planes.
    pub fn new(
        current: &'a GrayCodePlane,
        previous: &'a GrayCodePlane,
        window: SearchWindow,
        radius: u32,
    ) -> Self {
        debug_assert!(window.left >= radius && window.top >= radius);
        debug_assert!(window.right + radius <= current.size().width);
        debug_assert!(window.bottom + radius <= current.size().height);
        Self {
            current,
            previous,
            window,
            radius: radius as i32,
        }
    }

    /// Mismatch count for a single offset.
    pub fn cost(&self, dx: i32, dy: i32) -> u32 {
        debug_assert!(dx.abs() <= self.radius && dy.abs() <= self.radius);
        let w = self.window;
        let left = (w.left as i32 + dx) as u32;
        let right = (w.right as i32 + dx) as u32;
        let mut cost = 0u32;
        for y in w.top..w.bottom {
            let cur = self.current.row_span(y, w.left, w.right);
            let prev = self.previous.row_span((y as i32 + dy) as u32, left, right);
            cost += cur
                .iter()
                .zip(prev)
                .map(|(a, b)| u32::from(a ^ b))
                .sum::<u32>();
        }
        cost
    }

    #[inline]
    pub fn evaluate(&self, dx: i32, dy: i32) -> Candidate {
        Candidate {
            dx,
            dy,
            cost: self.cost(dx, dy),
        }
    }

    pub fn run(&self, strategy: SearchStrategy) -> Candidate {
        match strategy {
            SearchStrategy::ThreeStep => self.three_step(),
            SearchStrategy::Full => self.full(),
        }
    }

    /// Coarse-to-fine search: a 3x3 grid around (0, 0) at the largest power
    /// of two not above P, re-centred on the best candidate with the step
    /// halved until a step-1 grid has been evaluated. The steps sum to at
    /// least P, so every offset within the radius is reachable.
    pub fn three_step(&self) -> Candidate {
        let mut step = initial_step(self.radius);
        let mut best = self.evaluate(0, 0);
        loop {
            let center = best;
            let offsets: SmallVec<[(i32, i32); 9]> = GRID
                .iter()
                .map(|&(i, j)| (center.dx + i * step, center.dy + j * step))
                .filter(|&(dx, dy)| {
                    dx.abs() <= self.radius
                        && dy.abs() <= self.radius
                        && (dx, dy) != (center.dx, center.dy)
                })
                .collect();
            for (dx, dy) in offsets {
                let candidate = self.evaluate(dx, dy);
                if candidate.is_better_than(&best) {
                    best = candidate;
                }
            }
            if step == 1 {
                return best;
            }
            step = (step / 2).max(1);
        }
    }

    /// Exhaustive search over every offset within the radius.
    pub fn full(&self) -> Candidate {
        let mut best = self.evaluate(0, 0);
        for dy in -self.radius..=self.radius {
            for dx in -self.radius..=self.radius {
                let candidate = self.evaluate(dx, dy);
                if candidate.is_better_than(&best) {
                    best = candidate;
                }
            }
        }
        best
    }
}

/// Largest power of two not above `radius`.
#[inline]
fn initial_step(radius: i32) -> i32 {
    1 << (radius.max(1) as u32).ilog2()
}
