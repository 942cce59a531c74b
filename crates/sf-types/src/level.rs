//! Platforms and the decoded level they form.

use serde::{Deserialize, Serialize};

use crate::errors::LayoutError;

/// Axis-aligned horizontal platform segment (`y1 == y2`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticPlatform {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl StaticPlatform {
    /// Platform of `width` whose left edge sits at `(x, y)`.
    pub fn anchored(x: f64, y: f64, width: f64) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y,
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }
}

/// Platform that oscillates along x between `start_x` and `end_x` at a fixed height.
///
/// `x1..x2` is the footprint at the start of the oscillation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovingPlatform {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub start_x: f64,
    pub end_x: f64,
    pub speed: f64,
    /// Simulation direction flag, +1 or -1. Not read by the optimizer.
    pub direction: i8,
}

impl MovingPlatform {
    pub fn new(start_x: f64, end_x: f64, y: f64, speed: f64, width: f64) -> Self {
        Self {
            x1: start_x,
            y1: y,
            x2: start_x + width,
            y2: y,
            start_x,
            end_x,
            speed,
            direction: 1,
        }
    }

    /// Distance covered in one sweep of the oscillation.
    pub fn travel(&self) -> f64 {
        (self.end_x - self.start_x).abs()
    }
}

/// The parts of any platform a jump cares about: left edge, right edge, height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ledge {
    pub x1: f64,
    pub x2: f64,
    pub y: f64,
}

impl From<&StaticPlatform> for Ledge {
    fn from(p: &StaticPlatform) -> Self {
        Self {
            x1: p.x1,
            x2: p.x2,
            y: p.y1,
        }
    }
}

impl From<&MovingPlatform> for Ledge {
    fn from(p: &MovingPlatform) -> Self {
        Self {
            x1: p.x1,
            x2: p.x2,
            y: p.y1,
        }
    }
}

/// A decoded level: the fixed start platform, the x-sorted static platforms,
/// and the moving platforms in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub start: StaticPlatform,
    pub platforms: Vec<StaticPlatform>,
    pub moving_platforms: Vec<MovingPlatform>,
}

impl Level {
    pub fn new(
        start: StaticPlatform,
        platforms: Vec<StaticPlatform>,
        moving_platforms: Vec<MovingPlatform>,
    ) -> Self {
        Self {
            start,
            platforms,
            moving_platforms,
        }
    }

    /// Start platform followed by the static platforms.
    pub fn static_platforms(&self) -> impl Iterator<Item = &StaticPlatform> {
        std::iter::once(&self.start).chain(self.platforms.iter())
    }

    /// Every platform in traversal order: start, statics, then moving
    /// platforms in declaration order (not spatially merged).
    pub fn ledges(&self) -> impl Iterator<Item = Ledge> + '_ {
        self.static_platforms()
            .map(Ledge::from)
            .chain(self.moving_platforms.iter().map(Ledge::from))
    }

    pub fn total_platforms(&self) -> usize {
        1 + self.platforms.len() + self.moving_platforms.len()
    }

    /// Check the shape invariants: the expected counts and ascending `x1`
    /// order of the static platforms.
    pub fn validate(&self, static_count: usize, moving_count: usize) -> Result<(), LayoutError> {
        if self.platforms.len() != static_count {
            return Err(LayoutError::CountMismatch {
                kind: "static",
                expected: static_count,
                actual: self.platforms.len(),
            });
        }
        if self.moving_platforms.len() != moving_count {
            return Err(LayoutError::CountMismatch {
                kind: "moving",
                expected: moving_count,
                actual: self.moving_platforms.len(),
            });
        }
        for (index, pair) in self.platforms.windows(2).enumerate() {
            if pair[1].x1 < pair[0].x1 {
                return Err(LayoutError::Unsorted {
                    index: index + 1,
                    x1: pair[1].x1,
                    previous: pair[0].x1,
                });
            }
        }
        Ok(())
    }
}
