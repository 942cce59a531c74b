//! Decoding of a flat parameter vector into a structured level.
//!
//! Layout of the vector for `P` static and `M` moving platforms:
//!
//! | slots            | meaning                                   |
//! |------------------|-------------------------------------------|
//! | `[0, P)`         | static x-positions                        |
//! | `[P, 2P)`        | static y-positions                        |
//! | `[2P, 2P + 4M)`  | `M` rows of `(x_start, x_end, y, speed)`  |

use sf_types::{Level, LayoutError, MovingPlatform, StaticPlatform};

use crate::config::LayoutConfig;

/// Number of slots describing one moving platform.
pub const MOVING_ROW_LEN: usize = 4;

/// Turns parameter vectors into levels. Pure and deterministic.
#[derive(Debug, Clone, Default)]
pub struct LayoutDecoder {
    layout: LayoutConfig,
}

impl LayoutDecoder {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Decode `params` into a level.
    ///
    /// Bounds are not enforced here; out-of-range values decode normally.
    pub fn decode(&self, params: &[f64]) -> Result<Level, LayoutError> {
        let expected = self.layout.parameter_len();
        if params.len() != expected {
            return Err(LayoutError::InvalidParameterShape {
                expected,
                actual: params.len(),
            });
        }

        let p = self.layout.static_count;
        let xs = &params[..p];
        let ys = &params[p..2 * p];

        // x and y travel together under one permutation.
        let platforms = sort_permutation(xs)
            .into_iter()
            .map(|i| StaticPlatform::anchored(xs[i], ys[i], self.layout.static_width))
            .collect();

        let moving_platforms = params[self.layout.moving_offset()..]
            .chunks_exact(MOVING_ROW_LEN)
            .map(|row| MovingPlatform::new(row[0], row[1], row[2], row[3], self.layout.moving_width))
            .collect();

        Ok(Level::new(self.layout.start_platform, platforms, moving_platforms))
    }
}

/// Indices that visit `values` in ascending order. Ties keep their original
/// order and NaNs sort last.
pub fn sort_permutation(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    order
}
