//! Deterministic tile placement.
//!
//! A grid is a pure function of canvas bounds, tile extent, and spacing. Nothing here is cached:
//! each compositing call derives its own grid.

use crate::foundation::error::{WatermarkError, WatermarkResult};

/// Half-open arithmetic progression `start, start + step, ... < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSteps {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl AxisSteps {
    pub fn new(start: i64, end: i64, step: i64) -> WatermarkResult<Self> {
        if step < 1 {
            return Err(WatermarkError::validation(format!(
                "tile step must be at least 1px (got {step})"
            )));
        }
        Ok(Self { start, end, step })
    }

    pub fn len(&self) -> usize {
        if self.end <= self.start {
            return 0;
        }
        ((self.end - self.start + self.step - 1) / self.step) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + use<> {
        let Self { start, step, .. } = *self;
        (0..self.len() as i64).map(move |i| start + i * step)
    }
}

/// Row-major set of tile origins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub xs: AxisSteps,
    pub ys: AxisSteps,
}

impl TileGrid {
    /// Grid for the rotated text run.
    ///
    /// Covers `[-extent, 2 * extent)` on both axes so a 45 degree rotation of the origins still
    /// reaches every corner of the canvas.
    pub fn rotated_text(width: u32, height: u32, pitch: f64) -> WatermarkResult<Self> {
        let step = pitch_to_px(pitch)?;
        let (w, h) = (i64::from(width), i64::from(height));
        Ok(Self {
            xs: AxisSteps::new(-w, w * 2, step)?,
            ys: AxisSteps::new(-h, h * 2, step)?,
        })
    }

    /// Grid for an axis-aligned stencil: canvas bounds only, stepping by tile extent plus gap.
    pub fn stencil(
        width: u32,
        height: u32,
        tile_w: u32,
        tile_h: u32,
        gap_x: u32,
        gap_y: u32,
    ) -> WatermarkResult<Self> {
        let step_x = i64::from(tile_w) + i64::from(gap_x);
        let step_y = i64::from(tile_h) + i64::from(gap_y);
        Ok(Self {
            xs: AxisSteps::new(0, i64::from(width), step_x)?,
            ys: AxisSteps::new(0, i64::from(height), step_y)?,
        })
    }

    pub fn len(&self) -> usize {
        self.xs.len().saturating_mul(self.ys.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn origins(&self) -> impl Iterator<Item = (i64, i64)> + use<> {
        let xs = self.xs;
        self.ys.iter().flat_map(move |y| xs.iter().map(move |x| (x, y)))
    }
}

/// Text tile pitch: spacing is a multiplier on `font_size / 100`.
pub fn text_pitch(font_size: f64, spacing: f64) -> f64 {
    (font_size / 100.0) * spacing
}

/// Gap between stencil tiles along one axis, damped by a factor of ten.
pub fn stencil_gap(extent: u32, spacing: f64) -> u32 {
    let gap = (f64::from(extent) * spacing / 100.0) / 10.0;
    if gap.is_finite() && gap > 0.0 {
        gap as u32
    } else {
        0
    }
}

fn pitch_to_px(pitch: f64) -> WatermarkResult<i64> {
    if !pitch.is_finite() {
        return Err(WatermarkError::validation("tile pitch must be finite"));
    }
    let px = pitch as i64;
    if px < 1 {
        return Err(WatermarkError::validation(format!(
            "tile pitch {pitch} truncates below 1px"
        )));
    }
    Ok(px)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_pitch_for_default_params_is_32() {
        let pitch = text_pitch(32.0, 100.0);
        assert_eq!(pitch, 32.0);

        let grid = TileGrid::rotated_text(64, 64, pitch).unwrap();
        let xs: Vec<i64> = grid.xs.iter().collect();
        assert_eq!(xs.first().copied(), Some(-64));
        assert!(xs.windows(2).all(|w| w[1] - w[0] == 32));
        assert!(*xs.last().unwrap() < 128);
        assert_eq!(xs.len(), 6);
    }

    #[test]
    fn rotated_grid_covers_three_extents() {
        let grid = TileGrid::rotated_text(100, 50, 10.0).unwrap();
        assert_eq!(grid.xs.start, -100);
        assert_eq!(grid.xs.end, 200);
        assert_eq!(grid.ys.start, -50);
        assert_eq!(grid.ys.end, 100);
        assert_eq!(grid.xs.len(), 30);
        assert_eq!(grid.ys.len(), 15);
        assert_eq!(grid.len(), 450);
        assert_eq!(grid.origins().count(), 450);
    }

    #[test]
    fn pitch_truncates_like_integer_conversion() {
        let grid = TileGrid::rotated_text(10, 10, text_pitch(32.0, 10.5)).unwrap();
        assert_eq!(grid.xs.step, 3);
    }

    #[test]
    fn sub_pixel_pitch_is_rejected() {
        assert!(TileGrid::rotated_text(10, 10, 0.5).is_err());
        assert!(TileGrid::rotated_text(10, 10, -4.0).is_err());
        assert!(TileGrid::rotated_text(10, 10, f64::NAN).is_err());
    }

    #[test]
    fn origins_are_row_major() {
        let grid = TileGrid::stencil(20, 20, 10, 10, 0, 0).unwrap();
        let got: Vec<(i64, i64)> = grid.origins().collect();
        assert_eq!(got, vec![(0, 0), (10, 0), (0, 10), (10, 10)]);
    }

    #[test]
    fn stencil_grid_steps_by_extent_plus_gap() {
        // 25px stencil, spacing 100 -> gap (25 * 1.0) / 10 = 2
        let gap = stencil_gap(25, 100.0);
        assert_eq!(gap, 2);
        let grid = TileGrid::stencil(100, 100, 25, 25, gap, gap).unwrap();
        let xs: Vec<i64> = grid.xs.iter().collect();
        assert_eq!(xs, vec![0, 27, 54, 81]);
    }

    #[test]
    fn stencil_gap_is_zero_for_degenerate_spacing() {
        assert_eq!(stencil_gap(25, 0.0), 0);
        assert_eq!(stencil_gap(25, -50.0), 0);
        assert_eq!(stencil_gap(25, f64::INFINITY), 0);
    }

    #[test]
    fn empty_axis_has_no_origins() {
        let axis = AxisSteps::new(5, 5, 1).unwrap();
        assert!(axis.is_empty());
        assert_eq!(axis.iter().count(), 0);
        assert!(AxisSteps::new(0, 10, 0).is_err());
    }
}
