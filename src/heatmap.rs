use crate::all::*;

// Stack of square per-joint target maps, `data[joint][y][x]` flattened.
#[derive(Clone, Debug, PartialEq)]
pub struct Heatmaps {
  pub data: Vec<f32>,
  pub joints: usize,
  pub resolution: usize,
}

impl Heatmaps {
  pub fn new(joints: usize, resolution: usize) -> Heatmaps {
    Heatmaps {
      data: vec![0.; joints * resolution * resolution],
      joints,
      resolution,
    }
  }

  #[cfg(test)]
  pub fn map(&self, joint: usize) -> &[f32] {
    let n = self.resolution * self.resolution;
    &self.data[joint * n .. (joint + 1) * n]
  }

  #[inline(always)]
  pub fn value(&self, joint: usize, x: usize, y: usize) -> f32 {
    self.data[(joint * self.resolution + y) * self.resolution + x]
  }

  // Unnormalized Gaussian with peak 1 at `center`, cut at 3 sigma. A window
  // entirely outside the map, or a non-finite center, leaves it zero.
  pub fn draw_gaussian(&mut self, joint: usize, center: &Vector2d, sigma: f64) {
    if !center[0].is_finite() || !center[1].is_finite() { return }
    let radius = (3. * sigma).ceil();
    let (fx, fy) = (center[0].round(), center[1].round());
    let limit = self.resolution as f64;
    // Bounds in floating point, the center may be far outside the i64 range.
    if fx + radius < 0. || fy + radius < 0. || fx - radius >= limit || fy - radius >= limit { return }
    let r = radius as i64;
    let (cx, cy) = (fx as i64, fy as i64);
    let res = self.resolution as i64;
    let n = self.resolution;
    let map = &mut self.data[joint * n * n .. (joint + 1) * n * n];
    for y in (cy - r).max(0)..=(cy + r).min(res - 1) {
      for x in (cx - r).max(0)..=(cx + r).min(res - 1) {
        let dx = x as f64 - center[0];
        let dy = y as f64 - center[1];
        map[y as usize * n + x as usize] = (-(dx * dx + dy * dy) / (2. * sigma * sigma)).exp() as f32;
      }
    }
  }
}

// One map per joint of a flat `[u0, v0, ...]` pose already in heatmap coordinates.
pub fn render_heatmaps(points: &Vectord, resolution: usize, sigma: f64) -> Heatmaps {
  let joints = joint_count(points, 2);
  let mut heatmaps = Heatmaps::new(joints, resolution);
  for j in 0..joints {
    heatmaps.draw_gaussian(j, &Vector2d::new(points[2 * j], points[2 * j + 1]), sigma);
  }
  heatmaps
}
