use crate::all::*;

// Floor for standard deviations and instance scales.
pub const STD_EPSILON: f64 = 1e-8;

// Per-dimension mean and standard deviation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStats {
  pub mean: Vectord,
  pub std: Vectord,
}

impl NormalizationStats {
  pub fn normalize(&self, x: &Vectord) -> Vectord {
    (x - &self.mean).component_div(&self.std)
  }

  pub fn denormalize(&self, x: &Vectord) -> Vectord {
    x.component_mul(&self.std) + &self.mean
  }

  pub fn with_std_floor(self) -> NormalizationStats {
    NormalizationStats {
      std: self.std.map(|s| s.max(STD_EPSILON)),
      mean: self.mean,
    }
  }
}

// Welford accumulation of per-dimension mean and population variance.
pub struct RunningStats {
  n: usize,
  mean: Vectord,
  m2: Vectord,
}

impl RunningStats {
  pub fn new(len: usize) -> RunningStats {
    RunningStats { n: 0, mean: Vectord::zeros(len), m2: Vectord::zeros(len) }
  }

  pub fn push(&mut self, x: &Vectord) {
    self.n += 1;
    let delta = x - &self.mean;
    self.mean += &delta / self.n as f64;
    let delta2 = x - &self.mean;
    self.m2 += delta.component_mul(&delta2);
  }

  pub fn count(&self) -> usize {
    self.n
  }

  pub fn finish(self) -> Result<NormalizationStats> {
    if self.n == 0 {
      bail!("Cannot compute statistics of an empty set.");
    }
    let n = self.n as f64;
    let std = self.m2.map(|m2| (m2 / n).sqrt().max(STD_EPSILON));
    Ok(NormalizationStats { mean: self.mean, std })
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseStats {
  pub pose_2d: NormalizationStats,
  pub pose_3d: NormalizationStats,
}

impl PoseStats {
  // Statistics read back from a cache are floored again before use.
  pub fn with_std_floor(self) -> PoseStats {
    PoseStats {
      pose_2d: self.pose_2d.with_std_floor(),
      pose_3d: self.pose_3d.with_std_floor(),
    }
  }
}

// Statistics of every training pose seen from each of its subject's cameras:
// 3D in camera coordinates, 2D as projected pixels, both restricted to the used
// dimensions.
pub fn compute_pose_stats(
  store: &PoseStore,
  cameras: &Cameras,
  selector_2d: &DimensionSelector,
  selector_3d: &DimensionSelector,
) -> Result<PoseStats> {
  if store.is_empty() {
    return Err(configuration_error("No training poses to compute normalization statistics from."));
  }
  let mut stats_2d = RunningStats::new(selector_2d.used_len());
  let mut stats_3d = RunningStats::new(selector_3d.used_len());
  let mut progress = Progress::new("pose statistics", store.len(), 10000);
  for (pose, meta) in store.poses().iter().zip(store.metas()) {
    for camera in subject_cameras(cameras, meta.subject)? {
      let pose_camera = camera.world_to_camera_pose(pose);
      stats_3d.push(&selector_3d.subsample(&pose_camera));
      stats_2d.push(&selector_2d.subsample(&camera.project_pose(&pose_camera)));
    }
    progress.step();
  }
  debug!("Pose statistics over {} views.", stats_3d.count());
  Ok(PoseStats {
    pose_2d: stats_2d.finish()?,
    pose_3d: stats_3d.finish()?,
  })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizationMode {
  // Fixed training set mean and std.
  Dataset,
  // Each pose centered on its own hip and scaled to unit RMS joint distance.
  Instance,
}

// Whatever is needed to undo the normalization of one sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NormalizationMeta {
  Dataset {
    stats_2d: NormalizationStats,
    stats_3d: NormalizationStats,
  },
  Instance {
    hip_2d: Vectord,
    scale_2d: f64,
    hip_3d: Vectord,
    scale_3d: f64,
  },
}

impl NormalizationMeta {
  pub fn denormalize_2d(&self, x: &Vectord) -> Vectord {
    match self {
      NormalizationMeta::Dataset { stats_2d, .. } => stats_2d.denormalize(x),
      NormalizationMeta::Instance { hip_2d, scale_2d, .. } => instance_denormalize(x, hip_2d, *scale_2d),
    }
  }

  pub fn denormalize_3d(&self, x: &Vectord) -> Vectord {
    match self {
      NormalizationMeta::Dataset { stats_3d, .. } => stats_3d.denormalize(x),
      NormalizationMeta::Instance { hip_3d, scale_3d, .. } => instance_denormalize(x, hip_3d, *scale_3d),
    }
  }
}

pub struct PoseNormalizer {
  pub mode: NormalizationMode,
  pub stats: PoseStats,
  hip_slot_2d: usize,
  hip_slot_3d: usize,
}

impl PoseNormalizer {
  pub fn new(
    mode: NormalizationMode,
    stats: PoseStats,
    selector_2d: &DimensionSelector,
    selector_3d: &DimensionSelector,
  ) -> Result<PoseNormalizer> {
    let hip_slot = |s: &DimensionSelector| s.hip_slot()
      .ok_or_else(|| configuration_error("The hip joint must be among the used joints."));
    if stats.pose_2d.mean.len() != selector_2d.used_len()
      || stats.pose_3d.mean.len() != selector_3d.used_len()
    {
      return Err(configuration_error("Normalization statistics do not match the used dimensions."));
    }
    Ok(PoseNormalizer {
      mode,
      hip_slot_2d: hip_slot(selector_2d)?,
      hip_slot_3d: hip_slot(selector_3d)?,
      stats,
    })
  }

  // Normalizes subsampled 2D and 3D poses of the same sample.
  pub fn normalize(&self, pose_2d: &Vectord, pose_3d: &Vectord) -> (Vectord, Vectord, NormalizationMeta) {
    match self.mode {
      NormalizationMode::Dataset => (
        self.stats.pose_2d.normalize(pose_2d),
        self.stats.pose_3d.normalize(pose_3d),
        NormalizationMeta::Dataset {
          stats_2d: self.stats.pose_2d.clone(),
          stats_3d: self.stats.pose_3d.clone(),
        },
      ),
      NormalizationMode::Instance => {
        let (n2, hip_2d, scale_2d) = instance_normalize(pose_2d, 2, self.hip_slot_2d);
        let (n3, hip_3d, scale_3d) = instance_normalize(pose_3d, 3, self.hip_slot_3d);
        (n2, n3, NormalizationMeta::Instance { hip_2d, scale_2d, hip_3d, scale_3d })
      },
    }
  }
}

// Returns the normalized pose, the hip position and the scale.
pub fn instance_normalize(pose: &Vectord, dim: usize, hip_slot: usize) -> (Vectord, Vectord, f64) {
  let n = joint_count(pose, dim);
  let hip = pose.rows(hip_slot * dim, dim).into_owned();
  let mut centered = pose.clone();
  for j in 0..n {
    let mut joint = centered.rows_mut(j * dim, dim);
    joint -= &hip;
  }
  let scale = (centered.norm_squared() / n as f64).sqrt().max(STD_EPSILON);
  (centered / scale, hip, scale)
}

pub fn instance_denormalize(x: &Vectord, hip: &Vectord, scale: f64) -> Vectord {
  let dim = hip.len();
  let mut out = x * scale;
  for j in 0..joint_count(x, dim) {
    let mut joint = out.rows_mut(j * dim, dim);
    joint += hip;
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::*;

  fn sample_poses() -> (Vectord, Vectord) {
    let camera = look_at_camera(1, 1, Vector3d::new(4., 3., 1.5));
    let pose_camera = camera.world_to_camera_pose(&synthetic_pose(0.7));
    (
      SELECTOR_2D.subsample(&camera.project_pose(&pose_camera)),
      SELECTOR_3D.subsample(&pose_camera),
    )
  }

  #[test]
  fn test_running_stats() {
    let xs = [dvector![1., 10.], dvector![2., 10.], dvector![4., 10.]];
    let mut stats = RunningStats::new(2);
    for x in &xs { stats.push(x) }
    let stats = stats.finish().unwrap();
    assert!((stats.mean[0] - 7. / 3.).abs() < 1e-12);
    let var: f64 = xs.iter().map(|x| (x[0] - 7. / 3.).powi(2)).sum::<f64>() / 3.;
    assert!((stats.std[0] - var.sqrt()).abs() < 1e-12);
    // Constant dimensions get the floor instead of zero.
    assert_eq!(stats.std[1], STD_EPSILON);
    assert!(RunningStats::new(2).finish().is_err());
  }

  #[test]
  fn test_compute_pose_stats() {
    let store = PoseStore::flatten(synthetic_raw_poses(&[(1, "Directions 1", 5), (5, "Walking 1", 3)])).unwrap();
    let cameras = synthetic_cameras(&[1, 5]);
    let stats = compute_pose_stats(&store, &cameras, &SELECTOR_2D, &SELECTOR_3D).unwrap();
    assert_eq!(stats.pose_2d.mean.len(), 32);
    assert_eq!(stats.pose_3d.mean.len(), 51);
    assert!(stats.pose_2d.std.iter().all(|&s| s >= STD_EPSILON));

    // Mean of the first camera-space coordinate, computed directly.
    let mut sum = 0.;
    for (pose, meta) in store.poses().iter().zip(store.metas()) {
      for camera in subject_cameras(&cameras, meta.subject).unwrap() {
        sum += camera.world_to_camera_pose(pose)[0];
      }
    }
    assert!((stats.pose_3d.mean[0] - sum / (4. * store.len() as f64)).abs() < 1e-9);
  }

  #[test]
  fn test_missing_camera_fails_stats() {
    let store = PoseStore::flatten(synthetic_raw_poses(&[(7, "Directions 1", 2)])).unwrap();
    let cameras = synthetic_cameras(&[1]);
    let err = compute_pose_stats(&store, &cameras, &SELECTOR_2D, &SELECTOR_3D).unwrap_err();
    assert!(is_configuration_error(&err));
  }

  #[test]
  fn test_dataset_round_trip() {
    let store = PoseStore::flatten(synthetic_raw_poses(&[(1, "Directions 1", 6)])).unwrap();
    let stats = compute_pose_stats(&store, &synthetic_cameras(&[1]), &SELECTOR_2D, &SELECTOR_3D).unwrap();
    let normalizer = PoseNormalizer::new(NormalizationMode::Dataset, stats, &SELECTOR_2D, &SELECTOR_3D).unwrap();
    let (p2, p3) = sample_poses();
    let (n2, n3, meta) = normalizer.normalize(&p2, &p3);
    assert!((meta.denormalize_2d(&n2) - &p2).amax() < 1e-6);
    assert!((meta.denormalize_3d(&n3) - &p3).amax() < 1e-9);
  }

  #[test]
  fn test_instance_round_trip() {
    let stats = PoseStats {
      pose_2d: NormalizationStats { mean: Vectord::zeros(32), std: Vectord::from_element(32, 1.) },
      pose_3d: NormalizationStats { mean: Vectord::zeros(51), std: Vectord::from_element(51, 1.) },
    };
    let normalizer = PoseNormalizer::new(NormalizationMode::Instance, stats, &SELECTOR_2D, &SELECTOR_3D).unwrap();
    let (p2, p3) = sample_poses();
    let (n2, n3, meta) = normalizer.normalize(&p2, &p3);
    // Hip at the origin, unit RMS joint distance.
    assert!(n3.rows(0, 3).norm() < 1e-12);
    assert!((n3.norm_squared() / 17. - 1.).abs() < 1e-9);
    match &meta {
      NormalizationMeta::Instance { hip_3d, scale_3d, .. } => {
        assert!((hip_3d - p3.rows(0, 3)).norm() < 1e-12);
        assert!(*scale_3d > 0.);
      },
      _ => panic!("expected instance normalization metadata"),
    }
    assert!((meta.denormalize_2d(&n2) - &p2).amax() < 1e-9);
    assert!((meta.denormalize_3d(&n3) - &p3).amax() < 1e-9);
  }

  #[test]
  fn test_degenerate_instance_scale() {
    let pose = Vectord::from_element(6, 3.);
    let (n, hip, scale) = instance_normalize(&pose, 3, 0);
    assert_eq!(scale, STD_EPSILON);
    assert!(n.iter().all(|&x| x == 0.));
    assert_eq!(instance_denormalize(&n, &hip, scale), pose);
  }
}
