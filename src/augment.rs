use crate::all::*;

// Random rotations and reflections of a whole 3D pose about its hip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthogonalAugmentation {
  pub probability: f64,
  pub z_rotations_only: bool,
  pub flip_prob: f64,
}

impl OrthogonalAugmentation {
  pub fn new(p: &DatasetParameters) -> OrthogonalAugmentation {
    OrthogonalAugmentation {
      probability: p.augmentation_prob,
      z_rotations_only: p.z_rotations_only,
      flip_prob: p.flip_prob,
    }
  }

  // Identity with probability `1 - probability`.
  pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Matrix3d {
    if rng.gen::<f64>() < self.probability {
      random_orthogonal_transform(rng, self.z_rotations_only, self.flip_prob)
    }
    else {
      Matrix3d::identity()
    }
  }
}

// Not uniform over O(3): uniform axis, uniform angle, then an optional mirror.
pub fn random_orthogonal_transform<R: Rng + ?Sized>(
  rng: &mut R,
  z_rotations_only: bool,
  flip_prob: f64,
) -> Matrix3d {
  let angle = 2. * std::f64::consts::PI * rng.gen::<f64>();
  let axis = if z_rotations_only { Vector3d::z() } else { random_unit_vector(rng) };
  let q = axis_angle_to_rotation_matrix(&axis, angle);
  let q = if rng.gen::<f64>() < flip_prob { q * reflection_x() } else { q };
  debug_assert!(is_orthogonal(&q, 1e-9));
  q
}

// Applies `q` to every joint's offset from the hip joint, the hip stays put.
pub fn apply_orthogonal_transform(pose: &Vectord, q: &Matrix3d) -> Vectord {
  let hip = joint_3d(pose, HIP_JOINT);
  let mut out = Vectord::zeros(pose.len());
  for j in 0..joint_count(pose, 3) {
    let x = joint_3d(pose, j);
    set_joint_3d(&mut out, j, &(q * (x - hip) + hip));
  }
  out
}

// One Bernoulli draw per raw joint, `true` keeps the joint.
pub fn joint_keep_mask<R: Rng + ?Sized>(rng: &mut R, drop_prob: f64) -> Vec<bool> {
  (0..NUM_JOINTS).map(|_| rng.gen::<f64>() >= drop_prob).collect()
}

// Zeroes the coordinates of dropped joints in a subsampled pose.
pub fn apply_joint_mask(pose: &mut Vectord, selector: &DimensionSelector, mask: &[bool]) {
  assert_eq!(pose.len(), selector.used_len());
  for (slot, &joint) in selector.used_joints.iter().enumerate() {
    if mask[joint] { continue }
    for d in 0..selector.dim {
      pose[slot * selector.dim + d] = 0.;
    }
  }
}
