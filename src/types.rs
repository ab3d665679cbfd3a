// Eigen-like aliases.
pub type Vector2d = nalgebra::Vector2::<f64>;
pub type Vector3d = nalgebra::Vector3::<f64>;
pub type Matrix3d = nalgebra::Matrix3::<f64>;
pub type Vectord = nalgebra::DVector::<f64>;

// A flat pose vector `[x0, y0, (z0,) x1, y1, ...]` is this many joints long.
pub fn joint_count(pose: &Vectord, dim: usize) -> usize {
  pose.len() / dim
}

pub fn joint_3d(pose: &Vectord, joint: usize) -> Vector3d {
  Vector3d::new(pose[3 * joint], pose[3 * joint + 1], pose[3 * joint + 2])
}

pub fn set_joint_3d(pose: &mut Vectord, joint: usize, v: &Vector3d) {
  pose.fixed_slice_mut::<3, 1>(3 * joint, 0).copy_from(v);
}
