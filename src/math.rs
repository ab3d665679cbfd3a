use crate::all::*;

// Rodrigues' formula, `axis` must have unit length.
pub fn axis_angle_to_rotation_matrix(axis: &Vector3d, angle: f64) -> Matrix3d {
  let (s, c) = angle.sin_cos();
  let t = 1. - c;
  let (x, y, z) = (axis[0], axis[1], axis[2]);
  Matrix3d::new(
    t*x*x + c, t*x*y - s*z, t*x*z + s*y,
    t*x*y + s*z, t*y*y + c, t*y*z - s*x,
    t*x*z - s*y, t*y*z + s*x, t*z*z + c,
  )
}

// Uniform direction on the unit sphere by inverting the CDF of the polar angle.
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vector3d {
  let u1: f64 = rng.gen();
  let u2: f64 = rng.gen();
  let theta = (2. * u1 - 1.).acos();
  let phi = 2. * std::f64::consts::PI * u2;
  let (st, ct) = theta.sin_cos();
  let (sp, cp) = phi.sin_cos();
  Vector3d::new(st * cp, st * sp, ct)
}

// Mirrors the x axis.
pub fn reflection_x() -> Matrix3d {
  Matrix3d::from_diagonal(&Vector3d::new(-1., 1., 1.))
}

pub fn is_orthogonal(m: &Matrix3d, tolerance: f64) -> bool {
  (m * m.transpose() - Matrix3d::identity()).amax() < tolerance
}
