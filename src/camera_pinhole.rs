// Pinhole projection with the OpenCV-style radial (k1, k2, k3) and tangential
// (p1, p2) distortion terms used by the Human3.6M calibration.

use crate::all::*;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinholeModel {
  pub focal_length: Vector2d,
  pub principal_point: Vector2d,
  pub radial: Vector3d,
  pub tangential: Vector2d,
}

impl PinholeModel {
  #[cfg(test)]
  pub fn undistorted(focal_length: Vector2d, principal_point: Vector2d) -> PinholeModel {
    PinholeModel {
      focal_length,
      principal_point,
      radial: Vector3d::zeros(),
      tangential: Vector2d::zeros(),
    }
  }

  // Distorts a point on the normalized image plane.
  pub fn distort(&self, p: Vector2d) -> Vector2d {
    let k = &self.radial;
    let t = &self.tangential;
    let r2 = p.norm_squared();
    let radial = 1. + r2 * (k[0] + r2 * (k[1] + r2 * k[2]));
    let tan = t[0] * p[1] + t[1] * p[0];
    p * (radial + tan) + Vector2d::new(t[1], t[0]) * r2
  }

  // Camera coordinates to pixels. Points at or behind the camera plane are not
  // rejected, matching how the dataset statistics are defined.
  pub fn ray_to_pixel(&self, ray: &Vector3d) -> Vector2d {
    let iz = 1. / ray[2];
    let dist = self.distort(Vector2d::new(ray[0] * iz, ray[1] * iz));
    self.focal_length.component_mul(&dist) + self.principal_point
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pinhole() {
    let camera = PinholeModel::undistorted(Vector2d::new(1000., 1000.), Vector2d::new(360., 640.));
    let ray = Vector3d::new(-0.25, 0.11, 2.);
    let pixel = camera.ray_to_pixel(&ray);
    assert!((pixel - Vector2d::new(235., 695.)).norm() < 1e-9);
    // Scale along the ray does not matter.
    assert!((camera.ray_to_pixel(&(ray * 3.)) - pixel).norm() < 1e-9);
  }

  #[test]
  fn test_distortion() {
    let mut camera = PinholeModel::undistorted(Vector2d::new(500., 400.), Vector2d::new(10., 20.));
    camera.radial = Vector3d::new(0.1, 0.01, 0.001);
    camera.tangential = Vector2d::new(0.02, -0.03);
    let p = Vector2d::new(0.5, -0.25);
    let r2: f64 = 0.3125;
    let radial = 1. + 0.1 * r2 + 0.01 * r2 * r2 + 0.001 * r2 * r2 * r2;
    let tan = 0.02 * -0.25 + -0.03 * 0.5;
    let expected = Vector2d::new(
      0.5 * (radial + tan) + -0.03 * r2,
      -0.25 * (radial + tan) + 0.02 * r2,
    );
    assert!((camera.distort(p) - expected).norm() < 1e-12);

    let pixel = camera.ray_to_pixel(&Vector3d::new(1., -0.5, 2.));
    let expected_pixel = Vector2d::new(500. * expected[0] + 10., 400. * expected[1] + 20.);
    assert!((pixel - expected_pixel).norm() < 1e-9);
  }
}
