use crate::all::*;

// Every pose is observed by this many calibrated cameras, with ids 1..=4.
pub const CAMERAS_PER_FRAME: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CameraKey {
  pub subject: u32,
  pub id: u32,
}

impl CameraKey {
  pub fn new(subject: u32, id: u32) -> CameraKey {
    CameraKey { subject, id }
  }
}

pub type Cameras = BTreeMap<CameraKey, Camera>;

// Intrinsic and extrinsic parameters of a single calibrated camera.
// The extrinsics map world points with `R * (X - T)`, so `T` is the camera
// center in world coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
  pub key: CameraKey,
  pub name: String,
  pub rotation: Matrix3d,
  pub translation: Vector3d,
  pub model: PinholeModel,
}

impl Camera {
  pub fn world_to_camera(&self, x: &Vector3d) -> Vector3d {
    self.rotation * (x - self.translation)
  }

  #[cfg(test)]
  pub fn camera_to_world(&self, x: &Vector3d) -> Vector3d {
    self.rotation.transpose() * x + self.translation
  }

  pub fn project(&self, x: &Vector3d) -> Vector2d {
    self.model.ray_to_pixel(x)
  }

  // Flat `[x0, y0, z0, ...]` world pose to the same layout in camera coordinates.
  pub fn world_to_camera_pose(&self, pose: &Vectord) -> Vectord {
    let mut out = Vectord::zeros(pose.len());
    for j in 0..joint_count(pose, 3) {
      set_joint_3d(&mut out, j, &self.world_to_camera(&joint_3d(pose, j)));
    }
    out
  }

  // Camera coordinate pose to flat `[u0, v0, u1, v1, ...]` pixels.
  pub fn project_pose(&self, pose_camera: &Vectord) -> Vectord {
    let n = joint_count(pose_camera, 3);
    let mut out = Vectord::zeros(2 * n);
    for j in 0..n {
      let pixel = self.project(&joint_3d(pose_camera, j));
      out.fixed_slice_mut::<2, 1>(2 * j, 0).copy_from(&pixel);
    }
    out
  }

  pub fn project_world_pose(&self, pose: &Vectord) -> Vectord {
    self.project_pose(&self.world_to_camera_pose(pose))
  }
}

// Cameras of a subject in id order.
pub fn subject_cameras(cameras: &Cameras, subject: u32) -> Result<[&Camera; CAMERAS_PER_FRAME]> {
  let get = |id: u32| {
    cameras.get(&CameraKey::new(subject, id))
      .ok_or_else(|| configuration_error(format!("Missing camera {} for subject {}.", id, subject)))
  };
  Ok([get(1)?, get(2)?, get(3)?, get(4)?])
}
