// Synthetic fixtures shared by the unit tests.

use crate::all::*;

// Camera at `center` looking at the world origin with the world z axis up.
pub fn look_at_camera(subject: u32, id: u32, center: Vector3d) -> Camera {
  let forward = (-center).normalize();
  let right = forward.cross(&Vector3d::z()).normalize();
  let down = forward.cross(&right);
  let rotation = Matrix3d::from_rows(&[right.transpose(), down.transpose(), forward.transpose()]);
  Camera {
    key: CameraKey::new(subject, id),
    name: format!("cam{}", id),
    rotation,
    translation: center,
    model: PinholeModel {
      focal_length: Vector2d::new(1150., 1145.),
      principal_point: Vector2d::new(500., 400.),
      radial: Vector3d::new(-0.01, 0.002, 0.),
      tangential: Vector2d::new(1e-4, -2e-4),
    },
  }
}

// Four cameras on a circle around the origin for every subject.
pub fn synthetic_cameras(subjects: &[u32]) -> Cameras {
  let mut cameras = Cameras::new();
  for &subject in subjects {
    for id in 1..=CAMERAS_PER_FRAME as u32 {
      let a = std::f64::consts::FRAC_PI_4 + std::f64::consts::FRAC_PI_2 * (id - 1) as f64;
      let center = Vector3d::new(5. * a.cos(), 5. * a.sin(), 1.5);
      cameras.insert(CameraKey::new(subject, id), look_at_camera(subject, id, center));
    }
  }
  cameras
}

// A 32 joint pose around a hip near (0, 0, 1), varying smoothly with `t`.
pub fn synthetic_pose(t: f64) -> Vectord {
  let hip = Vector3d::new(0.1 * t.sin(), 0.05 * t, 1.);
  let mut pose = Vectord::zeros(NUM_JOINTS * 3);
  for j in 0..NUM_JOINTS {
    let jf = j as f64;
    let offset = if j == HIP_JOINT {
      Vector3d::zeros()
    }
    else {
      Vector3d::new(0.3 * (jf + t).sin(), 0.3 * (1.3 * jf + t).cos(), 0.4 * (0.7 * jf).sin())
    };
    set_joint_3d(&mut pose, j, &(hip + offset));
  }
  pose
}

// Sequences as (subject, sequence id, frame count). The action is the part of
// the sequence id before the first space.
pub fn synthetic_raw_poses(sequences: &[(u32, &str, usize)]) -> RawPoses {
  let mut raw = RawPoses::new();
  for (k, &(subject, sequence_id, frames)) in sequences.iter().enumerate() {
    let key = PoseKey {
      subject,
      action: sequence_action(sequence_id).to_string(),
      sequence_id: sequence_id.to_string(),
    };
    let poses = (0..frames).map(|f| synthetic_pose(k as f64 + 0.1 * f as f64 + subject as f64)).collect();
    raw.insert(key, poses);
  }
  raw
}

pub fn gradient_image(width: usize, height: usize) -> Image {
  let mut image = Image::new(width, height);
  for y in 0..height {
    for x in 0..width {
      image.set_value(x, y, 0, x as f32 / width as f32);
      image.set_value(x, y, 1, y as f32 / height as f32);
      image.set_value(x, y, 2, ((x + y) % 3) as f32 / 2.);
    }
  }
  image
}

// Serves a gradient image for every path, counting the loads.
#[derive(Default)]
pub struct MemoryImageLoader {
  pub width: usize,
  pub height: usize,
  pub loads: Mutex<Vec<PathBuf>>,
}

impl MemoryImageLoader {
  pub fn new(width: usize, height: usize) -> MemoryImageLoader {
    MemoryImageLoader { width, height, loads: Mutex::new(vec![]) }
  }
}

impl ImageLoader for MemoryImageLoader {
  fn load(&self, path: &Path) -> Result<Image> {
    self.loads.lock().map_err(|_| anyhow!("poisoned"))?.push(path.to_path_buf());
    Ok(gradient_image(self.width, self.height))
  }
}

pub fn pose_loader(sequences: &[(u32, &str, usize)]) -> MemoryPoseLoader {
  MemoryPoseLoader::new(synthetic_raw_poses(sequences))
}

pub struct MemoryCameraLoader {
  pub cameras: Cameras,
}

impl CameraLoader for MemoryCameraLoader {
  fn load(&self, subjects: &[u32]) -> Result<Cameras> {
    Ok(self.cameras.iter()
      .filter(|(k, _)| subjects.contains(&k.subject))
      .map(|(k, c)| (*k, c.clone()))
      .collect())
  }
}

pub fn camera_loader(subjects: &[u32]) -> MemoryCameraLoader {
  MemoryCameraLoader { cameras: synthetic_cameras(subjects) }
}
