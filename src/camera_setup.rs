use crate::all::*;

// Source of calibrated cameras for a set of subjects.
pub trait CameraLoader {
  fn load(&self, subjects: &[u32]) -> Result<Cameras>;
}

#[derive(Deserialize)]
#[allow(non_snake_case)]
pub struct CameraSetup {
  pub subject: u32,
  pub id: u32,
  pub name: String,
  pub rotation: Vec<Vec<f64>>,
  pub translation: Vec<f64>,
  pub focalLength: Vec<f64>,
  pub principalPoint: Vec<f64>,
  pub radialDistortion: Vec<f64>,
  pub tangentialDistortion: Vec<f64>,
}

#[derive(Deserialize)]
pub struct CameraSetupRoot {
  pub cameras: Vec<CameraSetup>,
}

// Reads every camera from a single JSON calibration file.
pub struct JsonCameraLoader {
  path: PathBuf,
}

impl JsonCameraLoader {
  pub fn new(path: &Path) -> JsonCameraLoader {
    JsonCameraLoader { path: path.to_path_buf() }
  }
}

impl CameraLoader for JsonCameraLoader {
  fn load(&self, subjects: &[u32]) -> Result<Cameras> {
    let s = std::fs::read_to_string(&self.path)
      .context(format!("Failed to read file {}.", self.path.display()))?;
    let cameras = parse_setup(&s)
      .context(format!("Failed to parse {}.", self.path.display()))?;
    let cameras: Cameras = cameras.into_iter()
      .filter(|(key, _)| subjects.contains(&key.subject))
      .collect();
    info!("Loaded {} cameras for subjects {:?}.", cameras.len(), subjects);
    Ok(cameras)
  }
}

pub fn parse_setup(s: &str) -> Result<Cameras> {
  let root: CameraSetupRoot = serde_json::from_str(s)?;
  let mut cameras = Cameras::new();
  for setup in root.cameras {
    let camera = convert_setup(setup)?;
    if cameras.insert(camera.key, camera.clone()).is_some() {
      return Err(configuration_error(format!(
        "Duplicate camera {} for subject {}.", camera.key.id, camera.key.subject)));
    }
  }
  Ok(cameras)
}

fn fixed<const N: usize>(values: &[f64], what: &str, key: CameraKey) -> Result<[f64; N]> {
  values.try_into().map_err(|_| configuration_error(format!(
    "Camera {} of subject {}: expected {} values for {}, got {}.",
    key.id, key.subject, N, what, values.len())))
}

fn convert_setup(d: CameraSetup) -> Result<Camera> {
  let key = CameraKey::new(d.subject, d.id);
  if d.id < 1 || d.id as usize > CAMERAS_PER_FRAME {
    return Err(configuration_error(format!(
      "Camera id {} of subject {} is outside 1..={}.", d.id, d.subject, CAMERAS_PER_FRAME)));
  }
  if d.rotation.len() != 3 {
    return Err(configuration_error(format!(
      "Camera {} of subject {}: rotation must have 3 rows.", d.id, d.subject)));
  }
  let mut rotation = Matrix3d::zeros();
  for (i, row) in d.rotation.iter().enumerate() {
    let row = fixed::<3>(row, "a rotation row", key)?;
    for (j, v) in row.iter().enumerate() {
      rotation[(i, j)] = *v;
    }
  }
  let t = fixed::<3>(&d.translation, "translation", key)?;
  let f = fixed::<2>(&d.focalLength, "focal length", key)?;
  let c = fixed::<2>(&d.principalPoint, "principal point", key)?;
  let k = fixed::<3>(&d.radialDistortion, "radial distortion", key)?;
  let p = fixed::<2>(&d.tangentialDistortion, "tangential distortion", key)?;
  Ok(Camera {
    key,
    name: d.name,
    rotation,
    translation: Vector3d::from(t),
    model: PinholeModel {
      focal_length: Vector2d::from(f),
      principal_point: Vector2d::from(c),
      radial: Vector3d::from(k),
      tangential: Vector2d::from(p),
    },
  })
}
