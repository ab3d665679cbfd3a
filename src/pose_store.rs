use crate::all::*;

// Identifies one recorded sequence, eg. subject 1 performing "Directions 1".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoseKey {
  pub subject: u32,
  pub action: String,
  pub sequence_id: String,
}

// Raw 3D world coordinate poses grouped by sequence, frames in recording order.
pub type RawPoses = BTreeMap<PoseKey, Vec<Vectord>>;

// Source of raw 3D poses for the requested subjects and actions.
pub trait PoseLoader {
  fn load(&self, subjects: &[u32], actions: &[String]) -> Result<RawPoses>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseMeta {
  pub subject: u32,
  pub action: String,
  pub sequence_id: String,
  // Position of the frame within its own sequence.
  pub frame_index: usize,
}

// Flat list of world coordinate poses with one `PoseMeta` per pose.
#[derive(Clone, Debug, Default)]
pub struct PoseStore {
  poses: Vec<Vectord>,
  meta: Vec<PoseMeta>,
}

impl PoseStore {
  // Appends every frame of every sequence. The grouped map iterates in key
  // order, so the result only depends on the loader output.
  pub fn flatten(raw: RawPoses) -> Result<PoseStore> {
    let total = raw.values().map(|frames| frames.len()).sum();
    let mut poses = Vec::with_capacity(total);
    let mut meta = Vec::with_capacity(total);
    for (key, frames) in raw {
      for (frame_index, pose) in frames.into_iter().enumerate() {
        if pose.len() != NUM_JOINTS * 3 {
          return Err(configuration_error(format!(
            "Pose {} of subject {} sequence {:?} has {} values, expected {}.",
            frame_index, key.subject, key.sequence_id, pose.len(), NUM_JOINTS * 3)));
        }
        poses.push(pose);
        meta.push(PoseMeta {
          subject: key.subject,
          action: key.action.clone(),
          sequence_id: key.sequence_id.clone(),
          frame_index,
        });
      }
    }
    Ok(PoseStore { poses, meta })
  }

  pub fn load(loader: &dyn PoseLoader, subjects: &[u32], actions: &[String]) -> Result<PoseStore> {
    let raw = loader.load(subjects, actions)?;
    let store = PoseStore::flatten(raw)?;
    info!("Loaded {} poses for subjects {:?}.", store.len(), subjects);
    Ok(store)
  }

  pub fn len(&self) -> usize {
    self.poses.len()
  }

  pub fn is_empty(&self) -> bool {
    self.poses.is_empty()
  }

  pub fn pose(&self, i: usize) -> &Vectord {
    &self.poses[i]
  }

  pub fn meta(&self, i: usize) -> &PoseMeta {
    &self.meta[i]
  }

  pub fn poses(&self) -> &[Vectord] {
    &self.poses
  }

  pub fn metas(&self) -> &[PoseMeta] {
    &self.meta
  }

  pub fn subjects(&self) -> Vec<u32> {
    let mut subjects: Vec<u32> = self.meta.iter().map(|m| m.subject).collect();
    subjects.sort();
    subjects.dedup();
    subjects
  }
}

// Reads `<root>/S<subject>/<sequence>.json`, each file an array of frames with
// `NUM_JOINTS * 3` numbers per frame. The action is the file stem up to the
// first space, so "SittingDown 1.json" belongs to "SittingDown".
pub struct JsonPoseLoader {
  root: PathBuf,
}

impl JsonPoseLoader {
  pub fn new(root: &Path) -> JsonPoseLoader {
    JsonPoseLoader { root: root.to_path_buf() }
  }
}

pub fn sequence_action(sequence_id: &str) -> &str {
  sequence_id.split(' ').next().unwrap_or(sequence_id)
}

impl PoseLoader for JsonPoseLoader {
  fn load(&self, subjects: &[u32], actions: &[String]) -> Result<RawPoses> {
    let mut raw = RawPoses::new();
    for &subject in subjects {
      let dir = self.root.join(format!("S{}", subject));
      let entries = std::fs::read_dir(&dir)
        .context(format!("Failed to list directory {}.", dir.display()))?;
      for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") { continue }
        let sequence_id = match path.file_stem().and_then(|s| s.to_str()) {
          Some(s) => s.to_string(),
          None => continue,
        };
        let action = sequence_action(&sequence_id).to_string();
        if !actions.contains(&action) { continue }
        let file = File::open(&path)
          .context(format!("Failed to open {}.", path.display()))?;
        let frames: Vec<Vec<f64>> = serde_json::from_reader(BufReader::new(file))
          .context(format!("Failed to parse {}.", path.display()))?;
        debug!("{}: {} frames", path.display(), frames.len());
        raw.insert(
          PoseKey { subject, action, sequence_id },
          frames.into_iter().map(Vectord::from_vec).collect(),
        );
      }
    }
    Ok(raw)
  }
}

// Loader over poses already in memory.
pub struct MemoryPoseLoader {
  raw: RawPoses,
}

impl MemoryPoseLoader {
  pub fn new(raw: RawPoses) -> MemoryPoseLoader {
    MemoryPoseLoader { raw }
  }
}

impl PoseLoader for MemoryPoseLoader {
  fn load(&self, subjects: &[u32], actions: &[String]) -> Result<RawPoses> {
    Ok(self.raw.iter()
      .filter(|(key, _)| subjects.contains(&key.subject) && actions.contains(&key.action))
      .map(|(key, frames)| (key.clone(), frames.clone()))
      .collect())
  }
}
