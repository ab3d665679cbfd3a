use crate::all::*;

// Raw Human3.6M skeleton. Unnamed joints never move.
pub const NUM_JOINTS: usize = 32;
pub const HIP_JOINT: usize = 0;

pub const JOINT_NAMES: [&str; NUM_JOINTS] = [
  "Hip", "RHip", "RKnee", "RFoot", "", "", "LHip", "LKnee",
  "LFoot", "", "", "", "Spine", "Thorax", "Neck/Nose", "Head",
  "", "LShoulder", "LElbow", "LWrist", "", "", "", "",
  "", "RShoulder", "RElbow", "RWrist", "", "", "", "",
];

// 2D poses skip the nose, it is unreliable in image space.
const IGNORED_2D_JOINTS: [&str; 1] = ["Neck/Nose"];

lazy_static! {
  pub static ref SELECTOR_2D: DimensionSelector = DimensionSelector::for_moving_joints(2, &IGNORED_2D_JOINTS);
  pub static ref SELECTOR_3D: DimensionSelector = DimensionSelector::for_moving_joints(3, &[]);
}

// Split of a flat `NUM_JOINTS * dim` pose vector into the coordinates fed to
// the models and the ones that are dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionSelector {
  pub dim: usize,
  pub used_joints: Vec<usize>,
  pub used: Vec<usize>,
  pub ignored: Vec<usize>,
}

impl DimensionSelector {
  pub fn new(dim: usize, used_joints: Vec<usize>) -> DimensionSelector {
    let used: Vec<usize> = used_joints.iter()
      .flat_map(|j| (0..dim).map(move |d| j * dim + d))
      .collect();
    let ignored = (0..NUM_JOINTS * dim)
      .filter(|i| !used.contains(i))
      .collect();
    DimensionSelector { dim, used_joints, used, ignored }
  }

  fn for_moving_joints(dim: usize, skip: &[&str]) -> DimensionSelector {
    let used_joints = JOINT_NAMES.iter().enumerate()
      .filter(|(_, name)| !name.is_empty() && !skip.contains(*name))
      .map(|(j, _)| j)
      .collect();
    DimensionSelector::new(dim, used_joints)
  }

  pub fn full_len(&self) -> usize {
    NUM_JOINTS * self.dim
  }

  pub fn used_len(&self) -> usize {
    self.used.len()
  }

  pub fn subsample(&self, pose: &Vectord) -> Vectord {
    assert_eq!(pose.len(), self.full_len());
    Vectord::from_iterator(self.used.len(), self.used.iter().map(|&i| pose[i]))
  }

  // Inverse of `subsample`, the ignored coordinates are zero.
  #[cfg(test)]
  pub fn expand(&self, reduced: &Vectord) -> Vectord {
    assert_eq!(reduced.len(), self.used.len());
    let mut pose = Vectord::zeros(self.full_len());
    for (k, &i) in self.used.iter().enumerate() {
      pose[i] = reduced[k];
    }
    pose
  }

  // Position of the hip joint among the used joints.
  pub fn hip_slot(&self) -> Option<usize> {
    self.used_joints.iter().position(|&j| j == HIP_JOINT)
  }
}
