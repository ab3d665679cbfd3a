use crate::all::*;

pub const ALL_ACTIONS: [&str; 15] = [
  "Directions", "Discussion", "Eating", "Greeting",
  "Phoning", "Photo", "Posing", "Purchases",
  "Sitting", "SittingDown", "Smoking", "Waiting",
  "WalkDog", "Walking", "WalkTogether",
];

#[derive(Clone, Debug)]
#[derive(clap::Parser)]
pub struct DatasetParameters {
  // Sources.
  #[clap(long, default_value = "data/h36m")]
  pub dataset_dir: PathBuf,
  #[clap(long, default_value = "data/h36m/cameras.json")]
  pub camera_file: PathBuf,
  #[clap(long, default_value = "data/h36m/frames")]
  pub image_dir: PathBuf,
  #[clap(long, default_value = ".cache")]
  pub cache_dir: PathBuf,

  // Split.
  #[clap(long, use_value_delimiter = true, default_value = "1,5,6,7,8")]
  pub train_subjects: Vec<u32>,
  #[clap(long, use_value_delimiter = true, default_value = "9,11")]
  pub held_out_subjects: Vec<u32>,
  #[clap(long, use_value_delimiter = true, default_value = "all")]
  pub actions: Vec<String>,
  // Serve the held-out subjects instead of the training subjects.
  #[clap(long)]
  pub eval: bool,

  // Augmentation.
  #[clap(long, default_value = "0")]
  pub augmentation_prob: f64,
  #[clap(long)]
  pub z_rotations_only: bool,
  #[clap(long, default_value = "0.5")]
  pub flip_prob: f64,
  #[clap(long, default_value = "0")]
  pub drop_joint_prob: f64,

  // Normalization.
  #[clap(long)]
  pub dataset_normalization: bool,

  // Stacked hourglass inputs.
  #[clap(long)]
  pub load_images: bool,
  #[clap(long, default_value = "256")]
  pub hg_in_res: usize,
  #[clap(long, default_value = "64")]
  pub hg_out_res: usize,
  #[clap(long, default_value = "1")]
  pub heatmap_sigma: f64,
}

impl Default for DatasetParameters {
  fn default() -> DatasetParameters {
    clap::Parser::parse_from(["posekit"])
  }
}

impl DatasetParameters {
  pub fn is_train(&self) -> bool {
    !self.eval
  }

  pub fn active_subjects(&self) -> &[u32] {
    if self.is_train() { &self.train_subjects } else { &self.held_out_subjects }
  }

  // Every subject whose cameras are needed. Statistics always come from the
  // training subjects, even for an evaluation dataset.
  pub fn all_subjects(&self) -> Vec<u32> {
    let mut subjects = self.train_subjects.clone();
    for s in &self.held_out_subjects {
      if !subjects.contains(s) { subjects.push(*s) }
    }
    subjects
  }

  // "all" selects every action.
  pub fn resolved_actions(&self) -> Vec<String> {
    if self.actions.iter().any(|a| a.eq_ignore_ascii_case("all")) {
      ALL_ACTIONS.iter().map(|a| a.to_string()).collect()
    }
    else {
      self.actions.clone()
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.load_images && self.augmentation_prob > 0. {
      return Err(configuration_error(
        "Orthogonal augmentation cannot be combined with image loading, set the augmentation probability to zero."));
    }
    for (name, p) in [
      ("augmentation_prob", self.augmentation_prob),
      ("flip_prob", self.flip_prob),
      ("drop_joint_prob", self.drop_joint_prob),
    ] {
      if !(0. ..=1.).contains(&p) {
        return Err(configuration_error(format!("{} must be in [0, 1], got {}.", name, p)));
      }
    }
    if self.train_subjects.is_empty() {
      return Err(configuration_error("No training subjects."));
    }
    if self.active_subjects().is_empty() {
      return Err(configuration_error("No subjects for the selected split."));
    }
    if self.actions.is_empty() {
      return Err(configuration_error("No actions."));
    }
    if self.hg_in_res == 0 || self.hg_out_res == 0 {
      return Err(configuration_error("Hourglass resolutions must be positive."));
    }
    if !(self.heatmap_sigma > 0.) {
      return Err(configuration_error("Heatmap sigma must be positive."));
    }
    Ok(())
  }
}
