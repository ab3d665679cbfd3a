// NOTE This kind of import-all file isn't a common Rust idiom.

pub use crate::{
  augment::*,
  camera::*,
  camera_pinhole::*,
  camera_setup::*,
  dataset::*,
  error::*,
  heatmap::*,
  image::*,
  math::*,
  normalization::*,
  parameters::*,
  pose_store::*,
  skeleton::*,
  stats_cache::*,
  types::*,
  util::*,
  video::*,
};

pub use {
  std::{
    collections::{BTreeMap, HashMap},
    fs::File,
    io::{BufReader, Read, Write},
    path::{Path, PathBuf},
    sync::Mutex,
  },
  log::{debug, error, info, warn, LevelFilter},
  nalgebra::{dvector, DVector},
  rand::{Rng, SeedableRng},
  serde::{Deserialize, Serialize},
  anyhow::{anyhow, bail, Context as AnyhowContext, Result},
};
