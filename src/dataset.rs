// Multi-view pose dataset producing (image, heatmaps, 2D pose, 3D pose, meta)
// training tuples.
//
// Poses are stored once in world coordinates. Each one is seen by the four
// calibrated cameras of its subject, so the dataset index space is
// `4 * pose + camera offset`. Everything else is derived per sample.

use crate::all::*;

#[derive(Clone, Debug, Serialize)]
pub struct ImageMeta {
  pub path: PathBuf,
  pub crop: SquareCrop,
  // Used 2D joints in source image pixels.
  pub pose_2d_image: Vectord,
  // The same joints in heatmap coordinates.
  pub pose_2d_heatmap: Vectord,
}

#[derive(Clone, Debug, Serialize)]
pub struct SampleMeta {
  pub index: usize,
  // Index into the active pose store.
  pub frame: usize,
  pub camera: CameraKey,
  pub camera_name: String,
  pub q: Matrix3d,
  // Indexed by raw joint, `false` means the joint was zeroed in the 2D input.
  pub joint_mask: Vec<bool>,
  // Augmented 3D pose in camera coordinates, used dimensions, not normalized.
  pub pose_3d_camera: Vectord,
  pub used_2d: Vec<usize>,
  pub ignored_2d: Vec<usize>,
  pub used_3d: Vec<usize>,
  pub ignored_3d: Vec<usize>,
  pub image: Option<ImageMeta>,
  pub normalization: NormalizationMeta,
}

#[derive(Clone, Debug, Serialize)]
pub struct Sample {
  // Color normalized `hg_in_res` square crop, channel-major `[channel][y][x]`.
  #[serde(skip)]
  pub image: Option<Vec<f32>>,
  #[serde(skip)]
  pub heatmaps: Option<Heatmaps>,
  // Normalized used 2D dimensions with dropped joints zeroed, lifting input.
  pub pose_2d: Vectord,
  // Normalized used 3D dimensions in camera coordinates, lifting target.
  pub pose_3d: Vectord,
  pub meta: SampleMeta,
}

struct ImagePipeline {
  loader: Box<dyn ImageLoader + Send + Sync>,
  color_stats: ColorStats,
}

pub struct PoseDataset {
  params: DatasetParameters,
  train: PoseStore,
  held_out: PoseStore,
  cameras: Cameras,
  videos: VideoIndex,
  selector_2d: DimensionSelector,
  selector_3d: DimensionSelector,
  augmentation: OrthogonalAugmentation,
  normalizer: PoseNormalizer,
  images: Option<ImagePipeline>,
}

impl PoseDataset {
  // Loads poses and cameras and computes (or reloads) the statistics. Slow on
  // a cache miss, every training pose is visited.
  pub fn new(
    params: DatasetParameters,
    pose_loader: &dyn PoseLoader,
    camera_loader: &dyn CameraLoader,
    cache: &dyn StatsCache,
    image_loader: Option<Box<dyn ImageLoader + Send + Sync>>,
  ) -> Result<PoseDataset> {
    params.validate()?;
    if params.load_images && image_loader.is_none() {
      return Err(configuration_error("Image loading is enabled but no image loader was given."));
    }
    let actions = params.resolved_actions();

    let train = PoseStore::load(pose_loader, &params.train_subjects, &actions)
      .context("Failed to load training poses.")?;
    let held_out = PoseStore::load(pose_loader, &params.held_out_subjects, &actions)
      .context("Failed to load held-out poses.")?;
    let cameras = camera_loader.load(&params.all_subjects())
      .context("Failed to load cameras.")?;
    for subject in train.subjects().into_iter().chain(held_out.subjects()) {
      subject_cameras(&cameras, subject)?;
    }

    let selector_2d = SELECTOR_2D.clone();
    let selector_3d = SELECTOR_3D.clone();
    let videos = VideoIndex::new(if params.is_train() { &train } else { &held_out });

    info!("About to compute normalization stats.");
    let key = pose_stats_key(&train, &cameras, &params.train_subjects, &actions, &selector_2d, &selector_3d);
    let stats = match load_cached::<PoseStats>(cache, &key) {
      Some(stats) if stats.pose_2d.mean.len() == selector_2d.used_len()
        && stats.pose_3d.mean.len() == selector_3d.used_len() => stats.with_std_floor(),
      _ => {
        let stats = compute_pose_stats(&train, &cameras, &selector_2d, &selector_3d)?;
        if let Err(err) = store_cached(cache, &key, &stats) {
          warn!("Failed to cache pose statistics: {:#}", err);
        }
        stats
      },
    };
    let mode = if params.dataset_normalization { NormalizationMode::Dataset } else { NormalizationMode::Instance };
    let normalizer = PoseNormalizer::new(mode, stats, &selector_2d, &selector_3d)?;

    let images = match image_loader {
      Some(loader) if params.load_images => {
        let key = color_stats_key(&train, &cameras, &params.train_subjects, &actions, &params.image_dir);
        let color_stats = match load_cached::<ColorStats>(cache, &key) {
          Some(stats) => stats.with_std_floor(),
          None => {
            let stats = compute_color_stats(&params.image_dir, &train, &cameras, loader.as_ref())?;
            if let Err(err) = store_cached(cache, &key, &stats) {
              warn!("Failed to cache color statistics: {:#}", err);
            }
            stats
          },
        };
        Some(ImagePipeline { loader, color_stats })
      },
      _ => None,
    };
    info!("Computed normalization stats.");

    let dataset = PoseDataset {
      augmentation: OrthogonalAugmentation::new(&params),
      params,
      train,
      held_out,
      cameras,
      videos,
      selector_2d,
      selector_3d,
      normalizer,
      images,
    };
    info!("Dataset with {} samples in {} videos.", dataset.len(), dataset.video_count());
    Ok(dataset)
  }

  pub fn parameters(&self) -> &DatasetParameters {
    &self.params
  }

  // The store samples are drawn from, fixed by the train/eval flag.
  pub fn pose_store(&self) -> &PoseStore {
    if self.params.is_train() { &self.train } else { &self.held_out }
  }

  pub fn train_store(&self) -> &PoseStore {
    &self.train
  }

  pub fn len(&self) -> usize {
    CAMERAS_PER_FRAME * self.pose_store().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn video_count(&self) -> usize {
    self.videos.len()
  }

  pub fn video_frames(&self, video: usize) -> Result<&[usize]> {
    self.videos.frames(video)
  }

  pub fn pose_stats(&self) -> &PoseStats {
    &self.normalizer.stats
  }

  pub fn color_stats(&self) -> Option<&ColorStats> {
    self.images.as_ref().map(|p| &p.color_stats)
  }

  pub fn selector_2d(&self) -> &DimensionSelector {
    &self.selector_2d
  }

  pub fn selector_3d(&self) -> &DimensionSelector {
    &self.selector_3d
  }

  // (pose index, camera offset) of a dataset index.
  pub fn decode_index(&self, index: usize) -> Result<(usize, usize)> {
    if index >= self.len() {
      return Err(DatasetError::IndexOutOfRange { index, len: self.len() }.into());
    }
    Ok((index / CAMERAS_PER_FRAME, index % CAMERAS_PER_FRAME))
  }

  pub fn camera_for(&self, index: usize) -> Result<&Camera> {
    let (frame, offset) = self.decode_index(index)?;
    let subject = self.pose_store().meta(frame).subject;
    Ok(subject_cameras(&self.cameras, subject)?[offset])
  }

  // Every active pose in the camera coordinates of each of its cameras,
  // ordered like the dataset indices.
  pub fn world_to_camera_poses(&self) -> Result<Vec<Vectord>> {
    (0..self.len())
      .map(|i| -> Result<Vectord> {
        Ok(self.camera_for(i)?.world_to_camera_pose(self.pose_store().pose(i / CAMERAS_PER_FRAME)))
      })
      .collect()
  }

  // Every active pose projected to each of its cameras, ordered like the
  // dataset indices.
  pub fn project_poses(&self) -> Result<Vec<Vectord>> {
    (0..self.len())
      .map(|i| -> Result<Vectord> {
        Ok(self.camera_for(i)?.project_world_pose(self.pose_store().pose(i / CAMERAS_PER_FRAME)))
      })
      .collect()
  }

  // Does not mutate the dataset, so workers may share it as long as each has
  // its own `rng`, see `worker_rngs()`.
  pub fn get_sample<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Result<Sample> {
    let (frame, _) = self.decode_index(index)?;
    let store = self.pose_store();
    let meta = store.meta(frame);
    let camera = self.camera_for(index)?;

    let q = self.augmentation.sample(rng);
    let augmented = apply_orthogonal_transform(store.pose(frame), &q);

    // The 2D input and the 3D target see the same augmented pose from the same camera.
    let pose_camera = camera.world_to_camera_pose(&augmented);
    let pose_2d = self.selector_2d.subsample(&camera.project_pose(&pose_camera));
    let pose_3d = self.selector_3d.subsample(&pose_camera);

    let (mut normalized_2d, normalized_3d, normalization) = self.normalizer.normalize(&pose_2d, &pose_3d);

    let joint_mask = joint_keep_mask(rng, self.params.drop_joint_prob);
    apply_joint_mask(&mut normalized_2d, &self.selector_2d, &joint_mask);

    let (image, heatmaps, image_meta) = match &self.images {
      Some(pipeline) => {
        let (image, heatmaps, image_meta) = self.image_sample(pipeline, meta, camera, &pose_2d)?;
        (Some(image), Some(heatmaps), Some(image_meta))
      },
      None => (None, None, None),
    };

    Ok(Sample {
      image,
      heatmaps,
      pose_2d: normalized_2d,
      pose_3d: normalized_3d,
      meta: SampleMeta {
        index,
        frame,
        camera: camera.key,
        camera_name: camera.name.clone(),
        q,
        joint_mask,
        pose_3d_camera: pose_3d,
        used_2d: self.selector_2d.used.clone(),
        ignored_2d: self.selector_2d.ignored.clone(),
        used_3d: self.selector_3d.used.clone(),
        ignored_3d: self.selector_3d.ignored.clone(),
        image: image_meta,
        normalization,
      },
    })
  }

  fn image_sample(
    &self,
    pipeline: &ImagePipeline,
    meta: &PoseMeta,
    camera: &Camera,
    pose_2d: &Vectord,
  ) -> Result<(Vec<f32>, Heatmaps, ImageMeta)> {
    let path = image_path(&self.params.image_dir, meta, camera);
    let raw = pipeline.loader.load(&path)?;
    let crop = SquareCrop::covering(raw.width, raw.height);
    let mut image = raw.crop_resized(&crop, self.params.hg_in_res);
    image.normalize_color(&pipeline.color_stats);

    let out_res = self.params.hg_out_res;
    let mut pose_2d_heatmap = Vectord::zeros(pose_2d.len());
    for j in 0..joint_count(pose_2d, 2) {
      let p = crop.map_point(&Vector2d::new(pose_2d[2 * j], pose_2d[2 * j + 1]), out_res);
      pose_2d_heatmap.fixed_slice_mut::<2, 1>(2 * j, 0).copy_from(&p);
    }
    let heatmaps = render_heatmaps(&pose_2d_heatmap, out_res, self.params.heatmap_sigma);
    Ok((image.to_planar(), heatmaps, ImageMeta {
      path,
      crop,
      pose_2d_image: pose_2d.clone(),
      pose_2d_heatmap,
    }))
  }
}

// `<image_dir>/S<subject>/<sequence>/<camera name>/<frame index>.jpg`
pub fn image_path(image_dir: &Path, meta: &PoseMeta, camera: &Camera) -> PathBuf {
  image_dir
    .join(format!("S{}", meta.subject))
    .join(&meta.sequence_id)
    .join(&camera.name)
    .join(format!("{}.jpg", meta.frame_index))
}

// Per-channel color statistics over every view of every training pose.
pub fn compute_color_stats(
  image_dir: &Path,
  train: &PoseStore,
  cameras: &Cameras,
  loader: &dyn ImageLoader,
) -> Result<ColorStats> {
  let mut stats = RunningColorStats::new();
  let mut progress = Progress::new("color statistics", CAMERAS_PER_FRAME * train.len(), 100);
  for meta in train.metas() {
    for camera in subject_cameras(cameras, meta.subject)? {
      stats.push_image(&loader.load(&image_path(image_dir, meta, camera))?);
      progress.step();
    }
  }
  stats.finish()
}
