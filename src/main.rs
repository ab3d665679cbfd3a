use posekit::all::*;

use clap::Parser;
use rand_xoshiro::Xoshiro256PlusPlus;

#[derive(Parser)]
struct Args {
  #[clap(flatten)]
  dataset: DatasetParameters,
  #[clap(long, default_value = "0")]
  seed: u64,
  // How many random samples to print as JSON lines.
  #[clap(long, default_value = "4")]
  samples: usize,
}

fn handle_error(err: &anyhow::Error) {
  for (i, e) in err.chain().enumerate() {
    println!("  {}: {}", i + 1, e);
  }
}

fn main() {
  env_logger::Builder::new()
    .filter_level(LevelFilter::Info)
    .parse_default_env()
    .format(format_log)
    .init();

  if let Err(err) = run() {
    handle_error(&err);
    std::process::exit(1);
  }
}

fn run() -> Result<()> {
  let args = Args::parse();
  let params = args.dataset;

  let pose_loader = JsonPoseLoader::new(&params.dataset_dir);
  let camera_loader = JsonCameraLoader::new(&params.camera_file);
  let cache = FileStatsCache::new(&params.cache_dir);
  let image_loader: Option<Box<dyn ImageLoader + Send + Sync>> = if params.load_images {
    Some(Box::new(FileImageLoader))
  }
  else {
    None
  };
  let dataset = PoseDataset::new(params, &pose_loader, &camera_loader, &cache, image_loader)?;

  let stats = dataset.pose_stats();
  let params = dataset.parameters();
  info!("{} split, {} samples, {} videos.",
    if params.is_train() { "Training" } else { "Held-out" }, dataset.len(), dataset.video_count());
  info!("Statistics over {} training poses, {} normalization.",
    dataset.train_store().len(), if params.dataset_normalization { "dataset" } else { "instance" });
  debug!("2D mean {:?}", stats.pose_2d.mean.as_slice());
  debug!("3D mean {:?}", stats.pose_3d.mean.as_slice());
  if let Some(color) = dataset.color_stats() {
    info!("Color mean {:?}, std {:?}.", color.mean, color.std);
  }
  if dataset.is_empty() {
    warn!("Empty dataset, nothing to sample.");
    return Ok(());
  }

  let mut rng = Xoshiro256PlusPlus::seed_from_u64(args.seed);
  let stdout = std::io::stdout();
  let mut out = stdout.lock();
  for _ in 0..args.samples {
    let index = rng.gen_range(0..dataset.len());
    let sample = dataset.get_sample(index, &mut rng)
      .context(format!("Failed to load sample {}.", index))?;
    writeln!(out, "{}", serde_json::to_string(&sample)?)?;
  }
  Ok(())
}
