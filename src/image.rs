use crate::all::*;

pub const CHANNELS: usize = 3;

// Row-major interleaved RGB storage, values in [0, 1] until color normalized.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
  pub data: Vec<f32>,
  pub width: usize,
  pub height: usize,
}

impl Image {
  pub fn new(width: usize, height: usize) -> Image {
    Image {
      data: vec![0.; width * height * CHANNELS],
      width,
      height,
    }
  }

  pub fn from_rgb8(rgb: &::image::RgbImage) -> Image {
    Image {
      data: rgb.as_raw().iter().map(|&v| v as f32 / 255.).collect(),
      width: rgb.width() as usize,
      height: rgb.height() as usize,
    }
  }

  pub fn pixel_count(&self) -> usize {
    self.width * self.height
  }

  #[inline(always)]
  pub fn value(&self, x: usize, y: usize, c: usize) -> f32 {
    self.data[(y * self.width + x) * CHANNELS + c]
  }

  #[inline(always)]
  pub fn set_value(&mut self, x: usize, y: usize, c: usize, value: f32) {
    self.data[(y * self.width + x) * CHANNELS + c] = value;
  }

  // Zero outside the image.
  fn value_or_zero(&self, x: i64, y: i64, c: usize) -> f32 {
    if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 { return 0. }
    self.value(x as usize, y as usize, c)
  }

  pub fn bilinear(&self, x: f64, y: f64, c: usize) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let ax = (x - x0) as f32;
    let ay = (y - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);
    let top = (1. - ax) * self.value_or_zero(x0, y0, c) + ax * self.value_or_zero(x0 + 1, y0, c);
    let bottom = (1. - ax) * self.value_or_zero(x0, y0 + 1, c) + ax * self.value_or_zero(x0 + 1, y0 + 1, c);
    (1. - ay) * top + ay * bottom
  }

  // Resamples `crop` into a `resolution` x `resolution` image.
  pub fn crop_resized(&self, crop: &SquareCrop, resolution: usize) -> Image {
    let mut out = Image::new(resolution, resolution);
    let step = crop.side / resolution as f64;
    let origin = crop.origin();
    for v in 0..resolution {
      for u in 0..resolution {
        // Pixel centers map to pixel centers.
        let x = origin[0] + (u as f64 + 0.5) * step - 0.5;
        let y = origin[1] + (v as f64 + 0.5) * step - 0.5;
        for c in 0..CHANNELS {
          out.set_value(u, v, c, self.bilinear(x, y, c));
        }
      }
    }
    out
  }

  pub fn normalize_color(&mut self, stats: &ColorStats) {
    for (i, v) in self.data.iter_mut().enumerate() {
      let c = i % CHANNELS;
      *v = ((*v as f64 - stats.mean[c]) / stats.std[c]) as f32;
    }
  }

  // Channel-major copy, the layout the hourglass network consumes.
  pub fn to_planar(&self) -> Vec<f32> {
    let n = self.pixel_count();
    let mut out = vec![0.; n * CHANNELS];
    for (i, v) in self.data.iter().enumerate() {
      out[(i % CHANNELS) * n + i / CHANNELS] = *v;
    }
    out
  }
}

// Square region of an image, `center` and `side` in source pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SquareCrop {
  pub center: Vector2d,
  pub side: f64,
}

impl SquareCrop {
  // The smallest centered square containing the whole image.
  pub fn covering(width: usize, height: usize) -> SquareCrop {
    SquareCrop {
      center: Vector2d::new(width as f64 / 2., height as f64 / 2.),
      side: width.max(height) as f64,
    }
  }

  pub fn origin(&self) -> Vector2d {
    self.center - Vector2d::new(self.side / 2., self.side / 2.)
  }

  // Source pixel coordinates to coordinates in the crop resized to
  // `resolution`, with pixel centers at integer coordinates like `crop_resized`.
  pub fn map_point(&self, p: &Vector2d, resolution: usize) -> Vector2d {
    let half = Vector2d::new(0.5, 0.5);
    (p + half - self.origin()) * (resolution as f64 / self.side) - half
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorStats {
  pub mean: [f64; CHANNELS],
  pub std: [f64; CHANNELS],
}

impl ColorStats {
  pub fn with_std_floor(self) -> ColorStats {
    ColorStats { mean: self.mean, std: self.std.map(|s| s.max(STD_EPSILON)) }
  }
}

// Per-channel mean and variance merged image by image (Chan et al.), stable
// over the billions of pixels of the full dataset.
#[derive(Default)]
pub struct RunningColorStats {
  n: f64,
  mean: [f64; CHANNELS],
  m2: [f64; CHANNELS],
}

impl RunningColorStats {
  pub fn new() -> RunningColorStats {
    RunningColorStats::default()
  }

  pub fn push_image(&mut self, image: &Image) {
    let nb = image.pixel_count() as f64;
    if nb == 0. { return }
    let mut mean_b = [0.; CHANNELS];
    for (i, v) in image.data.iter().enumerate() {
      mean_b[i % CHANNELS] += *v as f64;
    }
    for m in mean_b.iter_mut() { *m /= nb }
    let mut m2_b = [0.; CHANNELS];
    for (i, v) in image.data.iter().enumerate() {
      let d = *v as f64 - mean_b[i % CHANNELS];
      m2_b[i % CHANNELS] += d * d;
    }

    let n = self.n + nb;
    for c in 0..CHANNELS {
      let delta = mean_b[c] - self.mean[c];
      self.mean[c] += delta * nb / n;
      self.m2[c] += m2_b[c] + delta * delta * self.n * nb / n;
    }
    self.n = n;
  }

  pub fn finish(&self) -> Result<ColorStats> {
    if self.n == 0. {
      bail!("Cannot compute color statistics without images.");
    }
    let mut std = [0.; CHANNELS];
    for c in 0..CHANNELS {
      std[c] = (self.m2[c] / self.n).sqrt().max(STD_EPSILON);
    }
    Ok(ColorStats { mean: self.mean, std })
  }
}

// Source of decoded RGB frames.
pub trait ImageLoader {
  fn load(&self, path: &Path) -> Result<Image>;
}

pub struct FileImageLoader;

impl ImageLoader for FileImageLoader {
  fn load(&self, path: &Path) -> Result<Image> {
    if !path.is_file() {
      return Err(DatasetError::MissingResource(path.to_path_buf()).into());
    }
    let decoded = ::image::open(path)
      .context(format!("Failed to decode image {}.", path.display()))?;
    Ok(Image::from_rgb8(&decoded.to_rgb8()))
  }
}
