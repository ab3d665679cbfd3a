use crate::all::*;

// Continuous videos as ordered lists of dataset indices. The dataset interleaves
// the cameras of a frame, `index = 4 * pose + camera offset`, so each recorded
// sequence yields one video per camera.
#[derive(Clone, Debug, Default)]
pub struct VideoIndex {
  videos: Vec<Vec<usize>>,
}

impl VideoIndex {
  pub fn new(store: &PoseStore) -> VideoIndex {
    // Group by (subject, sequence) in order of first appearance.
    let mut slots: HashMap<(u32, &str), usize> = HashMap::new();
    let mut sequences: Vec<Vec<usize>> = vec![];
    for (i, meta) in store.metas().iter().enumerate() {
      let slot = *slots.entry((meta.subject, meta.sequence_id.as_str()))
        .or_insert_with(|| {
          sequences.push(vec![]);
          sequences.len() - 1
        });
      sequences[slot].push(i);
    }

    let mut videos = Vec::with_capacity(sequences.len() * CAMERAS_PER_FRAME);
    for sequence in &sequences {
      for offset in 0..CAMERAS_PER_FRAME {
        videos.push(sequence.iter().map(|&i| CAMERAS_PER_FRAME * i + offset).collect());
      }
    }
    VideoIndex { videos }
  }

  pub fn len(&self) -> usize {
    self.videos.len()
  }

  pub fn is_empty(&self) -> bool {
    self.videos.is_empty()
  }

  pub fn frames(&self, video: usize) -> Result<&[usize]> {
    self.videos.get(video)
      .map(|v| v.as_slice())
      .ok_or_else(|| DatasetError::VideoOutOfRange { index: video, len: self.videos.len() }.into())
  }
}
