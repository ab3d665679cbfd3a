use crate::all::*;

use rand_xoshiro::Xoshiro256PlusPlus;

pub fn format_log(
  buf: &mut env_logger::fmt::Formatter,
  record: &log::Record,
) -> std::io::Result<()> {
  use std::io::Write;
  let mut style = buf.style();
  use env_logger::fmt::Color::*;
  use log::Level::*;
  style.set_color(match record.level() {
    Error => Red,
    Warn => Yellow,
    Info => Green,
    Debug => Magenta,
    Trace => Blue,
  });

  let s = format!("{:30}{}",
    format!("{}:{}",
      record.file().unwrap_or("?"),
      record.line().unwrap_or(0),
    ),
    record.args()
  );
  writeln!(buf, "{}", style.value(s))
}

// Independent random streams for parallel sample loading. Each stream starts
// 2^128 draws after the previous one, so the workers never overlap.
pub fn worker_rngs(seed: u64, workers: usize) -> Vec<Xoshiro256PlusPlus> {
  let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
  let mut rngs = Vec::with_capacity(workers);
  for _ in 0..workers {
    rngs.push(rng.clone());
    rng.jump();
  }
  rngs
}

// Logs `done/total` every `every` items during the long construction scans.
pub struct Progress {
  label: &'static str,
  total: usize,
  every: usize,
  done: usize,
}

impl Progress {
  pub fn new(label: &'static str, total: usize, every: usize) -> Progress {
    Progress { label, total, every: every.max(1), done: 0 }
  }

  pub fn step(&mut self) {
    self.done += 1;
    if self.done % self.every == 0 || self.done == self.total {
      info!("{}: {}/{}", self.label, self.done, self.total);
    }
  }
}
