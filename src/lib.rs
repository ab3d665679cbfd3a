pub mod all;
pub mod augment;
pub mod camera;
pub mod camera_pinhole;
pub mod camera_setup;
pub mod dataset;
pub mod error;
pub mod heatmap;
pub mod image;
pub mod math;
pub mod normalization;
pub mod parameters;
pub mod pose_store;
pub mod skeleton;
pub mod stats_cache;
pub mod types;
pub mod util;
pub mod video;

#[cfg(test)]
mod test_utils;

#[macro_use] extern crate lazy_static;
