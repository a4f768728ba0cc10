pub mod features;
pub mod image_file;

pub use features::{FeatureVector, OrderedIndexList};
pub use image_file::ImageFile;
