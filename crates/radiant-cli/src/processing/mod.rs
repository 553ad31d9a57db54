//! Image processing and input handling.

mod input;
mod single;

pub use input::{derived_path, expand_inputs, output_dir_for, SUPPORTED_EXTENSIONS};
pub use single::{process_single_image, ProcessingParams};
