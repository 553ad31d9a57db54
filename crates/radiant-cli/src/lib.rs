//! Shared utilities for radiant-cli
//!
//! Decoding, exporting, batch input handling and metric reports used by the
//! `radiant` binary.

pub mod decoders;
pub mod exporters;
pub mod processing;
pub mod report;

// Re-export commonly used items at the crate root for convenience
pub use decoders::{decode_field, decode_image};
pub use exporters::{export_png8, export_tiff16};
pub use processing::{
    derived_path, expand_inputs, output_dir_for, process_single_image, ProcessingParams,
    SUPPORTED_EXTENSIONS,
};
pub use report::{write_report, BatchReport, FailureRecord, ImageReport, MetricsRecord};
