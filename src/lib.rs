//! Post-processing utilities that turn per-pixel probability heat-maps into
//! discrete instance masks and run-length encodings, built on [imageproc].
//!
//! The pipeline thresholds a map, labels connected components with
//! [`imageproc::region_labelling::connected_components`], re-clusters each
//! component with an adaptive k-means step that decides whether a blob is one
//! object or several touching objects, and encodes every resulting mask in
//! column-major run-length form.

pub mod error;
pub mod kmeans;
pub mod pipeline;
pub mod recluster;
pub mod rle;
