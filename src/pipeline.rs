use image::{GrayImage, ImageBuffer, Luma, Primitive};
use imageproc::region_labelling::{Connectivity, connected_components};
use num_traits::Float;

use crate::error::InstanceError;
use crate::kmeans::ClusterSelector;
use crate::recluster::recluster;
use crate::rle;

/// A per-pixel confidence grid produced by an upstream model, one value per
/// pixel, nominally in `[0, 1]`.
pub type ProbabilityMap<F> = ImageBuffer<Luma<F>, Vec<F>>;

/// Tunable knobs of the post-processing pipeline.
///
/// The clustering constants themselves (cluster cap, restarts, stop ratios)
/// are compiled into [`crate::kmeans`], since they were tuned for the
/// nuclei-imaging domain and are not meaningfully runtime-configurable.
#[derive(Debug, Clone)]
pub struct PostProcessConfig {
    /// Confidence strictly above this value is foreground.
    pub cutoff: f32,
    /// Adjacency used by the connected-component labeling. The default is
    /// eight-connected, which merges diagonally touching pixels into one
    /// component before re-clustering gets a chance to separate them.
    pub connectivity: Connectivity,
    /// Seed for the clustering randomness, threaded explicitly into the
    /// [`ClusterSelector`] rather than set process-wide.
    pub seed: u64,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            cutoff: 0.5,
            connectivity: Connectivity::Eight,
            seed: 42,
        }
    }
}

/// Thresholds a probability map into a binary foreground mask.
///
/// Pixels strictly greater than `cutoff` become foreground (`255`), everything
/// else background (`0`).
pub fn threshold<F>(map: &ProbabilityMap<F>, cutoff: F) -> GrayImage
where
    F: Float + Primitive,
{
    let (width, height) = map.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if map.get_pixel(x, y).0[0] > cutoff {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Runs the full post-processing pipeline on one probability map.
///
/// The map is validated, thresholded at `config.cutoff`, labeled with
/// [`connected_components`], split into instance masks by
/// [`recluster`], and each mask is encoded with [`rle::encode`]. Encoding
/// happens lazily as the returned iterator is advanced; encodings appear in
/// ascending component-label order, with the sub-masks of a split component
/// contiguous.
///
/// The returned iterator owns all of its data and does not borrow the map or
/// the config (the `use<F>` capture bound), so both may be dropped before the
/// encodings are drained.
///
/// A map with no foreground at all yields an empty iterator; see
/// [`prob_to_rles_or_placeholder`] for the submission-friendly variant.
///
/// # Errors
///
/// [`InstanceError::NonFiniteProbability`] if any map value is NaN or
/// infinite, [`InstanceError::NonFiniteCutoff`] if the cutoff is.
pub fn prob_to_rles<F>(
    map: &ProbabilityMap<F>,
    config: &PostProcessConfig,
) -> Result<impl Iterator<Item = Vec<u32>> + use<F>, InstanceError>
where
    F: Float + Primitive,
{
    if !config.cutoff.is_finite() {
        return Err(InstanceError::NonFiniteCutoff(config.cutoff));
    }
    let cutoff = F::from(config.cutoff).ok_or(InstanceError::NonFiniteCutoff(config.cutoff))?;
    for (x, y, pixel) in map.enumerate_pixels() {
        if !pixel.0[0].is_finite() {
            return Err(InstanceError::NonFiniteProbability { x, y });
        }
    }

    let binary = threshold(map, cutoff);
    let labeled = connected_components(&binary, config.connectivity, Luma([0u8]));
    let mut selector = ClusterSelector::new(config.seed);
    let instances = recluster(&labeled, &mut selector);
    log::debug!("{} instances after re-clustering", instances.len());

    Ok(instances.into_iter().map(|mask| rle::encode(&mask)))
}

/// Like [`prob_to_rles`], but guarantees at least one record per map.
///
/// When the pipeline finds no instances the single-pixel
/// [`rle::placeholder`] run is substituted, so that every processed map can be
/// serialized as at least one submission row.
pub fn prob_to_rles_or_placeholder<F>(
    map: &ProbabilityMap<F>,
    config: &PostProcessConfig,
) -> Result<Vec<Vec<u32>>, InstanceError>
where
    F: Float + Primitive,
{
    let encodings: Vec<Vec<u32>> = prob_to_rles(map, config)?.collect();
    if encodings.is_empty() {
        Ok(vec![rle::placeholder()])
    } else {
        Ok(encodings)
    }
}
