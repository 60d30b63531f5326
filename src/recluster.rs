use std::collections::BTreeMap;

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::point::Point;

use crate::kmeans::ClusterSelector;

/// Components with fewer foreground pixels than this are never re-clustered:
/// too few points to cluster meaningfully, and instability would dominate any
/// benefit.
pub const MIN_SPLIT_PIXELS: usize = 5;

/// Splits the components of a labeled map into individual instance masks.
///
/// Each positive label in `labeled` is one connected component. Components
/// below [`MIN_SPLIT_PIXELS`] pixels pass through unchanged. Larger ones have
/// their pixel coordinates handed to the [`ClusterSelector`]; if it settles on
/// a single cluster the component also passes through unchanged, otherwise one
/// fresh mask is built per cluster index.
///
/// Label ids are discovered in a single scan and treated as an opaque set, so
/// a labeling primitive that produces a sparse id space is handled the same as
/// a contiguous one.
///
/// # Returns
///
/// One binary mask per detected instance, each of the labeled map's
/// dimensions. Masks appear in ascending label order, with the sub-masks of a
/// split component contiguous in ascending cluster-index order. Every
/// foreground pixel of the input lands in exactly one output mask.
pub fn recluster(labeled: &Image<Luma<u32>>, selector: &mut ClusterSelector) -> Vec<GrayImage> {
    let (width, height) = labeled.dimensions();

    // Row-major scan; per-label point lists therefore come out in row-major
    // order, and BTreeMap iteration yields labels in ascending order.
    let mut components: BTreeMap<u32, Vec<Point<u32>>> = BTreeMap::new();
    for (x, y, pixel) in labeled.enumerate_pixels() {
        if pixel.0[0] != 0 {
            components.entry(pixel.0[0]).or_default().push(Point::new(x, y));
        }
    }
    log::debug!("labeled map has {} components", components.len());

    let mut instances = Vec::new();
    for (label, points) in components {
        if points.len() < MIN_SPLIT_PIXELS {
            instances.push(mask_from_points(width, height, &points));
            continue;
        }

        let assignment = selector.select(&points);
        let clusters = assignment.iter().copied().max().map_or(1, |m| m + 1);
        if clusters == 1 {
            instances.push(mask_from_points(width, height, &points));
            continue;
        }

        log::debug!("component {label}: split into {clusters} instances");
        for cluster in 0..clusters {
            let members: Vec<Point<u32>> = points
                .iter()
                .zip(&assignment)
                .filter(|&(_, &assigned)| assigned == cluster)
                .map(|(point, _)| *point)
                .collect();
            instances.push(mask_from_points(width, height, &members));
        }
    }

    instances
}

fn mask_from_points(width: u32, height: u32, points: &[Point<u32>]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    for point in points {
        mask.put_pixel(point.x, point.y, Luma([255]));
    }
    mask
}
