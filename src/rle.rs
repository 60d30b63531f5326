use image::GrayImage;

/// Encodes a binary mask as a flat run-length sequence in column-major order.
///
/// The mask is flattened transpose-first (all rows of column 0, then column 1,
/// and so on) and the 0-indexed positions of foreground pixels are walked once
/// in ascending order. Whenever a position is not contiguous with the previous
/// foreground position a new run is opened at `position + 1` (starts are
/// 1-indexed, matching the common segmentation submission format), and every
/// foreground pixel increments the current run's length.
///
/// Any non-zero pixel value counts as foreground.
///
/// # Arguments
///
/// * `mask` - A grayscale image treated as a binary mask.
///
/// # Returns
///
/// A `Vec<u32>` of alternating `[start_1, len_1, start_2, len_2, ...]` pairs.
/// A mask with no foreground pixels yields an empty vector.
pub fn encode(mask: &GrayImage) -> Vec<u32> {
    let (width, height) = mask.dimensions();
    let mut runs: Vec<u32> = Vec::new();
    // One before any valid predecessor, so the first pixel always opens a run.
    let mut prev: i64 = -2;

    for x in 0..width {
        for y in 0..height {
            if mask.get_pixel(x, y).0[0] == 0 {
                continue;
            }
            let position = flat_position(x, y, height);
            if position > prev + 1 {
                runs.push(position as u32 + 1);
                runs.push(0);
            }
            if let Some(len) = runs.last_mut() {
                *len += 1;
            }
            prev = position;
        }
    }

    runs
}

/// Column-major flattened position of pixel `(x, y)`, widened before the
/// multiply so it never wraps for any representable image dimensions.
fn flat_position(x: u32, y: u32, height: u32) -> i64 {
    i64::from(x) * i64::from(height) + i64::from(y)
}

/// Decodes a run-length sequence produced by [`encode`] back into a mask.
///
/// For each `(start, len)` pair, `len` consecutive column-major positions
/// beginning at the 1-indexed `start` are marked as foreground (`255`).
/// Positions falling outside `width * height` are ignored, so a truncated or
/// oversized encoding still decodes to a well-formed mask.
///
/// # Arguments
///
/// * `runs` - Alternating start/length pairs; a trailing unpaired value is
///   ignored.
/// * `width` - Width of the reconstructed mask in pixels.
/// * `height` - Height of the reconstructed mask in pixels.
pub fn decode(runs: &[u32], width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if height == 0 {
        return mask;
    }

    for pair in runs.chunks_exact(2) {
        let (start, len) = (pair[0], pair[1]);
        if start == 0 {
            continue;
        }
        for position in (start - 1)..(start - 1).saturating_add(len) {
            let x = position / height;
            let y = position % height;
            if x < width {
                mask.put_pixel(x, y, image::Luma([255]));
            }
        }
    }

    mask
}

/// The single-pixel fallback run `[1, 1]`.
///
/// When an entire probability map produces no instances at all, submitting
/// nothing is usually rejected downstream; callers substitute this placeholder
/// so that every processed map yields at least one record. See
/// [`crate::pipeline::prob_to_rles_or_placeholder`].
pub fn placeholder() -> Vec<u32> {
    vec![1, 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&[u8]]) -> GrayImage {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        GrayImage::from_fn(width, height, |x, y| {
            image::Luma([rows[y as usize][x as usize] * 255])
        })
    }

    #[test]
    fn test_empty_mask_encodes_to_empty_sequence() {
        let mask = GrayImage::new(7, 4);
        assert!(encode(&mask).is_empty());
    }

    #[test]
    fn test_single_pixel() {
        // Pixel at (x=0, y=0) is column-major position 0, so its run starts at 1.
        let mask = mask_from_rows(&[&[1, 0], &[0, 0]]);
        assert_eq!(encode(&mask), vec![1, 1]);
    }

    #[test]
    fn test_column_major_ordering() {
        // 3x2 mask (width 3, height 2):
        //   1 0 1
        //   1 0 0
        // Column-major positions: col 0 -> 0, 1; col 2 -> 4.
        let mask = mask_from_rows(&[&[1, 0, 1], &[1, 0, 0]]);
        assert_eq!(encode(&mask), vec![1, 2, 5, 1]);
    }

    #[test]
    fn test_run_spans_column_boundary() {
        // A fully-foreground 2x2 mask is one contiguous column-major run.
        let mask = mask_from_rows(&[&[1, 1], &[1, 1]]);
        assert_eq!(encode(&mask), vec![1, 4]);
    }

    #[test]
    fn test_round_trip_reconstructs_pixel_set() {
        let mask = mask_from_rows(&[
            &[0, 1, 1, 0, 1],
            &[1, 1, 0, 0, 1],
            &[0, 0, 0, 1, 1],
            &[1, 0, 1, 1, 0],
        ]);
        let decoded = decode(&encode(&mask), 5, 4);
        assert_eq!(mask.as_raw(), decoded.as_raw());
    }

    #[test]
    fn test_decode_ignores_out_of_bounds_runs() {
        let decoded = decode(&[9, 10], 2, 2);
        // Only position 8 (start 9, 0-indexed 8) onwards; all beyond the 2x2 grid.
        assert!(decoded.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_flat_position_does_not_wrap_on_huge_dimensions() {
        // 100_000 columns into a 100_000-pixel-tall mask sits far beyond
        // u32::MAX; the widened arithmetic must not wrap.
        assert_eq!(flat_position(100_000, 7, 100_000), 10_000_000_007);
        assert_eq!(flat_position(0, 0, u32::MAX), 0);
        assert_eq!(
            flat_position(u32::MAX, u32::MAX - 1, u32::MAX),
            i64::from(u32::MAX) * i64::from(u32::MAX) + i64::from(u32::MAX - 1)
        );
    }

    #[test]
    fn test_placeholder_is_single_pixel_run() {
        let run = placeholder();
        assert_eq!(run, vec![1, 1]);
        let decoded = decode(&run, 10, 10);
        assert_eq!(decoded.pixels().filter(|p| p.0[0] != 0).count(), 1);
        assert_eq!(decoded.get_pixel(0, 0).0[0], 255);
    }
}
