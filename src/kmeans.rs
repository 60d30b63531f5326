use imageproc::point::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Maximum number of clusters attempted per connected component.
pub const MAX_CLUSTERS: usize = 5;

/// Independent k-means restarts per candidate cluster count. More restarts
/// give better optima; two keeps per-component runtime bounded.
const RESTARTS: usize = 2;

/// Lloyd iteration cap per fit. A fit that has not converged by then returns
/// its best-effort assignment.
const MAX_ITERATIONS: usize = 100;

/// Relative-inertia stop threshold applied when moving from 1 to 2 clusters.
const STOP_RATIO_TWO: f64 = 0.49;

/// Relative-inertia stop threshold applied for 3 or more clusters.
const STOP_RATIO_MANY: f64 = 0.64;

/// Chooses the smallest cluster count that still explains a 2-D point set,
/// using k-means fits and a relative-inertia stopping rule.
///
/// Inertia (the sum of squared distances from each point to its assigned
/// center) strictly decreases as the cluster count grows. A large relative
/// drop signals a real subdivision into distinct touching objects, while a
/// small drop means the previous count already captured the natural grouping.
/// The selector fits `k = 1..=`[`MAX_CLUSTERS`] in order and stops as soon as
/// the new inertia exceeds the threshold fraction of the previously retained
/// one ([`STOP_RATIO_TWO`] at `k = 2`, [`STOP_RATIO_MANY`] afterwards).
///
/// All randomness (k-means++ seeding and restarts) is driven by a single
/// `StdRng` owned by the selector, so results are deterministic for a fixed
/// seed and input sequence. With only [`RESTARTS`] restarts per fit, tied or
/// ambiguous geometries may resolve differently under different seeds; that
/// variance is an accepted runtime trade-off.
pub struct ClusterSelector {
    rng: StdRng,
}

impl ClusterSelector {
    /// Creates a selector with an explicit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Assigns each point to a cluster, returning one label per input point,
    /// positionally aligned.
    ///
    /// The effective cluster count is capped at the number of points, so
    /// requesting clusters for very small point sets is well-defined rather
    /// than an error. An empty point set yields an empty assignment.
    pub fn select(&mut self, points: &[Point<u32>]) -> Vec<usize> {
        let samples: Vec<[f64; 2]> = points
            .iter()
            .map(|p| [f64::from(p.y), f64::from(p.x)])
            .collect();
        if samples.is_empty() {
            return Vec::new();
        }

        let (mut retained, mut retained_inertia) = self.best_of_restarts(&samples, 1);
        for k in 2..=MAX_CLUSTERS {
            let (assignment, inertia) = self.best_of_restarts(&samples, k.min(samples.len()));
            let stop_ratio = if k == 2 { STOP_RATIO_TWO } else { STOP_RATIO_MANY };
            if inertia > stop_ratio * retained_inertia {
                // The smaller count already explained the data; keep it.
                return retained;
            }
            retained = assignment;
            retained_inertia = inertia;
        }

        retained
    }

    /// Runs [`RESTARTS`] independent fits and keeps the lowest-inertia one.
    fn best_of_restarts(&mut self, samples: &[[f64; 2]], k: usize) -> (Vec<usize>, f64) {
        let (mut assignment, mut inertia) = self.fit_once(samples, k);
        for _ in 1..RESTARTS {
            let (candidate, candidate_inertia) = self.fit_once(samples, k);
            if candidate_inertia < inertia {
                assignment = candidate;
                inertia = candidate_inertia;
            }
        }
        (assignment, inertia)
    }

    /// One k-means fit: k-means++ seeding followed by Lloyd iterations.
    fn fit_once(&mut self, samples: &[[f64; 2]], k: usize) -> (Vec<usize>, f64) {
        let mut centers = self.seed_centers(samples, k);
        let mut assignment = vec![0usize; samples.len()];

        for _ in 0..MAX_ITERATIONS {
            let mut changed = false;
            for (label, sample) in assignment.iter_mut().zip(samples) {
                let nearest = nearest_center(sample, &centers);
                if *label != nearest {
                    *label = nearest;
                    changed = true;
                }
            }

            let mut sums = vec![[0.0f64; 2]; centers.len()];
            let mut counts = vec![0usize; centers.len()];
            for (sample, &label) in samples.iter().zip(&assignment) {
                sums[label][0] += sample[0];
                sums[label][1] += sample[1];
                counts[label] += 1;
            }
            for ((center, sum), &count) in centers.iter_mut().zip(&sums).zip(&counts) {
                if count > 0 {
                    *center = [sum[0] / count as f64, sum[1] / count as f64];
                } else {
                    // A center lost all its points; reseed it on a sample.
                    *center = samples[self.rng.random_range(0..samples.len())];
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        // Final assignment and inertia against the settled centers.
        let mut inertia = 0.0;
        for (label, sample) in assignment.iter_mut().zip(samples) {
            *label = nearest_center(sample, &centers);
            inertia += squared_distance(sample, &centers[*label]);
        }
        (assignment, inertia)
    }

    /// k-means++ initialization: the first center is uniform over the samples,
    /// each further center is drawn with probability proportional to the
    /// squared distance to the nearest center chosen so far.
    fn seed_centers(&mut self, samples: &[[f64; 2]], k: usize) -> Vec<[f64; 2]> {
        let mut centers = Vec::with_capacity(k);
        centers.push(samples[self.rng.random_range(0..samples.len())]);

        while centers.len() < k {
            let weights: Vec<f64> = samples
                .iter()
                .map(|sample| {
                    centers
                        .iter()
                        .map(|center| squared_distance(sample, center))
                        .fold(f64::INFINITY, f64::min)
                })
                .collect();
            let total: f64 = weights.iter().sum();

            let chosen = if total > 0.0 {
                let mut target = self.rng.random::<f64>() * total;
                let mut index = samples.len() - 1;
                for (i, weight) in weights.iter().enumerate() {
                    if target < *weight {
                        index = i;
                        break;
                    }
                    target -= weight;
                }
                index
            } else {
                // All samples coincide with a center; any pick is equivalent.
                self.rng.random_range(0..samples.len())
            };
            centers.push(samples[chosen]);
        }

        centers
    }
}

fn nearest_center(sample: &[f64; 2], centers: &[[f64; 2]]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (index, center) in centers.iter().enumerate() {
        let distance = squared_distance(sample, center);
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}

fn squared_distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let dr = a[0] - b[0];
    let dc = a[1] - b[1];
    dr * dr + dc * dc
}
