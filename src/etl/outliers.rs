// src/etl/outliers.rs

use crate::config::OutlierConfig;
use crate::domain::CoercedListing;
use tracing::{info, warn};

/// Distance-to-k-th-neighbour outlier detector.
///
/// It is fit on the batch it filters, so "outlier" always means "unusual for
/// this batch". A single listing has no neighbours to be compared against;
/// the inference path must never call this.
#[derive(Debug, Clone)]
pub struct KnnDetector {
    pub n_neighbors: usize,
    pub contamination: f64,
}

impl Default for KnnDetector {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            contamination: 0.1,
        }
    }
}

impl From<&OutlierConfig> for KnnDetector {
    fn from(config: &OutlierConfig) -> Self {
        Self {
            n_neighbors: config.n_neighbors,
            contamination: config.contamination,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutlierReport {
    pub kept: usize,
    pub dropped: usize,
}

impl KnnDetector {
    /// Euclidean distance from each point to its k-th nearest other point.
    /// Needs more than `n_neighbors` points.
    fn scores<const N: usize>(&self, points: &[[f64; N]]) -> Vec<f64> {
        let k = self.n_neighbors;
        let mut distances = Vec::with_capacity(points.len().saturating_sub(1));

        points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                distances.clear();
                distances.extend(
                    points
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, q)| euclidean(p, q)),
                );
                let (_, kth, _) = distances.select_nth_unstable_by(k - 1, f64::total_cmp);
                *kth
            })
            .collect()
    }

    /// Outlier flags, or `None` when the batch is too small to score.
    pub fn flag<const N: usize>(&self, points: &[[f64; N]]) -> Option<Vec<bool>> {
        if self.n_neighbors == 0 || points.len() <= self.n_neighbors {
            return None;
        }

        let scores = self.scores(points);
        let mut sorted = scores.clone();
        sorted.sort_by(f64::total_cmp);
        let threshold = percentile(&sorted, 100.0 * (1.0 - self.contamination));

        Some(scores.into_iter().map(|s| s > threshold).collect())
    }

    /// Drops the listings flagged as outliers within this batch.
    pub fn filter(&self, listings: Vec<CoercedListing>) -> (Vec<CoercedListing>, OutlierReport) {
        let points: Vec<[f64; 9]> = listings.iter().map(|l| l.outlier_features()).collect();

        let Some(flags) = self.flag(&points) else {
            warn!(
                "Only {} listings, need more than {} to score outliers; keeping all",
                listings.len(),
                self.n_neighbors
            );
            let kept = listings.len();
            return (listings, OutlierReport { kept, dropped: 0 });
        };

        let total = listings.len();
        let kept: Vec<CoercedListing> = listings
            .into_iter()
            .zip(flags)
            .filter_map(|(listing, is_outlier)| (!is_outlier).then_some(listing))
            .collect();

        let report = OutlierReport {
            kept: kept.len(),
            dropped: total - kept.len(),
        };
        info!(
            "The percentage of outliers is {:.2}% ({} of {})",
            100.0 * report.dropped as f64 / total as f64,
            report.dropped,
            total
        );

        (kept, report)
    }
}

fn euclidean<const N: usize>(a: &[f64; N], b: &[f64; N]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Linear-interpolated percentile of ascending `sorted` values, `q` in [0, 100].
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn percentile_interpolates_between_ranks() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 50.0), 3.0);
        assert!((percentile(&values, 90.0) - 4.6).abs() < 1e-12);
        assert_eq!(percentile(&values, 100.0), 5.0);
    }

    #[test]
    fn score_is_distance_to_kth_other_point() {
        let detector = KnnDetector {
            n_neighbors: 2,
            contamination: 0.1,
        };
        let points = [[0.0], [1.0], [3.0], [10.0]];

        assert_eq!(detector.scores(&points), vec![3.0, 2.0, 3.0, 9.0]);
    }

    #[test]
    fn isolated_points_are_flagged() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut points: Vec<[f64; 2]> = (0..40)
            .map(|_| [rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)])
            .collect();
        points.push([50.0, 50.0]);
        points.push([-40.0, 60.0]);

        let flags = KnnDetector::default().flag(&points).unwrap();

        assert!(flags[40] && flags[41]);
        let flagged = flags.iter().filter(|f| **f).count();
        assert!(flagged <= 5, "flagged {flagged} of {}", points.len());
    }

    #[test]
    fn zero_contamination_flags_nothing() {
        let detector = KnnDetector {
            n_neighbors: 1,
            contamination: 0.0,
        };
        let flags = detector.flag(&[[0.0], [1.0], [100.0]]).unwrap();
        assert_eq!(flags, vec![false, false, false]);
    }

    #[test]
    fn small_batches_are_not_scored() {
        let detector = KnnDetector::default();
        assert!(detector.flag(&[[0.0]; 5]).is_none());
        assert!(detector.flag(&[[0.0]; 6]).is_some());
    }
}
