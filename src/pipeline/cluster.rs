//! Duplicate merging with DBSCAN
//!
//! Neighbourhoods are inclusive (`distance <= eps`) and count the query
//! point itself. A point with at least `min_points` neighbours is a core
//! point; clusters grow from core points through their neighbours.
//! Points reached by no core point are noise and are discarded.

use log::info;
use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::coordinate::Point;
use crate::errors::{TreeKitError, TreeKitResult};

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// One merged group of detections
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    /// Mean of the member coordinates
    pub centroid: Point,
    /// Number of merged detections
    pub members: usize,
}

/// DBSCAN over planar points
#[derive(Debug, Clone, Copy)]
pub struct ClusterDeduplicator {
    eps: f64,
    min_points: usize,
}

impl ClusterDeduplicator {
    /// Create a deduplicator
    ///
    /// # Arguments
    /// * `eps` - Neighbourhood radius in CRS units
    /// * `min_points` - Neighbourhood size that makes a core point
    pub fn new(eps: f64, min_points: usize) -> TreeKitResult<Self> {
        if !eps.is_finite() || eps < 0.0 {
            return Err(TreeKitError::Config(format!("cluster radius must be finite and non-negative, got {}", eps)));
        }
        if min_points == 0 {
            return Err(TreeKitError::Config("min_points must be at least 1".to_string()));
        }

        Ok(ClusterDeduplicator { eps, min_points })
    }

    /// Cluster labels per input point; `None` marks noise
    ///
    /// Labels are numbered in order of the first core point of each cluster.
    pub fn labels(&self, points: &[Point]) -> Vec<Option<usize>> {
        let tree = RTree::bulk_load(
            points.iter()
                .enumerate()
                .map(|(index, point)| IndexedPoint::new(point.to_array(), index))
                .collect(),
        );
        let eps_squared = self.eps * self.eps;
        let neighbours = |index: usize| -> Vec<usize> {
            tree.locate_within_distance(points[index].to_array(), eps_squared)
                .map(|entry| entry.data)
                .collect()
        };

        let mut labels: Vec<Option<usize>> = vec![None; points.len()];
        let mut visited = vec![false; points.len()];
        let mut next_label = 0;

        for start in 0..points.len() {
            if visited[start] {
                continue;
            }
            visited[start] = true;

            let seeds = neighbours(start);
            if seeds.len() < self.min_points {
                continue;
            }

            let label = next_label;
            next_label += 1;
            labels[start] = Some(label);

            let mut queue = seeds;
            while let Some(index) = queue.pop() {
                if labels[index].is_none() {
                    labels[index] = Some(label);
                }
                if visited[index] {
                    continue;
                }
                visited[index] = true;

                let reach = neighbours(index);
                if reach.len() >= self.min_points {
                    queue.extend(reach.into_iter().filter(|&n| !visited[n]));
                }
            }
        }

        labels
    }

    /// Collapses every cluster to the mean of its members
    ///
    /// # Returns
    /// One [`Cluster`] per label, in label order; noise is dropped
    pub fn deduplicate(&self, points: &[Point]) -> Vec<Cluster> {
        let labels = self.labels(points);
        let count = labels.iter().flatten().max().map_or(0, |&max| max + 1);

        let mut sums = vec![(0.0f64, 0.0f64, 0usize); count];
        for (point, label) in points.iter().zip(&labels) {
            if let Some(label) = label {
                let sum = &mut sums[*label];
                sum.0 += point.x;
                sum.1 += point.y;
                sum.2 += 1;
            }
        }

        let noise = labels.iter().filter(|label| label.is_none()).count();
        info!("Clustered {} points into {} clusters ({} noise points dropped)", points.len(), count, noise);

        sums.into_iter()
            .map(|(x, y, members)| Cluster {
                centroid: Point::new(x / members as f64, y / members as f64),
                members,
            })
            .collect()
    }
}
