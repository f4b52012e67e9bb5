//! 2D layout of the feature matrix: spectral embedding over a
//! k-nearest-neighbour affinity graph, then average-linkage agglomerative
//! clustering of the embedded points.
//!
//! Everything here is deterministic: neighbour ties break by row index, the
//! dense symmetric eigendecomposition has no randomized initialisation, and
//! each embedding axis gets a fixed sign convention. Same matrix in, same
//! positions and labels out.

use crate::color::CLUSTER_PALETTE;
use nalgebra::{DMatrix, SymmetricEigen};
use thiserror::Error;

/// Neighbourhood size for the affinity graph, clamped below the row count.
pub const EMBED_NEIGHBORS: usize = 12;

/// Below this many rows there are not enough non-trivial Laplacian
/// eigenvectors for a 2D layout.
pub const MIN_EMBED_ROWS: usize = 4;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("only {rows} countries survive the current selection; at least {min} are needed")]
    TooFewRows { rows: usize, min: usize },
}

/// Row-aligned with the feature matrix that produced it.
pub struct Projection {
    pub positions: Vec<[f64; 2]>,
    /// Cluster label per row, 0-indexed in order of first appearance, so
    /// row 0 always belongs to cluster 0.
    pub labels: Vec<usize>,
}

pub fn project(
    features: &DMatrix<f64>,
    num_clusters: usize,
) -> Result<Projection, ProjectionError> {
    let n = features.nrows();
    if n < MIN_EMBED_ROWS {
        return Err(ProjectionError::TooFewRows {
            rows: n,
            min: MIN_EMBED_ROWS,
        });
    }
    debug_assert!(
        (1..=CLUSTER_PALETTE.len()).contains(&num_clusters),
        "cluster count {num_clusters} outside palette bounds"
    );

    let k = EMBED_NEIGHBORS.min(n - 1);
    let positions = spectral_embedding(features, k);
    let labels = cluster_average_linkage(&positions, num_clusters.min(n));
    Ok(Projection { positions, labels })
}

/// Two smallest non-trivial eigenvectors of the normalized graph Laplacian
/// of the symmetrized kNN connectivity graph, recovered to the random-walk
/// embedding by a D^(-1/2) rescale.
fn spectral_embedding(features: &DMatrix<f64>, k: usize) -> Vec<[f64; 2]> {
    let n = features.nrows();

    let mut dist = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = (features.row(i) - features.row(j)).norm();
            dist[(i, j)] = d;
            dist[(j, i)] = d;
        }
    }

    // Directed kNN connectivity, ties broken by index, then symmetrized by
    // averaging so mutual neighbours weigh 1 and one-sided ones 0.5.
    let mut adjacency = DMatrix::zeros(n, n);
    let mut order: Vec<usize> = Vec::with_capacity(n - 1);
    for i in 0..n {
        order.clear();
        order.extend((0..n).filter(|&j| j != i));
        order.sort_by(|&a, &b| dist[(i, a)].total_cmp(&dist[(i, b)]).then(a.cmp(&b)));
        for &j in order.iter().take(k) {
            adjacency[(i, j)] = 1.0;
        }
    }
    let weights: DMatrix<f64> = 0.5 * (&adjacency + adjacency.transpose());

    // Normalized Laplacian L = I - D^(-1/2) W D^(-1/2). Every node has k
    // outgoing edges, so degrees are strictly positive.
    let inv_sqrt_deg: Vec<f64> = (0..n)
        .map(|i| 1.0 / weights.row(i).sum().sqrt())
        .collect();
    let mut laplacian: DMatrix<f64> = DMatrix::identity(n, n);
    for i in 0..n {
        for j in 0..n {
            let w = weights[(i, j)];
            if w != 0.0 {
                laplacian[(i, j)] -= w * inv_sqrt_deg[i] * inv_sqrt_deg[j];
            }
        }
    }

    let eigen = SymmetricEigen::new(laplacian);
    let mut by_value: Vec<usize> = (0..n).collect();
    by_value.sort_by(|&a, &b| {
        eigen.eigenvalues[a]
            .total_cmp(&eigen.eigenvalues[b])
            .then(a.cmp(&b))
    });

    // Skip the constant eigenvector; take the next two axes.
    let mut axes = [vec![0.0; n], vec![0.0; n]];
    for (c, axis) in axes.iter_mut().enumerate() {
        let col = eigen.eigenvectors.column(by_value[c + 1]);
        for i in 0..n {
            axis[i] = col[i] * inv_sqrt_deg[i];
        }
        sign_flip(axis);
    }

    (0..n).map(|i| [axes[0][i], axes[1][i]]).collect()
}

/// Fixed sign convention: the entry with the largest magnitude (lowest
/// index on ties) is positive.
fn sign_flip(axis: &mut [f64]) {
    let mut max_abs = 0.0;
    let mut max_idx = 0;
    for (i, &v) in axis.iter().enumerate() {
        if v.abs() > max_abs {
            max_abs = v.abs();
            max_idx = i;
        }
    }
    if axis[max_idx] < 0.0 {
        for v in axis.iter_mut() {
            *v = -*v;
        }
    }
}

/// Agglomerative clustering with average linkage (Lance-Williams update),
/// merging the closest active pair (ties by index) until `num_clusters`
/// remain. Labels are numbered by each cluster's smallest member index.
fn cluster_average_linkage(points: &[[f64; 2]], num_clusters: usize) -> Vec<usize> {
    let n = points.len();
    if num_clusters >= n {
        return (0..n).collect();
    }

    let mut dist = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = points[i][0] - points[j][0];
            let dy = points[i][1] - points[j][1];
            let d = (dx * dx + dy * dy).sqrt();
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }

    let mut active: Vec<bool> = vec![true; n];
    let mut size: Vec<f64> = vec![1.0; n];
    let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

    for _ in 0..(n - num_clusters) {
        // Closest active pair, lexicographically smallest on ties.
        let mut best = (0usize, 0usize);
        let mut best_d = f64::INFINITY;
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in (i + 1)..n {
                if active[j] && dist[i][j] < best_d {
                    best_d = dist[i][j];
                    best = (i, j);
                }
            }
        }

        let (a, b) = best;
        // Average linkage: d(a∪b, m) = (|a| d(a,m) + |b| d(b,m)) / (|a|+|b|).
        for m in 0..n {
            if m == a || m == b || !active[m] {
                continue;
            }
            let d = (size[a] * dist[a][m] + size[b] * dist[b][m]) / (size[a] + size[b]);
            dist[a][m] = d;
            dist[m][a] = d;
        }
        size[a] += size[b];
        let moved = std::mem::take(&mut members[b]);
        members[a].extend(moved);
        active[b] = false;
    }

    // Order surviving clusters by smallest member for stable label values.
    let mut clusters: Vec<&Vec<usize>> = (0..n)
        .filter(|&i| active[i])
        .map(|i| &members[i])
        .collect();
    clusters.sort_by_key(|m| m.iter().copied().min().unwrap_or(usize::MAX));

    let mut labels = vec![0usize; n];
    for (label, cluster) in clusters.iter().enumerate() {
        for &point in cluster.iter() {
            labels[point] = label;
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well-separated blobs of 13 points each, so every point's twelve
    /// nearest neighbours lie inside its own blob.
    fn two_blob_matrix() -> DMatrix<f64> {
        let mut rows = Vec::new();
        for i in 0..13 {
            rows.push([i as f64 * 0.01, (i % 3) as f64 * 0.01]);
        }
        for i in 0..13 {
            rows.push([100.0 + i as f64 * 0.01, 50.0 + (i % 4) as f64 * 0.01]);
        }
        DMatrix::from_fn(rows.len(), 2, |r, c| rows[r][c])
    }

    #[test]
    fn projection_is_reproducible() {
        let m = two_blob_matrix();
        let a = project(&m, 3).unwrap();
        let b = project(&m, 3).unwrap();
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn positions_align_with_rows_and_labels_stay_bounded() {
        let m = two_blob_matrix();
        for num_clusters in 1..=7 {
            let proj = project(&m, num_clusters).unwrap();
            assert_eq!(proj.positions.len(), m.nrows());
            assert_eq!(proj.labels.len(), m.nrows());
            let distinct: std::collections::HashSet<usize> =
                proj.labels.iter().copied().collect();
            assert!(distinct.len() <= num_clusters);
            assert!(proj.labels.iter().all(|&l| l < num_clusters.min(7)));
        }
    }

    #[test]
    fn too_few_rows_is_a_typed_error() {
        let m = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 1.0]);
        let err = project(&m, 2).err().unwrap();
        assert!(matches!(err, ProjectionError::TooFewRows { rows: 2, min: _ }));
    }

    #[test]
    fn embedding_is_finite_and_spreads_the_points() {
        let m = two_blob_matrix();
        let proj = project(&m, 2).unwrap();
        assert!(proj
            .positions
            .iter()
            .all(|p| p[0].is_finite() && p[1].is_finite()));
        // A layout that collapses every point to one spot is useless.
        assert!(proj.positions.iter().any(|p| *p != proj.positions[0]));
        // Row 0 always starts cluster 0.
        assert_eq!(proj.labels[0], 0);
    }

    #[test]
    fn average_linkage_groups_nearby_points() {
        let points = vec![
            [0.0, 0.0],
            [0.1, 0.0],
            [10.0, 10.0],
            [10.1, 10.0],
            [-5.0, 4.0],
        ];
        let labels = cluster_average_linkage(&points, 3);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
        assert_ne!(labels[0], labels[4]);
        // Labels numbered by first appearance.
        assert_eq!(labels[0], 0);
        assert_eq!(labels[2], 1);
        assert_eq!(labels[4], 2);
    }

    #[test]
    fn requesting_more_clusters_than_points_gives_singletons() {
        let points = vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let labels = cluster_average_linkage(&points, 7);
        assert_eq!(labels, vec![0, 1, 2]);
    }

    #[test]
    fn neighbourhood_clamps_below_the_row_count() {
        // 10 rows < EMBED_NEIGHBORS + 1; must embed rather than error.
        let m = DMatrix::from_fn(10, 3, |r, c| (r * 3 + c) as f64);
        let proj = project(&m, 3).unwrap();
        assert_eq!(proj.positions.len(), 10);
        assert!(proj.labels.iter().all(|&l| l < 3));
    }
}
