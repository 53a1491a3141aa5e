use pasture_core::nalgebra::{Matrix3, SymmetricEigen, Vector3};
use qhull::QhBuilder;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::dat::Point;

pub const MAX_HULL_POINTS: usize = 50_000; // keep RAM usage tiny

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Bounds {
    pub fn of(points: &[Point]) -> Option<Self> {
        let first = points.first()?.to_array();
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in &points[1..] {
            bounds.include(p.to_array());
        }
        Some(bounds)
    }

    fn include(&mut self, p: [f64; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    pub fn merge(&mut self, other: &Bounds) {
        self.include(other.min);
        self.include(other.max);
    }

    pub fn extent(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn volume(&self) -> f64 {
        let [dx, dy, dz] = self.extent();
        dx * dy * dz
    }
}

/// Component-wise sum of all points.
pub fn sum_xyz(points: &[Point]) -> [f64; 3] {
    points.iter().fold([0.0; 3], |acc, p| {
        [acc[0] + p.x, acc[1] + p.y, acc[2] + p.z]
    })
}

pub fn mean_xyz(points: &[Point]) -> Option<[f64; 3]> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let [sx, sy, sz] = sum_xyz(points);
    Some([sx / n, sy / n, sz / n])
}

/// Areal roughness parameters of the measured surface, taken over z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightStats {
    /// Arithmetic mean deviation from the mean height.
    pub sa: f64,
    /// Root mean square deviation from the mean height.
    pub sq: f64,
    /// Peak-to-valley height.
    pub sz: f64,
}

pub fn height_stats(points: &[Point]) -> Option<HeightStats> {
    let mean_z = mean_xyz(points)?[2];
    let n = points.len() as f64;

    let (abs_sum, sq_sum, min, max) = points.iter().fold(
        (0.0, 0.0, f64::INFINITY, f64::NEG_INFINITY),
        |(abs_sum, sq_sum, min, max), p| {
            let d = p.z - mean_z;
            (abs_sum + d.abs(), sq_sum + d * d, min.min(p.z), max.max(p.z))
        },
    );

    Some(HeightStats {
        sa: abs_sum / n,
        sq: (sq_sum / n).sqrt(),
        sz: max - min,
    })
}

/// Eigenvalues of the position covariance matrix, sorted λ₁ ≥ λ₂ ≥ λ₃.
pub fn pca_eigenvalues(points: &[Point]) -> Option<[f64; 3]> {
    let [mx, my, mz] = mean_xyz(points)?;

    let mut cov = Matrix3::<f64>::zeros();
    for p in points {
        let d = Vector3::new(p.x - mx, p.y - my, p.z - mz);
        cov += d * d.transpose();
    }
    cov /= points.len() as f64;
    if !cov.iter().all(|v| v.is_finite()) {
        return None;
    }

    let eig = SymmetricEigen::new(cov);
    let mut eigvals = [eig.eigenvalues[0], eig.eigenvalues[1], eig.eigenvalues[2]];
    eigvals.sort_by(|a, b| b.total_cmp(a));
    Some(eigvals)
}

/// Reservoir sample at most `max` positions.
pub fn sample_for_hull(points: &[Point], max: usize) -> Vec<[f64; 3]> {
    if points.len() <= max {
        return points.iter().map(|p| p.to_array()).collect();
    }
    let mut rng = SmallRng::from_os_rng();
    let mut reservoir: Vec<[f64; 3]> = points[..max].iter().map(|p| p.to_array()).collect();
    for (i, p) in points.iter().enumerate().skip(max) {
        let j = rng.random_range(0..=i);
        if j < max {
            reservoir[j] = p.to_array();
        }
    }
    reservoir
}

/// Order the vertices of a planar convex facet around its centroid.
fn order_facet(mut coords: Vec<Vector3<f64>>) -> Vec<Vector3<f64>> {
    let n = coords.len() as f64;
    let centre = coords.iter().fold(Vector3::<f64>::zeros(), |acc, c| acc + c) / n;

    let u = coords[0] - centre;
    let normal = coords[1..]
        .iter()
        .map(|c| u.cross(&(c - centre)))
        .max_by(|a, b| a.norm().total_cmp(&b.norm()))
        .unwrap_or_else(Vector3::zeros);
    let w = normal.cross(&u);

    coords.sort_by(|a, b| {
        let angle = |c: &Vector3<f64>| (c - centre).dot(&w).atan2((c - centre).dot(&u));
        angle(a).total_cmp(&angle(b))
    });
    coords
}

/// Return (volume, surface_area) of the convex hull built from `points`.
///
/// Each facet is fan-triangulated after ordering its vertices; volume is the sum of the
/// tetrahedra spanned by those triangles and an interior point. Returns `None` when
/// qhull cannot build a hull, e.g. for fewer than four or coplanar points.
pub fn hull_volume_area(points: Vec<[f64; 3]>) -> Option<(f64, f64)> {
    if points.len() < 4 {
        return None;
    }
    let n = points.len() as f64;
    let inner = points
        .iter()
        .fold(Vector3::zeros(), |acc: Vector3<f64>, p| {
            acc + Vector3::new(p[0], p[1], p[2])
        })
        / n;

    let qh = QhBuilder::default()
        .capture_stdout(true)
        .capture_stderr(true)
        .compute(true)
        .build_from_iter(points.into_iter())
        .ok()?;

    let mut volume = 0.0_f64;
    let mut area = 0.0_f64;

    for facet in qh.faces() {
        let Some(verts) = facet.vertices() else {
            continue;
        };
        let coords: Vec<Vector3<f64>> = verts
            .iter()
            .map(|v| {
                let p = v.point();
                Vector3::new(p[0], p[1], p[2])
            })
            .collect();

        if coords.len() < 3 {
            // degenerate facet
            continue;
        }

        let coords = order_facet(coords);
        let a = coords[0];
        for pair in coords[1..].windows(2) {
            let (b, c) = (pair[0], pair[1]);
            area += (b - a).cross(&(c - a)).norm() * 0.5;
            volume += ((a - inner).dot(&(b - inner).cross(&(c - inner))) / 6.0).abs();
        }
    }

    Some((volume, area))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> Vec<Point> {
        let mut points = Vec::new();
        for x in [0.0, 1.0] {
            for y in [0.0, 1.0] {
                for z in [0.0, 1.0] {
                    points.push(Point::new(x, y, z));
                }
            }
        }
        points
    }

    #[test]
    fn bounds_and_mean() {
        let points = [Point::new(1.0, -2.0, 3.0), Point::new(-1.0, 4.0, 5.0)];
        let bounds = Bounds::of(&points).unwrap();
        assert_eq!(bounds.min, [-1.0, -2.0, 3.0]);
        assert_eq!(bounds.max, [1.0, 4.0, 5.0]);
        assert_eq!(bounds.extent(), [2.0, 6.0, 2.0]);
        assert_eq!(mean_xyz(&points), Some([0.0, 1.0, 4.0]));
        assert!(Bounds::of(&[]).is_none());
    }

    #[test]
    fn height_stats_of_a_step() {
        let points = [
            Point::new(0.0, 0.0, -1.0),
            Point::new(1.0, 0.0, 1.0),
            Point::new(2.0, 0.0, -1.0),
            Point::new(3.0, 0.0, 1.0),
        ];
        let stats = height_stats(&points).unwrap();
        assert_eq!(stats.sa, 1.0);
        assert_eq!(stats.sq, 1.0);
        assert_eq!(stats.sz, 2.0);
    }

    #[test]
    fn pca_of_a_line_has_one_dominant_axis() {
        let points: Vec<Point> = (0..10).map(|i| Point::new(i as f64, 0.0, 0.0)).collect();
        let eig = pca_eigenvalues(&points).unwrap();
        assert!((eig[0] - 8.25).abs() < 1e-9);
        assert!(eig[1].abs() < 1e-9);
        assert!(eig[2].abs() < 1e-9);
    }

    #[test]
    fn pca_is_unavailable_when_covariance_overflows() {
        let points = [Point::new(1e200, 0.0, 0.0), Point::new(-1e200, 0.0, 0.0)];
        assert_eq!(pca_eigenvalues(&points), None);
        let points = [Point::new(f64::INFINITY, 0.0, 0.0), Point::new(0.0, 0.0, 0.0)];
        assert_eq!(pca_eigenvalues(&points), None);
    }

    #[test]
    fn sample_is_capped() {
        let points: Vec<Point> = (0..100).map(|i| Point::new(i as f64, 0.0, 0.0)).collect();
        assert_eq!(sample_for_hull(&points, 10).len(), 10);
        assert_eq!(sample_for_hull(&points, 1000).len(), 100);
    }

    #[test]
    fn unit_cube_hull() {
        let (volume, area) = hull_volume_area(sample_for_hull(&cube(), MAX_HULL_POINTS)).unwrap();
        assert!((volume - 1.0).abs() < 1e-9, "volume {volume}");
        assert!((area - 6.0).abs() < 1e-9, "area {area}");
    }

    #[test]
    fn too_few_points_for_a_hull() {
        assert!(hull_volume_area(vec![[0.0; 3], [1.0, 0.0, 0.0]]).is_none());
    }
}
