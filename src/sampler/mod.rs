//! # Mesh Sampler
//!
//! Turns an arbitrary loaded mesh into the fixed-size, origin-centered
//! point set the particle cloud renders: extract positions through the
//! node hierarchy, stratified-subsample down to the particle budget,
//! normalize into a target radius. When anything about the source goes
//! wrong, a Fibonacci-sphere fallback is substituted so the renderer is
//! never left without points.

use std::path::Path;

use rand::Rng;

use crate::loaders::{self, LoadedScene};
use crate::math::{Box3, Vector3};

/// An ordered, fixed-size sequence of 3D positions.
///
/// Built once by the sampler and immutable afterwards; the consuming
/// renderer owns it exclusively.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet(Vec<Vector3>);

impl PointSet {
    /// Wrap a vector of positions.
    pub fn new(points: Vec<Vector3>) -> Self {
        Self(points)
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The points as a slice.
    #[inline]
    pub fn points(&self) -> &[Vector3] {
        &self.0
    }

    /// Consume into the underlying vector.
    pub fn into_inner(self) -> Vec<Vector3> {
        self.0
    }
}

/// Extract world-space positions from every mesh in a loaded scene.
///
/// Hierarchical sources have each mesh's positions transformed by its
/// accumulated world transform, concatenated in traversal order.
/// Returns `None` when no position data exists anywhere in the source —
/// an absence, not an error.
pub fn extract_positions(scene: &LoadedScene) -> Option<PointSet> {
    let mut points = Vec::with_capacity(scene.total_vertices());
    scene.visit_meshes(|mesh, world| {
        for p in &mesh.geometry.positions {
            points.push(world.transform_point(&Vector3::from_array(*p)));
        }
    });

    if points.is_empty() {
        None
    } else {
        Some(PointSet(points))
    }
}

/// Subsample a point set down to at most `max_count` points.
///
/// Sets within the budget are returned unchanged. Larger sets are
/// stratified: `max_count` contiguous buckets, one randomized pick per
/// bucket. This keeps spatial coverage even where uniform random
/// sampling would clump.
pub fn sample(points: PointSet, max_count: usize, rng: &mut impl Rng) -> PointSet {
    let n = points.len();
    if n <= max_count || max_count == 0 {
        return points;
    }

    let source = points.0;
    let step = n as f64 / max_count as f64;
    let mut picked = Vec::with_capacity(max_count);
    for bucket in 0..max_count {
        let start = (bucket as f64 * step) as usize;
        let end = (((bucket + 1) as f64 * step) as usize).min(n);
        let offset = rng.gen_range(start..end.max(start + 1));
        picked.push(source[offset.min(n - 1)]);
    }
    PointSet(picked)
}

/// Translate and uniformly scale a point set so its bounding box is
/// centered at the origin and the whole set fits within a sphere of
/// `target_radius`. Aspect ratio is preserved: one scalar for all axes,
/// `2 * target_radius / max_extent`.
pub fn normalize(points: PointSet, target_radius: f32) -> PointSet {
    let bounds = Box3::from_points(&points.0);
    if bounds.is_empty() {
        return points;
    }

    let center = bounds.center();
    let max_extent = bounds.max_extent();
    let scale = if max_extent > 0.0 {
        (2.0 * target_radius) / max_extent
    } else {
        1.0
    };

    PointSet(
        points
            .0
            .into_iter()
            .map(|p| (p - center) * scale)
            .collect(),
    )
}

/// Fraction of the base radius each fallback point may deviate by.
const FALLBACK_RADIUS_JITTER: f32 = 0.15;

/// Generate `count` points on a jittered Fibonacci sphere.
///
/// The golden-angle spiral gives even angular spread; each point's
/// radius is independently perturbed by up to ±15% of `base_radius` so
/// the result reads as a cloud rather than a perfect shell.
pub fn fallback(count: usize, base_radius: f32, rng: &mut impl Rng) -> PointSet {
    let golden = std::f32::consts::PI * (1.0 + 5.0f32.sqrt());
    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let phi = (1.0 - 2.0 * (i as f32 + 0.5) / count as f32).acos();
        let theta = golden * i as f32;
        let jitter = 1.0 + rng.gen_range(-FALLBACK_RADIUS_JITTER..=FALLBACK_RADIUS_JITTER);
        let r = base_radius * jitter;
        points.push(Vector3::new(
            r * phi.sin() * theta.cos(),
            r * phi.sin() * theta.sin(),
            r * phi.cos(),
        ));
    }
    PointSet(points)
}

/// Load a mesh from `path` and reduce it to a render-ready point set:
/// extract, stratified-sample to `count`, normalize to `radius`.
///
/// Every failure mode — unsupported format, load failure, empty
/// extraction — logs a warning and substitutes [`fallback`]. The
/// returned set is always usable.
pub fn load_point_set(path: &Path, count: usize, radius: f32, rng: &mut impl Rng) -> PointSet {
    let scene = match loaders::load_scene(path) {
        Ok(scene) => scene,
        Err(e) => {
            log::warn!("particle mesh load failed ({e}), using fallback sphere");
            return fallback(count, radius, rng);
        }
    };

    let Some(points) = extract_positions(&scene) else {
        log::warn!(
            "no position data in {}, using fallback sphere",
            path.display()
        );
        return fallback(count, radius, rng);
    };

    log::debug!(
        "sampling {} of {} vertices from {}",
        count.min(points.len()),
        points.len(),
        path.display()
    );
    normalize(sample(points, count, rng), radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn line_of(n: usize) -> PointSet {
        PointSet::new((0..n).map(|i| Vector3::new(i as f32, 0.0, 0.0)).collect())
    }

    #[test]
    fn test_sample_identity_below_budget() {
        let points = line_of(100);
        let sampled = sample(points.clone(), 100, &mut rng());
        assert_eq!(sampled, points);
        let sampled = sample(points.clone(), 500, &mut rng());
        assert_eq!(sampled, points);
    }

    #[test]
    fn test_sample_exact_count_and_bucket_coverage() {
        let n = 10_000;
        let max_count = 137;
        let sampled = sample(line_of(n), max_count, &mut rng());
        assert_eq!(sampled.len(), max_count);

        // Each pick must come from its own contiguous bucket: the i-th
        // sampled point's source index (its x-coordinate, by
        // construction) lies inside the i-th bucket's range.
        let step = n as f64 / max_count as f64;
        for (i, p) in sampled.points().iter().enumerate() {
            let start = (i as f64 * step) as usize;
            let end = (((i + 1) as f64 * step) as usize).min(n);
            let index = p.x as usize;
            assert!(
                index >= start && index < end,
                "point {i} drawn from index {index}, outside [{start}, {end})"
            );
        }
    }

    #[test]
    fn test_normalize_fits_and_centers() {
        let points = PointSet::new(vec![
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(30.0, 4.0, -6.0),
            Vector3::new(20.0, -4.0, 6.0),
        ]);
        let radius = 2.0;
        let normalized = normalize(points, radius);

        for p in normalized.points() {
            assert!(p.length() <= radius * (1.0 + 1e-5), "point escapes sphere: {p:?}");
        }
        let bounds = Box3::from_points(normalized.points());
        assert!(bounds.center().approx_eq(&Vector3::ZERO, 1e-5));
        // Largest span maps exactly onto the sphere diameter.
        assert!((bounds.max_extent() - 2.0 * radius).abs() < 1e-5);
    }

    #[test]
    fn test_fallback_count_and_radius_band() {
        let base = 2.0;
        let count = 500;
        let points = fallback(count, base, &mut rng());
        assert_eq!(points.len(), count);
        for p in points.points() {
            let r = p.length();
            assert!(r >= 0.85 * base - 1e-5 && r <= 1.15 * base + 1e-5, "radius {r}");
        }
    }

    #[test]
    fn test_fallback_angular_spread() {
        let points = fallback(300, 1.0, &mut rng());
        // Consecutive points on the golden spiral never nearly coincide.
        for pair in points.points().windows(2) {
            assert!(pair[0].angle_to(&pair[1]) > 0.01);
        }
    }

    #[test]
    fn test_load_point_set_unsupported_format_falls_back() {
        let points = load_point_set(Path::new("disk.xyz"), 250, 2.0, &mut rng());
        assert_eq!(points.len(), 250);
    }

    #[test]
    fn test_load_point_set_samples_real_mesh() {
        use std::io::Write;

        // A grid of vertices well above the particle budget.
        let path = std::env::temp_dir().join("gyre_sampler_test.obj");
        let mut file = std::fs::File::create(&path).unwrap();
        for i in 0..60 {
            for j in 0..60 {
                writeln!(file, "v {} {} 0", i, j).unwrap();
            }
        }
        drop(file);

        let count = 1500;
        let radius = 2.0;
        let points = load_point_set(&path, count, radius, &mut rng());
        assert_eq!(points.len(), count);
        for p in points.points() {
            assert!(p.length() <= radius * (1.0 + 1e-4));
        }

        std::fs::remove_file(&path).ok();
    }
}
