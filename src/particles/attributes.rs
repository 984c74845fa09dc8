//! Per-particle attribute generation.

use rand::Rng;

/// Parallel per-particle attribute arrays, aligned 1:1 with a point set.
///
/// Generated once from a pseudo-random source when the owning renderer's
/// points become available; read-only afterwards.
#[derive(Debug, Clone)]
pub struct ParticleAttributes {
    /// Per-particle random seed in [0, 1).
    seeds: Vec<f32>,
    /// Per-particle speed scalar (dust only; empty for head particles).
    speeds: Vec<f32>,
}

impl ParticleAttributes {
    /// Generate seeds for `count` particles.
    pub fn seeds_only(count: usize, rng: &mut impl Rng) -> Self {
        Self {
            seeds: (0..count).map(|_| rng.gen_range(0.0..1.0)).collect(),
            speeds: Vec::new(),
        }
    }

    /// Generate seeds plus a speed scalar in `speed_range` per particle.
    pub fn with_speeds(
        count: usize,
        speed_range: std::ops::Range<f32>,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            seeds: (0..count).map(|_| rng.gen_range(0.0..1.0)).collect(),
            speeds: (0..count)
                .map(|_| rng.gen_range(speed_range.clone()))
                .collect(),
        }
    }

    /// Number of particles covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// Whether there are no attributes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// The seed array.
    #[inline]
    pub fn seeds(&self) -> &[f32] {
        &self.seeds
    }

    /// The speed array (empty unless generated with speeds).
    #[inline]
    pub fn speeds(&self) -> &[f32] {
        &self.speeds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_seed_range_and_alignment() {
        let mut rng = StdRng::seed_from_u64(3);
        let attrs = ParticleAttributes::seeds_only(1000, &mut rng);
        assert_eq!(attrs.len(), 1000);
        assert!(attrs.seeds().iter().all(|s| (0.0..1.0).contains(s)));
        assert!(attrs.speeds().is_empty());
    }

    #[test]
    fn test_speeds_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let attrs = ParticleAttributes::with_speeds(300, 0.5..2.0, &mut rng);
        assert_eq!(attrs.speeds().len(), 300);
        assert!(attrs.speeds().iter().all(|s| (0.5..2.0).contains(s)));
    }
}
