//! Fitting an orthographic camera to a model.
//!
//! The pivot is centered on the single largest renderable part rather than on
//! the union of all parts. Models whose largest part does not cover the whole
//! object (a lamp whose shade is bigger than its base, say) are framed around
//! that part.

use glam::Vec3;

use crate::bounds::Aabb;
use crate::model::ModelInstance;
use crate::scene::Turntable;

/// Padding applied to the fitted extent.
pub const FRAMING_PADDING: f32 = 1.1;

/// Camera whose orthographic extent can be set by the framer.
pub trait OrthographicCamera {
    /// Current orthographic half-height.
    fn ortho_half_height(&self) -> f32;

    /// Sets the orthographic half-height.
    fn set_ortho_half_height(&mut self, half_height: f32);
}

/// Result of fitting a camera to a set of parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    /// Center of the largest part, or `None` when there are no parts.
    pub center: Option<Vec3>,
    /// Orthographic half-height including padding.
    pub half_height: f32,
}

impl Framing {
    /// Fits a framing to part bounds given in discovery order.
    pub fn compute(parts: &[Aabb]) -> Self {
        Self {
            center: largest_part(parts).map(|b| b.center()),
            half_height: largest_side(parts) / 2.0 * FRAMING_PADDING,
        }
    }
}

/// The part with the largest volume. The first one found wins ties.
fn largest_part(parts: &[Aabb]) -> Option<&Aabb> {
    let mut volume = 0.0;
    let mut biggest = None;
    for part in parts {
        let candidate = part.volume();
        if volume < candidate {
            volume = candidate;
            biggest = Some(part);
        }
    }
    // Flat parts all have zero volume; fall back to the first one.
    biggest.or_else(|| parts.first())
}

/// The largest single axis extent across all parts.
fn largest_side(parts: &[Aabb]) -> f32 {
    parts.iter().map(Aabb::max_side).fold(0.0, f32::max)
}

/// Centers the turntable on a model and sizes the camera to fit it.
#[derive(Debug, Default, Clone, Copy)]
pub struct CameraFramer;

impl CameraFramer {
    /// Frames `target`: moves the turntable pivot to the center of its
    /// largest part and sets the camera's orthographic extent.
    ///
    /// A model without renderable parts leaves the pivot where it is and
    /// gets a zero extent.
    pub fn frame(
        camera: &mut dyn OrthographicCamera,
        turntable: &mut Turntable,
        target: &ModelInstance,
    ) -> Framing {
        let parts: Vec<Aabb> = target.renderable_bounds().collect();
        let framing = Framing::compute(&parts);

        match framing.center {
            Some(center) => turntable.position = center,
            None => log::warn!("{} has no renderable parts to frame", target.name()),
        }
        camera.set_ortho_half_height(framing.half_height);

        log::debug!(
            "framed {}: pivot {:?}, half-height {:.3}",
            target.name(),
            turntable.position,
            framing.half_height
        );
        framing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mesh, ModelPrefab, PrefabNode};
    use glam::Quat;
    use proptest::prelude::*;

    #[derive(Default)]
    struct TestCamera {
        half_height: f32,
    }

    impl OrthographicCamera for TestCamera {
        fn ortho_half_height(&self) -> f32 {
            self.half_height
        }

        fn set_ortho_half_height(&mut self, half_height: f32) {
            self.half_height = half_height;
        }
    }

    fn model(parts: &[(Vec3, Vec3)]) -> ModelInstance {
        let mut root = PrefabNode::new("root");
        for (i, (center, size)) in parts.iter().enumerate() {
            root = root.with_child(PrefabNode::with_mesh(format!("part{i}"), Mesh::cuboid(*center, *size)));
        }
        ModelPrefab::new("Model", root).instantiate(Vec3::ZERO, Vec3::ZERO, Quat::IDENTITY)
    }

    #[test]
    fn test_single_part_extent() {
        let target = model(&[(Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0))]);
        let mut camera = TestCamera::default();
        let mut turntable = Turntable::default();

        let framing = CameraFramer::frame(&mut camera, &mut turntable, &target);
        assert!((framing.half_height - 3.3).abs() < 1e-5);
        assert!((camera.ortho_half_height() - 3.3).abs() < 1e-5);
    }

    #[test]
    fn test_centers_on_largest_part_in_either_order() {
        let small = (Vec3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 5.0)); // volume 10
        let large = (Vec3::new(3.0, 1.0, 0.0), Vec3::new(5.0, 5.0, 2.0)); // volume 50

        for parts in [[small, large], [large, small]] {
            let target = model(&parts);
            let mut camera = TestCamera::default();
            let mut turntable = Turntable::default();
            CameraFramer::frame(&mut camera, &mut turntable, &target);
            assert_eq!(turntable.position, Vec3::new(3.0, 1.0, 0.0));
            assert!((camera.ortho_half_height() - 2.75).abs() < 1e-5);
        }
    }

    #[test]
    fn test_first_part_wins_ties() {
        let a = Aabb::from_center_size(Vec3::X, Vec3::ONE);
        let b = Aabb::from_center_size(Vec3::Y, Vec3::ONE);
        assert_eq!(Framing::compute(&[a, b]).center, Some(Vec3::X));
        assert_eq!(Framing::compute(&[b, a]).center, Some(Vec3::Y));
    }

    #[test]
    fn test_no_parts_gives_zero_extent() {
        let target = ModelPrefab::new("Empty", PrefabNode::new("root"))
            .instantiate(Vec3::ZERO, Vec3::ZERO, Quat::IDENTITY);
        let mut camera = TestCamera { half_height: 7.0 };
        let mut turntable = Turntable {
            position: Vec3::ONE,
            ..Default::default()
        };

        let framing = CameraFramer::frame(&mut camera, &mut turntable, &target);
        assert_eq!(framing.center, None);
        assert_eq!(camera.ortho_half_height(), 0.0);
        assert_eq!(turntable.position, Vec3::ONE);
    }

    #[test]
    fn test_largest_side_spans_all_parts() {
        // The tall part is not the biggest by volume but still sets the extent.
        let wide = Aabb::from_center_size(Vec3::ZERO, Vec3::new(3.0, 3.0, 3.0));
        let tall = Aabb::from_center_size(Vec3::ZERO, Vec3::new(0.1, 8.0, 0.1));
        let framing = Framing::compute(&[wide, tall]);
        assert_eq!(framing.center, Some(Vec3::ZERO));
        assert!((framing.half_height - 4.4).abs() < 1e-5);
    }

    fn size_strategy() -> impl Strategy<Value = Vec3> {
        (0.1f32..10.0, 0.1f32..10.0, 0.1f32..10.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn prop_extent_is_padded_half_of_largest_side(sizes in prop::collection::vec(size_strategy(), 1..6)) {
            let parts: Vec<Aabb> = sizes.iter().map(|s| Aabb::from_center_size(Vec3::ZERO, *s)).collect();
            let largest = sizes.iter().map(|s| s.max_element()).fold(0.0, f32::max);
            let framing = Framing::compute(&parts);
            prop_assert!((framing.half_height - largest * 0.55).abs() < 1e-4);
        }

        #[test]
        fn prop_center_ignores_order_when_largest_is_unique(
            sizes in prop::collection::vec(size_strategy(), 2..6),
            rotate in 0usize..6,
        ) {
            let parts: Vec<Aabb> = sizes
                .iter()
                .enumerate()
                .map(|(i, s)| Aabb::from_center_size(Vec3::new(i as f32 * 10.0, 0.0, 0.0), *s))
                .collect();
            let mut volumes: Vec<f32> = parts.iter().map(Aabb::volume).collect();
            volumes.sort_by(f32::total_cmp);
            prop_assume!(volumes[volumes.len() - 1] > volumes[volumes.len() - 2]);

            let mut rotated = parts.clone();
            rotated.rotate_left(rotate % parts.len());
            prop_assert_eq!(Framing::compute(&parts).center, Framing::compute(&rotated).center);
        }
    }
}
