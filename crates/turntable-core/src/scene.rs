//! The single-instance scene and its turntable pivot.

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::error::{Result, TurntableError};
use crate::model::ModelInstance;

/// The pivot the subject is rotated around and the camera looks at.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Turntable {
    /// Pivot position in world space.
    pub position: Vec3,
    /// Euler rotation in degrees (x, y, z).
    pub rotation: Vec3,
}

impl Turntable {
    /// Rotation as a quaternion (Y, then X, then Z, matching yaw-pitch-roll).
    pub fn orientation(&self) -> Quat {
        let r = self.rotation;
        Quat::from_euler(
            EulerRot::YXZ,
            r.y.to_radians(),
            r.x.to_radians(),
            r.z.to_radians(),
        )
    }

    /// Transform that rotates geometry about the pivot.
    pub fn subject_transform(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_quat(self.orientation())
            * Mat4::from_translation(-self.position)
    }
}

/// Holds at most one live [`ModelInstance`].
///
/// Every spawn or despawn bumps [`Scene::generation`] so renderers can tell
/// when their GPU copy is stale.
#[derive(Debug, Default)]
pub struct Scene {
    anchor: Vec3,
    /// The pivot rotated between capture steps.
    pub turntable: Turntable,
    active: Option<ModelInstance>,
    generation: u64,
    spawned_total: usize,
}

impl Scene {
    /// Creates an empty scene whose instances are parented under `anchor`.
    pub fn new(anchor: Vec3) -> Self {
        Self {
            anchor,
            ..Default::default()
        }
    }

    /// Position new instances are parented under.
    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    /// Places `instance` in the scene.
    ///
    /// Fails if another instance is still alive; the caller must destroy it
    /// first.
    pub fn spawn(&mut self, instance: ModelInstance) -> Result<()> {
        if let Some(active) = &self.active {
            return Err(TurntableError::InstanceStillActive(active.name().to_string()));
        }
        log::debug!("spawned {}", instance.name());
        self.active = Some(instance);
        self.generation += 1;
        self.spawned_total += 1;
        Ok(())
    }

    /// Destroys the active instance, if any, and returns it.
    pub fn despawn(&mut self) -> Option<ModelInstance> {
        let instance = self.active.take()?;
        log::debug!("destroyed {}", instance.name());
        self.generation += 1;
        Some(instance)
    }

    /// The live instance.
    pub fn active(&self) -> Option<&ModelInstance> {
        self.active.as_ref()
    }

    /// Returns true if an instance is alive.
    pub fn has_active(&self) -> bool {
        self.active.is_some()
    }

    /// Counter bumped on every spawn and despawn.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of instances spawned over the scene's lifetime.
    pub fn spawned_total(&self) -> usize {
        self.spawned_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mesh, ModelPrefab, PrefabNode};

    fn instance(name: &str) -> ModelInstance {
        ModelPrefab::new(name, PrefabNode::with_mesh("m", Mesh::cuboid(Vec3::ZERO, Vec3::ONE)))
            .instantiate(Vec3::ZERO, Vec3::ZERO, Quat::IDENTITY)
    }

    #[test]
    fn test_spawn_rejects_second_instance() {
        let mut scene = Scene::default();
        scene.spawn(instance("A")).unwrap();
        let err = scene.spawn(instance("B")).unwrap_err();
        assert!(matches!(err, TurntableError::InstanceStillActive(name) if name == "A(Clone)"));

        assert_eq!(scene.despawn().unwrap().name(), "A(Clone)");
        scene.spawn(instance("B")).unwrap();
        assert_eq!(scene.active().unwrap().name(), "B(Clone)");
        assert_eq!(scene.spawned_total(), 2);
    }

    #[test]
    fn test_generation_tracks_changes() {
        let mut scene = Scene::default();
        assert_eq!(scene.generation(), 0);
        scene.spawn(instance("A")).unwrap();
        assert_eq!(scene.generation(), 1);
        scene.despawn();
        assert_eq!(scene.generation(), 2);
        assert!(scene.despawn().is_none());
        assert_eq!(scene.generation(), 2);
    }

    #[test]
    fn test_turntable_rotates_about_pivot() {
        let turntable = Turntable {
            position: Vec3::new(1.0, 0.0, 0.0),
            rotation: Vec3::new(0.0, 180.0, 0.0),
        };
        let m = turntable.subject_transform();
        // The pivot is fixed; a point one unit to its right ends up one unit to its left.
        assert!((m.transform_point3(Vec3::new(1.0, 0.0, 0.0)) - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        assert!((m.transform_point3(Vec3::new(2.0, 0.0, 0.0)) - Vec3::new(0.0, 0.0, 0.0)).length() < 1e-5);
    }
}
