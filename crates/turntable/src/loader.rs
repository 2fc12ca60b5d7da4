//! Bringing catalog entries into the scene.

use glam::{Quat, Vec3};

use turntable_core::{AssetSource, LoadError, ModelCatalog, Result, TurntableError};

use crate::assets::AssetStore;
use crate::stage::Stage;

/// Replaces the scene's instance with a freshly loaded catalog entry.
pub struct ModelLoader<S: AssetSource> {
    store: AssetStore<S>,
}

impl<S: AssetSource> ModelLoader<S> {
    /// Creates a loader reading through `store`.
    pub fn new(store: AssetStore<S>) -> Self {
        Self { store }
    }

    /// The underlying asset store.
    pub fn store(&self) -> &AssetStore<S> {
        &self.store
    }

    /// Loads catalog entry `index` and spawns it at the origin with identity
    /// rotation. Returns the new instance's name.
    ///
    /// The previous instance is destroyed before the load starts. Load
    /// failures are returned as [`TurntableError::Load`]; the scene is then
    /// left empty.
    pub async fn load<St: Stage + ?Sized>(
        &self,
        stage: &mut St,
        catalog: &ModelCatalog,
        index: usize,
    ) -> Result<String> {
        let reference = catalog
            .reference_at(index)
            .ok_or_else(|| TurntableError::Load {
                reference: format!("#{index}"),
                source: LoadError::OutOfRange {
                    index,
                    count: catalog.count(),
                },
            })?;

        stage.scene_mut().despawn();

        log::info!("loading {reference} ({}/{})", index + 1, catalog.count());
        let asset = self
            .store
            .load_async(reference)
            .completed()
            .await
            .map_err(|source| TurntableError::Load {
                reference: reference.to_string(),
                source,
            })?;

        let scene = stage.scene_mut();
        let instance = asset
            .prefab()
            .instantiate(scene.anchor(), Vec3::ZERO, Quat::IDENTITY);
        self.store.release(asset);

        let name = instance.name().to_string();
        scene.spawn(instance)?;
        Ok(name)
    }
}
