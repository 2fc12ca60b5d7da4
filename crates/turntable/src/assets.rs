//! Asynchronous model loading.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use glam::Vec3;
use tokio::task::JoinHandle;

use turntable_core::{AssetReference, AssetSource, LoadError, Mesh, ModelPrefab, PrefabNode};

/// Prefabs currently held by the store, with their outstanding handles.
type Resident = Arc<Mutex<HashMap<AssetReference, (Arc<ModelPrefab>, usize)>>>;

/// Loads prefabs off the scheduler thread and tracks which are resident.
///
/// A prefab stays resident until every [`LoadedAsset`] for it has been
/// passed back to [`AssetStore::release`].
pub struct AssetStore<S: AssetSource> {
    source: Arc<S>,
    resident: Resident,
}

impl<S: AssetSource> AssetStore<S> {
    /// Creates a store reading through `source`.
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            resident: Arc::default(),
        }
    }

    /// Starts loading `reference` on the blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load_async(&self, reference: &AssetReference) -> LoadHandle {
        let source = Arc::clone(&self.source);
        let task_reference = reference.clone();
        let task = tokio::task::spawn_blocking(move || source.load(&task_reference));
        LoadHandle {
            reference: reference.clone(),
            task,
            resident: Arc::clone(&self.resident),
        }
    }

    /// Gives a loaded asset back. The prefab is dropped once no handle
    /// refers to it.
    pub fn release(&self, asset: LoadedAsset) {
        let mut resident = self.resident.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, handles)) = resident.get_mut(&asset.reference) {
            *handles -= 1;
            if *handles == 0 {
                resident.remove(&asset.reference);
                log::debug!("released {}", asset.reference);
            }
        }
    }

    /// Number of prefabs currently resident.
    pub fn resident_count(&self) -> usize {
        self.resident
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// A load in progress.
pub struct LoadHandle {
    reference: AssetReference,
    task: JoinHandle<Result<ModelPrefab, LoadError>>,
    resident: Resident,
}

impl LoadHandle {
    /// The reference being loaded.
    pub fn reference(&self) -> &AssetReference {
        &self.reference
    }

    /// Waits for the load to finish.
    pub async fn completed(self) -> Result<LoadedAsset, LoadError> {
        let prefab = self
            .task
            .await
            .map_err(|e| LoadError::TaskFailed(e.to_string()))??;

        let prefab = Arc::new(prefab);
        let mut resident = self.resident.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = resident
            .entry(self.reference.clone())
            .or_insert_with(|| (Arc::clone(&prefab), 0));
        entry.0 = Arc::clone(&prefab);
        entry.1 += 1;

        Ok(LoadedAsset {
            reference: self.reference,
            prefab,
        })
    }
}

/// A finished load.
#[derive(Debug)]
pub struct LoadedAsset {
    reference: AssetReference,
    prefab: Arc<ModelPrefab>,
}

impl LoadedAsset {
    /// The reference that was loaded.
    pub fn reference(&self) -> &AssetReference {
        &self.reference
    }

    /// The loaded prefab.
    pub fn prefab(&self) -> &ModelPrefab {
        &self.prefab
    }
}

/// Reads Wavefront OBJ files.
///
/// Every object in the file becomes a child node of a root named after the
/// file stem. Faces are triangulated; missing normals are computed.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjSource;

impl AssetSource for ObjSource {
    fn load(&self, reference: &AssetReference) -> Result<ModelPrefab, LoadError> {
        let path = reference.path();
        std::fs::metadata(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let name = reference.name();
        let mut root = PrefabNode::new(name.clone());
        for model in models {
            let mesh = mesh_from_obj(&model.mesh);
            if mesh.is_empty() {
                log::debug!("{}: skipping empty object '{}'", reference, model.name);
                continue;
            }
            root = root.with_child(PrefabNode::with_mesh(model.name, mesh));
        }

        let prefab = ModelPrefab::new(name, root);
        if prefab.renderable_count() == 0 {
            return Err(LoadError::EmptyModel(path.to_path_buf()));
        }
        Ok(prefab)
    }
}

fn mesh_from_obj(mesh: &tobj::Mesh) -> Mesh {
    let positions = mesh
        .positions
        .chunks_exact(3)
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();
    let normals = mesh
        .normals
        .chunks_exact(3)
        .map(|n| Vec3::new(n[0], n[1], n[2]))
        .collect();
    Mesh::new(positions, normals, mesh.indices.clone())
}
