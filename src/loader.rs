use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};

use crate::mesh::ModelImport;
use crate::model::ModelRoot;

/// Starts asset decodes off the main thread.
///
/// Decoding runs on a named worker; the scene graph is only built when the owner polls the
/// returned [`PendingModel`], so every `Rc` material handle stays on the polling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModelLoader;

impl ModelLoader {
    pub fn load(path: impl AsRef<Path>) -> PendingModel {
        let path = path.as_ref().to_path_buf();
        let (tx, rx) = mpsc::channel();
        let worker_path = path.clone();
        let spawned = thread::Builder::new()
            .name("model-load".to_string())
            .spawn(move || {
                let result = ModelImport::load_gltf(&worker_path);
                // Receiver gone means the viewer was torn down first.
                let _ = tx.send(result);
            })
            .with_context(|| format!("spawn loader thread for {}", path.display()));
        match spawned {
            Ok(_) => {
                log::debug!("loading model {}", path.display());
                PendingModel { path, state: PendingState::Loading(rx) }
            }
            Err(err) => {
                log::warn!("model load failed: {err:#}");
                PendingModel { path, state: PendingState::Done }
            }
        }
    }
}

enum PendingState {
    Loading(mpsc::Receiver<Result<ModelImport>>),
    Done,
}

/// Handle to an in-flight load. Yields the model at most once.
///
/// Failures are logged and swallowed: the handle simply finishes without a model.
pub struct PendingModel {
    path: PathBuf,
    state: PendingState,
}

impl PendingModel {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, PendingState::Done)
    }

    /// Non-blocking check for completion.
    pub fn poll(&mut self) -> Option<ModelRoot> {
        let received = match &self.state {
            PendingState::Loading(rx) => match rx.try_recv() {
                Ok(result) => Some(result),
                Err(mpsc::TryRecvError::Empty) => return None,
                Err(mpsc::TryRecvError::Disconnected) => None,
            },
            PendingState::Done => return None,
        };
        self.finish(received)
    }

    /// Blocks until the worker reports back.
    pub fn wait(&mut self) -> Option<ModelRoot> {
        let received = match &self.state {
            PendingState::Loading(rx) => rx.recv().ok(),
            PendingState::Done => return None,
        };
        self.finish(received)
    }

    fn finish(&mut self, received: Option<Result<ModelImport>>) -> Option<ModelRoot> {
        self.state = PendingState::Done;
        match received {
            Some(Ok(import)) => {
                let root = ModelRoot::from_import(import);
                log::info!("loaded model {} ({} nodes)", self.path.display(), root.node_count());
                Some(root)
            }
            Some(Err(err)) => {
                log::warn!("model load failed: {err:#}");
                None
            }
            None => {
                log::warn!("model load failed: worker for {} exited without a result", self.path.display());
                None
            }
        }
    }
}

impl std::fmt::Debug for PendingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingModel").field("path", &self.path).field("finished", &self.is_finished()).finish()
    }
}
