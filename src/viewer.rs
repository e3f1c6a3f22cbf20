//! Composition root for the viewport: scene, asset load, registry and selection wiring.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use crate::classifier::{classify, ClassificationReport};
use crate::color_applier::ColorApplier;
use crate::config::ViewerConfig;
use crate::loader::{ModelLoader, PendingModel};
use crate::material_registry::MaterialRegistry;
use crate::model::ModelRoot;
use crate::palette::ColorTable;
use crate::part::PartCategory;
use crate::scene::{SceneContext, SceneManager, SurfaceSize};
use crate::selection::{SelectionChannel, Subscription};

pub struct ViewerController {
    channel: Rc<SelectionChannel>,
    registry: Rc<RefCell<MaterialRegistry>>,
    active_part: Rc<Cell<Option<PartCategory>>>,
    scene: SceneContext,
    pending: Option<PendingModel>,
    classification: Option<ClassificationReport>,
    _subscriptions: [Subscription; 2],
}

impl ViewerController {
    /// Builds the scene, starts the model load and subscribes to both selection streams.
    ///
    /// Subscribing replays the channel's current part and colour, so the active part starts
    /// at whatever the channel holds (`"car"` for a fresh channel).
    pub fn initialize(
        config: &ViewerConfig,
        channel: Rc<SelectionChannel>,
        size: SurfaceSize,
        device_scale_factor: f64,
    ) -> Self {
        let scene = SceneManager::from_config(&config.render, device_scale_factor).initialize(size);
        let pending = ModelLoader::load(&config.model.path);
        let registry = Rc::new(RefCell::new(MaterialRegistry::new()));
        let active_part = Rc::new(Cell::new(None));

        let part_subscription = {
            let active_part = active_part.clone();
            channel.part().subscribe(move |name| {
                let category = PartCategory::from_part_name(name);
                if category.is_none() {
                    log::debug!("unknown part '{name}', colour changes ignored until a known part is selected");
                }
                active_part.set(category);
            })
        };
        let color_subscription = {
            let active_part = active_part.clone();
            let registry = registry.clone();
            channel.color().subscribe(move |color| {
                let Some(category) = active_part.get() else {
                    return;
                };
                let touched = ColorApplier.apply(&registry.borrow(), category, color);
                log::debug!("applied '{color}' to {touched} {category} material(s)");
            })
        };

        Self {
            channel,
            registry,
            active_part,
            scene,
            pending: Some(pending),
            classification: None,
            _subscriptions: [part_subscription, color_subscription],
        }
    }

    pub fn select_part(&self, name: &str) {
        self.channel.select_part(name);
    }

    pub fn select_color(&self, name: &str) {
        self.channel.select_color(name);
    }

    /// Publishes `part` then `color` back to back.
    pub fn select(&self, part: &str, color: &str) {
        self.channel.select(part, color);
    }

    /// Moves the colour selection `offset` entries through the active part's palette.
    /// Returns the published colour name.
    pub fn step_color(&self, offset: isize) -> Option<&'static str> {
        let category = self.active_part.get()?;
        let entries = ColorTable::entries(category);
        let current = self.channel.current_color();
        let index = entries.iter().position(|entry| entry.name == current);
        let len = entries.len() as isize;
        let next = match index {
            Some(index) => (index as isize + offset).rem_euclid(len),
            None if offset >= 0 => 0,
            None => len - 1,
        };
        let name = entries[next as usize].name;
        self.channel.select_color(name);
        Some(name)
    }

    /// Non-blocking: classifies and attaches the model once the loader finishes.
    /// Returns `true` on the call that attached it.
    pub fn poll_model(&mut self) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        let loaded = pending.poll();
        if pending.is_finished() {
            self.pending = None;
        }
        loaded.map(|root| self.attach(root)).unwrap_or(false)
    }

    /// Blocks until the load finishes. Returns whether a model is attached afterwards.
    pub fn wait_for_model(&mut self) -> bool {
        if let Some(mut pending) = self.pending.take() {
            if let Some(root) = pending.wait() {
                self.attach(root);
            }
        }
        self.scene.model.is_some()
    }

    fn attach(&mut self, root: ModelRoot) -> bool {
        let report = classify(&root, &mut self.registry.borrow_mut());
        log::info!(
            "classified {} meshes: body {}, brake {}, seats {}, rim {}, unclassified {}",
            report.meshes_visited,
            report.matches_for(PartCategory::Body),
            report.matches_for(PartCategory::BrakeDisc),
            report.matches_for(PartCategory::Seat),
            report.matches_for(PartCategory::Rim),
            report.unclassified.len()
        );
        self.classification = Some(report);
        SceneManager::attach_model(&mut self.scene, root);
        true
    }

    pub fn resize(&mut self, size: SurfaceSize) {
        SceneManager::resize(&mut self.scene, size);
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn scene(&self) -> &SceneContext {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneContext {
        &mut self.scene
    }

    pub fn registry(&self) -> Ref<'_, MaterialRegistry> {
        self.registry.borrow()
    }

    pub fn active_part(&self) -> Option<PartCategory> {
        self.active_part.get()
    }

    pub fn channel(&self) -> &Rc<SelectionChannel> {
        &self.channel
    }

    pub fn classification(&self) -> Option<&ClassificationReport> {
        self.classification.as_ref()
    }
}
