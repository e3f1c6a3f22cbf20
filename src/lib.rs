pub mod app;
pub mod camera3d;
pub mod classifier;
pub mod cli;
pub mod color_applier;
pub mod config;
pub mod input;
pub mod loader;
pub mod material;
pub mod material_registry;
pub mod mesh;
pub mod model;
pub mod palette;
pub mod part;
pub mod render_loop;
pub mod renderer;
pub mod scene;
pub mod selection;
pub mod time;
pub mod viewer;

pub use app::{run, run_with_overrides, App};
pub use part::PartCategory;
pub use selection::SelectionChannel;
pub use viewer::ViewerController;
