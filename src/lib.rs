#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod graph;
pub mod group;
pub mod layout;
pub mod resource;
pub mod scene_dump;
pub mod snapshot;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{LayoutConfig, load_config};
pub use layout::{Scene, compute_scene};
pub use snapshot::{Snapshot, SnapshotError, parse_snapshot, parse_snapshot_str};
