mod application;
mod canvas;
pub(crate) mod types;

pub use types::*;

use crate::config::LayoutConfig;
use crate::graph::build_graph;
use crate::group::group_components;
use crate::snapshot::Snapshot;

/// Full pipeline for one snapshot: infer relationships, resolve shared
/// references, group components into Applications, lay each out, pack the
/// canvas. Pure and synchronous; rerun in full on every refresh.
pub fn compute_scene(snapshot: &Snapshot, config: &LayoutConfig) -> Scene {
    let graph = build_graph(snapshot);
    let groups = group_components(snapshot, &graph);
    tracing::debug!(
        records = snapshot.len(),
        edges = graph.edges.len(),
        applications = groups.len(),
        "computing scene"
    );

    let mut applications: Vec<ApplicationLayout> = groups
        .iter()
        .map(|group| application::layout_application(group, snapshot, &graph, config))
        .collect();
    let (width, height) = canvas::pack_canvas(&mut applications, config);

    Scene {
        applications,
        width,
        height,
    }
}
