use std::collections::{BTreeMap, BTreeSet};

use crate::config::LayoutConfig;
use crate::graph::RelationGraph;
use crate::group::AppGroup;
use crate::resource::{ResourceKind, ResourceRecord, Uid};
use crate::snapshot::Snapshot;

use super::types::{ApplicationLayout, BadgeRef, LayoutEdge, LayoutNode, NodeShape};

/// Lanes approximate left-to-right request flow: routing entry points first,
/// compute in the middle, configuration and policy at the end.
fn lane_for(kind: &ResourceKind) -> usize {
    match kind {
        ResourceKind::Ingress | ResourceKind::Gateway => 0,
        ResourceKind::HttpRoute | ResourceKind::GrpcRoute => 1,
        ResourceKind::Service => 2,
        ResourceKind::ConfigMap | ResourceKind::Secret | ResourceKind::PersistentVolumeClaim => 4,
        ResourceKind::NetworkPolicy => 5,
        _ => 3,
    }
}

fn is_compact(kind: &ResourceKind) -> bool {
    matches!(
        kind,
        ResourceKind::Service
            | ResourceKind::Gateway
            | ResourceKind::HttpRoute
            | ResourceKind::GrpcRoute
    )
}

pub(super) fn layout_application(
    group: &AppGroup,
    snapshot: &Snapshot,
    graph: &RelationGraph,
    config: &LayoutConfig,
) -> ApplicationLayout {
    let badge_configs: BTreeSet<&Uid> = graph.badges_of.values().flatten().collect();

    let mut lanes: BTreeMap<usize, Vec<LayoutNode>> = BTreeMap::new();
    let mut visible: BTreeSet<Uid> = BTreeSet::new();

    for uid in &group.members {
        let Some(record) = snapshot.get(uid) else {
            continue;
        };
        if graph.static_pods.contains(uid)
            || graph.host_of.contains_key(uid)
            || graph.is_intermediate_replicaset(uid, snapshot)
            || badge_configs.contains(uid)
        {
            continue;
        }
        let node = build_node(record, graph, snapshot, config);
        visible.insert(uid.clone());
        lanes.entry(node.lane).or_default().push(node);
    }

    let origin_y = config.title_bar + config.app_padding;
    let mut lane_x = config.app_padding;
    let mut extent_x = 0.0f32;
    let mut extent_y = 0.0f32;
    let mut nodes = Vec::new();

    for lane_nodes in lanes.values_mut() {
        lane_nodes.sort_by(|a, b| {
            a.record
                .name
                .cmp(&b.record.name)
                .then_with(|| a.uid.cmp(&b.uid))
        });
        let lane_width = lane_nodes
            .iter()
            .map(|node| node.width)
            .fold(0.0f32, f32::max);

        let mut y_cursor = origin_y;
        for node in lane_nodes.iter_mut() {
            node.x = lane_x + (lane_width - node.width) / 2.0;
            node.y = y_cursor;
            extent_x = extent_x.max(node.x + node.width);
            extent_y = extent_y.max(node.y + node.height);
            y_cursor += node.height + config.node_gap;
        }
        nodes.append(lane_nodes);
        lane_x += lane_width + config.lane_gap;
    }

    let edges = restrict_edges(group, graph, &visible);

    ApplicationLayout {
        id: group.id(),
        name: group.name.clone(),
        namespace: group.namespace.clone(),
        x: 0.0,
        y: 0.0,
        width: extent_x + config.app_padding,
        height: extent_y + config.app_padding,
        nodes,
        edges,
    }
}

fn build_node(
    record: &ResourceRecord,
    graph: &RelationGraph,
    snapshot: &Snapshot,
    config: &LayoutConfig,
) -> LayoutNode {
    let lane = lane_for(&record.kind);

    if is_compact(&record.kind) {
        return plain_node(record, NodeShape::Compact, lane, config.compact_size, config.compact_size);
    }
    match record.kind {
        ResourceKind::Ingress => {
            return plain_node(record, NodeShape::Ingress, lane, config.node_width, config.node_height);
        }
        ResourceKind::NetworkPolicy => {
            return plain_node(
                record,
                NodeShape::NetworkPolicy,
                lane,
                config.node_width,
                config.node_height,
            );
        }
        _ => {}
    }

    let pods: Vec<&ResourceRecord> = graph
        .pods_of
        .get(&record.uid)
        .map(|uids| uids.iter().filter_map(|uid| snapshot.get(uid)).collect())
        .unwrap_or_default();
    let badges: Vec<&ResourceRecord> = graph
        .badges_of
        .get(&record.uid)
        .map(|uids| uids.iter().filter_map(|uid| snapshot.get(uid)).collect())
        .unwrap_or_default();

    if pods.is_empty() && badges.is_empty() {
        return plain_node(record, NodeShape::Standard, lane, config.node_width, config.node_height);
    }
    build_controller_node(record, pods, badges, lane, config)
}

fn plain_node(
    record: &ResourceRecord,
    shape: NodeShape,
    lane: usize,
    width: f32,
    height: f32,
) -> LayoutNode {
    LayoutNode {
        uid: record.uid.clone(),
        record: record.clone(),
        shape,
        lane,
        x: 0.0,
        y: 0.0,
        width,
        height,
        children: Vec::new(),
        badges: Vec::new(),
    }
}

fn wrapped_extent(count: usize, per_row: usize, size: f32, gap: f32) -> (f32, f32) {
    if count == 0 {
        return (0.0, 0.0);
    }
    let per_row = per_row.max(1);
    let cols = count.min(per_row);
    let rows = count.div_ceil(per_row);
    let width = cols as f32 * size + (cols - 1) as f32 * gap;
    let height = rows as f32 * size + (rows - 1) as f32 * gap;
    (width, height)
}

fn build_controller_node(
    record: &ResourceRecord,
    mut pods: Vec<&ResourceRecord>,
    mut badges: Vec<&ResourceRecord>,
    lane: usize,
    config: &LayoutConfig,
) -> LayoutNode {
    pods.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.uid.cmp(&b.uid)));
    badges.sort_by(|a, b| {
        a.kind
            .as_str()
            .cmp(b.kind.as_str())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.uid.cmp(&b.uid))
    });

    let (pod_row_width, pods_height) =
        wrapped_extent(pods.len(), config.pods_per_row, config.pod_size, config.pod_gap);
    let (badge_row_width, badges_height) = wrapped_extent(
        badges.len(),
        config.badges_per_row,
        config.badge_size,
        config.badge_gap,
    );

    let content_width = pod_row_width.max(badge_row_width);
    let width = (content_width + 2.0 * config.controller_padding).max(config.node_width);

    let badges_y = config.controller_header
        + if pods.is_empty() {
            0.0
        } else {
            pods_height + config.badge_gap
        };
    let content_bottom = if badges.is_empty() {
        config.controller_header + pods_height
    } else {
        badges_y + badges_height
    };
    let height = content_bottom + config.controller_padding;

    let children = pods
        .iter()
        .enumerate()
        .map(|(idx, pod)| {
            let row = idx / config.pods_per_row.max(1);
            let col = idx % config.pods_per_row.max(1);
            let mut node = plain_node(pod, NodeShape::Compact, lane, config.pod_size, config.pod_size);
            node.x = config.controller_padding + col as f32 * (config.pod_size + config.pod_gap);
            node.y = config.controller_header + row as f32 * (config.pod_size + config.pod_gap);
            node
        })
        .collect();

    let badge_refs = badges
        .iter()
        .enumerate()
        .map(|(idx, badge)| {
            let row = idx / config.badges_per_row.max(1);
            let col = idx % config.badges_per_row.max(1);
            BadgeRef {
                uid: badge.uid.clone(),
                kind: badge.kind.clone(),
                name: badge.name.clone(),
                x: config.controller_padding + col as f32 * (config.badge_size + config.badge_gap),
                y: badges_y + row as f32 * (config.badge_size + config.badge_gap),
            }
        })
        .collect();

    LayoutNode {
        uid: record.uid.clone(),
        record: record.clone(),
        shape: NodeShape::ControllerWithPods,
        lane,
        x: 0.0,
        y: 0.0,
        width,
        height,
        children,
        badges: badge_refs,
    }
}

/// Restrict graph edges to one Application's visible nodes. Endpoints on a
/// nested pod collapse onto the hosting controller; edges that then become
/// controller-internal are suppressed.
fn restrict_edges(
    group: &AppGroup,
    graph: &RelationGraph,
    visible: &BTreeSet<Uid>,
) -> Vec<LayoutEdge> {
    let members: BTreeSet<&Uid> = group.members.iter().collect();
    let remap = |uid: &Uid| -> Option<Uid> {
        if visible.contains(uid) {
            return Some(uid.clone());
        }
        graph
            .host_of
            .get(uid)
            .filter(|host| visible.contains(*host))
            .cloned()
    };

    let mut seen = BTreeSet::new();
    let mut edges = Vec::new();
    for edge in &graph.edges {
        if !members.contains(&edge.from) || !members.contains(&edge.to) {
            continue;
        }
        let (Some(from), Some(to)) = (remap(&edge.from), remap(&edge.to)) else {
            continue;
        };
        if from == to {
            continue;
        }
        if seen.insert((from.clone(), to.clone(), edge.kind)) {
            edges.push(LayoutEdge {
                from,
                to,
                kind: edge.kind,
            });
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, build_graph};
    use crate::group::group_components;
    use crate::resource::OwnerReference;
    use serde_json::json;

    fn owner(uid: &str, kind: ResourceKind) -> OwnerReference {
        OwnerReference {
            uid: uid.to_string(),
            kind,
            name: uid.to_string(),
        }
    }

    fn web_snapshot(pod_count: usize) -> Snapshot {
        let mut records = Vec::new();
        let mut deploy = ResourceRecord::new("d1", ResourceKind::Deployment, "web");
        deploy.namespace = Some("default".to_string());
        deploy.labels.insert("app".to_string(), "web".to_string());
        records.push(deploy);

        let mut rs = ResourceRecord::new("r1", ResourceKind::ReplicaSet, "web-abc");
        rs.namespace = Some("default".to_string());
        rs.owner_references = vec![owner("d1", ResourceKind::Deployment)];
        records.push(rs);

        for idx in 0..pod_count {
            let mut pod = ResourceRecord::new(
                &format!("p{idx}"),
                ResourceKind::Pod,
                &format!("web-abc-{idx}"),
            );
            pod.namespace = Some("default".to_string());
            pod.labels.insert("app".to_string(), "web".to_string());
            pod.owner_references = vec![owner("r1", ResourceKind::ReplicaSet)];
            pod.spec = json!({"volumes": [{"configMap": {"name": "settings"}}]});
            records.push(pod);
        }

        let mut config_map = ResourceRecord::new("c1", ResourceKind::ConfigMap, "settings");
        config_map.namespace = Some("default".to_string());
        records.push(config_map);

        let mut service = ResourceRecord::new("s1", ResourceKind::Service, "web-svc");
        service.namespace = Some("default".to_string());
        service.spec = json!({"selector": {"app": "web"}});
        records.push(service);

        Snapshot::from_records(records)
    }

    fn layout_first_app(snapshot: &Snapshot) -> ApplicationLayout {
        let graph = build_graph(snapshot);
        let groups = group_components(snapshot, &graph);
        assert_eq!(groups.len(), 1);
        layout_application(&groups[0], snapshot, &graph, &LayoutConfig::default())
    }

    #[test]
    fn controller_nests_pods_and_badges_service_stands_alone() {
        let app = layout_first_app(&web_snapshot(2));
        assert_eq!(app.nodes.len(), 2);

        let controller = app.nodes.iter().find(|n| n.uid == "d1").unwrap();
        assert_eq!(controller.shape, NodeShape::ControllerWithPods);
        assert_eq!(controller.children.len(), 2);
        assert_eq!(controller.badges.len(), 1);
        assert_eq!(controller.badges[0].uid, "c1");

        let service = app.nodes.iter().find(|n| n.uid == "s1").unwrap();
        assert_eq!(service.shape, NodeShape::Compact);
        // Service lane sits left of the compute lane.
        assert!(service.x < controller.x);
    }

    #[test]
    fn replicaset_never_surfaces_as_a_node() {
        let app = layout_first_app(&web_snapshot(2));
        assert!(app.nodes.iter().all(|n| n.uid != "r1"));
        assert!(
            app.nodes
                .iter()
                .all(|n| n.children.iter().all(|c| c.uid != "r1"))
        );
    }

    #[test]
    fn service_edge_lands_on_the_controller() {
        let app = layout_first_app(&web_snapshot(2));
        assert!(app.edges.iter().any(|e| e.kind == EdgeKind::Service
            && e.from == "s1"
            && e.to == "d1"));
        // Owner plumbing through the hidden ReplicaSet is suppressed.
        assert!(app.edges.iter().all(|e| e.kind != EdgeKind::Owner));
    }

    #[test]
    fn pod_rows_wrap_and_widen_the_controller() {
        let config = LayoutConfig::default();
        let narrow = layout_first_app(&web_snapshot(2));
        let wide = layout_first_app(&web_snapshot(config.pods_per_row + 1));

        let narrow_ctrl = narrow.nodes.iter().find(|n| n.uid == "d1").unwrap();
        let wide_ctrl = wide.nodes.iter().find(|n| n.uid == "d1").unwrap();
        assert!(wide_ctrl.width > narrow_ctrl.width);
        assert!(wide_ctrl.height > narrow_ctrl.height);

        let last = wide_ctrl.children.last().unwrap();
        assert_eq!(last.x, config.controller_padding);
        assert!(last.y > config.controller_header);
    }

    #[test]
    fn nodes_inside_a_lane_never_overlap() {
        let mut records = Vec::new();
        for idx in 0..3 {
            let mut deploy = ResourceRecord::new(
                &format!("d{idx}"),
                ResourceKind::Deployment,
                &format!("svc-{idx}"),
            );
            deploy.namespace = Some("default".to_string());
            deploy
                .labels
                .insert("app.kubernetes.io/instance".to_string(), "stack".to_string());
            records.push(deploy);
        }
        let snapshot = Snapshot::from_records(records);
        let app = layout_first_app(&snapshot);
        assert_eq!(app.nodes.len(), 3);
        let mut sorted: Vec<&LayoutNode> = app.nodes.iter().collect();
        sorted.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap());
        for pair in sorted.windows(2) {
            assert!(pair[0].y + pair[0].height <= pair[1].y);
        }
    }
}
