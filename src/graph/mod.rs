mod netpol;
mod owners;
mod routing;
mod selectors;
mod shared;

use std::collections::{BTreeMap, BTreeSet};

use crate::resource::{ResourceKind, Uid};
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    Owner,
    Selector,
    Service,
    Ingress,
    Gateway,
    NetworkPolicy,
    Config,
}

/// Directional for rendering; grouping treats edges as undirected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    pub from: Uid,
    pub to: Uid,
    pub kind: EdgeKind,
}

#[derive(Debug, Default)]
pub(crate) struct EdgeSink {
    edges: Vec<Edge>,
    seen: BTreeSet<(Uid, Uid, EdgeKind)>,
}

impl EdgeSink {
    pub(crate) fn push(&mut self, from: &str, to: &str, kind: EdgeKind) {
        if from == to {
            return;
        }
        let key = (from.to_string(), to.to_string(), kind);
        if self.seen.insert(key) {
            self.edges.push(Edge {
                from: from.to_string(),
                to: to.to_string(),
                kind,
            });
        }
    }

    pub(crate) fn into_edges(self) -> Vec<Edge> {
        self.edges
    }
}

/// The relationship graph for one snapshot: typed edges plus the lookup maps
/// every later stage leans on. Built once per refresh, immutable afterwards.
#[derive(Debug, Default)]
pub struct RelationGraph {
    pub edges: Vec<Edge>,
    pub adjacency: BTreeMap<Uid, Vec<Uid>>,
    pub parent_of: BTreeMap<Uid, Uid>,
    pub children_of: BTreeMap<Uid, Vec<Uid>>,
    pub static_pods: BTreeSet<Uid>,
    pub shared_configs: BTreeSet<Uid>,
    /// Pod uid → the controller node it nests under for display.
    pub host_of: BTreeMap<Uid, Uid>,
    /// Display controller uid → attributed pod uids.
    pub pods_of: BTreeMap<Uid, Vec<Uid>>,
    /// Root-owner uid → exclusively-referenced config uids shown as badges.
    pub badges_of: BTreeMap<Uid, Vec<Uid>>,
}

impl RelationGraph {
    pub fn neighbors(&self, uid: &str) -> &[Uid] {
        self.adjacency.get(uid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// ReplicaSets sitting between a Deployment and its pods are skipped in
    /// display.
    pub fn is_intermediate_replicaset(&self, uid: &str, snapshot: &Snapshot) -> bool {
        let Some(record) = snapshot.get(uid) else {
            return false;
        };
        record.kind == ResourceKind::ReplicaSet
            && self
                .parent_of
                .get(uid)
                .and_then(|parent| snapshot.get(parent))
                .is_some_and(|parent| parent.kind == ResourceKind::Deployment)
    }
}

pub fn build_graph(snapshot: &Snapshot) -> RelationGraph {
    let ownership = owners::build_ownership(snapshot);
    let references = shared::resolve_references(snapshot, &ownership);
    let (host_of, pods_of) = owners::attribute_pods(snapshot, &ownership);

    let mut sink = EdgeSink::default();

    for record in snapshot.records() {
        if ownership.static_pods.contains(&record.uid) {
            continue;
        }
        if references.shared.contains(&record.uid) {
            continue;
        }
        if let Some(owner) = ownership.parent_of.get(&record.uid) {
            if !references.shared.contains(owner) {
                sink.push(owner, &record.uid, EdgeKind::Owner);
            }
        }
    }

    let mut badges_of: BTreeMap<Uid, Vec<Uid>> = BTreeMap::new();
    for (config_uid, reference) in &references.exclusive {
        for pod_uid in &reference.pods {
            sink.push(config_uid, pod_uid, EdgeKind::Config);
        }
        badges_of
            .entry(reference.root.clone())
            .or_default()
            .push(config_uid.clone());
    }

    let pods_by_namespace = selectors::live_pods_by_namespace(snapshot, &ownership.static_pods);
    selectors::emit_selector_edges(snapshot, &pods_by_namespace, &host_of, &mut sink);
    routing::emit_routing_edges(snapshot, &mut sink);
    netpol::emit_netpol_edges(snapshot, &pods_by_namespace, &host_of, &mut sink);

    let edges = sink.into_edges();

    let mut adjacency: BTreeMap<Uid, Vec<Uid>> = BTreeMap::new();
    for record in snapshot.records() {
        if !ownership.static_pods.contains(&record.uid) {
            adjacency.entry(record.uid.clone()).or_default();
        }
    }
    for edge in &edges {
        adjacency
            .entry(edge.from.clone())
            .or_default()
            .push(edge.to.clone());
        adjacency
            .entry(edge.to.clone())
            .or_default()
            .push(edge.from.clone());
    }
    for neighbors in adjacency.values_mut() {
        neighbors.sort();
        neighbors.dedup();
    }

    RelationGraph {
        edges,
        adjacency,
        parent_of: ownership.parent_of,
        children_of: ownership.children_of,
        static_pods: ownership.static_pods,
        shared_configs: references.shared,
        host_of,
        pods_of,
        badges_of,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{OwnerReference, ResourceRecord};
    use serde_json::json;

    fn owner(uid: &str, kind: ResourceKind) -> OwnerReference {
        OwnerReference {
            uid: uid.to_string(),
            kind,
            name: uid.to_string(),
        }
    }

    fn web_stack() -> Snapshot {
        let mut deploy = ResourceRecord::new("d1", ResourceKind::Deployment, "web");
        deploy.namespace = Some("default".to_string());
        deploy.labels.insert("app".to_string(), "web".to_string());

        let mut rs = ResourceRecord::new("r1", ResourceKind::ReplicaSet, "web-abc");
        rs.namespace = Some("default".to_string());
        rs.owner_references = vec![owner("d1", ResourceKind::Deployment)];

        let mut pod_a = ResourceRecord::new("p1", ResourceKind::Pod, "web-abc-1");
        pod_a.namespace = Some("default".to_string());
        pod_a.labels.insert("app".to_string(), "web".to_string());
        pod_a.owner_references = vec![owner("r1", ResourceKind::ReplicaSet)];

        let mut pod_b = ResourceRecord::new("p2", ResourceKind::Pod, "web-abc-2");
        pod_b.namespace = Some("default".to_string());
        pod_b.labels.insert("app".to_string(), "web".to_string());
        pod_b.owner_references = vec![owner("r1", ResourceKind::ReplicaSet)];

        let mut service = ResourceRecord::new("s1", ResourceKind::Service, "web-svc");
        service.namespace = Some("default".to_string());
        service.spec = json!({"selector": {"app": "web"}});

        Snapshot::from_records(vec![deploy, rs, pod_a, pod_b, service])
    }

    #[test]
    fn owner_and_service_edges_connect_the_stack() {
        let snapshot = web_stack();
        let graph = build_graph(&snapshot);

        assert!(graph.edges.iter().any(|e| e.kind == EdgeKind::Owner
            && e.from == "d1"
            && e.to == "r1"));
        assert!(graph.edges.iter().any(|e| e.kind == EdgeKind::Service
            && e.from == "s1"
            && e.to == "p1"));
        assert_eq!(graph.host_of.get("p1").map(String::as_str), Some("d1"));
        assert_eq!(graph.host_of.get("p2").map(String::as_str), Some("d1"));
        assert!(graph.is_intermediate_replicaset("r1", &snapshot));
    }

    #[test]
    fn everything_lands_in_one_component_neighborhood() {
        let snapshot = web_stack();
        let graph = build_graph(&snapshot);
        assert!(!graph.neighbors("s1").is_empty());
        assert!(graph.neighbors("p1").contains(&"r1".to_string()));
    }

    #[test]
    fn shared_config_produces_no_edges_at_all() {
        let mut deploy_a = ResourceRecord::new("d1", ResourceKind::Deployment, "web");
        deploy_a.namespace = Some("default".to_string());
        let mut deploy_b = ResourceRecord::new("d2", ResourceKind::Deployment, "api");
        deploy_b.namespace = Some("default".to_string());

        let mut pod_a = ResourceRecord::new("p1", ResourceKind::Pod, "web-1");
        pod_a.namespace = Some("default".to_string());
        pod_a.owner_references = vec![owner("d1", ResourceKind::Deployment)];
        pod_a.spec = json!({"volumes": [{"configMap": {"name": "common"}}]});

        let mut pod_b = ResourceRecord::new("p2", ResourceKind::Pod, "api-1");
        pod_b.namespace = Some("default".to_string());
        pod_b.owner_references = vec![owner("d2", ResourceKind::Deployment)];
        pod_b.spec = json!({"volumes": [{"configMap": {"name": "common"}}]});

        let mut config = ResourceRecord::new("c1", ResourceKind::ConfigMap, "common");
        config.namespace = Some("default".to_string());

        let snapshot = Snapshot::from_records(vec![deploy_a, deploy_b, pod_a, pod_b, config]);
        let graph = build_graph(&snapshot);

        assert!(graph.shared_configs.contains("c1"));
        assert!(graph.neighbors("c1").is_empty());
        assert!(graph.edges.iter().all(|e| e.from != "c1" && e.to != "c1"));
    }

    #[test]
    fn exclusive_config_becomes_a_badge() {
        let mut deploy = ResourceRecord::new("d1", ResourceKind::Deployment, "web");
        deploy.namespace = Some("default".to_string());

        let mut pod = ResourceRecord::new("p1", ResourceKind::Pod, "web-1");
        pod.namespace = Some("default".to_string());
        pod.owner_references = vec![owner("d1", ResourceKind::Deployment)];
        pod.spec = json!({"volumes": [{"configMap": {"name": "settings"}}]});

        let mut config = ResourceRecord::new("c1", ResourceKind::ConfigMap, "settings");
        config.namespace = Some("default".to_string());

        let snapshot = Snapshot::from_records(vec![deploy, pod, config]);
        let graph = build_graph(&snapshot);

        assert_eq!(
            graph.badges_of.get("d1").map(Vec::as_slice),
            Some(&["c1".to_string()][..])
        );
        assert!(graph.edges.iter().any(|e| e.kind == EdgeKind::Config
            && e.from == "c1"
            && e.to == "p1"));
    }

    #[test]
    fn static_pods_have_no_presence() {
        let mut pod = ResourceRecord::new("p1", ResourceKind::Pod, "kube-proxy-master");
        pod.owner_references = vec![owner("n1", ResourceKind::Other("Node".to_string()))];
        let snapshot = Snapshot::from_records(vec![pod]);
        let graph = build_graph(&snapshot);
        assert!(graph.static_pods.contains("p1"));
        assert!(!graph.adjacency.contains_key("p1"));
        assert!(graph.edges.is_empty());
    }
}
