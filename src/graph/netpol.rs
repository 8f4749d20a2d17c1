use std::collections::BTreeMap;

use crate::resource::{ResourceKind, ResourceRecord, Uid};
use crate::snapshot::Snapshot;

use super::selectors::{selector_from_value, selector_matches};
use super::{EdgeKind, EdgeSink};

pub(super) fn emit_netpol_edges(
    snapshot: &Snapshot,
    pods_by_namespace: &BTreeMap<String, Vec<&ResourceRecord>>,
    host_of: &BTreeMap<Uid, Uid>,
    sink: &mut EdgeSink,
) {
    for record in snapshot.records() {
        if record.kind != ResourceKind::NetworkPolicy {
            continue;
        }
        let Some(pod_selector) = record.spec.get("podSelector") else {
            continue;
        };
        if !pod_selector.is_object() {
            continue;
        }
        // An empty podSelector matches every pod in the namespace.
        let selector =
            selector_from_value(pod_selector.get("matchLabels")).unwrap_or_default();

        let Some(pods) = pods_by_namespace.get(record.namespace_key()) else {
            continue;
        };
        for pod in pods {
            if !selector_matches(&selector, &pod.labels) {
                continue;
            }
            // Point at the owning controller when the pod has one.
            let target = host_of.get(&pod.uid).unwrap_or(&pod.uid);
            sink.push(&record.uid, target, EdgeKind::NetworkPolicy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::selectors::live_pods_by_namespace;
    use serde_json::json;

    fn pod(uid: &str, name: &str, app: &str) -> ResourceRecord {
        let mut record = ResourceRecord::new(uid, ResourceKind::Pod, name);
        record.namespace = Some("default".to_string());
        record.labels.insert("app".to_string(), app.to_string());
        record
    }

    #[test]
    fn empty_pod_selector_matches_all_namespace_pods() {
        let mut netpol = ResourceRecord::new("n1", ResourceKind::NetworkPolicy, "deny-all");
        netpol.namespace = Some("default".to_string());
        netpol.spec = json!({"podSelector": {}});

        let snapshot =
            Snapshot::from_records(vec![netpol, pod("p1", "web-1", "web"), pod("p2", "api-1", "api")]);
        let pods = live_pods_by_namespace(&snapshot, &Default::default());
        let mut sink = EdgeSink::default();
        emit_netpol_edges(&snapshot, &pods, &BTreeMap::new(), &mut sink);
        assert_eq!(sink.into_edges().len(), 2);
    }

    #[test]
    fn target_redirects_to_owning_controller() {
        let mut netpol = ResourceRecord::new("n1", ResourceKind::NetworkPolicy, "web-only");
        netpol.namespace = Some("default".to_string());
        netpol.spec = json!({"podSelector": {"matchLabels": {"app": "web"}}});

        let snapshot =
            Snapshot::from_records(vec![netpol, pod("p1", "web-1", "web"), pod("p2", "web-2", "web")]);
        let pods = live_pods_by_namespace(&snapshot, &Default::default());
        let mut host_of = BTreeMap::new();
        host_of.insert("p1".to_string(), "d1".to_string());
        host_of.insert("p2".to_string(), "d1".to_string());

        let mut sink = EdgeSink::default();
        emit_netpol_edges(&snapshot, &pods, &host_of, &mut sink);
        let edges = sink.into_edges();
        // Both pods collapse onto one controller-directed edge.
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to, "d1");
        assert_eq!(edges[0].kind, EdgeKind::NetworkPolicy);
    }

    #[test]
    fn missing_pod_selector_is_skipped() {
        let mut netpol = ResourceRecord::new("n1", ResourceKind::NetworkPolicy, "broken");
        netpol.namespace = Some("default".to_string());
        netpol.spec = json!({});
        let snapshot = Snapshot::from_records(vec![netpol, pod("p1", "web-1", "web")]);
        let pods = live_pods_by_namespace(&snapshot, &Default::default());
        let mut sink = EdgeSink::default();
        emit_netpol_edges(&snapshot, &pods, &BTreeMap::new(), &mut sink);
        assert!(sink.into_edges().is_empty());
    }
}
