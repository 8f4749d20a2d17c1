use std::collections::{BTreeMap, BTreeSet};

use crate::resource::{ResourceKind, ResourceRecord, Uid};
use crate::snapshot::Snapshot;

#[derive(Debug, Default)]
pub(super) struct Ownership {
    pub parent_of: BTreeMap<Uid, Uid>,
    pub children_of: BTreeMap<Uid, Vec<Uid>>,
    pub static_pods: BTreeSet<Uid>,
}

pub(super) fn build_ownership(snapshot: &Snapshot) -> Ownership {
    let mut ownership = Ownership::default();

    for record in snapshot.records() {
        if is_static_pod(record) {
            tracing::debug!(pod = %record.name, "dropping node-owned static pod");
            ownership.static_pods.insert(record.uid.clone());
            continue;
        }
        // First declared owner present in the snapshot wins; later owners
        // are ignored.
        let Some(owner) = record
            .owner_references
            .iter()
            .find(|owner| snapshot.contains(&owner.uid))
        else {
            continue;
        };
        ownership
            .parent_of
            .insert(record.uid.clone(), owner.uid.clone());
        ownership
            .children_of
            .entry(owner.uid.clone())
            .or_default()
            .push(record.uid.clone());
    }

    ownership
}

fn is_static_pod(record: &ResourceRecord) -> bool {
    record.kind == ResourceKind::Pod
        && !record.owner_references.is_empty()
        && record
            .owner_references
            .iter()
            .all(|owner| matches!(&owner.kind, ResourceKind::Other(kind) if kind == "Node"))
}

/// Topmost owner reachable over `parent_of`. The walk carries a visited set
/// so cyclic owner data terminates instead of spinning.
pub(super) fn root_owner(uid: &str, parent_of: &BTreeMap<Uid, Uid>) -> Uid {
    let mut current = uid.to_string();
    let mut visited: BTreeSet<Uid> = BTreeSet::new();
    while let Some(parent) = parent_of.get(&current) {
        if !visited.insert(current.clone()) {
            tracing::warn!(uid = %uid, "cyclic owner chain, stopping root-owner walk");
            break;
        }
        current = parent.clone();
    }
    current
}

/// Resolve each live pod to the controller node it nests under for display.
/// The ReplicaSet level is skipped when a Deployment sits above it.
pub(super) fn attribute_pods(
    snapshot: &Snapshot,
    ownership: &Ownership,
) -> (BTreeMap<Uid, Uid>, BTreeMap<Uid, Vec<Uid>>) {
    let mut host_of: BTreeMap<Uid, Uid> = BTreeMap::new();
    let mut pods_of: BTreeMap<Uid, Vec<Uid>> = BTreeMap::new();

    for record in snapshot.records() {
        if record.kind != ResourceKind::Pod || ownership.static_pods.contains(&record.uid) {
            continue;
        }
        let Some(parent) = ownership
            .parent_of
            .get(&record.uid)
            .and_then(|uid| snapshot.get(uid))
        else {
            continue;
        };
        let host = match parent.kind {
            ResourceKind::Deployment
            | ResourceKind::StatefulSet
            | ResourceKind::DaemonSet
            | ResourceKind::Job => Some(parent.uid.clone()),
            ResourceKind::ReplicaSet => {
                let grandparent = ownership
                    .parent_of
                    .get(&parent.uid)
                    .and_then(|uid| snapshot.get(uid));
                match grandparent {
                    Some(gp) if gp.kind == ResourceKind::Deployment => Some(gp.uid.clone()),
                    // A ReplicaSet without a Deployment above it hosts its
                    // pods itself.
                    _ => Some(parent.uid.clone()),
                }
            }
            _ => None,
        };
        if let Some(host) = host {
            host_of.insert(record.uid.clone(), host.clone());
            pods_of.entry(host).or_default().push(record.uid.clone());
        }
    }

    (host_of, pods_of)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::OwnerReference;

    fn owner(uid: &str, kind: ResourceKind) -> OwnerReference {
        OwnerReference {
            uid: uid.to_string(),
            kind,
            name: uid.to_string(),
        }
    }

    fn snapshot_with_chain() -> Snapshot {
        let deploy = ResourceRecord::new("d1", ResourceKind::Deployment, "web");
        let mut rs = ResourceRecord::new("r1", ResourceKind::ReplicaSet, "web-abc");
        rs.owner_references = vec![owner("d1", ResourceKind::Deployment)];
        let mut pod = ResourceRecord::new("p1", ResourceKind::Pod, "web-abc-x");
        pod.owner_references = vec![owner("r1", ResourceKind::ReplicaSet)];
        Snapshot::from_records(vec![deploy, rs, pod])
    }

    #[test]
    fn first_live_owner_wins() {
        let deploy = ResourceRecord::new("d1", ResourceKind::Deployment, "web");
        let mut pod = ResourceRecord::new("p1", ResourceKind::Pod, "web-x");
        pod.owner_references = vec![
            owner("missing", ResourceKind::ReplicaSet),
            owner("d1", ResourceKind::Deployment),
        ];
        let snapshot = Snapshot::from_records(vec![deploy, pod]);
        let ownership = build_ownership(&snapshot);
        assert_eq!(ownership.parent_of.get("p1").map(String::as_str), Some("d1"));
    }

    #[test]
    fn node_owned_pod_is_static() {
        let mut pod = ResourceRecord::new("p1", ResourceKind::Pod, "etcd-master");
        pod.owner_references = vec![owner("n1", ResourceKind::Other("Node".to_string()))];
        let snapshot = Snapshot::from_records(vec![pod]);
        let ownership = build_ownership(&snapshot);
        assert!(ownership.static_pods.contains("p1"));
        assert!(ownership.parent_of.is_empty());
    }

    #[test]
    fn root_owner_walks_to_the_top() {
        let snapshot = snapshot_with_chain();
        let ownership = build_ownership(&snapshot);
        assert_eq!(root_owner("p1", &ownership.parent_of), "d1");
        assert_eq!(root_owner("d1", &ownership.parent_of), "d1");
    }

    #[test]
    fn root_owner_survives_cycles() {
        let mut parent_of = BTreeMap::new();
        parent_of.insert("a".to_string(), "b".to_string());
        parent_of.insert("b".to_string(), "a".to_string());
        // Must terminate; the exact landing uid is unspecified for bad data.
        let _ = root_owner("a", &parent_of);
    }

    #[test]
    fn replicaset_level_is_skipped() {
        let snapshot = snapshot_with_chain();
        let ownership = build_ownership(&snapshot);
        let (host_of, pods_of) = attribute_pods(&snapshot, &ownership);
        assert_eq!(host_of.get("p1").map(String::as_str), Some("d1"));
        assert_eq!(pods_of.get("d1").map(Vec::len), Some(1));
    }

    #[test]
    fn bare_replicaset_hosts_its_pods() {
        let rs = ResourceRecord::new("r1", ResourceKind::ReplicaSet, "cache");
        let mut pod = ResourceRecord::new("p1", ResourceKind::Pod, "cache-x");
        pod.owner_references = vec![owner("r1", ResourceKind::ReplicaSet)];
        let snapshot = Snapshot::from_records(vec![rs, pod]);
        let ownership = build_ownership(&snapshot);
        let (host_of, _) = attribute_pods(&snapshot, &ownership);
        assert_eq!(host_of.get("p1").map(String::as_str), Some("r1"));
    }
}
