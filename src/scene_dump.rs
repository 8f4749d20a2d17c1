use crate::layout::{ApplicationLayout, BadgeRef, LayoutNode, Scene};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct SceneDump {
    pub width: f32,
    pub height: f32,
    pub applications: Vec<ApplicationDump>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationDump {
    pub id: String,
    pub name: String,
    pub namespace: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub uid: String,
    pub kind: String,
    pub name: String,
    pub shape: String,
    pub lane: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub children: Vec<NodeDump>,
    pub badges: Vec<BadgeDump>,
}

#[derive(Debug, Serialize)]
pub struct BadgeDump {
    pub uid: String,
    pub kind: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub kind: String,
}

impl SceneDump {
    pub fn from_scene(scene: &Scene) -> Self {
        SceneDump {
            width: scene.width,
            height: scene.height,
            applications: scene.applications.iter().map(dump_application).collect(),
        }
    }
}

fn dump_application(app: &ApplicationLayout) -> ApplicationDump {
    ApplicationDump {
        id: app.id.clone(),
        name: app.name.clone(),
        namespace: app.namespace.clone(),
        x: app.x,
        y: app.y,
        width: app.width,
        height: app.height,
        nodes: app.nodes.iter().map(dump_node).collect(),
        edges: app
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                kind: format!("{:?}", edge.kind),
            })
            .collect(),
    }
}

fn dump_node(node: &LayoutNode) -> NodeDump {
    NodeDump {
        uid: node.uid.clone(),
        kind: node.record.kind.as_str().to_string(),
        name: node.record.name.clone(),
        shape: format!("{:?}", node.shape),
        lane: node.lane,
        x: node.x,
        y: node.y,
        width: node.width,
        height: node.height,
        children: node.children.iter().map(dump_node).collect(),
        badges: node.badges.iter().map(dump_badge).collect(),
    }
}

fn dump_badge(badge: &BadgeRef) -> BadgeDump {
    BadgeDump {
        uid: badge.uid.clone(),
        kind: badge.kind.as_str().to_string(),
        name: badge.name.clone(),
        x: badge.x,
        y: badge.y,
    }
}

pub fn write_scene_dump(path: &Path, scene: &Scene) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = SceneDump::from_scene(scene);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::compute_scene;
    use crate::resource::{ResourceKind, ResourceRecord};
    use crate::snapshot::Snapshot;

    #[test]
    fn dump_serializes_to_json() {
        let snapshot = Snapshot::from_records(vec![ResourceRecord::new(
            "s1",
            ResourceKind::Service,
            "svc",
        )]);
        let scene = compute_scene(&snapshot, &LayoutConfig::default());
        let dump = SceneDump::from_scene(&scene);
        let json = serde_json::to_string(&dump).unwrap();
        assert!(json.contains("\"kind\":\"Service\""));
        assert!(json.contains("\"shape\":\"Compact\""));
    }
}
