use crate::graph::EdgeKind;
use crate::resource::{ResourceIdentity, ResourceKind, ResourceRecord, Uid};

/// Visual treatment of a node, decided once during sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Standard,
    Compact,
    ControllerWithPods,
    Ingress,
    NetworkPolicy,
}

/// A config icon attached to its owning controller node. Coordinates are
/// relative to the hosting node's origin.
#[derive(Debug, Clone)]
pub struct BadgeRef {
    pub uid: Uid,
    pub kind: ResourceKind,
    pub name: String,
    pub x: f32,
    pub y: f32,
}

/// One positioned resource inside an Application. Coordinates are relative
/// to the Application's origin; nested pod coordinates are relative to the
/// hosting controller node.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub uid: Uid,
    pub record: ResourceRecord,
    pub shape: NodeShape,
    pub lane: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub children: Vec<LayoutNode>,
    pub badges: Vec<BadgeRef>,
}

impl LayoutNode {
    pub fn identity(&self) -> ResourceIdentity {
        self.record.identity()
    }
}

/// An Edge surviving restriction to one Application's visible nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEdge {
    pub from: Uid,
    pub to: Uid,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone)]
pub struct ApplicationLayout {
    pub id: String,
    pub name: String,
    pub namespace: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

/// The packed canvas handed to the renderer.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub applications: Vec<ApplicationLayout>,
    pub width: f32,
    pub height: f32,
}
