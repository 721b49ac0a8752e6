// Organism model: branch graph for trees/succulents, blade list for algae.

use serde::Serialize;
use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, TAU};

use crate::archetype::Archetype;
use crate::config::SimulationConfig;
use crate::growth::MAX_HEALTH;
use crate::random::GrowthRandom;
use crate::types::{NodeId, Point};

/// Angle of straight-up growth (y grows downward on the canvas).
pub const UP: f32 = -FRAC_PI_2;

/// One grown segment. Never moved after creation; only `grown` changes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BranchNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// Parent's endpoint, or the root anchor.
    pub origin: Point,
    /// Endpoint of this segment; equals `origin` for the root.
    pub position: Point,
    pub angle: f32,
    pub length: f32,
    pub thickness: f32,
    pub depth: u32,
    /// Accumulated progress toward the next extension, in `[0, 1]`.
    pub grown: f32,
}

/// One algae frond. Only `length` mutates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Blade {
    pub x: f32,
    pub length: f32,
    pub phase: f32,
    pub thickness: f32,
    pub hue: f32,
    /// Length gained per unit dt before the light factor.
    pub growth: f32,
}

/// Append-only branch graph with an id index and per-node child counts.
#[derive(Clone, Debug, Serialize)]
pub struct BranchBody {
    nodes: Vec<BranchNode>,
    next_id: NodeId,
    #[serde(skip)]
    index: HashMap<NodeId, usize>,
    #[serde(skip)]
    children: Vec<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AlgaeBody {
    pub blades: Vec<Blade>,
    pub ground_y: f32,
    pub max_length: f32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Body {
    Branching(BranchBody),
    Algae(AlgaeBody),
}

#[derive(Clone, Debug, Serialize)]
pub struct Organism {
    pub archetype: Archetype,
    pub body: Body,
    pub biomass: f32,
    pub health: f32,
    /// Seeds cosmetic per-export jitter (leaf placement).
    pub seed: u64,
}

impl BranchBody {
    pub fn with_root(root: BranchNode) -> Self {
        let mut index = HashMap::new();
        index.insert(root.id, 0);
        Self {
            next_id: root.id + 1,
            nodes: vec![root],
            index,
            children: vec![0],
        }
    }

    pub fn nodes(&self) -> &[BranchNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &BranchNode {
        &self.nodes[0]
    }

    pub fn next_id(&self) -> NodeId {
        self.next_id
    }

    pub fn get(&self, id: NodeId) -> Option<&BranchNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn parent_of(&self, node: &BranchNode) -> Option<&BranchNode> {
        node.parent.and_then(|p| self.get(p))
    }

    pub fn child_count(&self, id: NodeId) -> u32 {
        self.index_of(id).map_or(0, |i| self.children[i])
    }

    pub fn is_tip(&self, id: NodeId) -> bool {
        self.index.contains_key(&id) && self.child_count(id) == 0
    }

    /// Positions (not ids) of every node without children.
    pub fn tip_indices(&self) -> Vec<usize> {
        (0..self.nodes.len()).filter(|&i| self.children[i] == 0).collect()
    }

    pub fn tips(&self) -> impl Iterator<Item = &BranchNode> {
        self.nodes
            .iter()
            .zip(self.children.iter())
            .filter(|(_, c)| **c == 0)
            .map(|(n, _)| n)
    }

    pub(crate) fn node_mut(&mut self, idx: usize) -> &mut BranchNode {
        &mut self.nodes[idx]
    }

    /// Appends a child of the node at `parent_idx`, starting at the parent's endpoint.
    pub fn push_child(&mut self, parent_idx: usize, angle: f32, length: f32, thickness: f32) -> NodeId {
        let parent = &self.nodes[parent_idx];
        let origin = parent.position;
        let node = BranchNode {
            id: self.next_id,
            parent: Some(parent.id),
            origin,
            position: origin.offset(angle, length),
            angle,
            length,
            thickness,
            depth: parent.depth + 1,
            grown: 0.0,
        };
        self.next_id += 1;
        self.children[parent_idx] += 1;
        self.index.insert(node.id, self.nodes.len());
        self.children.push(0);
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// Keeps the `retain` earliest nodes once the count exceeds `cap`.
    /// Returns how many nodes were dropped. The root is always kept.
    pub fn prune(&mut self, cap: usize, retain: usize) -> usize {
        if self.nodes.len() <= cap {
            return 0;
        }
        let keep = retain.clamp(1, cap);
        let dropped = self.nodes.len() - keep;
        self.nodes.truncate(keep);
        self.rebuild_index();
        dropped
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        self.children.clear();
        self.children.resize(self.nodes.len(), 0);
        for (i, node) in self.nodes.iter().enumerate() {
            self.index.insert(node.id, i);
        }
        for node in &self.nodes {
            if let Some(&pi) = node.parent.and_then(|p| self.index.get(&p)) {
                self.children[pi] += 1;
            }
        }
    }
}

impl Organism {
    /// Fresh organism of the given archetype: a single root, or a fixed set of blades.
    pub fn new<G: GrowthRandom + ?Sized>(archetype: Archetype, config: &SimulationConfig, rng: &mut G) -> Self {
        let params = archetype.params();
        let (anchor_x, anchor_y) = config.anchor(archetype);
        let body = if archetype.is_branching() {
            let anchor = Point::new(anchor_x, anchor_y);
            let length = rng.range(14.0, 24.0);
            let thickness = rng.range(params.base_thickness.0, params.base_thickness.1);
            Body::Branching(BranchBody::with_root(BranchNode {
                id: 0,
                parent: None,
                origin: anchor,
                position: anchor,
                angle: UP,
                length,
                thickness,
                depth: 0,
                grown: 0.0,
            }))
        } else {
            let count = config.blade_count.max(1);
            let spacing = config.blade_spread / count as f32;
            let left = anchor_x - config.blade_spread / 2.0;
            let blades = (0..count)
                .map(|i| Blade {
                    x: left + i as f32 * spacing,
                    length: rng.range(60.0, 200.0).min(config.blade_max_length),
                    phase: rng.range(0.0, TAU),
                    thickness: rng.range(params.base_thickness.0, params.base_thickness.1),
                    hue: rng.range(160.0, 200.0),
                    growth: 0.01 + rng.unit() * 0.02,
                })
                .collect();
            Body::Algae(AlgaeBody {
                blades,
                ground_y: anchor_y,
                max_length: config.blade_max_length,
            })
        };
        let seed = (rng.unit() as f64 * u32::MAX as f64) as u64;
        Self {
            archetype,
            body,
            biomass: params.seed_biomass,
            health: MAX_HEALTH,
            seed,
        }
    }

    pub fn branches(&self) -> Option<&BranchBody> {
        match &self.body {
            Body::Branching(b) => Some(b),
            Body::Algae(_) => None,
        }
    }

    pub fn blades(&self) -> Option<&[Blade]> {
        match &self.body {
            Body::Algae(a) => Some(&a.blades),
            Body::Branching(_) => None,
        }
    }

    pub fn node_count(&self) -> usize {
        self.branches().map_or(0, BranchBody::len)
    }

    pub fn tip_count(&self) -> usize {
        self.branches().map_or(0, |b| b.tips().count())
    }

    /// Health as a 0..100 display percentage.
    pub fn health_percent(&self) -> u8 {
        (self.health.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}
