// Structure exporter: organism -> renderer-agnostic draw primitives.

use ::rand as external_rand;
use external_rand::rngs::StdRng;
use external_rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::archetype::Archetype;
use crate::organism::{AlgaeBody, Body, BranchBody, BranchNode, Organism};
use crate::types::{NodeId, Point};

pub const MAX_SEGMENT_THICKNESS: f32 = 18.0;

/// HSL colour suggestion; renderers may ignore it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ColorHint {
    /// Degrees.
    pub hue: f32,
    /// Percent.
    pub saturation: f32,
    /// Percent.
    pub lightness: f32,
    pub alpha: f32,
}

impl ColorHint {
    pub fn hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self {
            hue,
            saturation,
            lightness,
            alpha: 1.0,
        }
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }

    /// RGBA components in `[0, 1]`.
    pub fn rgba(&self) -> [f32; 4] {
        let h = self.hue.rem_euclid(360.0) / 60.0;
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        [r + m, g + m, b + m, self.alpha.clamp(0.0, 1.0)]
    }
}

/// Parent/child pair a branch segment was drawn for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Link {
    pub parent: NodeId,
    pub child: NodeId,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawPrimitive {
    Segment {
        from: Point,
        to: Point,
        thickness: f32,
        color: ColorHint,
        /// Set for branch segments, absent for algae blades.
        link: Option<Link>,
    },
    LeafMark {
        position: Point,
        orientation: f32,
        size: f32,
        color: ColorHint,
    },
}

/// Cosmetic inputs that do not belong to the organism.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewParams {
    /// Seconds, drives blade sway.
    pub time: f32,
    pub light: f32,
    pub spectrum: f32,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            time: 0.0,
            light: 0.7,
            spectrum: 0.5,
        }
    }
}

/// Projects the organism into draw primitives. Pure: the same organism and
/// view always give the same output.
pub fn export(organism: &Organism, view: &ViewParams) -> Vec<DrawPrimitive> {
    match &organism.body {
        Body::Branching(body) => export_branches(organism, body, view),
        Body::Algae(body) => export_blades(body, view),
    }
}

/// Parent/child pairs of every branch segment, in export order.
pub fn links(primitives: &[DrawPrimitive]) -> Vec<Link> {
    primitives
        .iter()
        .filter_map(|p| match p {
            DrawPrimitive::Segment { link, .. } => *link,
            DrawPrimitive::LeafMark { .. } => None,
        })
        .collect()
}

fn export_branches(organism: &Organism, body: &BranchBody, view: &ViewParams) -> Vec<DrawPrimitive> {
    let params = organism.archetype.params();
    let mut ordered: Vec<&BranchNode> = body.nodes().iter().collect();
    ordered.sort_by_key(|n| (n.depth, n.id));

    let mut out = Vec::with_capacity(ordered.len() * 2);
    for node in ordered.iter().filter(|n| n.parent.is_some()) {
        let Some(parent) = body.parent_of(node) else {
            continue;
        };
        let lightness = 18.0 + 10.0 * (1.0 - 1.0 / (1.0 + node.depth as f32 * 0.3));
        out.push(DrawPrimitive::Segment {
            from: parent.position,
            to: node.position,
            thickness: node.thickness.clamp(1.0, MAX_SEGMENT_THICKNESS),
            color: ColorHint::hsl(params.stem_hue, 45.0, lightness),
            link: Some(Link {
                parent: parent.id,
                child: node.id,
            }),
        });
    }

    let leaf_color = leaf_color(organism, view);
    for tip in ordered.iter().filter(|n| body.is_tip(n.id)) {
        let mut jitter = StdRng::seed_from_u64(leaf_seed(organism.seed, tip.id));
        let count = leaf_count(organism.archetype, tip.depth, &mut jitter);
        let depth_scale = (1.0 - tip.depth as f32 * 0.06).max(0.2);
        for _ in 0..count {
            out.push(DrawPrimitive::LeafMark {
                position: tip.position,
                orientation: tip.angle + jitter.gen_range(-0.7..0.7),
                size: params.base_leaf_size * depth_scale * jitter.gen_range(0.7..1.3),
                color: leaf_color,
            });
        }
    }
    out
}

fn export_blades(body: &AlgaeBody, view: &ViewParams) -> Vec<DrawPrimitive> {
    body.blades
        .iter()
        .map(|blade| {
            let sway = (view.time * 1.2 + blade.phase).sin() * 12.0 * (0.5 + view.light);
            DrawPrimitive::Segment {
                from: Point::new(blade.x, body.ground_y),
                to: Point::new(blade.x + sway, body.ground_y - blade.length),
                thickness: blade.thickness,
                color: ColorHint::hsl(blade.hue, 60.0, 40.0).with_alpha(0.95),
                link: None,
            }
        })
        .collect()
}

fn leaf_count(archetype: Archetype, depth: u32, rng: &mut StdRng) -> usize {
    match archetype {
        Archetype::Succulent => 3,
        _ if depth > 2 => rng.gen_range(1..=3),
        _ => rng.gen_range(2..=5),
    }
}

fn leaf_color(organism: &Organism, view: &ViewParams) -> ColorHint {
    let health = organism.health;
    let hue = (50.0 + health * 30.0 + view.spectrum * 10.0).clamp(30.0, 80.0);
    ColorHint::hsl(hue, organism.archetype.params().leaf_saturation, health * 30.0 + 30.0)
}

fn leaf_seed(seed: u64, id: NodeId) -> u64 {
    seed ^ (id as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
