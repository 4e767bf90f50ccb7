mod forces;
mod octree;
mod vec3;

pub use vec3::{Vec3, vec3};

use std::collections::HashMap;

use crate::util::{stable_depth, stable_pair};

use super::continuity::PositionSnapshot;
use forces::{
    ChargeParams, CollisionParams, accumulate_collision_pairs, accumulate_repulsion_for_node,
};
use octree::OctNode;

const ALPHA_MIN: f32 = 0.001;
const ALPHA_RELAX: f32 = 0.05;
const VELOCITY_DECAY: f32 = 0.6;
const MAX_SPEED: f32 = 22.0;

const LINK_STRENGTH: f32 = 0.08;
const CENTER_STRENGTH: f32 = 0.02;
const COLLISION_STRENGTH: f32 = 1.4;
const COLLISION_MARGIN: f32 = 4.0;
const RADIAL_STRENGTH: f32 = 0.09;
const LAYER_STRENGTH: f32 = 0.11;
const BAND_SPACING: f32 = 170.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutSpace {
    TwoD,
    ThreeD,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementMode {
    Plain,
    Radial,
    Layered,
}

#[derive(Clone, Copy, Debug)]
pub struct SimParams {
    pub space: LayoutSpace,
    pub mode: PlacementMode,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            space: LayoutSpace::TwoD,
            mode: PlacementMode::Plain,
        }
    }
}

/// Per-space tuning. 3D gets a longer link rest length and a coarser,
/// softer charge approximation; accuracy is traded for tick speed there.
struct SpaceTuning {
    link_rest: f32,
    charge_strength: f32,
    charge_softening: f32,
    charge_theta: f32,
    charge_max_distance: f32,
}

fn space_tuning(space: LayoutSpace) -> SpaceTuning {
    match space {
        LayoutSpace::TwoD => SpaceTuning {
            link_rest: 70.0,
            charge_strength: 2600.0,
            charge_softening: 150.0,
            charge_theta: 0.72,
            charge_max_distance: 480.0,
        },
        LayoutSpace::ThreeD => SpaceTuning {
            link_rest: 100.0,
            charge_strength: 3400.0,
            charge_softening: 400.0,
            charge_theta: 1.1,
            charge_max_distance: 640.0,
        },
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CoolingPhase {
    Warm,
    Ease,
    Rest,
}

/// Three-phase cooling after a structural reset: a warm phase at a higher
/// alpha target, an easing phase, then rest at target zero. Driven by the
/// tick itself so teardown is a single `stop()`, never a timer race.
#[derive(Clone, Copy, Debug)]
struct CoolingSchedule {
    phase: CoolingPhase,
    ticks_remaining: u32,
}

impl CoolingSchedule {
    const WARM_TICKS: u32 = 90;
    const EASE_TICKS: u32 = 120;

    fn full() -> Self {
        Self {
            phase: CoolingPhase::Warm,
            ticks_remaining: Self::WARM_TICKS,
        }
    }

    fn nudged() -> Self {
        Self {
            phase: CoolingPhase::Ease,
            ticks_remaining: Self::EASE_TICKS,
        }
    }

    fn target(self) -> f32 {
        match self.phase {
            CoolingPhase::Warm => 0.3,
            CoolingPhase::Ease => 0.06,
            CoolingPhase::Rest => 0.0,
        }
    }

    fn advance(&mut self) {
        if self.phase == CoolingPhase::Rest {
            return;
        }
        self.ticks_remaining = self.ticks_remaining.saturating_sub(1);
        if self.ticks_remaining == 0 {
            *self = match self.phase {
                CoolingPhase::Warm => Self::nudged(),
                CoolingPhase::Ease | CoolingPhase::Rest => Self {
                    phase: CoolingPhase::Rest,
                    ticks_remaining: 0,
                },
            };
        }
    }

    fn is_resting(self) -> bool {
        self.phase == CoolingPhase::Rest
    }
}

/// What the subgraph filter hands the solver for each visible node.
pub struct NodeSeed {
    pub id: String,
    pub radius: f32,
    pub band: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct SimLink {
    pub source: usize,
    pub target: usize,
    pub weight: f32,
}

pub struct SimNode {
    pub id: String,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Externally forced position; overrides solver motion entirely.
    pub pin: Option<Vec3>,
    pub radius: f32,
    pub band: usize,
}

#[derive(Default)]
struct SimScratch {
    forces: Vec<Vec3>,
    positions: Vec<Vec3>,
    radii: Vec<f32>,
}

pub struct Simulation {
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    index_by_id: HashMap<String, usize>,
    params: SimParams,
    bounds: Vec3,
    ring_radius: f32,
    band_count: usize,
    alpha: f32,
    cooling: CoolingSchedule,
    settled: bool,
    stopped: bool,
    scratch: SimScratch,
}

impl Simulation {
    /// Builds a solver for one visible subgraph. Nodes whose ids appear in
    /// `prior` inherit position, velocity, and pin unchanged; the rest get
    /// deterministic jittered placement. Links with out-of-range or equal
    /// endpoints are discarded up front.
    pub fn initialize(
        seeds: Vec<NodeSeed>,
        links: Vec<SimLink>,
        params: SimParams,
        prior: Option<&PositionSnapshot>,
    ) -> Self {
        let count = seeds.len();
        let spread = (count as f32).sqrt() * 60.0;
        let half_extent = ((count as f32).sqrt() * 150.0).max(800.0);
        let bounds = match params.space {
            LayoutSpace::TwoD => vec3(half_extent, half_extent, 0.0),
            LayoutSpace::ThreeD => vec3(half_extent, half_extent, half_extent),
        };

        let mut carried = 0usize;
        let mut band_count = 1usize;
        let mut index_by_id = HashMap::with_capacity(count);
        let mut nodes = Vec::with_capacity(count);
        for seed in seeds {
            band_count = band_count.max(seed.band + 1);
            let motion = prior.and_then(|snapshot| snapshot.motion_for(&seed.id));
            let (position, velocity, pin) = match motion {
                Some(motion) => {
                    carried += 1;
                    (motion.position, motion.velocity, motion.pin)
                }
                None => (initial_position(&seed.id, spread, params.space), Vec3::ZERO, None),
            };

            index_by_id.insert(seed.id.clone(), nodes.len());
            nodes.push(SimNode {
                id: seed.id,
                position,
                velocity,
                pin,
                radius: seed.radius,
                band: seed.band,
            });
        }

        let links = links
            .into_iter()
            .filter(|link| {
                link.source < count && link.target < count && link.source != link.target
            })
            .collect();

        // A carried-over layout only needs a gentle re-settle; a fresh one
        // runs the whole warm phase.
        let (alpha, cooling) = if carried > 0 {
            (0.5, CoolingSchedule::nudged())
        } else {
            (1.0, CoolingSchedule::full())
        };

        Self {
            nodes,
            links,
            index_by_id,
            params,
            bounds,
            ring_radius: spread.max(240.0),
            band_count,
            alpha,
            cooling,
            settled: false,
            stopped: false,
            scratch: SimScratch::default(),
        }
    }

    /// Advances one bounded tick. Returns false once there is nothing left
    /// to animate: empty, settled, or stopped.
    pub fn tick(&mut self) -> bool {
        if self.stopped || self.settled || self.nodes.is_empty() {
            return false;
        }

        let node_count = self.nodes.len();
        let tuning = space_tuning(self.params.space);

        let scratch = &mut self.scratch;
        scratch.forces.resize(node_count, Vec3::ZERO);
        scratch.forces.fill(Vec3::ZERO);
        scratch.positions.clear();
        scratch.radii.clear();
        let mut max_radius = 0.0_f32;
        for node in &self.nodes {
            scratch.positions.push(node.position);
            scratch.radii.push(node.radius);
            max_radius = max_radius.max(node.radius);
        }

        let forces = &mut scratch.forces;
        let positions = &scratch.positions;
        let radii = &scratch.radii;

        // 1. Link springs toward the rest distance.
        for link in &self.links {
            let delta = positions[link.source] - positions[link.target];
            let distance = delta.length();
            let direction = delta.normalized_or(vec3(1.0, 0.0, 0.0));
            let rest = tuning.link_rest + (radii[link.source] + radii[link.target]) * 2.0;
            let correction = direction * ((distance - rest) * LINK_STRENGTH * link.weight);
            forces[link.source] -= correction;
            forces[link.target] += correction;
        }

        let tree = OctNode::build(positions);

        // 2. Charge repulsion, Barnes-Hut approximated and distance-capped.
        if let Some(tree) = &tree {
            let charge = ChargeParams {
                strength: tuning.charge_strength,
                softening: tuning.charge_softening,
                theta: tuning.charge_theta,
                max_distance_sq: tuning.charge_max_distance * tuning.charge_max_distance,
            };
            for (index, force) in forces.iter_mut().enumerate() {
                accumulate_repulsion_for_node(tree, index, positions, charge, force);
            }
        }

        // 3. Center pull, only when no placement force owns the layout.
        if self.params.mode == PlacementMode::Plain {
            for (index, force) in forces.iter_mut().enumerate().take(node_count) {
                *force -= positions[index] * CENTER_STRENGTH;
            }
        }

        // 4. Collision separation from display radii.
        if let Some(tree) = &tree {
            let max_collision_distance = (max_radius * 2.0) + COLLISION_MARGIN + 8.0;
            accumulate_collision_pairs(
                tree,
                tree,
                true,
                positions,
                radii,
                CollisionParams {
                    strength: COLLISION_STRENGTH,
                    margin: COLLISION_MARGIN,
                    max_distance_sq: max_collision_distance * max_collision_distance,
                },
                forces,
            );
        }

        // 5. Placement-mode force.
        match self.params.mode {
            PlacementMode::Plain => {}
            PlacementMode::Radial => {
                for (index, force) in forces.iter_mut().enumerate().take(node_count) {
                    let position = positions[index];
                    let direction =
                        position.normalized_or(forces::fallback_direction(index));
                    let error = position.length() - self.ring_radius;
                    *force -= direction * (error * RADIAL_STRENGTH);
                }
            }
            PlacementMode::Layered => {
                let half_span = (self.band_count.saturating_sub(1)) as f32 * 0.5;
                for (index, force) in forces.iter_mut().enumerate().take(node_count) {
                    let band = self.nodes[index].band as f32;
                    let target_y = (band - half_span) * BAND_SPACING;
                    force.y += (target_y - positions[index].y) * LAYER_STRENGTH;
                }
            }
        }

        // Integration: forces feed velocity scaled by alpha, velocity is
        // damped, positions are clamped back into bounds every tick.
        let alpha = self.alpha;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if let Some(pin) = node.pin {
                node.position = pin;
                node.velocity = Vec3::ZERO;
                continue;
            }

            let mut velocity = (node.velocity + forces[index] * alpha) * VELOCITY_DECAY;
            let speed_sq = velocity.length_sq();
            if speed_sq > MAX_SPEED * MAX_SPEED {
                velocity *= MAX_SPEED / speed_sq.sqrt();
            }

            node.velocity = velocity;
            node.position = (node.position + velocity).clamp_box(self.bounds);
        }

        self.alpha += (self.cooling.target() - self.alpha) * ALPHA_RELAX;
        self.cooling.advance();
        if self.cooling.is_resting() && self.alpha < ALPHA_MIN {
            self.settled = true;
        }

        !self.settled
    }

    /// Re-arms the tick loop after a structural change or interaction.
    pub fn reheat(&mut self, intensity: f32) {
        if self.stopped {
            return;
        }
        self.alpha = self.alpha.max(intensity.clamp(0.0, 1.0));
        self.cooling = CoolingSchedule::nudged();
        self.settled = false;
    }

    /// Sets or clears a node's pin. Pinning snaps the node to the pin
    /// immediately so a drag never lags a frame behind the pointer.
    pub fn pin(&mut self, index: usize, position: Option<Vec3>) {
        let Some(node) = self.nodes.get_mut(index) else {
            return;
        };
        node.pin = position;
        if let Some(pin) = position {
            node.position = pin;
            node.velocity = Vec3::ZERO;
        }
    }

    /// Tears the solver down: every later `tick` is a no-op, so a frame
    /// already scheduled by the host can fire harmlessly.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[SimLink] {
        &self.links
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

fn initial_position(id: &str, spread: f32, space: LayoutSpace) -> Vec3 {
    let (jx, jy) = stable_pair(id);
    let jz = match space {
        LayoutSpace::TwoD => 0.0,
        LayoutSpace::ThreeD => stable_depth(id),
    };
    vec3(jx, jy, jz) * spread.max(60.0)
}
