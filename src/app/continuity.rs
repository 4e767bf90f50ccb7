use std::collections::HashMap;

use super::sim::{Simulation, Vec3};

#[derive(Clone, Copy, Debug)]
pub struct NodeMotion {
    pub position: Vec3,
    pub velocity: Vec3,
    pub pin: Option<Vec3>,
}

/// Carries node motion state across subgraph rebuilds, keyed by entity id.
/// Restoring happens in `Simulation::initialize`: ids present in both the
/// old and new subgraph keep their exact position, velocity, and pin, so a
/// filter edit never shuffles nodes that stay visible.
#[derive(Clone, Debug, Default)]
pub struct PositionSnapshot {
    entries: HashMap<String, NodeMotion>,
}

impl PositionSnapshot {
    pub fn capture(sim: &Simulation) -> Self {
        let entries = sim
            .nodes()
            .iter()
            .map(|node| {
                (
                    node.id.clone(),
                    NodeMotion {
                        position: node.position,
                        velocity: node.velocity,
                        pin: node.pin,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn motion_for(&self, id: &str) -> Option<NodeMotion> {
        self.entries.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
