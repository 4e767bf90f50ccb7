use super::octree::OctNode;
use super::vec3::{Vec3, vec3};

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    pub(super) strength: f32,
    pub(super) softening: f32,
    /// Barnes-Hut opening angle; larger means coarser approximation.
    pub(super) theta: f32,
    /// Interactions beyond this distance are skipped entirely.
    pub(super) max_distance_sq: f32,
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) margin: f32,
    pub(super) max_distance_sq: f32,
}

fn separation_direction(from: usize, to: usize) -> Vec3 {
    // Coincident points get a deterministic push-apart direction so a
    // degenerate start never deadlocks.
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec3(angle.cos(), angle.sin(), 0.0)
}

/// In-plane unit direction derived from a node index, for nodes sitting
/// exactly at a force's singular point.
pub(super) fn fallback_direction(index: usize) -> Vec3 {
    let angle = ((index as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
    vec3(angle.cos(), angle.sin(), 0.0)
}

fn repulsion_between(point_a: Vec3, point_b: Vec3, params: ChargeParams) -> Vec3 {
    let delta = point_a - point_b;
    let distance_sq = delta.length_sq();
    if distance_sq > params.max_distance_sq {
        return Vec3::ZERO;
    }
    let direction = delta.normalized_or(vec3(1.0, 0.0, 0.0));
    direction * (params.strength / (distance_sq + params.softening))
}

pub(super) fn accumulate_repulsion_for_node(
    node: &OctNode,
    index: usize,
    positions: &[Vec3],
    params: ChargeParams,
    force: &mut Vec3,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            *force += repulsion_between(point, positions[other_index], params);
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq().max(0.0001);
    let distance = distance_sq.sqrt();
    let can_approximate = !node.bounds.contains(point)
        && ((node.bounds.side_length() / distance) < params.theta)
        && node.mass > 1.0;

    if can_approximate {
        if distance_sq > params.max_distance_sq {
            return;
        }
        let direction = delta / distance;
        let scaled = (params.strength * node.mass) / (distance_sq + params.softening);
        *force += direction * scaled;
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion_for_node(child, index, positions, params, force);
    }
}

fn collide_pair(
    from: usize,
    to: usize,
    positions: &[Vec3],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec3],
) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    let direction = delta.normalized_or(separation_direction(from, to));

    let min_distance = radii[from] + radii[to] + params.margin;
    if distance < min_distance {
        let overlap_push = (min_distance - distance) * params.strength;
        forces[from] += direction * overlap_push;
        forces[to] -= direction * overlap_push;
    }
}

pub(super) fn accumulate_collision_pairs(
    node_a: &OctNode,
    node_b: &OctNode,
    same_node: bool,
    positions: &[Vec3],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec3],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for i in 0..node_a.indices.len() {
                for j in (i + 1)..node_a.indices.len() {
                    collide_pair(
                        node_a.indices[i],
                        node_a.indices[j],
                        positions,
                        radii,
                        params,
                        forces,
                    );
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    collide_pair(from, to, positions, radii, params, forces);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..8 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, forces);

            for second in (first + 1)..8 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, params, forces,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, forces);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, forces);
        }
    }
}
