use super::vec3::{Vec3, vec3};

const OCTREE_LEAF_CAPACITY: usize = 12;
const OCTREE_MAX_DEPTH: usize = 10;

/// Axis-aligned cube. A 2D layout has zero z spread, which simply leaves
/// the lower-z octants unused.
#[derive(Clone, Copy)]
pub(super) struct OctBounds {
    pub(super) center: Vec3,
    pub(super) half_extent: f32,
}

impl OctBounds {
    fn from_points(points: &[Vec3]) -> Option<Self> {
        let mut min = vec3(f32::INFINITY, f32::INFINITY, f32::INFINITY);
        let mut max = vec3(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            min.z = min.z.min(point.z);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
            max.z = max.z.max(point.z);
        }

        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let center = (min + max) * 0.5;
        let span = (max.x - min.x)
            .max(max.y - min.y)
            .max(max.z - min.z)
            .max(1.0);
        let half_extent = (span * 0.5) + 1.0;

        Some(Self {
            center,
            half_extent,
        })
    }

    pub(super) fn contains(self, point: Vec3) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
            && (point.z - self.center.z).abs() <= self.half_extent
    }

    fn child(self, octant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = vec3(
            if octant & 1 == 0 { -quarter } else { quarter },
            if octant & 2 == 0 { -quarter } else { quarter },
            if octant & 4 == 0 { -quarter } else { quarter },
        );

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn octant_for(self, point: Vec3) -> usize {
        let mut octant = 0;
        if point.x >= self.center.x {
            octant |= 1;
        }
        if point.y >= self.center.y {
            octant |= 2;
        }
        if point.z >= self.center.z {
            octant |= 4;
        }
        octant
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    pub(super) fn distance_sq_to(self, other: Self) -> f32 {
        let gap = self.half_extent + other.half_extent;
        let dx = ((self.center.x - other.center.x).abs() - gap).max(0.0);
        let dy = ((self.center.y - other.center.y).abs() - gap).max(0.0);
        let dz = ((self.center.z - other.center.z).abs() - gap).max(0.0);
        (dx * dx) + (dy * dy) + (dz * dz)
    }
}

pub(super) struct OctNode {
    pub(super) bounds: OctBounds,
    pub(super) center_of_mass: Vec3,
    pub(super) mass: f32,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<OctNode>>; 8],
}

impl OctNode {
    pub(super) fn build(positions: &[Vec3]) -> Option<Self> {
        let bounds = OctBounds::from_points(positions)?;
        let indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, 0))
    }

    fn build_node(
        bounds: OctBounds,
        indices: Vec<usize>,
        positions: &[Vec3],
        depth: usize,
    ) -> Self {
        let mut center_of_mass = Vec3::ZERO;
        for &index in &indices {
            center_of_mass += positions[index];
        }

        let mass = indices.len() as f32;
        if mass > 0.0 {
            center_of_mass /= mass;
        }

        let mut node = Self {
            bounds,
            center_of_mass,
            mass,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= OCTREE_MAX_DEPTH || node.indices.len() <= OCTREE_LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 8, _>(|_| Vec::new());
        for &index in &node.indices {
            let octant = bounds.octant_for(positions[index]);
            buckets[octant].push(index);
        }

        let non_empty = buckets.iter().filter(|bucket| !bucket.is_empty()).count();
        if non_empty <= 1 {
            return node;
        }

        for (octant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }

            let child_bounds = bounds.child(octant);
            node.children[octant] = Some(Box::new(Self::build_node(
                child_bounds,
                bucket,
                positions,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(|child| child.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_builds_no_tree() {
        assert!(OctNode::build(&[]).is_none());
    }

    #[test]
    fn small_point_set_stays_a_leaf() {
        let points = vec![vec3(0.0, 0.0, 0.0), vec3(10.0, 5.0, 0.0)];
        let tree = OctNode::build(&points).expect("tree");
        assert!(tree.is_leaf());
        assert_eq!(tree.mass, 2.0);
        assert_eq!(tree.indices.len(), 2);
    }

    #[test]
    fn large_spread_set_splits_and_conserves_mass() {
        let points = (0..64)
            .map(|i| {
                let f = i as f32;
                vec3(f * 17.0, (f * 13.0) % 200.0, 0.0)
            })
            .collect::<Vec<_>>();
        let tree = OctNode::build(&points).expect("tree");
        assert!(!tree.is_leaf());

        fn total_mass(node: &OctNode) -> f32 {
            if node.is_leaf() {
                node.indices.len() as f32
            } else {
                node.children
                    .iter()
                    .flatten()
                    .map(|child| total_mass(child))
                    .sum()
            }
        }
        assert_eq!(total_mass(&tree), 64.0);
    }

    #[test]
    fn planar_points_only_use_upper_z_octants() {
        let points = (0..40)
            .map(|i| vec3((i % 8) as f32 * 50.0, (i / 8) as f32 * 50.0, 0.0))
            .collect::<Vec<_>>();
        let tree = OctNode::build(&points).expect("tree");
        for point in &points {
            assert!(tree.bounds.contains(*point));
        }
    }
}
