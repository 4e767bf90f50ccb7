use std::collections::HashMap;

use crate::data::{EntityKind, GraphModel, RelationKind};

use super::sim::{NodeSeed, PlacementMode, SimLink};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityToggles([bool; EntityKind::ALL.len()]);

impl Default for EntityToggles {
    fn default() -> Self {
        Self([true; EntityKind::ALL.len()])
    }
}

impl EntityToggles {
    pub fn enabled(&self, kind: EntityKind) -> bool {
        self.0[kind.index()]
    }

    pub fn enabled_mut(&mut self, kind: EntityKind) -> &mut bool {
        &mut self.0[kind.index()]
    }

    pub fn set(&mut self, kind: EntityKind, enabled: bool) {
        self.0[kind.index()] = enabled;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelationToggles([bool; RelationKind::ALL.len()]);

impl Default for RelationToggles {
    fn default() -> Self {
        Self([true; RelationKind::ALL.len()])
    }
}

impl RelationToggles {
    pub fn enabled(&self, kind: RelationKind) -> bool {
        self.0[kind.index()]
    }

    pub fn enabled_mut(&mut self, kind: RelationKind) -> &mut bool {
        &mut self.0[kind.index()]
    }

    pub fn set(&mut self, kind: RelationKind, enabled: bool) {
        self.0[kind.index()] = enabled;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeSizeAttribute {
    Degree,
    NeighborCount,
    Equal,
}

impl NodeSizeAttribute {
    pub fn label(self) -> &'static str {
        match self {
            Self::Degree => "Degree",
            Self::NeighborCount => "Neighbors",
            Self::Equal => "Equal",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FilterState {
    pub entity_types: EntityToggles,
    pub relationship_types: RelationToggles,
    pub time_range: (i32, i32),
    pub layout_mode: PlacementMode,
    pub node_size: NodeSizeAttribute,
}

impl FilterState {
    pub fn for_model(model: &GraphModel) -> Self {
        let time_range = model.year_bounds.unwrap_or((-1000, 2100));
        Self {
            entity_types: EntityToggles::default(),
            relationship_types: RelationToggles::default(),
            time_range,
            layout_mode: PlacementMode::Plain,
            node_size: NodeSizeAttribute::Degree,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct VisibleLink {
    /// Index into the model's relation table.
    pub relation: usize,
    /// Endpoint indices into the visible node list, already resolved.
    pub source: usize,
    pub target: usize,
    pub kind: RelationKind,
    pub weight: f32,
}

/// Filter-derived subset of the model. Owns no physics state; it is
/// recomputed whenever a filter predicate changes and then feeds the
/// simulation through `node_seeds`/`sim_links`.
#[derive(Clone, Debug, Default)]
pub struct VisibleGraph {
    /// Model indices of visible entities, in model order.
    pub entities: Vec<usize>,
    pub links: Vec<VisibleLink>,
}

impl VisibleGraph {
    /// Entity-type toggles and the year range decide node membership; a
    /// link needs both endpoints visible and a span overlapping the range.
    /// Relationship-type toggles deliberately play no part here: a
    /// filtered-off relationship kind stays in the subgraph and in the
    /// layout forces, and only renders dimmed/dashed.
    pub fn build(model: &GraphModel, filter: &FilterState) -> Self {
        let (range_start, range_end) = filter.time_range;

        let mut entities = Vec::new();
        let mut visible_index = HashMap::new();
        for (index, entity) in model.entities.iter().enumerate() {
            if !filter.entity_types.enabled(entity.kind) {
                continue;
            }
            if let Some(span) = entity.span
                && !span.overlaps(range_start, range_end)
            {
                continue;
            }
            visible_index.insert(index, entities.len());
            entities.push(index);
        }

        let mut links = Vec::new();
        for (index, relation) in model.relations.iter().enumerate() {
            let (Some(&source), Some(&target)) = (
                visible_index.get(&relation.source),
                visible_index.get(&relation.target),
            ) else {
                continue;
            };
            if let Some(span) = relation.span
                && !span.overlaps(range_start, range_end)
            {
                continue;
            }
            links.push(VisibleLink {
                relation: index,
                source,
                target,
                kind: relation.kind,
                weight: relation.weight,
            });
        }

        Self { entities, links }
    }

    pub fn node_seeds(&self, model: &GraphModel, filter: &FilterState) -> Vec<NodeSeed> {
        let values = self
            .entities
            .iter()
            .map(|&index| match filter.node_size {
                NodeSizeAttribute::Degree => model.degree[index],
                NodeSizeAttribute::NeighborCount => model.neighbor_count[index],
                NodeSizeAttribute::Equal => 1,
            })
            .collect::<Vec<_>>();
        let min = values.iter().copied().min().unwrap_or(0);
        let max = values.iter().copied().max().unwrap_or(0);

        self.entities
            .iter()
            .zip(values)
            .map(|(&index, value)| {
                let entity = &model.entities[index];
                NodeSeed {
                    id: entity.id.clone(),
                    radius: node_radius(value, min, max),
                    band: entity.kind.index(),
                }
            })
            .collect()
    }

    pub fn sim_links(&self) -> Vec<SimLink> {
        self.links
            .iter()
            .map(|link| SimLink {
                source: link.source,
                target: link.target,
                weight: link.weight,
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.entities.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn node_radius(value: usize, min: usize, max: usize) -> f32 {
    if max <= min {
        return 10.0;
    }
    let t = (value - min) as f32 / (max - min) as f32;
    7.0 + (t * 14.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_model;

    #[test]
    fn entity_toggle_removes_nodes_and_their_links() {
        let model = test_model();
        let mut filter = FilterState::for_model(&model);

        let all = VisibleGraph::build(&model, &filter);
        assert_eq!(all.node_count(), model.entity_count());
        assert_eq!(all.link_count(), model.relation_count());

        filter.entity_types.set(EntityKind::Event, false);
        let without_events = VisibleGraph::build(&model, &filter);
        assert!(without_events.node_count() < all.node_count());
        for &index in &without_events.entities {
            assert_ne!(model.entities[index].kind, EntityKind::Event);
        }
        // No dangling endpoints: every surviving link points at a visible node.
        for link in &without_events.links {
            assert!(link.source < without_events.node_count());
            assert!(link.target < without_events.node_count());
        }
    }

    #[test]
    fn relationship_toggle_never_changes_membership() {
        let model = test_model();
        let mut filter = FilterState::for_model(&model);
        let before = VisibleGraph::build(&model, &filter);

        for kind in RelationKind::ALL {
            filter.relationship_types.set(kind, false);
        }
        let after = VisibleGraph::build(&model, &filter);

        assert_eq!(before.node_count(), after.node_count());
        assert_eq!(before.link_count(), after.link_count());
    }

    #[test]
    fn time_range_excludes_out_of_range_spans() {
        let model = test_model();
        let mut filter = FilterState::for_model(&model);
        filter.time_range = (1900, 2000);

        let visible = VisibleGraph::build(&model, &filter);
        for &index in &visible.entities {
            if let Some(span) = model.entities[index].span {
                assert!(span.overlaps(1900, 2000));
            }
        }
        for link in &visible.links {
            if let Some(span) = model.relations[link.relation].span {
                assert!(span.overlaps(1900, 2000));
            }
        }
    }

    #[test]
    fn equal_sizing_gives_uniform_radii() {
        let model = test_model();
        let mut filter = FilterState::for_model(&model);
        filter.node_size = NodeSizeAttribute::Equal;

        let visible = VisibleGraph::build(&model, &filter);
        let seeds = visible.node_seeds(&model, &filter);
        assert!(seeds.iter().all(|seed| seed.radius == 10.0));
    }

    #[test]
    fn degree_sizing_scales_between_bounds() {
        let model = test_model();
        let filter = FilterState::for_model(&model);
        let visible = VisibleGraph::build(&model, &filter);
        let seeds = visible.node_seeds(&model, &filter);

        for seed in &seeds {
            assert!(seed.radius >= 7.0 && seed.radius <= 21.0);
        }
        let min = seeds.iter().map(|s| s.radius).fold(f32::INFINITY, f32::min);
        let max = seeds
            .iter()
            .map(|s| s.radius)
            .fold(f32::NEG_INFINITY, f32::max);
        assert!(max > min, "test model has varied degrees");
    }

    #[test]
    fn sim_links_mirror_visible_links() {
        let model = test_model();
        let filter = FilterState::for_model(&model);
        let visible = VisibleGraph::build(&model, &filter);
        let sim_links = visible.sim_links();

        assert_eq!(sim_links.len(), visible.link_count());
        for (sim_link, link) in sim_links.iter().zip(&visible.links) {
            assert_eq!(sim_link.source, link.source);
            assert_eq!(sim_link.target, link.target);
        }
    }
}
