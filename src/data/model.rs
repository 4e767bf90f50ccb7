use std::collections::{HashMap, HashSet};

use super::load::{GraphData, RawEntity, RawRelation};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Person,
    Organization,
    Event,
    Location,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Person,
        EntityKind::Organization,
        EntityKind::Event,
        EntityKind::Location,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Organization => "Organization",
            Self::Event => "Event",
            Self::Location => "Location",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Person => 0,
            Self::Organization => 1,
            Self::Event => 2,
            Self::Location => 3,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "person" | "people" => Some(Self::Person),
            "organization" | "organisation" | "org" => Some(Self::Organization),
            "event" => Some(Self::Event),
            "location" | "place" => Some(Self::Location),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Family,
    Political,
    Conflict,
    Alliance,
    Membership,
    Participation,
}

impl RelationKind {
    pub const ALL: [RelationKind; 6] = [
        RelationKind::Family,
        RelationKind::Political,
        RelationKind::Conflict,
        RelationKind::Alliance,
        RelationKind::Membership,
        RelationKind::Participation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Family => "Family",
            Self::Political => "Political",
            Self::Conflict => "Conflict",
            Self::Alliance => "Alliance",
            Self::Membership => "Membership",
            Self::Participation => "Participation",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Family => 0,
            Self::Political => 1,
            Self::Conflict => 2,
            Self::Alliance => 3,
            Self::Membership => 4,
            Self::Participation => 5,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "family" | "kinship" | "marriage" => Some(Self::Family),
            "political" | "diplomatic" => Some(Self::Political),
            "conflict" | "war" | "rivalry" => Some(Self::Conflict),
            "alliance" | "treaty" => Some(Self::Alliance),
            "membership" | "member" => Some(Self::Membership),
            "participation" | "participant" => Some(Self::Participation),
            _ => None,
        }
    }
}

/// Inclusive year interval. Years are signed; BCE years are negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearSpan {
    pub start: i32,
    pub end: i32,
}

impl YearSpan {
    fn from_raw(start: Option<i32>, end: Option<i32>) -> Option<Self> {
        match (start, end) {
            (None, None) => None,
            (start, end) => {
                let start = start.or(end).unwrap_or(0);
                let end = end.unwrap_or(start).max(start);
                Some(Self { start, end })
            }
        }
    }

    pub fn overlaps(self, range_start: i32, range_end: i32) -> bool {
        self.start <= range_end && self.end >= range_start
    }
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub span: Option<YearSpan>,
}

/// A typed relationship with endpoints already resolved to entity indices.
/// String ids are never re-interpreted downstream of the model.
#[derive(Clone, Debug)]
pub struct Relation {
    pub id: String,
    pub source: usize,
    pub target: usize,
    pub kind: RelationKind,
    pub weight: f32,
    pub span: Option<YearSpan>,
}

#[derive(Clone, Debug)]
pub struct GraphModel {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
    pub index_by_id: HashMap<String, usize>,
    pub degree: Vec<usize>,
    pub neighbor_count: Vec<usize>,
    /// Min/max year across all spans, used to seed the time-range filter.
    pub year_bounds: Option<(i32, i32)>,
}

impl GraphModel {
    pub(super) fn from_data(data: &GraphData) -> Self {
        let mut entities = Vec::with_capacity(data.nodes.len());
        let mut index_by_id = HashMap::with_capacity(data.nodes.len());
        let mut dropped_entities = 0usize;

        for raw in &data.nodes {
            let Some(entity) = normalize_entity(raw) else {
                dropped_entities += 1;
                continue;
            };
            if index_by_id.contains_key(&entity.id) {
                dropped_entities += 1;
                continue;
            }
            index_by_id.insert(entity.id.clone(), entities.len());
            entities.push(entity);
        }

        let mut relations = Vec::with_capacity(data.links.len());
        let mut seen = HashSet::with_capacity(data.links.len());
        let mut dropped_relations = 0usize;

        for raw in &data.links {
            let Some(relation) = normalize_relation(raw, &index_by_id) else {
                dropped_relations += 1;
                continue;
            };
            if !seen.insert(relation.id.clone()) {
                dropped_relations += 1;
                continue;
            }
            relations.push(relation);
        }

        if dropped_entities > 0 || dropped_relations > 0 {
            log::debug!(
                "dropped {dropped_entities} malformed entity records and \
                 {dropped_relations} malformed/duplicate relation records"
            );
        }

        let mut degree = vec![0usize; entities.len()];
        let mut neighbors = vec![HashSet::new(); entities.len()];
        for relation in &relations {
            degree[relation.source] += 1;
            degree[relation.target] += 1;
            neighbors[relation.source].insert(relation.target);
            neighbors[relation.target].insert(relation.source);
        }
        let neighbor_count = neighbors.into_iter().map(|set| set.len()).collect();

        let mut year_bounds: Option<(i32, i32)> = None;
        let spans = entities
            .iter()
            .filter_map(|entity| entity.span)
            .chain(relations.iter().filter_map(|relation| relation.span));
        for span in spans {
            year_bounds = Some(match year_bounds {
                Some((min, max)) => (min.min(span.start), max.max(span.end)),
                None => (span.start, span.end),
            });
        }

        Self {
            entities,
            relations,
            index_by_id,
            degree,
            neighbor_count,
            year_bounds,
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }
}

fn normalize_entity(raw: &RawEntity) -> Option<Entity> {
    if raw.id.trim().is_empty() {
        return None;
    }
    let kind = EntityKind::parse(raw.kind.as_deref()?)?;
    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(raw.id.as_str())
        .to_owned();

    Some(Entity {
        id: raw.id.clone(),
        name,
        kind,
        span: YearSpan::from_raw(raw.start_year, raw.end_year),
    })
}

fn normalize_relation(
    raw: &RawRelation,
    index_by_id: &HashMap<String, usize>,
) -> Option<Relation> {
    // A link whose endpoint is unknown is dropped here, never rendered
    // with a dangling reference.
    let source = *index_by_id.get(&raw.source)?;
    let target = *index_by_id.get(&raw.target)?;
    if source == target {
        return None;
    }
    let kind = RelationKind::parse(raw.kind.as_deref()?)?;

    Some(Relation {
        id: format!("{}|{}|{}", raw.source, kind.label(), raw.target),
        source,
        target,
        kind,
        weight: raw.weight.filter(|w| w.is_finite() && *w > 0.0).unwrap_or(1.0),
        span: YearSpan::from_raw(raw.start_year, raw.end_year),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_entity(id: &str, kind: &str) -> RawEntity {
        RawEntity {
            id: id.to_owned(),
            name: None,
            kind: Some(kind.to_owned()),
            start_year: None,
            end_year: None,
        }
    }

    fn raw_relation(source: &str, target: &str, kind: &str) -> RawRelation {
        RawRelation {
            source: source.to_owned(),
            target: target.to_owned(),
            kind: Some(kind.to_owned()),
            weight: None,
            start_year: None,
            end_year: None,
        }
    }

    #[test]
    fn drops_relations_with_unknown_endpoints() {
        let data = GraphData {
            nodes: vec![raw_entity("a", "person"), raw_entity("b", "event")],
            links: vec![
                raw_relation("a", "b", "participation"),
                raw_relation("a", "ghost", "family"),
                raw_relation("ghost", "b", "family"),
            ],
        };

        let model = GraphModel::from_data(&data);
        assert_eq!(model.entity_count(), 2);
        assert_eq!(model.relation_count(), 1);
        assert_eq!(model.relations[0].kind, RelationKind::Participation);
    }

    #[test]
    fn drops_self_loops_and_duplicate_ids() {
        let data = GraphData {
            nodes: vec![
                raw_entity("a", "person"),
                raw_entity("a", "person"),
                raw_entity("b", "location"),
            ],
            links: vec![
                raw_relation("a", "a", "family"),
                raw_relation("a", "b", "membership"),
                raw_relation("a", "b", "membership"),
            ],
        };

        let model = GraphModel::from_data(&data);
        assert_eq!(model.entity_count(), 2);
        assert_eq!(model.relation_count(), 1);
    }

    #[test]
    fn degree_and_neighbor_counts_disagree_on_parallel_links() {
        let data = GraphData {
            nodes: vec![raw_entity("a", "person"), raw_entity("b", "person")],
            links: vec![
                raw_relation("a", "b", "family"),
                raw_relation("a", "b", "political"),
            ],
        };

        let model = GraphModel::from_data(&data);
        assert_eq!(model.degree[0], 2);
        assert_eq!(model.neighbor_count[0], 1);
    }

    #[test]
    fn weight_defaults_to_one_and_rejects_nonsense() {
        let mut link = raw_relation("a", "b", "alliance");
        link.weight = Some(-3.0);
        let data = GraphData {
            nodes: vec![raw_entity("a", "organization"), raw_entity("b", "organization")],
            links: vec![link],
        };

        let model = GraphModel::from_data(&data);
        assert_eq!(model.relations[0].weight, 1.0);
    }

    #[test]
    fn year_bounds_cover_entity_and_relation_spans() {
        let mut node = raw_entity("a", "person");
        node.start_year = Some(-100);
        node.end_year = Some(-30);
        let mut other = raw_entity("b", "event");
        other.start_year = Some(1066);
        let mut link = raw_relation("a", "b", "participation");
        link.start_year = Some(500);
        link.end_year = Some(1500);

        let data = GraphData {
            nodes: vec![node, other],
            links: vec![link],
        };

        let model = GraphModel::from_data(&data);
        assert_eq!(model.year_bounds, Some((-100, 1500)));
        assert!(model.entities[0].span.expect("span").overlaps(-50, 0));
        assert!(!model.entities[0].span.expect("span").overlaps(0, 100));
    }

    #[test]
    fn unknown_kinds_are_dropped_not_guessed() {
        let data = GraphData {
            nodes: vec![raw_entity("a", "spaceship"), raw_entity("b", "person")],
            links: vec![],
        };

        let model = GraphModel::from_data(&data);
        assert_eq!(model.entity_count(), 1);
        assert_eq!(model.entities[0].kind, EntityKind::Person);
    }
}
