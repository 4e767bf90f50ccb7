mod load;
mod model;

pub use load::load_graph_model;
pub use model::{Entity, EntityKind, GraphModel, Relation, RelationKind, YearSpan};

/// Small historical network shared by tests across the crate: four kinds
/// of entities, varied degrees, and spans on both sides of 1900.
#[cfg(test)]
pub fn test_model() -> GraphModel {
    let data = serde_json::from_str(
        r#"{
            "nodes": [
                {"id": "napoleon", "name": "Napoleon Bonaparte", "type": "person",
                 "startYear": 1769, "endYear": 1821},
                {"id": "wellington", "name": "Duke of Wellington", "type": "person",
                 "startYear": 1769, "endYear": 1852},
                {"id": "churchill", "name": "Winston Churchill", "type": "person",
                 "startYear": 1874, "endYear": 1965},
                {"id": "france", "name": "First French Empire", "type": "organization",
                 "startYear": 1804, "endYear": 1814},
                {"id": "waterloo", "name": "Battle of Waterloo", "type": "event",
                 "startYear": 1815, "endYear": 1815},
                {"id": "yalta", "name": "Yalta Conference", "type": "event",
                 "startYear": 1945, "endYear": 1945},
                {"id": "paris", "name": "Paris", "type": "location"}
            ],
            "links": [
                {"source": "napoleon", "target": "france", "type": "membership"},
                {"source": "napoleon", "target": "waterloo", "type": "participation",
                 "startYear": 1815, "endYear": 1815},
                {"source": "wellington", "target": "waterloo", "type": "participation",
                 "startYear": 1815, "endYear": 1815},
                {"source": "napoleon", "target": "wellington", "type": "conflict"},
                {"source": "churchill", "target": "yalta", "type": "participation",
                 "startYear": 1945, "endYear": 1945},
                {"source": "france", "target": "paris", "type": "membership"},
                {"source": "napoleon", "target": "paris", "type": "political"}
            ]
        }"#,
    )
    .expect("test dataset parses");
    GraphModel::from_data(&data)
}
