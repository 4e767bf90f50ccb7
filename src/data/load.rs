use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use super::model::GraphModel;

/// Raw entity record as it appears in the dataset JSON. Upstream data is
/// untrusted, so every field except `id` is optional.
#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawEntity {
    pub(super) id: String,
    #[serde(default)]
    pub(super) name: Option<String>,
    #[serde(default, rename = "type")]
    pub(super) kind: Option<String>,
    #[serde(default, rename = "startYear")]
    pub(super) start_year: Option<i32>,
    #[serde(default, rename = "endYear")]
    pub(super) end_year: Option<i32>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawRelation {
    pub(super) source: String,
    pub(super) target: String,
    #[serde(default, rename = "type")]
    pub(super) kind: Option<String>,
    #[serde(default)]
    pub(super) weight: Option<f32>,
    #[serde(default, rename = "startYear")]
    pub(super) start_year: Option<i32>,
    #[serde(default, rename = "endYear")]
    pub(super) end_year: Option<i32>,
}

/// Immutable dataset value handed over by the ingestion side: ordered
/// entity records plus ordered relationship records, loaded once per
/// dataset swap.
#[derive(Clone, Debug, Deserialize)]
pub(super) struct GraphData {
    #[serde(default)]
    pub(super) nodes: Vec<RawEntity>,
    #[serde(default)]
    pub(super) links: Vec<RawRelation>,
}

pub fn load_graph_model(path: &Path) -> Result<GraphModel> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading dataset {}", path.display()))?;
    let data: GraphData = serde_json::from_str(&raw).context("invalid dataset JSON")?;

    if data.nodes.is_empty() {
        bail!("dataset {} contains no entity records", path.display());
    }

    let model = GraphModel::from_data(&data);
    log::info!(
        "loaded dataset {}: {} entities, {} relations",
        path.display(),
        model.entity_count(),
        model.relation_count()
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_records_tolerate_missing_fields() {
        let data: GraphData = serde_json::from_str(
            r#"{
                "nodes": [{"id": "a"}, {"id": "b", "type": "event", "startYear": 1066}],
                "links": [{"source": "a", "target": "b"}]
            }"#,
        )
        .expect("parses");

        assert_eq!(data.nodes.len(), 2);
        assert!(data.nodes[0].name.is_none());
        assert_eq!(data.nodes[1].kind.as_deref(), Some("event"));
        assert_eq!(data.nodes[1].start_year, Some(1066));
        assert!(data.links[0].weight.is_none());
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let data: GraphData = serde_json::from_str("{}").expect("parses");
        assert!(data.nodes.is_empty());
        assert!(data.links.is_empty());
    }
}
