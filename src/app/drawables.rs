use std::collections::{HashMap, HashSet};

use eframe::egui::epaint::Mesh;
use eframe::egui::{Color32, Pos2, Stroke, pos2};

const CIRCLE_SEGMENTS: usize = 24;

/// Identity half of a cache key: which graph element a drawable was built
/// for. Carries the stable id, never an index, so a key can outlive one
/// subgraph revision only if the element itself does.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementId {
    Node(String),
    Link(String),
}

/// Discrete visual-state fingerprint. Only factors that change a
/// drawable's geometry or material belong here; continuous per-frame data
/// (position, zoom) stays out of the key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VisualState {
    pub selected: bool,
    pub highlighted: bool,
    /// Context-dimmed: some other element holds the selection or the
    /// highlight while this one is in neither.
    pub dimmed: bool,
    pub filtered: bool,
    pub hovered: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DrawableKey {
    pub element: ElementId,
    pub state: VisualState,
}

/// An owned render primitive: tessellated geometry plus material inputs.
pub enum Drawable {
    Node {
        /// Unit-radius circle fan at the origin; scaled and translated at
        /// paint time so tessellation happens once per key.
        mesh: Mesh,
        outline: Stroke,
        label: String,
    },
    Link {
        stroke: Stroke,
        dashed: bool,
    },
}

impl Drawable {
    pub fn node(fill: Color32, outline: Stroke, label: String) -> Self {
        let mut mesh = Mesh::default();
        let center = mesh.vertices.len() as u32;
        mesh.colored_vertex(pos2(0.0, 0.0), fill);
        for segment in 0..=CIRCLE_SEGMENTS {
            let angle = (segment as f32 / CIRCLE_SEGMENTS as f32) * std::f32::consts::TAU;
            mesh.colored_vertex(pos2(angle.cos(), angle.sin()), fill);
        }
        for segment in 0..CIRCLE_SEGMENTS as u32 {
            mesh.add_triangle(center, center + 1 + segment, center + 2 + segment);
        }

        Self::Node {
            mesh,
            outline,
            label,
        }
    }

    pub fn link(color: Color32, width: f32, dashed: bool) -> Self {
        Self::Link {
            stroke: Stroke::new(width, color),
            dashed,
        }
    }

    /// Instantiates the cached node geometry at a screen position.
    pub fn mesh_at(&self, center: Pos2, radius: f32) -> Option<Mesh> {
        let Self::Node { mesh, .. } = self else {
            return None;
        };
        let mut instance = mesh.clone();
        for vertex in &mut instance.vertices {
            vertex.pos = pos2(
                center.x + vertex.pos.x * radius,
                center.y + vertex.pos.y * radius,
            );
        }
        Some(instance)
    }

    /// Releases owned geometry before the entry is dropped.
    fn dispose(&mut self) {
        if let Self::Node { mesh, label, .. } = self {
            mesh.clear();
            label.clear();
        }
    }
}

/// Owned per-view drawable cache. Lives on the view model, never in module
/// state, so two views cannot leak entries into each other and disposal is
/// testable in isolation.
#[derive(Default)]
pub struct DrawableCache {
    entries: HashMap<DrawableKey, Drawable>,
    disposed_total: usize,
}

impl DrawableCache {
    /// Lazy and memoized: the same key always yields the same instance
    /// until a sweep removes it.
    pub fn get_or_create(
        &mut self,
        key: &DrawableKey,
        build: impl FnOnce() -> Drawable,
    ) -> &Drawable {
        self.entries
            .entry(key.clone())
            .or_insert_with(build)
    }

    /// Disposes every entry whose key is not in `valid`. Callers must pass
    /// the complete key set of the current pass; sweeping with a partial
    /// set would tear down drawables the pass still references.
    pub fn sweep(&mut self, valid: &HashSet<DrawableKey>) {
        let mut disposed = 0usize;
        self.entries.retain(|key, drawable| {
            if valid.contains(key) {
                true
            } else {
                drawable.dispose();
                disposed += 1;
                false
            }
        });
        self.disposed_total += disposed;
        if disposed > 0 {
            log::trace!("drawable sweep released {disposed} entries, {} live", self.entries.len());
        }
    }

    /// Full teardown on view unmount.
    pub fn clear(&mut self) {
        for drawable in self.entries.values_mut() {
            drawable.dispose();
        }
        self.disposed_total += self.entries.len();
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &DrawableKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn disposed_total(&self) -> usize {
        self.disposed_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_key(id: &str, selected: bool) -> DrawableKey {
        DrawableKey {
            element: ElementId::Node(id.to_owned()),
            state: VisualState {
                selected,
                ..VisualState::default()
            },
        }
    }

    fn build_node() -> Drawable {
        Drawable::node(
            Color32::from_rgb(120, 160, 220),
            Stroke::new(1.0, Color32::BLACK),
            "Test".to_owned(),
        )
    }

    #[test]
    fn get_or_create_memoizes_within_and_across_passes() {
        let mut cache = DrawableCache::default();
        let key = node_key("alexandria", false);

        let mut builds = 0usize;
        for _ in 0..3 {
            cache.get_or_create(&key, || {
                builds += 1;
                build_node()
            });
        }
        assert_eq!(builds, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn sweep_disposes_everything_outside_the_valid_set() {
        let mut cache = DrawableCache::default();
        let keep = node_key("kept", false);
        let drop_a = node_key("gone", false);
        let drop_b = node_key("kept", true);

        for key in [&keep, &drop_a, &drop_b] {
            cache.get_or_create(key, build_node);
        }
        assert_eq!(cache.len(), 3);

        let valid = HashSet::from([keep.clone()]);
        cache.sweep(&valid);

        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&keep));
        assert!(!cache.contains(&drop_a));
        assert!(!cache.contains(&drop_b));
        assert_eq!(cache.disposed_total(), 2);
    }

    #[test]
    fn visual_state_change_is_a_distinct_key() {
        let mut cache = DrawableCache::default();
        cache.get_or_create(&node_key("n", false), build_node);
        cache.get_or_create(&node_key("n", true), build_node);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn selection_change_rebuilds_context_node_material() {
        use crate::app::render_utils::with_opacity;
        use crate::app::style::{node_state, style_for_state};

        let mut cache = DrawableCache::default();
        let key_for = |selected: Option<usize>| DrawableKey {
            element: ElementId::Node("bystander".to_owned()),
            state: node_state(1, selected, None),
        };

        // Pass 1 with no selection, pass 2 with node 0 selected. The
        // bystander's state changes, so the dim material must be built
        // instead of the default one being served from the cache.
        let mut builds = 0usize;
        for selected in [None, Some(0)] {
            let key = key_for(selected);
            let style = style_for_state(key.state);
            cache.get_or_create(&key, || {
                builds += 1;
                Drawable::node(
                    with_opacity(Color32::WHITE, style.opacity),
                    Stroke::NONE,
                    String::new(),
                )
            });
        }
        assert_eq!(builds, 2);

        let alpha = |cache: &mut DrawableCache, key: &DrawableKey| {
            match cache.get_or_create(key, || unreachable!("must be cached")) {
                Drawable::Node { mesh, .. } => mesh.vertices[0].color.a(),
                Drawable::Link { .. } => unreachable!("node key"),
            }
        };
        let default_alpha = alpha(&mut cache, &key_for(None));
        let dim_alpha = alpha(&mut cache, &key_for(Some(0)));
        assert!(dim_alpha < default_alpha);
    }

    #[test]
    fn clear_disposes_all_entries() {
        let mut cache = DrawableCache::default();
        cache.get_or_create(&node_key("a", false), build_node);
        cache.get_or_create(&node_key("b", false), build_node);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.disposed_total(), 2);
    }

    #[test]
    fn node_mesh_instantiates_at_position_and_scale() {
        let drawable = build_node();
        let mesh = drawable
            .mesh_at(pos2(100.0, 50.0), 10.0)
            .expect("node drawable");
        assert!(!mesh.is_empty());

        // Every vertex lies within the scaled circle around the center.
        for vertex in &mesh.vertices {
            let dx = vertex.pos.x - 100.0;
            let dy = vertex.pos.y - 50.0;
            assert!((dx * dx + dy * dy).sqrt() <= 10.0 + 1e-3);
        }

        let link = Drawable::link(Color32::GRAY, 1.0, false);
        assert!(link.mesh_at(pos2(0.0, 0.0), 1.0).is_none());
    }
}
