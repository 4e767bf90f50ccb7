use std::collections::HashSet;

use super::drawables::VisualState;
use super::filter::{RelationToggles, VisibleLink};

pub const OPACITY_FULL: f32 = 1.0;
pub const OPACITY_DEFAULT: f32 = 0.85;
pub const OPACITY_FILTERED: f32 = 0.35;
pub const OPACITY_DIM: f32 = 0.15;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementStyle {
    pub opacity: f32,
    pub dashed: bool,
    /// Thicker stroke for links incident to the selection.
    pub emphasized: bool,
}

impl ElementStyle {
    fn plain(opacity: f32) -> Self {
        Self {
            opacity,
            dashed: false,
            emphasized: false,
        }
    }
}

fn highlight_active(highlighted: Option<&HashSet<usize>>) -> bool {
    highlighted.is_some_and(|set| !set.is_empty())
}

/// Resolves a node's discrete visual state from selection and highlight
/// state alone. Pure: re-evaluated on every selection/highlight/filter
/// change without touching the simulation. The `hovered` flag is a
/// per-frame pointer fact and is filled in by the render pass.
pub fn node_state(
    index: usize,
    selected: Option<usize>,
    highlighted: Option<&HashSet<usize>>,
) -> VisualState {
    let highlight_on = highlight_active(highlighted);
    let is_selected = selected == Some(index);
    let is_highlighted = highlight_on && highlighted.is_some_and(|set| set.contains(&index));
    VisualState {
        selected: is_selected,
        highlighted: is_highlighted,
        dimmed: !is_selected && !is_highlighted && (selected.is_some() || highlight_on),
        filtered: false,
        hovered: false,
    }
}

/// Resolves a link's discrete visual state. `selected` means incident to
/// the selected node, `highlighted` means touching the highlight set, and
/// `filtered` records a disabled relationship kind regardless of the
/// other flags so the dash can return when a selection clears.
pub fn link_state(
    link: &VisibleLink,
    selected: Option<usize>,
    highlighted: Option<&HashSet<usize>>,
    relationship_types: &RelationToggles,
) -> VisualState {
    let highlight_on = highlight_active(highlighted);
    let incident = selected.is_some_and(|index| link.source == index || link.target == index);
    let touching = highlight_on
        && highlighted.is_some_and(|set| set.contains(&link.source) || set.contains(&link.target));
    VisualState {
        selected: incident,
        highlighted: touching,
        dimmed: !incident && !touching && (selected.is_some() || highlight_on),
        filtered: !relationship_types.enabled(link.kind),
        hovered: false,
    }
}

/// Derives the material for a drawable from its visual state. Precedence,
/// highest first: holds/touches the selection; touches the highlight set;
/// dimmed while either is active elsewhere; relationship kind filtered
/// off (dashed, still visible); default. A filtered-off kind is never
/// hidden outright so the link stays inspectable.
///
/// Every factor this function reads is a field of the state, so a cache
/// keyed on the state can never serve a stale material.
pub fn style_for_state(state: VisualState) -> ElementStyle {
    if state.selected {
        return ElementStyle {
            opacity: OPACITY_FULL,
            dashed: false,
            emphasized: true,
        };
    }
    if state.highlighted {
        return ElementStyle::plain(OPACITY_FULL);
    }
    if state.dimmed {
        return ElementStyle::plain(OPACITY_DIM);
    }
    if state.filtered {
        return ElementStyle {
            opacity: OPACITY_FILTERED,
            dashed: true,
            emphasized: false,
        };
    }
    ElementStyle::plain(OPACITY_DEFAULT)
}

pub fn node_style(
    index: usize,
    selected: Option<usize>,
    highlighted: Option<&HashSet<usize>>,
) -> ElementStyle {
    style_for_state(node_state(index, selected, highlighted))
}

pub fn link_style(
    link: &VisibleLink,
    selected: Option<usize>,
    highlighted: Option<&HashSet<usize>>,
    relationship_types: &RelationToggles,
) -> ElementStyle {
    style_for_state(link_state(link, selected, highlighted, relationship_types))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RelationKind;

    fn link(source: usize, target: usize, kind: RelationKind) -> VisibleLink {
        VisibleLink {
            relation: 0,
            source,
            target,
            kind,
            weight: 1.0,
        }
    }

    #[test]
    fn selected_node_and_incident_links_get_full_opacity() {
        // Node 0 selected with neighbors 1, 2, 3; nodes 4 and 5 unrelated.
        let links = vec![
            link(0, 1, RelationKind::Family),
            link(0, 2, RelationKind::Political),
            link(3, 0, RelationKind::Alliance),
            link(4, 5, RelationKind::Conflict),
        ];
        let selected = Some(0);
        let toggles = RelationToggles::default();

        assert_eq!(node_style(0, selected, None).opacity, OPACITY_FULL);
        for incident in &links[..3] {
            assert_eq!(
                link_style(incident, selected, None, &toggles).opacity,
                OPACITY_FULL
            );
        }
        // Neighbors themselves fade along with the rest of the context.
        for other in 1..=5 {
            assert_eq!(node_style(other, selected, None).opacity, OPACITY_DIM);
        }
        assert_eq!(
            link_style(&links[3], selected, None, &toggles).opacity,
            OPACITY_DIM
        );
    }

    #[test]
    fn highlight_set_brightens_touching_elements() {
        let matches = HashSet::from([2usize]);
        let toggles = RelationToggles::default();

        assert_eq!(node_style(2, None, Some(&matches)).opacity, OPACITY_FULL);
        assert_eq!(node_style(7, None, Some(&matches)).opacity, OPACITY_DIM);

        let touching = link(2, 9, RelationKind::Membership);
        let unrelated = link(8, 9, RelationKind::Membership);
        assert_eq!(
            link_style(&touching, None, Some(&matches), &toggles).opacity,
            OPACITY_FULL
        );
        assert_eq!(
            link_style(&unrelated, None, Some(&matches), &toggles).opacity,
            OPACITY_DIM
        );
    }

    #[test]
    fn empty_highlight_set_is_not_active() {
        let matches = HashSet::new();
        assert_eq!(
            node_style(3, None, Some(&matches)).opacity,
            OPACITY_DEFAULT
        );
    }

    #[test]
    fn filtered_relationship_renders_dashed_not_hidden() {
        let mut toggles = RelationToggles::default();
        toggles.set(RelationKind::Conflict, false);

        let filtered = link(1, 2, RelationKind::Conflict);
        let style = link_style(&filtered, None, None, &toggles);
        assert_eq!(style.opacity, OPACITY_FILTERED);
        assert!(style.dashed);
        assert!(style.opacity > 0.0);
    }

    #[test]
    fn selection_outranks_relationship_filter() {
        let mut toggles = RelationToggles::default();
        toggles.set(RelationKind::Conflict, false);

        let incident = link(0, 1, RelationKind::Conflict);
        let style = link_style(&incident, Some(0), None, &toggles);
        assert_eq!(style.opacity, OPACITY_FULL);
        assert!(!style.dashed);
        assert!(style.emphasized);
    }

    #[test]
    fn selecting_elsewhere_changes_a_bystander_node_state() {
        // A cache keyed on the state must rebuild the bystander's material
        // when a selection appears, so the two states have to differ.
        let before = node_state(1, None, None);
        let during = node_state(1, Some(0), None);
        assert_ne!(before, during);
        assert!(during.dimmed);

        assert_eq!(style_for_state(before).opacity, OPACITY_DEFAULT);
        assert_eq!(style_for_state(during).opacity, OPACITY_DIM);

        // Clearing the selection resolves right back to the first state.
        assert_eq!(node_state(1, None, None), before);
    }

    #[test]
    fn filtered_link_regains_its_dash_when_selection_clears() {
        let mut toggles = RelationToggles::default();
        toggles.set(RelationKind::Conflict, false);
        let filtered = link(2, 3, RelationKind::Conflict);

        let during = link_state(&filtered, Some(0), None, &toggles);
        let after = link_state(&filtered, None, None, &toggles);
        assert_ne!(during, after);

        let dim = style_for_state(during);
        assert_eq!(dim.opacity, OPACITY_DIM);
        assert!(!dim.dashed);

        let dashed = style_for_state(after);
        assert_eq!(dashed.opacity, OPACITY_FILTERED);
        assert!(dashed.dashed);
    }

    #[test]
    fn distinct_materials_never_share_a_visual_state() {
        let mut toggles = RelationToggles::default();
        toggles.set(RelationKind::Conflict, false);
        let matches = HashSet::from([4usize]);

        // One link per precedence tier: incident to the selection,
        // touching the highlight, dimmed bystander, filtered kind,
        // default.
        let states = [
            link_state(&link(0, 1, RelationKind::Family), Some(0), None, &toggles),
            link_state(&link(4, 5, RelationKind::Family), None, Some(&matches), &toggles),
            link_state(&link(2, 3, RelationKind::Family), Some(0), None, &toggles),
            link_state(&link(2, 3, RelationKind::Conflict), None, None, &toggles),
            link_state(&link(2, 3, RelationKind::Family), None, None, &toggles),
        ];

        for (i, a) in states.iter().enumerate() {
            for b in &states[i + 1..] {
                let style_a = style_for_state(*a);
                let style_b = style_for_state(*b);
                if style_a != style_b {
                    assert_ne!(a, b, "{style_a:?} vs {style_b:?} need distinct cache states");
                }
            }
        }
        assert_eq!(style_for_state(states[0]).opacity, OPACITY_FULL);
        assert_eq!(style_for_state(states[1]).opacity, OPACITY_FULL);
        assert_eq!(style_for_state(states[2]).opacity, OPACITY_DIM);
        assert_eq!(style_for_state(states[3]).opacity, OPACITY_FILTERED);
        assert_eq!(style_for_state(states[4]).opacity, OPACITY_DEFAULT);
    }

    #[test]
    fn default_style_is_medium_high() {
        let toggles = RelationToggles::default();
        assert_eq!(node_style(0, None, None).opacity, OPACITY_DEFAULT);
        let style = link_style(&link(0, 1, RelationKind::Family), None, None, &toggles);
        assert_eq!(style.opacity, OPACITY_DEFAULT);
        assert!(!style.dashed);
    }
}
