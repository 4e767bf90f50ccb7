use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{
    self, Align2, Color32, FontId, PointerButton, Pos2, Rect, Sense, Shape, Stroke, Ui, vec2,
};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::format_year_span;

use super::drawables::{Drawable, DrawableKey, ElementId};
use super::interact::DragOutcome;
use super::render_utils::{
    circle_visible, draw_background, kind_color, lighten, relation_color, with_opacity,
};
use super::sim::LayoutSpace;
use super::style::{link_state, node_state, style_for_state};
use super::{SearchMatchCache, ViewModel};

const LABEL_RADIUS_THRESHOLD: f32 = 17.0;
const DASH_LENGTH: f32 = 7.0;
const GAP_LENGTH: f32 = 5.0;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    /// Fuzzy-matched visible-node indices for the current search query,
    /// cached per (query, subgraph revision). Selection takes precedence
    /// over search highlighting, so an active selection yields no set.
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        if self.selected.is_some() {
            return None;
        }

        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_cache
            && cached.subgraph_revision == self.subgraph_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .visible
            .entities
            .iter()
            .enumerate()
            .filter_map(|(visible_index, &model_index)| {
                let entity = &self.model.entities[model_index];
                fuzzy_match_score(&matcher, &entity.name, query).map(|_| visible_index)
            })
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            subgraph_revision: self.subgraph_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        match self.space {
            LayoutSpace::TwoD => {
                let pointer = ui
                    .input(|input| input.pointer.hover_pos())
                    .unwrap_or_else(|| rect.center());
                let world_before =
                    self.camera
                        .unproject(rect, LayoutSpace::TwoD, pointer, super::sim::Vec3::ZERO);
                self.camera.zoom = (self.camera.zoom * zoom_factor).clamp(0.05, 6.0);
                self.camera.pan = pointer
                    - rect.center()
                    - vec2(world_before.x, world_before.y) * self.camera.zoom;
            }
            LayoutSpace::ThreeD => {
                self.camera.zoom = (self.camera.zoom * zoom_factor).clamp(0.05, 6.0);
            }
        }
    }

    fn handle_pan_or_orbit(&mut self, response: &egui::Response) {
        let secondary = response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle);
        if !secondary {
            return;
        }

        let delta = response.drag_delta();
        match self.space {
            LayoutSpace::TwoD => self.camera.pan += delta,
            LayoutSpace::ThreeD => {
                self.camera.yaw += delta.x * 0.01;
                self.camera.pitch = (self.camera.pitch + delta.y * 0.01).clamp(-1.4, 1.4);
            }
        }
    }

    fn hovered_visible_index(
        pointer: Option<Pos2>,
        rect: Rect,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<usize> {
        let pointer = pointer?;
        (0..screen_positions.len())
            .filter(|&index| circle_visible(rect, screen_positions[index], screen_radii[index]))
            .filter_map(|index| {
                let distance = screen_positions[index].distance(pointer);
                (distance <= screen_radii[index]).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.filter_dirty {
            self.rebuild_subgraph(true);
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.camera.pan, self.camera.zoom);

        self.handle_zoom(ui, rect, &response);
        self.handle_pan_or_orbit(&response);

        if self.sim.is_none() {
            self.hovered_id = None;
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No entities match the current filters.",
                FontId::proportional(15.0),
                Color32::from_gray(180),
            );
            return;
        }

        let highlight = self.cached_search_matches();
        let space = self.space;
        let zoom = self.camera.zoom;

        let moving = self.sim.as_mut().is_some_and(|sim| sim.tick());
        let drag_live = self.drag.active_node().is_some();
        if moving || drag_live || response.dragged() {
            ui.ctx().request_repaint();
        }

        // Screen-space pass over the solver output. Radii shrink with
        // perspective in 3D and are clamped so dense graphs stay pickable.
        let Some(sim) = self.sim.as_ref() else {
            return;
        };
        self.screen_positions.clear();
        let mut screen_radii = Vec::with_capacity(sim.nodes().len());
        let mut depths = Vec::with_capacity(sim.nodes().len());
        for node in sim.nodes() {
            let (position, scale) = self.camera.project(rect, space, node.position);
            self.screen_positions.push(position);
            screen_radii.push((node.radius * zoom.powf(0.40) * scale).clamp(2.5, 46.0));
            depths.push(match space {
                LayoutSpace::TwoD => 0.0,
                LayoutSpace::ThreeD => self.camera.depth(node.position),
            });
        }

        self.draw_order.clear();
        self.draw_order.extend(0..sim.nodes().len());
        match space {
            LayoutSpace::TwoD => {
                let radii = &screen_radii;
                self.draw_order.sort_by(|a, b| radii[*a].total_cmp(&radii[*b]));
            }
            // Painter's algorithm: farthest first.
            LayoutSpace::ThreeD => {
                let depths = &depths;
                self.draw_order.sort_by(|a, b| depths[*b].total_cmp(&depths[*a]));
            }
        }

        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered =
            Self::hovered_visible_index(pointer, rect, &self.screen_positions, &screen_radii);
        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        let hovered_id = hovered.map(|index| sim.nodes()[index].id.clone());
        if hovered_id != self.hovered_id {
            if let Some(id) = &hovered_id {
                log::trace!("hovering entity {id}");
            }
            self.hovered_id = hovered_id.clone();
        }

        let shift_held = ui.input(|input| input.modifiers.shift);
        let mut pending_selection: Option<Option<String>> = None;

        if let Some(sim) = &mut self.sim {
            if response.drag_started_by(PointerButton::Primary)
                && let Some(index) = hovered
            {
                self.drag.begin(index, sim.nodes()[index].position, sim);
            }

            if response.dragged_by(PointerButton::Primary)
                && let Some(index) = self.drag.active_node()
                && let Some(pointer) = response.interact_pointer_pos()
            {
                let reference = sim.nodes()[index].position;
                let world = self.camera.unproject(rect, space, pointer, reference);
                self.drag
                    .update(world, response.drag_delta().length(), sim);
            }

            if response.drag_stopped_by(PointerButton::Primary) {
                match self.drag.end(shift_held, sim) {
                    DragOutcome::Click { node } => {
                        if shift_held {
                            // Shift-click toggles a standing pin in place.
                            let pin = match sim.nodes()[node].pin {
                                Some(_) => None,
                                None => Some(sim.nodes()[node].position),
                            };
                            sim.pin(node, pin);
                            if pin.is_none() {
                                sim.reheat(0.1);
                            }
                        } else {
                            pending_selection = Some(Some(sim.nodes()[node].id.clone()));
                        }
                    }
                    DragOutcome::Dragged { node, pinned } => {
                        log::debug!("drag released node {node}, pinned: {pinned}");
                    }
                    DragOutcome::None => {}
                }
            }
        }

        // Background click clears the selection; node clicks are resolved
        // through the drag gesture above so press and release agree on the
        // target.
        if response.clicked_by(PointerButton::Primary) && hovered.is_none() {
            pending_selection = Some(None);
        }

        let selected_index = self.selected_index();
        let highlight_set = highlight.as_deref();
        let mut valid_keys: HashSet<DrawableKey> = HashSet::new();

        // Links underneath nodes. The drawable key carries only the
        // discrete visual state; endpoints come from the live layout.
        let Some(sim) = self.sim.as_ref() else {
            return;
        };
        let zoom_sqrt = zoom.sqrt();
        for link in &self.visible.links {
            let start = self.screen_positions[link.source];
            let end = self.screen_positions[link.target];
            if !rect.intersects(Rect::from_two_pos(start, end)) {
                continue;
            }

            let state = link_state(
                link,
                selected_index,
                highlight_set,
                &self.filter.relationship_types,
            );
            let style = style_for_state(state);
            let key = DrawableKey {
                element: ElementId::Link(self.model.relations[link.relation].id.clone()),
                state,
            };
            valid_keys.insert(key.clone());

            let kind = link.kind;
            let weight = link.weight;
            let drawable = self.drawables.get_or_create(&key, || {
                let base_width = (1.0 + weight * 0.4).clamp(1.0, 3.0);
                let width = if style.emphasized {
                    base_width + 1.4
                } else {
                    base_width
                };
                Drawable::link(with_opacity(relation_color(kind), style.opacity), width, style.dashed)
            });

            if let Drawable::Link { stroke, dashed } = drawable {
                let mut stroke = *stroke;
                stroke.width = (stroke.width * zoom_sqrt).clamp(0.5, 5.0);
                if *dashed {
                    painter.extend(Shape::dashed_line(
                        &[start, end],
                        stroke,
                        DASH_LENGTH,
                        GAP_LENGTH,
                    ));
                } else {
                    painter.line_segment([start, end], stroke);
                }
            }
        }

        // Nodes, back to front.
        for draw_slot in 0..self.draw_order.len() {
            let index = self.draw_order[draw_slot];
            let position = self.screen_positions[index];
            let radius = screen_radii[index];
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let node = &sim.nodes()[index];
            let model_index = self.visible.entities[index];
            let entity = &self.model.entities[model_index];

            let mut state = node_state(index, selected_index, highlight_set);
            state.hovered = hovered == Some(index);
            let style = style_for_state(state);
            let key = DrawableKey {
                element: ElementId::Node(node.id.clone()),
                state,
            };
            valid_keys.insert(key.clone());

            let kind = entity.kind;
            let name = entity.name.clone();
            let drawable = self.drawables.get_or_create(&key, || {
                let mut fill = kind_color(kind);
                if state.hovered {
                    fill = lighten(fill, 0.25);
                }
                let fill = with_opacity(fill, style.opacity);
                let outline = if style.emphasized {
                    Stroke::new(2.2, Color32::from_rgb(245, 206, 93))
                } else {
                    Stroke::new(
                        1.0,
                        with_opacity(Color32::from_rgba_unmultiplied(15, 15, 15, 190), style.opacity),
                    )
                };
                Drawable::node(fill, outline, name)
            });

            if let Some(mesh) = drawable.mesh_at(position, radius) {
                painter.add(Shape::mesh(mesh));
            }
            if let Drawable::Node { outline, label, .. } = drawable {
                painter.circle_stroke(position, radius, *outline);

                if node.pin.is_some() {
                    painter.circle_stroke(
                        position,
                        radius + 3.0,
                        Stroke::new(1.2, Color32::from_rgba_unmultiplied(220, 220, 230, 140)),
                    );
                }

                let should_draw_label = style.emphasized
                    || state.hovered
                    || state.highlighted
                    || radius > LABEL_RADIUS_THRESHOLD
                    || zoom > 1.35;
                if should_draw_label {
                    painter.text(
                        position + vec2(radius + 5.0, 0.0),
                        Align2::LEFT_CENTER,
                        label,
                        FontId::proportional(12.0),
                        with_opacity(Color32::from_gray(238), style.opacity.max(0.6)),
                    );
                }
            }
        }

        self.drawables.sweep(&valid_keys);

        if let Some(id) = &self.hovered_id
            && let Some(&model_index) = self.model.index_by_id.get(id)
        {
            let entity = &self.model.entities[model_index];
            let span = entity
                .span
                .map(|span| format_year_span(span.start, span.end))
                .unwrap_or_else(|| "undated".to_owned());
            let info = format!(
                "{}  |  {}  |  {}  |  {} relations",
                entity.name,
                entity.kind.label(),
                span,
                self.model.degree[model_index]
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                info,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if let Some(selection) = pending_selection {
            self.select(selection);
        }
    }
}
