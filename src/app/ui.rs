use std::path::Path;

use eframe::egui::{self, Align, Context, Layout, Ui};

use crate::data::{EntityKind, RelationKind};
use crate::util::format_year_span;

use super::filter::NodeSizeAttribute;
use super::render_utils::Camera;
use super::sim::{LayoutSpace, PlacementMode};
use super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        dataset_path: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("chronica");
                    ui.separator();
                    ui.label(format!("dataset: {}", dataset_path.display()));
                    ui.label(format!("entities: {}", self.model.entity_count()));
                    ui.label(format!("relations: {}", self.model.relation_count()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload dataset"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "visible: {} / {}",
                            self.visible_node_count, self.visible_link_count
                        ));
                        if let Some(sim) = &self.sim {
                            ui.label(format!("alpha: {:.3}", sim.alpha()));
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading entity network...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Network Controls");
        ui.separator();
        ui.add_space(4.0);

        let mut rebuild_needed = false;

        ui.label("Search")
            .on_hover_text("Fuzzy-highlight matching entities without changing the layout.");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Type to highlight matches, then click one to select it.");

        ui.separator();

        ui.label("Entity types");
        for kind in EntityKind::ALL {
            let checkbox = ui.checkbox(self.filter.entity_types.enabled_mut(kind), kind.label());
            rebuild_needed |= checkbox.changed();
        }

        ui.add_space(6.0);
        ui.label("Relationship types")
            .on_hover_text("Disabled kinds render dimmed and dashed but keep shaping the layout.");
        for kind in RelationKind::ALL {
            // Style-only toggle: membership and forces are untouched, so
            // no rebuild happens here.
            ui.checkbox(self.filter.relationship_types.enabled_mut(kind), kind.label());
        }

        ui.separator();

        let (bounds_start, bounds_end) = self
            .model
            .year_bounds
            .unwrap_or((self.filter.time_range.0, self.filter.time_range.1));
        let start_slider = ui
            .add(
                egui::Slider::new(&mut self.filter.time_range.0, bounds_start..=bounds_end)
                    .text("From year"),
            )
            .on_hover_text("Hide entities whose lifespan ends before this year.");
        let end_slider = ui
            .add(
                egui::Slider::new(&mut self.filter.time_range.1, bounds_start..=bounds_end)
                    .text("To year"),
            )
            .on_hover_text("Hide entities whose lifespan starts after this year.");
        if start_slider.changed() || end_slider.changed() {
            if self.filter.time_range.1 < self.filter.time_range.0 {
                self.filter.time_range.1 = self.filter.time_range.0;
            }
            rebuild_needed = true;
        }

        ui.separator();

        ui.label("Layout");
        ui.horizontal_wrapped(|ui| {
            rebuild_needed |= ui
                .selectable_value(&mut self.filter.layout_mode, PlacementMode::Plain, "Force")
                .on_hover_text("Pure force-directed layout.")
                .changed();
            rebuild_needed |= ui
                .selectable_value(&mut self.filter.layout_mode, PlacementMode::Radial, "Radial")
                .on_hover_text("Pull nodes toward a shared ring around the center.")
                .changed();
            rebuild_needed |= ui
                .selectable_value(
                    &mut self.filter.layout_mode,
                    PlacementMode::Layered,
                    "Layered",
                )
                .on_hover_text("Separate entity types into horizontal bands.")
                .changed();
        });

        ui.add_space(6.0);
        ui.label("Node size");
        ui.horizontal_wrapped(|ui| {
            for attribute in [
                NodeSizeAttribute::Degree,
                NodeSizeAttribute::NeighborCount,
                NodeSizeAttribute::Equal,
            ] {
                rebuild_needed |= ui
                    .selectable_value(&mut self.filter.node_size, attribute, attribute.label())
                    .changed();
            }
        });

        ui.separator();

        ui.horizontal(|ui| {
            let mut space = self.space;
            ui.selectable_value(&mut space, LayoutSpace::TwoD, "2D");
            ui.add_enabled_ui(self.caps.supports_3d, |ui| {
                ui.selectable_value(&mut space, LayoutSpace::ThreeD, "3D")
                    .on_disabled_hover_text("3D view needs a GL context.");
            });
            if space != self.space {
                self.set_space(space);
            }
        });

        ui.add_space(6.0);
        ui.horizontal_wrapped(|ui| {
            if ui
                .button("Reheat layout")
                .on_hover_text("Give the cooled layout another settling pass.")
                .clicked()
            {
                self.reheat_layout();
            }
            if ui
                .button("Release pins")
                .on_hover_text("Unpin every node dropped in place by shift-drag.")
                .clicked()
            {
                self.release_all_pins();
            }
            if ui.button("Reset camera").clicked() {
                self.camera = Camera::default();
            }
        });

        ui.separator();
        ui.label(format!(
            "drawables: {} cached, {} disposed",
            self.drawables.len(),
            self.drawables.disposed_total()
        ));

        if rebuild_needed {
            self.filter_dirty = true;
        }
    }

    fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Details");
        ui.separator();

        let Some(model_index) = self
            .selected
            .as_deref()
            .and_then(|id| self.model.index_by_id.get(id).copied())
        else {
            ui.label("Click an entity to inspect it.");
            return;
        };

        let entity = &self.model.entities[model_index];
        ui.strong(&entity.name);
        ui.label(entity.kind.label());
        if let Some(span) = entity.span {
            ui.label(format_year_span(span.start, span.end));
        }
        ui.label(format!("{} relations", self.model.degree[model_index]));

        ui.add_space(6.0);
        if ui.button("Clear selection").clicked() {
            self.select(None);
            return;
        }

        ui.separator();
        ui.label("Relations");

        let mut jump_to = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for relation in &self.model.relations {
                    let other = if relation.source == model_index {
                        relation.target
                    } else if relation.target == model_index {
                        relation.source
                    } else {
                        continue;
                    };

                    let counterpart = &self.model.entities[other];
                    let row = ui
                        .horizontal(|ui| {
                            let clicked = ui
                                .selectable_label(false, counterpart.name.as_str())
                                .clicked();
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                ui.label(relation.kind.label());
                            });
                            clicked
                        })
                        .inner;
                    if row {
                        jump_to = Some(counterpart.id.clone());
                    }
                }
            });

        if let Some(id) = jump_to {
            self.select(Some(id));
        }
    }
}
