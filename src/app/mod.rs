use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2};

use crate::data::{GraphModel, load_graph_model};

mod continuity;
mod drawables;
mod filter;
mod interact;
mod render_utils;
mod sim;
mod style;
mod ui;
mod view;

use continuity::PositionSnapshot;
use drawables::DrawableCache;
use filter::{FilterState, VisibleGraph};
use interact::DragController;
use render_utils::Camera;
use sim::{SimParams, Simulation};

pub use sim::LayoutSpace;

pub struct ChronicaApp {
    dataset_path: PathBuf,
    caps: RenderCapabilities,
    requested_space: LayoutSpace,
    state: AppState,
    reload_rx: Option<Receiver<Result<GraphModel, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<GraphModel, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

/// What the GL backend can actually do. Without a GL context the
/// perspective path has nothing sensible to render against, so the app
/// degrades to 2D rather than refusing to start.
#[derive(Clone, Copy)]
pub struct RenderCapabilities {
    pub supports_3d: bool,
}

impl RenderCapabilities {
    fn detect(cc: &eframe::CreationContext<'_>) -> Self {
        let supports_3d = cc.gl.is_some();
        if !supports_3d {
            log::warn!("no GL context available; 3D view disabled");
        }
        Self { supports_3d }
    }
}

struct ViewModel {
    model: GraphModel,
    filter: FilterState,
    space: LayoutSpace,
    caps: RenderCapabilities,
    search: String,
    /// Selection is stored by entity id so it survives subgraph rebuilds
    /// that renumber node indices.
    selected: Option<String>,
    hovered_id: Option<String>,
    camera: Camera,
    sim: Option<Simulation>,
    visible: VisibleGraph,
    drawables: DrawableCache,
    filter_dirty: bool,
    subgraph_revision: u64,
    search_cache: Option<SearchMatchCache>,
    visible_node_count: usize,
    visible_link_count: usize,
    drag: DragController,
    screen_positions: Vec<Pos2>,
    draw_order: Vec<usize>,
}

struct SearchMatchCache {
    query: String,
    subgraph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

impl ViewModel {
    fn new(model: GraphModel, caps: RenderCapabilities, space: LayoutSpace) -> Self {
        let space = if caps.supports_3d {
            space
        } else {
            LayoutSpace::TwoD
        };
        let filter = FilterState::for_model(&model);
        let mut view = Self {
            model,
            filter,
            space,
            caps,
            search: String::new(),
            selected: None,
            hovered_id: None,
            camera: Camera::default(),
            sim: None,
            visible: VisibleGraph::default(),
            drawables: DrawableCache::default(),
            filter_dirty: false,
            subgraph_revision: 0,
            search_cache: None,
            visible_node_count: 0,
            visible_link_count: 0,
            drag: DragController::new(),
            screen_positions: Vec::new(),
            draw_order: Vec::new(),
        };
        view.rebuild_subgraph(false);
        view
    }

    /// Tears down the current layout and builds one for the current
    /// filter state. With `carry` set, surviving nodes keep their
    /// positions, velocities and pins via a snapshot taken before the old
    /// run is stopped; a cold rebuild (initial load, space switch)
    /// re-seeds everything from the hash scatter instead.
    fn rebuild_subgraph(&mut self, carry: bool) {
        let snapshot = match (&self.sim, carry) {
            (Some(sim), true) => Some(PositionSnapshot::capture(sim)),
            _ => None,
        }
        .filter(|snapshot| !snapshot.is_empty());
        if let Some(sim) = &mut self.sim {
            sim.stop();
        }
        self.drag.cancel();

        self.subgraph_revision += 1;
        self.search_cache = None;

        self.visible = VisibleGraph::build(&self.model, &self.filter);
        self.visible_node_count = self.visible.node_count();
        self.visible_link_count = self.visible.link_count();

        if self.visible.is_empty() {
            self.sim = None;
            self.drawables.clear();
            log::info!("filter change left no visible entities");
            return;
        }

        let seeds = self.visible.node_seeds(&self.model, &self.filter);
        let links = self.visible.sim_links();
        let params = SimParams {
            space: self.space,
            mode: self.filter.layout_mode,
        };
        let carried = snapshot.as_ref().map_or(0, |s| s.len());
        self.sim = Some(Simulation::initialize(
            seeds,
            links,
            params,
            snapshot.as_ref(),
        ));
        log::debug!(
            "subgraph rebuilt: {} nodes, {} links, {} carried",
            self.visible_node_count,
            self.visible_link_count,
            carried
        );

        self.filter_dirty = false;
    }

    /// Switching between planar and volumetric layout always re-seeds: a
    /// carried planar layout has zero depth everywhere and no force would
    /// ever move it out of that plane.
    fn set_space(&mut self, space: LayoutSpace) {
        if space == self.space {
            return;
        }
        if space == LayoutSpace::ThreeD && !self.caps.supports_3d {
            log::warn!("3D view requested without GL support; staying in 2D");
            return;
        }
        self.space = space;
        self.camera = Camera::default();
        self.rebuild_subgraph(false);
    }

    fn selected_index(&self) -> Option<usize> {
        let sim = self.sim.as_ref()?;
        sim.index_of(self.selected.as_deref()?)
    }

    fn select(&mut self, id: Option<String>) {
        if self.selected != id {
            match &id {
                Some(id) => log::debug!("selected entity {id}"),
                None => log::debug!("selection cleared"),
            }
            self.selected = id;
        }
    }

    fn release_all_pins(&mut self) {
        if let Some(sim) = &mut self.sim {
            for index in 0..sim.nodes().len() {
                sim.pin(index, None);
            }
            sim.reheat(0.3);
        }
    }

    fn reheat_layout(&mut self) {
        // A stopped simulation is always replaced by rebuild_subgraph
        // before the next frame, so a live one is the only case here.
        if let Some(sim) = &mut self.sim {
            sim.reheat(0.3);
        }
    }
}

impl ChronicaApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        dataset_path: PathBuf,
        space: LayoutSpace,
    ) -> Self {
        let caps = RenderCapabilities::detect(cc);
        let state = AppState::Loading {
            rx: Self::spawn_load(dataset_path.clone()),
        };
        Self {
            dataset_path,
            caps,
            requested_space: space,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(dataset_path: PathBuf) -> Receiver<Result<GraphModel, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_graph_model(&dataset_path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }
}

impl eframe::App for ChronicaApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(model) => AppState::Ready(Box::new(ViewModel::new(
                            model,
                            self.caps,
                            self.requested_space,
                        ))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading entity network...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load entity network");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(AppState::Loading {
                            rx: Self::spawn_load(self.dataset_path.clone()),
                        });
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.dataset_path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.dataset_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(new_model) => {
                                    let caps = model.caps;
                                    let space = model.space;
                                    AppState::Ready(Box::new(ViewModel::new(
                                        new_model, caps, space,
                                    )))
                                }
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
