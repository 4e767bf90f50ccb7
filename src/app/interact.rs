use super::sim::{Simulation, Vec3};

/// Pointer travel below this (in screen pixels) keeps a press a click.
const DRAG_CLICK_THRESHOLD: f32 = 4.0;

const DRAG_START_HEAT: f32 = 0.3;
const DRAG_MOVE_HEAT: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragPhase {
    Idle,
    Dragging { node: usize, travel: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum DragOutcome {
    /// Press and release without meaningful travel.
    Click { node: usize },
    Dragged { node: usize, pinned: bool },
    None,
}

/// Tracks a single pointer-driven node drag. While a drag is live the
/// node is pinned at the pointer so the solver pulls the rest of the
/// graph around it; on release the pin either sticks (hold modifier) or
/// is dropped.
pub(super) struct DragController {
    phase: DragPhase,
}

impl DragController {
    pub fn new() -> Self {
        Self {
            phase: DragPhase::Idle,
        }
    }

    pub fn active_node(&self) -> Option<usize> {
        match self.phase {
            DragPhase::Dragging { node, .. } => Some(node),
            DragPhase::Idle => None,
        }
    }

    pub fn begin(&mut self, node: usize, world: Vec3, sim: &mut Simulation) {
        sim.pin(node, Some(world));
        sim.reheat(DRAG_START_HEAT);
        self.phase = DragPhase::Dragging { node, travel: 0.0 };
    }

    pub fn update(&mut self, world: Vec3, screen_delta: f32, sim: &mut Simulation) {
        if let DragPhase::Dragging { node, travel } = &mut self.phase {
            sim.pin(*node, Some(world));
            sim.reheat(DRAG_MOVE_HEAT);
            *travel += screen_delta;
        }
    }

    /// Ends the drag. `hold` keeps the pin in place; otherwise the node
    /// is released back to the solver.
    pub fn end(&mut self, hold: bool, sim: &mut Simulation) -> DragOutcome {
        let DragPhase::Dragging { node, travel } = self.phase else {
            return DragOutcome::None;
        };
        self.phase = DragPhase::Idle;

        if travel < DRAG_CLICK_THRESHOLD {
            sim.pin(node, None);
            return DragOutcome::Click { node };
        }

        if !hold {
            sim.pin(node, None);
        }
        DragOutcome::Dragged { node, pinned: hold }
    }

    /// Drops any live drag without a gesture outcome, for when the
    /// subgraph underneath it is rebuilt.
    pub fn cancel(&mut self) {
        self.phase = DragPhase::Idle;
    }
}
