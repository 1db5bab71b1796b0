#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Furrow farm.
//!
//! The world owns the spatial index, the money balance, the placement-mode
//! state, and the crop pool, and it is the only component that mutates
//! them. Hosts drive it through [`apply`] (or the equivalent methods) and
//! a fixed-rate [`World::tick`]; crops broadcast their transitions over
//! the shared event bus as they advance.

mod crop;
mod pool_manager;

pub use crop::Crop;
pub use pool_manager::CropPoolManager;

use std::collections::HashMap;
use std::rc::Rc;

use furrow_bus::EventBus;
use furrow_core::{
    Command, CropConfig, CropDragStarted, CropHarvested, CropId, CropKind, CropState, GridCoord,
    MarkCommand, PlacementMode, PlacementModeChanged, Position, WorldConfig,
};

/// Host-supplied projection from pointer positions to grid cells.
///
/// Implementations resolve to [`GridCoord::INVALID`] whenever the
/// position misses the configured grid; every grid-mutating operation
/// treats the sentinel as "no target" and refuses silently.
pub type Projector = Box<dyn Fn(Position) -> GridCoord>;

/// Cosmetic placement marker updated by the slow poll loop.
///
/// The marker only ever reads grid occupancy; it never mutates
/// simulation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionMarker {
    visible: bool,
    coord: GridCoord,
    blocked: bool,
}

impl PositionMarker {
    const HIDDEN: PositionMarker = PositionMarker {
        visible: false,
        coord: GridCoord::INVALID,
        blocked: false,
    };

    /// Whether the marker should currently be shown.
    #[must_use]
    pub const fn visible(&self) -> bool {
        self.visible
    }

    /// Cell the marker rests on; [`GridCoord::INVALID`] while hidden.
    #[must_use]
    pub const fn coord(&self) -> GridCoord {
        self.coord
    }

    /// Whether the marked cell is already occupied.
    #[must_use]
    pub const fn blocked(&self) -> bool {
        self.blocked
    }
}

/// Represents the authoritative farm world state.
pub struct World {
    config: WorldConfig,
    crop_configs: HashMap<CropKind, Rc<CropConfig>>,
    bus: Rc<EventBus>,
    projector: Projector,
    pool: CropPoolManager,
    grid: HashMap<GridCoord, CropId>,
    coords: HashMap<CropId, GridCoord>,
    mode: PlacementMode,
    selected: Option<CropKind>,
    money: i64,
    cursor: Option<Position>,
    marker: PositionMarker,
}

impl World {
    /// Creates a new farm world from host-supplied configuration.
    ///
    /// The crop pool is prewarmed to the grid capacity, so placement
    /// never constructs at runtime.
    #[must_use]
    pub fn new(
        config: WorldConfig,
        crop_configs: Vec<CropConfig>,
        bus: Rc<EventBus>,
        projector: Projector,
    ) -> Self {
        let pool = CropPoolManager::new(&config);
        let money = config.initial_money();
        let crop_configs = crop_configs
            .into_iter()
            .map(|entry| (entry.kind(), Rc::new(entry)))
            .collect();

        Self {
            config,
            crop_configs,
            bus,
            projector,
            pool,
            grid: HashMap::new(),
            coords: HashMap::new(),
            mode: PlacementMode::None,
            selected: None,
            money,
            cursor: None,
            marker: PositionMarker::HIDDEN,
        }
    }

    /// Switches the active placement mode.
    pub fn set_mode(&mut self, mode: PlacementMode) {
        self.mode = mode;
        self.bus.publish(&PlacementModeChanged { mode });
    }

    /// Selects the crop kind for subsequent planting drags. Refused when
    /// the balance does not cover the kind's plant cost.
    pub fn select_crop(&mut self, kind: CropKind) -> bool {
        let Some(config) = self.crop_configs.get(&kind) else {
            return false;
        };
        if self.money < config.plant_cost() {
            return false;
        }

        self.selected = Some(kind);
        self.bus.publish(&CropDragStarted { kind });
        true
    }

    /// Records the pointer position during a planting drag so the marker
    /// poll can follow it. Ignored outside plant mode or without a
    /// selection.
    pub fn pointer_drag(&mut self, position: Position) {
        if self.mode != PlacementMode::Plant || self.selected.is_none() {
            return;
        }
        self.cursor = Some(position);
    }

    /// Attempts placement at the dropped position, then ends the drag.
    /// Selection and marker are cleared whether or not placement
    /// succeeded.
    pub fn pointer_drop(&mut self, position: Position) {
        if self.mode != PlacementMode::Plant {
            return;
        }
        let Some(kind) = self.selected else {
            return;
        };

        let coord = (self.projector)(position);
        let _ = self.place_crop(coord, kind);

        self.selected = None;
        self.cursor = None;
        self.marker = PositionMarker::HIDDEN;
    }

    /// Interprets a tap according to the active mode, flagging the tapped
    /// crop for worker action when the mode and crop state line up.
    pub fn pointer_tap(&mut self, position: Position) {
        self.selected = None;

        let Some(command) = self.mode.mark_command() else {
            return;
        };
        let coord = (self.projector)(position);
        let _ = self.mark_cell(coord, command);
    }

    /// Recomputes the cosmetic marker from the cached drag cursor. This
    /// is the slow poll loop's body; it reads occupancy only.
    pub fn update_marker(&mut self) {
        let Some(cursor) = self.cursor else {
            self.marker = PositionMarker::HIDDEN;
            return;
        };

        let coord = (self.projector)(cursor);
        if coord.is_valid() {
            self.marker = PositionMarker {
                visible: true,
                coord,
                blocked: self.grid.contains_key(&coord),
            };
        } else {
            self.marker = PositionMarker::HIDDEN;
        }
    }

    /// Places a crop of `kind` at `coord`.
    ///
    /// Silently refused when the coordinate is invalid or out of bounds,
    /// the cell is occupied, the kind is unknown, or the balance does not
    /// cover the plant cost; in that case no state changes at all.
    pub fn place_crop(&mut self, coord: GridCoord, kind: CropKind) -> bool {
        if !self.config.contains(coord) {
            return false;
        }
        if self.grid.contains_key(&coord) {
            return false;
        }
        let Some(config) = self.crop_configs.get(&kind).cloned() else {
            return false;
        };
        if self.money < config.plant_cost() {
            return false;
        }

        self.money -= config.plant_cost();

        let id = self.pool.acquire();
        let bus = Rc::clone(&self.bus);
        if let Some(placed) = self.pool.crop_mut(id) {
            placed.initialize(id, config, &bus);
        }

        let _ = self.grid.insert(coord, id);
        let _ = self.coords.insert(id, coord);
        true
    }

    /// Flags the occupant of `coord` for worker action. Valid only when
    /// the command matches the crop's current state (water against
    /// `WaterNeeded`, harvest against `HarvestNeeded`); anything else is
    /// silently refused.
    pub fn mark_cell(&mut self, coord: GridCoord, command: MarkCommand) -> bool {
        let Some(&id) = self.grid.get(&coord) else {
            return false;
        };
        let Some(occupant) = self.pool.crop(id) else {
            return false;
        };
        if occupant.state() != command.required_state() {
            return false;
        }

        let bus = Rc::clone(&self.bus);
        if let Some(occupant) = self.pool.crop_mut(id) {
            occupant.set_state(command.marked_state(), &bus);
        }
        true
    }

    /// Completes a worker interaction on a marked crop, advancing it to
    /// `next`. Refused unless the crop is still indexed on the grid and
    /// `next` is the legal successor of its current marked state.
    pub fn advance_crop(&mut self, id: CropId, next: CropState) -> bool {
        if !self.coords.contains_key(&id) {
            return false;
        }
        let Some(target) = self.pool.crop(id) else {
            return false;
        };
        if target.state().mark_successor() != Some(next) {
            return false;
        }

        let bus = Rc::clone(&self.bus);
        if let Some(target) = self.pool.crop_mut(id) {
            target.set_state(next, &bus);
        }
        self.settle_if_terminal(id);
        true
    }

    /// Advances every crop currently indexed on the grid by one fixed
    /// simulation tick. Iteration order across crops is unspecified;
    /// crops tick independently and their notifications are delivered
    /// synchronously per crop.
    pub fn tick(&mut self) {
        let ids: Vec<CropId> = self.grid.values().copied().collect();
        let bus = Rc::clone(&self.bus);
        for id in ids {
            if let Some(target) = self.pool.crop_mut(id) {
                target.tick(&bus);
            }
            self.settle_if_terminal(id);
        }
    }

    /// Settles a crop that reached the terminal state: credits the
    /// harvest value, fires the harvest notification, removes both index
    /// entries, and releases the crop — exactly once, in the same
    /// transaction as the terminal transition.
    fn settle_if_terminal(&mut self, id: CropId) {
        let Some(settled) = self.pool.crop(id) else {
            return;
        };
        if !settled.state().is_terminal() {
            return;
        }
        let Some(config) = settled.config().cloned() else {
            return;
        };
        let Some(coord) = self.coords.remove(&id) else {
            return;
        };

        self.money += config.harvest_value();
        self.bus.publish(&CropHarvested {
            crop: id,
            kind: config.kind(),
            value: config.harvest_value(),
            effect: self.config.harvest_effect().clone(),
        });

        let _ = self.grid.remove(&coord);
        if let Err(error) = self.pool.release(id) {
            panic!("harvest settlement released an unleased crop: {error}");
        }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("mode", &self.mode)
            .field("selected", &self.selected)
            .field("money", &self.money)
            .field("placed", &self.grid.len())
            .field("marker", &self.marker)
            .finish()
    }
}

/// Applies the provided command to the world, mutating state
/// deterministically. Refused commands are silent no-ops.
pub fn apply(world: &mut World, command: Command) {
    match command {
        Command::SetMode { mode } => world.set_mode(mode),
        Command::SelectCrop { kind } => {
            let _ = world.select_crop(kind);
        }
        Command::PointerDrag { position } => world.pointer_drag(position),
        Command::PointerDrop { position } => world.pointer_drop(position),
        Command::PointerTap { position } => world.pointer_tap(position),
        Command::Tick => world.tick(),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{CropPoolManager, PositionMarker, World};
    use furrow_core::{CropId, CropKind, CropState, GridCoord, PlacementMode, WorldConfig};

    /// Current money balance.
    #[must_use]
    pub fn money(world: &World) -> i64 {
        world.money
    }

    /// Active placement mode.
    #[must_use]
    pub fn mode(world: &World) -> PlacementMode {
        world.mode
    }

    /// Crop kind selected for planting, if any.
    #[must_use]
    pub fn selected_crop(world: &World) -> Option<CropKind> {
        world.selected
    }

    /// Occupant of the provided cell, if any.
    #[must_use]
    pub fn crop_at(world: &World, coord: GridCoord) -> Option<CropId> {
        world.grid.get(&coord).copied()
    }

    /// Current state of a leased crop.
    #[must_use]
    pub fn crop_state(world: &World, id: CropId) -> Option<CropState> {
        world.pool.crop(id).map(super::Crop::state)
    }

    /// Cell a placed crop occupies.
    #[must_use]
    pub fn crop_coord(world: &World, id: CropId) -> Option<GridCoord> {
        world.coords.get(&id).copied()
    }

    /// Number of crops currently placed on the grid.
    #[must_use]
    pub fn placed_count(world: &World) -> usize {
        world.grid.len()
    }

    /// Cosmetic placement marker state.
    #[must_use]
    pub fn marker(world: &World) -> &PositionMarker {
        &world.marker
    }

    /// World configuration the host supplied at startup.
    #[must_use]
    pub fn world_config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Crop pool manager, for partition counters and enumeration.
    #[must_use]
    pub fn pool(world: &World) -> &CropPoolManager {
        &world.pool
    }

    /// Captures a read-only view of all placed crops in deterministic
    /// order.
    #[must_use]
    pub fn crop_view(world: &World) -> CropView {
        let mut snapshots: Vec<CropSnapshot> = world
            .grid
            .iter()
            .filter_map(|(coord, id)| {
                let placed = world.pool.crop(*id)?;
                let config = placed.config()?;
                Some(CropSnapshot {
                    id: *id,
                    kind: config.kind(),
                    state: placed.state(),
                    coord: *coord,
                    grow_timer: placed.grow_timer(),
                })
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        CropView { snapshots }
    }

    /// Read-only snapshot describing all placed crops.
    #[derive(Clone, Debug)]
    pub struct CropView {
        snapshots: Vec<CropSnapshot>,
    }

    impl CropView {
        /// Iterator over the captured crop snapshots in deterministic
        /// order.
        pub fn iter(&self) -> impl Iterator<Item = &CropSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<CropSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single placed crop.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CropSnapshot {
        /// Identifier assigned by the crop pool.
        pub id: CropId,
        /// Kind of the crop.
        pub kind: CropKind,
        /// Current growth state.
        pub state: CropState,
        /// Cell the crop occupies.
        pub coord: GridCoord,
        /// Remaining ticks toward the pending automatic transition.
        pub grow_timer: u32,
    }
}
