#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Furrow farming simulation.
//!
//! This crate defines the message surface that connects the host, the
//! authoritative world, and reactive systems. Hosts submit [`Command`]
//! values describing desired mutations, the world executes them, and crops
//! broadcast notification payloads (such as [`CropAdvanced`]) over the
//! event bus for independent consumers to react to.

use serde::{Deserialize, Serialize};

/// Location of a single grid cell expressed as signed column and row
/// indices. The grid is centered on the world origin, so negative
/// coordinates are legal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    x: i32,
    z: i32,
}

impl GridCoord {
    /// Sentinel value representing "no cell": projection misses and
    /// out-of-bounds lookups resolve to this coordinate, and every
    /// grid-mutating operation refuses it silently.
    pub const INVALID: GridCoord = GridCoord {
        x: i32::MIN,
        z: i32::MIN,
    };

    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Reports whether the coordinate denotes an actual cell rather than
    /// the [`GridCoord::INVALID`] sentinel.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

/// Point on the ground plane expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    x: f32,
    z: f32,
}

impl Position {
    /// Origin of the ground plane.
    pub const ZERO: Position = Position { x: 0.0, z: 0.0 };

    /// Creates a new ground-plane point.
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Horizontal component of the point.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Depth component of the point.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }

    /// Squared distance to another point.
    #[must_use]
    pub fn distance_squared(&self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }

    /// Returns the point advanced toward `target` by at most `max_delta`
    /// world units, never overshooting the target.
    #[must_use]
    pub fn step_towards(&self, target: Position, max_delta: f32) -> Position {
        let dx = target.x - self.x;
        let dz = target.z - self.z;
        let distance = (dx * dx + dz * dz).sqrt();
        if distance <= max_delta || distance == 0.0 {
            return target;
        }
        Position {
            x: self.x + dx / distance * max_delta,
            z: self.z + dz / distance * max_delta,
        }
    }
}

/// Unique identifier assigned to a crop instance by the crop pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CropId(u32);

impl CropId {
    /// Creates a new crop identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Kinds of crops that can be planted on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CropKind {
    /// Fast-growing starter crop.
    Corn,
    /// Slower crop with a higher harvest value.
    Tomato,
}

/// Growth states a crop moves through between planting and harvest.
///
/// `None` doubles as the terminal state and as the "no pending
/// transition" marker inside the crop state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CropState {
    /// Terminal state; also used as the absence of a pending transition.
    #[default]
    None,
    /// Freshly planted, counting down to needing water.
    Seed,
    /// Waiting for the player to issue a water command.
    WaterNeeded,
    /// Flagged for watering, awaiting a worker interaction.
    WaterMarked,
    /// Watered and growing, counting down to harvest readiness.
    Sprout,
    /// Waiting for the player to issue a harvest command.
    HarvestNeeded,
    /// Flagged for harvest, awaiting a worker interaction.
    HarvestMarked,
}

impl CropState {
    /// Reports whether the state is the terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        *self == CropState::None
    }

    /// State a worker interaction advances a marked crop into, or `None`
    /// for states that are not marked substates.
    #[must_use]
    pub fn mark_successor(&self) -> Option<CropState> {
        match self {
            CropState::WaterMarked => Some(CropState::Sprout),
            CropState::HarvestMarked => Some(CropState::None),
            _ => None,
        }
    }
}

/// Exclusive interaction mode held by the world; determines how taps and
/// drops are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlacementMode {
    /// No interaction mode active.
    #[default]
    None,
    /// Drag-and-drop planting of the selected crop kind.
    Plant,
    /// Taps flag water-needing crops for the watering worker.
    Water,
    /// Taps flag harvest-ready crops for the harvesting worker.
    Harvest,
}

impl PlacementMode {
    /// Mark command a tap issues while this mode is active, if any.
    #[must_use]
    pub fn mark_command(&self) -> Option<MarkCommand> {
        match self {
            PlacementMode::Water => Some(MarkCommand::Water),
            PlacementMode::Harvest => Some(MarkCommand::Harvest),
            _ => None,
        }
    }
}

/// Commands that flag an occupied cell for worker action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkCommand {
    /// Flag a crop in [`CropState::WaterNeeded`] for watering.
    Water,
    /// Flag a crop in [`CropState::HarvestNeeded`] for harvest.
    Harvest,
}

impl MarkCommand {
    /// Crop state this command is valid against.
    #[must_use]
    pub fn required_state(&self) -> CropState {
        match self {
            MarkCommand::Water => CropState::WaterNeeded,
            MarkCommand::Harvest => CropState::HarvestNeeded,
        }
    }

    /// Marked state the command transitions a crop into.
    #[must_use]
    pub fn marked_state(&self) -> CropState {
        match self {
            MarkCommand::Water => CropState::WaterMarked,
            MarkCommand::Harvest => CropState::HarvestMarked,
        }
    }
}

/// Opaque descriptor for one visual growth stage; the renderer resolves
/// the key to concrete meshes and materials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageVisual {
    key: String,
}

impl StageVisual {
    /// Creates a new stage visual descriptor.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Key identifying the visual asset for this stage.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Opaque descriptor for the effect played when a crop is harvested.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestEffect {
    key: String,
}

impl HarvestEffect {
    /// Creates a new harvest effect descriptor.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Key identifying the effect asset.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Static per-kind crop constants supplied by the host at startup and
/// immutable thereafter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropConfig {
    kind: CropKind,
    plant_cost: i64,
    harvest_value: i64,
    growth_time_seed: u32,
    growth_time_sprout: u32,
    visuals: [StageVisual; 3],
}

impl CropConfig {
    /// Creates a new crop configuration entry.
    #[must_use]
    pub fn new(
        kind: CropKind,
        plant_cost: i64,
        harvest_value: i64,
        growth_time_seed: u32,
        growth_time_sprout: u32,
        visuals: [StageVisual; 3],
    ) -> Self {
        Self {
            kind,
            plant_cost,
            harvest_value,
            growth_time_seed,
            growth_time_sprout,
            visuals,
        }
    }

    /// Crop kind this configuration describes.
    #[must_use]
    pub const fn kind(&self) -> CropKind {
        self.kind
    }

    /// Money deducted when a crop of this kind is placed.
    #[must_use]
    pub const fn plant_cost(&self) -> i64 {
        self.plant_cost
    }

    /// Money credited when a crop of this kind is harvested.
    #[must_use]
    pub const fn harvest_value(&self) -> i64 {
        self.harvest_value
    }

    /// Ticks spent in [`CropState::Seed`] before water is needed.
    #[must_use]
    pub const fn growth_time_seed(&self) -> u32 {
        self.growth_time_seed
    }

    /// Ticks spent in [`CropState::Sprout`] before harvest is needed.
    #[must_use]
    pub const fn growth_time_sprout(&self) -> u32 {
        self.growth_time_sprout
    }

    /// Ordered visual descriptors for the seed, sprout, and harvest-ready
    /// stages.
    #[must_use]
    pub fn visuals(&self) -> &[StageVisual; 3] {
        &self.visuals
    }
}

/// World-level configuration supplied by the host at startup: grid
/// dimensions, cell geometry, and the starting balance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    grid_size_x: u32,
    grid_size_z: u32,
    cell_size: f32,
    initial_money: i64,
    harvest_effect: HarvestEffect,
}

impl WorldConfig {
    /// Creates a new world configuration. `cell_size` must be positive.
    #[must_use]
    pub fn new(
        grid_size_x: u32,
        grid_size_z: u32,
        cell_size: f32,
        initial_money: i64,
        harvest_effect: HarvestEffect,
    ) -> Self {
        Self {
            grid_size_x,
            grid_size_z,
            cell_size,
            initial_money,
            harvest_effect,
        }
    }

    /// Number of grid columns.
    #[must_use]
    pub const fn grid_size_x(&self) -> u32 {
        self.grid_size_x
    }

    /// Number of grid rows.
    #[must_use]
    pub const fn grid_size_z(&self) -> u32 {
        self.grid_size_z
    }

    /// Side length of a square cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Money balance the world starts with.
    #[must_use]
    pub const fn initial_money(&self) -> i64 {
        self.initial_money
    }

    /// Descriptor for the effect fired alongside harvest notifications.
    #[must_use]
    pub fn harvest_effect(&self) -> &HarvestEffect {
        &self.harvest_effect
    }

    /// Maximum number of crops that can ever be simultaneously placed.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.grid_size_x as usize * self.grid_size_z as usize
    }

    /// Reports whether a coordinate addresses a cell of the centered grid.
    ///
    /// The valid range per axis is `[-(n + 1) / 2, (n - 1) / 2]` for a
    /// grid of `n` cells, matching the cells reachable through
    /// [`WorldConfig::world_to_grid`].
    #[must_use]
    pub fn contains(&self, coord: GridCoord) -> bool {
        if !coord.is_valid() {
            return false;
        }
        let x_bound = self.grid_size_x as i32;
        let z_bound = self.grid_size_z as i32;
        coord.x() >= -((x_bound + 1) / 2)
            && coord.x() <= (x_bound - 1) / 2
            && coord.z() >= -((z_bound + 1) / 2)
            && coord.z() <= (z_bound - 1) / 2
    }

    /// Projects a ground-plane point onto the grid, resolving to
    /// [`GridCoord::INVALID`] when the point falls outside the configured
    /// bounds.
    #[must_use]
    pub fn world_to_grid(&self, position: Position) -> GridCoord {
        let half_width = self.cell_size * self.grid_size_x as f32 / 2.0;
        let half_depth = self.cell_size * self.grid_size_z as f32 / 2.0;

        if position.x() < half_width
            && position.x() > -half_width
            && position.z() < half_depth
            && position.z() > -half_depth
        {
            GridCoord::new(
                (position.x() / self.cell_size).floor() as i32,
                (position.z() / self.cell_size).floor() as i32,
            )
        } else {
            GridCoord::INVALID
        }
    }

    /// Ground-plane center of a cell, where placed crops stand and
    /// workers walk to.
    #[must_use]
    pub fn cell_center(&self, coord: GridCoord) -> Position {
        Position::new(
            (coord.x() as f32 + 0.5) * self.cell_size,
            (coord.z() as f32 + 0.5) * self.cell_size,
        )
    }
}

/// Commands that express all permissible world mutations a host may
/// submit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Switches the active placement mode.
    SetMode {
        /// Mode the world should activate.
        mode: PlacementMode,
    },
    /// Selects the crop kind for subsequent planting drags.
    SelectCrop {
        /// Kind of crop the player picked up.
        kind: CropKind,
    },
    /// Reports a pointer drag at the provided ground-plane position.
    PointerDrag {
        /// Current pointer position.
        position: Position,
    },
    /// Reports a pointer drop at the provided ground-plane position.
    PointerDrop {
        /// Position the pointer was released at.
        position: Position,
    },
    /// Reports a pointer tap at the provided ground-plane position.
    PointerTap {
        /// Position the tap landed at.
        position: Position,
    },
    /// Advances the simulation by one fixed tick.
    Tick,
}

/// Notification fired on every crop state transition, after the crop's
/// internal fields reflect the new state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropAdvanced {
    /// Crop that transitioned.
    pub crop: CropId,
    /// Kind of the crop.
    pub kind: CropKind,
    /// State the crop entered.
    pub state: CropState,
}

/// Notification fired exactly once when a crop completes its harvest, in
/// addition to the terminal [`CropAdvanced`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CropHarvested {
    /// Crop that was harvested.
    pub crop: CropId,
    /// Kind of the crop.
    pub kind: CropKind,
    /// Money credited for the harvest.
    pub value: i64,
    /// Effect the presentation layer should play.
    pub effect: HarvestEffect,
}

/// Notification fired when the active placement mode changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementModeChanged {
    /// Mode that became active.
    pub mode: PlacementMode,
}

/// Notification fired when a crop selection begins a planting drag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropDragStarted {
    /// Kind of crop being dragged.
    pub kind: CropKind,
}
