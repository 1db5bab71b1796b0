#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Autonomous field workers that service marked crops.
//!
//! Each worker owns a FIFO queue of crops flagged for its role (watering
//! or harvesting). The queue fills reactively: the worker subscribes to
//! crop transition notifications and enqueues every crop that enters its
//! target marked state. The host then steps the worker once per
//! simulation tick; the worker walks to the head of its queue, performs
//! the timed interaction, and completes it by advancing the crop through
//! the authoritative world.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use furrow_bus::{EventBus, SubscriptionId};
use furrow_core::{CropAdvanced, CropId, CropState, GridCoord, MarkCommand, Position};
use furrow_world::{query, World};

/// Static worker parameters supplied by the host.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerConfig {
    role: MarkCommand,
    home: Position,
    speed: f32,
    arrival_radius: f32,
    work_ticks: u32,
}

impl WorkerConfig {
    /// Creates a worker configuration. `speed` is world units per tick;
    /// `work_ticks` is the duration of one interaction.
    #[must_use]
    pub fn new(
        role: MarkCommand,
        home: Position,
        speed: f32,
        arrival_radius: f32,
        work_ticks: u32,
    ) -> Self {
        Self {
            role,
            home,
            speed,
            arrival_radius,
            work_ticks,
        }
    }

    /// Mark command this worker services.
    #[must_use]
    pub const fn role(&self) -> MarkCommand {
        self.role
    }
}

/// A single field worker bound to one mark command.
#[derive(Debug)]
pub struct Worker {
    config: WorkerConfig,
    target_state: CropState,
    next_state: CropState,
    position: Position,
    queue: VecDeque<CropId>,
    inbox: Rc<RefCell<VecDeque<CropId>>>,
    // Remaining interaction ticks once the worker has reached its target.
    task: Option<u32>,
    subscription: SubscriptionId,
}

impl Worker {
    /// Creates a worker and subscribes it to crop transitions so crops
    /// entering its target marked state queue up automatically.
    #[must_use]
    pub fn new(config: WorkerConfig, bus: &EventBus) -> Self {
        let target_state = config.role.marked_state();
        // Marked states always have a successor.
        let next_state = match target_state.mark_successor() {
            Some(state) => state,
            None => CropState::None,
        };

        let inbox: Rc<RefCell<VecDeque<CropId>>> = Rc::new(RefCell::new(VecDeque::new()));
        let sink = Rc::clone(&inbox);
        let subscription = bus.subscribe(move |event: &CropAdvanced| {
            if event.state == target_state {
                sink.borrow_mut().push_back(event.crop);
            }
        });

        let position = config.home;
        Self {
            config,
            target_state,
            next_state,
            position,
            queue: VecDeque::new(),
            inbox,
            task: None,
            subscription,
        }
    }

    /// Current ground-plane position.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Number of crops waiting for this worker, including the one it is
    /// currently walking to or working on.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len() + self.inbox.borrow().len()
    }

    /// Whether the worker is mid-interaction.
    #[must_use]
    pub fn is_working(&self) -> bool {
        self.task.is_some()
    }

    /// Stops listening for new assignments. Already queued crops remain
    /// serviceable.
    pub fn detach(&mut self, bus: &EventBus) {
        bus.unsubscribe(self.subscription);
    }

    /// Advances the worker by one tick: walk toward the head of the
    /// queue, run the interaction once arrived, and complete it through
    /// the world. With an empty queue the worker walks home.
    pub fn step(&mut self, world: &mut World) {
        self.drain_inbox();

        if let Some(remaining) = self.task {
            if remaining > 1 {
                self.task = Some(remaining - 1);
                return;
            }
            self.finish_task(world);
            return;
        }

        let Some(target) = self.current_target(world) else {
            self.walk_towards(self.config.home);
            return;
        };

        let destination = query::world_config(world).cell_center(target);
        self.walk_towards(destination);
        if self.position.distance_squared(destination)
            <= self.config.arrival_radius * self.config.arrival_radius
        {
            self.task = Some(self.config.work_ticks.max(1));
        }
    }

    fn drain_inbox(&mut self) {
        let mut inbox = self.inbox.borrow_mut();
        while let Some(id) = inbox.pop_front() {
            self.queue.push_back(id);
        }
    }

    /// Cell of the crop at the head of the queue, dropping entries that
    /// went stale since they were queued (harvested, recycled, or no
    /// longer in the expected state).
    fn current_target(&mut self, world: &World) -> Option<GridCoord> {
        while let Some(&head) = self.queue.front() {
            let coord = query::crop_coord(world, head);
            let state = query::crop_state(world, head);
            match (coord, state) {
                (Some(coord), Some(state)) if state == self.target_state => return Some(coord),
                _ => {
                    let _ = self.queue.pop_front();
                }
            }
        }
        None
    }

    fn finish_task(&mut self, world: &mut World) {
        self.task = None;
        let Some(head) = self.queue.pop_front() else {
            return;
        };
        // The crop may have changed while the worker was busy; the world
        // validates the transition and refuses silently if so.
        let _ = world.advance_crop(head, self.next_state);
    }

    fn walk_towards(&mut self, destination: Position) {
        self.position = self.position.step_towards(destination, self.config.speed);
    }
}
