#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Generic reusable-instance pool with a lease/return discipline.
//!
//! The pool owns every instance it has ever constructed and hands out
//! [`PoolId`] leases instead of moving values, so identifiers stored in
//! event payloads and work queues never dangle. A slot is in exactly one
//! of three states: vacant (destroyed), available (owned by the pool), or
//! leased (logically owned by the caller until released).

use thiserror::Error;

/// Identifier of one pool slot; stable for the lifetime of the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(u32);

impl PoolId {
    /// Creates a pool identifier with the provided numeric value.
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

/// Violations of the lease/return discipline.
///
/// These indicate a coordination bug in the caller rather than an
/// expected runtime condition; callers should fail fast on them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The slot exists but is not currently leased.
    #[error("pool slot {0:?} is not currently leased")]
    NotLeased(PoolId),
    /// No slot with the provided identifier has ever been constructed.
    #[error("pool slot {0:?} does not exist")]
    UnknownSlot(PoolId),
}

enum Slot<T> {
    Vacant,
    Available(T),
    Leased(T),
}

/// Generic object pool parameterized over a factory and optional lease
/// and return hooks.
pub struct ObjectPool<T> {
    slots: Vec<Slot<T>>,
    available: Vec<u32>,
    vacant: Vec<u32>,
    leased_count: usize,
    factory: Box<dyn FnMut() -> T>,
    on_lease: Option<Box<dyn FnMut(&mut T)>>,
    on_return: Option<Box<dyn FnMut(&mut T)>>,
}

impl<T> ObjectPool<T> {
    /// Creates an empty pool that constructs instances with `factory`.
    #[must_use]
    pub fn new(factory: impl FnMut() -> T + 'static) -> Self {
        Self {
            slots: Vec::new(),
            available: Vec::new(),
            vacant: Vec::new(),
            leased_count: 0,
            factory: Box::new(factory),
            on_lease: None,
            on_return: None,
        }
    }

    /// Installs a hook invoked on every instance handed out by
    /// [`ObjectPool::acquire`].
    #[must_use]
    pub fn with_lease_hook(mut self, hook: impl FnMut(&mut T) + 'static) -> Self {
        self.on_lease = Some(Box::new(hook));
        self
    }

    /// Installs a hook invoked on every instance returned through
    /// [`ObjectPool::release`].
    #[must_use]
    pub fn with_return_hook(mut self, hook: impl FnMut(&mut T) + 'static) -> Self {
        self.on_return = Some(Box::new(hook));
        self
    }

    /// Pre-constructs `count` instances into the available partition so
    /// later acquisitions never pay construction cost. No-op when the
    /// pool already holds available instances.
    pub fn prewarm(&mut self, count: usize) {
        if !self.available.is_empty() {
            return;
        }
        for _ in 0..count {
            let index = self.construct();
            self.available.push(index);
        }
    }

    /// Leases an instance: reuses an available one when possible, else
    /// constructs a fresh one. The lease hook runs before the identifier
    /// is handed to the caller.
    pub fn acquire(&mut self) -> PoolId {
        let index = match self.available.pop() {
            Some(index) => index,
            None => self.construct(),
        };

        let slot = &mut self.slots[index as usize];
        let value = match std::mem::replace(slot, Slot::Vacant) {
            Slot::Available(value) => value,
            _ => unreachable!("available stack referenced a non-available slot"),
        };
        *slot = Slot::Leased(value);
        self.leased_count += 1;

        if let Slot::Leased(value) = &mut self.slots[index as usize] {
            if let Some(hook) = self.on_lease.as_mut() {
                hook(value);
            }
        }

        PoolId(index)
    }

    /// Returns a leased instance to the available partition, running the
    /// return hook first. Releasing a slot that is not leased is a
    /// discipline violation and reports [`PoolError`].
    pub fn release(&mut self, id: PoolId) -> Result<(), PoolError> {
        let slot = self
            .slots
            .get_mut(id.0 as usize)
            .ok_or(PoolError::UnknownSlot(id))?;

        match std::mem::replace(slot, Slot::Vacant) {
            Slot::Leased(mut value) => {
                if let Some(hook) = self.on_return.as_mut() {
                    hook(&mut value);
                }
                *slot = Slot::Available(value);
                self.available.push(id.0);
                self.leased_count -= 1;
                Ok(())
            }
            other => {
                *slot = other;
                Err(PoolError::NotLeased(id))
            }
        }
    }

    /// Destroys every available instance. Leased instances are not
    /// affected; their identifiers remain valid until released.
    pub fn clear(&mut self) {
        for index in self.available.drain(..) {
            self.slots[index as usize] = Slot::Vacant;
            self.vacant.push(index);
        }
    }

    /// Read access to a leased instance.
    #[must_use]
    pub fn get(&self, id: PoolId) -> Option<&T> {
        match self.slots.get(id.0 as usize) {
            Some(Slot::Leased(value)) => Some(value),
            _ => None,
        }
    }

    /// Write access to a leased instance.
    #[must_use]
    pub fn get_mut(&mut self, id: PoolId) -> Option<&mut T> {
        match self.slots.get_mut(id.0 as usize) {
            Some(Slot::Leased(value)) => Some(value),
            _ => None,
        }
    }

    /// Number of instances currently available for lease.
    #[must_use]
    pub fn available_len(&self) -> usize {
        self.available.len()
    }

    /// Number of instances currently leased out.
    #[must_use]
    pub fn leased_len(&self) -> usize {
        self.leased_count
    }

    /// Number of live instances the pool has constructed and not
    /// destroyed; always `available_len() + leased_len()`.
    #[must_use]
    pub fn constructed_len(&self) -> usize {
        self.available.len() + self.leased_count
    }

    /// Identifiers of all currently leased slots, in slot order.
    pub fn leased_ids(&self) -> impl Iterator<Item = PoolId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Leased(_) => Some(PoolId(index as u32)),
                _ => None,
            })
    }

    fn construct(&mut self) -> u32 {
        let value = (self.factory)();
        match self.vacant.pop() {
            Some(index) => {
                self.slots[index as usize] = Slot::Available(value);
                index
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot::Available(value));
                index
            }
        }
    }
}

impl<T> std::fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool")
            .field("available", &self.available.len())
            .field("leased", &self.leased_count)
            .field("vacant", &self.vacant.len())
            .finish()
    }
}
