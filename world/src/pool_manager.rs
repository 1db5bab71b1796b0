//! Crop pooling sized to the grid's maximum capacity.

use furrow_core::{CropId, WorldConfig};
use furrow_pool::{ObjectPool, PoolError, PoolId};

use crate::crop::Crop;

/// Specializes [`ObjectPool`] for [`Crop`] instances.
///
/// The pool is prewarmed to `grid_size_x × grid_size_z` — the maximum
/// number of crops that can ever be simultaneously placed — so placement
/// never pays construction cost at runtime. The manager also tracks the
/// currently leased crops for consumers that need enumeration; that set's
/// membership always matches the pool's leased partition.
#[derive(Debug)]
pub struct CropPoolManager {
    pool: ObjectPool<Crop>,
    active: Vec<CropId>,
}

impl CropPoolManager {
    /// Creates a pool prewarmed to the grid capacity.
    #[must_use]
    pub fn new(config: &WorldConfig) -> Self {
        let mut pool = ObjectPool::new(Crop::default).with_return_hook(Crop::reset);
        pool.prewarm(config.cell_count());
        Self {
            pool,
            active: Vec::new(),
        }
    }

    /// Leases a crop from the pool.
    pub(crate) fn acquire(&mut self) -> CropId {
        let id = CropId::new(self.pool.acquire().get());
        self.active.push(id);
        id
    }

    /// Returns a crop to the pool; the crop resets on the way in.
    pub(crate) fn release(&mut self, id: CropId) -> Result<(), PoolError> {
        self.pool.release(PoolId::new(id.get()))?;
        self.active.retain(|active| *active != id);
        Ok(())
    }

    /// Read access to a leased crop.
    #[must_use]
    pub fn crop(&self, id: CropId) -> Option<&Crop> {
        self.pool.get(PoolId::new(id.get()))
    }

    /// Write access to a leased crop.
    pub(crate) fn crop_mut(&mut self, id: CropId) -> Option<&mut Crop> {
        self.pool.get_mut(PoolId::new(id.get()))
    }

    /// All currently leased crops, in lease order.
    #[must_use]
    pub fn active_crops(&self) -> &[CropId] {
        &self.active
    }

    /// Number of crops waiting in the pool.
    #[must_use]
    pub fn available_len(&self) -> usize {
        self.pool.available_len()
    }

    /// Number of crops currently leased out.
    #[must_use]
    pub fn leased_len(&self) -> usize {
        self.pool.leased_len()
    }

    /// Number of crops the pool has constructed and not destroyed.
    #[must_use]
    pub fn constructed_len(&self) -> usize {
        self.pool.constructed_len()
    }

    /// Identifiers of the pool's leased partition, in slot order.
    pub fn leased_ids(&self) -> impl Iterator<Item = CropId> + '_ {
        self.pool.leased_ids().map(|id| CropId::new(id.get()))
    }
}
