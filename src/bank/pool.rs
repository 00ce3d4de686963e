//! # Resource Pools
//!
//! Physical gates for resource units, one counting semaphore per resource type.
//!
//! The ledger decides *whether* a customer may hold units; the pools are where
//! the units actually move. Customers acquire only after the bank has granted
//! and release before telling the bank, so every pool always holds at least as
//! many free units as the ledger believes are available. Under that ordering
//! [`ResourcePool::acquire`] never has to wait. It still handles waiting
//! correctly, and counts every time it would have had to, so tests can assert
//! the count stays at zero.

use super::BankError;
use crate::model::ResourceVector;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Semaphore, TryAcquireError};
use tracing::{debug, warn};

/// Units of a single resource type.
#[derive(Debug)]
pub struct ResourcePool {
    resource: usize,
    semaphore: Semaphore,
    contended: AtomicU64,
}

impl ResourcePool {
    pub fn new(resource: usize, units: u32) -> Self {
        Self {
            resource,
            semaphore: Semaphore::new(units as usize),
            contended: AtomicU64::new(0),
        }
    }

    /// Take `units`, waiting until that many are free.
    pub async fn acquire(&self, units: u32) -> Result<(), BankError> {
        if units == 0 {
            return Ok(());
        }

        match self.semaphore.try_acquire_many(units) {
            Ok(permit) => permit.forget(),
            Err(TryAcquireError::NoPermits) => {
                self.contended.fetch_add(1, Ordering::Relaxed);
                warn!(
                    resource = self.resource,
                    units,
                    free = self.semaphore.available_permits(),
                    "Pool acquire would block"
                );
                self.semaphore
                    .acquire_many(units)
                    .await
                    .map_err(|_| BankError::PoolClosed(self.resource))?
                    .forget();
            }
            Err(TryAcquireError::Closed) => return Err(BankError::PoolClosed(self.resource)),
        }

        debug!(resource = self.resource, units, "Pool acquired");
        Ok(())
    }

    /// Put `units` back and wake any waiting acquirer.
    pub fn release(&self, units: u32) {
        if units > 0 {
            self.semaphore.add_permits(units as usize);
            debug!(resource = self.resource, units, "Pool released");
        }
    }

    pub fn free(&self) -> u32 {
        self.semaphore.available_permits() as u32
    }

    /// How many acquires found too few units and had to wait.
    pub fn contended(&self) -> u64 {
        self.contended.load(Ordering::Relaxed)
    }
}

/// One [`ResourcePool`] per resource type, moved together a vector at a time.
#[derive(Debug)]
pub struct ResourcePools {
    pools: Vec<ResourcePool>,
}

impl ResourcePools {
    pub fn new(total: &ResourceVector) -> Self {
        Self {
            pools: total
                .iter()
                .enumerate()
                .map(|(resource, &units)| ResourcePool::new(resource, units))
                .collect(),
        }
    }

    /// Acquire every entry of `request` from its pool, in resource order.
    pub async fn acquire_all(&self, request: &ResourceVector) -> Result<(), BankError> {
        for (pool, &units) in self.pools.iter().zip(request.iter()) {
            pool.acquire(units).await?;
        }
        Ok(())
    }

    pub fn release_all(&self, request: &ResourceVector) {
        for (pool, &units) in self.pools.iter().zip(request.iter()) {
            pool.release(units);
        }
    }

    /// Free units in every pool.
    pub fn free(&self) -> ResourceVector {
        ResourceVector::new(self.pools.iter().map(ResourcePool::free).collect())
    }

    pub fn contended(&self) -> u64 {
        self.pools.iter().map(ResourcePool::contended).sum()
    }
}
