//! CPU-side staging for instance buffers whose population changes per frame.
//!
//! Trails and cells are rebuilt from the ECS world every frame. The staging
//! buffer converts them to their GPU layout and tracks how much room the
//! matching GPU buffer must have:
//!
//! - [`CapacityPolicy::Paged`] grows in whole pages and never shrinks,
//!   so the GPU buffer is only recreated when a new page is added
//! - [`CapacityPolicy::Fixed`] refuses to grow and reports an error instead

use crate::{GpuInstance, InstanceBufferError};

/// Capacity that grows in whole pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagedCapacity {
    page_size: usize,
    capacity: usize,
}

impl PagedCapacity {
    /// Starts empty. A zero page size is treated as one.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            capacity: 0,
        }
    }

    /// Grow until `count` fits. Returns whether the capacity changed.
    pub fn ensure(&mut self, count: usize) -> bool {
        if count <= self.capacity {
            return false;
        }
        let pages = count.div_ceil(self.page_size);
        self.capacity = pages * self.page_size;
        true
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

/// Capacity set at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedCapacity {
    capacity: usize,
}

impl FixedCapacity {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn check(&self, count: usize) -> Result<(), InstanceBufferError> {
        if count > self.capacity {
            return Err(InstanceBufferError::CapacityExceeded {
                needed: count,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapacityPolicy {
    Paged(PagedCapacity),
    Fixed(FixedCapacity),
}

impl CapacityPolicy {
    pub fn paged(page_size: usize) -> Self {
        CapacityPolicy::Paged(PagedCapacity::new(page_size))
    }

    pub fn fixed(capacity: usize) -> Self {
        CapacityPolicy::Fixed(FixedCapacity::new(capacity))
    }

    pub fn capacity(&self) -> usize {
        match self {
            CapacityPolicy::Paged(paged) => paged.capacity(),
            CapacityPolicy::Fixed(fixed) => fixed.capacity(),
        }
    }

    /// Make room for `count` instances. `Ok(true)` means the capacity grew.
    pub fn reserve(&mut self, count: usize) -> Result<bool, InstanceBufferError> {
        match self {
            CapacityPolicy::Paged(paged) => Ok(paged.ensure(count)),
            CapacityPolicy::Fixed(fixed) => fixed.check(count).map(|_| false),
        }
    }
}

/// Per-frame instance data in GPU layout.
pub struct StagingBuffer<T: GpuInstance> {
    policy: CapacityPolicy,
    instances: Vec<T::Gpu>,
}

impl<T: GpuInstance> StagingBuffer<T> {
    pub fn new(policy: CapacityPolicy) -> Self {
        Self {
            policy,
            instances: Vec::with_capacity(policy.capacity()),
        }
    }

    /// Replace the staged contents.
    ///
    /// On error the previous contents are kept. `Ok(true)` means the
    /// capacity grew and the GPU buffer has to be recreated.
    pub fn stage<I>(&mut self, items: I) -> Result<bool, InstanceBufferError>
    where
        I: IntoIterator<Item = T>,
    {
        let gpu: Vec<T::Gpu> = items.into_iter().map(|item| item.to_gpu()).collect();
        let grew = self.policy.reserve(gpu.len())?;
        self.instances = gpu;
        Ok(grew)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instances the GPU buffer must have room for.
    pub fn capacity(&self) -> usize {
        self.policy.capacity()
    }

    /// GPU buffer size in bytes for the current capacity.
    pub fn byte_capacity(&self) -> u64 {
        self.capacity() as u64 * T::SIZE as u64
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn instances(&self) -> &[T::Gpu] {
        &self.instances
    }
}
