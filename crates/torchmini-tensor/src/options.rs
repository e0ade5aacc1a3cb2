use crate::allocator::{default_allocator, SharedAllocator};
use crate::device::Device;

/// Allocation settings passed to tensor factories.
///
/// Pairs a [`Device`] tag with the allocator new buffers are drawn from. The options hold
/// a shared handle to the allocator and never own an allocation themselves.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use torchmini_tensor::allocator::{CpuAllocator, TrackingAllocator};
/// use torchmini_tensor::{Device, TensorOptions};
///
/// let options = TensorOptions::default()
///     .with_device(Device::Cpu)
///     .with_allocator(Arc::new(TrackingAllocator::new(CpuAllocator)));
/// assert_eq!(options.allocator().name(), "tracking");
/// ```
#[derive(Clone)]
pub struct TensorOptions {
    device: Device,
    allocator: SharedAllocator,
}

impl TensorOptions {
    /// Creates options for `device` backed by `allocator`.
    pub fn new(device: Device, allocator: SharedAllocator) -> Self {
        Self { device, allocator }
    }

    /// Returns the options with the device replaced.
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Returns the options with the allocator replaced.
    pub fn with_allocator(mut self, allocator: SharedAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    /// Returns the device tag.
    #[inline]
    pub fn device(&self) -> Device {
        self.device
    }

    /// Returns the allocator handle.
    #[inline]
    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }
}

impl Default for TensorOptions {
    fn default() -> Self {
        Self::new(Device::default(), default_allocator())
    }
}

impl std::fmt::Debug for TensorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensorOptions")
            .field("device", &self.device)
            .field("allocator", &self.allocator.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::allocator::{CpuAllocator, TrackingAllocator};

    #[test]
    fn test_default_options() {
        let options = TensorOptions::default();
        assert_eq!(options.device(), Device::Cpu);
        assert!(Arc::ptr_eq(options.allocator(), &default_allocator()));
    }

    #[test]
    fn test_builder_chain() {
        let tracker: SharedAllocator = Arc::new(TrackingAllocator::new(CpuAllocator));
        let options = TensorOptions::default()
            .with_allocator(tracker.clone())
            .with_device(Device::Cpu);
        assert!(Arc::ptr_eq(options.allocator(), &tracker));
        assert_eq!(format!("{options:?}"), "TensorOptions { device: Cpu, allocator: \"tracking\" }");
    }
}
