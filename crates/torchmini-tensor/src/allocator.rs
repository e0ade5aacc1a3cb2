use std::alloc;
use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use thiserror::Error;

/// An error type for tensor allocator operations.
#[derive(Debug, Error, PartialEq)]
pub enum TensorAllocatorError {
    /// The requested layout could not be built (size overflow or bad alignment).
    #[error("Invalid tensor layout {0}")]
    LayoutError(core::alloc::LayoutError),

    /// The underlying allocator returned a null pointer.
    #[error("Null pointer")]
    NullPointer,

    /// The allocator refused the request because it would exceed its capacity.
    #[error("Out of memory: requested {requested} bytes but only {available} bytes are available")]
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes the allocator could still hand out.
        available: usize,
    },
}

impl TensorAllocatorError {
    /// Returns true if the error is caused by memory exhaustion.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::NullPointer | Self::OutOfMemory { .. })
    }

    /// Returns true if the error indicates a programming error.
    pub fn is_programming_error(&self) -> bool {
        matches!(self, Self::LayoutError(_))
    }

    /// Returns a user-friendly suggestion for resolving the error.
    pub fn suggestion(&self) -> &str {
        match self {
            Self::LayoutError(_) => "Reduce the number of elements so the buffer size fits in isize",
            Self::NullPointer => "The system is out of memory. Free unused tensors and retry",
            Self::OutOfMemory { .. } => {
                "Release tensors allocated from this allocator or raise its limit"
            }
        }
    }
}

/// A trait for allocating and deallocating memory for tensor storage.
///
/// Allocators are shared behind an [`Arc`] (see [`SharedAllocator`]) and every
/// [`Storage`](crate::storage::Storage) keeps a handle to the allocator that produced its
/// buffer, so an allocator always outlives the buffers it handed out.
///
/// # Safety
///
/// The tensor allocator must be thread-safe.
pub trait TensorAllocator: Send + Sync {
    /// Allocates memory for the given layout.
    ///
    /// Zero-sized layouts must succeed and return a well-aligned, non-null pointer that is
    /// never dereferenced.
    fn alloc(&self, layout: Layout) -> Result<NonNull<u8>, TensorAllocatorError>;

    /// Deallocates memory previously returned by [`TensorAllocator::alloc`].
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `alloc` on this same allocator with the same `layout`,
    /// and must not be deallocated twice.
    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout);

    /// Returns a short name used in logs and debug output.
    fn name(&self) -> &str;
}

/// A reference-counted, type-erased allocator handle.
pub type SharedAllocator = Arc<dyn TensorAllocator>;

/// Returns the process-wide default allocator, a shared [`CpuAllocator`].
///
/// Every call returns a handle to the same instance.
pub fn default_allocator() -> SharedAllocator {
    static DEFAULT: OnceLock<SharedAllocator> = OnceLock::new();
    DEFAULT.get_or_init(|| Arc::new(CpuAllocator)).clone()
}

// Aligned, non-null pointer standing in for zero-sized allocations.
fn dangling(layout: Layout) -> NonNull<u8> {
    // SAFETY: alignment is a non-zero power of two
    unsafe { NonNull::new_unchecked(std::ptr::null_mut::<u8>().wrapping_add(layout.align())) }
}

/// A tensor allocator that uses the system allocator.
#[derive(Clone, Debug, Default)]
pub struct CpuAllocator;

impl TensorAllocator for CpuAllocator {
    fn alloc(&self, layout: Layout) -> Result<NonNull<u8>, TensorAllocatorError> {
        if layout.size() == 0 {
            return Ok(dangling(layout));
        }
        // SAFETY: layout has a non-zero size
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(TensorAllocatorError::NullPointer)
    }

    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            alloc::dealloc(ptr.as_ptr(), layout)
        }
    }

    fn name(&self) -> &str {
        "cpu"
    }
}

/// An allocator adaptor that records every allocation made through it.
///
/// It forwards requests to an inner allocator and keeps counters of live bytes, allocations
/// and deallocations. With [`TrackingAllocator::with_limit`] it behaves as a bounded arena
/// that refuses requests exceeding the remaining capacity.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use torchmini_tensor::allocator::{CpuAllocator, TrackingAllocator};
/// use torchmini_tensor::Storage;
///
/// let tracker = Arc::new(TrackingAllocator::new(CpuAllocator));
/// let storage = Storage::new(16, tracker.clone()).unwrap();
/// assert_eq!(tracker.live_bytes(), 16 * std::mem::size_of::<f32>());
/// drop(storage);
/// assert_eq!(tracker.live_bytes(), 0);
/// ```
#[derive(Debug, Default)]
pub struct TrackingAllocator<A: TensorAllocator = CpuAllocator> {
    inner: A,
    limit: Option<usize>,
    live_bytes: AtomicUsize,
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
}

impl<A: TensorAllocator> TrackingAllocator<A> {
    /// Creates an unbounded tracking allocator on top of `inner`.
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            limit: None,
            live_bytes: AtomicUsize::new(0),
            allocations: AtomicUsize::new(0),
            deallocations: AtomicUsize::new(0),
        }
    }

    /// Creates a tracking allocator that never holds more than `limit` live bytes.
    pub fn with_limit(inner: A, limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new(inner)
        }
    }

    /// Returns the byte limit, if any.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns the number of bytes currently allocated.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Acquire)
    }

    /// Returns the number of successful allocations so far.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Acquire)
    }

    /// Returns the number of deallocations so far.
    pub fn deallocations(&self) -> usize {
        self.deallocations.load(Ordering::Acquire)
    }

    /// Returns the number of allocations that have not been released yet.
    pub fn live_allocations(&self) -> usize {
        self.allocations() - self.deallocations()
    }

    fn reserve(&self, requested: usize) -> Result<(), TensorAllocatorError> {
        let Some(limit) = self.limit else {
            self.live_bytes.fetch_add(requested, Ordering::AcqRel);
            return Ok(());
        };

        let mut current = self.live_bytes.load(Ordering::Acquire);
        loop {
            let available = limit.saturating_sub(current);
            if requested > available {
                log::debug!(
                    "tracking allocator refused {requested} bytes ({available} of {limit} available)"
                );
                return Err(TensorAllocatorError::OutOfMemory {
                    requested,
                    available,
                });
            }
            match self.live_bytes.compare_exchange_weak(
                current,
                current + requested,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }
}

impl<A: TensorAllocator> TensorAllocator for TrackingAllocator<A> {
    fn alloc(&self, layout: Layout) -> Result<NonNull<u8>, TensorAllocatorError> {
        self.reserve(layout.size())?;
        match self.inner.alloc(layout) {
            Ok(ptr) => {
                self.allocations.fetch_add(1, Ordering::AcqRel);
                Ok(ptr)
            }
            Err(e) => {
                self.live_bytes.fetch_sub(layout.size(), Ordering::AcqRel);
                Err(e)
            }
        }
    }

    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout) {
        self.inner.dealloc(ptr, layout);
        self.live_bytes.fetch_sub(layout.size(), Ordering::AcqRel);
        self.deallocations.fetch_add(1, Ordering::AcqRel);
    }

    fn name(&self) -> &str {
        "tracking"
    }
}
