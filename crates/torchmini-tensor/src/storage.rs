//! Reference-counted float storage shared by tensor views.
//!
//! A [`Storage`] is a handle to one contiguous allocation of `f32` elements. Cloning a
//! handle shares the buffer and bumps a reference count; the buffer is returned to the
//! allocator that produced it when the last handle is dropped.

use std::{alloc::Layout, ptr::NonNull, sync::Arc};

use crate::allocator::{default_allocator, SharedAllocator, TensorAllocatorError};
use crate::TensorError;

/// Inner storage implementation that holds the actual memory.
///
/// Lives behind an `Arc`; dropping it releases the buffer through the allocator
/// that produced it.
struct StorageImpl {
    /// The pointer to the buffer, non-null even for zero elements.
    ptr: NonNull<f32>,
    /// The number of `f32` elements in the buffer.
    len: usize,
    /// The memory layout used for allocation.
    layout: Layout,
    /// The allocator the buffer must be returned to.
    alloc: SharedAllocator,
}

// SAFETY: the buffer is plain `f32` data owned by this struct, and the allocator
// handle is `Send + Sync` by the `TensorAllocator` bound. Safe mutable access to the
// buffer requires a unique handle (see `Storage::as_mut_slice`).
unsafe impl Send for StorageImpl {}
unsafe impl Sync for StorageImpl {}

impl Drop for StorageImpl {
    fn drop(&mut self) {
        log::trace!(
            "releasing {} f32 elements to the {} allocator",
            self.len,
            self.alloc.name()
        );
        // SAFETY: ptr and layout were returned together by `alloc` on this allocator,
        // and this is the last reference to them.
        unsafe { self.alloc.dealloc(self.ptr.cast(), self.layout) }
    }
}

/// A shared handle to one contiguous `f32` allocation.
///
/// Cloning a `Storage` is O(1): it shares the buffer and increments the share count.
/// Moving a handle transfers its share without touching the count. The buffer is
/// allocated exactly once, in [`Storage::new`], and released exactly once, when the last
/// handle is dropped.
///
/// A default-constructed `Storage` holds no buffer ([`Storage::is_null`]); it reports a
/// length of zero and a null data pointer.
///
/// # Aliasing
///
/// All handles see the same elements. Safe mutable access requires that the handle is
/// the only one alive ([`Storage::as_mut_slice`]); writing through a shared buffer goes
/// through the `unsafe` [`Storage::as_mut_slice_unchecked`], where the caller vouches that
/// no other borrow of the buffer is alive. The share count is a snapshot and offers no
/// synchronization between threads.
#[derive(Clone, Default)]
pub struct Storage {
    inner: Option<Arc<StorageImpl>>,
}

impl Storage {
    /// Allocates a buffer of `len` elements from `alloc`.
    ///
    /// The buffer is zero-filled. `len == 0` is valid and yields an empty buffer whose
    /// pointer must not be dereferenced.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error unchanged if the request cannot be satisfied, or
    /// [`TensorAllocatorError::LayoutError`] if `len` elements do not fit a layout.
    pub fn new(len: usize, alloc: SharedAllocator) -> Result<Self, TensorAllocatorError> {
        let layout = Layout::array::<f32>(len).map_err(TensorAllocatorError::LayoutError)?;
        let ptr = alloc.alloc(layout)?.cast::<f32>();

        // safe reads require initialized elements
        // SAFETY: ptr is valid for `len` writes of f32
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, len) };

        log::trace!("allocated {len} f32 elements from the {} allocator", alloc.name());

        Ok(Self {
            inner: Some(Arc::new(StorageImpl {
                ptr,
                len,
                layout,
                alloc,
            })),
        })
    }

    /// Allocates a buffer from `alloc` and copies `data` into it.
    ///
    /// # Errors
    ///
    /// Same as [`Storage::new`].
    pub fn from_slice(data: &[f32], alloc: SharedAllocator) -> Result<Self, TensorAllocatorError> {
        let mut storage = Self::new(data.len(), alloc)?;
        if let Some(inner) = storage.inner.as_mut().and_then(Arc::get_mut) {
            // SAFETY: the buffer was just allocated with data.len() elements and is unique
            unsafe {
                std::ptr::copy_nonoverlapping(data.as_ptr(), inner.ptr.as_ptr(), data.len())
            };
        }
        Ok(storage)
    }

    /// Returns true if this handle holds no buffer.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// Returns the number of elements in the buffer, zero for a null handle.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.len)
    }

    /// Returns true if the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of bytes in the buffer.
    #[inline]
    pub fn bytes(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.layout.size())
    }

    /// Returns the pointer to the first element, or null for a null handle.
    #[inline]
    pub fn as_ptr(&self) -> *const f32 {
        self.inner
            .as_ref()
            .map_or(std::ptr::null(), |inner| inner.ptr.as_ptr() as *const f32)
    }

    /// Returns the mutable pointer to the first element, or null for a null handle.
    ///
    /// Dereferencing the pointer while other handles share the buffer is the caller's
    /// responsibility.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut f32 {
        self.inner
            .as_ref()
            .map_or(std::ptr::null_mut(), |inner| inner.ptr.as_ptr())
    }

    /// Returns the allocator that owns the buffer.
    ///
    /// A null handle reports the default allocator. Operations use this to allocate
    /// buffers compatible with an existing one.
    pub fn allocator(&self) -> SharedAllocator {
        self.inner
            .as_ref()
            .map_or_else(default_allocator, |inner| inner.alloc.clone())
    }

    /// Returns true if exactly one handle references the buffer.
    ///
    /// A null handle is never unique.
    #[inline]
    pub fn is_unique(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| Arc::strong_count(inner) == 1)
    }

    /// Returns the number of live handles sharing the buffer, zero for a null handle.
    #[inline]
    pub fn share_count(&self) -> usize {
        self.inner.as_ref().map_or(0, Arc::strong_count)
    }

    /// Returns true if both handles reference the same buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns the buffer as a slice; empty for a null handle.
    pub fn as_slice(&self) -> &[f32] {
        match &self.inner {
            // SAFETY: ptr is valid and initialized for len elements while the Arc is alive
            Some(inner) => unsafe { std::slice::from_raw_parts(inner.ptr.as_ptr(), inner.len) },
            None => &[],
        }
    }

    /// Returns the buffer as a mutable slice if this handle is the only one alive.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::SharedStorage`] if other handles share the buffer.
    pub fn as_mut_slice(&mut self) -> Result<&mut [f32], TensorError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(&mut []);
        };
        let shares = Arc::strong_count(inner);
        match Arc::get_mut(inner) {
            // SAFETY: the handle is unique and borrowed mutably, so no other borrow exists
            Some(inner) => Ok(unsafe { std::slice::from_raw_parts_mut(inner.ptr.as_ptr(), inner.len) }),
            None => Err(TensorError::SharedStorage { shares }),
        }
    }

    /// Returns the buffer as a mutable slice regardless of how many handles share it.
    ///
    /// # Safety
    ///
    /// No other slice or reference into this buffer, obtained through any handle, may be
    /// alive while the returned slice is used.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn as_mut_slice_unchecked(&self) -> &mut [f32] {
        match &self.inner {
            Some(inner) => std::slice::from_raw_parts_mut(inner.ptr.as_ptr(), inner.len),
            None => &mut [],
        }
    }

    /// Copies the contents into a vector.
    pub fn to_vec(&self) -> Vec<f32> {
        self.as_slice().to_vec()
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Some(inner) => f
                .debug_struct("Storage")
                .field("ptr", &inner.ptr)
                .field("len", &inner.len)
                .field("allocator", &inner.alloc.name())
                .field("share_count", &Arc::strong_count(inner))
                .finish(),
            None => f.write_str("Storage(null)"),
        }
    }
}
