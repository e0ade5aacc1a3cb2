use std::ops::Range;

use thiserror::Error;

use super::{
    allocator::TensorAllocatorError,
    options::TensorOptions,
    shape::{Shape4, Strides4},
    storage::Storage,
};

/// Error type for tensor storage and view operations.
///
/// The variants fall into the classes callers usually branch on: invalid arguments
/// ([`TensorError::is_invalid_argument`]), out-of-range accesses
/// ([`TensorError::is_out_of_range`]) and allocation failures carried unmodified in
/// [`TensorError::StorageError`].
#[derive(Error, Debug, PartialEq)]
pub enum TensorError {
    /// A view was constructed over a storage handle that holds no buffer.
    #[error("Null storage: a tensor view requires an allocated storage")]
    NullStorage,

    /// The data handed to a factory does not hold exactly one element per shape position.
    #[error("Shape mismatch: expected {expected} elements for shape, but got {actual} elements in data")]
    InvalidShape {
        /// Expected number of elements based on shape
        expected: usize,
        /// Actual number of elements in the data
        actual: usize,
    },

    /// A view offset, or the furthest element a view can reach, lies outside its storage.
    #[error("Offset {offset} out of range for storage of {len} elements")]
    OffsetOutOfRange {
        /// The offending element offset
        offset: usize,
        /// The number of elements in the storage
        len: usize,
    },

    /// Index exceeds tensor bounds.
    ///
    /// This occurs when an index along one dimension is not smaller than that
    /// dimension's extent.
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index that was attempted
        index: usize,
        /// The size of the dimension being indexed
        size: usize,
    },

    /// The element count, byte count or a stride of a shape does not fit in `usize`.
    #[error("Shape {shape:?} overflows the addressable element count")]
    ShapeOverflow {
        /// The offending shape in (N, C, H, W) order
        shape: [usize; 4],
    },

    /// Safe mutable access was requested on a buffer shared by several handles.
    #[error("Storage is shared by {shares} handles; mutable access requires a unique handle")]
    SharedStorage {
        /// Number of live handles at the time of the request
        shares: usize,
    },

    /// Operation not supported for this tensor configuration.
    ///
    /// Raised, for instance, when a flat-range operation is applied to a
    /// non-contiguous view.
    #[error("Unsupported operation: {operation} - {reason}")]
    UnsupportedOperation {
        /// Name of the operation that failed
        operation: String,
        /// Reason why the operation is not supported
        reason: String,
    },

    /// Underlying storage operation failed.
    ///
    /// Wraps the allocator error without altering it. See [`TensorAllocatorError`].
    #[error("Storage error: {0}")]
    StorageError(#[from] TensorAllocatorError),
}

impl TensorError {
    /// Creates an InvalidShape error with clear context.
    pub fn invalid_shape(expected: usize, actual: usize) -> Self {
        Self::InvalidShape { expected, actual }
    }

    /// Creates an UnsupportedOperation error with context.
    pub fn unsupported_operation(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for invalid-argument class errors.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::NullStorage | Self::InvalidShape { .. } | Self::ShapeOverflow { .. }
        )
    }

    /// Returns true for out-of-range class errors.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::OffsetOutOfRange { .. } | Self::IndexOutOfBounds { .. }
        )
    }

    /// Returns true if this error is recoverable by freeing memory.
    pub fn is_out_of_memory(&self) -> bool {
        match self {
            Self::StorageError(e) => e.is_out_of_memory(),
            _ => false,
        }
    }

    /// Returns true if this error indicates a programming error.
    pub fn is_programming_error(&self) -> bool {
        match self {
            Self::StorageError(e) => e.is_programming_error(),
            _ => true,
        }
    }

    /// Returns a user-friendly suggestion for resolving the error.
    pub fn suggestion(&self) -> &str {
        match self {
            Self::NullStorage => "Allocate the storage with Storage::new before building a view",
            Self::InvalidShape { .. } => {
                "Ensure the product of shape dimensions equals the number of data elements"
            }
            Self::OffsetOutOfRange { .. } => {
                "Check that the view offset, shape and strides stay within the storage"
            }
            Self::IndexOutOfBounds { .. } => {
                "Verify indices are within bounds (0 <= index < dimension_size)"
            }
            Self::ShapeOverflow { .. } => "Reduce the tensor extents",
            Self::SharedStorage { .. } => {
                "Drop the other handles first, or write through the unchecked aliasing API"
            }
            Self::UnsupportedOperation { .. } => {
                "Check API documentation for operation requirements and supported configurations"
            }
            Self::StorageError(e) => e.suggestion(),
        }
    }
}

/// A rank-4 strided view over a shared [`Storage`].
///
/// A `Tensor4D` pairs a storage handle with a [`Shape4`], a [`Strides4`] and an element
/// offset. The element at `[n, c, h, w]` lives at storage position
/// `offset + n * strides.n + c * strides.c + h * strides.h + w * strides.w`.
///
/// Any number of views may reference the same storage; they may overlap or alias.
/// Cloning a view is O(1) and shares the storage. Dropping a view releases its share of
/// the storage, which frees the buffer only if it was the last handle.
///
/// # Bounds
///
/// Construction checks that the storage is allocated, that the element and byte counts
/// of the shape fit in `usize`, and that the offset of a non-empty view is inside the
/// storage. It does not check that every reachable element is inside the storage; that
/// check is explicit:
///
/// * [`Tensor4D::check_bounds`] validates the full extent once,
/// * [`Tensor4D::offset_of`] and [`Tensor4D::get`] check every access,
/// * [`Tensor4D::offset_of_unchecked`] and [`Tensor4D::get_unchecked`] check nothing.
///
/// Flat-range access ([`Tensor4D::as_slice`], [`Tensor4D::as_mut_slice`],
/// [`Tensor4D::fill`]) is limited to contiguous views and always runs `check_bounds`.
///
/// # Aliasing
///
/// The safe mutators need the storage handle to be unique and fail with
/// [`TensorError::SharedStorage`] otherwise. Writing through a view of a shared buffer goes
/// through the `unsafe` [`Tensor4D::as_mut_slice_unchecked`] and [`Tensor4D::fill_unchecked`],
/// which only borrow the elements of the view.
/// There is no strided iterator; non-contiguous views are read element by element.
///
/// # Example
///
/// ```
/// use torchmini_tensor::{Shape4, Tensor4D, TensorOptions};
///
/// let mut t = Tensor4D::contiguous(Shape4::new(1, 1, 2, 2), &TensorOptions::default()).unwrap();
/// t.fill(3.0).unwrap();
/// assert_eq!(t.as_slice().unwrap(), &[3.0; 4]);
/// assert_eq!(t.get([0, 0, 1, 1]), Some(3.0));
/// ```
#[derive(Clone)]
pub struct Tensor4D {
    storage: Storage,
    shape: Shape4,
    strides: Strides4,
    offset: usize,
    numel: usize,
}

impl Tensor4D {
    /// Allocates a zero-filled, contiguous tensor of the given shape.
    ///
    /// The buffer comes from the allocator in `options`; strides are row-major and the
    /// offset is zero. This is the only constructor that allocates.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ShapeOverflow`] if the shape is not addressable, or
    /// [`TensorError::StorageError`] if the allocator fails.
    pub fn contiguous(shape: Shape4, options: &TensorOptions) -> Result<Self, TensorError> {
        let numel = shape.numel()?;
        let strides = Strides4::contiguous(&shape)?;
        let storage = Storage::new(numel, options.allocator().clone())?;
        Self::new(storage, shape, strides, 0)
    }

    /// Allocates a contiguous tensor and copies `data` into it.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidShape`] if `data` does not hold exactly
    /// `shape.numel()` elements, plus the errors of [`Tensor4D::contiguous`].
    pub fn from_shape_slice(
        shape: Shape4,
        data: &[f32],
        options: &TensorOptions,
    ) -> Result<Self, TensorError> {
        let numel = shape.numel()?;
        if numel != data.len() {
            return Err(TensorError::invalid_shape(numel, data.len()));
        }
        let strides = Strides4::contiguous(&shape)?;
        let storage = Storage::from_slice(data, options.allocator().clone())?;
        Self::new(storage, shape, strides, 0)
    }

    /// Wraps an existing storage as a view. No memory is allocated or copied.
    ///
    /// # Arguments
    ///
    /// * `storage` - The shared buffer to view.
    /// * `shape` - The extents of the view.
    /// * `strides` - Element strides of the view.
    /// * `offset` - Storage position of element `[0, 0, 0, 0]`.
    ///
    /// # Errors
    ///
    /// * [`TensorError::NullStorage`] if `storage` holds no buffer, whatever the shape.
    /// * [`TensorError::ShapeOverflow`] if the element or byte count overflows.
    /// * [`TensorError::OffsetOutOfRange`] if the view is non-empty and
    ///   `offset >= storage.len()`.
    pub fn new(
        storage: Storage,
        shape: Shape4,
        strides: Strides4,
        offset: usize,
    ) -> Result<Self, TensorError> {
        if storage.is_null() {
            return Err(TensorError::NullStorage);
        }
        let numel = shape.numel()?;
        if numel.checked_mul(std::mem::size_of::<f32>()).is_none() {
            return Err(TensorError::ShapeOverflow {
                shape: shape.to_array(),
            });
        }
        if numel != 0 && offset >= storage.len() {
            return Err(TensorError::OffsetOutOfRange {
                offset,
                len: storage.len(),
            });
        }
        Ok(Self {
            storage,
            shape,
            strides,
            offset,
            numel,
        })
    }

    /// Returns the shape of the view.
    #[inline]
    pub fn shape(&self) -> Shape4 {
        self.shape
    }

    /// Returns the strides of the view.
    #[inline]
    pub fn strides(&self) -> Strides4 {
        self.strides
    }

    /// Returns the number of elements in the view.
    #[inline]
    pub fn numel(&self) -> usize {
        self.numel
    }

    /// Returns the number of bytes covered by the view's elements.
    #[inline]
    pub fn bytes(&self) -> usize {
        self.numel * std::mem::size_of::<f32>()
    }

    /// Batch extent.
    #[inline]
    pub fn n(&self) -> usize {
        self.shape.n
    }

    /// Channel extent.
    #[inline]
    pub fn c(&self) -> usize {
        self.shape.c
    }

    /// Height extent.
    #[inline]
    pub fn h(&self) -> usize {
        self.shape.h
    }

    /// Width extent.
    #[inline]
    pub fn w(&self) -> usize {
        self.shape.w
    }

    /// Returns true if the strides equal the row-major strides of the shape.
    pub fn is_contiguous(&self) -> bool {
        Strides4::contiguous(&self.shape).is_ok_and(|expected| expected == self.strides)
    }

    /// Returns the storage backing the view.
    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Returns the storage position of element `[0, 0, 0, 0]`.
    #[inline]
    pub fn storage_offset(&self) -> usize {
        self.offset
    }

    /// Returns a pointer to element `[0, 0, 0, 0]`.
    ///
    /// For an empty view the pointer may lie past the end of the storage and must not be
    /// dereferenced.
    #[inline]
    pub fn as_ptr(&self) -> *const f32 {
        self.storage.as_ptr().wrapping_add(self.offset)
    }

    /// Returns the storage position of the element at `index`, checking every bound.
    ///
    /// # Errors
    ///
    /// * [`TensorError::IndexOutOfBounds`] if an index is not smaller than its extent.
    /// * [`TensorError::OffsetOutOfRange`] if the position overflows or falls outside the
    ///   storage.
    pub fn offset_of(&self, index: [usize; 4]) -> Result<usize, TensorError> {
        let mut offset = Some(self.offset);
        for ((idx, size), stride) in index
            .into_iter()
            .zip(self.shape.to_array())
            .zip(self.strides.to_array())
        {
            if idx >= size {
                return Err(TensorError::IndexOutOfBounds { index: idx, size });
            }
            offset = offset.and_then(|o| idx.checked_mul(stride)?.checked_add(o));
        }
        let len = self.storage.len();
        match offset {
            Some(offset) if offset < len => Ok(offset),
            Some(offset) => Err(TensorError::OffsetOutOfRange { offset, len }),
            None => Err(TensorError::OffsetOutOfRange {
                offset: usize::MAX,
                len,
            }),
        }
    }

    /// Returns the storage position of the element at `index` without any check.
    pub fn offset_of_unchecked(&self, index: [usize; 4]) -> usize {
        index
            .into_iter()
            .zip(self.strides.to_array())
            .fold(self.offset, |acc, (idx, stride)| acc + idx * stride)
    }

    /// Returns the element at `index`, or `None` if the access is out of bounds.
    pub fn get(&self, index: [usize; 4]) -> Option<f32> {
        let offset = self.offset_of(index).ok()?;
        self.storage.as_slice().get(offset).copied()
    }

    /// Returns the element at `index` without checking bounds.
    ///
    /// # Safety
    ///
    /// [`Tensor4D::offset_of_unchecked`] of `index` must be smaller than the storage length.
    pub unsafe fn get_unchecked(&self, index: [usize; 4]) -> f32 {
        *self
            .storage
            .as_slice()
            .get_unchecked(self.offset_of_unchecked(index))
    }

    /// Checks that every element reachable through the view is inside the storage.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::OffsetOutOfRange`] with the furthest reachable position.
    pub fn check_bounds(&self) -> Result<(), TensorError> {
        if self.numel == 0 {
            return Ok(());
        }
        let len = self.storage.len();
        let last = self
            .shape
            .to_array()
            .into_iter()
            .zip(self.strides.to_array())
            .try_fold(self.offset, |acc, (size, stride)| {
                (size - 1).checked_mul(stride)?.checked_add(acc)
            });
        match last {
            Some(last) if last < len => Ok(()),
            Some(last) => Err(TensorError::OffsetOutOfRange { offset: last, len }),
            None => Err(TensorError::OffsetOutOfRange {
                offset: usize::MAX,
                len,
            }),
        }
    }

    fn flat_range(&self, operation: &str) -> Result<Range<usize>, TensorError> {
        if !self.is_contiguous() {
            return Err(TensorError::unsupported_operation(
                operation,
                format!(
                    "view with strides {:?} is not contiguous for shape {:?}",
                    self.strides.to_array(),
                    self.shape.to_array()
                ),
            ));
        }
        if self.numel == 0 {
            return Ok(0..0);
        }
        self.check_bounds()?;
        Ok(self.offset..self.offset + self.numel)
    }

    /// Returns the elements of a contiguous view as a flat slice of `numel()` elements.
    ///
    /// # Errors
    ///
    /// * [`TensorError::UnsupportedOperation`] if the view is not contiguous.
    /// * [`TensorError::OffsetOutOfRange`] if the view runs past the storage.
    pub fn as_slice(&self) -> Result<&[f32], TensorError> {
        let range = self.flat_range("as_slice")?;
        Ok(&self.storage.as_slice()[range])
    }

    /// Returns the elements of a contiguous view as a flat mutable slice.
    ///
    /// # Errors
    ///
    /// The errors of [`Tensor4D::as_slice`], plus [`TensorError::SharedStorage`] if other
    /// handles share the storage.
    pub fn as_mut_slice(&mut self) -> Result<&mut [f32], TensorError> {
        let range = self.flat_range("as_mut_slice")?;
        Ok(&mut self.storage.as_mut_slice()?[range])
    }

    /// Sets every element of a contiguous view to `value`.
    ///
    /// A non-contiguous view is rejected with [`TensorError::UnsupportedOperation`] and the
    /// buffer is left untouched. Use [`Tensor4D::fill_unchecked`] to fill a view whose
    /// storage is shared with other views.
    ///
    /// # Errors
    ///
    /// The errors of [`Tensor4D::as_mut_slice`].
    pub fn fill(&mut self, value: f32) -> Result<(), TensorError> {
        let range = self.flat_range("fill")?;
        self.storage.as_mut_slice()?[range].fill(value);
        Ok(())
    }

    /// Returns the elements of a contiguous view as a flat mutable slice, whether or not
    /// other handles share the storage.
    ///
    /// Only the `numel()` elements of the view are borrowed, so writes through disjoint views
    /// of one buffer do not conflict.
    ///
    /// # Errors
    ///
    /// The errors of [`Tensor4D::as_slice`].
    ///
    /// # Safety
    ///
    /// No other reference to the elements of this view, obtained through any handle, may be
    /// alive while the returned slice is used.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn as_mut_slice_unchecked(&self) -> Result<&mut [f32], TensorError> {
        let range = self.flat_range("as_mut_slice_unchecked")?;
        if range.is_empty() {
            return Ok(&mut []);
        }
        // the storage pointer comes from a mutable allocation
        let ptr = self.storage.as_ptr().cast_mut().add(range.start);
        Ok(std::slice::from_raw_parts_mut(ptr, range.len()))
    }

    /// Sets every element of a contiguous view to `value`, whether or not other handles
    /// share the storage.
    ///
    /// The writes are visible through every view of the same storage. A non-contiguous view
    /// is rejected as in [`Tensor4D::fill`].
    ///
    /// # Errors
    ///
    /// The errors of [`Tensor4D::as_slice`].
    ///
    /// # Safety
    ///
    /// Same contract as [`Tensor4D::as_mut_slice_unchecked`].
    pub unsafe fn fill_unchecked(&self, value: f32) -> Result<(), TensorError> {
        self.as_mut_slice_unchecked()?.fill(value);
        Ok(())
    }
}

impl std::fmt::Debug for Tensor4D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor4D")
            .field("shape", &self.shape.to_array())
            .field("strides", &self.strides.to_array())
            .field("offset", &self.offset)
            .field("storage", &self.storage)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::allocator::{default_allocator, CpuAllocator, TrackingAllocator};

    fn arange(len: usize) -> Result<Storage, TensorError> {
        let data = (0..len).map(|i| i as f32).collect::<Vec<_>>();
        Ok(Storage::from_slice(&data, default_allocator())?)
    }

    #[test]
    fn contiguous_2345() -> Result<(), TensorError> {
        let t = Tensor4D::contiguous(Shape4::new(2, 3, 4, 5), &TensorOptions::default())?;
        assert_eq!(t.numel(), 120);
        assert_eq!(t.bytes(), 120 * std::mem::size_of::<f32>());
        assert_eq!(t.strides(), Strides4::new(60, 20, 5, 1));
        assert_eq!((t.n(), t.c(), t.h(), t.w()), (2, 3, 4, 5));
        assert_eq!(t.storage_offset(), 0);
        assert_eq!(t.storage().len(), 120);
        assert!(t.is_contiguous());
        assert!(t.storage().is_unique());
        assert_eq!(t.as_ptr(), t.storage().as_ptr());
        Ok(())
    }

    #[test]
    fn contiguous_uses_options_allocator() -> Result<(), TensorError> {
        let tracker = Arc::new(TrackingAllocator::new(CpuAllocator));
        let options = TensorOptions::default().with_allocator(tracker.clone());
        let t = Tensor4D::contiguous(Shape4::new(1, 2, 3, 4), &options)?;
        assert_eq!(tracker.live_bytes(), t.bytes());
        drop(t);
        assert_eq!(tracker.live_bytes(), 0);
        Ok(())
    }

    #[test]
    fn contiguous_allocation_failure() {
        let tracker = Arc::new(TrackingAllocator::with_limit(CpuAllocator, 8));
        let options = TensorOptions::default().with_allocator(tracker);
        let err = Tensor4D::contiguous(Shape4::new(1, 1, 2, 2), &options).unwrap_err();
        assert_eq!(
            err,
            TensorError::StorageError(TensorAllocatorError::OutOfMemory {
                requested: 16,
                available: 8
            })
        );
        assert!(err.is_out_of_memory());
    }

    #[test]
    fn contiguous_shape_overflow() {
        let shape = Shape4::new(usize::MAX, usize::MAX, 1, 1);
        let err = Tensor4D::contiguous(shape, &TensorOptions::default()).unwrap_err();
        assert!(matches!(err, TensorError::ShapeOverflow { .. }));
    }

    #[test]
    fn new_null_storage() {
        for shape in [Shape4::new(1, 1, 1, 1), Shape4::new(0, 0, 0, 0)] {
            let err = Tensor4D::new(Storage::default(), shape, Strides4::default(), 0).unwrap_err();
            assert_eq!(err, TensorError::NullStorage);
            assert!(err.is_invalid_argument());
        }
    }

    #[test]
    fn new_offset_out_of_range() -> Result<(), TensorError> {
        let storage = arange(4)?;
        let shape = Shape4::new(1, 1, 1, 1);
        let err = Tensor4D::new(storage.clone(), shape, Strides4::new(1, 1, 1, 1), 4).unwrap_err();
        assert_eq!(err, TensorError::OffsetOutOfRange { offset: 4, len: 4 });
        assert!(err.is_out_of_range());

        // the last element is a valid offset
        let t = Tensor4D::new(storage, shape, Strides4::new(1, 1, 1, 1), 3)?;
        assert_eq!(t.get([0, 0, 0, 0]), Some(3.0));
        Ok(())
    }

    #[test]
    fn new_empty_view_any_offset() -> Result<(), TensorError> {
        let storage = arange(4)?;
        let shape = Shape4::new(0, 1, 1, 1);
        let t = Tensor4D::new(storage, shape, Strides4::contiguous(&shape)?, 100)?;
        assert_eq!(t.numel(), 0);
        assert_eq!(t.bytes(), 0);
        t.check_bounds()?;
        assert_eq!(t.as_slice()?, &[] as &[f32]);
        Ok(())
    }

    #[test]
    fn new_weak_bounds_check() -> Result<(), TensorError> {
        // construction only checks the offset, not the reachable extent
        let storage = arange(4)?;
        let t = Tensor4D::new(storage, Shape4::new(1, 1, 2, 4), Strides4::new(8, 8, 4, 1), 0)?;
        assert!(t.is_contiguous());
        assert_eq!(
            t.check_bounds(),
            Err(TensorError::OffsetOutOfRange { offset: 7, len: 4 })
        );
        assert!(t.as_slice().is_err());
        assert_eq!(t.get([0, 0, 0, 3]), Some(3.0));
        assert_eq!(t.get([0, 0, 1, 0]), None);
        Ok(())
    }

    #[test]
    fn view_shares_storage() -> Result<(), TensorError> {
        let t = Tensor4D::contiguous(Shape4::new(1, 2, 2, 2), &TensorOptions::default())?;
        let view = Tensor4D::new(
            t.storage().clone(),
            Shape4::new(1, 1, 2, 2),
            Strides4::new(4, 4, 2, 1),
            4,
        )?;
        assert!(view.storage().ptr_eq(t.storage()));
        assert_eq!(t.storage().share_count(), 2);
        assert_eq!(view.as_ptr(), t.as_ptr().wrapping_add(4));

        let copy = view.clone();
        assert_eq!(t.storage().share_count(), 3);
        drop(copy);
        drop(view);
        assert!(t.storage().is_unique());
        Ok(())
    }

    #[test]
    fn view_keeps_validated_storage() -> Result<(), TensorError> {
        let mut storage = arange(4)?;
        let view = Tensor4D::new(
            storage.clone(),
            Shape4::new(1, 1, 1, 4),
            Strides4::new(4, 4, 4, 1),
            0,
        )?;

        // replacing a handle does not reach the buffer the view was checked against
        storage = Storage::default();
        assert!(storage.is_null());
        assert!(view.storage().is_unique());
        view.check_bounds()?;
        assert_eq!(view.as_slice()?, &[0.0, 1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn offset_of_checked() -> Result<(), TensorError> {
        let t = Tensor4D::new(
            arange(24)?,
            Shape4::new(2, 3, 2, 2),
            Strides4::new(12, 4, 2, 1),
            0,
        )?;
        assert_eq!(t.offset_of([1, 2, 1, 0])?, 12 + 8 + 2);
        assert_eq!(t.offset_of_unchecked([1, 2, 1, 0]), 22);
        assert_eq!(
            t.offset_of([0, 3, 0, 0]),
            Err(TensorError::IndexOutOfBounds { index: 3, size: 3 })
        );
        assert_eq!(t.get([1, 2, 1, 1]), Some(23.0));
        assert_eq!(unsafe { t.get_unchecked([1, 0, 0, 1]) }, 13.0);
        Ok(())
    }

    #[test]
    fn offset_of_overflow() -> Result<(), TensorError> {
        let t = Tensor4D::new(
            arange(4)?,
            Shape4::new(2, 1, 1, 1),
            Strides4::new(usize::MAX, 1, 1, 1),
            0,
        )?;
        assert_eq!(t.get([0, 0, 0, 0]), Some(0.0));
        assert!(matches!(
            t.offset_of([1, 0, 0, 0]),
            Err(TensorError::OffsetOutOfRange { .. })
        ));
        assert!(t.check_bounds().is_err());
        Ok(())
    }

    #[test]
    fn non_contiguous_transpose() -> Result<(), TensorError> {
        // swap h and w of a 1x1x2x3 buffer
        let t = Tensor4D::new(
            arange(6)?,
            Shape4::new(1, 1, 3, 2),
            Strides4::new(6, 6, 1, 3),
            0,
        )?;
        assert!(!t.is_contiguous());
        t.check_bounds()?;
        assert_eq!(t.get([0, 0, 0, 1]), Some(3.0));
        assert_eq!(t.get([0, 0, 2, 0]), Some(2.0));
        assert!(matches!(
            t.as_slice(),
            Err(TensorError::UnsupportedOperation { .. })
        ));
        Ok(())
    }

    #[test]
    fn fill_contiguous() -> Result<(), TensorError> {
        let mut t = Tensor4D::contiguous(Shape4::new(2, 1, 2, 3), &TensorOptions::default())?;
        t.fill(1.5)?;
        assert_eq!(t.as_slice()?, &[1.5; 12]);
        Ok(())
    }

    #[test]
    fn fill_non_contiguous_leaves_buffer() -> Result<(), TensorError> {
        let storage = arange(6)?;
        let mut t = Tensor4D::new(
            storage.clone(),
            Shape4::new(1, 1, 3, 2),
            Strides4::new(6, 6, 1, 3),
            0,
        )?;
        let err = t.fill(9.0).unwrap_err();
        assert!(matches!(err, TensorError::UnsupportedOperation { ref operation, .. } if operation == "fill"));
        assert_eq!(storage.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        Ok(())
    }

    #[test]
    fn fill_shared_storage_fails() -> Result<(), TensorError> {
        let mut t = Tensor4D::contiguous(Shape4::new(1, 1, 2, 2), &TensorOptions::default())?;
        let alias = t.clone();
        assert_eq!(t.fill(1.0), Err(TensorError::SharedStorage { shares: 2 }));
        drop(alias);
        t.fill(1.0)?;
        assert_eq!(t.as_slice()?, &[1.0; 4]);
        Ok(())
    }

    #[test]
    fn fill_unchecked_shared_channel() -> Result<(), TensorError> {
        let base = Tensor4D::contiguous(Shape4::new(1, 2, 2, 2), &TensorOptions::default())?;
        let mut channel = Tensor4D::new(
            base.storage().clone(),
            Shape4::new(1, 1, 2, 2),
            Strides4::new(4, 4, 2, 1),
            4,
        )?;
        assert!(channel.is_contiguous());
        assert_eq!(channel.fill(3.0), Err(TensorError::SharedStorage { shares: 2 }));

        // SAFETY: no slice of the buffer is borrowed while filling
        unsafe { channel.fill_unchecked(3.0)? };
        assert_eq!(
            base.as_slice()?,
            &[0.0, 0.0, 0.0, 0.0, 3.0, 3.0, 3.0, 3.0]
        );
        Ok(())
    }

    #[test]
    fn fill_unchecked_non_contiguous_leaves_buffer() -> Result<(), TensorError> {
        let storage = arange(6)?;
        let t = Tensor4D::new(
            storage.clone(),
            Shape4::new(1, 1, 3, 2),
            Strides4::new(6, 6, 1, 3),
            0,
        )?;
        // SAFETY: no slice of the buffer is borrowed
        let err = unsafe { t.fill_unchecked(9.0) }.unwrap_err();
        assert!(matches!(err, TensorError::UnsupportedOperation { ref operation, .. } if operation == "as_mut_slice_unchecked"));
        assert_eq!(storage.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        Ok(())
    }

    #[test]
    fn as_mut_slice_unchecked_borrows_view_only() -> Result<(), TensorError> {
        let storage = arange(4)?;
        let left = Tensor4D::new(storage.clone(), Shape4::new(1, 1, 1, 2), Strides4::new(2, 2, 2, 1), 0)?;
        let right = Tensor4D::new(storage.clone(), Shape4::new(1, 1, 1, 2), Strides4::new(2, 2, 2, 1), 2)?;

        // SAFETY: the two views cover disjoint elements
        let (l, r) = unsafe { (left.as_mut_slice_unchecked()?, right.as_mut_slice_unchecked()?) };
        l.swap_with_slice(r);
        assert_eq!(storage.as_slice(), &[2.0, 3.0, 0.0, 1.0]);
        Ok(())
    }

    #[test]
    fn fill_sub_view() -> Result<(), TensorError> {
        let storage = arange(8)?;
        let mut view = Tensor4D::new(storage, Shape4::new(1, 1, 1, 4), Strides4::new(4, 4, 4, 1), 2)?;
        view.fill(-1.0)?;
        assert_eq!(
            view.storage().as_slice(),
            &[0.0, 1.0, -1.0, -1.0, -1.0, -1.0, 6.0, 7.0]
        );
        Ok(())
    }

    #[test]
    fn from_shape_slice_len_mismatch() {
        let err = Tensor4D::from_shape_slice(
            Shape4::new(1, 1, 2, 2),
            &[1.0, 2.0, 3.0],
            &TensorOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TensorError::InvalidShape {
                expected: 4,
                actual: 3
            }
        );
        assert!(err.is_invalid_argument());
        assert!(err.is_programming_error());
    }

    #[test]
    fn error_suggestions() {
        assert!(!TensorError::NullStorage.suggestion().is_empty());
        assert!(TensorError::SharedStorage { shares: 2 }.is_programming_error());
        assert!(!TensorError::StorageError(TensorAllocatorError::NullPointer).is_programming_error());
    }
}
