use torchmini_kernels::ops::{add_assign_kernel, add_into_kernel, add_into_raw_kernel};
use torchmini_tensor::{Tensor4D, TensorOptions};

use crate::error::TensorOpsError;

fn check_same_shape(a: &Tensor4D, b: &Tensor4D) -> Result<(), TensorOpsError> {
    if a.shape() != b.shape() {
        return Err(TensorOpsError::ShapeMismatch(
            a.shape().to_array().to_vec(),
            b.shape().to_array().to_vec(),
        ));
    }
    Ok(())
}

fn check_contiguous(t: &Tensor4D) -> Result<(), TensorOpsError> {
    if !t.is_contiguous() {
        return Err(TensorOpsError::NotContiguous(
            t.strides().to_array().to_vec(),
            t.shape().to_array().to_vec(),
        ));
    }
    Ok(())
}

// an output may alias an input only element for element
fn check_overlap(input: &Tensor4D, out: &Tensor4D) -> Result<(), TensorOpsError> {
    let (i0, o0, n) = (input.storage_offset(), out.storage_offset(), out.numel());
    if n == 0 || i0 == o0 || !input.storage().ptr_eq(out.storage()) {
        return Ok(());
    }
    if i0 < o0 + n && o0 < i0 + n {
        return Err(TensorOpsError::PartialOverlap(i0, o0));
    }
    Ok(())
}

/// Add two tensors element by element into a new tensor.
///
/// The output is contiguous and is allocated from the allocator of `a`'s storage.
///
/// # Arguments
///
/// * `a` - First tensor
/// * `b` - Second tensor
///
/// # Returns
///
/// A new contiguous tensor with `out[i] = a[i] + b[i]`.
///
/// # Errors
///
/// * `ShapeMismatch` if the shapes differ.
/// * `NotContiguous` if either operand is not contiguous.
/// * `TensorError` if an operand runs past its storage or the allocation fails.
///
/// # Example
///
/// ```
/// use torchmini_tensor::{Shape4, Tensor4D, TensorOptions};
/// use torchmini_tensor_ops::ops::add;
///
/// let shape = Shape4::new(1, 1, 1, 3);
/// let options = TensorOptions::default();
/// let a = Tensor4D::from_shape_slice(shape, &[1.0, 2.0, 3.0], &options).unwrap();
/// let b = Tensor4D::from_shape_slice(shape, &[4.0, 5.0, 6.0], &options).unwrap();
/// let c = add(&a, &b).unwrap();
/// assert_eq!(c.as_slice().unwrap(), &[5.0, 7.0, 9.0]);
/// ```
pub fn add(a: &Tensor4D, b: &Tensor4D) -> Result<Tensor4D, TensorOpsError> {
    check_same_shape(a, b)?;
    check_contiguous(a)?;
    check_contiguous(b)?;

    let a_data = a.as_slice()?;
    let b_data = b.as_slice()?;

    let allocator = a.storage().allocator();
    log::trace!(
        "allocating {} elements for add output from the {} allocator",
        a.numel(),
        allocator.name()
    );
    let options = TensorOptions::default().with_allocator(allocator);
    let mut out = Tensor4D::contiguous(a.shape(), &options)?;

    add_into_kernel(a_data, b_data, out.as_mut_slice()?)?;

    Ok(out)
}

/// Add two tensors element by element into an existing output tensor.
///
/// # Errors
///
/// The errors of [`add`], applied to `out` as well, plus `TensorError::SharedStorage` if
/// `out` shares its storage with another handle. Nothing is written on error.
///
/// An `out` that aliases `a` or `b` is always shared; write into it with
/// [`add_into_unchecked`] instead.
pub fn add_into(a: &Tensor4D, b: &Tensor4D, out: &mut Tensor4D) -> Result<(), TensorOpsError> {
    check_same_shape(a, b)?;
    check_same_shape(a, out)?;
    check_contiguous(a)?;
    check_contiguous(b)?;
    check_contiguous(out)?;

    add_into_kernel(a.as_slice()?, b.as_slice()?, out.as_mut_slice()?)?;

    Ok(())
}

/// Add two tensors element by element into an output that may share storage with them.
///
/// `out` may be a view of the same elements as `a` or `b` (for instance a clone of `a`),
/// or a disjoint view of the same buffer. The writes are visible through every view of the
/// storage.
///
/// # Errors
///
/// The errors of [`add_into`] except `SharedStorage`, plus `PartialOverlap` if `out` shares
/// elements with an input at a different storage offset. Nothing is written on error.
///
/// # Safety
///
/// No reference to the elements of `out`, obtained through any handle, may be alive during
/// the call.
///
/// # Example
///
/// ```
/// use torchmini_tensor::{Shape4, Tensor4D, TensorOptions};
/// use torchmini_tensor_ops::ops::add_into_unchecked;
///
/// let shape = Shape4::new(1, 1, 1, 2);
/// let a = Tensor4D::from_shape_slice(shape, &[1.0, 2.0], &TensorOptions::default()).unwrap();
/// let out = a.clone();
/// // SAFETY: no slice of the buffer is borrowed during the call
/// unsafe { add_into_unchecked(&a, &a, &out).unwrap() };
/// assert_eq!(a.as_slice().unwrap(), &[2.0, 4.0]);
/// ```
pub unsafe fn add_into_unchecked(
    a: &Tensor4D,
    b: &Tensor4D,
    out: &Tensor4D,
) -> Result<(), TensorOpsError> {
    check_same_shape(a, b)?;
    check_same_shape(a, out)?;
    check_contiguous(a)?;
    check_contiguous(b)?;
    check_contiguous(out)?;
    a.check_bounds()?;
    b.check_bounds()?;
    out.check_bounds()?;
    check_overlap(a, out)?;
    check_overlap(b, out)?;

    if out.numel() == 0 {
        return Ok(());
    }

    // the storage pointer comes from a mutable allocation
    add_into_raw_kernel(a.as_ptr(), b.as_ptr(), out.as_ptr().cast_mut(), out.numel());

    Ok(())
}

/// Add `b` into `acc` element by element, in place.
///
/// # Errors
///
/// The errors of [`add_into`] with `acc` as the output.
pub fn add_assign(acc: &mut Tensor4D, b: &Tensor4D) -> Result<(), TensorOpsError> {
    check_same_shape(acc, b)?;
    check_contiguous(acc)?;
    check_contiguous(b)?;

    add_assign_kernel(acc.as_mut_slice()?, b.as_slice()?)?;

    Ok(())
}
