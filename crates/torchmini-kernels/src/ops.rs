use crate::error::KernelError;
use num_traits::Zero;

/// Adds two slices element by element into `out`.
///
/// Writes `out[i] = a[i] + b[i]` for every index. Nothing is written unless all three
/// slices have the same length.
///
/// # Arguments
///
/// * `a` - First slice of values
/// * `b` - Second slice of values
/// * `out` - Output slice
///
/// # Errors
///
/// * `LengthMismatch` if `a` and `b` differ in length.
/// * `OutputLengthMismatch` if `out` differs in length from the inputs.
///
/// Example:
/// ```
/// use torchmini_kernels::ops::add_into_kernel;
///
/// let a = [1.0, 2.0, 3.0];
/// let b = [4.0, 5.0, 6.0];
/// let mut out = [0.0; 3];
/// add_into_kernel(&a, &b, &mut out).unwrap();
/// assert_eq!(out, [5.0, 7.0, 9.0]);
/// ```
pub fn add_into_kernel<T>(a: &[T], b: &[T], out: &mut [T]) -> Result<(), KernelError>
where
    T: Copy + std::ops::Add<Output = T>,
{
    if a.len() != b.len() {
        return Err(KernelError::LengthMismatch(a.len(), b.len()));
    }
    if out.len() != a.len() {
        return Err(KernelError::OutputLengthMismatch(a.len(), out.len()));
    }

    out.iter_mut()
        .zip(a.iter().zip(b.iter()))
        .for_each(|(o, (&a_val, &b_val))| *o = a_val + b_val);

    Ok(())
}

/// Adds `b` into `acc` element by element.
///
/// This is the form of [`add_into_kernel`] where the output is the first operand. Each index is
/// read and written independently, so updating in place is exact.
///
/// # Errors
///
/// If the lengths of the slices don't match, a `LengthMismatch` error is returned and
/// `acc` is left unchanged.
///
/// Example:
/// ```
/// use torchmini_kernels::ops::add_assign_kernel;
///
/// let mut acc = [1.0, 2.0];
/// add_assign_kernel(&mut acc, &[0.5, 0.5]).unwrap();
/// assert_eq!(acc, [1.5, 2.5]);
/// ```
pub fn add_assign_kernel<T>(acc: &mut [T], b: &[T]) -> Result<(), KernelError>
where
    T: Copy + std::ops::Add<Output = T>,
{
    if acc.len() != b.len() {
        return Err(KernelError::LengthMismatch(acc.len(), b.len()));
    }

    acc.iter_mut()
        .zip(b.iter())
        .for_each(|(a_val, &b_val)| *a_val = *a_val + b_val);

    Ok(())
}

/// Adds two slices element by element into a newly allocated vector.
///
/// Allocates the result and delegates to [`add_into_kernel`]. Prefer [`add_into_kernel`] or
/// [`add_assign_kernel`] when an output buffer already exists.
///
/// # Errors
///
/// If the lengths of the slices don't match, a `LengthMismatch` error is returned and
/// nothing is allocated.
///
/// Example:
/// ```
/// use torchmini_kernels::ops::add_kernel;
///
/// let c = add_kernel(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(c, vec![5.0, 7.0, 9.0]);
/// ```
#[must_use = "the sum is returned in a new buffer; use `add_into_kernel` to write into an existing one"]
pub fn add_kernel<T>(a: &[T], b: &[T]) -> Result<Vec<T>, KernelError>
where
    T: Zero + Copy + std::ops::Add<Output = T>,
{
    if a.len() != b.len() {
        return Err(KernelError::LengthMismatch(a.len(), b.len()));
    }

    let mut out = vec![T::zero(); a.len()];
    add_into_kernel(a, b, &mut out)?;

    Ok(out)
}

/// Adds `len` elements of `a` and `b` into `out` through raw pointers.
///
/// Every index is read from both inputs before it is written, so `out` may be the same range
/// as `a` or `b`. This is the form of [`add_into_kernel`] for buffers that cannot be borrowed
/// as separate slices.
///
/// # Safety
///
/// * `a` and `b` must be valid for `len` reads and `out` for `len` writes.
/// * If `out` overlaps an input, both must start at the same address.
/// * No reference into the `out` range may be alive during the call.
pub unsafe fn add_into_raw_kernel<T>(a: *const T, b: *const T, out: *mut T, len: usize)
where
    T: Copy + std::ops::Add<Output = T>,
{
    for i in 0..len {
        out.add(i).write(a.add(i).read() + b.add(i).read());
    }
}
