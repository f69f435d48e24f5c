//! Host transfer helpers for assembly kernels.
//!
//! Stencil and boundary assembly run on the host in f64 regardless of the
//! problem precision; these helpers move data across that boundary for F32
//! and F64 tensors on any runtime.

use numr::error::{Error, Result};
use numr::runtime::Runtime;
use numr::tensor::Tensor;

use crate::DType;

/// Whether a dtype is one the solver can work in.
pub fn is_float_dtype(dtype: DType) -> bool {
    matches!(dtype, DType::F32 | DType::F64)
}

/// Copy a floating point tensor to the host as f64 values (row-major).
pub fn tensor_to_f64<R: Runtime<DType = DType>>(tensor: &Tensor<R>, op: &'static str) -> Result<Vec<f64>> {
    let tensor_contig = tensor.contiguous();
    match tensor_contig.dtype() {
        DType::F32 => {
            let data: Vec<f32> = tensor_contig.to_vec();
            Ok(data.into_iter().map(f64::from).collect())
        }
        DType::F64 => Ok(tensor_contig.to_vec()),
        dtype => Err(Error::UnsupportedDType { dtype, op }),
    }
}

/// Upload f64 host values as a tensor of the requested floating point dtype.
pub fn tensor_from_f64<R: Runtime<DType = DType>>(
    data: &[f64],
    shape: &[usize],
    dtype: DType,
    device: &R::Device,
    op: &'static str,
) -> Result<Tensor<R>> {
    match dtype {
        DType::F32 => {
            let narrowed: Vec<f32> = data.iter().map(|&v| v as f32).collect();
            Ok(Tensor::<R>::from_slice(&narrowed, shape, device))
        }
        DType::F64 => Ok(Tensor::<R>::from_slice(data, shape, device)),
        _ => Err(Error::UnsupportedDType { dtype, op }),
    }
}

/// Largest absolute entry; infinite if any entry is NaN or infinite.
pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0f64, |acc, &v| {
        if v.is_finite() {
            acc.max(v.abs())
        } else {
            f64::INFINITY
        }
    })
}

/// Number of NaN or infinite entries.
pub fn count_non_finite(values: &[f64]) -> usize {
    values.iter().filter(|v| !v.is_finite()).count()
}
