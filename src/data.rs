//! Conversion between `ndarray` arrays and Burn tensors.
//!
//! Data pipelines commonly hold recordings as `Array3<f64>` in
//! `[batch, time, feature]` order; these helpers move them onto a device
//! and back without changing layout or precision.

use crate::error::{PsidError, PsidResult};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use ndarray::{Array3, ArrayBase, Data, Ix3};

/// Copy an `[batch, time, feature]` array or view into a tensor on `device`.
pub fn tensor_from_array3<B, S>(array: &ArrayBase<S, Ix3>, device: &B::Device) -> Tensor<B, 3>
where
    B: Backend,
    S: Data<Elem = f64>,
{
    let shape = array.shape().to_vec();
    // iter() walks in logical (row-major) order regardless of memory layout
    let values: Vec<f64> = array.iter().copied().collect();
    Tensor::from_data(TensorData::new(values, shape), device)
}

/// Read a tensor back into an `[batch, time, feature]` array.
pub fn array3_from_tensor<B: Backend>(tensor: Tensor<B, 3>) -> PsidResult<Array3<f64>> {
    let [batch, seq_len, features] = tensor.dims();
    let values = tensor
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(|e| PsidError::data(format!("{:?}", e)))?;

    Ok(Array3::from_shape_vec((batch, seq_len, features), values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use ndarray::{s, Array};

    type TestBackend = NdArray<f64>;

    #[test]
    fn test_tensor_keeps_array_indexing() {
        let device = Default::default();
        let array = Array::from_shape_fn((2, 3, 4), |(b, t, f)| (100 * b + 10 * t + f) as f64);

        let tensor = tensor_from_array3::<TestBackend, _>(&array, &device);
        assert_eq!(tensor.dims(), [2, 3, 4]);

        let value: f64 = tensor.slice([1..2, 2..3, 3..4]).into_scalar();
        assert_eq!(value, 123.0);
    }

    #[test]
    fn test_non_contiguous_view_is_copied_in_logical_order() {
        let device = Default::default();
        let full = Array::from_shape_fn((2, 6, 2), |(b, t, f)| (100 * b + 10 * t + f) as f64);
        let every_other_step = full.slice(s![.., ..;2, ..]);
        let swapped = full.view().permuted_axes([0, 2, 1]);

        let tensor = tensor_from_array3::<TestBackend, _>(&every_other_step, &device);
        assert_eq!(tensor.dims(), [2, 3, 2]);
        assert_eq!(array3_from_tensor(tensor).unwrap(), every_other_step);

        let tensor = tensor_from_array3::<TestBackend, _>(&swapped, &device);
        assert_eq!(tensor.dims(), [2, 2, 6]);
        assert_eq!(array3_from_tensor(tensor).unwrap(), swapped);
    }

    #[test]
    fn test_array_from_tensor_shape() {
        let device = Default::default();
        let tensor = Tensor::<TestBackend, 3>::ones([3, 1, 2], &device);

        let array = array3_from_tensor(tensor).unwrap();
        assert_eq!(array.dim(), (3, 1, 2));
        assert!(array.iter().all(|&v| v == 1.0));
    }
}
