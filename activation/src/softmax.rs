use ndarray::{
    Array2,
    Array3,
    ArrayBase,
    Axis,
    Data,
    DataMut,
    DataOwned,
    Dimension,
    Ix2,
    NdFloat,
    RemoveAxis,
};

use crate::function::{ActivationFunction, Derivative};

/// Computes softmax along specified axis.
///
/// Inspired by [autograd's softmax implementation], especially the trick to subtract the max value
/// to reduce the chance of an overflow.
///
/// [autograd's softmax implementation]: https://docs.rs/autograd/1.0.0/src/autograd/ops/activation_ops.rs.html#59
pub fn softmax<A, S, D>(array: ArrayBase<S, D>, axis: Axis) -> ArrayBase<S, D>
where
    A: NdFloat,
    S: DataOwned<Elem = A> + DataMut<Elem = A>,
    D: Dimension + RemoveAxis,
{
    // Subtract `max` to prevent overflow, this
    // doesn't affect the outcome of the softmax.
    let max = array
        .fold_axis(axis, A::min_value(), |state, val| A::max(*state, *val))
        .insert_axis(axis)
        .into_dimensionality::<D>()
        .unwrap();
    let mut tmp = array - max;

    tmp.mapv_inplace(|v| v.exp());
    let sum = tmp
        .sum_axis(axis)
        .insert_axis(axis)
        .into_dimensionality::<D>()
        .unwrap();
    tmp / sum
}

/// Softmax activation function.
///
/// Normalizes over the last axis, i.e. the features of a `(batch, features)` array.
///
/// # Panics on usage
///
/// - if the input array is zero-dimensional
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Softmax;

impl ActivationFunction for Softmax {
    fn name(&self) -> &'static str {
        "softmax"
    }

    fn apply_to<A, S, D>(&self, input: ArrayBase<S, D>) -> ArrayBase<S, D>
    where
        A: NdFloat,
        S: DataOwned<Elem = A> + DataMut<Elem = A>,
        D: Dimension + RemoveAxis,
    {
        assert!(input.ndim() > 0, "softmax needs at least one axis");
        let axis = Axis(input.ndim() - 1);
        softmax(input, axis)
    }

    /// Always returns a scalar `1`, independent of the shape and values of `output`.
    ///
    /// This is not the derivative of the softmax. It assumes the softmax is followed by a
    /// cross entropy loss whose gradient wrt. the logits already is `output - target`. Use
    /// [`Softmax::jacobian()`] if the actual partial derivatives are needed.
    fn derivative<A, S, D>(&self, _output: &ArrayBase<S, D>) -> Derivative<A, D>
    where
        A: NdFloat,
        S: Data<Elem = A>,
        D: Dimension,
    {
        Derivative::Scalar(A::one())
    }
}

impl Softmax {
    /// Computes the Jacobian of the softmax for each sample.
    ///
    /// Given the softmax `output` of shape `(batch, features)` this returns an array of shape
    /// `(batch, features, features)` with
    ///
    /// ```text
    /// J[b, i, j] = ∂output[b, i] / ∂input[b, j] = output[b, i] * (δ_ij - output[b, j])
    /// ```
    pub fn jacobian<A, S>(output: &ArrayBase<S, Ix2>) -> Array3<A>
    where
        A: NdFloat,
        S: Data<Elem = A>,
    {
        let features = output.shape()[1];
        // (1, features, features) - (batch, 1, features) => (batch, features, features)
        let identity = Array2::<A>::eye(features).insert_axis(Axis(0));
        let shifted = identity - &output.view().insert_axis(Axis(1));
        // (batch, features, 1) * (batch, features, features)
        &output.view().insert_axis(Axis(2)) * &shifted
    }

    /// Computes the diagonal of the per sample [`jacobian()`](Self::jacobian).
    ///
    /// The result has the same `(batch, features)` shape as `output` and contains the partial
    /// derivatives `∂output[b, i] / ∂input[b, i]`.
    pub fn jacobian_diagonal<A, S>(output: &ArrayBase<S, Ix2>) -> Array2<A>
    where
        A: NdFloat,
        S: Data<Elem = A>,
    {
        output.mapv(|a| a * (A::one() - a))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2, arr3, Array1};
    use test_utils::{assert_approx_eq, numeric_jacobian};

    use super::*;

    #[test]
    fn test_softmax_1d() {
        let arr = arr1(&[-1_f32, 0., 1., 2., 3.]);

        let res = arr1(&[
            0.011656231_f32,
            0.03168492,
            0.08612854,
            0.23412167,
            0.6364086,
        ]);
        assert_approx_eq!(f32, softmax(arr.clone(), Axis(0)), &res);
        assert_approx_eq!(f32, Softmax.apply_to(arr), res);
    }

    #[test]
    fn test_softmax_2d() {
        let arr = arr2(&[
            [-1_f32, 0., 1., 2., 3.],
            [9., 8., 7., 6., 5.],
            [1., -1., 1., -1., 1.],
        ]);

        // axis 0
        let res = arr2(&[
            [
                0.000045382647_f32,
                0.00033530878,
                0.0024665247,
                0.017970119,
                0.11731042,
            ],
            [0.99961925, 0.9995414, 0.995067, 0.9811352, 0.8668133],
            [
                0.00033533492,
                0.00012335321,
                0.0024665247,
                0.0008946795,
                0.01587624,
            ],
        ]);
        assert_approx_eq!(f32, softmax(arr.clone(), Axis(0)), res);

        // axis 1, the features
        let res = arr2(&[
            [
                0.011656231_f32,
                0.03168492,
                0.08612854,
                0.23412167,
                0.6364086,
            ],
            [0.6364086, 0.23412167, 0.08612854, 0.03168492, 0.011656231],
            [0.3057477, 0.04137845, 0.3057477, 0.04137845, 0.3057477],
        ]);
        assert_approx_eq!(f32, softmax(arr.clone(), Axis(1)), &res);
        assert_approx_eq!(f32, Softmax.apply_to(arr), res);
    }

    #[test]
    fn test_softmax_applies_over_last_axis() {
        let arr = arr3(&[
            [[-1_f32, 2.], [3.5, -4.0]],
            [[3.0, 2.4], [-3.0, -1.2]],
        ]);
        let expected = softmax(arr.clone(), Axis(2));
        assert_approx_eq!(f32, Softmax.apply_to(arr), expected);
    }

    #[test]
    fn test_softmax_edgecases() {
        // a single feature always gets all the probability mass
        let arr = arr2(&[[-1_f32], [9.], [1.]]);
        let res = arr2(&[[1_f32], [1.], [1.]]);
        assert_approx_eq!(f32, Softmax.apply_to(arr), res);

        // constant rows are uniform
        let arr = arr2(&[[2_f32, 2., 2., 2.]]);
        let res = arr2(&[[0.25_f32, 0.25, 0.25, 0.25]]);
        assert_approx_eq!(f32, Softmax.apply_to(arr), res);
    }

    #[test]
    fn test_softmax_does_not_overflow_for_large_logits() {
        let arr = arr2(&[[1000_f32, 1000.], [-1000., 0.]]);
        let res = arr2(&[[0.5_f32, 0.5], [0., 1.]]);
        assert_approx_eq!(f32, Softmax.apply_to(arr), res);
    }

    #[test]
    #[should_panic(expected = "softmax needs at least one axis")]
    fn test_softmax_panics_without_axis() {
        Softmax.apply_to(ndarray::arr0(1_f32).into_dyn());
    }

    #[test]
    fn test_softmax_derivative_is_scalar_one() {
        let output = Softmax.apply_to(arr2(&[[0.3_f32, -1.2, 4.], [1., 1., 1.]]));
        assert_eq!(Softmax.derivative(&output), Derivative::Scalar(1.));
        assert_eq!(
            Softmax.derivative(&Array1::<f64>::zeros(7)),
            Derivative::Scalar(1.)
        );
    }

    #[test]
    fn test_jacobian_of_uniform_output() {
        let output = arr2(&[[0.5_f32, 0.5]]);
        let expected = arr3(&[[[0.25_f32, -0.25], [-0.25, 0.25]]]);
        assert_approx_eq!(f32, Softmax::jacobian(&output), expected);
    }

    #[test]
    fn test_jacobian_matches_numeric_jacobian() {
        let input = arr2(&[[-1.0, 0.5, 2.0, 0.0], [3.0, -2.0, 0.25, 1.5]]);
        let output = Softmax.apply_to(input.clone());
        let numeric = numeric_jacobian(|z| Softmax.apply_to(z), &input, 1e-6);
        assert_approx_eq!(f64, Softmax::jacobian(&output), numeric, epsilon = 1e-6);
    }

    #[test]
    fn test_jacobian_diagonal_matches_numeric_jacobian() {
        let input = arr2(&[[-1.0, 0.5, 2.0, 0.0], [3.0, -2.0, 0.25, 1.5]]);
        let output = Softmax.apply_to(input.clone());
        let numeric = numeric_jacobian(|z| Softmax.apply_to(z), &input, 1e-6);

        let diagonal = Softmax::jacobian_diagonal(&output);
        assert_eq!(diagonal.shape(), output.shape());
        for (row, sample) in diagonal.outer_iter().zip(numeric.outer_iter()) {
            assert_approx_eq!(f64, row, sample.diag(), epsilon = 1e-6);
        }
        let jacobian = Softmax::jacobian(&output);
        for (row, sample) in diagonal.outer_iter().zip(jacobian.outer_iter()) {
            assert_approx_eq!(f64, row, sample.diag(), ulps = 4);
        }
    }
}
