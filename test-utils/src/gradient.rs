use ndarray::{s, Array, Array2, Array3, ArrayBase, Data, Dimension, Ix2, NdFloat};

/// Estimates the derivative of an elementwise function with central differences.
///
/// Every element of `input` is shifted by `±step` at once, which is only valid if `f`
/// doesn't mix elements.
pub fn numeric_derivative<A, S, D, F>(f: F, input: &ArrayBase<S, D>, step: A) -> Array<A, D>
where
    A: NdFloat,
    S: Data<Elem = A>,
    D: Dimension,
    F: Fn(Array<A, D>) -> Array<A, D>,
{
    let plus = f(input.mapv(|v| v + step));
    let minus = f(input.mapv(|v| v - step));
    (plus - minus).mapv_into(|v| v / (step + step))
}

/// Estimates the per sample Jacobian of a row wise function with central differences.
///
/// For an `input` of shape `(batch, features)` this returns an array of shape
/// `(batch, features, features)` where `[b, i, j]` is the partial derivative of the
/// `i`-th output wrt. the `j`-th input of sample `b`.
///
/// All samples are shifted at once, which is only valid if `f` doesn't mix rows.
pub fn numeric_jacobian<A, S, F>(f: F, input: &ArrayBase<S, Ix2>, step: A) -> Array3<A>
where
    A: NdFloat,
    S: Data<Elem = A>,
    F: Fn(Array2<A>) -> Array2<A>,
{
    let (batch, features) = input.dim();
    let mut jacobian = Array3::zeros((batch, features, features));
    for j in 0..features {
        let mut plus = input.to_owned();
        plus.column_mut(j).mapv_inplace(|v| v + step);
        let mut minus = input.to_owned();
        minus.column_mut(j).mapv_inplace(|v| v - step);

        let partials = (f(plus) - f(minus)).mapv_into(|v| v / (step + step));
        jacobian.slice_mut(s![.., .., j]).assign(&partials);
    }

    jacobian
}
