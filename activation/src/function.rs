use std::fmt;

use ndarray::{Array, ArrayBase, Data, DataMut, DataOwned, Dimension, NdFloat, RemoveAxis};
use serde::{Deserialize, Serialize};

use crate::softmax::Softmax;

/// Trait representing activation functions.
///
/// Implementors are stateless: applying the same function to the same input always yields
/// the same output.
pub trait ActivationFunction {
    /// The lowercase tag of the activation function.
    ///
    /// This is used both for display and as the key in the [`Registry`](crate::Registry).
    fn name(&self) -> &'static str;

    /// Applies the activation function to given array.
    ///
    /// In most cases this will call `input.mapv_inplace` and
    /// apply some function element wise.
    ///
    /// # Panics
    ///
    /// Activation functions which operate over an axis (like [`Softmax`]) panic if the
    /// input has no axes. Any activation function for which this can happen documents it
    /// on the type level documentation.
    fn apply_to<A, S, D>(&self, input: ArrayBase<S, D>) -> ArrayBase<S, D>
    where
        A: NdFloat,
        S: DataOwned<Elem = A> + DataMut<Elem = A>,
        D: Dimension + RemoveAxis;

    /// Computes the local derivative used by back propagation.
    ///
    /// Depending on the function this must be called with the *output* of
    /// [`apply_to`](Self::apply_to) (sigmoid, tanh, relu, softmax) or with its
    /// *input* (linear).
    fn derivative<A, S, D>(&self, input: &ArrayBase<S, D>) -> Derivative<A, D>
    where
        A: NdFloat,
        S: Data<Elem = A>,
        D: Dimension;
}

/// The local derivative of an activation function.
#[derive(Clone, Debug, PartialEq)]
pub enum Derivative<A, D>
where
    D: Dimension,
{
    /// A derivative for each element, with the same shape as the array it was computed from.
    Elementwise(Array<A, D>),
    /// A single factor which applies to every element.
    ///
    /// Softmax uses this to pass the upstream gradient through unchanged, expecting it to
    /// already include the Jacobian (as is the case with a cross entropy loss).
    Scalar(A),
}

impl<A, D> Derivative<A, D>
where
    A: NdFloat,
    D: Dimension,
{
    /// Multiplies the upstream gradient with this local derivative.
    ///
    /// # Panics
    ///
    /// Panics if an elementwise derivative can't be broadcast with the upstream gradient.
    pub fn chain<S>(&self, upstream: ArrayBase<S, D>) -> Array<A, D>
    where
        S: Data<Elem = A>,
    {
        match self {
            Derivative::Elementwise(derivative) => upstream.into_owned() * derivative,
            Derivative::Scalar(factor) => {
                let factor = *factor;
                upstream.mapv(|v| v * factor)
            }
        }
    }

    /// Returns the elementwise derivative, if there is one.
    pub fn into_elementwise(self) -> Option<Array<A, D>> {
        match self {
            Derivative::Elementwise(derivative) => Some(derivative),
            Derivative::Scalar(_) => None,
        }
    }

    /// Whether this is a single factor instead of an elementwise derivative.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Derivative::Scalar(_))
    }
}

/// Logistic sigmoid activation function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Sigmoid;

impl ActivationFunction for Sigmoid {
    fn name(&self) -> &'static str {
        "sigmoid"
    }

    fn apply_to<A, S, D>(&self, mut input: ArrayBase<S, D>) -> ArrayBase<S, D>
    where
        A: NdFloat,
        S: DataOwned<Elem = A> + DataMut<Elem = A>,
        D: Dimension + RemoveAxis,
    {
        input.mapv_inplace(|v| A::one() / (A::one() + (-v).exp()));
        input
    }

    /// Expects the output of the sigmoid.
    fn derivative<A, S, D>(&self, output: &ArrayBase<S, D>) -> Derivative<A, D>
    where
        A: NdFloat,
        S: Data<Elem = A>,
        D: Dimension,
    {
        Derivative::Elementwise(output.mapv(|a| a * (A::one() - a)))
    }
}

/// Hyperbolic tangent activation function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tanh;

impl ActivationFunction for Tanh {
    fn name(&self) -> &'static str {
        "tanh"
    }

    fn apply_to<A, S, D>(&self, mut input: ArrayBase<S, D>) -> ArrayBase<S, D>
    where
        A: NdFloat,
        S: DataOwned<Elem = A> + DataMut<Elem = A>,
        D: Dimension + RemoveAxis,
    {
        input.mapv_inplace(|v| v.tanh());
        input
    }

    /// Expects the output of the tanh.
    fn derivative<A, S, D>(&self, output: &ArrayBase<S, D>) -> Derivative<A, D>
    where
        A: NdFloat,
        S: Data<Elem = A>,
        D: Dimension,
    {
        Derivative::Elementwise(output.mapv(|a| A::one() - a * a))
    }
}

/// Linear activation function.
///
/// Like common this is a identity function used
/// in cases where there no activation function is needed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Linear;

impl ActivationFunction for Linear {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn apply_to<A, S, D>(&self, input: ArrayBase<S, D>) -> ArrayBase<S, D>
    where
        A: NdFloat,
        S: DataOwned<Elem = A> + DataMut<Elem = A>,
        D: Dimension + RemoveAxis,
    {
        input
    }

    /// Expects the input of the linear function, only its shape is relevant.
    fn derivative<A, S, D>(&self, input: &ArrayBase<S, D>) -> Derivative<A, D>
    where
        A: NdFloat,
        S: Data<Elem = A>,
        D: Dimension,
    {
        Derivative::Elementwise(Array::ones(input.raw_dim()))
    }
}

/// reLu activation function.
///
/// NaN inputs are passed through unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Relu;

impl ActivationFunction for Relu {
    fn name(&self) -> &'static str {
        "relu"
    }

    fn apply_to<A, S, D>(&self, mut input: ArrayBase<S, D>) -> ArrayBase<S, D>
    where
        A: NdFloat,
        S: DataOwned<Elem = A> + DataMut<Elem = A>,
        D: Dimension + RemoveAxis,
    {
        input.mapv_inplace(|v| if v < A::zero() { A::zero() } else { v });
        input
    }

    /// Expects the output of the relu.
    ///
    /// The derivative is `1` for strictly positive outputs and `0` otherwise, which
    /// includes the non-differentiable point at `0` and NaN outputs.
    fn derivative<A, S, D>(&self, output: &ArrayBase<S, D>) -> Derivative<A, D>
    where
        A: NdFloat,
        S: Data<Elem = A>,
        D: Dimension,
    {
        Derivative::Elementwise(output.mapv(|a| if a > A::zero() { A::one() } else { A::zero() }))
    }
}

/// Any of the supported activation functions.
///
/// (De-)serializes as its lowercase name, e.g. `"relu"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Sigmoid,
    Tanh,
    Linear,
    Relu,
    Softmax,
}

macro_rules! dispatch {
    ($self:expr, $af:ident => $body:expr) => {
        match $self {
            Activation::Sigmoid => {
                let $af = Sigmoid;
                $body
            }
            Activation::Tanh => {
                let $af = Tanh;
                $body
            }
            Activation::Linear => {
                let $af = Linear;
                $body
            }
            Activation::Relu => {
                let $af = Relu;
                $body
            }
            Activation::Softmax => {
                let $af = Softmax;
                $body
            }
        }
    };
}

impl ActivationFunction for Activation {
    fn name(&self) -> &'static str {
        dispatch!(self, af => af.name())
    }

    fn apply_to<A, S, D>(&self, input: ArrayBase<S, D>) -> ArrayBase<S, D>
    where
        A: NdFloat,
        S: DataOwned<Elem = A> + DataMut<Elem = A>,
        D: Dimension + RemoveAxis,
    {
        dispatch!(self, af => af.apply_to(input))
    }

    fn derivative<A, S, D>(&self, input: &ArrayBase<S, D>) -> Derivative<A, D>
    where
        A: NdFloat,
        S: Data<Elem = A>,
        D: Dimension,
    {
        dispatch!(self, af => af.derivative(input))
    }
}

macro_rules! impl_activation_glue {
    ($($af:ident),+ $(,)?) => {
        $(
            impl From<$af> for Activation {
                fn from(_: $af) -> Self {
                    Activation::$af
                }
            }

            impl fmt::Display for $af {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.name())
                }
            }
        )+
    };
}

impl_activation_glue!(Sigmoid, Tanh, Linear, Relu, Softmax);

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
