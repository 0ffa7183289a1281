#![cfg_attr(doc, forbid(broken_intra_doc_links, private_intra_doc_links))]
//! Activation functions for neural network layers.
//!
//! Every activation function has a forward form ([`ActivationFunction::apply_to`]) and a
//! local derivative ([`ActivationFunction::derivative`]) which supplies the factor needed
//! by the chain rule during back propagation.
//!
//! ```
//! use activation::{get_activation, ActivationFunction};
//! use ndarray::arr2;
//!
//! let sigmoid = get_activation("sigmoid").unwrap();
//! let output = sigmoid.apply_to(arr2(&[[0.0f32]]));
//! assert_eq!(output, arr2(&[[0.5]]));
//!
//! let derivative = sigmoid.derivative(&output).into_elementwise().unwrap();
//! assert_eq!(derivative, arr2(&[[0.25]]));
//! ```
#![forbid(unsafe_op_in_unsafe_fn)]

mod function;
mod registry;
mod softmax;

pub use crate::{
    function::{Activation, ActivationFunction, Derivative, Linear, Relu, Sigmoid, Tanh},
    registry::{get_activation, Registry, UnknownActivation},
    softmax::{softmax, Softmax},
};
