//! Helpers shared by the tests of the workspace crates.

mod approx_eq;
mod gradient;

pub use crate::{
    approx_eq::ApproxEqIter,
    gradient::{numeric_derivative, numeric_jacobian},
};
#[doc(hidden)]
pub use float_cmp::approx_eq;
