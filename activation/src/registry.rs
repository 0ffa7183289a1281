use std::{
    collections::{hash_map, HashMap},
    str::FromStr,
};

use displaydoc::Display;
use lazy_static::lazy_static;
use log::{debug, trace};
use thiserror::Error;

use crate::function::{Activation, ActivationFunction};

/// Unknown activation function: {0}
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub struct UnknownActivation(pub String);

lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
}

/// A read-only mapping from the lowercase name of an activation function to the function.
#[derive(Clone, Debug)]
pub struct Registry {
    activations: HashMap<&'static str, Activation>,
}

impl Registry {
    fn new() -> Self {
        let activations = [
            Activation::Sigmoid,
            Activation::Tanh,
            Activation::Linear,
            Activation::Relu,
            Activation::Softmax,
        ]
        .iter()
        .map(|activation| (activation.name(), *activation))
        .collect::<HashMap<_, _>>();
        trace!("built activation registry with {} entries", activations.len());

        Self { activations }
    }

    /// The process wide registry.
    pub fn global() -> &'static Self {
        &*REGISTRY
    }

    /// Looks up the activation function registered under exactly this `name`.
    pub fn get(&self, name: &str) -> Result<Activation, UnknownActivation> {
        self.activations.get(name).copied().ok_or_else(|| {
            debug!("lookup of unknown activation function {:?}", name);
            UnknownActivation(name.to_string())
        })
    }

    /// Whether an activation function is registered under exactly this `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.activations.contains_key(name)
    }

    /// The registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.activations.keys().copied()
    }

    /// Iterates over the `(name, activation)` pairs, in no particular order.
    pub fn iter(&self) -> hash_map::Iter<'_, &'static str, Activation> {
        self.activations.iter()
    }

    /// The number of registered activation functions.
    pub fn len(&self) -> usize {
        self.activations.len()
    }

    /// Whether no activation function is registered.
    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = (&'a &'static str, &'a Activation);
    type IntoIter = hash_map::Iter<'a, &'static str, Activation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Gets the activation function with the given name from the [`Registry::global()`].
///
/// The lookup ignores ASCII case.
pub fn get_activation(name: &str) -> Result<Activation, UnknownActivation> {
    Registry::global().get(&name.to_ascii_lowercase())
}

impl FromStr for Activation {
    type Err = UnknownActivation;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        get_activation(name)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeSet, thread};

    use ndarray::arr2;
    use rstest::rstest;
    use test_utils::assert_approx_eq;

    use super::*;

    #[test]
    fn test_registry_contains_exactly_the_activation_functions() {
        let names = Registry::global().names().collect::<BTreeSet<_>>();
        let expected = ["linear", "relu", "sigmoid", "softmax", "tanh"]
            .iter()
            .copied()
            .collect::<BTreeSet<_>>();
        assert_eq!(names, expected);
        assert_eq!(Registry::global().len(), 5);
        assert!(!Registry::global().is_empty());
    }

    #[test]
    fn test_registry_keys_are_the_names() {
        for (name, activation) in Registry::global() {
            assert_eq!(*name, activation.name());
        }
    }

    #[rstest(
        name,
        expected,
        case("sigmoid", Activation::Sigmoid),
        case("tanh", Activation::Tanh),
        case("linear", Activation::Linear),
        case("relu", Activation::Relu),
        case("softmax", Activation::Softmax)
    )]
    fn test_get_activation(name: &str, expected: Activation) {
        assert_eq!(get_activation(name).unwrap(), expected);
        assert_eq!(name.parse::<Activation>().unwrap(), expected);
    }

    #[test]
    fn test_registered_functions_work() {
        let sigmoid = get_activation("sigmoid").unwrap();
        assert_approx_eq!(f32, sigmoid.apply_to(arr2(&[[0.0f32]])), [[0.5]], ulps = 0);

        let relu = get_activation("relu").unwrap();
        assert_approx_eq!(f32, relu.apply_to(arr2(&[[-3.0f32]])), [[0.]], ulps = 0);
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(get_activation("ReLU").unwrap(), Activation::Relu);
        assert_eq!(get_activation("SoftMax").unwrap(), Activation::Softmax);
        assert!(!Registry::global().contains("ReLU"));
        Registry::global().get("ReLU").unwrap_err();
    }

    #[test]
    fn test_unknown_activation_is_not_found() {
        let error = get_activation("swish").unwrap_err();
        assert_eq!(error, UnknownActivation("swish".to_string()));
        assert_eq!(error.to_string(), "Unknown activation function: swish");
        "".parse::<Activation>().unwrap_err();
    }

    #[test]
    fn test_registry_is_shared_between_threads() {
        let handles = (0..4)
            .map(|_| thread::spawn(|| get_activation("tanh").unwrap()))
            .collect::<Vec<_>>();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Activation::Tanh);
        }
        assert!(std::ptr::eq(Registry::global(), Registry::global()));
    }
}
