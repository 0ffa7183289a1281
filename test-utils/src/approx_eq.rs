use ndarray::{ArrayBase, Data, Dimension, IntoDimension, Ix};

/// Compares two "things" with approximate equality.
///
/// The first argument is the floating point type of the leaf values, `f32` or `f64`.
///
/// # Examples
///
/// This can be used to compare two floating point numbers:
///
/// ```
/// use test_utils::assert_approx_eq;
/// assert_approx_eq!(f32, 0.15039155, 0.1503916, ulps = 3);
/// ```
///
/// Or containers of such:
///
/// ```
/// use test_utils::assert_approx_eq;
/// assert_approx_eq!(f64, &[[1.0, 2.], [3., 4.]], vec![[1.0, 2.], [3., 4.]])
/// ```
///
/// Or ndarray arrays:
///
/// ```
/// use ndarray::arr2;
/// use test_utils::assert_approx_eq;
/// assert_approx_eq!(
///     f32,
///     arr2(&[[1.0, 2.], [3., 4.]]),
///     arr2(&[[1.0, 2.], [3., 4.]])
/// );
/// ```
///
/// The number of `ulps` defaults to `2` and `epsilon` to `0` if not specified. Two values
/// are equal if they are within either margin.
///
/// # NaN Handling
///
/// The assertion treats two NaN values to be "approximately" equal, as it checks for
/// an expected outcome and not for semantic equality.
#[macro_export]
macro_rules! assert_approx_eq {
    ($t:ty, $left:expr, $right:expr $(,)?) => {
        $crate::assert_approx_eq!($t, $left, $right, epsilon = 0., ulps = 2)
    };
    ($t:ty, $left:expr, $right:expr, ulps = $ulps:expr $(,)?) => {
        $crate::assert_approx_eq!($t, $left, $right, epsilon = 0., ulps = $ulps)
    };
    ($t:ty, $left:expr, $right:expr, epsilon = $epsilon:expr $(,)?) => {
        $crate::assert_approx_eq!($t, $left, $right, epsilon = $epsilon, ulps = 2)
    };
    ($t:ty, $left:expr, $right:expr, epsilon = $epsilon:expr, ulps = $ulps:expr $(,)?) => {{
        let epsilon = $epsilon;
        let ulps = $ulps;
        let left = $left;
        let right = $right;
        let mut left_iter =
            $crate::ApproxEqIter::<$t>::indexed_iter_logical_order(&left, Vec::new());
        let mut right_iter =
            $crate::ApproxEqIter::<$t>::indexed_iter_logical_order(&right, Vec::new());
        loop {
            match (left_iter.next(), right_iter.next()) {
                (Some((lidx, lv)), Some((ridx, rv))) => {
                    std::assert_eq!(
                        lidx, ridx,
                        "Dimensionality mismatch when iterating in logical order: {:?} != {:?}",
                        lidx, ridx
                    );
                    if !(lv.is_nan() && rv.is_nan()) {
                        std::assert!(
                            $crate::approx_eq!($t, lv, rv, ulps = ulps, epsilon = epsilon),
                            "approximated equal assertion failed (ulps={ulps:?}, epsilon={epsilon:?}) at index {idx:?}: {lv:?} == {rv:?}",
                            ulps=ulps,
                            epsilon=epsilon,
                            lv=lv,
                            rv=rv,
                            idx=lidx,
                        );
                    }
                }
                (Some(pair), None) => {
                    std::panic!("Left input is longer starting with from index {:?}", pair);
                }
                (None, Some(pair)) => {
                    std::panic!("Right input is longer starting with from index {:?}", pair);
                }
                (None, None) => break,
            }
        }
    }};
}

/// Helper trait for the [`assert_approx_eq!`] macro.
///
/// This is implemented on a `&`-reference to the thing to compare, for both containers
/// and leaf values (`&f32`, `&f64`). The leaf type `L` is a parameter so the macro can
/// pin down the type of float literals.
///
/// Only use it for [`assert_approx_eq!`].
pub trait ApproxEqIter<'a, L>: Copy {
    /// Flattened iterates over all leaf elements in this instance.
    ///
    /// The passed in `index_prefix` is the "index" at which this instance is placed.
    /// Leaf values yield a single tuple of their value and the prefix, containers push
    /// the index of each of their elements onto the prefix.
    fn indexed_iter_logical_order(
        self,
        index_prefix: Vec<Ix>,
    ) -> Box<dyn Iterator<Item = (Vec<Ix>, L)> + 'a>;
}

macro_rules! impl_leaf {
    ($($t:ty),+) => {
        $(
            impl<'a> ApproxEqIter<'a, $t> for &'a $t {
                fn indexed_iter_logical_order(
                    self,
                    prefix: Vec<Ix>,
                ) -> Box<dyn Iterator<Item = (Vec<Ix>, $t)> + 'a> {
                    Box::new(std::iter::once((prefix, *self)))
                }
            }
        )+
    };
}

impl_leaf!(f32, f64);

impl<'a, T, L: 'a> ApproxEqIter<'a, L> for &'a &'a T
where
    &'a T: ApproxEqIter<'a, L>,
    T: 'a + ?Sized,
{
    fn indexed_iter_logical_order(
        self,
        prefix: Vec<Ix>,
    ) -> Box<dyn Iterator<Item = (Vec<Ix>, L)> + 'a> {
        (*self).indexed_iter_logical_order(prefix)
    }
}

impl<'a, T: 'a, L: 'a> ApproxEqIter<'a, L> for &'a Vec<T>
where
    &'a T: ApproxEqIter<'a, L>,
{
    fn indexed_iter_logical_order(
        self,
        prefix: Vec<Ix>,
    ) -> Box<dyn Iterator<Item = (Vec<Ix>, L)> + 'a> {
        self.as_slice().indexed_iter_logical_order(prefix)
    }
}

impl<'a, T, L: 'a, const N: usize> ApproxEqIter<'a, L> for &'a [T; N]
where
    &'a T: ApproxEqIter<'a, L>,
{
    fn indexed_iter_logical_order(
        self,
        prefix: Vec<Ix>,
    ) -> Box<dyn Iterator<Item = (Vec<Ix>, L)> + 'a> {
        self.as_ref().indexed_iter_logical_order(prefix)
    }
}

impl<'a, T: 'a, L: 'a> ApproxEqIter<'a, L> for &'a [T]
where
    &'a T: ApproxEqIter<'a, L>,
{
    fn indexed_iter_logical_order(
        self,
        prefix: Vec<Ix>,
    ) -> Box<dyn Iterator<Item = (Vec<Ix>, L)> + 'a> {
        let iter = self.iter().enumerate().flat_map(move |(idx, el)| {
            let mut new_prefix = prefix.clone();
            new_prefix.push(idx);
            el.indexed_iter_logical_order(new_prefix)
        });

        Box::new(iter)
    }
}

impl<'a, S, D, L> ApproxEqIter<'a, L> for &'a ArrayBase<S, D>
where
    S: Data<Elem = L>,
    L: Copy + 'a,
    D: Dimension,
{
    fn indexed_iter_logical_order(
        self,
        prefix: Vec<Ix>,
    ) -> Box<dyn Iterator<Item = (Vec<Ix>, L)> + 'a> {
        let iter = self.indexed_iter().map(move |(idx, elm)| {
            let mut new_prefix = prefix.clone();
            new_prefix.extend(idx.into_dimension().as_array_view().iter());
            (new_prefix, *elm)
        });

        Box::new(iter)
    }
}
