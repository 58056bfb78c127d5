use std::cmp::Ordering;

use conv::ValueFrom;

/// Ordering and distance between two items stored in an [`NTree`](crate::NTree).
///
/// `compare` decides identity: two items whose comparison is
/// [`Ordering::Equal`] are the same key, so a tree never stores both.
/// It also steers insertion when a node is full. `distance` is only used to
/// rank items against a query; it must be non-negative and
/// `distance(x, x) == 0`.
///
/// Neither contract is validated. An inconsistent implementation produces
/// unspecified (but memory-safe) results.
pub trait Similarity<T: ?Sized> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
    fn distance(&self, a: &T, b: &T) -> f64;
}

impl<T: ?Sized, S: Similarity<T> + ?Sized> Similarity<T> for &S {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (**self).compare(a, b)
    }

    fn distance(&self, a: &T, b: &T) -> f64 {
        (**self).distance(a, b)
    }
}

/// Natural ordering and `|a - b|` distance for primitive integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbsoluteDifference;

macro_rules! absolute_difference {
    ($($t:ty),*) => {
        $(
            impl Similarity<$t> for AbsoluteDifference {
                fn compare(&self, a: &$t, b: &$t) -> Ordering {
                    a.cmp(b)
                }

                #[allow(clippy::cast_precision_loss)]
                fn distance(&self, a: &$t, b: &$t) -> f64 {
                    let diff = a.abs_diff(*b);
                    // Differences above 2^53 have no exact f64 form.
                    f64::value_from(diff).unwrap_or(diff as f64)
                }
            }
        )*
    };
}

absolute_difference!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Euclidean distance between points, ordered lexicographically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Euclidean;

impl<const D: usize> Similarity<[f64; D]> for Euclidean {
    fn compare(&self, a: &[f64; D], b: &[f64; D]) -> Ordering {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| x.total_cmp(y))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    fn distance(&self, a: &[f64; D], b: &[f64; D]) -> f64 {
        euclidean(a, b)
    }
}

pub fn euclidean<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    let mut sum = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        sum += (x - y).powi(2);
    }
    sum.sqrt()
}

/// A [`Similarity`] assembled from two closures.
///
/// ```
/// use ntree::{FnSimilarity, NTree};
///
/// let words = FnSimilarity::new(
///     |a: &&str, b: &&str| a.len().cmp(&b.len()),
///     |a: &&str, b: &&str| a.len().abs_diff(b.len()) as f64,
/// );
/// let mut tree = NTree::new(words);
/// assert!(tree.add_data("tree"));
/// assert!(!tree.add_data("node"));
/// assert_eq!(tree.get_nearest_neighbour(&"trees"), Some(&"tree"));
/// ```
#[derive(Clone, Copy)]
pub struct FnSimilarity<C, F> {
    compare: C,
    distance: F,
}

impl<C, F> FnSimilarity<C, F> {
    pub fn new(compare: C, distance: F) -> Self {
        FnSimilarity { compare, distance }
    }
}

impl<T, C, F> Similarity<T> for FnSimilarity<C, F>
where
    C: Fn(&T, &T) -> Ordering,
    F: Fn(&T, &T) -> f64,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.compare)(a, b)
    }

    fn distance(&self, a: &T, b: &T) -> f64 {
        (self.distance)(a, b)
    }
}
