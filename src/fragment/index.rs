//! Position of a fragment inside its `CHNK` series.

use bincode::{Decode, Encode};
use derive_more::{Display, From};

/// Position of a fragment among the `count` fragments of one message.
///
/// Fragments are numbered from zero in payload order. The wire field is a
/// `u16`, which bounds a message to 65 535 fragments.
///
/// ```
/// use sensorlink::fragment::FragmentIndex;
///
/// let second = FragmentIndex::new(1);
/// assert!(second.is_within(3));
/// assert!(!second.is_last_of(3));
/// assert!(FragmentIndex::new(2).is_last_of(3));
/// ```
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Display, From,
)]
#[display("{_0}")]
pub struct FragmentIndex(u16);

impl FragmentIndex {
    /// Index of the fragment carrying the start of the payload.
    pub const FIRST: Self = Self(0);

    /// Wrap a raw header value.
    #[must_use]
    pub const fn new(value: u16) -> Self { Self(value) }

    /// Raw header value.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }

    /// Whether the index addresses one of `count` fragments.
    #[must_use]
    pub const fn is_within(self, count: u16) -> bool { self.0 < count }

    /// Whether this is the final fragment of a `count`-long series.
    #[must_use]
    pub const fn is_last_of(self, count: u16) -> bool { count > 0 && self.0 == count - 1 }

    /// Indices `0..count` in payload order.
    pub fn series(count: u16) -> impl Iterator<Item = Self> { (0..count).map(Self) }
}

impl From<FragmentIndex> for u16 {
    fn from(value: FragmentIndex) -> Self { value.0 }
}
