use bincode::{Decode, Encode};
use derive_more::{Display, From, Into};

/// Sender-assigned identifier grouping the fragments of one logical message.
///
/// Identifiers increase monotonically per sender and wrap at `u32::MAX`.
///
/// # Examples
///
/// ```
/// use sensorlink::fragment::MessageId;
/// let id = MessageId::new(42);
/// assert_eq!(id.get(), 42);
/// assert_eq!(id.next().get(), 43);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode, Display, From, Into)]
#[display("{_0}")]
pub struct MessageId(u32);

impl MessageId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u32 { self.0 }

    /// Return the identifier that follows this one.
    #[must_use]
    pub const fn next(self) -> Self { Self(self.0.wrapping_add(1)) }
}
