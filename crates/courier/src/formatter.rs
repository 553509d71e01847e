use crate::{AnyMessage, Message, Result};

/// Wire-encoding collaborator for crossing a physical transport
///
/// The exchange core validates messages at each boundary but never encodes
/// them; the owning session supplies a formatter together with the physical
/// channel. Implementations pair with the session's transport, so a
/// formatter must be able to reconstruct a message it serialized, and the
/// receiving side validates the reconstructed message before use.
pub trait MessageFormatter: Send + Sync {
    /// Encode a message for the transport
    fn serialize(&self, message: &dyn Message) -> Result<Vec<u8>>;

    /// Decode a message received from the transport
    fn deserialize(&self, bytes: &[u8]) -> Result<AnyMessage>;
}
