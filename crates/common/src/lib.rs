/**
 * Cooperative cancellation shared between a caller
 *  and the long-running work it started.
 */
pub mod cancel;
/**
 * Bounded fan-out/fan-in task group.
 *  One producer task per data subset, merged
 *  through a single bounded channel.
 */
pub mod fan_in;
/**
 * Secret kinds, their field sets and partial
 *  updates. Shared verbatim by client and server.
 */
pub mod secret;
/**
 * Framing for the chunked blob transfer protocol.
 */
pub mod transfer;
/**
 * Field validation rules. Runs before any
 *  persistence attempt, on both ends of the wire.
 */
pub mod validation;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::cancel::{CancelHandle, CancelSignal, Cancelled, Deadline};
    pub use crate::fan_in::FanIn;
    pub use crate::secret::{
        BinaryMetadata, BinaryPatch, Card, CardPatch, Credential, CredentialPatch, Kind, Note,
        NotePatch, Owner, RecordId, Secret, SecretData, SecretKind, SecretPatch, SecretRecord,
    };
    pub use crate::transfer::{
        DownloadChunk, FrameDecoder, UploadChunk, UploadMetadata, CHUNK_SIZE,
    };
    pub use crate::validation::ValidationError;
    pub use crate::version::build_info;
}
