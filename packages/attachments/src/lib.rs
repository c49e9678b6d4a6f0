// ABOUTME: Image and document attachments for catalog components and suggestions
// ABOUTME: Exclusive ownership, base64 upload decoding, and pluggable blob storage

pub mod blob;
pub mod error;
pub mod storage;
pub mod types;
pub mod upload;
pub mod writes;

pub use blob::{BlobPin, BlobPins, BlobStore, FsBlobStore, MemoryBlobStore};
pub use error::{AttachmentError, AttachmentResult};
pub use storage::AttachmentStorage;
pub use types::{Attachment, AttachmentInput, AttachmentKind, AttachmentOwner, StoredUpload};
pub use upload::{decode_upload, DecodedUpload};
