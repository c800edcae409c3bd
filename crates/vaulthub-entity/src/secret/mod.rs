//! Secret entities: current-state rows, version history, blind-index
//! configuration, and the type/encoding enums.

pub mod blind_index;
pub mod kind;
pub mod model;
pub mod version;

pub use blind_index::SecretBlindIndexConfig;
pub use kind::{SecretEncryptionAlgorithm, SecretKeyEncoding, SecretType};
pub use model::{NewSecret, Secret, SecretSelector, SecretUpdate, SecretWithTags};
pub use version::{NewSecretVersion, SecretVersion};
