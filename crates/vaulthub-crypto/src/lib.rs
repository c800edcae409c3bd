//! # vaulthub-crypto
//!
//! Blind-index derivation and the AES-256-GCM implementation of the
//! [`vaulthub_core::traits::SecretCipher`] boundary. The blind-index
//! codec turns plaintext secret names into deterministic pseudonymous
//! lookup keys; the cipher seals everything else.

pub mod blind_index;
pub mod cipher;

pub use blind_index::{compute_blind_index, compute_blind_index_with_salt};
pub use cipher::Aes256GcmCipher;
