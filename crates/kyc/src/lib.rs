//! Information Utility KYC - two-tier disclosure of Form-C material
//!
//! The raw Form-C bytes live only in an access-controlled private collection.
//! The public ledger carries a [`iu_core::KycReference`] whose `hash` is the
//! SHA-256 digest of exactly those bytes, so any party can later check a
//! disclosed copy without ever seeing the payload on the shared ledger.

pub mod vault;

pub use vault::KycVault;
