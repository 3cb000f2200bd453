//! Compose a raw RFC 5322 email message and submit it through a
//! transactional raw-send API.
//!
//! The work splits across three seams: [`address`] resolves textual address
//! lists into validated structures, [`message`] assembles and serialises the
//! MIME envelope, and [`delivery`] carries the result to the provider in a
//! single attempt. Everything is created fresh per invocation; nothing is
//! persisted.

pub mod address;
pub mod delivery;
pub mod encoding;
pub mod error;
pub mod message;
