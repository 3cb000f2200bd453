//! Error types for the rawmail crate.
//!
//! One file holds the per-concern enums: address parsing, message assembly,
//! and delivery, plus the crate-level union the binary reports from. Every
//! error is terminal for the invocation; there is no retry.

use std::io;

use thiserror::Error;

use crate::address::Role;

/// Errors produced while parsing a textual address.
///
/// Every variant that rejects an input retains that input verbatim so the
/// caller can report exactly which string failed to parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The input was empty or whitespace only.
    #[error("Empty address")]
    Empty,

    /// No `@` separator between local part and domain.
    #[error("Missing '@' separator in {0:?}")]
    MissingAtSign(String),

    /// More than one `@` in the mailbox.
    #[error("More than one '@' in {0:?}")]
    MultipleAtSigns(String),

    /// Nothing before the `@`.
    #[error("Empty local part in {0:?}")]
    EmptyLocalPart(String),

    /// Nothing after the `@`.
    #[error("Empty domain in {0:?}")]
    EmptyDomain(String),

    /// A display-name form opened `<` but never closed it.
    #[error("Missing closing '>' in {0:?}")]
    MissingCloseBracket(String),
}

impl AddressError {
    /// The offending input, when the variant carries one.
    #[must_use]
    pub fn input(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::MissingAtSign(input)
            | Self::MultipleAtSigns(input)
            | Self::EmptyLocalPart(input)
            | Self::EmptyDomain(input)
            | Self::MissingCloseBracket(input) => Some(input),
        }
    }
}

/// Errors produced while assembling the raw message.
#[derive(Debug, Error)]
pub enum MessageError {
    /// A requested content-transfer-encoding name is not one we know.
    #[error("Unknown content-transfer-encoding {0:?}")]
    UnknownEncoding(String),

    /// The body source could not be read (or the raw message not echoed).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors produced by the delivery transport.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The provider received the request and refused the send.
    #[error("Provider rejected the send: {0}")]
    Rejected(String),

    /// The request never reached the provider.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The send request could not be constructed.
    #[error("Invalid send request: {0}")]
    InvalidRequest(String),
}

/// Crate-level error union.
#[derive(Debug, Error)]
pub enum Error {
    /// A required flag or configuration value was absent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// An address failed to parse, tagged with the role it was supplied for.
    #[error("{role}: {source}")]
    Address {
        role: Role,
        #[source]
        source: AddressError,
    },

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

pub type Result<T> = std::result::Result<T, Error>;
