//! MIME content-transfer-encodings for the message body.
//!
//! The encoders must handle arbitrary byte content, including non-ASCII text
//! and embedded line terminators; a wrong soft line break or an unwrapped
//! base64 run silently corrupts delivered mail, so this is the most heavily
//! tested corner of the crate.

use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::MessageError;

/// Maximum encoded line length per RFC 2045.
const MIME_LINE_LENGTH: usize = 76;

/// The content-transfer-encoding applied to the body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferEncoding {
    QuotedPrintable,
    Base64,
    SevenBit,
    EightBit,
}

impl TransferEncoding {
    /// The `Content-Transfer-Encoding` header value.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::QuotedPrintable => "quoted-printable",
            Self::Base64 => "base64",
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
        }
    }

    /// Picks a default encoding from the body content: quoted-printable for
    /// text, base64 for anything that is not valid UTF-8.
    #[must_use]
    pub fn for_body(body: &[u8]) -> Self {
        if std::str::from_utf8(body).is_ok() {
            Self::QuotedPrintable
        } else {
            Self::Base64
        }
    }

    /// Encodes `body` per this encoding's RFC 2045 rules. The 7bit and 8bit
    /// encodings pass the body through unchanged.
    #[must_use]
    pub fn encode(self, body: &[u8]) -> Vec<u8> {
        match self {
            Self::QuotedPrintable => quoted_printable::encode(body),
            Self::Base64 => wrap_lines(&STANDARD.encode(body)),
            Self::SevenBit | Self::EightBit => body.to_vec(),
        }
    }
}

impl FromStr for TransferEncoding {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quoted-printable" => Ok(Self::QuotedPrintable),
            "base64" => Ok(Self::Base64),
            "7bit" => Ok(Self::SevenBit),
            "8bit" => Ok(Self::EightBit),
            other => Err(MessageError::UnknownEncoding(other.to_string())),
        }
    }
}

/// Splits a base64 run into CRLF-terminated lines of at most
/// [`MIME_LINE_LENGTH`] characters.
fn wrap_lines(encoded: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded.len() + 2 * (encoded.len() / MIME_LINE_LENGTH + 1));
    for chunk in encoded.as_bytes().chunks(MIME_LINE_LENGTH) {
        if !out.is_empty() {
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(chunk);
    }
    out
}
