//! Message assembly: resolved addresses, subject, and body bytes into a raw
//! RFC 5322 document.
//!
//! Header precedence and rendering rules live here. Bcc is deliberately
//! never rendered; its addresses only surface in the delivery destination
//! set. Given identical inputs, serialisation is byte-identical apart from
//! the Message-ID line.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use uuid::Uuid;

use crate::{
    address::{Address, AddressList},
    encoding::TransferEncoding,
    error::MessageError,
};

const DEFAULT_CONTENT_TYPE: &str = "text/plain";
const DEFAULT_CHARSET: &str = "utf-8";

/// Generates a fresh `uuid@domain` message identifier.
///
/// Best-effort only: the delivery transport may overwrite it, so nothing
/// relies on it for idempotency or deduplication. It is still emitted
/// well-formed so the locally echoed message is meaningful.
#[must_use]
pub fn generate_message_id(domain: &str) -> String {
    format!("{}@{domain}", Uuid::new_v4())
}

/// Everything needed to serialise one outgoing message.
///
/// Optional fields start from the transport defaults (`text/plain`, utf-8,
/// content-sniffed transfer encoding) and are overridden through the
/// builder-style setters. The body is set once and never mutated.
#[derive(Debug)]
pub struct Envelope {
    from: Address,
    to: AddressList,
    cc: AddressList,
    bcc: AddressList,
    subject: Option<String>,
    content_type: String,
    charset: Option<String>,
    encoding: Option<TransferEncoding>,
    message_id: String,
    body: Vec<u8>,
}

impl Envelope {
    /// Creates an envelope for `from` and the given recipient lists. The
    /// message identifier is generated here, from the sender's domain,
    /// exactly once per envelope.
    #[must_use]
    pub fn new(from: Address, to: AddressList, cc: AddressList, bcc: AddressList) -> Self {
        let message_id = generate_message_id(from.domain());
        Self {
            from,
            to,
            cc,
            bcc,
            subject: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            charset: None,
            encoding: None,
            message_id,
            body: Vec::new(),
        }
    }

    /// Sets the subject. An empty subject is treated as absent and the
    /// header is not emitted.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        self.subject = (!subject.is_empty()).then_some(subject);
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    #[must_use]
    pub fn encoding(mut self, encoding: TransferEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Reads the body from a file. The bytes are taken as-is and never
    /// mutated afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Io`] when the file cannot be read.
    pub async fn body_from_file(self, path: impl AsRef<Path>) -> Result<Self, MessageError> {
        let body = tokio::fs::read(path).await?;
        Ok(self.body(body))
    }

    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    #[must_use]
    pub const fn sender(&self) -> &Address {
        &self.from
    }

    #[must_use]
    pub const fn to(&self) -> &AddressList {
        &self.to
    }

    #[must_use]
    pub const fn cc(&self) -> &AddressList {
        &self.cc
    }

    #[must_use]
    pub const fn bcc(&self) -> &AddressList {
        &self.bcc
    }

    /// The transfer encoding that serialisation will use: the requested one,
    /// or a content-sniffed default.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.encoding
            .unwrap_or_else(|| TransferEncoding::for_body(&self.body))
    }

    /// Serialises canonical headers, a blank line, and the encoded body into
    /// the final raw message bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(self.body.len() + 512);

        header(&mut raw, "From", &header_address(&self.from));
        if !self.to.is_empty() {
            header(&mut raw, "To", &header_address_list(&self.to));
        }
        if !self.cc.is_empty() {
            header(&mut raw, "Cc", &header_address_list(&self.cc));
        }
        if let Some(subject) = &self.subject {
            header(&mut raw, "Subject", &encode_header_value(subject));
        }
        header(&mut raw, "Message-ID", &format!("<{}>", self.message_id));
        header(&mut raw, "MIME-Version", "1.0");

        let charset = self.charset.as_deref().unwrap_or(DEFAULT_CHARSET);
        header(
            &mut raw,
            "Content-Type",
            &format!("{}; charset={charset}", self.content_type),
        );

        let encoding = self.transfer_encoding();
        header(&mut raw, "Content-Transfer-Encoding", encoding.name());

        raw.extend_from_slice(b"\r\n");
        raw.extend_from_slice(&encoding.encode(&self.body));
        raw
    }
}

/// Renders an address for a header line. Non-ASCII display names are RFC
/// 2047 B-encoded so the header block stays 7-bit safe; the body's
/// `Content-Transfer-Encoding` does not cover headers.
fn header_address(address: &Address) -> String {
    match address.display_name() {
        Some(name) if !name.is_ascii() => {
            format!("{} <{}>", encode_header_value(name), address.mailbox())
        }
        _ => address.to_string(),
    }
}

fn header_address_list(list: &AddressList) -> String {
    list.iter()
        .map(header_address)
        .collect::<Vec<_>>()
        .join(", ")
}

fn header(out: &mut Vec<u8>, name: &str, value: &str) {
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// RFC 2047 B-encodes a header value when it contains non-ASCII characters.
fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }
    format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
}
