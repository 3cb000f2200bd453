//! Address resolution: textual address lists into validated, structured
//! addresses.
//!
//! [`Address::parse`] is the sole validation gate; a [`Mailbox`] cannot be
//! obtained any other way, so everything downstream may rely on the
//! exactly-one-`@`, non-empty-local-part, non-empty-domain invariant. In
//! particular the sender's domain (used for message-identifier generation)
//! is always well-defined.

use std::{
    fmt::{self, Display},
    ops::Deref,
};

use serde::{Deserialize, Serialize};

use crate::error::{AddressError, Error, Result};

/// A bare `local@domain` pair, the routable part of an [`Address`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub local_part: String,
    pub domain: String,
}

impl Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}

/// A sender or recipient: a mailbox with an optional display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    mailbox: Mailbox,
    display_name: Option<String>,
}

impl Address {
    /// Parses `local@domain` or `"Display Name" <local@domain>` (quotes
    /// optional), tolerating surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an [`AddressError`] carrying the offending input when the
    /// string lacks an `@`-separated domain, has more than one `@`, has an
    /// empty local part or domain, or opens an angle bracket it never
    /// closes.
    pub fn parse(input: &str) -> std::result::Result<Self, AddressError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        if let Some(open) = find_unquoted(trimmed, '<') {
            let name = trimmed[..open].trim();
            let inner = trimmed[open + 1..]
                .strip_suffix('>')
                .ok_or_else(|| AddressError::MissingCloseBracket(trimmed.to_string()))?;

            Ok(Self {
                mailbox: parse_mailbox(inner.trim(), trimmed)?,
                display_name: (!name.is_empty()).then(|| unquote(name)),
            })
        } else {
            Ok(Self {
                mailbox: parse_mailbox(trimmed, trimmed)?,
                display_name: None,
            })
        }
    }

    /// The `local@domain` part, without any display name.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// The domain component, guaranteed present by parsing.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.mailbox.domain
    }
}

/// Renders `"Display Name" <local@domain>` (with `"` and `\` in the name
/// backslash-escaped) or the bare mailbox. This is the un-encoded form;
/// header serialisation additionally RFC 2047-encodes non-ASCII names.
impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} <{}>", quote_display_name(name), self.mailbox),
            None => Display::fmt(&self.mailbox, f),
        }
    }
}

/// The header field an address list was supplied for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    From,
    To,
    Cc,
    Bcc,
}

impl Role {
    /// The RFC 5322 header name for this role.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::From => "From",
            Self::To => "To",
            Self::Cc => "Cc",
            Self::Bcc => "Bcc",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// An ordered, role-tagged sequence of addresses.
///
/// Order is preserved because it determines header rendering order. An empty
/// list is valid; the corresponding header is simply not emitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressList {
    role: Role,
    entries: Vec<Address>,
}

impl AddressList {
    /// Parses every raw string in `inputs` for the given role, preserving
    /// order. This is the one generic "parse a list for role R" operation;
    /// To, Cc, and Bcc all go through it.
    ///
    /// # Errors
    ///
    /// Stops at the first malformed string and returns it, tagged with the
    /// role, inside [`Error::Address`].
    pub fn parse(role: Role, inputs: &[String]) -> Result<Self> {
        let entries = inputs
            .iter()
            .map(|raw| Address::parse(raw).map_err(|source| Error::Address { role, source }))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { role, entries })
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// The bare mailbox strings, display names dropped, for the delivery
    /// destination set.
    #[must_use]
    pub fn mailboxes(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|address| address.mailbox().to_string())
            .collect()
    }
}

impl Display for AddressList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, address) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            Display::fmt(address, f)?;
        }
        Ok(())
    }
}

impl Deref for AddressList {
    type Target = Vec<Address>;

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

/// Finds `needle` outside any double-quoted section, honouring backslash
/// escapes inside quotes.
fn find_unquoted(input: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut prev_was_backslash = false;

    for (i, ch) in input.char_indices() {
        if ch == '"' && !prev_was_backslash {
            in_quotes = !in_quotes;
        } else if ch == needle && !in_quotes {
            return Some(i);
        }

        prev_was_backslash = ch == '\\' && !prev_was_backslash;
    }

    None
}

/// Strips a surrounding quote pair and resolves backslash escapes; anything
/// unquoted passes through as-is.
fn unquote(name: &str) -> String {
    let Some(inner) = name
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    else {
        return name.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Quotes a display name for rendering, backslash-escaping embedded `"`
/// and `\`.
fn quote_display_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for ch in name.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

fn parse_mailbox(input: &str, original: &str) -> std::result::Result<Mailbox, AddressError> {
    let mut parts = input.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (_, None, _) => Err(AddressError::MissingAtSign(original.to_string())),
        (_, _, Some(_)) => Err(AddressError::MultipleAtSigns(original.to_string())),
        (Some(local), Some(domain), None) => {
            if local.is_empty() {
                Err(AddressError::EmptyLocalPart(original.to_string()))
            } else if domain.is_empty() {
                Err(AddressError::EmptyDomain(original.to_string()))
            } else {
                Ok(Mailbox {
                    local_part: local.to_string(),
                    domain: domain.to_string(),
                })
            }
        }
        (None, ..) => Err(AddressError::Empty),
    }
}
