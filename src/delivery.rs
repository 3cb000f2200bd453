//! The delivery seam and the SESv2 transport behind it.
//!
//! The core hands a [`SendRequest`] to whichever [`DeliveryClient`] it was
//! given; exactly one attempt is made per invocation, with no retry. The
//! SESv2 implementation is constructed from the standard AWS environment
//! (region and credential chain).

use async_trait::async_trait;
use aws_sdk_sesv2::{
    error::SdkError,
    primitives::Blob,
    types::{Destination, EmailContent, RawMessage},
    Client,
};
use tracing::debug;

use crate::error::DeliveryError;

/// One outgoing send: the serialised raw message plus the explicit
/// destination set.
///
/// The destination mailboxes travel separately from the raw bytes because
/// not every provider parses recipients out of the message itself; Bcc in
/// particular exists only here, never in the rendered headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub raw: Vec<u8>,
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub configuration_set: Option<String>,
}

/// A provider's acknowledgement of an accepted send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Provider-assigned tracking identifier, when one was returned.
    pub message_id: Option<String>,
}

/// The transport contract: submit one message, report the provider's answer.
#[async_trait]
pub trait DeliveryClient {
    /// Submits the message and returns the provider's receipt.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] when the provider rejects the send, the
    /// request never reaches it, or the request cannot be constructed.
    async fn send(&self, request: SendRequest) -> Result<Receipt, DeliveryError>;
}

/// SESv2 raw-send transport.
pub struct SesClient {
    client: Client,
}

impl SesClient {
    /// Builds a client from the ambient AWS environment: region and
    /// credentials are resolved once, here, through the standard provider
    /// chain.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: Client::new(&config),
        }
    }
}

#[async_trait]
impl DeliveryClient for SesClient {
    async fn send(&self, request: SendRequest) -> Result<Receipt, DeliveryError> {
        debug!(
            from = %request.from,
            to = request.to.len(),
            cc = request.cc.len(),
            bcc = request.bcc.len(),
            bytes = request.raw.len(),
            "submitting raw message"
        );

        let raw = RawMessage::builder()
            .data(Blob::new(request.raw))
            .build()
            .map_err(|err| DeliveryError::InvalidRequest(err.to_string()))?;

        let destination = Destination::builder()
            .set_to_addresses(Some(request.to))
            .set_cc_addresses(Some(request.cc))
            .set_bcc_addresses(Some(request.bcc))
            .build();

        let output = self
            .client
            .send_email()
            .content(EmailContent::builder().raw(raw).build())
            .destination(destination)
            .from_email_address(request.from)
            .set_configuration_set_name(request.configuration_set)
            .send()
            .await
            .map_err(|err| match err {
                SdkError::ServiceError(context) => {
                    DeliveryError::Rejected(context.into_err().to_string())
                }
                other => DeliveryError::Transport(other.to_string()),
            })?;

        Ok(Receipt {
            message_id: output.message_id().map(ToString::to_string),
        })
    }
}
