//! End-to-end checks on the serialised message: re-parsing the header block
//! recovers what was supplied, Bcc stays out of the headers but reaches the
//! delivery destination set, and the delivery seam sees exactly what the
//! builder produced.

use std::sync::Mutex;

use async_trait::async_trait;
use mailparse::MailHeaderMap;

use rawmail::{
    address::{Address, AddressList, Role},
    delivery::{DeliveryClient, Receipt, SendRequest},
    encoding::TransferEncoding,
    error::DeliveryError,
    message::Envelope,
};

fn list(role: Role, inputs: &[&str]) -> AddressList {
    let owned: Vec<String> = inputs.iter().map(ToString::to_string).collect();
    AddressList::parse(role, &owned).unwrap()
}

fn sample_envelope() -> Envelope {
    Envelope::new(
        Address::parse(r#""Alice" <a@x.com>"#).unwrap(),
        list(Role::To, &["b@y.com"]),
        list(Role::Cc, &[r#""Carol" <c@z.com>"#]),
        list(Role::Bcc, &["hidden@w.com"]),
    )
    .subject("Hi")
    .body(b"Hello".to_vec())
}

/// Captures every request instead of talking to a provider.
#[derive(Default)]
struct RecordingClient {
    sent: Mutex<Vec<SendRequest>>,
}

#[async_trait]
impl DeliveryClient for RecordingClient {
    async fn send(&self, request: SendRequest) -> Result<Receipt, DeliveryError> {
        self.sent.lock().unwrap().push(request);
        Ok(Receipt {
            message_id: Some("provider-assigned-id".to_string()),
        })
    }
}

#[test]
fn reparsing_recovers_supplied_headers() {
    let raw = sample_envelope().to_bytes();
    let parsed = mailparse::parse_mail(&raw).unwrap();

    assert_eq!(
        parsed.headers.get_first_value("From").as_deref(),
        Some("\"Alice\" <a@x.com>")
    );
    assert_eq!(
        parsed.headers.get_first_value("To").as_deref(),
        Some("b@y.com")
    );
    assert_eq!(
        parsed.headers.get_first_value("Cc").as_deref(),
        Some("\"Carol\" <c@z.com>")
    );
    assert_eq!(
        parsed.headers.get_first_value("Subject").as_deref(),
        Some("Hi")
    );
    assert!(parsed.headers.get_first_value("Bcc").is_none());
}

#[test]
fn body_decodes_back_to_the_original() {
    let raw = sample_envelope().to_bytes();
    let parsed = mailparse::parse_mail(&raw).unwrap();
    assert_eq!(parsed.get_body().unwrap(), "Hello");
}

#[test]
fn message_id_header_carries_the_sender_domain() {
    let envelope = sample_envelope();
    let raw = envelope.to_bytes();
    let parsed = mailparse::parse_mail(&raw).unwrap();

    let header = parsed.headers.get_first_value("Message-ID").unwrap();
    assert_eq!(header, format!("<{}>", envelope.message_id()));
    assert!(header.ends_with("@x.com>"));
}

#[test]
fn base64_body_survives_binary_content() {
    let body = vec![0u8, 159, 146, 150, 255, 13, 10, 0];
    let envelope = Envelope::new(
        Address::parse("a@x.com").unwrap(),
        list(Role::To, &["b@y.com"]),
        list(Role::Cc, &[]),
        list(Role::Bcc, &[]),
    )
    .content_type("application/octet-stream")
    .body(body.clone());

    assert_eq!(envelope.transfer_encoding(), TransferEncoding::Base64);

    let parsed_raw = envelope.to_bytes();
    let parsed = mailparse::parse_mail(&parsed_raw).unwrap();
    assert_eq!(parsed.get_body_raw().unwrap(), body);
}

#[test]
fn header_block_stays_seven_bit_with_non_ascii_display_names() {
    let raw = Envelope::new(
        Address::parse(r#""Jürgen Müller" <j@x.com>"#).unwrap(),
        list(Role::To, &[r#""Łukasz" <l@y.com>"#]),
        list(Role::Cc, &[]),
        list(Role::Bcc, &[]),
    )
    .body("héllo".as_bytes().to_vec())
    .to_bytes();

    let text = String::from_utf8(raw).unwrap();
    let (headers, _) = text.split_once("\r\n\r\n").unwrap();
    assert!(
        headers.bytes().all(|byte| byte < 0x80),
        "header block contains non-ASCII bytes"
    );
    assert!(headers.contains("From: =?UTF-8?B?"));
    assert!(headers.contains(" <j@x.com>"));
    assert!(headers.contains(" <l@y.com>"));
}

#[tokio::test]
async fn body_file_scenario_builds_the_expected_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("greet.txt");
    std::fs::write(&path, "Hello").unwrap();

    let envelope = Envelope::new(
        Address::parse("a@x.com").unwrap(),
        list(Role::To, &["b@y.com"]),
        list(Role::Cc, &[]),
        list(Role::Bcc, &[]),
    )
    .subject("Hi")
    .body_from_file(&path)
    .await
    .unwrap();

    let raw = envelope.to_bytes();
    let parsed = mailparse::parse_mail(&raw).unwrap();
    assert_eq!(
        parsed.headers.get_first_value("From").as_deref(),
        Some("a@x.com")
    );
    assert_eq!(
        parsed.headers.get_first_value("To").as_deref(),
        Some("b@y.com")
    );
    assert_eq!(
        parsed.headers.get_first_value("Subject").as_deref(),
        Some("Hi")
    );
    let message_id = parsed.headers.get_first_value("Message-ID").unwrap();
    assert!(message_id.ends_with("@x.com>"));
    assert_eq!(parsed.get_body().unwrap(), "Hello");
}

#[tokio::test]
async fn unreadable_body_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt");

    let err = Envelope::new(
        Address::parse("a@x.com").unwrap(),
        list(Role::To, &[]),
        list(Role::Cc, &[]),
        list(Role::Bcc, &[]),
    )
    .body_from_file(&missing)
    .await
    .unwrap_err();

    assert!(matches!(err, rawmail::error::MessageError::Io(_)));
}

#[tokio::test]
async fn bcc_reaches_the_destination_set() {
    let envelope = sample_envelope();
    let raw = envelope.to_bytes();

    let client = RecordingClient::default();
    let receipt = client
        .send(SendRequest {
            raw: raw.clone(),
            from: envelope.sender().mailbox().to_string(),
            to: envelope.to().mailboxes(),
            cc: envelope.cc().mailboxes(),
            bcc: envelope.bcc().mailboxes(),
            configuration_set: None,
        })
        .await
        .unwrap();

    assert_eq!(receipt.message_id.as_deref(), Some("provider-assigned-id"));

    let sent = client.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, "a@x.com");
    assert_eq!(sent[0].to, vec!["b@y.com"]);
    assert_eq!(sent[0].cc, vec!["c@z.com"]);
    assert_eq!(sent[0].bcc, vec!["hidden@w.com"]);
    assert_eq!(sent[0].raw, raw);
}

#[tokio::test]
async fn bad_encoding_fails_before_the_client_is_reached() {
    let client = RecordingClient::default();

    // The encoding name is resolved before any request is built; a bogus
    // name means there is nothing to hand to the client.
    let err = "bogus".parse::<TransferEncoding>().unwrap_err();
    assert!(matches!(
        err,
        rawmail::error::MessageError::UnknownEncoding(name) if name == "bogus"
    ));

    assert!(client.sent.lock().unwrap().is_empty());
}
