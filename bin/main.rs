//! Compose a raw RFC 5322 message from command-line headers and a body file,
//! then submit it through the SESv2 raw-send API.
//!
//! The raw message is always echoed to stderr before any delivery attempt,
//! so a failed send can be diagnosed from the printed artifact.

use std::{io::Write, path::PathBuf, str::FromStr};

use clap::Parser;
use tracing::info;

use rawmail::{
    address::{Address, AddressList, Role},
    delivery::{DeliveryClient, SendRequest, SesClient},
    encoding::TransferEncoding,
    error::{Error, MessageError},
    message::Envelope,
};

/// Compose a raw email and send it through the SESv2 raw-send API
#[derive(Parser, Debug)]
#[command(name = "rawmail")]
#[command(about = "Compose and send a raw email via SESv2", long_about = None)]
#[command(version)]
struct Cli {
    /// From address (required, exactly one)
    #[arg(long, value_name = "ADDR")]
    from: Option<String>,

    /// To address (repeatable)
    #[arg(long, value_name = "ADDR")]
    to: Vec<String>,

    /// Cc address (repeatable)
    #[arg(long, value_name = "ADDR")]
    cc: Vec<String>,

    /// Bcc address (repeatable; never rendered as a header)
    #[arg(long, value_name = "ADDR")]
    bcc: Vec<String>,

    /// Path to the file holding the message body
    #[arg(long, value_name = "PATH")]
    body: Option<PathBuf>,

    /// Subject line (omitted from the message when empty)
    #[arg(long, value_name = "STRING")]
    subject: Option<String>,

    /// Content-Type of the body
    #[arg(long, value_name = "MIME", default_value = "text/plain")]
    content_type: String,

    /// Charset declared alongside the content type (default utf-8)
    #[arg(long, value_name = "NAME")]
    charset: Option<String>,

    /// Content-transfer-encoding: quoted-printable, base64, 7bit, or 8bit
    /// (chosen from the body content when unset)
    #[arg(long, value_name = "NAME")]
    encoding: Option<String>,

    /// SES configuration set to route the send through
    #[arg(long, value_name = "NAME")]
    configuration_set: Option<String>,

    /// Build and print the raw message without sending it
    #[arg(long)]
    no_send: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).await?;
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Error> {
    let from_raw = cli.from.ok_or(Error::MissingField("from"))?;
    let body_path = cli.body.ok_or(Error::MissingField("body"))?;

    let from = Address::parse(&from_raw).map_err(|source| Error::Address {
        role: Role::From,
        source,
    })?;
    let to = AddressList::parse(Role::To, &cli.to)?;
    let cc = AddressList::parse(Role::Cc, &cli.cc)?;
    let bcc = AddressList::parse(Role::Bcc, &cli.bcc)?;

    let encoding = cli
        .encoding
        .as_deref()
        .map(TransferEncoding::from_str)
        .transpose()?;

    let mut envelope = Envelope::new(from, to, cc, bcc)
        .content_type(cli.content_type)
        .body_from_file(&body_path)
        .await?;
    if let Some(subject) = cli.subject {
        envelope = envelope.subject(subject);
    }
    if let Some(charset) = cli.charset {
        envelope = envelope.charset(charset);
    }
    if let Some(encoding) = encoding {
        envelope = envelope.encoding(encoding);
    }

    info!(message_id = envelope.message_id(), "message assembled");

    let raw = envelope.to_bytes();

    // Echoed unconditionally, before any delivery attempt.
    let mut stderr = std::io::stderr();
    stderr.write_all(&raw).map_err(MessageError::from)?;
    stderr.write_all(b"\n").map_err(MessageError::from)?;

    if cli.no_send {
        return Ok(());
    }

    let request = SendRequest {
        raw,
        from: envelope.sender().mailbox().to_string(),
        to: envelope.to().mailboxes(),
        cc: envelope.cc().mailboxes(),
        bcc: envelope.bcc().mailboxes(),
        configuration_set: cli.configuration_set,
    };

    let client = SesClient::from_env().await;
    let receipt = client.send(request).await?;

    match receipt.message_id {
        Some(id) => println!("Accepted for delivery: provider message id {id}"),
        None => println!("Accepted for delivery"),
    }

    Ok(())
}
