//! Control links between the orchestrator and its observers.
//!
//! Every message travels as a JSON text frame
//! `{"tag": "...", "region": "...", "msg": "<serialized value>"}`. The payload
//! is serialized when sent and parsed again on receipt, so both ends only
//! share the wire format. Links are bounded and FIFO per observer; there is
//! no ordering between observers.
//!
//! Commands flow to observers over one [`CommandLink`] each. Reports from all
//! observers share a single inbox. A frame with a tag this side does not know
//! decodes as `Unknown` rather than failing.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use wcprobe_types::DocumentId;

use crate::{Error, Result};

/// Wire form of every control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub msg: String,
}

impl Envelope {
    fn new(tag: &str, region: Option<&str>, msg: String) -> Self {
        Self {
            tag: tag.to_string(),
            region: region.map(str::to_string),
            msg,
        }
    }

    fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn decode(frame: &str) -> Result<Self> {
        Ok(serde_json::from_str(frame)?)
    }
}

/// Orchestrator to observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A tagged write with this id is about to be issued.
    Sent(DocumentId),
    /// The write with this id returned to the writer.
    Ack(DocumentId),
    /// Close the feed and the connection, then exit.
    Stop(String),
    /// Report the member's log tip.
    FetchTip,
    Unknown(String),
}

impl Command {
    pub fn tag(&self) -> &str {
        match self {
            Command::Sent(_) => "sent",
            Command::Ack(_) => "ack",
            Command::Stop(_) => "stop",
            Command::FetchTip => "fetch_tip",
            Command::Unknown(tag) => tag,
        }
    }

    pub fn encode(&self) -> Result<String> {
        let msg = match self {
            Command::Sent(id) | Command::Ack(id) => serde_json::to_string(id)?,
            Command::Stop(reason) => serde_json::to_string(reason)?,
            Command::FetchTip | Command::Unknown(_) => serde_json::to_string(&())?,
        };
        Envelope::new(self.tag(), None, msg).encode()
    }

    pub fn decode(frame: &str) -> Result<Self> {
        let envelope = Envelope::decode(frame)?;
        Ok(match envelope.tag.as_str() {
            "sent" => Command::Sent(serde_json::from_str(&envelope.msg)?),
            "ack" => Command::Ack(serde_json::from_str(&envelope.msg)?),
            "stop" => Command::Stop(serde_json::from_str(&envelope.msg)?),
            "fetch_tip" => Command::FetchTip,
            _ => Command::Unknown(envelope.tag),
        })
    }
}

/// Observer to orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// The first change feed is open.
    Ready,
    Info(String),
    Debug(String),
    Unknown(String),
}

impl Report {
    pub fn tag(&self) -> &str {
        match self {
            Report::Ready => "ready",
            Report::Info(_) => "info",
            Report::Debug(_) => "debug",
            Report::Unknown(tag) => tag,
        }
    }

    pub fn encode(&self, region: &str) -> Result<String> {
        let msg = match self {
            Report::Info(text) | Report::Debug(text) => serde_json::to_string(text)?,
            Report::Ready | Report::Unknown(_) => serde_json::to_string(&())?,
        };
        Envelope::new(self.tag(), Some(region), msg).encode()
    }

    /// Returns the sending region (empty if the frame carried none) and the report.
    pub fn decode(frame: &str) -> Result<(String, Self)> {
        let envelope = Envelope::decode(frame)?;
        let report = match envelope.tag.as_str() {
            "ready" => Report::Ready,
            "info" => Report::Info(serde_json::from_str(&envelope.msg)?),
            "debug" => Report::Debug(serde_json::from_str(&envelope.msg)?),
            _ => Report::Unknown(envelope.tag),
        };
        Ok((envelope.region.unwrap_or_default(), report))
    }
}

/// Sending half of one observer's command link.
#[derive(Debug, Clone)]
pub struct CommandLink {
    region: String,
    tx: mpsc::Sender<String>,
}

impl CommandLink {
    pub fn region(&self) -> &str {
        &self.region
    }

    pub async fn send(&self, command: &Command) -> Result<()> {
        let frame = command.encode()?;
        self.tx
            .send(frame)
            .await
            .map_err(|_| Error::LinkClosed(self.region.clone()))
    }
}

/// Receiving half of one observer's command link.
#[derive(Debug)]
pub struct CommandInbox {
    rx: mpsc::Receiver<String>,
}

impl CommandInbox {
    /// Next command, or `None` once the orchestrator dropped the link. Cancel safe.
    pub async fn recv(&mut self) -> Option<Result<Command>> {
        let frame = self.rx.recv().await?;
        Some(Command::decode(&frame))
    }
}

/// Creates the command link for one observer.
pub fn command_link(region: impl Into<String>, capacity: usize) -> (CommandLink, CommandInbox) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        CommandLink {
            region: region.into(),
            tx,
        },
        CommandInbox { rx },
    )
}

/// Shared entry point of the report inbox, handed out per observer.
#[derive(Debug, Clone)]
pub struct ReportSink {
    tx: mpsc::Sender<String>,
}

impl ReportSink {
    pub fn for_region(&self, region: impl Into<String>) -> ReportSender {
        ReportSender {
            region: region.into(),
            tx: self.tx.clone(),
        }
    }
}

/// An observer's handle for sending reports.
#[derive(Debug, Clone)]
pub struct ReportSender {
    region: String,
    tx: mpsc::Sender<String>,
}

impl ReportSender {
    pub fn region(&self) -> &str {
        &self.region
    }

    pub async fn send(&self, report: &Report) -> Result<()> {
        let frame = report.encode(&self.region)?;
        self.tx
            .send(frame)
            .await
            .map_err(|_| Error::LinkClosed("orchestrator".to_string()))
    }
}

/// Receives reports from every observer.
#[derive(Debug)]
pub struct ReportInbox {
    rx: mpsc::Receiver<String>,
}

impl ReportInbox {
    /// Next report, or `None` once every sender is gone. Cancel safe.
    pub async fn recv(&mut self) -> Option<Result<(String, Report)>> {
        let frame = self.rx.recv().await?;
        Some(Report::decode(&frame))
    }
}

/// Creates the shared report inbox.
pub fn report_channel(capacity: usize) -> (ReportSink, ReportInbox) {
    let (tx, rx) = mpsc::channel(capacity);
    (ReportSink { tx }, ReportInbox { rx })
}
