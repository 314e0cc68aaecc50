//! # wcprobe-types: Core types for `wcprobe`
//!
//! This crate contains shared types used across the `wcprobe` workspace:
//! - Log positions ([`LogPosition`])
//! - Document identity and shape ([`DocumentId`], [`Document`], [`DocumentDraft`])
//! - Acknowledgement strength ([`WriteConcern`])
//! - Replica set topology ([`ReplicaTarget`], [`ConnectionVariant`], [`MemberRole`], [`MemberStatus`])

use std::{
    collections::BTreeSet,
    fmt::{self, Display},
    str::FromStr,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use uuid::Uuid;

// ============================================================================
// Log positions
// ============================================================================

/// Position of an entry within a replica member's operation log.
///
/// Positions are assigned by the primary when an operation is accepted and
/// are identical on every member that has applied the operation. The first
/// operation is at position 1; [`LogPosition::ZERO`] is the tip of an empty
/// log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct LogPosition(u64);

impl LogPosition {
    pub const ZERO: LogPosition = LogPosition(0);

    pub fn new(position: u64) -> Self {
        Self(position)
    }

    /// Returns the position as a `u64`.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the position immediately after this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for LogPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for LogPosition {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<LogPosition> for u64 {
    fn from(position: LogPosition) -> Self {
        position.0
    }
}

// ============================================================================
// Documents
// ============================================================================

/// Unique identifier of a written document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Random filler carried by untagged load documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillerPayload {
    pub name: String,
    pub value: u64,
}

/// A document as stored and replicated.
///
/// Tag markers are the only thing a change-feed filter inspects; a document
/// written as filler load carries none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Logical type, e.g. `"first"` .. `"fourth"` or `"random"`.
    pub kind: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<FillerPayload>,
}

impl Document {
    /// Marks the document with the given tag field.
    pub fn tag(&mut self, field: &str) {
        self.tags.insert(field.to_string());
    }

    /// Returns true if the tag field is present.
    pub fn is_tagged(&self, field: &str) -> bool {
        self.tags.contains(field)
    }
}

/// A document before it has been given an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDraft {
    pub id: Option<DocumentId>,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub payload: Option<FillerPayload>,
}

impl DocumentDraft {
    /// Creates a draft of the given logical type, timestamped now.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            created_at: Utc::now(),
            payload: None,
        }
    }

    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_payload(mut self, payload: FillerPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Finalizes the draft, generating an identifier if none was set.
    pub fn into_document(self) -> Document {
        Document {
            id: self.id.unwrap_or_else(DocumentId::generate),
            kind: self.kind,
            created_at: self.created_at,
            tags: BTreeSet::new(),
            payload: self.payload,
        }
    }
}

// ============================================================================
// Write concern
// ============================================================================

/// Number (or named subset) of replica members that must confirm a write
/// before the write call returns.
///
/// Textual form follows the usual `w` option: `0`, `1`, `3`, `majority`, or
/// the name of a mode defined by the replica set (e.g. `threeRegions`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WriteConcern {
    /// `w: 0`, the write call returns without waiting.
    Unacknowledged,
    /// `w: n`, `n` members including the primary have applied the write.
    Nodes(u32),
    /// More than half of the voting members have applied the write.
    Majority,
    /// A named mode resolved by the replica set configuration.
    Mode(String),
}

impl WriteConcern {
    pub fn is_acknowledged(&self) -> bool {
        !matches!(self, WriteConcern::Unacknowledged)
    }
}

impl Default for WriteConcern {
    fn default() -> Self {
        WriteConcern::Nodes(1)
    }
}

impl Display for WriteConcern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteConcern::Unacknowledged => write!(f, "0"),
            WriteConcern::Nodes(n) => write!(f, "{n}"),
            WriteConcern::Majority => write!(f, "majority"),
            WriteConcern::Mode(name) => write!(f, "{name}"),
        }
    }
}

/// Error returned when a write concern string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWriteConcernError(String);

impl Display for ParseWriteConcernError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid write concern: {:?}", self.0)
    }
}

impl std::error::Error for ParseWriteConcernError {}

impl FromStr for WriteConcern {
    type Err = ParseWriteConcernError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(ParseWriteConcernError(s.to_string()));
        }
        if let Ok(n) = s.parse::<u32>() {
            return Ok(WriteConcern::from(n));
        }
        if s.starts_with('-') || s.starts_with('+') {
            return Err(ParseWriteConcernError(s.to_string()));
        }
        if s.eq_ignore_ascii_case("majority") {
            return Ok(WriteConcern::Majority);
        }
        Ok(WriteConcern::Mode(s.to_string()))
    }
}

impl From<u32> for WriteConcern {
    fn from(n: u32) -> Self {
        if n == 0 {
            WriteConcern::Unacknowledged
        } else {
            WriteConcern::Nodes(n)
        }
    }
}

impl Serialize for WriteConcern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WriteConcern::Unacknowledged => serializer.serialize_u32(0),
            WriteConcern::Nodes(n) => serializer.serialize_u32(*n),
            other => serializer.collect_str(other),
        }
    }
}

impl<'de> Deserialize<'de> for WriteConcern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WriteConcernVisitor;

        impl de::Visitor<'_> for WriteConcernVisitor {
            type Value = WriteConcern;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a member count, \"majority\", or a named write concern mode")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<WriteConcern, E> {
                u32::try_from(v)
                    .map(WriteConcern::from)
                    .map_err(|_| E::custom(format!("write concern {v} out of range")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<WriteConcern, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("negative write concern {v}")))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<WriteConcern, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(WriteConcernVisitor)
    }
}

// ============================================================================
// Topology
// ============================================================================

/// A replica set member to observe directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaTarget {
    /// Human-readable label used in every log line from this member's observer.
    pub region: String,
    /// Direct connection endpoint for the member.
    pub endpoint: String,
}

impl ReplicaTarget {
    pub fn new(region: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// One way of connecting the writer to the replica set.
///
/// Each variant is run as a separate scenario; variants usually differ only in
/// the default write concern applied to writes that do not set their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionVariant {
    pub name: String,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_concern: Option<WriteConcern>,
}

impl Display for ConnectionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default_concern {
            Some(w) => write!(f, "{} ({}, w={w})", self.name, self.endpoint),
            None => write!(f, "{} ({})", self.name, self.endpoint),
        }
    }
}

/// Replication role of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberRole {
    Primary,
    Secondary,
}

impl Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRole::Primary => write!(f, "primary"),
            MemberRole::Secondary => write!(f, "secondary"),
        }
    }
}

/// Role and replication progress of one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStatus {
    pub region: String,
    pub role: MemberRole,
    pub applied: LogPosition,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("0", WriteConcern::Unacknowledged; "zero is unacknowledged")]
    #[test_case("1", WriteConcern::Nodes(1); "single node")]
    #[test_case("3", WriteConcern::Nodes(3); "three nodes")]
    #[test_case("majority", WriteConcern::Majority; "majority")]
    #[test_case("MAJORITY", WriteConcern::Majority; "majority any case")]
    #[test_case("threeRegions", WriteConcern::Mode("threeRegions".into()); "named mode")]
    fn write_concern_parses(input: &str, expected: WriteConcern) {
        assert_eq!(input.parse::<WriteConcern>().unwrap(), expected);
    }

    #[test_case(""; "empty")]
    #[test_case("  "; "blank")]
    #[test_case("-1"; "negative")]
    #[test_case("three regions"; "embedded space")]
    fn write_concern_rejects(input: &str) {
        assert!(input.parse::<WriteConcern>().is_err());
    }

    #[test]
    fn write_concern_display_matches_parse() {
        for w in [
            WriteConcern::Unacknowledged,
            WriteConcern::Nodes(2),
            WriteConcern::Majority,
            WriteConcern::Mode("threeRegions".into()),
        ] {
            assert_eq!(w.to_string().parse::<WriteConcern>().unwrap(), w);
        }
    }

    #[test]
    fn write_concern_deserializes_numbers_and_strings() {
        #[derive(Deserialize)]
        struct Holder {
            w: WriteConcern,
        }

        let numeric: Holder = toml::from_str("w = 3").unwrap();
        assert_eq!(numeric.w, WriteConcern::Nodes(3));

        let named: Holder = toml::from_str("w = \"threeRegions\"").unwrap();
        assert_eq!(named.w, WriteConcern::Mode("threeRegions".into()));

        let json = serde_json::to_string(&WriteConcern::Majority).unwrap();
        assert_eq!(json, "\"majority\"");
        let json = serde_json::to_string(&WriteConcern::Nodes(2)).unwrap();
        assert_eq!(json, "2");
    }

    #[test]
    fn draft_without_id_gets_one() {
        let doc = DocumentDraft::new("first").into_document();
        assert_eq!(doc.kind, "first");
        assert!(doc.tags.is_empty());

        let other = DocumentDraft::new("first").into_document();
        assert_ne!(doc.id, other.id);
    }

    #[test]
    fn draft_keeps_explicit_id() {
        let id = DocumentId::generate();
        let doc = DocumentDraft::new("second").with_id(id).into_document();
        assert_eq!(doc.id, id);
    }

    #[test]
    fn tagging_is_visible_to_filters() {
        let mut doc = DocumentDraft::new("third").into_document();
        assert!(!doc.is_tagged("tagged_insert"));
        doc.tag("tagged_insert");
        assert!(doc.is_tagged("tagged_insert"));
        assert!(!doc.is_tagged("other"));
    }

    #[test]
    fn document_id_round_trips_through_display() {
        let id = DocumentId::generate();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn log_position_ordering() {
        let a = LogPosition::new(4);
        assert!(a < a.next());
        assert_eq!(a.next().as_u64(), 5);
        assert_eq!(LogPosition::ZERO, LogPosition::default());
    }
}
