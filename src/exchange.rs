//! Versioned peer-exchange payload.
//!
//! How two devices discover each other and move bytes is out of scope; this
//! module only defines the packet a transport layer carries and its JSON
//! encoding. The `community` array is exactly the `incoming` argument of
//! [`merge_sparse`](crate::merge_sparse) on the receiving side.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::community::CellHourEntry;
use crate::error::{Error, Result};
use crate::WalkSummary;

/// Exchange packet version this build produces and accepts.
pub const EXCHANGE_VERSION: u32 = 1;

/// Number of most-recent walk summaries shared per packet.
pub const MAX_SHARED_WALKS: usize = 10;

/// What kind of device the sender is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerKind {
    /// Another phone running the app (ephemeral, rotating id).
    App,
    /// A standalone beacon with a printed/assigned id.
    Beacon,
}

/// Sender identity as presented on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerRef {
    pub kind: PeerKind,
    pub id: String,
}

/// Version-1 exchange packet: sender identity, the sender's most recent walk
/// summaries, and a sparse community score array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangePacketV1 {
    pub version: u32,
    pub sent_at_ms: i64,
    pub sender: PeerRef,
    /// Most recent first, capped at [`MAX_SHARED_WALKS`].
    pub last_walks: Vec<WalkSummary>,
    pub community: Vec<CellHourEntry>,
}

impl ExchangePacketV1 {
    /// Assemble a packet, keeping only the most recent summaries by start
    /// time (newest first).
    pub fn new(
        sender: PeerRef,
        walks: &[WalkSummary],
        community: Vec<CellHourEntry>,
        sent_at_ms: i64,
    ) -> Self {
        let mut last_walks = walks.to_vec();
        last_walks.sort_by_key(|w| std::cmp::Reverse(w.started_at_ms));
        last_walks.truncate(MAX_SHARED_WALKS);

        Self {
            version: EXCHANGE_VERSION,
            sent_at_ms,
            sender,
            last_walks,
            community,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a packet, rejecting versions this build does not understand.
    pub fn from_json(raw: &str) -> Result<Self> {
        let packet: Self = serde_json::from_str(raw)?;
        if packet.version != EXCHANGE_VERSION {
            debug!("rejecting exchange packet version {}", packet.version);
            return Err(Error::UnsupportedVersion(packet.version));
        }
        Ok(packet)
    }
}
