//! Simulation commands as recorded in a turn.

use crate::id::PlayerId;
use crate::payload::Payload;

/// A command issued by a player and applied by the simulation.
///
/// The payload is opaque to Cairn; only the simulation interprets it.
/// Commands within a turn are applied in the order they were issued,
/// so a `Vec<Command>` is always an ordered batch.
///
/// # Examples
///
/// ```
/// use cairn_core::{Command, Payload, PlayerId};
/// use serde_json::json;
///
/// let cmd = Command::new(PlayerId(1), Payload::freeze(json!({"type": "train"})));
/// assert_eq!(cmd.player, PlayerId(1));
/// assert_eq!(cmd.data["type"], "train");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    /// The player that owns this command.
    pub player: PlayerId,
    /// The frozen action description.
    pub data: Payload,
}

impl Command {
    /// Create a command from a player and a frozen payload.
    pub fn new(player: PlayerId, data: Payload) -> Self {
        Self { player, data }
    }
}
