use std::pin::Pin;

use futures::Stream;
use serde::Serialize;

/// Wire events for one chat round.
///
/// Each member turn is a `start`, any number of `chunk`s, then exactly
/// one `done` or `error`. The stream simply ends after the last member;
/// there is no round-level terminator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum RoundEvent {
    Start { member_id: i64, member_name: String },
    Chunk { member_id: i64, content: String },
    Done { member_id: i64 },
    Error { member_id: i64, error: String },
}

impl RoundEvent {
    pub fn member_id(&self) -> i64 {
        match self {
            RoundEvent::Start { member_id, .. }
            | RoundEvent::Chunk { member_id, .. }
            | RoundEvent::Done { member_id }
            | RoundEvent::Error { member_id, .. } => *member_id,
        }
    }
}

pub type RoundEventStream = Pin<Box<dyn Stream<Item = RoundEvent> + Send>>;
