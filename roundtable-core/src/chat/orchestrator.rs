use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapters::AgentEvent;
use crate::error::{RoundtableError, RoundtableResult};
use crate::models::{ContextSource, Member, NewMessage};
use crate::store::ConversationStore;

use super::context::context_block_for;
use super::events::{RoundEvent, RoundEventStream};
use super::mentions::resolve_targets;
use super::prompt::{format_conversation_history, history_with_round_responses, PeerAnswer};
use super::runner::{TurnRequest, TurnRunner};

/// Knobs for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// How many transcript rows feed each round's base history.
    pub history_limit: i64,
    /// Bound on each await of the next adapter event. A member that
    /// stays silent this long is failed and the round moves on.
    pub turn_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            history_limit: 30,
            turn_timeout: Duration::from_secs(600),
        }
    }
}

enum TurnOutcome {
    Done(String),
    Error(String),
}

/// Drives one round of agent answers per inbound user message.
///
/// The store and runner come in as trait handles, so the whole round
/// loop can be exercised against in-memory fakes.
pub struct TurnOrchestrator {
    store: Arc<dyn ConversationStore>,
    runner: Arc<dyn TurnRunner>,
    config: OrchestratorConfig,
}

impl TurnOrchestrator {
    pub fn new(store: Arc<dyn ConversationStore>, runner: Arc<dyn TurnRunner>) -> Self {
        Self::with_config(store, runner, OrchestratorConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn ConversationStore>,
        runner: Arc<dyn TurnRunner>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            runner,
            config,
        }
    }

    /// Validate, persist the user message, and return the round's event
    /// stream.
    ///
    /// Validation failures return before anything is written. Once this
    /// returns `Ok`, the user message is durable and polling the stream
    /// drives the member turns strictly in order; dropping the stream
    /// stops the round after the turn in flight.
    pub async fn run_round(
        &self,
        room_id: i64,
        content: &str,
        target_member_id: Option<i64>,
    ) -> RoundtableResult<RoundEventStream> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(RoundtableError::EmptyMessage);
        }

        let members = self.store.get_members(room_id).await?;
        let targets: Vec<Member> = resolve_targets(content, &members, target_member_id)
            .into_iter()
            .cloned()
            .collect();
        if targets.is_empty() {
            return Err(RoundtableError::NoRecipients);
        }

        // The user message must be durable before any agent runs.
        self.store
            .create_message(NewMessage::from_user(room_id, trimmed))
            .await?;

        let history_rows = self
            .store
            .get_recent_messages(room_id, self.config.history_limit)
            .await?;
        let base_history = format_conversation_history(&history_rows);

        let target_ids: Vec<i64> = targets.iter().map(|m| m.id).collect();
        let sources = self
            .store
            .get_context_sources_by_member_ids(&target_ids)
            .await?;
        let mut sources_by_member: HashMap<i64, Vec<ContextSource>> = HashMap::new();
        for source in sources {
            sources_by_member
                .entry(source.member_id)
                .or_default()
                .push(source);
        }

        let round_id = Uuid::new_v4();
        info!(
            round_id = %round_id,
            room_id,
            targets = targets.len(),
            "Starting chat round"
        );

        let store = Arc::clone(&self.store);
        let runner = Arc::clone(&self.runner);
        let turn_timeout = self.config.turn_timeout;
        let user_message = content.to_string();

        let round = stream! {
            let mut peer_answers: Vec<PeerAnswer> = Vec::new();

            for member in targets {
                debug!(round_id = %round_id, member_id = member.id, member_name = %member.name, "Member turn started");
                yield RoundEvent::Start {
                    member_id: member.id,
                    member_name: member.name.clone(),
                };

                let history = history_with_round_responses(&base_history, &peer_answers);
                let member_sources = sources_by_member.remove(&member.id).unwrap_or_default();
                let context_block = context_block_for(&member, &member_sources);

                let request = TurnRequest {
                    member: member.clone(),
                    user_message: user_message.clone(),
                    history,
                    context_block,
                };

                let mut events = runner.run_turn(request);
                let mut accumulated = String::new();
                let mut outcome: Option<TurnOutcome> = None;

                while outcome.is_none() {
                    match tokio::time::timeout(turn_timeout, events.next()).await {
                        Err(_) => {
                            outcome = Some(TurnOutcome::Error(format!(
                                "Agent '{}' timed out after {} seconds",
                                member.name,
                                turn_timeout.as_secs()
                            )));
                        }
                        Ok(None) => {
                            // Adapter ended without a terminal event;
                            // count what we have as the answer.
                            outcome = Some(TurnOutcome::Done(std::mem::take(&mut accumulated)));
                        }
                        Ok(Some(AgentEvent::Chunk { text })) => {
                            accumulated.push_str(&text);
                            yield RoundEvent::Chunk {
                                member_id: member.id,
                                content: text,
                            };
                        }
                        Ok(Some(AgentEvent::Done { text })) => {
                            outcome = Some(TurnOutcome::Done(text));
                        }
                        Ok(Some(AgentEvent::Error { message })) => {
                            outcome = Some(TurnOutcome::Error(message));
                        }
                    }
                }

                // Stop the engine promptly, in particular after a timeout.
                drop(events);

                match outcome {
                    Some(TurnOutcome::Done(text)) if !text.trim().is_empty() => {
                        match store
                            .create_message(NewMessage::from_member(room_id, member.id, &text))
                            .await
                        {
                            Ok(_) => {
                                peer_answers.push(PeerAnswer {
                                    name: member.name.clone(),
                                    content: text,
                                });
                                debug!(round_id = %round_id, member_id = member.id, "Member turn done");
                                yield RoundEvent::Done { member_id: member.id };
                            }
                            Err(e) => {
                                // Answer is lost but the round goes on.
                                warn!(round_id = %round_id, member_id = member.id, error = %e, "Failed to persist member answer");
                                yield RoundEvent::Error {
                                    member_id: member.id,
                                    error: e.to_string(),
                                };
                            }
                        }
                    }
                    Some(TurnOutcome::Done(_)) => {
                        debug!(round_id = %round_id, member_id = member.id, "Member turn done with empty answer");
                        yield RoundEvent::Done { member_id: member.id };
                    }
                    Some(TurnOutcome::Error(message)) => {
                        warn!(round_id = %round_id, member_id = member.id, error = %message, "Member turn failed");
                        yield RoundEvent::Error {
                            member_id: member.id,
                            error: message,
                        };
                    }
                    None => unreachable!("turn loop exits with an outcome"),
                }
            }

            info!(round_id = %round_id, room_id, "Chat round finished");
        };

        Ok(Box::pin(round))
    }
}
