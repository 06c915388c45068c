//! Rebuild an engine from its journal

use crate::config::EngineConfig;
use crate::engine::AuthorizationEngine;
use crate::error::EngineError;
use trinetra_events::{EngineCommand, JournalRecord};

impl AuthorizationEngine {
    /// Re-execute journaled commands against a fresh engine
    ///
    /// The first record must be `Deploy`. Each later record must reproduce
    /// its recorded outcome: the same events on success, or a
    /// state-changing failure when `failure` is set.
    pub fn replay(records: &[JournalRecord]) -> Result<Self, EngineError> {
        let (first, rest) = records.split_first().ok_or(EngineError::Replay {
            sequence: 1,
            reason: "journal is empty".to_string(),
        })?;

        let config = match &first.command {
            EngineCommand::Deploy {
                administrator,
                initial_supply,
                required_signatures,
                token,
            } => EngineConfig {
                administrator: *administrator,
                initial_supply: *initial_supply,
                required_signatures: *required_signatures,
                token: token.clone(),
            },
            other => {
                return Err(EngineError::Replay {
                    sequence: first.sequence,
                    reason: format!("first record is {}, expected deploy", other.name()),
                })
            }
        };

        let mut engine = AuthorizationEngine::new(config)?;

        for record in rest {
            match (engine.execute(&record.caller, &record.command), &record.failure) {
                (Ok(events), None) if events == record.events => {}
                (Ok(_), None) => {
                    return Err(EngineError::Replay {
                        sequence: record.sequence,
                        reason: "emitted events differ from the journal".to_string(),
                    })
                }
                (Err(err), Some(_)) if err.is_state_changing() => {}
                (Ok(_), Some(expected)) => {
                    return Err(EngineError::Replay {
                        sequence: record.sequence,
                        reason: format!("expected failure '{}', command succeeded", expected),
                    })
                }
                (Err(err), _) => {
                    return Err(EngineError::Replay {
                        sequence: record.sequence,
                        reason: err.to_string(),
                    })
                }
            }
        }

        tracing::info!(records = records.len(), "Engine rebuilt from journal");
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestStatus;
    use trinetra_core::{Address, TokenAmount};
    use trinetra_events::EngineEvent;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    /// Execute commands on a live engine and journal them the way the app context does
    fn journal(config: EngineConfig, commands: Vec<(Address, EngineCommand)>) -> (AuthorizationEngine, Vec<JournalRecord>) {
        let mut records = vec![JournalRecord::new(1, config.administrator, config.to_command(), vec![], None)];
        let mut engine = AuthorizationEngine::new(config).unwrap();

        for (caller, command) in commands {
            let sequence = records.len() as u64 + 1;
            match engine.execute(&caller, &command) {
                Ok(events) => records.push(JournalRecord::new(sequence, caller, command, events, None)),
                Err(err) if err.is_state_changing() => {
                    records.push(JournalRecord::new(sequence, caller, command, vec![], Some(err.to_string())))
                }
                Err(_) => {}
            }
        }
        (engine, records)
    }

    #[test]
    fn test_replay_reproduces_state_including_stalled() {
        let config = EngineConfig::new(addr("admin"), 1_000, 2);
        let decimals = config.token.decimals;
        let t = |n: u128| TokenAmount::from_whole(n, decimals).unwrap();

        let commands = vec![
            (addr("admin"), EngineCommand::AddSigner { candidate: addr("signer1") }),
            (addr("admin"), EngineCommand::AddSigner { candidate: addr("signer2") }),
            (
                addr("admin"),
                EngineCommand::InitiateTransfer {
                    to: addr("user1"),
                    amount: t(600),
                    attachment_ref: "x".to_string(),
                },
            ),
            (
                addr("admin"),
                EngineCommand::InitiateTransfer {
                    to: addr("user2"),
                    amount: t(500),
                    attachment_ref: "y".to_string(),
                },
            ),
            (addr("signer1"), EngineCommand::ApproveTransfer { id: 2 }),
            (addr("signer2"), EngineCommand::ApproveTransfer { id: 2 }),
            (addr("signer1"), EngineCommand::ApproveTransfer { id: 1 }),
            // fails re-validation and stalls request 1
            (addr("signer2"), EngineCommand::ApproveTransfer { id: 1 }),
            // rejected outright, never journaled
            (addr("stranger"), EngineCommand::ApproveTransfer { id: 1 }),
        ];

        let (live, records) = journal(config, commands);
        assert_eq!(records.len(), 9);
        assert!(records.last().unwrap().failure.is_some());

        let rebuilt = AuthorizationEngine::replay(&records).unwrap();
        assert_eq!(rebuilt.balance_of(&addr("admin")), live.balance_of(&addr("admin")));
        assert_eq!(rebuilt.balance_of(&addr("user2")), t(500));
        assert_eq!(rebuilt.signers(), live.signers());
        assert_eq!(rebuilt.events(), live.events());

        let stalled = rebuilt.transfer_request(1).unwrap();
        assert_eq!(stalled.status, RequestStatus::Pending);
        assert!(stalled.is_stalled(2));
    }

    #[test]
    fn test_replay_requires_deploy_first() {
        let record = JournalRecord::new(1, addr("admin"), EngineCommand::ApproveBurn { id: 1 }, vec![], None);
        let result = AuthorizationEngine::replay(&[record]);
        assert!(matches!(result, Err(EngineError::Replay { sequence: 1, .. })));

        assert!(matches!(AuthorizationEngine::replay(&[]), Err(EngineError::Replay { .. })));
    }

    #[test]
    fn test_replay_detects_divergent_events() {
        let config = EngineConfig::new(addr("admin"), 1_000, 2);
        let (_, mut records) = journal(
            config,
            vec![(
                addr("admin"),
                EngineCommand::InitiateBurn {
                    amount: TokenAmount::new(1),
                    bank_details: "bank".to_string(),
                },
            )],
        );
        records[1].events = vec![EngineEvent::TransferCompleted { id: 1 }];

        let result = AuthorizationEngine::replay(&records);
        assert!(matches!(result, Err(EngineError::Replay { sequence: 2, .. })));
    }
}
