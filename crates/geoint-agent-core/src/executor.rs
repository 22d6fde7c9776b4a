//! Runs validated agent actions against the host's collaborators.

use crate::bridge::BridgeSlot;
use crate::error::{ActionError, BridgeError};
use crate::state::{ActionResult, AgentAction};
use crate::tool::{AgentTool, KeywordRef, ToolCall};

/// Page routing as seen by the agent
pub trait Navigator: Send + Sync {
    /// Path of the page currently shown, e.g. `/geoint`
    fn current_page(&self) -> String;

    fn navigate(&self, path: &str, query: &[(String, String)]) -> anyhow::Result<()>;
}

pub struct Collaborators<'a> {
    pub navigator: &'a dyn Navigator,
    /// Read again for every action, since an earlier action may unmount the
    /// feature module
    pub bridge: &'a BridgeSlot,
}

/// Execute every action in order. One result per action, index-aligned; a
/// failure never stops the remaining actions.
pub async fn execute(actions: &[AgentAction], collaborators: &Collaborators<'_>) -> Vec<ActionResult> {
    let mut results = Vec::with_capacity(actions.len());

    for action in actions {
        let result = match execute_one(action, collaborators).await {
            Ok(message) => {
                tracing::info!(tool = %action.tool, "agent action succeeded");
                ActionResult {
                    tool: action.tool.clone(),
                    success: true,
                    message: Some(message),
                }
            }
            Err(err) => {
                tracing::warn!(tool = %action.tool, error = %err, "agent action failed");
                ActionResult {
                    tool: action.tool.clone(),
                    success: false,
                    message: Some(err.to_string()),
                }
            }
        };
        results.push(result);
    }

    results
}

async fn execute_one(
    action: &AgentAction,
    collaborators: &Collaborators<'_>,
) -> Result<String, ActionError> {
    let call = ToolCall::parse(action)?;
    let tool = call.tool();
    let require_bridge = || {
        collaborators
            .bridge
            .current()
            .ok_or(ActionError::FeatureInactive { tool: tool.as_str() })
    };

    let outcome = match &call {
        ToolCall::Navigate { path, query } => {
            collaborators
                .navigator
                .navigate(path, query)
                .map_err(|e| ActionError::Failed {
                    tool: tool.as_str(),
                    reason: e.to_string(),
                })?;
            return Ok(format!("Navigated to {}", path));
        }
        ToolCall::SelectKeyword(reference) => {
            let bridge = require_bridge()?;
            let (entry, shown) = match reference {
                KeywordRef::Id(id) => (bridge.snapshot.find_by_id(id), id),
                KeywordRef::Name(name) => (bridge.snapshot.find_by_name(name), name),
            };
            let entry = entry.cloned().ok_or_else(|| ActionError::UnknownKeyword {
                tool: tool.as_str(),
                reference: shown.clone(),
            })?;
            bridge
                .controller
                .select_keyword(&entry.id)
                .await
                .map(|_| format!("Selected keyword \"{}\"", entry.keyword))
        }
        ToolCall::CalculateGeoint => require_bridge()?
            .controller
            .calculate_geoint()
            .await
            .map(|_| "GEOINT calculation started".to_string()),
        ToolCall::CalculateBudget => require_bridge()?
            .controller
            .calculate_budget()
            .await
            .map(|_| "Budget allocation calculated".to_string()),
        ToolCall::SetBudget { amount } => require_bridge()?
            .controller
            .set_budget(*amount)
            .await
            .map(|_| format!("Budget set to {:.2}", amount)),
        ToolCall::FocusProvince { province } => require_bridge()?
            .controller
            .focus_province(province)
            .await
            .map(|_| format!("Map focused on {}", province)),
        ToolCall::DrillDownProvince { province } => require_bridge()?
            .controller
            .drill_down_province(province)
            .await
            .map(|_| format!("Showing districts of {}", province)),
        ToolCall::ResetMapView => require_bridge()?
            .controller
            .reset_map_view()
            .await
            .map(|_| "Map view reset".to_string()),
    };

    outcome.map_err(|err| bridge_failure(tool, err))
}

fn bridge_failure(tool: AgentTool, err: BridgeError) -> ActionError {
    match err {
        BridgeError::Unsupported => ActionError::CapabilityMissing { tool: tool.as_str() },
        BridgeError::Rejected(reason) => ActionError::Failed {
            tool: tool.as_str(),
            reason,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{BridgeRegistration, BridgeSnapshot, FeatureController, KeywordEntry};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingNavigator {
        visits: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Navigator for RecordingNavigator {
        fn current_page(&self) -> String {
            "/".to_string()
        }

        fn navigate(&self, path: &str, query: &[(String, String)]) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("router unavailable");
            }
            let mut visit = path.to_string();
            for (k, v) in query {
                visit.push_str(&format!(" {}={}", k, v));
            }
            self.visits.lock().unwrap().push(visit);
            Ok(())
        }
    }

    #[derive(Default)]
    struct GeointOnly {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FeatureController for GeointOnly {
        async fn select_keyword(&self, keyword_id: &str) -> Result<(), BridgeError> {
            self.calls.lock().unwrap().push(format!("select:{}", keyword_id));
            Ok(())
        }

        async fn calculate_geoint(&self) -> Result<(), BridgeError> {
            self.calls.lock().unwrap().push("geoint".to_string());
            Ok(())
        }

        async fn calculate_budget(&self) -> Result<(), BridgeError> {
            Err(BridgeError::Rejected("no keyword selected".to_string()))
        }
    }

    fn mount(slot: &BridgeSlot, controller: Arc<GeointOnly>) -> BridgeRegistration {
        slot.register(
            controller,
            BridgeSnapshot {
                keywords: vec![
                    KeywordEntry::new("1", "kahve"),
                    KeywordEntry::new("2", "çay"),
                ],
                ..Default::default()
            },
        )
    }

    /// Leaving the page unmounts the feature module, as the host does
    struct UnmountingNavigator {
        registration: Mutex<Option<BridgeRegistration>>,
    }

    impl Navigator for UnmountingNavigator {
        fn current_page(&self) -> String {
            "/geoint".to_string()
        }

        fn navigate(&self, _path: &str, _query: &[(String, String)]) -> anyhow::Result<()> {
            self.registration.lock().unwrap().take();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_navigation_works_without_bridge() {
        let navigator = RecordingNavigator::default();
        let slot = BridgeSlot::new();
        let collaborators = Collaborators {
            navigator: &navigator,
            bridge: &slot,
        };

        let results = execute(
            &[AgentAction::new("navigate", json!({"page": "competitors", "params": {"id": 3}}))],
            &collaborators,
        )
        .await;

        assert!(results[0].success);
        assert_eq!(*navigator.visits.lock().unwrap(), vec!["/competitors id=3".to_string()]);
    }

    #[tokio::test]
    async fn test_navigation_error_is_reported() {
        let navigator = RecordingNavigator {
            fail: true,
            ..Default::default()
        };
        let slot = BridgeSlot::new();
        let collaborators = Collaborators {
            navigator: &navigator,
            bridge: &slot,
        };

        let results = execute(&[AgentAction::new("navigate", json!({"page": "/"}))], &collaborators).await;
        assert!(!results[0].success);
        assert!(results[0].message.as_deref().unwrap().contains("router unavailable"));
    }

    #[tokio::test]
    async fn test_bridge_tools_fail_when_feature_inactive() {
        let navigator = RecordingNavigator::default();
        let slot = BridgeSlot::new();
        let collaborators = Collaborators {
            navigator: &navigator,
            bridge: &slot,
        };

        let results = execute(
            &[
                AgentAction::new("calculate_geoint", json!({})),
                AgentAction::new("select_keyword", json!({"keyword_id": "1"})),
            ],
            &collaborators,
        )
        .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.success));
        assert_eq!(
            results[0].message.as_deref(),
            Some("calculate_geoint: the GEOINT workspace is not active")
        );
    }

    #[tokio::test]
    async fn test_batch_continues_after_failures() {
        let navigator = RecordingNavigator::default();
        let controller = Arc::new(GeointOnly::default());
        let slot = BridgeSlot::new();
        let _registration = mount(&slot, controller.clone());
        let collaborators = Collaborators {
            navigator: &navigator,
            bridge: &slot,
        };

        let actions = vec![
            AgentAction::new("launch_rockets", json!({})),
            AgentAction::new("select_keyword", json!({"keyword_name": "ÇAY"})),
            AgentAction::new("calculate_budget", json!({})),
            AgentAction::new("set_budget", json!({"amount": 500})),
            AgentAction::new("select_keyword", json!({"keyword_id": "99"})),
            AgentAction::new("calculate_geoint", json!(null)),
        ];
        let results = execute(&actions, &collaborators).await;

        let outcomes: Vec<(&str, bool)> = results
            .iter()
            .map(|r| (r.tool.as_str(), r.success))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("launch_rockets", false),
                ("select_keyword", true),
                ("calculate_budget", false),
                ("set_budget", false),
                ("select_keyword", false),
                ("calculate_geoint", true),
            ]
        );
        assert_eq!(
            results[0].message.as_deref(),
            Some("Unsupported action: launch_rockets")
        );
        assert_eq!(
            results[2].message.as_deref(),
            Some("calculate_budget failed: no keyword selected")
        );
        assert_eq!(
            results[3].message.as_deref(),
            Some("set_budget: not available in the active workspace")
        );
        assert_eq!(
            *controller.calls.lock().unwrap(),
            vec!["select:2".to_string(), "geoint".to_string()]
        );
    }

    #[tokio::test]
    async fn test_actions_after_unmount_see_no_bridge() {
        let controller = Arc::new(GeointOnly::default());
        let slot = BridgeSlot::new();
        let navigator = UnmountingNavigator {
            registration: Mutex::new(Some(mount(&slot, controller.clone()))),
        };
        let collaborators = Collaborators {
            navigator: &navigator,
            bridge: &slot,
        };

        let results = execute(
            &[
                AgentAction::new("calculate_geoint", json!({})),
                AgentAction::new("navigate", json!({"page": "keywords"})),
                AgentAction::new("calculate_geoint", json!({})),
            ],
            &collaborators,
        )
        .await;

        let outcomes: Vec<bool> = results.iter().map(|r| r.success).collect();
        assert_eq!(outcomes, vec![true, true, false]);
        assert_eq!(
            results[2].message.as_deref(),
            Some("calculate_geoint: the GEOINT workspace is not active")
        );
        assert_eq!(*controller.calls.lock().unwrap(), vec!["geoint".to_string()]);
        assert!(!slot.is_active());
    }

    #[tokio::test]
    async fn test_empty_batch_yields_no_results() {
        let navigator = RecordingNavigator::default();
        let slot = BridgeSlot::new();
        let collaborators = Collaborators {
            navigator: &navigator,
            bridge: &slot,
        };
        assert!(execute(&[], &collaborators).await.is_empty());
    }
}
