//! The GEOINT feature module as hosted by the terminal app.
//!
//! Scores and budget allocations are computed server-side; this module only
//! owns the selection, the budget input and the map position, and records which
//! computations were requested so the page can show them.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Local;
use geoint_agent_core::{
    BridgeError, BridgePublisher, BridgeRegistration, BridgeSlot, BridgeSnapshot,
    FeatureController, KeywordEntry,
};

const MAX_ACTIVITY: usize = 8;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceState {
    pub keywords: Vec<KeywordEntry>,
    pub selected: Option<KeywordEntry>,
    pub budget_amount: Option<f64>,
    pub focused_province: Option<String>,
    pub district_view: Option<String>,
    /// Newest first
    pub activity: Vec<String>,
}

impl WorkspaceState {
    fn snapshot(&self) -> BridgeSnapshot {
        BridgeSnapshot {
            selected_keyword: self.selected.clone(),
            keywords: self.keywords.clone(),
            budget_amount: self.budget_amount,
            focused_province: self.focused_province.clone(),
        }
    }

    fn record(&mut self, entry: String) {
        tracing::info!("{}", entry);
        self.activity
            .insert(0, format!("{}  {}", Local::now().format("%H:%M:%S"), entry));
        self.activity.truncate(MAX_ACTIVITY);
    }
}

pub struct GeointWorkspace {
    state: Mutex<WorkspaceState>,
    publisher: Mutex<Option<BridgePublisher>>,
}

impl GeointWorkspace {
    pub fn new(keywords: Vec<KeywordEntry>) -> Self {
        Self {
            state: Mutex::new(WorkspaceState {
                keywords,
                ..Default::default()
            }),
            publisher: Mutex::new(None),
        }
    }

    pub fn state(&self) -> WorkspaceState {
        self.lock().clone()
    }

    /// Select by position in the keyword list, as the page's own picker does
    pub fn select_index(&self, index: usize) {
        self.update(|state| {
            if let Some(entry) = state.keywords.get(index).cloned() {
                state.record(format!("Selected keyword \"{}\"", entry.keyword));
                state.selected = Some(entry);
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, WorkspaceState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Mutate, then publish the new snapshot to the dispatcher
    fn update<T>(&self, f: impl FnOnce(&mut WorkspaceState) -> T) -> T {
        let (result, snapshot) = {
            let mut state = self.lock();
            let result = f(&mut state);
            (result, state.snapshot())
        };
        let publisher = match self.publisher.lock() {
            Ok(publisher) => publisher.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        if let Some(publisher) = publisher {
            publisher.publish(snapshot);
        }
        result
    }

    fn attach(&self, publisher: BridgePublisher) {
        match self.publisher.lock() {
            Ok(mut slot) => *slot = Some(publisher),
            Err(poisoned) => *poisoned.into_inner() = Some(publisher),
        }
    }
}

#[async_trait]
impl FeatureController for GeointWorkspace {
    async fn select_keyword(&self, keyword_id: &str) -> Result<(), BridgeError> {
        self.update(|state| -> Result<(), BridgeError> {
            let entry = state
                .keywords
                .iter()
                .find(|k| k.id == keyword_id)
                .cloned()
                .ok_or_else(|| BridgeError::Rejected(format!("unknown keyword id {}", keyword_id)))?;
            state.record(format!("Selected keyword \"{}\"", entry.keyword));
            state.selected = Some(entry);
            Ok(())
        })
    }

    async fn calculate_geoint(&self) -> Result<(), BridgeError> {
        self.update(|state| -> Result<(), BridgeError> {
            let keyword = state
                .selected
                .as_ref()
                .map(|k| k.keyword.clone())
                .ok_or_else(|| BridgeError::Rejected("select a keyword first".to_string()))?;
            state.record(format!("GEOINT calculation requested for \"{}\"", keyword));
            Ok(())
        })
    }

    async fn calculate_budget(&self) -> Result<(), BridgeError> {
        self.update(|state| -> Result<(), BridgeError> {
            let keyword = state
                .selected
                .as_ref()
                .map(|k| k.keyword.clone())
                .ok_or_else(|| BridgeError::Rejected("select a keyword first".to_string()))?;
            let amount = state
                .budget_amount
                .ok_or_else(|| BridgeError::Rejected("set a budget amount first".to_string()))?;
            state.record(format!(
                "Budget allocation of {:.0} requested for \"{}\"",
                amount, keyword
            ));
            Ok(())
        })
    }

    async fn set_budget(&self, amount: f64) -> Result<(), BridgeError> {
        self.update(|state| -> Result<(), BridgeError> {
            state.budget_amount = Some(amount);
            state.record(format!("Budget set to {:.0}", amount));
            Ok(())
        })
    }

    async fn focus_province(&self, province: &str) -> Result<(), BridgeError> {
        self.update(|state| -> Result<(), BridgeError> {
            state.focused_province = Some(province.to_string());
            state.district_view = None;
            state.record(format!("Map focused on {}", province));
            Ok(())
        })
    }

    async fn drill_down_province(&self, province: &str) -> Result<(), BridgeError> {
        self.update(|state| -> Result<(), BridgeError> {
            state.focused_province = Some(province.to_string());
            state.district_view = Some(province.to_string());
            state.record(format!("Showing districts of {}", province));
            Ok(())
        })
    }

    async fn reset_map_view(&self) -> Result<(), BridgeError> {
        self.update(|state| -> Result<(), BridgeError> {
            state.focused_province = None;
            state.district_view = None;
            state.record("Map reset to country view".to_string());
            Ok(())
        })
    }
}

/// A workspace while it is mounted. Dropping this unmounts it.
pub struct MountedWorkspace {
    pub workspace: Arc<GeointWorkspace>,
    _registration: BridgeRegistration,
}

impl MountedWorkspace {
    pub fn mount(slot: &BridgeSlot, workspace: Arc<GeointWorkspace>) -> Self {
        let registration = slot.register(workspace.clone(), workspace.lock().snapshot());
        workspace.attach(registration.publisher());
        tracing::info!("GEOINT workspace mounted");
        Self {
            workspace,
            _registration: registration,
        }
    }
}

impl Drop for MountedWorkspace {
    fn drop(&mut self) {
        tracing::info!("GEOINT workspace unmounted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords() -> Vec<KeywordEntry> {
        vec![KeywordEntry::new("1", "kahve"), KeywordEntry::new("2", "çay")]
    }

    #[tokio::test]
    async fn test_mutations_publish_snapshots() {
        let slot = BridgeSlot::new();
        let mounted = MountedWorkspace::mount(&slot, Arc::new(GeointWorkspace::new(keywords())));

        mounted.workspace.select_keyword("2").await.unwrap();
        mounted.workspace.set_budget(50000.0).await.unwrap();

        let snapshot = slot.current().unwrap().snapshot;
        assert_eq!(snapshot.selected_keyword.as_ref().unwrap().keyword, "çay");
        assert_eq!(snapshot.budget_amount, Some(50000.0));
    }

    #[tokio::test]
    async fn test_calculations_need_a_selection() {
        let workspace = GeointWorkspace::new(keywords());
        assert!(matches!(
            workspace.calculate_geoint().await,
            Err(BridgeError::Rejected(_))
        ));

        workspace.select_index(0);
        workspace.calculate_geoint().await.unwrap();
        assert!(workspace.calculate_budget().await.is_err());
        workspace.set_budget(1000.0).await.unwrap();
        workspace.calculate_budget().await.unwrap();
        assert_eq!(workspace.state().activity.len(), 4);
    }

    #[tokio::test]
    async fn test_map_navigation() {
        let workspace = GeointWorkspace::new(keywords());
        workspace.drill_down_province("İzmir").await.unwrap();
        assert_eq!(workspace.state().district_view.as_deref(), Some("İzmir"));

        workspace.reset_map_view().await.unwrap();
        let state = workspace.state();
        assert!(state.focused_province.is_none());
        assert!(state.district_view.is_none());
    }

    #[test]
    fn test_unmount_clears_bridge() {
        let slot = BridgeSlot::new();
        let mounted = MountedWorkspace::mount(&slot, Arc::new(GeointWorkspace::new(keywords())));
        assert!(slot.is_active());
        drop(mounted);
        assert!(!slot.is_active());
    }
}
