use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use geoint_agent_core::Navigator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Geoint,
    Keywords,
    Strategies,
    Competitors,
    Settings,
}

impl Page {
    pub fn as_path(&self) -> &'static str {
        match self {
            Page::Dashboard => "/",
            Page::Geoint => "/geoint",
            Page::Keywords => "/keywords",
            Page::Strategies => "/strategies",
            Page::Competitors => "/competitors",
            Page::Settings => "/settings",
        }
    }

    /// Matches on the first path segment, so `/geoint/ankara` is the GEOINT page
    pub fn from_path(path: &str) -> Option<Self> {
        let segment = path.split('/').find(|s| !s.is_empty()).unwrap_or_default();
        match segment.to_lowercase().as_str() {
            "" | "dashboard" => Some(Page::Dashboard),
            "geoint" => Some(Page::Geoint),
            "keywords" => Some(Page::Keywords),
            "strategies" => Some(Page::Strategies),
            "competitors" => Some(Page::Competitors),
            "settings" => Some(Page::Settings),
            _ => None,
        }
    }

    pub fn all() -> Vec<Page> {
        vec![
            Page::Dashboard,
            Page::Geoint,
            Page::Keywords,
            Page::Strategies,
            Page::Competitors,
            Page::Settings,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Geoint => "GEOINT",
            Page::Keywords => "Keywords",
            Page::Strategies => "Strategies",
            Page::Competitors => "Competitors",
            Page::Settings => "Settings",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Location {
    pub fn page(&self) -> Page {
        Page::from_path(&self.path).unwrap_or(Page::Dashboard)
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Shared page location. Clones see the same location.
#[derive(Clone)]
pub struct AppRouter {
    location: Arc<RwLock<Location>>,
}

impl AppRouter {
    pub fn new() -> Self {
        Self {
            location: Arc::new(RwLock::new(Location {
                path: Page::Dashboard.as_path().to_string(),
                query: Vec::new(),
            })),
        }
    }

    pub fn location(&self) -> Location {
        match self.location.read() {
            Ok(location) => location.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn go(&self, page: Page) {
        // Known pages always route.
        let _ = self.navigate(page.as_path(), &[]);
    }
}

impl Navigator for AppRouter {
    fn current_page(&self) -> String {
        self.location().path
    }

    fn navigate(&self, path: &str, query: &[(String, String)]) -> Result<()> {
        if Page::from_path(path).is_none() {
            return Err(anyhow!("no such page: {}", path));
        }

        let mut location = self
            .location
            .write()
            .map_err(|_| anyhow!("router state poisoned"))?;
        *location = Location {
            path: path.to_string(),
            query: query.to_vec(),
        };
        tracing::info!(path, "navigated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_round_trip_through_paths() {
        for page in Page::all() {
            assert_eq!(Page::from_path(page.as_path()), Some(page));
        }
        assert_eq!(Page::from_path("/geoint/istanbul"), Some(Page::Geoint));
        assert_eq!(Page::from_path("/nowhere"), None);
    }

    #[test]
    fn test_navigate_updates_shared_location() {
        let router = AppRouter::new();
        let observer = router.clone();

        router
            .navigate("/keywords", &[("sort".to_string(), "volume".to_string())])
            .unwrap();

        assert_eq!(observer.current_page(), "/keywords");
        assert_eq!(observer.location().query_value("sort"), Some("volume"));
        assert_eq!(observer.location().page(), Page::Keywords);
    }

    #[test]
    fn test_unknown_page_is_an_error() {
        let router = AppRouter::new();
        assert!(router.navigate("/admin", &[]).is_err());
        assert_eq!(router.current_page(), "/");
    }
}
