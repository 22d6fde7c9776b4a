use serde::Serialize;

/// A canned prompt offered for the page the user is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuickAction {
    pub id: &'static str,
    pub label: &'static str,
    pub prompt: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'static str>,
}

const fn action(
    id: &'static str,
    label: &'static str,
    prompt: &'static str,
    icon: &'static str,
) -> QuickAction {
    QuickAction {
        id,
        label,
        prompt,
        icon: Some(icon),
    }
}

const GEOINT: &[QuickAction] = &[
    action("geoint-calculate", "Calculate GEOINT", "Calculate the GEOINT score for the selected keyword", "map"),
    action("geoint-budget", "Plan budget", "Distribute a 50000 TL budget across provinces for the selected keyword", "wallet"),
    action("geoint-top", "Top provinces", "Which provinces have the highest potential for this keyword?", "trophy"),
    action("geoint-reset", "Reset map", "Reset the map to the whole country", "rotate-ccw"),
];

const KEYWORDS: &[QuickAction] = &[
    action("keywords-best", "Best performers", "Which of my keywords are performing best?", "trending-up"),
    action("keywords-suggest", "Suggest keywords", "Suggest new keywords related to my current list", "sparkles"),
    action("keywords-analyze", "Analyze in GEOINT", "Open GEOINT and analyze my top keyword", "map"),
];

const STRATEGIES: &[QuickAction] = &[
    action("strategies-new", "New strategy", "Create a marketing strategy for my top keyword", "lightbulb"),
    action("strategies-review", "Review strategies", "Summarize my active strategies and their status", "list-checks"),
    action("strategies-budget", "Budget split", "How should I split my budget across my strategies?", "wallet"),
];

const COMPETITORS: &[QuickAction] = &[
    action("competitors-compare", "Compare", "Compare me with my main competitors", "swords"),
    action("competitors-gaps", "Find gaps", "Where are my competitors weak geographically?", "target"),
    action("competitors-track", "Track changes", "What changed with my competitors recently?", "activity"),
];

const SETTINGS: &[QuickAction] = &[
    action("settings-help", "What can you do?", "What can you help me with?", "help-circle"),
    action("settings-dashboard", "Back to dashboard", "Take me to the dashboard", "layout-dashboard"),
];

const DEFAULT: &[QuickAction] = &[
    action("default-summary", "Daily summary", "Give me a summary of today's performance", "bar-chart"),
    action("default-geoint", "Open GEOINT", "Take me to the GEOINT analysis page", "map"),
    action("default-keywords", "My keywords", "Show my keywords", "key"),
    action("default-help", "What can you do?", "What can you help me with?", "help-circle"),
];

const PAGES: &[(&str, &[QuickAction])] = &[
    ("geoint", GEOINT),
    ("keywords", KEYWORDS),
    ("strategies", STRATEGIES),
    ("competitors", COMPETITORS),
    ("settings", SETTINGS),
];

/// Quick actions for a page, keyed on the first path segment.
pub fn resolve(pathname: &str) -> &'static [QuickAction] {
    let path = pathname.split(['?', '#']).next().unwrap_or_default();
    let segment = path
        .split('/')
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_ascii_lowercase();

    PAGES
        .iter()
        .find(|(page, _)| *page == segment)
        .map(|(_, menu)| *menu)
        .unwrap_or(DEFAULT)
}
