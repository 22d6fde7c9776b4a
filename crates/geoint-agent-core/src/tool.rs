use serde_json::{Map, Value};

use crate::error::ActionError;
use crate::state::AgentAction;

/// The fixed set of operations the agent may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentTool {
    Navigate,
    SelectKeyword,
    CalculateGeoint,
    CalculateBudget,
    SetBudget,
    FocusProvince,
    DrillDownProvince,
    ResetMapView,
}

impl AgentTool {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentTool::Navigate => "navigate",
            AgentTool::SelectKeyword => "select_keyword",
            AgentTool::CalculateGeoint => "calculate_geoint",
            AgentTool::CalculateBudget => "calculate_budget",
            AgentTool::SetBudget => "set_budget",
            AgentTool::FocusProvince => "focus_province",
            AgentTool::DrillDownProvince => "drill_down_province",
            AgentTool::ResetMapView => "reset_map_view",
        }
    }

    /// Exact match only: tool names come from a remote service and are not normalized.
    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|tool| tool.as_str() == s)
    }

    pub fn all() -> Vec<AgentTool> {
        vec![
            AgentTool::Navigate,
            AgentTool::SelectKeyword,
            AgentTool::CalculateGeoint,
            AgentTool::CalculateBudget,
            AgentTool::SetBudget,
            AgentTool::FocusProvince,
            AgentTool::DrillDownProvince,
            AgentTool::ResetMapView,
        ]
    }

    /// Whether the tool needs a mounted feature module
    pub fn needs_bridge(&self) -> bool {
        !matches!(self, AgentTool::Navigate)
    }
}

/// How the agent refers to a keyword
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordRef {
    Id(String),
    Name(String),
}

/// A validated tool call, ready to execute
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Navigate {
        path: String,
        query: Vec<(String, String)>,
    },
    SelectKeyword(KeywordRef),
    CalculateGeoint,
    CalculateBudget,
    SetBudget {
        amount: f64,
    },
    FocusProvince {
        province: String,
    },
    DrillDownProvince {
        province: String,
    },
    ResetMapView,
}

impl ToolCall {
    /// Validate a remote-authored action against the tool enum and its parameter shape.
    pub fn parse(action: &AgentAction) -> Result<Self, ActionError> {
        let tool = AgentTool::from_str(&action.tool)
            .ok_or_else(|| ActionError::UnsupportedTool(action.tool.clone()))?;

        let empty = Map::new();
        let params = match &action.parameters {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(ActionError::InvalidParameter {
                    tool: tool.as_str(),
                    name: "parameters",
                    reason: "expected an object".to_string(),
                })
            }
        };

        let call = match tool {
            AgentTool::Navigate => {
                let page = required_string(tool, params, "page")?;
                ToolCall::Navigate {
                    path: normalize_page(tool, &page)?,
                    query: query_params(tool, params)?,
                }
            }
            AgentTool::SelectKeyword => ToolCall::SelectKeyword(keyword_ref(tool, params)?),
            AgentTool::CalculateGeoint => ToolCall::CalculateGeoint,
            AgentTool::CalculateBudget => ToolCall::CalculateBudget,
            AgentTool::SetBudget => ToolCall::SetBudget {
                amount: budget_amount(tool, params)?,
            },
            AgentTool::FocusProvince => ToolCall::FocusProvince {
                province: required_string(tool, params, "province")?,
            },
            AgentTool::DrillDownProvince => ToolCall::DrillDownProvince {
                province: required_string(tool, params, "province")?,
            },
            AgentTool::ResetMapView => ToolCall::ResetMapView,
        };

        Ok(call)
    }

    pub fn tool(&self) -> AgentTool {
        match self {
            ToolCall::Navigate { .. } => AgentTool::Navigate,
            ToolCall::SelectKeyword(_) => AgentTool::SelectKeyword,
            ToolCall::CalculateGeoint => AgentTool::CalculateGeoint,
            ToolCall::CalculateBudget => AgentTool::CalculateBudget,
            ToolCall::SetBudget { .. } => AgentTool::SetBudget,
            ToolCall::FocusProvince { .. } => AgentTool::FocusProvince,
            ToolCall::DrillDownProvince { .. } => AgentTool::DrillDownProvince,
            ToolCall::ResetMapView => AgentTool::ResetMapView,
        }
    }
}

fn required_string(
    tool: AgentTool,
    params: &Map<String, Value>,
    name: &'static str,
) -> Result<String, ActionError> {
    match params.get(name) {
        None | Some(Value::Null) => Err(ActionError::MissingParameter {
            tool: tool.as_str(),
            name,
        }),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(ActionError::InvalidParameter {
            tool: tool.as_str(),
            name,
            reason: "must not be empty".to_string(),
        }),
        Some(_) => Err(ActionError::InvalidParameter {
            tool: tool.as_str(),
            name,
            reason: "expected a string".to_string(),
        }),
    }
}

/// Accepts `geoint`, `/geoint`, `/keywords/42`. Rejects anything that looks
/// like an external URL.
fn normalize_page(tool: AgentTool, page: &str) -> Result<String, ActionError> {
    let invalid = |reason: &str| ActionError::InvalidParameter {
        tool: tool.as_str(),
        name: "page",
        reason: reason.to_string(),
    };

    if page.contains("://") || page.starts_with("//") {
        return Err(invalid("external URLs are not allowed"));
    }
    if page.chars().any(char::is_whitespace) || page.contains('?') {
        return Err(invalid("expected a plain page path"));
    }

    let path = if page.starts_with('/') {
        page.to_string()
    } else {
        format!("/{}", page)
    };
    Ok(path)
}

fn query_params(
    tool: AgentTool,
    params: &Map<String, Value>,
) -> Result<Vec<(String, String)>, ActionError> {
    let map = match params.get("params") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(ActionError::InvalidParameter {
                tool: tool.as_str(),
                name: "params",
                reason: "expected an object".to_string(),
            })
        }
    };

    map.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(ActionError::InvalidParameter {
                        tool: tool.as_str(),
                        name: "params",
                        reason: format!("value of `{}` must be a scalar", key),
                    })
                }
            };
            Ok((key.clone(), value))
        })
        .collect()
}

fn keyword_ref(tool: AgentTool, params: &Map<String, Value>) -> Result<KeywordRef, ActionError> {
    match params.get("keyword_id") {
        Some(Value::String(id)) if !id.trim().is_empty() => {
            return Ok(KeywordRef::Id(id.trim().to_string()))
        }
        Some(Value::Number(id)) => return Ok(KeywordRef::Id(id.to_string())),
        None | Some(Value::Null) => {}
        Some(_) => {
            return Err(ActionError::InvalidParameter {
                tool: tool.as_str(),
                name: "keyword_id",
                reason: "expected a string or number".to_string(),
            })
        }
    }

    if !params.contains_key("keyword_name") {
        return Err(ActionError::MissingParameter {
            tool: tool.as_str(),
            name: "keyword_id",
        });
    }
    required_string(tool, params, "keyword_name").map(KeywordRef::Name)
}

fn budget_amount(tool: AgentTool, params: &Map<String, Value>) -> Result<f64, ActionError> {
    let invalid = |reason: &str| ActionError::InvalidParameter {
        tool: tool.as_str(),
        name: "amount",
        reason: reason.to_string(),
    };

    let amount = match params.get("amount") {
        None | Some(Value::Null) => {
            return Err(ActionError::MissingParameter {
                tool: tool.as_str(),
                name: "amount",
            })
        }
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| invalid("not a number"))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid("not a number"))?,
        Some(_) => return Err(invalid("expected a number")),
    };

    if !amount.is_finite() || amount <= 0.0 {
        return Err(invalid("must be a positive amount"));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(tool: &str, parameters: Value) -> Result<ToolCall, ActionError> {
        ToolCall::parse(&AgentAction::new(tool, parameters))
    }

    #[test]
    fn test_every_tool_name_round_trips() {
        for tool in AgentTool::all() {
            assert_eq!(AgentTool::from_str(tool.as_str()), Some(tool));
        }
        assert_eq!(AgentTool::from_str("Navigate"), None);
        assert_eq!(AgentTool::from_str("delete_everything"), None);
    }

    #[test]
    fn test_unknown_tool_is_unsupported() {
        let err = parse("drop_tables", json!({})).unwrap_err();
        assert_eq!(err, ActionError::UnsupportedTool("drop_tables".to_string()));
        assert!(err.to_string().contains("Unsupported action"));
    }

    #[test]
    fn test_navigate_normalizes_page_and_params() {
        let call = parse(
            "navigate",
            json!({"page": "geoint", "params": {"keyword": 42, "tab": "map"}}),
        )
        .unwrap();

        match call {
            ToolCall::Navigate { path, query } => {
                assert_eq!(path, "/geoint");
                assert!(query.contains(&("keyword".to_string(), "42".to_string())));
                assert!(query.contains(&("tab".to_string(), "map".to_string())));
            }
            other => panic!("unexpected call: {:?}", other),
        }
    }

    #[test]
    fn test_navigate_rejects_external_urls() {
        let err = parse("navigate", json!({"page": "https://evil.example"})).unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameter { name: "page", .. }));
    }

    #[test]
    fn test_navigate_requires_page() {
        let err = parse("navigate", json!({})).unwrap_err();
        assert_eq!(
            err,
            ActionError::MissingParameter {
                tool: "navigate",
                name: "page"
            }
        );
    }

    #[test]
    fn test_navigate_rejects_nested_params() {
        let err = parse("navigate", json!({"page": "/", "params": {"a": [1]}})).unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameter { name: "params", .. }));
    }

    #[test]
    fn test_select_keyword_accepts_numeric_id_or_name() {
        assert_eq!(
            parse("select_keyword", json!({"keyword_id": 7})).unwrap(),
            ToolCall::SelectKeyword(KeywordRef::Id("7".to_string()))
        );
        assert_eq!(
            parse("select_keyword", json!({"keyword_name": "kahve"})).unwrap(),
            ToolCall::SelectKeyword(KeywordRef::Name("kahve".to_string()))
        );
        assert!(parse("select_keyword", json!({})).is_err());
        assert!(parse("select_keyword", json!({"keyword_id": true})).is_err());
    }

    #[test]
    fn test_set_budget_validates_amount() {
        assert_eq!(
            parse("set_budget", json!({"amount": 15000})).unwrap(),
            ToolCall::SetBudget { amount: 15000.0 }
        );
        assert_eq!(
            parse("set_budget", json!({"amount": "2500.5"})).unwrap(),
            ToolCall::SetBudget { amount: 2500.5 }
        );
        assert!(parse("set_budget", json!({"amount": -1})).is_err());
        assert!(parse("set_budget", json!({"amount": "lots"})).is_err());
        assert!(matches!(
            parse("set_budget", json!({})).unwrap_err(),
            ActionError::MissingParameter { name: "amount", .. }
        ));
    }

    #[test]
    fn test_province_tools_require_non_empty_name() {
        assert_eq!(
            parse("focus_province", json!({"province": " İzmir "})).unwrap(),
            ToolCall::FocusProvince {
                province: "İzmir".to_string()
            }
        );
        assert!(parse("drill_down_province", json!({"province": ""})).is_err());
        assert!(parse("drill_down_province", json!({"province": 34})).is_err());
    }

    #[test]
    fn test_non_object_parameters_are_rejected() {
        let err = parse("calculate_geoint", json!([1, 2])).unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameter { name: "parameters", .. }));
        assert_eq!(parse("calculate_geoint", Value::Null).unwrap(), ToolCall::CalculateGeoint);
    }
}
