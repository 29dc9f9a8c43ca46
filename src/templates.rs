//! Template matching for content blocks
//!
//! Rules arrive from storage as JSON payloads such as
//! `{"priority": 10, "step1": "<form|<input", "step2": ["map", "iframe"]}`.
//! They are parsed once into [`TemplateRule`]s; a rule matches a block when
//! every step holds against the block's markup.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::ParseError;
use crate::model::Platform;

/// One atomic condition of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Markup must contain this substring
    Literal(String),
    /// Markup must contain at least one of these substrings
    AnyOf(Vec<String>),
}

impl Step {
    pub fn holds(&self, markup: &str) -> bool {
        match self {
            Step::Literal(needle) => markup.contains(needle.as_str()),
            Step::AnyOf(options) => options.iter().any(|opt| markup.contains(opt.as_str())),
        }
    }

    fn parse(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) if s.contains('|') => {
                let options: Vec<String> = s
                    .split('|')
                    .map(str::trim)
                    .filter(|opt| !opt.is_empty())
                    .map(String::from)
                    .collect();
                if options.is_empty() {
                    return Err(format!("OR-group {s:?} has no alternatives"));
                }
                Ok(Step::AnyOf(options))
            }
            Value::String(s) if s.is_empty() => Err("empty literal".to_string()),
            Value::String(s) => Ok(Step::Literal(s.clone())),
            Value::Array(items) => {
                let options: Vec<String> = items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|opt| !opt.is_empty())
                    .map(String::from)
                    .collect();
                if options.is_empty() {
                    return Err("list step has no string alternatives".to_string());
                }
                Ok(Step::AnyOf(options))
            }
            other => Err(format!("unsupported step value {other}")),
        }
    }
}

/// Template row as kept by the persistence side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: i64,
    /// Label given to blocks that match, e.g. "Форма обратной связи"
    pub block_type: String,
    pub platform: Platform,
    /// `{"priority": n, "step1": ..., "step2": ...}`
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRule {
    pub id: i64,
    pub block_type: String,
    pub platform: Platform,
    pub pattern: Vec<Step>,
    pub priority: i64,
}

impl TemplateRule {
    pub fn parse(record: &TemplateRecord) -> Result<Self, ParseError> {
        let malformed = |reason: String| ParseError::MalformedRule { id: record.id, reason };

        // storage may keep the payload as JSON text
        let decoded;
        let payload = match &record.payload {
            Value::String(text) => {
                decoded = serde_json::from_str::<Value>(text)
                    .map_err(|e| malformed(format!("payload text is not JSON: {e}")))?;
                &decoded
            }
            other => other,
        };
        let Value::Object(payload) = payload else {
            return Err(malformed("payload is not an object".to_string()));
        };

        let priority = match payload.get("priority") {
            None | Some(Value::Null) => 0,
            Some(Value::Number(n)) => n
                .as_i64()
                .ok_or_else(|| malformed(format!("priority {n} is not an integer")))?,
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| malformed(format!("priority {s:?} is not an integer")))?,
            Some(other) => return Err(malformed(format!("priority {other} is not an integer"))),
        };

        let mut pattern = Vec::new();
        for index in 1.. {
            let Some(value) = payload.get(&format!("step{index}")) else {
                break;
            };
            let step = Step::parse(value).map_err(|reason| malformed(format!("step{index}: {reason}")))?;
            pattern.push(step);
        }
        if pattern.is_empty() {
            return Err(malformed("no steps".to_string()));
        }

        Ok(Self {
            id: record.id,
            block_type: record.block_type.clone(),
            platform: record.platform,
            pattern,
            priority,
        })
    }

    /// All steps hold
    pub fn matches(&self, markup: &str) -> bool {
        self.pattern.iter().all(|step| step.holds(markup))
    }
}

/// Parsed rules for one platform, ascending priority
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    rules: Vec<TemplateRule>,
}

impl TemplateRecord {
    /// Decode records one by one, skipping (with a warning) those that do
    /// not deserialize.
    pub fn from_values(values: &[Value]) -> Vec<Self> {
        values
            .iter()
            .filter_map(|value| match Self::deserialize(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "skipping undecodable template record");
                    None
                }
            })
            .collect()
    }
}

impl TemplateSet {
    /// Parse stored records, skipping malformed ones.
    pub fn from_records(records: &[TemplateRecord]) -> Self {
        let rules = records
            .iter()
            .filter_map(|record| match TemplateRule::parse(record) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!(error = %e, "skipping template rule");
                    None
                }
            })
            .collect();
        Self::from_rules(rules)
    }

    pub fn from_rules(mut rules: Vec<TemplateRule>) -> Self {
        // stable: equal priorities keep storage order
        rules.sort_by_key(|rule| rule.priority);
        Self { rules }
    }

    /// Only the rules written for `platform`
    pub fn for_platform(&self, platform: Platform) -> Self {
        Self {
            rules: self.rules.iter().filter(|r| r.platform == platform).cloned().collect(),
        }
    }

    pub fn find_match(&self, markup: &str) -> Option<&TemplateRule> {
        find_match(markup, &self.rules)
    }

    pub fn rules(&self) -> &[TemplateRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// First rule, in slice order, whose steps all hold against `markup`
pub fn find_match<'r>(markup: &str, rules: &'r [TemplateRule]) -> Option<&'r TemplateRule> {
    rules.iter().find(|rule| rule.matches(markup))
}
