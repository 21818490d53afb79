//! Scenario files: named criteria, optional named alternatives and a goal.
//!
//! ```json
//! {
//!   "criteria": {"price": ["high", "mid", "low"], "size": ["small", "big"]},
//!   "alts": {"Flat A": {"price": "mid", "size": "big"}, "Flat B": {"price": "low", "size": "small"}},
//!   "find_best": 1
//! }
//! ```
//!
//! `alts` may also be a plain list of level maps. Scalar levels are read as
//! strings. `goal` (`find_best`, `rank_alts`, `rank_space`) and `max_dev`
//! are optional.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::elicit::{ElicitRequest, Goal};
use crate::space::Item;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid scenario: {0}")]
    Shape(String),
}

fn shape(msg: impl Into<String>) -> ScenarioError {
    ScenarioError::Shape(msg.into())
}

#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    pub criterion_names: Vec<String>,
    /// Levels per criterion, worst first.
    pub criteria: Vec<Vec<String>>,
    pub alternatives: Option<Vec<Item<String>>>,
    /// Present when `alts` was given as a name -> levels map.
    pub alternative_names: Option<Vec<String>>,
    pub goal: Goal,
    pub max_dev: usize,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ScenarioError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, ScenarioError> {
        let root = value
            .as_object()
            .ok_or_else(|| shape("scenario must be a JSON object"))?;

        let criteria_map = root
            .get("criteria")
            .and_then(Value::as_object)
            .ok_or_else(|| shape("`criteria` must be an object of name -> levels"))?;
        let mut criterion_names = Vec::with_capacity(criteria_map.len());
        let mut criteria = Vec::with_capacity(criteria_map.len());
        for (name, levels) in criteria_map {
            let levels = levels
                .as_array()
                .ok_or_else(|| shape(format!("criterion `{name}` must list its levels")))?;
            let levels = levels
                .iter()
                .map(|level| scalar(level).ok_or_else(|| shape(format!("criterion `{name}` has a non-scalar level"))))
                .collect::<Result<Vec<_>, _>>()?;
            criterion_names.push(name.clone());
            criteria.push(levels);
        }

        let (alternatives, alternative_names) = match root.get("alts") {
            None | Some(Value::Null) => (None, None),
            Some(Value::Array(list)) => {
                let items = list
                    .iter()
                    .enumerate()
                    .map(|(i, alt)| read_alternative(&format!("#{i}"), alt, &criterion_names))
                    .collect::<Result<Vec<_>, _>>()?;
                (Some(items), None)
            }
            Some(Value::Object(named)) => {
                let mut items = Vec::with_capacity(named.len());
                let mut names = Vec::with_capacity(named.len());
                for (name, alt) in named {
                    items.push(read_alternative(name, alt, &criterion_names)?);
                    names.push(name.clone());
                }
                (Some(items), Some(names))
            }
            Some(_) => return Err(shape("`alts` must be a list or an object")),
        };

        // `find_best: 0` is the same as leaving it out.
        let find_best = match root.get("find_best") {
            None | Some(Value::Null) => None,
            Some(v) => match v.as_u64() {
                Some(0) => None,
                Some(k) => Some(k as usize),
                None => return Err(shape("`find_best` must be a non-negative integer")),
            },
        };
        let goal = match (root.get("goal").and_then(Value::as_str), find_best) {
            (Some("find_best") | None, Some(k)) => Goal::FindBest(k),
            (Some("find_best"), None) => return Err(shape("goal `find_best` needs `find_best`")),
            (Some("rank_alts") | None, None) => Goal::RankAlternatives,
            (Some("rank_space"), None) => Goal::RankSpace,
            (Some(other), _) => {
                return Err(shape(format!(
                    "unknown or conflicting goal `{other}` (find_best={find_best:?})"
                )))
            }
        };

        let max_dev = match root.get("max_dev") {
            None | Some(Value::Null) => 2 * criteria.len(),
            Some(v) => v
                .as_u64()
                .map(|d| d as usize)
                .ok_or_else(|| shape("`max_dev` must be a non-negative integer"))?,
        };

        Ok(Self {
            criterion_names,
            criteria,
            alternatives,
            alternative_names,
            goal,
            max_dev,
        })
    }

    pub fn request(&self) -> ElicitRequest<String> {
        let mut req = ElicitRequest::new(self.criteria.clone(), self.goal).with_max_dev(self.max_dev);
        if let Some(alternatives) = &self.alternatives {
            req = req.with_alternatives(alternatives.clone());
        }
        req
    }

    /// Name of a named alternative.
    pub fn alternative_name(&self, item: &[String]) -> Option<&str> {
        let names = self.alternative_names.as_ref()?;
        let position = self.alternatives.as_ref()?.iter().position(|alt| alt == item)?;
        names.get(position).map(String::as_str)
    }

    /// Display name: the alternative's name when it has one, else its levels.
    pub fn name_item(&self, item: &[String]) -> String {
        match self.alternative_name(item) {
            Some(name) => name.to_string(),
            None => format!("({})", item.join(", ")),
        }
    }

    /// Stable blake3 hash of the parsed scenario.
    pub fn hash(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&bytes).to_hex().to_string()
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn read_alternative(
    label: &str,
    value: &Value,
    criterion_names: &[String],
) -> Result<Item<String>, ScenarioError> {
    let levels: &Map<String, Value> = value
        .as_object()
        .ok_or_else(|| shape(format!("alternative {label} must map criteria to levels")))?;
    if let Some(extra) = levels.keys().find(|k| !criterion_names.contains(k)) {
        return Err(shape(format!("alternative {label} names unknown criterion `{extra}`")));
    }
    criterion_names
        .iter()
        .map(|name| {
            let level = levels
                .get(name)
                .ok_or_else(|| shape(format!("alternative {label} is missing criterion `{name}`")))?;
            scalar(level).ok_or_else(|| shape(format!("alternative {label} has a non-scalar level for `{name}`")))
        })
        .collect()
}
