//! Search criteria.
//!
//! Clients send a list of `{key, op, value}` filters plus an optional
//! keyword. Each searchable entity whitelists its filterable keys with a
//! [`FieldKind`]; [`compile`] checks every filter against that whitelist
//! and parses its value into typed binds, so no client text ever reaches
//! SQL unparsed.

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::macros::define_code_enum;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 200;

/// Maximum number of values in an `IN` / `NOT_IN` list.
pub const MAX_IN_VALUES: usize = 500;

pub const MAX_KEYWORD_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

define_code_enum! {
    SearchOp {
        Equal => "EQUAL",
        NotEqual => "NOT_EQUAL",
        GreaterThan => "GREATER_THAN",
        GreaterThanEqual => "GREATER_THAN_EQUAL",
        LessThan => "LESS_THAN",
        LessThanEqual => "LESS_THAN_EQUAL",
        In => "IN",
        NotIn => "NOT_IN",
        Match => "MATCH",
        MatchEnd => "MATCH_END",
        IsNull => "IS_NULL",
        IsNotNull => "IS_NOT_NULL",
    }
}

impl SearchOp {
    /// SQL comparison operator for the scalar forms.
    pub fn sql(self) -> &'static str {
        match self {
            SearchOp::Equal => "=",
            SearchOp::NotEqual => "<>",
            SearchOp::GreaterThan => ">",
            SearchOp::GreaterThanEqual => ">=",
            SearchOp::LessThan => "<",
            SearchOp::LessThanEqual => "<=",
            SearchOp::Match | SearchOp::MatchEnd => "ILIKE",
            SearchOp::In => "IN",
            SearchOp::NotIn => "NOT IN",
            SearchOp::IsNull => "IS NULL",
            SearchOp::IsNotNull => "IS NOT NULL",
        }
    }

    fn is_ordering(self) -> bool {
        matches!(
            self,
            SearchOp::GreaterThan
                | SearchOp::GreaterThanEqual
                | SearchOp::LessThan
                | SearchOp::LessThanEqual
        )
    }
}

define_code_enum! {
    OrderSort {
        Asc => "ASC",
        Desc => "DESC",
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchCriteria {
    pub key: String,
    pub op: SearchOp,
    #[serde(default)]
    pub value: Option<Value>,
}

impl SearchCriteria {
    pub fn new(key: impl Into<String>, op: SearchOp, value: Option<Value>) -> Self {
        Self {
            key: key.into(),
            op,
            value,
        }
    }
}

/// Body of every `POST .../search` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub filters: Vec<SearchCriteria>,
    pub keyword: Option<String>,
    pub page_no: Option<i64>,
    pub page_size: Option<i64>,
    pub order_by: Option<String>,
    pub order_sort: Option<OrderSort>,
}

// ---------------------------------------------------------------------------
// Field whitelist
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Id,
    Text,
    /// Code column restricted to the listed values.
    Enum(&'static [&'static str]),
    Timestamp,
    Bool,
    Number,
    /// Tag id resolved through the tag association table.
    TagRef,
}

impl FieldKind {
    fn accepts(self, op: SearchOp) -> bool {
        use SearchOp as O;
        match self {
            FieldKind::TagRef => matches!(op, O::Equal | O::In | O::NotIn),
            _ if matches!(op, O::IsNull | O::IsNotNull | O::Equal | O::NotEqual) => true,
            FieldKind::Id | FieldKind::Number => op.is_ordering() || matches!(op, O::In | O::NotIn),
            FieldKind::Timestamp => op.is_ordering(),
            FieldKind::Text => matches!(op, O::In | O::NotIn | O::Match | O::MatchEnd),
            FieldKind::Enum(_) => matches!(op, O::In | O::NotIn),
            FieldKind::Bool => false,
        }
    }
}

/// A filterable key and the column it maps to.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub key: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    pub const fn new(key: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { key, column, kind }
    }
}

// ---------------------------------------------------------------------------
// Compiled predicates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Int(i64),
    Float(f64),
    Text(String),
    Time(Timestamp),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    One(TypedValue),
    Many(Vec<TypedValue>),
}

/// A validated filter ready to be rendered with bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: &'static str,
    pub kind: FieldKind,
    pub op: SearchOp,
    pub operand: Operand,
}

/// Validate `criteria` against `fields` and parse every value.
pub fn compile(fields: &[FieldDef], criteria: &[SearchCriteria]) -> Result<Vec<Predicate>, CoreError> {
    criteria
        .iter()
        .map(|c| {
            let field = fields.iter().find(|f| f.key == c.key).ok_or_else(|| {
                CoreError::Validation(format!("Unknown search field '{}'", c.key))
            })?;
            if !field.kind.accepts(c.op) {
                return Err(CoreError::Validation(format!(
                    "Operator {} is not supported on field '{}'",
                    c.op, c.key
                )));
            }
            let operand = parse_operand(field, c.op, c.value.as_ref())?;
            Ok(Predicate {
                column: field.column,
                kind: field.kind,
                op: c.op,
                operand,
            })
        })
        .collect()
}

fn parse_operand(field: &FieldDef, op: SearchOp, value: Option<&Value>) -> Result<Operand, CoreError> {
    match op {
        SearchOp::IsNull | SearchOp::IsNotNull => Ok(Operand::None),
        SearchOp::In | SearchOp::NotIn => {
            let items: Vec<Value> = match value {
                Some(Value::Array(items)) => items.clone(),
                Some(Value::String(s)) => s
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
                Some(other) => vec![other.clone()],
                None => Vec::new(),
            };
            if items.is_empty() || items.len() > MAX_IN_VALUES {
                return Err(CoreError::Validation(format!(
                    "'{}' needs 1 to {MAX_IN_VALUES} values",
                    field.key
                )));
            }
            let parsed = items
                .iter()
                .map(|v| parse_value(field, v))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Operand::Many(parsed))
        }
        SearchOp::Match | SearchOp::MatchEnd => {
            let text = match value {
                Some(v) => parse_value(field, v)?,
                None => return Err(missing_value(field)),
            };
            let TypedValue::Text(raw) = text else {
                return Err(missing_value(field));
            };
            Ok(Operand::One(TypedValue::Text(like_pattern(op, &raw))))
        }
        _ => match value {
            Some(Value::Null) | None => Err(missing_value(field)),
            Some(v) => Ok(Operand::One(parse_value(field, v)?)),
        },
    }
}

fn missing_value(field: &FieldDef) -> CoreError {
    CoreError::Validation(format!("Search field '{}' needs a value", field.key))
}

fn parse_value(field: &FieldDef, value: &Value) -> Result<TypedValue, CoreError> {
    let invalid = || {
        CoreError::Validation(format!(
            "Invalid value {value} for search field '{}'",
            field.key
        ))
    };
    match field.kind {
        FieldKind::Id | FieldKind::TagRef => match value {
            Value::Number(n) => n.as_i64().map(TypedValue::Int).ok_or_else(invalid),
            Value::String(s) => s.trim().parse().map(TypedValue::Int).map_err(|_| invalid()),
            _ => Err(invalid()),
        },
        FieldKind::Number => match value {
            Value::Number(n) => n.as_f64().map(TypedValue::Float).ok_or_else(invalid),
            Value::String(s) => s.trim().parse().map(TypedValue::Float).map_err(|_| invalid()),
            _ => Err(invalid()),
        },
        FieldKind::Text => match value {
            Value::String(s) => Ok(TypedValue::Text(s.clone())),
            Value::Number(n) => Ok(TypedValue::Text(n.to_string())),
            _ => Err(invalid()),
        },
        FieldKind::Enum(codes) => match value {
            Value::String(s) if codes.contains(&s.as_str()) => Ok(TypedValue::Text(s.clone())),
            _ => Err(CoreError::Validation(format!(
                "Invalid value {value} for search field '{}'. Must be one of: {}",
                field.key,
                codes.join(", ")
            ))),
        },
        FieldKind::Timestamp => match value {
            Value::String(s) => parse_timestamp(s).map(TypedValue::Time).ok_or_else(invalid),
            _ => Err(invalid()),
        },
        FieldKind::Bool => match value {
            Value::Bool(b) => Ok(TypedValue::Bool(*b)),
            Value::String(s) => s.trim().parse().map(TypedValue::Bool).map_err(|_| invalid()),
            _ => Err(invalid()),
        },
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) and plain dates.
pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let s = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

// ---------------------------------------------------------------------------
// LIKE patterns, paging, ordering
// ---------------------------------------------------------------------------

/// Escape LIKE wildcards and wrap for `MATCH` (contains) or `MATCH_END`
/// (prefix).
pub fn like_pattern(op: SearchOp, raw: &str) -> String {
    let escaped = raw
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    match op {
        SearchOp::MatchEnd => format!("{escaped}%"),
        _ => format!("%{escaped}%"),
    }
}

/// Normalize a free-text keyword into a contains pattern.
pub fn keyword_pattern(keyword: Option<&str>) -> Result<Option<String>, CoreError> {
    let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) else {
        return Ok(None);
    };
    if keyword.chars().count() > MAX_KEYWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Keyword must be at most {MAX_KEYWORD_LENGTH} characters"
        )));
    }
    Ok(Some(like_pattern(SearchOp::Match, keyword)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page_no: i64,
    pub page_size: i64,
}

impl Page {
    pub fn clamp(page_no: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page_no: page_no.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page_no - 1).saturating_mul(self.page_size)
    }
}

/// Resolve the sort column, falling back to `default` when unset.
pub fn resolve_order(
    order_by: Option<&str>,
    sortable: &[FieldDef],
    default: &'static str,
) -> Result<&'static str, CoreError> {
    match order_by {
        None => Ok(default),
        Some(key) => sortable
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.column)
            .ok_or_else(|| CoreError::Validation(format!("Cannot order by '{key}'"))),
    }
}
