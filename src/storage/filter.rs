//! Component filters and their translation to SQL.
//!
//! A [`ComponentFilter`] is built by the caller (directly, or validated from a
//! loose JSON map with [`ComponentFilter::from_map`]) and turned into a bound
//! `SELECT` over `components JOIN models`. Caller strings only ever reach the
//! database as bound parameters; sortable columns are a closed set.

use std::str::FromStr;

use serde_json::{Map, Value};
use sqlx::{QueryBuilder, Sqlite};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Column list shared by every component read.
///
/// Model columns are prefixed `model_`; `model_id` is the component's
/// foreign key, which equals the model's id.
pub(crate) const COMPONENT_SELECT: &str = "SELECT c.id, c.model_id, c.kind, c.api_version, c.display_name, c.format,
        c.metadata, c.schema, c.created_at, c.updated_at,
        m.name AS model_name, m.version AS model_version,
        m.display_name AS model_display_name, m.category AS model_category,
        m.sub_category AS model_sub_category, m.metadata AS model_metadata
 FROM components c
 JOIN models m ON c.model_id = m.id";

/// Errors raised while building a filter from untyped input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// A key held a value of the wrong JSON type.
    #[error("filter field '{field}' must be {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    /// A key held a value of the right type that is not allowed.
    #[error("filter field '{field}' has invalid value '{value}': {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Sort order for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Lenient, case-sensitive parse: only `"desc"` sorts descending.
    pub fn from_loose(s: &str) -> Self {
        if s == "desc" { Self::Desc } else { Self::Asc }
    }

    fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Columns a component query may be ordered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OrderField {
    #[strum(to_string = "kind", serialize = "name")]
    Kind,
    #[strum(to_string = "api_version", serialize = "apiversion")]
    ApiVersion,
    #[strum(to_string = "display_name", serialize = "displayname")]
    DisplayName,
    Format,
    #[strum(to_string = "created_at", serialize = "createdat")]
    CreatedAt,
    #[strum(to_string = "updated_at", serialize = "updatedat")]
    UpdatedAt,
    #[strum(to_string = "model_name", serialize = "modelname")]
    ModelName,
    #[strum(
        to_string = "model_version",
        serialize = "modelversion",
        serialize = "version"
    )]
    ModelVersion,
}

impl OrderField {
    fn column(&self) -> &'static str {
        match self {
            Self::Kind => "c.kind",
            Self::ApiVersion => "c.api_version",
            Self::DisplayName => "c.display_name",
            Self::Format => "c.format",
            Self::CreatedAt => "c.created_at",
            Self::UpdatedAt => "c.updated_at",
            Self::ModelName => "m.name",
            Self::ModelVersion => "m.version",
        }
    }
}

/// Query over registered components.
///
/// Empty strings and `None` leave a dimension unconstrained. A `limit` of 0
/// returns every row from `offset` on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentFilter {
    /// Component kind to match.
    pub name: String,
    pub api_version: String,
    /// Prefix-match `name` instead of requiring equality.
    pub greedy: bool,
    pub model_name: String,
    pub version: String,
    pub sort: SortOrder,
    pub order_on: Option<OrderField>,
    pub limit: u32,
    pub offset: u32,
}

impl ComponentFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Validate and build a filter from a loose key/value map.
    ///
    /// Recognised keys: `name`, `apiVersion`, `greedy`, `modelName`,
    /// `version`, `sort`, `orderOn`, `limit`, `offset`. Missing keys and
    /// `null` values leave the field at its default; unknown keys are
    /// ignored.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, FilterError> {
        let mut filter = Self::default();

        if let Some(name) = string_field(map, "name")? {
            filter.name = name;
        }
        if let Some(api_version) = string_field(map, "apiVersion")? {
            filter.api_version = api_version;
        }
        if let Some(greedy) = bool_field(map, "greedy")? {
            filter.greedy = greedy;
        }
        if let Some(model_name) = string_field(map, "modelName")? {
            filter.model_name = model_name;
        }
        if let Some(version) = string_field(map, "version")? {
            filter.version = version;
        }
        if let Some(sort) = string_field(map, "sort")? {
            filter.sort = SortOrder::from_loose(&sort);
        }
        if let Some(order_on) = string_field(map, "orderOn")?
            && !order_on.is_empty()
        {
            filter.order_on =
                Some(
                    OrderField::from_str(&order_on).map_err(|_| FilterError::InvalidValue {
                        field: "orderOn",
                        value: order_on.clone(),
                        reason: "not a sortable column".to_string(),
                    })?,
                );
        }
        if let Some(limit) = u32_field(map, "limit")? {
            filter.limit = limit;
        }
        if let Some(offset) = u32_field(map, "offset")? {
            filter.offset = offset;
        }

        Ok(filter)
    }

    /// Build the bound `SELECT` for this filter.
    pub fn to_query(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(COMPONENT_SELECT);
        qb.push(" WHERE 1 = 1");

        if !self.name.is_empty() {
            if self.greedy {
                // Case-sensitive prefix match; LIKE would fold ASCII case and
                // treat '%' and '_' in the name as wildcards.
                qb.push(" AND substr(c.kind, 1, length(")
                    .push_bind(self.name.clone())
                    .push(")) = ")
                    .push_bind(self.name.clone());
            } else {
                qb.push(" AND c.kind = ").push_bind(self.name.clone());
            }
        }
        if !self.api_version.is_empty() {
            qb.push(" AND c.api_version = ")
                .push_bind(self.api_version.clone());
        }
        if !self.model_name.is_empty() {
            qb.push(" AND m.name = ").push_bind(self.model_name.clone());
        }
        if !self.version.is_empty() {
            qb.push(" AND m.version = ").push_bind(self.version.clone());
        }

        qb.push(" ORDER BY ");
        if let Some(field) = self.order_on {
            qb.push(field.column()).push(" ").push(self.sort.as_sql()).push(", ");
        }
        qb.push("c.rowid ASC");

        // SQLite needs a LIMIT before OFFSET; -1 means unbounded.
        let limit = if self.limit == 0 { -1 } else { i64::from(self.limit) };
        qb.push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(i64::from(self.offset));

        qb
    }
}

fn string_field(map: &Map<String, Value>, field: &'static str) -> Result<Option<String>, FilterError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(FilterError::InvalidType {
            field,
            expected: "a string",
        }),
    }
}

fn bool_field(map: &Map<String, Value>, field: &'static str) -> Result<Option<bool>, FilterError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => s.parse().map(Some).map_err(|_| FilterError::InvalidValue {
            field,
            value: s.clone(),
            reason: "expected 'true' or 'false'".to_string(),
        }),
        Some(_) => Err(FilterError::InvalidType {
            field,
            expected: "a boolean",
        }),
    }
}

fn u32_field(map: &Map<String, Value>, field: &'static str) -> Result<Option<u32>, FilterError> {
    let invalid = |value: String| FilterError::InvalidValue {
        field,
        value,
        reason: "expected a non-negative integer".to_string(),
    };

    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| invalid(n.to_string())),
        Some(Value::String(s)) => s.parse().map(Some).map_err(|_| invalid(s.clone())),
        Some(_) => Err(FilterError::InvalidType {
            field,
            expected: "an integer",
        }),
    }
}
