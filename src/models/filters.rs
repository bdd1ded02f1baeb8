use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::errors::CostIntelError;

/// Maximum number of ids accepted in a single id filter.
pub const MAX_FILTER_IDS: usize = 100;

/// Date range plus optional id filters for cost queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostFilters {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub cost_center_ids: Vec<i64>,
    #[serde(default)]
    pub project_ids: Vec<i64>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
}

impl CostFilters {
    /// Build filters for a date range with no id restrictions.
    pub fn for_period(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, CostIntelError> {
        Self::new(start_date, end_date, Vec::new(), Vec::new(), Vec::new())
    }

    /// Validate the range and normalize the id lists (sorted, deduplicated).
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        cost_center_ids: Vec<i64>,
        project_ids: Vec<i64>,
        category_ids: Vec<i64>,
    ) -> Result<Self, CostIntelError> {
        validate_date_range(start_date, end_date)?;
        Ok(Self {
            start_date,
            end_date,
            cost_center_ids: normalize_ids("cost_center_ids", cost_center_ids)?,
            project_ids: normalize_ids("project_ids", project_ids)?,
            category_ids: normalize_ids("category_ids", category_ids)?,
        })
    }
}

pub fn validate_date_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), CostIntelError> {
    if start_date > end_date {
        return Err(CostIntelError::validation("start_date must be <= end_date"));
    }
    Ok(())
}

pub fn normalize_ids(field: &str, mut ids: Vec<i64>) -> Result<Vec<i64>, CostIntelError> {
    if let Some(bad) = ids.iter().find(|id| **id <= 0) {
        return Err(CostIntelError::validation(format!(
            "{} must contain positive integers, got {}",
            field, bad
        )));
    }
    ids.sort_unstable();
    ids.dedup();
    if ids.len() > MAX_FILTER_IDS {
        return Err(CostIntelError::validation(format!(
            "{} accepts at most {} ids",
            field, MAX_FILTER_IDS
        )));
    }
    Ok(ids)
}

/// Fixed set of aggregation dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Month,
    CostCenter,
    Project,
    Category,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::CostCenter => "cost_center",
            Self::Project => "project",
            Self::Category => "category",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "month" => Some(Self::Month),
            "cost_center" => Some(Self::CostCenter),
            "project" => Some(Self::Project),
            "category" => Some(Self::Category),
            _ => None,
        }
    }

    /// Parse a caller-supplied group_by list. Order is kept, duplicates are
    /// dropped, unknown names reject the whole list.
    pub fn parse_list(values: &[String]) -> Result<Vec<Self>, CostIntelError> {
        let invalid: Vec<&str> = values
            .iter()
            .map(|v| v.as_str())
            .filter(|v| Self::parse(v).is_none())
            .collect();
        if !invalid.is_empty() {
            return Err(CostIntelError::BadRequest(format!(
                "Invalid group_by values: {:?}",
                invalid
            )));
        }

        let mut dimensions = Vec::new();
        for dim in values.iter().filter_map(|v| Self::parse(v)) {
            if !dimensions.contains(&dim) {
                dimensions.push(dim);
            }
        }
        if dimensions.is_empty() {
            return Err(CostIntelError::BadRequest("group_by must not be empty".into()));
        }
        Ok(dimensions)
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference tables that can be listed by the dimensions endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    CostCenters,
    Projects,
    Categories,
}

impl DimensionKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::CostCenters => "cost_centers",
            Self::Projects => "projects",
            Self::Categories => "categories",
        }
    }
}
