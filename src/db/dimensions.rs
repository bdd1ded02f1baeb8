use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::Database;
use crate::errors::CostIntelError;

/// Amount columns are REAL; reads convert back through integer cents.
fn stored_amount(amount: Decimal) -> Result<f64, CostIntelError> {
    amount
        .round_dp(2)
        .to_f64()
        .ok_or_else(|| CostIntelError::validation(format!("Amount {} cannot be stored", amount)))
}

impl Database {
    pub fn insert_cost_center(&self, code: &str, name: &str) -> Result<i64, CostIntelError> {
        self.insert_reference("cost_centers", code, name)
    }

    pub fn insert_project(&self, code: &str, name: &str) -> Result<i64, CostIntelError> {
        self.insert_reference("projects", code, name)
    }

    pub fn insert_category(&self, code: &str, name: &str) -> Result<i64, CostIntelError> {
        self.insert_reference("categories", code, name)
    }

    fn insert_reference(&self, table: &str, code: &str, name: &str) -> Result<i64, CostIntelError> {
        let conn = self.lock()?;
        conn.execute(
            &format!("INSERT INTO {} (code, name) VALUES (?1, ?2)", table),
            rusqlite::params![code, name],
        ).map_err(|e| CostIntelError::Database(format!("Failed to insert into {}: {}", table, e)))?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_cost_entry(
        &self,
        cost_center_id: i64,
        project_id: i64,
        category_id: i64,
        reference_date: NaiveDate,
        amount: Decimal,
    ) -> Result<i64, CostIntelError> {
        let amount = stored_amount(amount)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO cost_entries (cost_center_id, project_id, category_id, reference_date, amount) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![cost_center_id, project_id, category_id, reference_date, amount],
        ).map_err(|e| CostIntelError::Database(format!("Failed to insert cost entry: {}", e)))?;
        Ok(conn.last_insert_rowid())
    }

    /// `month_date` is stored as given; callers pass the first of the month.
    pub fn insert_budget_entry(
        &self,
        cost_center_id: Option<i64>,
        month_date: NaiveDate,
        planned_amount: Decimal,
    ) -> Result<i64, CostIntelError> {
        let planned_amount = stored_amount(planned_amount)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO budget_entries (cost_center_id, month_date, planned_amount) VALUES (?1, ?2, ?3)",
            rusqlite::params![cost_center_id, month_date, planned_amount],
        ).map_err(|e| CostIntelError::Database(format!("Failed to insert budget entry: {}", e)))?;
        Ok(conn.last_insert_rowid())
    }
}
