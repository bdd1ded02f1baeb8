use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use rust_decimal::Decimal;

use super::Database;
use crate::errors::CostIntelError;
use crate::models::{CostAggregateItem, CostFilters, Dimension, DimensionItem, DimensionKind};
use crate::services::provider::{BudgetActualRow, BucketTotal, CostDataProvider, MatrixRow, MonthlyBucketTotal};

const BASE_JOINS: &str = "FROM cost_entries e
    JOIN cost_centers cc ON cc.id = e.cost_center_id
    JOIN projects p ON p.id = e.project_id
    JOIN categories c ON c.id = e.category_id";

const MONTH_EXPR: &str = "substr(e.reference_date, 1, 7) || '-01'";

/// Sums are taken in integer cents so totals stay exact.
const CENTS_SUM: &str = "COALESCE(SUM(CAST(ROUND(e.amount * 100) AS INTEGER)), 0)";

fn cents(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    Ok(Decimal::new(row.get::<_, i64>(idx)?, 2))
}

fn dimension_column(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Month => MONTH_EXPR,
        Dimension::CostCenter => "cc.name",
        Dimension::Project => "p.name",
        Dimension::Category => "c.name",
    }
}

fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

fn id_list(column: &str, ids: &[i64], clauses: &mut Vec<String>, params: &mut Vec<Value>) {
    if ids.is_empty() {
        return;
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    clauses.push(format!("{} IN ({})", column, placeholders));
    params.extend(ids.iter().map(|id| Value::Integer(*id)));
}

/// WHERE clause and positional parameters for a filter set.
fn where_clause(filters: &CostFilters) -> (String, Vec<Value>) {
    let mut clauses = vec!["e.reference_date BETWEEN ? AND ?".to_string()];
    let mut params = vec![date_value(filters.start_date), date_value(filters.end_date)];
    id_list("e.cost_center_id", &filters.cost_center_ids, &mut clauses, &mut params);
    id_list("e.project_id", &filters.project_ids, &mut clauses, &mut params);
    id_list("e.category_id", &filters.category_ids, &mut clauses, &mut params);
    (format!("WHERE {}", clauses.join(" AND ")), params)
}

fn collect_rows<T, F>(conn: &Connection, sql: &str, params: &[Value], map: F) -> Result<Vec<T>, CostIntelError>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| CostIntelError::Database(format!("Query failed: {}", e)))?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), map)
        .map_err(|e| CostIntelError::Database(format!("Query error: {}", e)))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| CostIntelError::Database(format!("Row error: {}", e)))?);
    }
    Ok(out)
}

impl CostDataProvider for Database {
    fn total(&self, filters: &CostFilters) -> Result<Decimal, CostIntelError> {
        let conn = self.lock()?;
        let (where_sql, params) = where_clause(filters);
        let sql = format!("SELECT {} {} {}", CENTS_SUM, BASE_JOINS, where_sql);
        conn.query_row(&sql, params_from_iter(params.iter()), |row| cents(row, 0))
            .map_err(|e| CostIntelError::Database(format!("Total query failed: {}", e)))
    }

    fn grouped_totals(
        &self,
        filters: &CostFilters,
        dimensions: &[Dimension],
    ) -> Result<Vec<CostAggregateItem>, CostIntelError> {
        let conn = self.lock()?;
        let (where_sql, params) = where_clause(filters);
        let columns: Vec<&str> = dimensions.iter().map(|d| dimension_column(*d)).collect();

        let mut sql = String::from("SELECT ");
        for column in &columns {
            sql.push_str(column);
            sql.push_str(", ");
        }
        sql.push_str(&format!("{} {} {}", CENTS_SUM, BASE_JOINS, where_sql));
        if !columns.is_empty() {
            let grouping = columns.join(", ");
            sql.push_str(&format!(" GROUP BY {} ORDER BY {}", grouping, grouping));
        }

        collect_rows(&conn, &sql, &params, |row| {
            let mut item = CostAggregateItem::default();
            for (idx, dimension) in dimensions.iter().enumerate() {
                match dimension {
                    Dimension::Month => item.month = Some(row.get(idx)?),
                    Dimension::CostCenter => item.cost_center = Some(row.get(idx)?),
                    Dimension::Project => item.project = Some(row.get(idx)?),
                    Dimension::Category => item.category = Some(row.get(idx)?),
                }
            }
            item.total_amount = cents(row, dimensions.len())?;
            Ok(item)
        })
    }

    fn simulation_matrix(&self, filters: &CostFilters) -> Result<Vec<MatrixRow>, CostIntelError> {
        let conn = self.lock()?;
        let (where_sql, params) = where_clause(filters);
        let sql = format!(
            "SELECT cc.id, cc.name, c.id, c.name, {} {} {}
             GROUP BY cc.id, cc.name, c.id, c.name
             ORDER BY cc.name, c.name",
            CENTS_SUM, BASE_JOINS, where_sql
        );
        collect_rows(&conn, &sql, &params, |row| {
            Ok(MatrixRow {
                cost_center_id: row.get(0)?,
                cost_center_name: row.get(1)?,
                category_id: row.get(2)?,
                category_name: row.get(3)?,
                total_amount: cents(row, 4)?,
            })
        })
    }

    fn bucket_totals(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BucketTotal>, CostIntelError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT cc.name, c.name, {}
             FROM cost_entries e
             JOIN cost_centers cc ON cc.id = e.cost_center_id
             JOIN categories c ON c.id = e.category_id
             WHERE e.reference_date BETWEEN ? AND ?
             GROUP BY cc.name, c.name
             ORDER BY cc.name, c.name",
            CENTS_SUM
        );
        collect_rows(&conn, &sql, &[date_value(start), date_value(end)], |row| {
            Ok(BucketTotal {
                cost_center: row.get(0)?,
                category: row.get(1)?,
                total_amount: cents(row, 2)?,
            })
        })
    }

    fn monthly_bucket_totals(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MonthlyBucketTotal>, CostIntelError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {month}, cc.name, c.name, {sum}
             FROM cost_entries e
             JOIN cost_centers cc ON cc.id = e.cost_center_id
             JOIN categories c ON c.id = e.category_id
             WHERE e.reference_date BETWEEN ? AND ?
             GROUP BY {month}, cc.name, c.name
             ORDER BY {month}, cc.name, c.name",
            month = MONTH_EXPR,
            sum = CENTS_SUM
        );
        collect_rows(&conn, &sql, &[date_value(start), date_value(end)], |row| {
            Ok(MonthlyBucketTotal {
                month: row.get(0)?,
                cost_center: row.get(1)?,
                category: row.get(2)?,
                total_amount: cents(row, 3)?,
            })
        })
    }

    fn budget_vs_actual(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        cost_center_ids: &[i64],
    ) -> Result<Vec<BudgetActualRow>, CostIntelError> {
        let conn = self.lock()?;
        let mut params = vec![date_value(start), date_value(end), date_value(start), date_value(end)];
        let mut clauses = Vec::new();
        id_list("cc.id", cost_center_ids, &mut clauses, &mut params);
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!(
            "SELECT cc.id, cc.name,
                    COALESCE(b.planned_cents, 0),
                    COALESCE(a.actual_cents, 0)
             FROM cost_centers cc
             LEFT JOIN (
                 SELECT cost_center_id, SUM(CAST(ROUND(planned_amount * 100) AS INTEGER)) AS planned_cents
                 FROM budget_entries
                 WHERE month_date BETWEEN ? AND ? AND cost_center_id IS NOT NULL
                 GROUP BY cost_center_id
             ) b ON b.cost_center_id = cc.id
             LEFT JOIN (
                 SELECT cost_center_id, SUM(CAST(ROUND(amount * 100) AS INTEGER)) AS actual_cents
                 FROM cost_entries
                 WHERE reference_date BETWEEN ? AND ?
                 GROUP BY cost_center_id
             ) a ON a.cost_center_id = cc.id
             {}
             ORDER BY cc.name",
            where_sql
        );
        collect_rows(&conn, &sql, &params, |row| {
            Ok(BudgetActualRow {
                cost_center_id: row.get(0)?,
                cost_center: row.get(1)?,
                planned_amount: cents(row, 2)?,
                actual_amount: cents(row, 3)?,
            })
        })
    }

    fn list_dimension(&self, kind: DimensionKind) -> Result<Vec<DimensionItem>, CostIntelError> {
        let conn = self.lock()?;
        let sql = format!("SELECT id, code, name FROM {} ORDER BY name", kind.table());
        collect_rows(&conn, &sql, &[], |row| {
            Ok(DimensionItem {
                id: row.get(0)?,
                code: row.get(1)?,
                name: row.get(2)?,
            })
        })
    }
}
