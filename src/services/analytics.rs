use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use super::provider::{CostDataProvider, MonthlyBucketTotal};
use super::stats::{as_f64, mean, percent_of, population_std, to_decimal};
use crate::errors::CostIntelError;
use crate::models::{
    AnomalyDetectionResponse, AnomalyItem, QuickWinOpportunity, QuickWinsResponse, WasteRankingItem,
    WasteRankingResponse,
};

/// Minimum comparison window for waste ranking, in days.
pub const MIN_COMPARISON_DAYS: i64 = 30;

// Opportunity score weights: each component is capped, caps sum to 100.
const SPEND_CAP: Decimal = Decimal::from_parts(55, 0, 0, false, 0);
const SPEND_WEIGHT: Decimal = Decimal::from_parts(140, 0, 0, false, 0);
const TREND_CAP: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
const TREND_WEIGHT: Decimal = Decimal::from_parts(7, 0, 0, false, 1);
const VOLATILITY_CAP: Decimal = Decimal::from_parts(15, 0, 0, false, 0);
const VOLATILITY_WEIGHT: Decimal = Decimal::from_parts(35, 0, 0, false, 2);

/// Composite (cost center, category) grouping key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    pub cost_center: String,
    pub category: String,
}

impl BucketKey {
    pub fn new(cost_center: &str, category: &str) -> Self {
        Self {
            cost_center: cost_center.to_string(),
            category: category.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnomalyQuery {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub threshold_z: f64,
    pub history_window: usize,
    pub top_n: usize,
}

#[derive(Debug, Clone)]
pub struct QuickWinQuery {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub target_reduction_percent: Decimal,
    pub minimum_total: Decimal,
    pub top_n: usize,
}

/// Group monthly rows into per-bucket series sorted by month.
pub fn group_monthly_series(rows: Vec<MonthlyBucketTotal>) -> BTreeMap<BucketKey, Vec<(NaiveDate, Decimal)>> {
    let mut grouped: BTreeMap<BucketKey, Vec<(NaiveDate, Decimal)>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(BucketKey::new(&row.cost_center, &row.category))
            .or_default()
            .push((row.month, row.total_amount));
    }
    for series in grouped.values_mut() {
        series.sort_by_key(|(month, _)| *month);
    }
    grouped
}

/// A spike detected at `index` of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct Spike {
    pub index: usize,
    pub mean: Decimal,
    pub std: f64,
    pub z_score: f64,
}

/// Scan a series with a trailing window of `window` points and return every
/// upward spike with z >= `threshold_z`. The first `window` points are never
/// candidates and dips are never reported.
pub fn detect_spikes(amounts: &[Decimal], window: usize, threshold_z: f64) -> Vec<Spike> {
    let mut spikes = Vec::new();
    if window < 2 {
        return spikes;
    }
    for index in window..amounts.len() {
        let history = &amounts[index - window..index];
        let (Some(avg), Some(std)) = (mean(history), population_std(history)) else {
            continue;
        };
        if std == 0.0 {
            continue;
        }
        let current = amounts[index];
        let z_score = as_f64(current - avg) / std;
        if z_score >= threshold_z && current > avg {
            spikes.push(Spike { index, mean: avg, std, z_score });
        }
    }
    spikes
}

/// Weighted, capped composite favoring concentrated, rising, volatile spend.
/// `concentration` is a fraction of the portfolio, the other inputs are
/// percentages.
pub fn opportunity_score(concentration: Decimal, trend_percent: Decimal, volatility: Decimal) -> Decimal {
    let spend = (concentration * SPEND_WEIGHT).min(SPEND_CAP);
    let trend = (trend_percent.max(Decimal::ZERO) * TREND_WEIGHT).min(TREND_CAP);
    let vol = (volatility * VOLATILITY_WEIGHT).min(VOLATILITY_CAP);
    spend + trend + vol
}

/// Waste ranking, anomaly detection and quick-win scoring.
pub struct AnalyticsService<'a> {
    provider: &'a dyn CostDataProvider,
}

impl<'a> AnalyticsService<'a> {
    pub fn new(provider: &'a dyn CostDataProvider) -> Self {
        Self { provider }
    }

    /// Compare each bucket's spend in the period against an equally long (at
    /// least 30 days, or `comparison_days`) window ending the day before.
    pub fn waste_ranking(
        &self,
        period_start: NaiveDate,
        period_end: NaiveDate,
        comparison_days: Option<u32>,
        top_n: usize,
    ) -> Result<WasteRankingResponse, CostIntelError> {
        let period_days = (period_end - period_start).num_days() + 1;
        let days = comparison_days
            .filter(|d| *d > 0)
            .map(i64::from)
            .unwrap_or_else(|| period_days.max(MIN_COMPARISON_DAYS));
        let comparison_end = period_start
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| CostIntelError::validation("period_start leaves no room for a comparison window"))?;
        let comparison_start = comparison_end
            .checked_sub_days(Days::new(days.unsigned_abs().saturating_sub(1)))
            .ok_or_else(|| CostIntelError::validation("comparison window starts before the supported date range"))?;

        let current = self.provider.bucket_totals(period_start, period_end)?;
        let previous: HashMap<BucketKey, Decimal> = self
            .provider
            .bucket_totals(comparison_start, comparison_end)?
            .into_iter()
            .map(|row| (BucketKey::new(&row.cost_center, &row.category), row.total_amount))
            .collect();

        let mut items: Vec<WasteRankingItem> = current
            .into_iter()
            .map(|row| {
                let key = BucketKey::new(&row.cost_center, &row.category);
                let previous_total = previous.get(&key).copied().unwrap_or_default();
                let delta = row.total_amount - previous_total;
                WasteRankingItem {
                    cost_center: row.cost_center,
                    category: row.category,
                    previous_period_total: previous_total.round_dp(2),
                    current_period_total: row.total_amount.round_dp(2),
                    estimated_waste: delta.max(Decimal::ZERO).round_dp(2),
                    variation_percent: percent_of(delta, previous_total, Decimal::ONE_HUNDRED).round_dp(2),
                }
            })
            .collect();

        items.sort_by(|a, b| b.estimated_waste.cmp(&a.estimated_waste));
        items.truncate(top_n);
        debug!(items = items.len(), comparison_days = days, "Computed waste ranking");

        Ok(WasteRankingResponse {
            period_start,
            period_end,
            comparison_start,
            comparison_end,
            items,
        })
    }

    pub fn detect_anomalies(&self, query: &AnomalyQuery) -> Result<AnomalyDetectionResponse, CostIntelError> {
        let rows = self.provider.monthly_bucket_totals(query.period_start, query.period_end)?;
        let grouped = group_monthly_series(rows);

        let mut items = Vec::new();
        for (key, series) in &grouped {
            let amounts: Vec<Decimal> = series.iter().map(|(_, amount)| *amount).collect();
            for spike in detect_spikes(&amounts, query.history_window, query.threshold_z) {
                items.push(AnomalyItem {
                    month: series[spike.index].0,
                    cost_center: key.cost_center.clone(),
                    category: key.category.clone(),
                    amount: amounts[spike.index].round_dp(2),
                    baseline_mean: spike.mean.round_dp(2),
                    baseline_std: to_decimal(spike.std).round_dp(2),
                    z_score: to_decimal(spike.z_score).round_dp(2),
                });
            }
        }

        items.sort_by(|a, b| b.z_score.cmp(&a.z_score));
        items.truncate(query.top_n);
        debug!(series = grouped.len(), anomalies = items.len(), "Anomaly scan complete");

        Ok(AnomalyDetectionResponse {
            period_start: query.period_start,
            period_end: query.period_end,
            threshold_z: query.threshold_z,
            history_window: query.history_window,
            items,
        })
    }

    pub fn quick_wins(&self, query: &QuickWinQuery) -> Result<QuickWinsResponse, CostIntelError> {
        let rows = self.provider.monthly_bucket_totals(query.period_start, query.period_end)?;
        let portfolio_total: Decimal = rows.iter().map(|r| r.total_amount).sum();
        let grouped = group_monthly_series(rows);

        let mut items = Vec::new();
        for (key, series) in grouped {
            let amounts: Vec<Decimal> = series.iter().map(|(_, amount)| *amount).collect();
            let period_total: Decimal = amounts.iter().sum();
            if period_total < query.minimum_total {
                continue;
            }

            let monthly_average = mean(&amounts).unwrap_or_default();
            let latest = amounts.last().copied().unwrap_or_default();
            let baseline_samples = if amounts.len() > 1 { &amounts[..amounts.len() - 1] } else { &amounts[..] };
            let baseline_average = mean(baseline_samples).unwrap_or_default();
            let trend_percent = percent_of(latest - baseline_average, baseline_average, Decimal::ZERO);

            let std = if amounts.len() > 1 { population_std(&amounts).unwrap_or(0.0) } else { 0.0 };
            let volatility = percent_of(to_decimal(std), monthly_average, Decimal::ZERO);
            let concentration = period_total.checked_div(portfolio_total).unwrap_or_default();

            items.push(QuickWinOpportunity {
                cost_center: key.cost_center,
                category: key.category,
                period_total: period_total.round_dp(2),
                monthly_average: monthly_average.round_dp(2),
                trend_percent: trend_percent.round_dp(2),
                volatility: volatility.round_dp(2),
                opportunity_score: opportunity_score(concentration, trend_percent, volatility).round_dp(2),
                estimated_savings: (period_total * query.target_reduction_percent / Decimal::ONE_HUNDRED).round_dp(2),
            });
        }

        items.sort_by(|a, b| {
            b.opportunity_score
                .cmp(&a.opportunity_score)
                .then(b.estimated_savings.cmp(&a.estimated_savings))
        });
        items.truncate(query.top_n);
        debug!(items = items.len(), portfolio_total = %portfolio_total, "Scored quick wins");

        Ok(QuickWinsResponse {
            period_start: query.period_start,
            period_end: query.period_end,
            target_reduction_percent: query.target_reduction_percent,
            minimum_total: query.minimum_total,
            items,
        })
    }
}
