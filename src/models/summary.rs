// SPDX-License-Identifier: MIT

//! Derived tracker aggregates for the dashboard.
//!
//! Everything here is recomputed from the transaction list on request;
//! nothing is persisted.

use crate::models::transaction::{PaymentMethod, Transaction};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-method aggregate block.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MethodStats {
    pub count: u32,
    pub total_received: f64,
    pub total_profit: f64,
}

/// One point in the profit-over-time series.
#[derive(Debug, Clone, Serialize)]
pub struct ProfitPoint {
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub profit: f64,
    /// Running total up to and including this day.
    pub cumulative_profit: f64,
    /// Orders recorded that day.
    pub orders: u32,
}

/// Per-method earnings over the trailing seven days.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyEarnings {
    pub method: PaymentMethod,
    pub total_received: f64,
    pub total_profit: f64,
}

/// The full dashboard aggregate, computed in one pass over the
/// transaction list.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerSummary {
    pub total_profit: f64,
    pub transaction_count: u32,
    pub by_method: BTreeMap<String, MethodStats>,
    pub profit_over_time: Vec<ProfitPoint>,
    pub weekly_earnings: Vec<WeeklyEarnings>,
    pub today_profit: f64,
    pub today_order_count: u32,
    pub daily_goal: u32,
}

fn method_name(method: PaymentMethod) -> String {
    // serde's plain variant name, without the quotes
    match method {
        PaymentMethod::CashApp => "CashApp",
        PaymentMethod::Zelle => "Zelle",
        PaymentMethod::ApplePay => "ApplePay",
        PaymentMethod::PayPal => "PayPal",
        PaymentMethod::Crypto => "Crypto",
    }
    .to_string()
}

fn day_of(timestamp: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

impl TrackerSummary {
    pub fn from_transactions(
        transactions: &[Transaction],
        daily_goal: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let today = now.date_naive();
        let week_start = today - Duration::days(6);

        let mut by_method: BTreeMap<String, MethodStats> = BTreeMap::new();
        for method in PaymentMethod::ALL {
            by_method.insert(method_name(method), MethodStats::default());
        }
        let mut weekly: BTreeMap<String, WeeklyEarnings> = BTreeMap::new();
        let mut per_day: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();

        let mut total_profit = 0.0;
        let mut today_profit = 0.0;
        let mut today_order_count = 0u32;

        for t in transactions {
            total_profit += t.profit;

            if let Some(stats) = by_method.get_mut(&method_name(t.method)) {
                stats.count += 1;
                stats.total_received += t.paid_to_me;
                stats.total_profit += t.profit;
            }

            let Some(day) = day_of(&t.timestamp) else {
                continue;
            };
            let day_entry = per_day.entry(day).or_insert((0.0, 0));
            day_entry.0 += t.profit;
            day_entry.1 += 1;

            if day == today {
                today_profit += t.profit;
                today_order_count += 1;
            }
            if day >= week_start && day <= today {
                let entry = weekly
                    .entry(method_name(t.method))
                    .or_insert_with(|| WeeklyEarnings {
                        method: t.method,
                        total_received: 0.0,
                        total_profit: 0.0,
                    });
                entry.total_received += t.paid_to_me;
                entry.total_profit += t.profit;
            }
        }

        let mut cumulative = 0.0;
        let profit_over_time = per_day
            .into_iter()
            .map(|(date, (profit, orders))| {
                cumulative += profit;
                ProfitPoint {
                    date: date.format("%Y-%m-%d").to_string(),
                    profit,
                    cumulative_profit: cumulative,
                    orders,
                }
            })
            .collect();

        Self {
            total_profit,
            transaction_count: transactions.len() as u32,
            by_method,
            profit_over_time,
            weekly_earnings: weekly.into_values().collect(),
            today_profit,
            today_order_count,
            daily_goal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tx(paid: f64, method: PaymentMethod, timestamp: &str) -> Transaction {
        Transaction::new(0.0, paid, method, timestamp)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_per_method_aggregates() {
        let transactions = vec![
            tx(50.0, PaymentMethod::CashApp, "2024-01-14T10:00:00Z"),
            tx(30.0, PaymentMethod::CashApp, "2024-01-15T09:00:00Z"),
            tx(20.0, PaymentMethod::Zelle, "2024-01-15T10:00:00Z"),
        ];

        let summary = TrackerSummary::from_transactions(&transactions, 100, now());

        let cashapp = &summary.by_method["CashApp"];
        assert_eq!(cashapp.count, 2);
        assert_eq!(cashapp.total_received, 80.0);
        assert_eq!(cashapp.total_profit, 80.0);
        // Methods with no transactions still appear, zeroed
        assert_eq!(summary.by_method["Crypto"].count, 0);
        assert_eq!(summary.total_profit, 100.0);
    }

    #[test]
    fn test_profit_over_time_is_cumulative_and_day_ordered() {
        let transactions = vec![
            tx(20.0, PaymentMethod::Zelle, "2024-01-15T10:00:00Z"),
            tx(50.0, PaymentMethod::CashApp, "2024-01-13T10:00:00Z"),
            tx(30.0, PaymentMethod::CashApp, "2024-01-13T18:00:00Z"),
        ];

        let summary = TrackerSummary::from_transactions(&transactions, 100, now());

        let series = &summary.profit_over_time;
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, "2024-01-13");
        assert_eq!(series[0].profit, 80.0);
        assert_eq!(series[0].cumulative_profit, 80.0);
        assert_eq!(series[0].orders, 2);
        assert_eq!(series[1].date, "2024-01-15");
        assert_eq!(series[1].cumulative_profit, 100.0);
        assert_eq!(series[1].orders, 1);
    }

    #[test]
    fn test_today_counters_and_goal() {
        let transactions = vec![
            tx(40.0, PaymentMethod::PayPal, "2024-01-15T08:00:00Z"),
            tx(25.0, PaymentMethod::PayPal, "2024-01-15T11:00:00Z"),
            tx(99.0, PaymentMethod::PayPal, "2024-01-14T11:00:00Z"),
        ];

        let summary = TrackerSummary::from_transactions(&transactions, 150, now());

        assert_eq!(summary.today_profit, 65.0);
        assert_eq!(summary.today_order_count, 2);
        assert_eq!(summary.daily_goal, 150);
    }

    #[test]
    fn test_weekly_window_excludes_older_transactions() {
        let transactions = vec![
            tx(10.0, PaymentMethod::Zelle, "2024-01-09T10:00:00Z"), // 6 days ago, in
            tx(99.0, PaymentMethod::Zelle, "2024-01-08T10:00:00Z"), // 7 days ago, out
        ];

        let summary = TrackerSummary::from_transactions(&transactions, 100, now());

        assert_eq!(summary.weekly_earnings.len(), 1);
        assert_eq!(summary.weekly_earnings[0].total_profit, 10.0);
    }

    #[test]
    fn test_unparseable_timestamp_is_skipped_from_series() {
        let transactions = vec![tx(10.0, PaymentMethod::Zelle, "not-a-date")];

        let summary = TrackerSummary::from_transactions(&transactions, 100, now());

        // Still counted in totals, just not placeable on the timeline
        assert_eq!(summary.total_profit, 10.0);
        assert!(summary.profit_over_time.is_empty());
    }
}
