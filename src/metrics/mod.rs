//! Business-counter arithmetic for the dashboards.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::database::models::{DailyMetric, LeadExpense};

/// Counters submitted for one day. `metric_date` defaults to today.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyMetricInput {
    pub metric_date: Option<NaiveDate>,
    #[serde(default)]
    pub leads: i32,
    #[serde(default)]
    pub calls: i32,
    #[serde(default)]
    pub contacts: i32,
    #[serde(default)]
    pub scheduled: i32,
    #[serde(default)]
    pub sits: i32,
    #[serde(default)]
    pub sales: i32,
    #[serde(default)]
    pub ap: Decimal,
}

impl DailyMetricInput {
    /// Field errors keyed by field name; empty when the input is acceptable.
    pub fn validate(&self) -> HashMap<String, String> {
        let counters = [
            ("leads", self.leads),
            ("calls", self.calls),
            ("contacts", self.contacts),
            ("scheduled", self.scheduled),
            ("sits", self.sits),
            ("sales", self.sales),
        ];

        let mut errors: HashMap<String, String> = counters
            .iter()
            .filter(|(_, v)| *v < 0)
            .map(|(name, _)| (name.to_string(), "must not be negative".to_string()))
            .collect();

        if self.ap.is_sign_negative() && !self.ap.is_zero() {
            errors.insert("ap".to_string(), "must not be negative".to_string());
        }

        errors
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricTotals {
    pub days: u32,
    pub leads: i64,
    pub calls: i64,
    pub contacts: i64,
    pub scheduled: i64,
    pub sits: i64,
    pub sales: i64,
    pub ap: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRatios {
    /// contacts / calls
    pub contact_rate: Option<f64>,
    /// scheduled / contacts
    pub appointment_rate: Option<f64>,
    /// sits / scheduled
    pub show_rate: Option<f64>,
    /// sales / sits
    pub close_rate: Option<f64>,
    /// ap / sales
    pub average_premium: Option<Decimal>,
}

impl MetricTotals {
    pub fn from_snapshots<'a, I>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = &'a DailyMetric>,
    {
        snapshots.into_iter().fold(Self::default(), |mut acc, m| {
            acc.days += 1;
            acc.leads += i64::from(m.leads);
            acc.calls += i64::from(m.calls);
            acc.contacts += i64::from(m.contacts);
            acc.scheduled += i64::from(m.scheduled);
            acc.sits += i64::from(m.sits);
            acc.sales += i64::from(m.sales);
            acc.ap += m.ap;
            acc
        })
    }

    pub fn ratios(&self) -> MetricRatios {
        MetricRatios {
            contact_rate: ratio(self.contacts, self.calls),
            appointment_rate: ratio(self.scheduled, self.contacts),
            show_rate: ratio(self.sits, self.scheduled),
            close_rate: ratio(self.sales, self.sits),
            average_premium: (self.sales > 0).then(|| (self.ap / Decimal::from(self.sales)).round_dp(2)),
        }
    }
}

fn ratio(numerator: i64, denominator: i64) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub members: usize,
    pub totals: MetricTotals,
    pub ratios: MetricRatios,
}

impl MetricSummary {
    pub fn build(from: Option<NaiveDate>, to: Option<NaiveDate>, members: usize, snapshots: &[DailyMetric]) -> Self {
        let totals = MetricTotals::from_snapshots(snapshots);
        let ratios = totals.ratios();
        Self {
            from,
            to,
            members,
            totals,
            ratios,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadCostSummary {
    pub total_spend: Decimal,
    pub leads_purchased: i64,
    pub cost_per_lead: Option<Decimal>,
}

impl LeadCostSummary {
    pub fn from_expenses(expenses: &[LeadExpense]) -> Self {
        let total_spend: Decimal = expenses.iter().map(|e| e.amount).sum();
        let leads_purchased: i64 = expenses.iter().map(|e| i64::from(e.lead_count)).sum();
        let cost_per_lead = (leads_purchased > 0).then(|| (total_spend / Decimal::from(leads_purchased)).round_dp(2));

        Self {
            total_spend,
            leads_purchased,
            cost_per_lead,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;
    use uuid::Uuid;

    fn day(calls: i32, contacts: i32, scheduled: i32, sits: i32, sales: i32, ap: &str) -> DailyMetric {
        DailyMetric {
            user_id: Uuid::new_v4(),
            metric_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            leads: 10,
            calls,
            contacts,
            scheduled,
            sits,
            sales,
            ap: Decimal::from_str(ap).unwrap(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sums_fieldwise() {
        let snapshots = vec![day(40, 10, 4, 3, 1, "1200.50"), day(60, 20, 6, 5, 2, "2400.00")];
        let totals = MetricTotals::from_snapshots(&snapshots);
        assert_eq!(totals.days, 2);
        assert_eq!(totals.leads, 20);
        assert_eq!(totals.calls, 100);
        assert_eq!(totals.sales, 3);
        assert_eq!(totals.ap, Decimal::from_str("3600.50").unwrap());
    }

    #[test]
    fn ratios_guard_zero_denominators() {
        let totals = MetricTotals::from_snapshots(&[day(0, 0, 0, 0, 0, "0")]);
        let ratios = totals.ratios();
        assert_eq!(ratios.contact_rate, None);
        assert_eq!(ratios.close_rate, None);
        assert_eq!(ratios.average_premium, None);
    }

    #[test]
    fn ratios_divide() {
        let totals = MetricTotals::from_snapshots(&[day(100, 25, 10, 8, 2, "3000")]);
        let ratios = totals.ratios();
        assert_eq!(ratios.contact_rate, Some(0.25));
        assert_eq!(ratios.show_rate, Some(0.8));
        assert_eq!(ratios.close_rate, Some(0.25));
        assert_eq!(ratios.average_premium, Some(Decimal::from(1500)));
    }

    #[test]
    fn empty_range_is_all_zero() {
        let summary = MetricSummary::build(None, None, 0, &[]);
        assert_eq!(summary.totals, MetricTotals::default());
        assert_eq!(summary.totals.days, 0);
    }

    #[test]
    fn rejects_negative_counters() {
        let input = DailyMetricInput {
            calls: -1,
            ap: Decimal::from(-5),
            ..Default::default()
        };
        let errors = input.validate();
        assert!(errors.contains_key("calls"));
        assert!(errors.contains_key("ap"));
        assert!(!errors.contains_key("leads"));

        assert!(DailyMetricInput::default().validate().is_empty());
    }

    #[test]
    fn cost_per_lead() {
        let expense = |amount: &str, leads: i32| LeadExpense {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            expense_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            lead_count: leads,
            amount: Decimal::from_str(amount).unwrap(),
            vendor: None,
            created_at: Utc::now(),
        };

        let summary = LeadCostSummary::from_expenses(&[expense("250.00", 10), expense("50.00", 5)]);
        assert_eq!(summary.total_spend, Decimal::from(300));
        assert_eq!(summary.leads_purchased, 15);
        assert_eq!(summary.cost_per_lead, Some(Decimal::from(20)));

        let none = LeadCostSummary::from_expenses(&[expense("99.00", 0)]);
        assert_eq!(none.cost_per_lead, None);
    }
}
