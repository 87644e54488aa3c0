mod common;

use std::str::FromStr;

use agencyhub_api::database::models::{DailyMetric, LeadExpense};
use agencyhub_api::metrics::{LeadCostSummary, MetricSummary};
use agencyhub_api::types::DateRange;
use anyhow::Result;
use chrono::Utc;
use common::date;
use rust_decimal::Decimal;
use uuid::Uuid;

fn snapshot(user_id: Uuid, day: u32, calls: i32, contacts: i32, sales: i32, ap: &str) -> Result<DailyMetric> {
    Ok(DailyMetric {
        user_id,
        metric_date: date(2025, 4, day),
        leads: 5,
        calls,
        contacts,
        scheduled: contacts / 2,
        sits: sales,
        sales,
        ap: Decimal::from_str(ap)?,
        updated_at: Utc::now(),
    })
}

#[test]
fn team_summary_rolls_up_every_member() -> Result<()> {
    let (ana, bo) = (Uuid::new_v4(), Uuid::new_v4());
    let rows = vec![
        snapshot(ana, 1, 50, 10, 1, "900")?,
        snapshot(ana, 2, 30, 10, 0, "0")?,
        snapshot(bo, 1, 20, 0, 1, "600")?,
    ];

    let summary = MetricSummary::build(Some(date(2025, 4, 1)), Some(date(2025, 4, 30)), 2, &rows);
    assert_eq!(summary.members, 2);
    assert_eq!(summary.totals.days, 3);
    assert_eq!(summary.totals.calls, 100);
    assert_eq!(summary.totals.leads, 15);
    assert_eq!(summary.ratios.contact_rate, Some(0.2));
    assert_eq!(summary.ratios.average_premium, Some(Decimal::from(750)));
    Ok(())
}

#[test]
fn lead_cost_rounds_to_cents() -> Result<()> {
    let user_id = Uuid::new_v4();
    let expense = |amount: &str, lead_count: i32| -> Result<LeadExpense> {
        Ok(LeadExpense {
            id: Uuid::new_v4(),
            user_id,
            expense_date: date(2025, 4, 2),
            lead_count,
            amount: Decimal::from_str(amount)?,
            vendor: Some("LeadCo".to_string()),
            created_at: Utc::now(),
        })
    };

    let summary = LeadCostSummary::from_expenses(&[expense("100.00", 3)?, expense("0", 0)?]);
    assert_eq!(summary.leads_purchased, 3);
    assert_eq!(summary.cost_per_lead, Some(Decimal::from_str("33.33")?));

    let empty = LeadCostSummary::from_expenses(&[]);
    assert_eq!(empty.cost_per_lead, None);
    Ok(())
}

#[test]
fn inverted_ranges_are_rejected() -> Result<()> {
    let ok = DateRange {
        from: Some(date(2025, 4, 1)),
        to: Some(date(2025, 4, 30)),
    };
    let inverted = DateRange {
        from: Some(date(2025, 5, 1)),
        to: Some(date(2025, 4, 1)),
    };
    assert!(ok.is_valid());
    assert!(!inverted.is_valid());
    Ok(())
}
