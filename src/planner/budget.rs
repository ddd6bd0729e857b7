//! Peso budget estimates for a trip.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::{Budget, Destination, RouteInfo};

const LOW_BUDGET: i64 = 1000;
const MEDIUM_BUDGET: i64 = 2500;
const HIGH_BUDGET: i64 = 5000;
const FUEL_COST_PER_100KM: i64 = 500;
const COST_PER_EXTRA_DAY: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendCategory {
    Food,
    Accommodation,
    Activities,
    Other,
}

/// Which bucket a destination category's spend lands in.
pub fn spend_category(category: &str) -> SpendCategory {
    match category.trim().to_lowercase().as_str() {
        "restaurant" | "cafe" | "food shop" | "café/restaurant" | "shopping/restaurant"
        | "spa/restaurant" | "farm/restaurant" => SpendCategory::Food,
        "hotel" | "resort" | "accommodation" | "beach resort" | "hotel & resort" => {
            SpendCategory::Accommodation
        }
        "shopping" => SpendCategory::Other,
        _ => SpendCategory::Activities,
    }
}

/// Spend assumed for a destination that states no budget.
fn category_default(category: &str) -> Decimal {
    let amount = match category.trim().to_lowercase().as_str() {
        "restaurant" | "cafe" | "food shop" => 500,
        "hotel" | "resort" | "accommodation" | "beach resort" | "hotel & resort" => 3000,
        "museum" | "park" | "zoo" | "sports facility" | "golf course" => 200,
        _ => LOW_BUDGET,
    };
    Decimal::from(amount)
}

fn digits() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").expect("digit pattern is valid"))
}

/// Numeric value of a stated budget: the amount itself, the first run of
/// digits in the text, or the low/medium/high bucket the text names.
pub fn parse_budget(budget: &Budget) -> Decimal {
    match budget {
        Budget::Amount(amount) => Decimal::try_from(*amount).unwrap_or_default(),
        Budget::Label(label) => {
            let cleaned: String = label.chars().filter(|c| !matches!(c, '₱' | ',')).collect();
            if let Some(amount) = digits()
                .find(&cleaned)
                .and_then(|m| m.as_str().parse::<Decimal>().ok())
            {
                return amount;
            }
            let lower = label.to_lowercase();
            if lower.contains("low") {
                Decimal::from(LOW_BUDGET)
            } else if lower.contains("high") {
                Decimal::from(HIGH_BUDGET)
            } else {
                Decimal::from(MEDIUM_BUDGET)
            }
        }
    }
}

pub fn destination_budget(destination: &Destination) -> Decimal {
    match &destination.budget {
        Some(budget) if !budget.is_blank() => parse_budget(budget),
        _ => category_default(&destination.category),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub name: String,
    pub category: String,
    pub budget: Decimal,
    pub spend: SpendCategory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetBreakdown {
    pub destinations: Vec<BudgetLine>,
    pub accommodation: Decimal,
    pub food: Decimal,
    pub activities: Decimal,
    pub transportation: Decimal,
    pub other: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetEstimate {
    pub total: Decimal,
    pub breakdown: BudgetBreakdown,
}

fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Sums destination spend per bucket and adds a transportation estimate
/// from the route distance and the number of days.
pub fn estimate(
    destinations: &[Destination],
    route: Option<&RouteInfo>,
    travel_days: u32,
) -> BudgetEstimate {
    let mut breakdown = BudgetBreakdown::default();
    let mut subtotal = Decimal::ZERO;

    for destination in destinations {
        let amount = destination_budget(destination);
        let spend = spend_category(&destination.category);
        match spend {
            SpendCategory::Food => breakdown.food += amount,
            SpendCategory::Accommodation => breakdown.accommodation += amount,
            SpendCategory::Activities => breakdown.activities += amount,
            SpendCategory::Other => breakdown.other += amount,
        }
        subtotal += amount;
        breakdown.destinations.push(BudgetLine {
            name: destination.name.clone(),
            category: destination.category.clone(),
            budget: amount,
            spend,
        });
    }

    let mut transportation = round_half_up(subtotal * Decimal::new(1, 1));
    if let Some(route) = route {
        let distance = Decimal::try_from(route.distance_km).unwrap_or_default();
        let fuel = round_half_up(distance / Decimal::from(100) * Decimal::from(FUEL_COST_PER_100KM));
        transportation = transportation.max(fuel);
    }
    transportation += Decimal::from(travel_days.saturating_sub(1)) * Decimal::from(COST_PER_EXTRA_DAY);
    breakdown.transportation = transportation;

    BudgetEstimate {
        total: subtotal + transportation,
        breakdown,
    }
}

/// `₱12,345` style amount with thousands separators and up to two decimals.
pub fn format_peso(amount: Decimal) -> String {
    let rounded = amount.round_dp(2).normalize();
    let text = rounded.abs().to_string();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    match fraction {
        Some(fraction) => format!("{sign}₱{grouped}.{fraction}"),
        None => format!("{sign}₱{grouped}"),
    }
}

/// Formats a budget as the backend stored it, which may be a number, a
/// preformatted string, or free text.
pub fn format_budget(budget: Option<&Budget>) -> String {
    match budget {
        None => "₱0".to_string(),
        Some(budget) if budget.is_blank() => "₱0".to_string(),
        Some(Budget::Amount(amount)) => format_peso(Decimal::try_from(*amount).unwrap_or_default()),
        Some(Budget::Label(label)) => {
            let cleaned: String = label.chars().filter(|c| !matches!(c, '$' | '₱')).collect();
            let numeric: String = cleaned
                .trim()
                .chars()
                .filter(|c| *c != ',')
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            match numeric.parse::<Decimal>() {
                Ok(amount) => format_peso(amount),
                Err(_) => format!("₱{cleaned}"),
            }
        }
    }
}

/// Wire representation of an amount; the backend expects plain numbers.
pub fn to_number(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or_default()
}
