//! Settings models feeding the summary income and goal figures.

use serde::{Deserialize, Serialize};

/// Per-user settings row. Every household member has one; the set of rows
/// doubles as the membership registry for family-scope reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_id: String,
    pub salary_monthly: f64,
    pub saving_goal_monthly: Option<f64>,
    pub currency: String,
}

/// Singleton household settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdSettings {
    pub saving_goal_monthly: f64,
    pub currency: String,
}
