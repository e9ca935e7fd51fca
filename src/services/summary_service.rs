//! Month read views: transaction lists and the aggregated summary.

use sqlx::sqlite::SqlitePool;

use crate::db;
use crate::error::CommitError;
use crate::models::summary::Summary;
use crate::models::transaction::{Scope, TransactionRecord};
use crate::utils::month;

fn parse_month(value: &str) -> Result<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>), CommitError> {
    month::month_range(value)
        .ok_or_else(|| CommitError::validation("month", "invalid month, use YYYY-MM"))
}

/// Users whose transactions contribute to a read view for this scope.
async fn scope_user_ids(
    pool: &SqlitePool,
    user_id: &str,
    scope: Scope,
) -> Result<Vec<String>, CommitError> {
    match scope {
        Scope::Personal => Ok(vec![user_id.to_string()]),
        Scope::Family => {
            let mut members = db::settings::list_member_ids(pool).await?;
            if !members.iter().any(|m| m == user_id) {
                members.push(user_id.to_string());
            }
            Ok(members)
        }
    }
}

/// Transactions for a month and scope, newest first.
pub async fn list_transactions(
    pool: &SqlitePool,
    user_id: &str,
    month: &str,
    scope: Scope,
) -> Result<Vec<TransactionRecord>, CommitError> {
    let (start, end) = parse_month(month)?;
    let user_ids = scope_user_ids(pool, user_id, scope).await?;

    Ok(db::transaction::list_for_month(pool, &user_ids, start, end).await?)
}

/// Aggregated summary for a month and scope. Income is the sum of in-scope
/// salaries; the goal is the household goal for family scope, else the
/// user's own goal falling back to the household's.
pub async fn month_summary(
    pool: &SqlitePool,
    user_id: &str,
    month: &str,
    scope: Scope,
) -> Result<Summary, CommitError> {
    let (start, end) = parse_month(month)?;
    let user_ids = scope_user_ids(pool, user_id, scope).await?;

    let transactions = db::transaction::list_for_month(pool, &user_ids, start, end).await?;
    let settings_rows = db::settings::settings_for_users(pool, &user_ids).await?;
    let household = db::settings::get_or_create_household(pool).await?;

    let income_total: f64 = settings_rows.iter().map(|s| s.salary_monthly).sum();
    let goal_monthly = match scope {
        Scope::Family => household.saving_goal_monthly,
        Scope::Personal => settings_rows
            .iter()
            .find(|s| s.user_id == user_id)
            .and_then(|s| s.saving_goal_monthly)
            .unwrap_or(household.saving_goal_monthly),
    };

    Ok(Summary::build(
        income_total,
        goal_monthly,
        transactions.iter().map(|t| (t.tx_type, t.amount)),
    ))
}
