//! Settings rows feeding the summary figures. The per-user rows double as
//! the household membership registry for family-scope reads.

use sqlx::sqlite::SqlitePool;

use crate::models::settings::{HouseholdSettings, UserSettings};

const USER_COLUMNS: &str = "user_id, salary_monthly, saving_goal_monthly, currency";

/// Fetch a user's settings, creating the default row if missing.
pub async fn get_or_create_user_settings(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<UserSettings, sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO user_settings (user_id) VALUES (?)")
        .bind(user_id)
        .execute(pool)
        .await?;

    sqlx::query_as::<_, UserSettings>(&format!(
        "SELECT {USER_COLUMNS} FROM user_settings WHERE user_id = ?"
    ))
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Create or replace a user's settings.
pub async fn upsert_user_settings(
    pool: &SqlitePool,
    settings: &UserSettings,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_settings (user_id, salary_monthly, saving_goal_monthly, currency) \
         VALUES (?, ?, ?, ?) \
         ON CONFLICT (user_id) DO UPDATE SET \
             salary_monthly = excluded.salary_monthly, \
             saving_goal_monthly = excluded.saving_goal_monthly, \
             currency = excluded.currency",
    )
    .bind(&settings.user_id)
    .bind(settings.salary_monthly)
    .bind(settings.saving_goal_monthly)
    .bind(&settings.currency)
    .execute(pool)
    .await?;

    Ok(())
}

/// Every user with a settings row, i.e. every household member.
pub async fn list_member_ids(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_id FROM user_settings ORDER BY user_id")
        .fetch_all(pool)
        .await
}

/// Settings rows for a set of users.
pub async fn settings_for_users(
    pool: &SqlitePool,
    user_ids: &[String],
) -> Result<Vec<UserSettings>, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(vec![]);
    }

    let placeholders = vec!["?"; user_ids.len()].join(", ");
    let query_str = format!(
        "SELECT {USER_COLUMNS} FROM user_settings WHERE user_id IN ({placeholders})"
    );

    let mut query = sqlx::query_as::<_, UserSettings>(&query_str);
    for user_id in user_ids {
        query = query.bind(user_id);
    }

    query.fetch_all(pool).await
}

/// Fetch the household settings singleton, creating defaults if missing.
pub async fn get_or_create_household(pool: &SqlitePool) -> Result<HouseholdSettings, sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO household_settings (id) VALUES (1)")
        .execute(pool)
        .await?;

    sqlx::query_as::<_, HouseholdSettings>(
        "SELECT saving_goal_monthly, currency FROM household_settings WHERE id = 1",
    )
    .fetch_one(pool)
    .await
}

/// Update the household settings singleton.
pub async fn upsert_household(
    pool: &SqlitePool,
    saving_goal_monthly: f64,
    currency: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO household_settings (id, saving_goal_monthly, currency) VALUES (1, ?, ?) \
         ON CONFLICT (id) DO UPDATE SET \
             saving_goal_monthly = excluded.saving_goal_monthly, \
             currency = excluded.currency",
    )
    .bind(saving_goal_monthly)
    .bind(currency)
    .execute(pool)
    .await?;

    Ok(())
}
