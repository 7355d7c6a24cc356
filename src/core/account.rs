//! Account business logic - Chart-of-accounts lookups and settlement rules.
//!
//! Provides account and rule lookups for the reconciliation engine, plus the
//! payment-date function that dates rule-generated settlement deals.

use crate::{
    entities::{Account, AccountRule, AssetType, account, account_rule},
    errors::{Error, Result},
};
use chrono::{Datelike, Months, NaiveDate};
use sea_orm::{ConnectionTrait, Set, prelude::*};
use tracing::info;

/// Finds an account by id, failing with [`Error::AccountNotFound`] when absent.
///
/// This is the lookup the reconciliation engine uses for both sides of a deal,
/// so a dangling account id aborts the enclosing transaction.
pub async fn get_account<C>(db: &C, id: i64) -> Result<account::Model>
where
    C: ConnectionTrait,
{
    Account::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::AccountNotFound { id })
}

/// Finds an account by id, returning None when absent.
pub async fn find_account<C>(db: &C, id: i64) -> Result<Option<account::Model>>
where
    C: ConnectionTrait,
{
    Account::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Returns the settlement rule owned by an account, if any.
///
/// Always queries fresh; rule evaluation happens inside the save transaction
/// and must not observe a stale rule.
pub async fn rule_for<C>(db: &C, account_id: i64) -> Result<Option<account_rule::Model>>
where
    C: ConnectionTrait,
{
    AccountRule::find()
        .filter(account_rule::Column::AccountId.eq(account_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new account in a user's chart of accounts.
pub async fn create_account<C>(
    db: &C,
    user_id: i64,
    name: &str,
    asset_type: AssetType,
) -> Result<account::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "account name cannot be empty".to_string(),
        });
    }

    let account = account::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.trim().to_string()),
        asset_type: Set(asset_type),
        ..Default::default()
    };

    let result = account.insert(db).await?;
    info!(account_id = result.id, name = %result.name, "created account");
    Ok(result)
}

/// Attaches a settlement rule to an account.
///
/// The rule routes postings against `account_id` into a settlement deal on
/// `associated_account_id`, dated `month_shift` months later on `payment_day`.
pub async fn create_rule<C>(
    db: &C,
    account_id: i64,
    associated_account_id: i64,
    month_shift: i32,
    payment_day: u32,
) -> Result<account_rule::Model>
where
    C: ConnectionTrait,
{
    if account_id == associated_account_id {
        return Err(Error::Config {
            message: format!("account {account_id} cannot settle against itself"),
        });
    }
    // both ends must exist up front
    get_account(db, account_id).await?;
    get_account(db, associated_account_id).await?;

    let rule = account_rule::ActiveModel {
        account_id: Set(account_id),
        associated_account_id: Set(associated_account_id),
        month_shift: Set(month_shift),
        payment_day: Set(payment_day),
        ..Default::default()
    };

    rule.insert(db).await.map_err(Into::into)
}

/// Applies a rule's date-shift function to a posting date.
///
/// The result is `date` moved forward by the rule's `month_shift` calendar
/// months, with the day-of-month set to `payment_day` clamped to the length
/// of the target month (a day-31 rule lands on Feb 28/29).
#[must_use]
pub fn payment_date(rule: &account_rule::Model, date: NaiveDate) -> NaiveDate {
    let shifted = if rule.month_shift >= 0 {
        date.checked_add_months(Months::new(rule.month_shift.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(rule.month_shift.unsigned_abs()))
    }
    .unwrap_or(date);

    let day = rule.payment_day.clamp(1, days_in_month(shifted.year(), shifted.month()));
    shifted.with_day(day).unwrap_or(shifted)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(28, |last| last.day())
}
