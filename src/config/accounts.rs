//! Chart-of-accounts seeding from accounts.toml.
//!
//! Loads the initial chart of accounts, including settlement rules, from a
//! TOML file and seeds the database with it on first run or when accounts
//! are missing. Rules reference their associated account by name; a name
//! that resolves to nothing is a configuration error.

use crate::core::account::{create_account, create_rule, rule_for};
use crate::entities::{Account, AssetType, account};
use crate::errors::{Error, Result};
use sea_orm::{DatabaseConnection, TransactionTrait, prelude::*};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Configuration structure representing the entire accounts.toml file
#[derive(Debug, Deserialize)]
pub struct Chart {
    /// List of account configurations to seed
    pub accounts: Vec<AccountConfig>,
}

/// Configuration for a single account
#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
    /// Name of the account
    pub name: String,
    /// Asset-type classification ("ordinary", `credit_card`, `credit_receivable`)
    pub asset_type: AssetType,
    /// Optional settlement rule attached to this account
    #[serde(default)]
    pub rule: Option<RuleConfig>,
}

/// Configuration for a settlement rule
#[derive(Debug, Deserialize, Clone)]
pub struct RuleConfig {
    /// Name of the account the settlement deal posts against
    pub associated: String,
    /// Calendar months between a posting and its settlement
    pub month_shift: i32,
    /// Day of month the settlement falls on
    pub payment_day: u32,
}

/// Loads a chart-of-accounts configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_chart<P: AsRef<Path>>(path: P) -> Result<Chart> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read accounts file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse accounts.toml: {e}"),
    })
}

/// Loads the chart from the default location (./accounts.toml)
pub fn load_default_chart() -> Result<Chart> {
    load_chart("accounts.toml")
}

/// Seeds a user's chart of accounts, creating missing accounts and rules.
///
/// Accounts already present (matched by name) are left alone, as are their
/// rules. The whole seeding runs in one transaction: an unknown associated
/// account name leaves the database untouched.
pub async fn seed_chart(
    db: &DatabaseConnection,
    user_id: i64,
    chart: &Chart,
) -> Result<Vec<account::Model>> {
    let txn = db.begin().await?;

    let mut by_name: HashMap<String, account::Model> = HashMap::new();
    for cfg in &chart.accounts {
        let existing = Account::find()
            .filter(account::Column::UserId.eq(user_id))
            .filter(account::Column::Name.eq(cfg.name.as_str()))
            .one(&txn)
            .await?;
        let model = match existing {
            Some(model) => model,
            None => create_account(&txn, user_id, &cfg.name, cfg.asset_type).await?,
        };
        by_name.insert(cfg.name.clone(), model);
    }

    for cfg in &chart.accounts {
        let Some(rule_cfg) = &cfg.rule else { continue };
        let owner_id = by_name[&cfg.name].id;
        let associated = by_name
            .get(&rule_cfg.associated)
            .ok_or_else(|| Error::Config {
                message: format!(
                    "rule on account {:?} references unknown account {:?}",
                    cfg.name, rule_cfg.associated
                ),
            })?;
        if rule_for(&txn, owner_id).await?.is_none() {
            create_rule(
                &txn,
                owner_id,
                associated.id,
                rule_cfg.month_shift,
                rule_cfg.payment_day,
            )
            .await?;
        }
    }

    txn.commit().await?;
    info!(user_id, count = by_name.len(), "seeded chart of accounts");
    Ok(by_name.into_values().collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    const SAMPLE: &str = r#"
        [[accounts]]
        name = "Wallet"
        asset_type = "ordinary"

        [[accounts]]
        name = "Bank"
        asset_type = "ordinary"

        [[accounts]]
        name = "Visa"
        asset_type = "credit_card"

        [accounts.rule]
        associated = "Bank"
        month_shift = 1
        payment_day = 27
    "#;

    #[test]
    fn test_parse_chart_config() {
        let chart: Chart = toml::from_str(SAMPLE).unwrap();
        assert_eq!(chart.accounts.len(), 3);
        assert_eq!(chart.accounts[0].name, "Wallet");
        assert_eq!(chart.accounts[0].asset_type, AssetType::Ordinary);
        assert!(chart.accounts[0].rule.is_none());

        let visa = &chart.accounts[2];
        assert_eq!(visa.asset_type, AssetType::CreditCard);
        let rule = visa.rule.as_ref().unwrap();
        assert_eq!(rule.associated, "Bank");
        assert_eq!(rule.month_shift, 1);
        assert_eq!(rule.payment_day, 27);
    }

    #[tokio::test]
    async fn test_seed_chart_creates_accounts_and_rules() -> Result<()> {
        let db = setup_test_db().await?;
        let chart: Chart = toml::from_str(SAMPLE).unwrap();

        let accounts = seed_chart(&db, 1, &chart).await?;
        assert_eq!(accounts.len(), 3);

        let visa = Account::find()
            .filter(account::Column::Name.eq("Visa"))
            .one(&db)
            .await?
            .unwrap();
        let rule = rule_for(&db, visa.id).await?.unwrap();
        assert_eq!(rule.payment_day, 27);

        // seeding again neither duplicates accounts nor rules
        let again = seed_chart(&db, 1, &chart).await?;
        assert_eq!(again.len(), 3);
        assert_eq!(Account::find().all(&db).await?.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_chart_unknown_associated_name() -> Result<()> {
        let db = setup_test_db().await?;
        let chart: Chart = toml::from_str(
            r#"
            [[accounts]]
            name = "Visa"
            asset_type = "credit_card"

            [accounts.rule]
            associated = "Nowhere"
            month_shift = 1
            payment_day = 27
        "#,
        )
        .unwrap();

        let result = seed_chart(&db, 1, &chart).await;
        assert!(matches!(result, Err(Error::Config { .. })));

        // the transaction rolled back: no half-seeded chart
        assert!(Account::find().all(&db).await?.is_empty());

        Ok(())
    }
}
