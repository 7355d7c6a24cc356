//! Summary prefix search - Autocomplete support for deal summaries.
//!
//! Groups a user's past deals by summary (most recent date per summary) under
//! a literal prefix match, then returns every deal matching one of the
//! (summary, date) pairs. This backs a suggestion box and nothing else, so it
//! is the one deliberately fail-soft path in the crate: any backing-store
//! failure is logged and an empty result returned.

use crate::{
    entities::{Deal, deal},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{Condition, DatabaseConnection, QueryOrder, QuerySelect, prelude::*};
use tracing::warn;

/// Searches a user's top-level deals by summary prefix.
///
/// Returns every deal whose (summary, date) equals one of the up-to-`limit`
/// (summary, most-recent-date) groups matching the prefix. An empty prefix
/// yields nothing, and so does any database failure.
pub async fn search_by_summary(
    db: &DatabaseConnection,
    user_id: i64,
    prefix: &str,
    limit: u64,
) -> Vec<deal::Model> {
    if prefix.is_empty() {
        return Vec::new();
    }
    match search_inner(db, user_id, prefix, limit).await {
        Ok(deals) => deals,
        Err(err) => {
            warn!(%err, user_id, prefix, "summary search failed, returning no suggestions");
            Vec::new()
        }
    }
}

async fn search_inner(
    db: &DatabaseConnection,
    user_id: i64,
    prefix: &str,
    limit: u64,
) -> Result<Vec<deal::Model>> {
    let groups: Vec<(String, NaiveDate)> = Deal::find()
        .select_only()
        .column(deal::Column::Summary)
        .column_as(deal::Column::Date.max(), "date")
        .filter(deal::Column::UserId.eq(user_id))
        .filter(deal::Column::ParentDealId.is_null())
        .filter(deal::Column::Summary.starts_with(prefix))
        .group_by(deal::Column::Summary)
        .limit(limit)
        .into_tuple()
        .all(db)
        .await?;

    if groups.is_empty() {
        return Ok(Vec::new());
    }

    let mut matches = Condition::any();
    for (summary, date) in groups {
        matches = matches.add(
            Condition::all()
                .add(deal::Column::Summary.eq(summary))
                .add(deal::Column::Date.eq(date)),
        );
    }

    Deal::find()
        .filter(deal::Column::UserId.eq(user_id))
        .filter(deal::Column::ParentDealId.is_null())
        .filter(matches)
        .order_by_asc(deal::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
