//! Schedule layout and extension from catalog items.
#![allow(clippy::future_not_send)]

use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::instrument;
use vtvguide_api::library::{CatalogItem, LocalCatalogApi, LocalIdentityApi};
use vtvguide_store::{ChannelSchedule, ScheduleEntry};

use crate::channels::resolve_query;
use crate::clock::round_to_hour;

/// Places items back-to-back starting at `cursor`.
///
/// Items keep their catalog order. Items without a usable runtime, items
/// listed in `exclude`, and repeats within `items` are skipped. No item is
/// placed at or after `until`, but the last placed item may run past it.
#[must_use]
pub fn lay_out(
    items: &[CatalogItem],
    mut cursor: DateTime<Utc>,
    until: DateTime<Utc>,
    exclude: &HashSet<&str>,
) -> Vec<ScheduleEntry> {
    let mut placed: HashSet<&str> = HashSet::new();
    let mut entries = Vec::new();

    for item in items {
        if cursor >= until {
            break;
        }
        if exclude.contains(item.id.as_str()) || placed.contains(item.id.as_str()) {
            continue;
        }
        let Some(runtime) = item.runtime() else {
            tracing::debug!(item_id = %item.id, "Skipping item without runtime");
            continue;
        };
        let Some(end) = cursor.checked_add_signed(runtime) else {
            break;
        };

        entries.push(ScheduleEntry::new(item.id.clone(), cursor, end));
        placed.insert(item.id.as_str());
        cursor = end;
    }

    entries
}

/// Adds `horizon` to `start`, saturating at the latest representable time.
fn horizon_end(start: DateTime<Utc>, horizon: TimeDelta) -> DateTime<Utc> {
    start
        .checked_add_signed(horizon)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Builds a new schedule starting at the top of the current hour.
///
/// `items` is `None` when no user could be resolved; the result is then an
/// empty schedule stamped with `now`.
#[must_use]
pub fn build_schedule(
    items: Option<&[CatalogItem]>,
    now: DateTime<Utc>,
    horizon: TimeDelta,
) -> ChannelSchedule {
    let mut schedule = ChannelSchedule::new(now);
    if let Some(items) = items {
        let start = round_to_hour(now);
        schedule.programs = lay_out(items, start, horizon_end(start, horizon), &HashSet::new());
    }
    schedule
}

/// Appends items after the current tail of `schedule`. Returns the number appended.
///
/// The new horizon is measured from the tail end (or `now` when the
/// schedule is empty). Items already on the schedule are not repeated.
pub fn extend_schedule(
    schedule: &mut ChannelSchedule,
    items: Option<&[CatalogItem]>,
    now: DateTime<Utc>,
    horizon: TimeDelta,
) -> usize {
    let Some(items) = items else {
        return 0;
    };
    let anchor = schedule.tail_end().unwrap_or(now);
    let appended = {
        let exclude = schedule.item_ids();
        lay_out(items, anchor, horizon_end(anchor, horizon), &exclude)
    };
    let count = appended.len();
    schedule.programs.extend(appended);
    count
}

/// Fetches the catalog items feeding a channel.
///
/// Returns `Ok(None)` when the tuner has no user or the user no longer
/// exists; such channels stay empty.
///
/// # Errors
///
/// Returns an error if the user lookup or the catalog query fails.
#[instrument(skip_all, fields(channel_id = %channel_id))]
pub async fn fetch_channel_items(
    library: &(impl LocalCatalogApi + LocalIdentityApi + Sync),
    user_id: Option<&str>,
    channel_id: &str,
) -> Result<Option<Vec<CatalogItem>>> {
    let Some(user_id) = user_id else {
        tracing::debug!("No user configured for tuner, channel stays empty");
        return Ok(None);
    };
    let Some(user) = library
        .get_user(user_id)
        .await
        .with_context(|| format!("failed to look up user {user_id}"))?
    else {
        tracing::debug!(user_id, "User not found, channel stays empty");
        return Ok(None);
    };

    let query = resolve_query(channel_id, &user.id);
    let items = library
        .find_items(&query)
        .await
        .with_context(|| format!("failed to query catalog for channel {channel_id}"))?;
    tracing::debug!(items = items.len(), "Fetched channel items");
    Ok(Some(items))
}
