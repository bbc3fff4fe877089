//! Time-windowed trending and upvote ranking.
//!
//! The window resolver and the ranking helpers are pure functions so they can
//! be tested without a database; the service wraps them around the ACTIVE
//! product selection query.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::DbPool;
use crate::entities::{
    product::{self, Entity as Product, ProductStatus},
    upvote,
};
use crate::errors::ServiceError;

/// Offset of the platform's local zone from UTC (+05:30). Day, week and
/// month boundaries are computed in this zone regardless of where the server
/// runs.
const PLATFORM_UTC_OFFSET_SECS: i64 = 5 * 3600 + 30 * 60;

/// Policy constant: both window bounds are shifted this far past the local
/// boundary so that "today" tracks the audience's active hours rather than
/// midnight. Callers must treat it as opaque.
const WINDOW_SHIFT_HOURS: i64 = 6;

/// Symbolic trending window. Anything outside day/week/month is rejected;
/// there is no default window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingWindow {
    Day,
    Week,
    Month,
}

impl TrendingWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendingWindow::Day => "day",
            TrendingWindow::Week => "week",
            TrendingWindow::Month => "month",
        }
    }
}

impl FromStr for TrendingWindow {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(TrendingWindow::Day),
            "week" => Ok(TrendingWindow::Week),
            "month" => Ok(TrendingWindow::Month),
            other => Err(ServiceError::InvalidInput(format!(
                "Unknown trending window '{}'; expected day, week or month",
                other
            ))),
        }
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    // Day 1 exists for every valid year/month pair.
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

fn next_month_start(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

fn local_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(local - Duration::seconds(PLATFORM_UTC_OFFSET_SECS)))
}

/// Resolves a symbolic window to inclusive UTC bounds.
///
/// The current instant is converted to the platform zone, truncated to the
/// start of the unit (weeks begin on Sunday) and extended to the unit's last
/// millisecond; both bounds are then shifted forward by the fixed policy
/// offset before conversion back to UTC. Pure function of `(window, now)`.
pub fn resolve_window(window: TrendingWindow, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let local = (now + Duration::seconds(PLATFORM_UTC_OFFSET_SECS)).naive_utc();
    let today = local.date();

    let (start_date, end_exclusive) = match window {
        TrendingWindow::Day => (today, today + chrono::Days::new(1)),
        TrendingWindow::Week => {
            let days_back = today.weekday().num_days_from_sunday() as u64;
            let start = today - chrono::Days::new(days_back);
            (start, start + chrono::Days::new(7))
        }
        TrendingWindow::Month => (month_start(today), next_month_start(today)),
    };

    let shift = Duration::hours(WINDOW_SHIFT_HOURS);
    let start_local = start_date.and_time(NaiveTime::MIN) + shift;
    let end_local = end_exclusive.and_time(NaiveTime::MIN) - Duration::milliseconds(1) + shift;

    (local_to_utc(start_local), local_to_utc(end_local))
}

/// An ACTIVE product annotated with its loaded upvote collection.
#[derive(Debug, Clone, Serialize)]
pub struct TrendingProduct {
    pub product: product::Model,
    pub upvotes: Vec<upvote::Model>,
}

impl TrendingProduct {
    pub fn upvote_count(&self) -> usize {
        self.upvotes.len()
    }
}

/// A product with its dense tie rank, for admin listings.
#[derive(Debug, Clone, Serialize)]
pub struct RankedProduct {
    pub product: product::Model,
    pub upvote_count: usize,
    pub rank: usize,
}

/// Stable descending sort by upvote count; ties keep the store's natural
/// return order. No secondary sort key is applied.
pub fn sort_by_upvotes_desc(items: &mut [TrendingProduct]) {
    items.sort_by(|a, b| b.upvote_count().cmp(&a.upvote_count()));
}

/// Returns the products tied for the single highest upvote count.
///
/// When every product has zero upvotes the whole input comes back (max is 0,
/// everything matches). That edge is intentional legacy behavior; see
/// DESIGN.md before changing it.
pub fn top_upvoted(items: Vec<TrendingProduct>) -> Vec<TrendingProduct> {
    let Some(max) = items.iter().map(TrendingProduct::upvote_count).max() else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter(|item| item.upvote_count() == max)
        .collect()
}

/// Assigns dense tie ranks over a list already sorted descending by upvotes:
/// every product tied at the global maximum gets rank 1, and the remaining
/// products are numbered from 2 in order, so the rank jumps straight from 1
/// to 2 no matter how many products share first place.
pub fn assign_ranks(sorted: Vec<TrendingProduct>) -> Vec<RankedProduct> {
    let max = sorted
        .iter()
        .map(TrendingProduct::upvote_count)
        .max()
        .unwrap_or(0);

    let mut trailing = 0usize;
    sorted
        .into_iter()
        .map(|item| {
            let upvote_count = item.upvote_count();
            let rank = if upvote_count == max {
                1
            } else {
                trailing += 1;
                trailing + 1
            };
            RankedProduct {
                product: item.product,
                upvote_count,
                rank,
            }
        })
        .collect()
}

/// Service exposing the trending selection and ranking queries.
pub struct TrendingService {
    db: Arc<DbPool>,
}

impl TrendingService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// ACTIVE products created OR updated inside the resolved window,
    /// upvotes loaded, ordered by upvote count descending. The OR over both
    /// timestamps is deliberate: an edit re-surfaces a product in the window
    /// regardless of its original publish time. No pagination; callers slice.
    #[instrument(skip(self))]
    pub async fn trending_products(
        &self,
        window: TrendingWindow,
    ) -> Result<Vec<TrendingProduct>, ServiceError> {
        self.trending_products_at(window, Utc::now()).await
    }

    /// Same as [`trending_products`](Self::trending_products) with an explicit
    /// clock, for deterministic tests.
    pub async fn trending_products_at(
        &self,
        window: TrendingWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<TrendingProduct>, ServiceError> {
        let (start, end) = resolve_window(window, now);

        let rows = Product::find()
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .filter(
                Condition::any()
                    .add(product::Column::CreatedAt.between(start, end))
                    .add(product::Column::UpdatedAt.between(start, end)),
            )
            .find_with_related(upvote::Entity)
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut items: Vec<TrendingProduct> = rows
            .into_iter()
            .map(|(product, upvotes)| TrendingProduct { product, upvotes })
            .collect();
        sort_by_upvotes_desc(&mut items);
        Ok(items)
    }

    /// The tied-for-first subset of the trending selection.
    #[instrument(skip(self))]
    pub async fn top_upvoted_products(
        &self,
        window: TrendingWindow,
    ) -> Result<Vec<TrendingProduct>, ServiceError> {
        Ok(top_upvoted(self.trending_products(window).await?))
    }

    /// All ACTIVE products with dense tie ranks for admin display.
    #[instrument(skip(self))]
    pub async fn active_product_rankings(&self) -> Result<Vec<RankedProduct>, ServiceError> {
        let rows = Product::find()
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .find_with_related(upvote::Entity)
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut items: Vec<TrendingProduct> = rows
            .into_iter()
            .map(|(product, upvotes)| TrendingProduct { product, upvotes })
            .collect();
        sort_by_upvotes_desc(&mut items);
        Ok(assign_ranks(items))
    }
}
