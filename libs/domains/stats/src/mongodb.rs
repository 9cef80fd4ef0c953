//! MongoDB aggregation pipelines behind the dashboard figures.
//!
//! The pipelines read the `orders` and `users` collections directly; this
//! domain owns no collection of its own.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, from_bson, Bson, Document},
    Database,
};
use tracing::instrument;

use crate::error::{StatsError, StatsResult};
use crate::models::{StatusCount, TopProduct, TopSupplier, UserCounts};
use crate::repository::{MonthlyBucket, StatsRepository};

/// MongoDB implementation of the StatsRepository
pub struct MongoStatsRepository {
    db: Database,
}

impl MongoStatsRepository {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    async fn aggregate(&self, collection: &str, pipeline: Vec<Document>) -> StatsResult<Vec<Document>> {
        let cursor = self
            .db
            .collection::<Document>(collection)
            .aggregate(pipeline)
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }
}

fn total_revenue_pipeline() -> Vec<Document> {
    vec![doc! { "$group": { "_id": null, "total": { "$sum": "$total" } } }]
}

fn status_counts_pipeline() -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": "$status", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1 } },
    ]
}

fn user_counts_pipeline() -> Vec<Document> {
    vec![doc! { "$group": {
        "_id": { "role": "$role", "status": "$status" },
        "count": { "$sum": 1 },
    } }]
}

fn top_products_pipeline(limit: i64) -> Vec<Document> {
    vec![
        doc! { "$unwind": "$lines" },
        doc! { "$group": {
            "_id": "$lines.product_id",
            "name": { "$first": "$lines.product_name" },
            "quantity": { "$sum": "$lines.quantity" },
        } },
        doc! { "$sort": { "quantity": -1 } },
        doc! { "$limit": limit },
    ]
}

fn top_suppliers_pipeline(limit: i64) -> Vec<Document> {
    vec![
        doc! { "$group": {
            "_id": "$supplier_id",
            "revenue": { "$sum": "$total" },
            "order_count": { "$sum": 1 },
        } },
        doc! { "$sort": { "revenue": -1 } },
        doc! { "$limit": limit },
    ]
}

fn monthly_revenue_pipeline(since: DateTime<Utc>) -> Vec<Document> {
    // created_at is stored as an RFC 3339 string, so the zero-padded prefix
    // both orders lexicographically and yields the YYYY-MM bucket key.
    let cutoff = since.to_rfc3339_opts(SecondsFormat::AutoSi, true);
    vec![
        doc! { "$match": { "created_at": { "$gte": cutoff } } },
        doc! { "$group": {
            "_id": { "$substrBytes": ["$created_at", 0, 7] },
            "revenue": { "$sum": "$total" },
        } },
        doc! { "$sort": { "_id": 1 } },
    ]
}

fn numeric_f64(document: &Document, key: &str) -> StatsResult<f64> {
    match document.get(key) {
        Some(Bson::Double(v)) => Ok(*v),
        Some(Bson::Int32(v)) => Ok(f64::from(*v)),
        Some(Bson::Int64(v)) => Ok(*v as f64),
        other => Err(StatsError::Malformed(format!(
            "expected numeric field '{key}', got {other:?}"
        ))),
    }
}

fn numeric_i64(document: &Document, key: &str) -> StatsResult<i64> {
    match document.get(key) {
        Some(Bson::Int32(v)) => Ok(i64::from(*v)),
        Some(Bson::Int64(v)) => Ok(*v),
        Some(Bson::Double(v)) => Ok(*v as i64),
        other => Err(StatsError::Malformed(format!(
            "expected integer field '{key}', got {other:?}"
        ))),
    }
}

fn id_uuid(document: &Document) -> StatsResult<uuid::Uuid> {
    let id = document
        .get("_id")
        .ok_or_else(|| StatsError::Malformed("missing _id in aggregation row".to_string()))?;
    from_bson(id.clone())
        .map_err(|e| StatsError::Malformed(format!("aggregation _id is not a UUID: {e}")))
}

#[async_trait]
impl StatsRepository for MongoStatsRepository {
    #[instrument(skip(self))]
    async fn total_revenue(&self) -> StatsResult<f64> {
        let rows = self.aggregate("orders", total_revenue_pipeline()).await?;
        match rows.first() {
            Some(row) => numeric_f64(row, "total"),
            None => Ok(0.0),
        }
    }

    #[instrument(skip(self))]
    async fn total_orders(&self) -> StatsResult<u64> {
        let count = self
            .db
            .collection::<Document>("orders")
            .count_documents(doc! {})
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn order_status_counts(&self) -> StatsResult<Vec<StatusCount>> {
        let rows = self.aggregate("orders", status_counts_pipeline()).await?;
        rows.iter()
            .map(|row| {
                let status = row
                    .get_str("_id")
                    .map_err(|e| StatsError::Malformed(format!("status bucket key: {e}")))?
                    .to_string();
                Ok(StatusCount {
                    status,
                    count: numeric_i64(row, "count")? as u64,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn user_counts(&self) -> StatsResult<UserCounts> {
        let rows = self.aggregate("users", user_counts_pipeline()).await?;
        let mut counts = UserCounts::default();
        for row in &rows {
            let key = row
                .get_document("_id")
                .map_err(|e| StatsError::Malformed(format!("user bucket key: {e}")))?;
            let count = numeric_i64(row, "count")? as u64;

            counts.total += count;
            if key.get_str("status") == Ok("activated") {
                counts.activated += count;
            }
            match key.get_str("role") {
                Ok("client") => counts.clients += count,
                Ok("supplier") => counts.suppliers += count,
                Ok("admin") => counts.admins += count,
                _ => {}
            }
        }
        Ok(counts)
    }

    #[instrument(skip(self))]
    async fn top_products(&self, limit: i64) -> StatsResult<Vec<TopProduct>> {
        let rows = self.aggregate("orders", top_products_pipeline(limit)).await?;
        rows.iter()
            .map(|row| {
                Ok(TopProduct {
                    product_id: id_uuid(row)?,
                    name: row
                        .get_str("name")
                        .map_err(|e| StatsError::Malformed(format!("product name: {e}")))?
                        .to_string(),
                    quantity: numeric_i64(row, "quantity")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn top_suppliers(&self, limit: i64) -> StatsResult<Vec<TopSupplier>> {
        let rows = self
            .aggregate("orders", top_suppliers_pipeline(limit))
            .await?;
        rows.iter()
            .map(|row| {
                Ok(TopSupplier {
                    supplier_id: id_uuid(row)?,
                    revenue: numeric_f64(row, "revenue")?,
                    order_count: numeric_i64(row, "order_count")? as u64,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn monthly_revenue(&self, since: DateTime<Utc>) -> StatsResult<Vec<MonthlyBucket>> {
        let rows = self
            .aggregate("orders", monthly_revenue_pipeline(since))
            .await?;
        rows.iter()
            .map(|row| {
                Ok(MonthlyBucket {
                    month: row
                        .get_str("_id")
                        .map_err(|e| StatsError::Malformed(format!("month bucket key: {e}")))?
                        .to_string(),
                    revenue: numeric_f64(row, "revenue")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn monthly_pipeline_buckets_by_month_prefix() {
        let since = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).single().unwrap();
        let pipeline = monthly_revenue_pipeline(since);

        assert_eq!(pipeline.len(), 3);
        let group = pipeline[1].get_document("$group").unwrap();
        let key = group.get_document("_id").unwrap();
        assert_eq!(
            key.get_array("$substrBytes").unwrap()[0],
            Bson::String("$created_at".to_string())
        );

        let matcher = pipeline[0].get_document("$match").unwrap();
        let gte = matcher.get_document("created_at").unwrap();
        assert!(gte.get_str("$gte").unwrap().starts_with("2025-09-01"));
    }

    #[test]
    fn top_products_pipeline_unwinds_lines() {
        let pipeline = top_products_pipeline(5);
        assert_eq!(pipeline[0], doc! { "$unwind": "$lines" });
        assert_eq!(pipeline[3], doc! { "$limit": 5_i64 });
    }

    #[test]
    fn numeric_readers_accept_every_bson_width() {
        let row = doc! { "a": 3_i32, "b": 4_i64, "c": 2.5_f64 };
        assert_eq!(numeric_i64(&row, "a").unwrap(), 3);
        assert_eq!(numeric_i64(&row, "b").unwrap(), 4);
        assert_eq!(numeric_f64(&row, "c").unwrap(), 2.5);
        assert!(numeric_f64(&row, "missing").is_err());
    }
}
