use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
};

use crate::entities::{prelude::*, counters};

pub struct CounterRepository {
    conn: DatabaseConnection,
}

impl CounterRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Increment-and-read the named sequence inside a transaction. The
    /// storage engine serializes the two writers that race here, so values
    /// come out distinct and strictly increasing even under concurrent
    /// creates, and the counter survives restarts.
    pub async fn next(&self, name: &str) -> Result<i64> {
        let txn = self.conn.begin().await?;

        let updated = Counters::update_many()
            .col_expr(
                counters::Column::Value,
                Expr::col(counters::Column::Value).add(1),
            )
            .filter(counters::Column::Name.eq(name))
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            anyhow::bail!("Counter not seeded: {name}");
        }

        let row = Counters::find_by_id(name)
            .one(&txn)
            .await
            .context("Failed to read counter after increment")?
            .ok_or_else(|| anyhow::anyhow!("Counter vanished mid-transaction: {name}"))?;

        txn.commit().await?;

        Ok(row.value)
    }
}
