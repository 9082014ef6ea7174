use std::mem;

use sqlx::{postgres::PgPool, Postgres, Transaction};

use crate::services::response::ServiceError;

/// Unit of work over the pool. Multi-row mutations run between `begin` and `commit`.
pub struct DatabaseExecutor {
	pool: PgPool,
	transaction: Option<Transaction<'static, Postgres>>,
}

impl DatabaseExecutor {
	pub fn new(pool: PgPool) -> Self {
		Self { pool, transaction: None }
	}
	pub fn transaction(&mut self) -> Result<&mut Transaction<'static, Postgres>, ServiceError> {
		self.transaction.as_mut().ok_or(ServiceError::TransactionError("transaction has not begun"))
	}

	pub(crate) async fn begin(&mut self) -> Result<(), ServiceError> {
		match self.transaction.as_mut() {
			None => {
				self.transaction = Some(self.pool.begin().await?);
				Ok(())
			}
			Some(_trx) => {
				tracing::warn!("transaction begun already");
				Err(ServiceError::TransactionError("transaction begun already"))
			}
		}
	}

	pub(crate) async fn commit(&mut self) -> Result<(), ServiceError> {
		let trx = mem::take(&mut self.transaction).ok_or(ServiceError::TransactionError("transaction has not begun"))?;
		trx.commit().await.map_err(|err| {
			tracing::error!("error occurred during commit operation : {:?}", err);
			ServiceError::DatabaseError(err)
		})
	}
	pub(crate) async fn rollback(&mut self) -> Result<(), ServiceError> {
		let trx = mem::take(&mut self.transaction).ok_or(ServiceError::TransactionError("transaction has not begun"))?;
		Ok(trx.rollback().await?)
	}
}

pub async fn migrate(pool: &PgPool) -> Result<(), ServiceError> {
	sqlx::migrate!("./migrations").run(pool).await?;
	Ok(())
}
