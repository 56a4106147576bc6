//! Mail domain and account persistence

use anduril_core::mail::{validate_account_address, validate_domain_name};
use anduril_core::{Account, Domain};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::{debug, info};

use crate::database::Database;
use crate::error::{DbError, DbResult};

fn domain_from_row(row: &SqliteRow) -> DbResult<Domain> {
	Ok(Domain {
		id: row.try_get("id")?,
		name: row.try_get("name")?,
		main: row.try_get("main")?,
	})
}

fn account_from_row(row: &SqliteRow) -> DbResult<Account> {
	Ok(Account {
		id: row.try_get("id")?,
		domain_id: row.try_get("domain_id")?,
		address: row.try_get("address")?,
		forward: row.try_get("forward")?,
	})
}

/// Mail domains. At most one is `main`.
#[derive(Debug, Clone)]
pub struct DomainManager {
	db: Database,
}

impl DomainManager {
	pub fn new(db: Database) -> Self {
		Self { db }
	}

	pub async fn create(&self, name: &str, main: bool) -> DbResult<Domain> {
		validate_domain_name(name)?;
		let mut tx = self.db.pool().begin().await?;
		let id = sqlx::query("INSERT INTO mail_domain (name, main) VALUES (?, ?)")
			.bind(name)
			.bind(main)
			.execute(&mut *tx)
			.await?
			.last_insert_rowid();
		if main {
			clear_other_main(&mut *tx, id).await?;
		}
		tx.commit().await?;
		info!(domain = name, main, "Created mail domain");
		Ok(Domain {
			id,
			name: name.to_string(),
			main,
		})
	}

	/// Save `domain`; a main domain takes the flag from every other one.
	pub async fn save(&self, domain: &Domain) -> DbResult<()> {
		validate_domain_name(&domain.name)?;
		let mut tx = self.db.pool().begin().await?;
		let result = sqlx::query("UPDATE mail_domain SET name = ?, main = ? WHERE id = ?")
			.bind(&domain.name)
			.bind(domain.main)
			.bind(domain.id)
			.execute(&mut *tx)
			.await?;
		if result.rows_affected() == 0 {
			return Err(DbError::not_found("Domain", domain.id));
		}
		if domain.main {
			clear_other_main(&mut *tx, domain.id).await?;
		}
		tx.commit().await?;
		debug!(domain = %domain, "Saved mail domain");
		Ok(())
	}

	pub async fn get(&self, id: i64) -> DbResult<Domain> {
		sqlx::query("SELECT id, name, main FROM mail_domain WHERE id = ?")
			.bind(id)
			.fetch_optional(self.db.pool())
			.await?
			.as_ref()
			.map(domain_from_row)
			.transpose()?
			.ok_or_else(|| DbError::not_found("Domain", id))
	}

	/// The main domain, if one is set
	pub async fn default_domain(&self) -> DbResult<Option<Domain>> {
		sqlx::query("SELECT id, name, main FROM mail_domain WHERE main = 1 ORDER BY id LIMIT 1")
			.fetch_optional(self.db.pool())
			.await?
			.as_ref()
			.map(domain_from_row)
			.transpose()
	}

	pub async fn list(&self) -> DbResult<Vec<Domain>> {
		sqlx::query("SELECT id, name, main FROM mail_domain ORDER BY name")
			.fetch_all(self.db.pool())
			.await?
			.iter()
			.map(domain_from_row)
			.collect()
	}
}

async fn clear_other_main(conn: &mut sqlx::SqliteConnection, keep: i64) -> DbResult<()> {
	sqlx::query("UPDATE mail_domain SET main = 0 WHERE id != ?")
		.bind(keep)
		.execute(&mut *conn)
		.await?;
	Ok(())
}

/// Mail accounts, local or forwarding
#[derive(Debug, Clone)]
pub struct AccountManager {
	db: Database,
}

impl AccountManager {
	pub fn new(db: Database) -> Self {
		Self { db }
	}

	/// Create an account under `domain`. An empty `forward` stores mail locally.
	pub async fn create(&self, domain: &Domain, address: &str, forward: &str) -> DbResult<Account> {
		validate_account_address(address, domain)?;
		let id = sqlx::query("INSERT INTO mail_account (domain_id, address, forward) VALUES (?, ?, ?)")
			.bind(domain.id)
			.bind(address)
			.bind(forward)
			.execute(self.db.pool())
			.await?
			.last_insert_rowid();
		info!(address, "Created mail account");
		Ok(Account {
			id,
			domain_id: domain.id,
			address: address.to_string(),
			forward: forward.to_string(),
		})
	}

	/// Save `account` after checking its address against its domain.
	pub async fn save(&self, account: &Account) -> DbResult<()> {
		let domain = DomainManager::new(self.db.clone())
			.get(account.domain_id)
			.await?;
		validate_account_address(&account.address, &domain)?;
		let result = sqlx::query(
			"UPDATE mail_account SET domain_id = ?, address = ?, forward = ? WHERE id = ?",
		)
		.bind(account.domain_id)
		.bind(&account.address)
		.bind(&account.forward)
		.bind(account.id)
		.execute(self.db.pool())
		.await?;
		if result.rows_affected() == 0 {
			return Err(DbError::not_found("Account", account.id));
		}
		Ok(())
	}

	pub async fn get_by_address(&self, address: &str) -> DbResult<Account> {
		sqlx::query("SELECT id, domain_id, address, forward FROM mail_account WHERE address = ?")
			.bind(address)
			.fetch_optional(self.db.pool())
			.await?
			.as_ref()
			.map(account_from_row)
			.transpose()?
			.ok_or_else(|| DbError::not_found("Account", address))
	}

	pub async fn for_domain(&self, domain: &Domain) -> DbResult<Vec<Account>> {
		sqlx::query(
			"SELECT id, domain_id, address, forward FROM mail_account WHERE domain_id = ? \
			 ORDER BY address",
		)
		.bind(domain.id)
		.fetch_all(self.db.pool())
		.await?
		.iter()
		.map(account_from_row)
		.collect()
	}
}
