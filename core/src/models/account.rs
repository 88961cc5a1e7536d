// bazaar/src/models/account.rs

use serde::Serialize;
use sqlx::FromRow;

use super::{BankAccountId, UserId};

/// The parts of a user record the marketplace needs. Credentials live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserIdentity {
  pub id: UserId,
  pub username: String,
  pub name: String,
}

/// Transfer details of a seller's bank account. Ownership never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct BankAccount {
  pub id: BankAccountId,
  #[sqlx(rename = "user_id")]
  pub owner_id: UserId,
  pub bank_name: String,
  pub bank_account_name: String,
  pub bank_account_number: String,
}
