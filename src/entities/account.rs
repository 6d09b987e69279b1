//! Account entity - A named holder of a materialized, non-negative balance.
//!
//! The `balance` column always equals the exact sum of the account's ledger entries. It is written
//! only by the balance mutator in [`crate::core::balance`].

use crate::core::money::Amount;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable display name
    #[sea_orm(indexed)]
    pub label: String,
    /// Materialized balance, stored as fixed-scale decimal text
    #[sea_orm(column_type = "Text")]
    pub balance: Amount,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// Last time the label or balance changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One account has many ledger entries
    #[sea_orm(has_many = "super::ledger_entry::Entity")]
    LedgerEntries,
}

impl Related<super::ledger_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account({})", self.label)
    }
}
