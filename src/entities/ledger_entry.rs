//! Ledger entry entity - A signed amount attached to exactly one account.
//!
//! Each entry carries a caller-supplied `txid` that is unique across the whole store. The owning
//! `account_id` never changes after creation; only `amount` may be amended.
use crate::core::money::Amount;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the account this entry belongs to
    #[sea_orm(indexed)]
    pub account_id: i64,
    /// External transaction identifier, unique store-wide
    #[sea_orm(unique)]
    pub txid: String,
    /// Signed amount (positive credits, negative debits, zero allowed)
    #[sea_orm(column_type = "Text")]
    pub amount: Amount,
    /// When the entry was created
    pub created_at: DateTimeUtc,
    /// Last time the amount was amended
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between LedgerEntry and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entry({}): {}", self.txid, self.amount)
    }
}
