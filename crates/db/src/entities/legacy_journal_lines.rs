//! `SeaORM` Entity for legacy_journal_lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "legacy_journal_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub journal_entry_id: Uuid,
    pub account_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub debit_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub credit_amount: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::legacy_journal_entries::Entity",
        from = "Column::JournalEntryId",
        to = "super::legacy_journal_entries::Column::Id"
    )]
    LegacyJournalEntries,
}

impl Related<super::legacy_journal_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LegacyJournalEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
