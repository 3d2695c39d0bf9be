//! `SeaORM` Entity for legacy_journal_entries table (the older simple ledger).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::JournalStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "legacy_journal_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entry_date: Date,
    pub description: String,
    pub status: JournalStatus,
    pub created_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::legacy_journal_lines::Entity")]
    LegacyJournalLines,
}

impl Related<super::legacy_journal_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LegacyJournalLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
