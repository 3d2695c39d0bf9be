//! `SeaORM` Entity for accounting_periods table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use neraca_core::fiscal::AccountingPeriod;
use neraca_shared::types::{JournalEntryId, PeriodId, UserId};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounting_periods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    pub description: String,
    pub is_closed: bool,
    pub is_locked: bool,
    pub closed_by: Option<Uuid>,
    pub closed_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub total_revenue: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub total_expense: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub net_income: Decimal,
    pub closing_entry_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journal_entries::Entity",
        from = "Column::ClosingEntryId",
        to = "super::journal_entries::Column::Id"
    )]
    ClosingEntry,
}

impl Related<super::journal_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClosingEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for AccountingPeriod {
    fn from(model: Model) -> Self {
        Self {
            id: PeriodId::from_uuid(model.id),
            start_date: model.start_date,
            end_date: model.end_date,
            description: model.description,
            is_closed: model.is_closed,
            is_locked: model.is_locked,
            closed_by: model.closed_by.map(UserId::from_uuid),
            closed_at: model.closed_at.map(Into::into),
            total_revenue: model.total_revenue,
            total_expense: model.total_expense,
            net_income: model.net_income,
            closing_entry_id: model.closing_entry_id.map(JournalEntryId::from_uuid),
        }
    }
}
