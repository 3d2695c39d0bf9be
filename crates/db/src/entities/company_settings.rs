//! `SeaORM` Entity for company_settings table (single row).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use neraca_core::fiscal::FiscalYearStart;
use neraca_core::settings::{CompanyProfile, Settings};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "company_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub company_name: String,
    pub company_address: String,
    pub company_phone: String,
    pub company_email: String,
    pub currency: String,
    pub fiscal_year_start: String,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Settings {
    fn from(model: Model) -> Self {
        Self {
            company: CompanyProfile {
                name: model.company_name,
                address: model.company_address,
                phone: model.company_phone,
                email: model.company_email,
                currency: model.currency,
            },
            fiscal_year_start: FiscalYearStart::parse(&model.fiscal_year_start),
            updated_at: Some(model.updated_at.into()),
        }
    }
}
