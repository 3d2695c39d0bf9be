//! Scenario and property-based tests for statement generation.

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use neraca_shared::types::AccountId;

use super::balance_sheet::{BalanceSheetGenerator, BalanceSheetInput};
use super::cash_flow::{CashFlowGenerator, CashFlowInput, RECONCILIATION_CODE};
use super::error::ReportError;
use super::types::{FlowCategory, FlowKind, NET_INCOME_CODE, NET_INCOME_NAME};
use crate::classify::{Bucket, NET_PAYABLE_NAME, NET_RECEIVABLE_NAME, NET_VAT_CODE};
use crate::ledger::{AccountBalance, AccountType, BalanceSource};
use crate::settings::CompanyProfile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Builds a balance whose totals are consistent with its normal-oriented net.
fn balance(code: &str, name: &str, account_type: AccountType, net: Decimal) -> AccountBalance {
    let debit_positive = account_type.normal_balance().to_debit_positive(net);
    let (debit, credit) = if debit_positive.is_sign_negative() {
        (Decimal::ZERO, -debit_positive)
    } else {
        (debit_positive, Decimal::ZERO)
    };
    AccountBalance::from_totals(
        AccountId::new(),
        code.to_string(),
        name.to_string(),
        account_type,
        debit,
        credit,
    )
}

fn bs_input(balances: Vec<AccountBalance>, income: Vec<AccountBalance>) -> BalanceSheetInput {
    BalanceSheetInput {
        as_of: date(2024, 12, 31),
        balances,
        income,
        data_source: BalanceSource::Journal,
        company: CompanyProfile::default(),
        generated_at: Utc.with_ymd_and_hms(2025, 1, 2, 8, 0, 0).unwrap(),
    }
}

fn cf_input(changes: Vec<AccountBalance>, beginning: Decimal, ending: Decimal) -> CashFlowInput {
    CashFlowInput {
        start: date(2024, 1, 1),
        end: date(2024, 12, 31),
        changes,
        cash_at_beginning: beginning,
        cash_at_end: ending,
        data_source: BalanceSource::Journal,
        company: CompanyProfile::default(),
        generated_at: Utc.with_ymd_and_hms(2025, 1, 2, 8, 0, 0).unwrap(),
    }
}

// ============================================================================
// Balance Sheet
// ============================================================================

#[test]
fn test_vat_netting_replaces_individual_lines() {
    let balances = vec![
        balance("1101", "Kas", AccountType::Asset, dec!(1000)),
        balance("1240", "PPN Masukan", AccountType::Asset, dec!(150)),
        balance("2101", "Utang Usaha", AccountType::Liability, dec!(100)),
        balance("2103", "PPN Keluaran", AccountType::Liability, dec!(400)),
        balance("3101", "Modal Disetor", AccountType::Equity, dec!(650)),
    ];

    let sheet = BalanceSheetGenerator::generate(bs_input(balances, vec![]));

    assert!(sheet.assets.items().all(|i| i.code != "1240"));
    assert!(sheet.liabilities.items().all(|i| i.code != "2103"));

    let tax = sheet.liabilities.subsection(Bucket::TaxPayable).unwrap();
    assert_eq!(tax.items.len(), 1);
    assert_eq!(tax.items[0].code, NET_VAT_CODE);
    assert_eq!(tax.items[0].name, NET_PAYABLE_NAME);
    assert_eq!(tax.items[0].amount, dec!(250));
    assert_eq!(tax.total, dec!(250));

    // VAT input was the only other current asset, so the subsection is gone
    assert!(sheet.assets.subsection(Bucket::OtherCurrentAsset).is_none());
    assert_eq!(sheet.total_assets, dec!(1000));
    assert_eq!(sheet.total_liabilities, dec!(350));
    assert!(sheet.is_balanced);
}

#[test]
fn test_vat_netting_to_receivable() {
    let balances = vec![
        balance("1101", "Kas", AccountType::Asset, dec!(1000)),
        balance("1240", "VAT Input", AccountType::Asset, dec!(700)),
        balance("2103", "VAT Output", AccountType::Liability, dec!(200)),
        balance("3101", "Share Capital", AccountType::Equity, dec!(1500)),
    ];

    let sheet = BalanceSheetGenerator::generate(bs_input(balances, vec![]));

    let other = sheet.assets.subsection(Bucket::OtherCurrentAsset).unwrap();
    assert_eq!(other.items.len(), 1);
    assert_eq!(other.items[0].name, NET_RECEIVABLE_NAME);
    assert_eq!(other.items[0].amount, dec!(500));
    assert!(sheet.liabilities.subsection(Bucket::TaxPayable).is_none());
    assert_eq!(sheet.total_assets, dec!(1500));
    assert!(sheet.is_balanced);
}

#[test]
fn test_cancelled_vat_shows_zero_payable() {
    let balances = vec![
        balance("1101", "Kas", AccountType::Asset, dec!(900)),
        balance("1240", "PPN Masukan", AccountType::Asset, dec!(300)),
        balance("2103", "PPN Keluaran", AccountType::Liability, dec!(300)),
        balance("3101", "Modal Disetor", AccountType::Equity, dec!(900)),
    ];

    let sheet = BalanceSheetGenerator::generate(bs_input(balances, vec![]));

    let tax = sheet.liabilities.subsection(Bucket::TaxPayable).unwrap();
    assert_eq!(tax.items.len(), 1);
    assert_eq!(tax.items[0].code, NET_VAT_CODE);
    assert_eq!(tax.items[0].name, NET_PAYABLE_NAME);
    assert_eq!(tax.items[0].amount, Decimal::ZERO);
    assert!(sheet.assets.subsection(Bucket::OtherCurrentAsset).is_none());
    assert_eq!(sheet.total_liabilities, Decimal::ZERO);
    assert_eq!(sheet.total_assets, dec!(900));
    assert!(sheet.is_balanced);
}

#[test]
fn test_closed_period_adds_no_income_line() {
    let balances = vec![
        balance("1101", "Kas", AccountType::Asset, dec!(600)),
        balance("3201", "Laba Ditahan", AccountType::Equity, dec!(600)),
    ];
    let income = vec![
        balance("4101", "Penjualan", AccountType::Revenue, Decimal::ZERO),
        balance("5101", "Beban Gaji", AccountType::Expense, Decimal::ZERO),
    ];

    let sheet = BalanceSheetGenerator::generate(bs_input(balances, income));

    assert_eq!(sheet.current_period_income, None);
    assert!(sheet.equity.items().all(|i| i.code != NET_INCOME_CODE));
    assert_eq!(sheet.total_equity, dec!(600));
    assert!(sheet.is_balanced);
}

#[test]
fn test_open_period_adds_income_line() {
    let balances = vec![
        balance("1101", "Kas", AccountType::Asset, dec!(1600)),
        balance("3101", "Modal Disetor", AccountType::Equity, dec!(1000)),
    ];
    let income = vec![
        balance("4101", "Penjualan", AccountType::Revenue, dec!(1000)),
        balance("5101", "Beban Gaji", AccountType::Expense, dec!(400)),
    ];

    let sheet = BalanceSheetGenerator::generate(bs_input(balances, income));

    assert_eq!(sheet.current_period_income, Some(dec!(600)));
    let retained = sheet.equity.subsection(Bucket::RetainedEarnings).unwrap();
    assert_eq!(retained.items[0].name, NET_INCOME_NAME);
    assert_eq!(retained.items[0].amount, dec!(600));
    assert!(retained.items[0].account_id.is_none());
    assert_eq!(sheet.total_equity, dec!(1600));
    assert!(sheet.is_balanced);
}

#[test]
fn test_current_and_non_current_split() {
    let balances = vec![
        balance("1101", "Kas", AccountType::Asset, dec!(100)),
        balance("1201", "Piutang Usaha", AccountType::Asset, dec!(200)),
        balance("1601", "Gedung", AccountType::Asset, dec!(1000)),
        balance("1602", "Akumulasi Penyusutan Gedung", AccountType::Asset, dec!(-100)),
        balance("2101", "Utang Usaha", AccountType::Liability, dec!(150)),
        balance("2201", "Utang Bank Jangka Panjang", AccountType::Liability, dec!(500)),
        balance("3101", "Modal Disetor", AccountType::Equity, dec!(550)),
    ];

    let sheet = BalanceSheetGenerator::generate(bs_input(balances, vec![]));

    assert_eq!(sheet.assets.current.total, dec!(300));
    assert_eq!(sheet.assets.non_current.total, dec!(900));
    let fixed = sheet.assets.subsection(Bucket::FixedAsset).unwrap();
    assert_eq!(fixed.items.len(), 2);
    assert_eq!(sheet.liabilities.current.total, dec!(150));
    assert_eq!(sheet.liabilities.non_current.total, dec!(500));
    assert_eq!(sheet.total_assets, dec!(1200));
    assert_eq!(sheet.balance_difference, Decimal::ZERO);
    assert!(sheet.is_balanced);
}

#[test]
fn test_zero_balances_are_dropped() {
    let balances = vec![
        balance("1101", "Kas", AccountType::Asset, dec!(100)),
        balance("1102", "Bank Mandiri", AccountType::Asset, Decimal::ZERO),
        balance("3101", "Modal Disetor", AccountType::Equity, dec!(100)),
    ];
    let sheet = BalanceSheetGenerator::generate(bs_input(balances, vec![]));
    assert_eq!(sheet.assets.items().count(), 1);
}

#[test]
fn test_imbalance_is_reported() {
    let balances = vec![
        balance("1101", "Kas", AccountType::Asset, dec!(100.05)),
        balance("3101", "Modal Disetor", AccountType::Equity, dec!(100)),
    ];
    let sheet = BalanceSheetGenerator::generate(bs_input(balances, vec![]));
    assert_eq!(sheet.balance_difference, dec!(0.05));
    assert!(!sheet.is_balanced);

    let balances = vec![
        balance("1101", "Kas", AccountType::Asset, dec!(100.01)),
        balance("3101", "Modal Disetor", AccountType::Equity, dec!(100)),
    ];
    let sheet = BalanceSheetGenerator::generate(bs_input(balances, vec![]));
    assert!(sheet.is_balanced);
}

#[test]
fn test_company_defaults_and_currency() {
    let sheet = BalanceSheetGenerator::generate(bs_input(vec![], vec![]));
    assert_eq!(sheet.company.name, "PT. Sistem Akuntansi Indonesia");
    assert_eq!(sheet.currency, "IDR");
    assert!(sheet.is_balanced);
}

// ============================================================================
// Cash Flow
// ============================================================================

#[test]
fn test_receivable_increase_is_outflow() {
    let changes = vec![
        balance("1201", "Piutang Usaha", AccountType::Asset, dec!(500)),
        balance("4101", "Penjualan", AccountType::Revenue, dec!(500)),
    ];

    let flow = CashFlowGenerator::generate(cf_input(changes, dec!(1000), dec!(1000))).unwrap();

    assert_eq!(flow.operating.net_income, dec!(500));
    assert_eq!(flow.category_total(FlowCategory::AccountsReceivableChange), dec!(-500));
    assert_eq!(flow.operating.working_capital_changes[0].kind, FlowKind::Decrease);
    assert_eq!(flow.operating.total, Decimal::ZERO);
    assert_eq!(flow.reconciliation_adjustment, Decimal::ZERO);
    assert_eq!(flow.cash_at_end, flow.cash_at_beginning + flow.net_cash_flow);
}

#[test]
fn test_payable_increase_is_inflow() {
    let changes = vec![
        balance("2101", "Utang Usaha", AccountType::Liability, dec!(300)),
        balance("5101", "Beban Pembelian", AccountType::Expense, dec!(300)),
    ];
    let flow = CashFlowGenerator::generate(cf_input(changes, dec!(0), dec!(0))).unwrap();
    assert_eq!(flow.category_total(FlowCategory::AccountsPayableChange), dec!(300));
    assert_eq!(flow.operating.net_income, dec!(-300));
    assert_eq!(flow.net_cash_flow, Decimal::ZERO);
}

#[test]
fn test_depreciation_add_back_and_contra_skip() {
    let changes = vec![
        balance("1101", "Kas", AccountType::Asset, dec!(1000)),
        balance("4101", "Penjualan", AccountType::Revenue, dec!(1000)),
        balance("6201", "Beban Penyusutan", AccountType::Expense, dec!(250)),
        balance("1602", "Akumulasi Penyusutan", AccountType::Asset, dec!(-250)),
    ];

    let flow = CashFlowGenerator::generate(cf_input(changes, dec!(0), dec!(1000))).unwrap();

    assert_eq!(flow.operating.net_income, dec!(750));
    assert_eq!(flow.category_total(FlowCategory::Depreciation), dec!(250));
    assert!(flow.items().all(|i| i.code != "1602" && i.code != "1101"));
    assert_eq!(flow.operating.total, dec!(1000));
    assert_eq!(flow.reconciliation_adjustment, Decimal::ZERO);
}

#[test]
fn test_disposal_gain_is_removed_from_operating() {
    let changes = vec![
        balance("4901", "Gain on Disposal of Equipment", AccountType::Revenue, dec!(80)),
        balance("1601", "Equipment", AccountType::Asset, dec!(-400)),
    ];
    let flow = CashFlowGenerator::generate(cf_input(changes, dec!(0), dec!(400))).unwrap();
    assert_eq!(flow.category_total(FlowCategory::GainLossOnAssetDisposal), dec!(-80));
    assert_eq!(flow.category_total(FlowCategory::SaleOfFixedAssets), dec!(400));
    assert_eq!(flow.investing.items[0].kind, FlowKind::Inflow);
    assert_eq!(flow.operating.total, Decimal::ZERO);
    assert_eq!(flow.net_cash_flow, dec!(400));
    assert_eq!(flow.reconciliation_adjustment, Decimal::ZERO);
}

#[test]
fn test_investing_and_financing_split() {
    let changes = vec![
        balance("1601", "Gedung", AccountType::Asset, dec!(2000)),
        balance("1501", "Saham Anak Usaha", AccountType::Asset, dec!(-300)),
        balance("2201", "Utang Bank", AccountType::Liability, dec!(1500)),
        balance("2111", "Pinjaman Jangka Pendek", AccountType::Liability, dec!(-200)),
        balance("3101", "Modal Disetor", AccountType::Equity, dec!(1000)),
        balance("3301", "Dividen", AccountType::Equity, dec!(-100)),
    ];

    let flow = CashFlowGenerator::generate(cf_input(changes, dec!(0), dec!(200))).unwrap();

    assert_eq!(flow.category_total(FlowCategory::PurchaseOfFixedAssets), dec!(-2000));
    assert_eq!(flow.category_total(FlowCategory::SaleOfInvestments), dec!(300));
    assert_eq!(flow.investing.total, dec!(-1700));
    assert_eq!(flow.category_total(FlowCategory::LongTermDebtIncrease), dec!(1500));
    assert_eq!(flow.category_total(FlowCategory::ShortTermDebtDecrease), dec!(-200));
    assert_eq!(flow.category_total(FlowCategory::ShareCapitalIncrease), dec!(1000));
    assert_eq!(flow.category_total(FlowCategory::DividendsPaid), dec!(-100));
    assert_eq!(flow.financing.total, dec!(2200));
    assert!(
        flow.financing
            .items
            .iter()
            .filter(|i| i.amount < Decimal::ZERO)
            .all(|i| i.kind == FlowKind::Outflow)
    );
    // 500 computed vs 200 actual
    assert_eq!(flow.reconciliation_adjustment, dec!(-300));
    assert_eq!(flow.net_cash_flow, dec!(200));
}

#[test]
fn test_vat_lines_are_tagged_by_name() {
    let changes = vec![
        balance("1240", "PPN Masukan", AccountType::Asset, dec!(110)),
        balance("2103", "PPN Keluaran", AccountType::Liability, dec!(220)),
    ];
    let flow = CashFlowGenerator::generate(cf_input(changes, dec!(0), dec!(110))).unwrap();

    let names: Vec<&str> = flow
        .operating
        .working_capital_changes
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    assert!(names.contains(&"PPN Masukan (VAT Input)"));
    assert!(names.contains(&"PPN Keluaran (VAT Output)"));
    assert_eq!(flow.category_total(FlowCategory::OtherWorkingCapitalChange), dec!(110));
}

#[test]
fn test_reconciliation_folds_untracked_cash() {
    let flow = CashFlowGenerator::generate(cf_input(vec![], dec!(1000), dec!(1500))).unwrap();

    assert_eq!(flow.reconciliation_adjustment, dec!(500));
    let line = flow
        .operating
        .adjustments
        .iter()
        .find(|i| i.code == RECONCILIATION_CODE)
        .unwrap();
    assert_eq!(line.category, FlowCategory::OtherNonCashItems);
    assert_eq!(flow.operating.total_adjustments, dec!(500));
    assert_eq!(flow.net_cash_flow, dec!(500));
    assert_eq!(flow.cash_at_end, flow.cash_at_beginning + flow.net_cash_flow);
}

#[test]
fn test_ratios() {
    let changes = vec![
        balance("4101", "Penjualan", AccountType::Revenue, dec!(3000)),
        balance("1601", "Peralatan", AccountType::Asset, dec!(1000)),
    ];
    let flow = CashFlowGenerator::generate(cf_input(changes, dec!(0), dec!(2000))).unwrap();
    assert_eq!(flow.operating.total, dec!(3000));
    assert_eq!(flow.ratios.free_cash_flow, dec!(2000));
    assert_eq!(flow.ratios.operating_cash_flow_ratio, dec!(1.00));

    let flow = CashFlowGenerator::generate(cf_input(vec![], dec!(0), dec!(10))).unwrap();
    assert_eq!(flow.ratios.operating_cash_flow_ratio, Decimal::ZERO);
}

#[test]
fn test_invalid_range() {
    let mut input = cf_input(vec![], dec!(0), dec!(0));
    input.start = date(2025, 1, 1);
    assert_eq!(
        CashFlowGenerator::generate(input),
        Err(ReportError::InvalidDateRange {
            start: date(2025, 1, 1),
            end: date(2024, 12, 31),
        })
    );
}

#[test]
fn test_generation_is_idempotent() {
    let balances = vec![
        balance("1101", "Kas", AccountType::Asset, dec!(900)),
        balance("1240", "PPN Masukan", AccountType::Asset, dec!(100)),
        balance("2103", "PPN Keluaran", AccountType::Liability, dec!(300)),
        balance("3101", "Modal Disetor", AccountType::Equity, dec!(700)),
    ];
    let income = vec![balance("4101", "Penjualan", AccountType::Revenue, dec!(100))];
    let input = bs_input(balances, income);

    let first = BalanceSheetGenerator::generate(input.clone());
    let second = BalanceSheetGenerator::generate(input);
    assert_eq!(first, second);

    let changes = vec![balance("1201", "Piutang", AccountType::Asset, dec!(50))];
    let input = cf_input(changes, dec!(10), dec!(20));
    assert_eq!(
        CashFlowGenerator::generate(input.clone()),
        CashFlowGenerator::generate(input)
    );
}

// ============================================================================
// Properties
// ============================================================================

/// Strategy for a 2-decimal amount in +/- 10 million.
fn amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn positive() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

const ASSET_ACCOUNTS: [(&str, &str); 6] = [
    ("1101", "Kas"),
    ("1201", "Piutang Usaha"),
    ("1301", "Persediaan"),
    ("1240", "PPN Masukan"),
    ("1601", "Peralatan"),
    ("1501", "Investasi"),
];

const LIABILITY_ACCOUNTS: [(&str, &str); 4] = [
    ("2101", "Utang Usaha"),
    ("2103", "PPN Keluaran"),
    ("2121", "Beban Akrual"),
    ("2201", "Utang Bank"),
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* ledger where equity absorbs the residual, the generated
    /// Balance Sheet satisfies Assets = Liabilities + Equity within 0.01,
    /// with or without VAT netting and an open period.
    #[test]
    fn prop_balance_sheet_equation(
        assets in prop::collection::vec(positive(), ASSET_ACCOUNTS.len()),
        liabilities in prop::collection::vec(positive(), LIABILITY_ACCOUNTS.len()),
        revenue in positive(),
        expense in positive(),
    ) {
        let mut balances = Vec::new();
        for ((code, name), net) in ASSET_ACCOUNTS.iter().zip(&assets) {
            balances.push(balance(code, name, AccountType::Asset, *net));
        }
        for ((code, name), net) in LIABILITY_ACCOUNTS.iter().zip(&liabilities) {
            balances.push(balance(code, name, AccountType::Liability, *net));
        }
        let total_assets: Decimal = assets.iter().copied().sum();
        let total_liabilities: Decimal = liabilities.iter().copied().sum();
        let net_income = revenue - expense;
        let capital = total_assets - total_liabilities - net_income;
        balances.push(balance("3101", "Modal Disetor", AccountType::Equity, capital));

        let income = vec![
            balance("4101", "Penjualan", AccountType::Revenue, revenue),
            balance("5101", "Beban", AccountType::Expense, expense),
        ];

        let sheet = BalanceSheetGenerator::generate(bs_input(balances, income));

        prop_assert!(sheet.is_balanced, "difference {}", sheet.balance_difference);
        prop_assert!(sheet.balance_difference.abs() <= dec!(0.01));
        prop_assert_eq!(
            sheet.total_liabilities_and_equity,
            sheet.total_liabilities + sheet.total_equity
        );
        prop_assert_eq!(sheet.current_period_income, Some(net_income));
    }

    /// *For any* set of changes and cash balances, the Cash Flow reconciles
    /// exactly: CashAtEnd == CashAtBeginning + NetCashFlow.
    #[test]
    fn prop_cash_flow_reconciles(
        asset_changes in prop::collection::vec(amount(), ASSET_ACCOUNTS.len()),
        liability_changes in prop::collection::vec(amount(), LIABILITY_ACCOUNTS.len()),
        revenue in amount(),
        beginning in amount(),
        ending in amount(),
    ) {
        let mut changes = Vec::new();
        for ((code, name), net) in ASSET_ACCOUNTS.iter().zip(&asset_changes) {
            changes.push(balance(code, name, AccountType::Asset, *net));
        }
        for ((code, name), net) in LIABILITY_ACCOUNTS.iter().zip(&liability_changes) {
            changes.push(balance(code, name, AccountType::Liability, *net));
        }
        changes.push(balance("4101", "Penjualan", AccountType::Revenue, revenue));

        let flow = CashFlowGenerator::generate(cf_input(changes, beginning, ending)).unwrap();

        prop_assert_eq!(flow.cash_at_end, flow.cash_at_beginning + flow.net_cash_flow);
        prop_assert_eq!(
            flow.net_cash_flow,
            flow.operating.total + flow.investing.total + flow.financing.total
        );
        prop_assert_eq!(
            flow.operating.total,
            flow.operating.net_income
                + flow.operating.total_adjustments
                + flow.operating.total_working_capital_changes
        );
    }

    /// *For any* balanced set of movements where cash is the only balancing
    /// account, no reconciliation adjustment is needed.
    #[test]
    fn prop_complete_ledger_needs_no_adjustment(
        receivable in amount(),
        payable in amount(),
        revenue in amount(),
    ) {
        // Cash moves by exactly what the other accounts imply
        let cash_change = revenue - receivable + payable;
        let changes = vec![
            balance("1101", "Kas", AccountType::Asset, cash_change),
            balance("1201", "Piutang Usaha", AccountType::Asset, receivable),
            balance("2101", "Utang Usaha", AccountType::Liability, payable),
            balance("4101", "Penjualan", AccountType::Revenue, revenue),
        ];
        let flow = CashFlowGenerator::generate(cf_input(changes, dec!(100), dec!(100) + cash_change))
            .unwrap();
        prop_assert_eq!(flow.reconciliation_adjustment, Decimal::ZERO);
    }
}
