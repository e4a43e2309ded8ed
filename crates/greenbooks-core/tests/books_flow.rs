//! End-to-end flow over one set of books: record transactions, aggregate
//! reports, plan a budget year and compare it with realized figures.

use chrono::NaiveDate;
use greenbooks_core::{
    books_warnings, AccountService, BudgetRowInput, BudgetService, CashflowService, CoreError,
    JournalService, NewTransaction, ReportService,
};
use greenbooks_domain::{Books, Period, TransactionKind, MONTHS};
use rust_decimal::Decimal;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn record(
    books: &mut Books,
    kind: TransactionKind,
    cents: i64,
    date: NaiveDate,
    category_code: &str,
) {
    let category_id = books.account_by_code(category_code).unwrap().id;
    let recorded = JournalService::record_transaction(
        books,
        NewTransaction {
            kind,
            amount: Decimal::new(cents, 2),
            date,
            category_id,
            description: format!("{kind} on {date}"),
            reference: None,
        },
        None,
    )
    .expect("recording must succeed");
    assert!(recorded.warning.is_none());
}

#[test]
fn a_quarter_of_park_activity_flows_through_every_report() {
    init_tracing();
    let mut books = Books::new("Central Parks 2025");
    AccountService::seed_default_chart(&mut books).unwrap();

    let date = |month, day| NaiveDate::from_ymd_opt(2025, month, day).unwrap();
    record(&mut books, TransactionKind::Income, 120000, date(1, 8), "4.01");
    record(&mut books, TransactionKind::Income, 45000, date(2, 11), "4.02");
    record(&mut books, TransactionKind::Expense, 30000, date(2, 14), "5.01");
    record(&mut books, TransactionKind::Income, 118000, date(3, 9), "4.01");
    record(&mut books, TransactionKind::Expense, 52000, date(3, 20), "5.02");

    // Every recorded transaction carries a posted, balanced entry.
    assert_eq!(books.entries.len(), 5);
    for entry in &books.entries {
        assert!(entry.is_posted());
        assert!(entry.is_balanced());
        assert_eq!(entry.lines.len(), 2);
    }
    assert!(books_warnings(&books).is_empty());

    // Trial balance for February sees January as opening activity.
    let february = ReportService::trial_balance(&books, Period::new(2025, 2).unwrap());
    let cash = february
        .rows
        .iter()
        .find(|row| row.code.as_deref() == Some("1.1"))
        .unwrap();
    assert_eq!(cash.opening, Decimal::new(120000, 2));
    assert_eq!(cash.ending, Decimal::new(135000, 2));
    assert_eq!(february.total_debits, february.total_credits);

    // The income statement nets the realized quarter.
    let statement = ReportService::income_statement(&books, date(3, 31));
    assert_eq!(statement.total_revenue, Decimal::new(283000, 2));
    assert_eq!(statement.total_expenses, Decimal::new(82000, 2));
    assert_eq!(statement.net_income, Decimal::new(201000, 2));

    // Plan the year and compare against what actually happened.
    let fees = books.account_by_code("4.01").unwrap().id;
    let mut fee_plan = [Decimal::ZERO; MONTHS];
    fee_plan[0] = Decimal::new(110000, 2);
    fee_plan[2] = Decimal::new(110000, 2);
    BudgetService::save_year(
        &mut books,
        2025,
        vec![BudgetRowInput {
            category_id: fees,
            months: fee_plan,
        }],
    )
    .unwrap();

    let comparisons = CashflowService::budget_vs_actual(&books, 2025);
    let fees_cmp = comparisons
        .iter()
        .find(|cmp| cmp.category_id == fees)
        .unwrap();
    assert_eq!(fees_cmp.budgeted, Decimal::new(220000, 2));
    assert_eq!(fees_cmp.actual, Decimal::new(238000, 2));
    assert_eq!(fees_cmp.variance, Decimal::new(18000, 2));

    let realized = CashflowService::realized_matrix(&books, 2025);
    assert_eq!(realized.yearly_totals.net, Decimal::new(201000, 2));
}

#[test]
fn csv_import_failure_leaves_the_planned_year_untouched() {
    let mut books = Books::new("Import");
    AccountService::seed_default_chart(&mut books).unwrap();
    let fees = books.account_by_code("4.01").unwrap().id;

    let mut months = [Decimal::ZERO; MONTHS];
    months[6] = Decimal::new(70000, 2);
    BudgetService::save_year(
        &mut books,
        2025,
        vec![BudgetRowInput {
            category_id: fees,
            months,
        }],
    )
    .unwrap();

    let csv = "categoria,tipo,enero,febrero,marzo,abril,mayo,junio,julio,agosto,septiembre,octubre,noviembre,diciembre,total\n\
               Park Entry Fees,ingreso,100,0,0,0,0,0,0,0,0,0,0,0,100\n\
               Imaginary Fund,ingreso,50,0,0,0,0,0,0,0,0,0,0,0,50\n";
    let rows = BudgetService::parse_csv(csv.as_bytes()).unwrap();
    let err = BudgetService::import_csv(&mut books, 2025, &rows)
        .expect_err("unknown category must reject the import");
    assert!(matches!(err, CoreError::CsvImport(_)));

    let matrix = BudgetService::matrix(&books, 2025);
    let fees_row = matrix
        .rows
        .iter()
        .find(|row| row.category_id == fees)
        .unwrap();
    assert_eq!(fees_row.monthly[6], Decimal::new(70000, 2));
    assert_eq!(fees_row.monthly[0], Decimal::ZERO);
}

#[test]
fn deferred_entries_catch_up_once_the_chart_is_complete() {
    init_tracing();
    let mut books = Books::new("Deferred");
    AccountService::seed_default_chart(&mut books).unwrap();

    // Remove the cash subtree so generation has no mapping.
    for code in ["1.1.01", "1.1.02", "1.1"] {
        let id = books.account_by_code(code).unwrap().id;
        AccountService::deactivate(&mut books, id).unwrap();
    }

    let fees = books.account_by_code("4.01").unwrap().id;
    let recorded = JournalService::record_transaction(
        &mut books,
        NewTransaction {
            kind: TransactionKind::Income,
            amount: Decimal::new(64000, 2),
            date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            category_id: fees,
            description: "weekend fees".into(),
            reference: None,
        },
        None,
    )
    .unwrap();
    assert!(recorded.entry_id.is_none());
    assert!(recorded.warning.is_some());

    let cash = books.account_by_code("1.1").unwrap().id;
    AccountService::reactivate(&mut books, cash).unwrap();

    let first = JournalService::generate_missing_entries(&mut books, 10, None);
    assert_eq!(first.generated, 1);
    assert!(first.failures.is_empty());

    let second = JournalService::generate_missing_entries(&mut books, 10, None);
    assert_eq!(second.scanned, 0);

    let linked = books.transaction(recorded.transaction_id).unwrap();
    assert!(linked.journal_entry_id.is_some());
}
