//! Budget projection matrix and its CSV contract.

use std::io;
use std::str::FromStr;

use greenbooks_domain::{
    Books, BudgetProjection, FlowMatrix, MatrixRow, TransactionKind, EXPENSE_ROOT, INCOME_ROOT,
    MONTHS,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, CsvRowError};

/// One validated projection row of a year save.
#[derive(Debug, Clone)]
pub struct BudgetRowInput {
    pub category_id: Uuid,
    pub months: [Decimal; MONTHS],
}

/// Raw budget CSV row, exactly the wire contract: a category name, a type
/// label and twelve month columns plus a total. Amounts stay as strings so
/// a bad cell can be reported per row instead of failing the whole parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetCsvRow {
    pub categoria: String,
    pub tipo: String,
    pub enero: String,
    pub febrero: String,
    pub marzo: String,
    pub abril: String,
    pub mayo: String,
    pub junio: String,
    pub julio: String,
    pub agosto: String,
    pub septiembre: String,
    pub octubre: String,
    pub noviembre: String,
    pub diciembre: String,
    pub total: String,
}

const MONTH_COLUMNS: [&str; MONTHS] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

impl BudgetCsvRow {
    fn from_months(
        categoria: impl Into<String>,
        kind: TransactionKind,
        months: &[Decimal; MONTHS],
    ) -> Self {
        let cell = |index: usize| months[index].to_string();
        Self {
            categoria: categoria.into(),
            tipo: kind.csv_label().to_string(),
            enero: cell(0),
            febrero: cell(1),
            marzo: cell(2),
            abril: cell(3),
            mayo: cell(4),
            junio: cell(5),
            julio: cell(6),
            agosto: cell(7),
            septiembre: cell(8),
            octubre: cell(9),
            noviembre: cell(10),
            diciembre: cell(11),
            total: months.iter().copied().sum::<Decimal>().to_string(),
        }
    }

    fn month_cells(&self) -> [&str; MONTHS] {
        [
            &self.enero,
            &self.febrero,
            &self.marzo,
            &self.abril,
            &self.mayo,
            &self.junio,
            &self.julio,
            &self.agosto,
            &self.septiembre,
            &self.octubre,
            &self.noviembre,
            &self.diciembre,
        ]
    }

    /// Parses the twelve month cells, naming the first offending column.
    fn parse_months(&self) -> Result<[Decimal; MONTHS], String> {
        let mut months = [Decimal::ZERO; MONTHS];
        for (index, cell) in self.month_cells().into_iter().enumerate() {
            let trimmed = cell.trim();
            let value = if trimmed.is_empty() {
                Decimal::ZERO
            } else {
                Decimal::from_str(trimmed)
                    .map_err(|_| format!("invalid amount `{}` in {}", cell, MONTH_COLUMNS[index]))?
            };
            months[index] = value;
        }
        Ok(months)
    }
}

/// Builds and persists the per-year budget projection matrix.
pub struct BudgetService;

impl BudgetService {
    /// Matrix for a year: every active income/expense category as a row,
    /// overlaid with saved projections, plus monthly/yearly totals.
    pub fn matrix(books: &Books, year: i32) -> FlowMatrix {
        let mut rows: Vec<(String, MatrixRow)> = budget_categories(books)
            .map(|(account, kind)| {
                let months = books
                    .budget_for(account.id, year)
                    .map(|projection| projection.months)
                    .unwrap_or([Decimal::ZERO; MONTHS]);
                (
                    account.code.clone(),
                    MatrixRow::new(account.id, account.name.clone(), kind, months),
                )
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        FlowMatrix::from_rows(year, rows.into_iter().map(|(_, row)| row).collect())
    }

    /// Replaces the whole year at once. Validation happens before any
    /// mutation, so a failed save leaves every existing row in place.
    pub fn save_year(books: &mut Books, year: i32, rows: Vec<BudgetRowInput>) -> CoreResult<()> {
        let mut replacement = Vec::with_capacity(rows.len());
        let mut seen = Vec::with_capacity(rows.len());
        for row in rows {
            if seen.contains(&row.category_id) {
                return Err(CoreError::Validation(format!(
                    "duplicate budget row for category {}",
                    row.category_id
                )));
            }
            seen.push(row.category_id);
            let kind = budget_kind(books, row.category_id)?;
            replacement
                .push(BudgetProjection::new(row.category_id, kind, year).with_months(row.months));
        }

        books.budgets.retain(|projection| projection.year != year);
        books.budgets.extend(replacement);
        books.touch();
        info!(year, rows = books.budgets_for_year(year).count(), "budget year saved");
        Ok(())
    }

    /// Reads budget rows from CSV input. Transport is the caller's concern;
    /// only the parsing contract lives here.
    pub fn parse_csv<R: io::Read>(reader: R) -> CoreResult<Vec<BudgetCsvRow>> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();
        for record in csv_reader.deserialize() {
            rows.push(record?);
        }
        Ok(rows)
    }

    /// All-or-nothing import: every invalid row is collected with its row
    /// number, and a single failure rejects the entire year.
    pub fn import_csv(books: &mut Books, year: i32, rows: &[BudgetCsvRow]) -> CoreResult<()> {
        let catalog: Vec<(Uuid, String, TransactionKind)> = budget_categories(books)
            .map(|(account, kind)| (account.id, account.name.to_lowercase(), kind))
            .collect();

        let mut inputs = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            let row_number = index + 1;
            let needle = row.categoria.trim().to_lowercase();
            let found = catalog
                .iter()
                .find(|(_, name, _)| *name == needle)
                .map(|(id, _, kind)| (*id, *kind));
            let Some((category_id, catalog_kind)) = found else {
                errors.push(CsvRowError {
                    row: row_number,
                    category: row.categoria.clone(),
                    reason: "unknown category".into(),
                });
                continue;
            };
            let Some(kind) = TransactionKind::from_csv_label(&row.tipo) else {
                errors.push(CsvRowError {
                    row: row_number,
                    category: row.categoria.clone(),
                    reason: format!("invalid type `{}`", row.tipo),
                });
                continue;
            };
            if kind != catalog_kind {
                errors.push(CsvRowError {
                    row: row_number,
                    category: row.categoria.clone(),
                    reason: format!(
                        "type `{}` disagrees with catalog type `{}`",
                        row.tipo,
                        catalog_kind.csv_label()
                    ),
                });
                continue;
            }
            match row.parse_months() {
                Ok(months) => inputs.push(BudgetRowInput {
                    category_id,
                    months,
                }),
                Err(reason) => errors.push(CsvRowError {
                    row: row_number,
                    category: row.categoria.clone(),
                    reason,
                }),
            }
        }

        if !errors.is_empty() {
            return Err(CoreError::CsvImport(errors));
        }
        Self::save_year(books, year, inputs)
    }

    /// Writes the year's matrix in the import contract's shape: one row per
    /// category with twelve month columns and the per-category total.
    pub fn export_csv<W: io::Write>(books: &Books, year: i32, writer: W) -> CoreResult<()> {
        let matrix = Self::matrix(books, year);
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &matrix.rows {
            csv_writer.serialize(BudgetCsvRow::from_months(
                row.name.clone(),
                row.kind,
                &row.monthly,
            ))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Active income/expense categories (level 2 and below) in chart order.
fn budget_categories(
    books: &Books,
) -> impl Iterator<Item = (&greenbooks_domain::Account, TransactionKind)> {
    books.accounts.iter().filter_map(|account| {
        if !account.is_active || account.level < 2 {
            return None;
        }
        if account.is_under(INCOME_ROOT) {
            Some((account, TransactionKind::Income))
        } else if account.is_under(EXPENSE_ROOT) {
            Some((account, TransactionKind::Expense))
        } else {
            None
        }
    })
}

fn budget_kind(books: &Books, category_id: Uuid) -> CoreResult<TransactionKind> {
    let account = books
        .account(category_id)
        .ok_or_else(|| CoreError::AccountNotFound(category_id.to_string()))?;
    if !account.is_active {
        return Err(CoreError::InactiveCategory(account.code.clone()));
    }
    if account.level >= 2 && account.is_under(INCOME_ROOT) {
        Ok(TransactionKind::Income)
    } else if account.level >= 2 && account.is_under(EXPENSE_ROOT) {
        Ok(TransactionKind::Expense)
    } else {
        Err(CoreError::Validation(format!(
            "account {} is not an income or expense category",
            account.code
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account_service::AccountService;

    fn seeded_books() -> Books {
        let mut books = Books::new("Budget");
        AccountService::seed_default_chart(&mut books).unwrap();
        books
    }

    fn months_with(values: &[(usize, i64)]) -> [Decimal; MONTHS] {
        let mut months = [Decimal::ZERO; MONTHS];
        for (index, cents) in values {
            months[*index] = Decimal::new(*cents, 2);
        }
        months
    }

    #[test]
    fn save_then_get_round_trips_and_defaults_to_zero() {
        let mut books = seeded_books();
        let fees = books.account_by_code("4.01").unwrap().id;
        let maintenance = books.account_by_code("5.01").unwrap().id;

        BudgetService::save_year(
            &mut books,
            2025,
            vec![
                BudgetRowInput {
                    category_id: fees,
                    months: months_with(&[(0, 120000), (1, 120000)]),
                },
                BudgetRowInput {
                    category_id: maintenance,
                    months: months_with(&[(0, 45000)]),
                },
            ],
        )
        .unwrap();

        let matrix = BudgetService::matrix(&books, 2025);
        let fees_row = matrix.row(fees, TransactionKind::Income).unwrap();
        assert_eq!(fees_row.monthly[0], Decimal::new(120000, 2));
        assert_eq!(fees_row.total, Decimal::new(240000, 2));

        // Categories without a saved row default to zero but still appear.
        let rents = books.account_by_code("4.02").unwrap().id;
        let rents_row = matrix.row(rents, TransactionKind::Income).unwrap();
        assert_eq!(rents_row.total, Decimal::ZERO);

        assert_eq!(matrix.yearly_totals.income, Decimal::new(240000, 2));
        assert_eq!(matrix.yearly_totals.expense, Decimal::new(45000, 2));
        assert_eq!(matrix.yearly_totals.net, Decimal::new(195000, 2));
        assert_eq!(matrix.monthly_totals.net[0], Decimal::new(75000, 2));
    }

    #[test]
    fn save_replaces_the_whole_year() {
        let mut books = seeded_books();
        let fees = books.account_by_code("4.01").unwrap().id;
        let rents = books.account_by_code("4.02").unwrap().id;

        BudgetService::save_year(
            &mut books,
            2025,
            vec![BudgetRowInput {
                category_id: fees,
                months: months_with(&[(5, 80000)]),
            }],
        )
        .unwrap();
        BudgetService::save_year(
            &mut books,
            2025,
            vec![BudgetRowInput {
                category_id: rents,
                months: months_with(&[(6, 30000)]),
            }],
        )
        .unwrap();

        assert!(books.budget_for(fees, 2025).is_none(), "stale row removed");
        assert!(books.budget_for(rents, 2025).is_some());
    }

    #[test]
    fn save_rejects_non_budget_categories_without_mutating() {
        let mut books = seeded_books();
        let fees = books.account_by_code("4.01").unwrap().id;
        let cash = books.account_by_code("1.1").unwrap().id;
        BudgetService::save_year(
            &mut books,
            2025,
            vec![BudgetRowInput {
                category_id: fees,
                months: months_with(&[(0, 1000)]),
            }],
        )
        .unwrap();

        let err = BudgetService::save_year(
            &mut books,
            2025,
            vec![BudgetRowInput {
                category_id: cash,
                months: months_with(&[(0, 1)]),
            }],
        )
        .expect_err("cash is not a budget category");
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(
            books.budget_for(fees, 2025).is_some(),
            "failed save must leave the year untouched"
        );
    }

    fn csv_row(categoria: &str, tipo: &str, enero: &str) -> BudgetCsvRow {
        BudgetCsvRow {
            categoria: categoria.into(),
            tipo: tipo.into(),
            enero: enero.into(),
            febrero: String::new(),
            marzo: String::new(),
            abril: String::new(),
            mayo: String::new(),
            junio: String::new(),
            julio: String::new(),
            agosto: String::new(),
            septiembre: String::new(),
            octubre: String::new(),
            noviembre: String::new(),
            diciembre: String::new(),
            total: String::new(),
        }
    }

    #[test]
    fn import_matches_categories_case_insensitively() {
        let mut books = seeded_books();
        let rows = vec![csv_row("PARK ENTRY FEES", "ingreso", "1500.50")];
        BudgetService::import_csv(&mut books, 2025, &rows).unwrap();

        let fees = books.account_by_code("4.01").unwrap().id;
        let saved = books.budget_for(fees, 2025).unwrap();
        assert_eq!(saved.months[0], Decimal::new(150050, 2));
        assert_eq!(saved.kind, TransactionKind::Income);
    }

    #[test]
    fn import_is_all_or_nothing() {
        let mut books = seeded_books();
        let fees = books.account_by_code("4.01").unwrap().id;
        BudgetService::save_year(
            &mut books,
            2025,
            vec![BudgetRowInput {
                category_id: fees,
                months: months_with(&[(0, 99900)]),
            }],
        )
        .unwrap();

        let rows = vec![
            csv_row("Park Entry Fees", "ingreso", "100"),
            csv_row("No Such Category", "gasto", "50"),
            csv_row("Park Maintenance", "ingreso", "25"),
            csv_row("Utilities", "gasto", "not-a-number"),
        ];
        let err = BudgetService::import_csv(&mut books, 2025, &rows)
            .expect_err("import with bad rows must fail");
        let CoreError::CsvImport(errors) = err else {
            panic!("expected CsvImport error");
        };
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].row, 2);
        assert!(errors[0].reason.contains("unknown category"));
        assert!(errors[1].reason.contains("disagrees"));
        assert!(errors[2].reason.contains("invalid amount"));

        // The prior save is fully intact.
        let saved = books.budget_for(fees, 2025).unwrap();
        assert_eq!(saved.months[0], Decimal::new(99900, 2));
        assert_eq!(books.budgets_for_year(2025).count(), 1);
    }

    #[test]
    fn export_then_import_round_trips() {
        let mut books = seeded_books();
        let fees = books.account_by_code("4.01").unwrap().id;
        let payroll = books.account_by_code("5.02").unwrap().id;
        BudgetService::save_year(
            &mut books,
            2026,
            vec![
                BudgetRowInput {
                    category_id: fees,
                    months: months_with(&[(0, 123456), (11, 654321)]),
                },
                BudgetRowInput {
                    category_id: payroll,
                    months: months_with(&[(3, 500000)]),
                },
            ],
        )
        .unwrap();

        let mut buffer = Vec::new();
        BudgetService::export_csv(&books, 2026, &mut buffer).unwrap();
        let rows = BudgetService::parse_csv(buffer.as_slice()).unwrap();
        assert_eq!(rows.len(), 9, "one row per active budget category");

        let mut reloaded = seeded_books();
        BudgetService::import_csv(&mut reloaded, 2026, &rows).unwrap();
        let original = BudgetService::matrix(&books, 2026);
        let round_tripped = BudgetService::matrix(&reloaded, 2026);
        assert_eq!(original.yearly_totals, round_tripped.yearly_totals);
        assert_eq!(
            original.rows.iter().map(|row| row.total).collect::<Vec<_>>(),
            round_tripped
                .rows
                .iter()
                .map(|row| row.total)
                .collect::<Vec<_>>()
        );
    }
}
