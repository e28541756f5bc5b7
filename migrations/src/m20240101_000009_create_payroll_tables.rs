use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240101_000009_create_payroll_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PayrollRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PayrollRuns::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PayrollRuns::CompanyId).big_integer().not_null())
                    .col(ColumnDef::new(PayrollRuns::Month).integer().not_null())
                    .col(ColumnDef::new(PayrollRuns::Year).integer().not_null())
                    .col(ColumnDef::new(PayrollRuns::Status).string().not_null())
                    .col(
                        ColumnDef::new(PayrollRuns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollRuns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payroll_runs_company_period")
                    .table(PayrollRuns::Table)
                    .col(PayrollRuns::CompanyId)
                    .col(PayrollRuns::Year)
                    .col(PayrollRuns::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PayrollItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PayrollItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PayrollItems::PayrollRunId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollItems::EmployeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollItems::BasicSalary)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollItems::Gross)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollItems::Net)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PayrollItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payroll_items_payroll_run_id")
                            .from(PayrollItems::Table, PayrollItems::PayrollRunId)
                            .to(PayrollRuns::Table, PayrollRuns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SalaryAdvances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SalaryAdvances::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvances::CompanyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvances::EmployeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvances::Amount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvances::DeductionMethod)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvances::InstallmentAmount)
                            .decimal_len(12, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvances::TotalDeducted)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvances::RemainingBalance)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SalaryAdvances::Status).string().not_null())
                    .col(
                        ColumnDef::new(SalaryAdvances::ExpectedDeductionMonth)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvances::ExpectedDeductionYear)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvances::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvances::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SalaryAdvanceDeductions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SalaryAdvanceDeductions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvanceDeductions::AdvanceId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvanceDeductions::Amount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvanceDeductions::PayrollMonth)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvanceDeductions::PayrollYear)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalaryAdvanceDeductions::DeductedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_salary_advance_deductions_advance_id")
                            .from(
                                SalaryAdvanceDeductions::Table,
                                SalaryAdvanceDeductions::AdvanceId,
                            )
                            .to(SalaryAdvances::Table, SalaryAdvances::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SalaryAdvanceDeductions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SalaryAdvances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PayrollItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PayrollRuns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PayrollRuns {
    Table,
    Id,
    CompanyId,
    Month,
    Year,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PayrollItems {
    Table,
    Id,
    PayrollRunId,
    EmployeeId,
    BasicSalary,
    Gross,
    Net,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SalaryAdvances {
    Table,
    Id,
    CompanyId,
    EmployeeId,
    Amount,
    DeductionMethod,
    InstallmentAmount,
    TotalDeducted,
    RemainingBalance,
    Status,
    ExpectedDeductionMonth,
    ExpectedDeductionYear,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SalaryAdvanceDeductions {
    Table,
    Id,
    AdvanceId,
    Amount,
    PayrollMonth,
    PayrollYear,
    DeductedAt,
}
