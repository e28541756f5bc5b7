use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240101_000005_create_commission_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OutletSales::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OutletSales::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OutletSales::CompanyId).big_integer().not_null())
                    .col(ColumnDef::new(OutletSales::OutletId).big_integer().null())
                    .col(ColumnDef::new(OutletSales::DepartmentId).big_integer().null())
                    .col(ColumnDef::new(OutletSales::PeriodMonth).integer().not_null())
                    .col(ColumnDef::new(OutletSales::PeriodYear).integer().not_null())
                    .col(
                        ColumnDef::new(OutletSales::TotalSales)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OutletSales::CommissionRate)
                            .decimal_len(6, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OutletSales::CommissionPool)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OutletSales::TotalEffectiveShifts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OutletSales::PerShiftValue)
                            .decimal_len(14, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OutletSales::Status).string().not_null())
                    .col(ColumnDef::new(OutletSales::FinalizedBy).big_integer().null())
                    .col(
                        ColumnDef::new(OutletSales::FinalizedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(OutletSales::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OutletSales::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One sales row per outlet-period and per department-period.
        manager
            .create_index(
                Index::create()
                    .name("idx_outlet_sales_outlet_period")
                    .table(OutletSales::Table)
                    .col(OutletSales::OutletId)
                    .col(OutletSales::PeriodYear)
                    .col(OutletSales::PeriodMonth)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_outlet_sales_department_period")
                    .table(OutletSales::Table)
                    .col(OutletSales::DepartmentId)
                    .col(OutletSales::PeriodYear)
                    .col(OutletSales::PeriodMonth)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CommissionPayouts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommissionPayouts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CommissionPayouts::OutletSalesId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionPayouts::EmployeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionPayouts::NormalShifts)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionPayouts::PhShifts)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionPayouts::EffectiveShifts)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionPayouts::CommissionAmount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionPayouts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commission_payouts_outlet_sales_id")
                            .from(CommissionPayouts::Table, CommissionPayouts::OutletSalesId)
                            .to(OutletSales::Table, OutletSales::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_commission_payouts_sales_employee")
                    .table(CommissionPayouts::Table)
                    .col(CommissionPayouts::OutletSalesId)
                    .col(CommissionPayouts::EmployeeId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommissionPayouts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OutletSales::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OutletSales {
    Table,
    Id,
    CompanyId,
    OutletId,
    DepartmentId,
    PeriodMonth,
    PeriodYear,
    TotalSales,
    CommissionRate,
    CommissionPool,
    TotalEffectiveShifts,
    PerShiftValue,
    Status,
    FinalizedBy,
    FinalizedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CommissionPayouts {
    Table,
    Id,
    OutletSalesId,
    EmployeeId,
    NormalShifts,
    PhShifts,
    EffectiveShifts,
    CommissionAmount,
    CreatedAt,
}
