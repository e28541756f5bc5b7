use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240101_000002_create_employees_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employees::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Employees::CompanyId).big_integer().not_null())
                    .col(ColumnDef::new(Employees::OutletId).big_integer().null())
                    .col(ColumnDef::new(Employees::DepartmentId).big_integer().null())
                    .col(ColumnDef::new(Employees::PositionId).big_integer().null())
                    .col(ColumnDef::new(Employees::EmployeeCode).string().not_null())
                    .col(ColumnDef::new(Employees::Name).string().not_null())
                    .col(ColumnDef::new(Employees::IcNumber).string().not_null())
                    .col(ColumnDef::new(Employees::JoinDate).date().not_null())
                    .col(ColumnDef::new(Employees::Status).string().not_null())
                    .col(
                        ColumnDef::new(Employees::EmploymentStatus)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Employees::LastWorkingDay).date().null())
                    .col(ColumnDef::new(Employees::ResignDate).date().null())
                    .col(
                        ColumnDef::new(Employees::DefaultBasicSalary)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Employees::DefaultBonus)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Employees::OtRate)
                            .decimal_len(6, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Employees::MaritalStatus).string().null())
                    .col(
                        ColumnDef::new(Employees::SpouseWorking)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Employees::ChildrenCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Employees::Region).string().null())
                    .col(
                        ColumnDef::new(Employees::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Employees::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_company_id")
                            .from(Employees::Table, Employees::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Employee code is the external identity, unique per tenant.
        manager
            .create_index(
                Index::create()
                    .name("idx_employees_company_code")
                    .table(Employees::Table)
                    .col(Employees::CompanyId)
                    .col(Employees::EmployeeCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_employees_company_status")
                    .table(Employees::Table)
                    .col(Employees::CompanyId)
                    .col(Employees::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Employees::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
    CompanyId,
    OutletId,
    DepartmentId,
    PositionId,
    EmployeeCode,
    Name,
    IcNumber,
    JoinDate,
    Status,
    EmploymentStatus,
    LastWorkingDay,
    ResignDate,
    DefaultBasicSalary,
    DefaultBonus,
    OtRate,
    MaritalStatus,
    SpouseWorking,
    ChildrenCount,
    Region,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
}
