use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240101_000007_create_leave_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LeaveTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveTypes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeaveTypes::CompanyId).big_integer().not_null())
                    .col(ColumnDef::new(LeaveTypes::Code).string().not_null())
                    .col(ColumnDef::new(LeaveTypes::Name).string().not_null())
                    .col(
                        ColumnDef::new(LeaveTypes::IsPaid)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LeaveTypes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LeaveBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveBalances::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LeaveBalances::CompanyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveBalances::EmployeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveBalances::LeaveTypeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LeaveBalances::Year).integer().not_null())
                    .col(
                        ColumnDef::new(LeaveBalances::EntitledDays)
                            .decimal_len(6, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveBalances::CarriedForward)
                            .decimal_len(6, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveBalances::UsedDays)
                            .decimal_len(6, 2)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leave_balances_employee_type_year")
                    .table(LeaveBalances::Table)
                    .col(LeaveBalances::EmployeeId)
                    .col(LeaveBalances::LeaveTypeId)
                    .col(LeaveBalances::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LeaveRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveRequests::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::CompanyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::EmployeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::LeaveTypeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LeaveRequests::StartDate).date().not_null())
                    .col(ColumnDef::new(LeaveRequests::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(LeaveRequests::TotalDays)
                            .decimal_len(6, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LeaveRequests::Reason).text().null())
                    .col(ColumnDef::new(LeaveRequests::Status).string().not_null())
                    .col(ColumnDef::new(LeaveRequests::ApprovedBy).big_integer().null())
                    .col(
                        ColumnDef::new(LeaveRequests::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(LeaveRequests::RejectReason).text().null())
                    .col(
                        ColumnDef::new(LeaveRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LeaveRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LeaveBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LeaveTypes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LeaveTypes {
    Table,
    Id,
    CompanyId,
    Code,
    Name,
    IsPaid,
    IsActive,
}

#[derive(DeriveIden)]
enum LeaveBalances {
    Table,
    Id,
    CompanyId,
    EmployeeId,
    LeaveTypeId,
    Year,
    EntitledDays,
    CarriedForward,
    UsedDays,
}

#[derive(DeriveIden)]
enum LeaveRequests {
    Table,
    Id,
    CompanyId,
    EmployeeId,
    LeaveTypeId,
    StartDate,
    EndDate,
    TotalDays,
    Reason,
    Status,
    ApprovedBy,
    ApprovedAt,
    RejectReason,
    CreatedAt,
    UpdatedAt,
}
