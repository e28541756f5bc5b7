use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240101_000008_create_resignation_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Resignations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Resignations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Resignations::CompanyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Resignations::EmployeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Resignations::NoticeDate).date().not_null())
                    .col(
                        ColumnDef::new(Resignations::LastWorkingDay)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Resignations::Reason).text().null())
                    .col(ColumnDef::new(Resignations::Status).string().not_null())
                    .col(
                        ColumnDef::new(Resignations::RequiredNoticeDays)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Resignations::ActualNoticeDays)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Resignations::NoticeWaived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Resignations::ClearanceCompleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Resignations::SettlementBreakdown)
                            .json()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Resignations::SettlementNet)
                            .decimal_len(12, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Resignations::SettlementDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Resignations::ProcessedBy).big_integer().null())
                    .col(ColumnDef::new(Resignations::ApprovedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Resignations::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Resignations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Resignations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_resignations_employee_status")
                    .table(Resignations::Table)
                    .col(Resignations::EmployeeId)
                    .col(Resignations::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExitClearanceItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExitClearanceItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExitClearanceItems::ResignationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExitClearanceItems::Name).string().not_null())
                    .col(
                        ColumnDef::new(ExitClearanceItems::Description)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ExitClearanceItems::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ExitClearanceItems::IsCompleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ExitClearanceItems::CompletedBy)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ExitClearanceItems::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exit_clearance_items_resignation_id")
                            .from(
                                ExitClearanceItems::Table,
                                ExitClearanceItems::ResignationId,
                            )
                            .to(Resignations::Table, Resignations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ClearanceTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClearanceTemplates::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClearanceTemplates::CompanyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClearanceTemplates::Name).string().not_null())
                    .col(
                        ColumnDef::new(ClearanceTemplates::Description)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ClearanceTemplates::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ClearanceTemplates::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClearanceTemplates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExitClearanceItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Resignations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Resignations {
    Table,
    Id,
    CompanyId,
    EmployeeId,
    NoticeDate,
    LastWorkingDay,
    Reason,
    Status,
    RequiredNoticeDays,
    ActualNoticeDays,
    NoticeWaived,
    ClearanceCompleted,
    SettlementBreakdown,
    SettlementNet,
    SettlementDate,
    ProcessedBy,
    ApprovedBy,
    ApprovedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExitClearanceItems {
    Table,
    Id,
    ResignationId,
    Name,
    Description,
    SortOrder,
    IsCompleted,
    CompletedBy,
    CompletedAt,
}

#[derive(DeriveIden)]
enum ClearanceTemplates {
    Table,
    Id,
    CompanyId,
    Name,
    Description,
    SortOrder,
    IsActive,
}
