use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240101_000003_create_schedule_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShiftTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShiftTemplates::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ShiftTemplates::CompanyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ShiftTemplates::Code).string().not_null())
                    .col(ColumnDef::new(ShiftTemplates::Name).string().not_null())
                    .col(ColumnDef::new(ShiftTemplates::StartTime).time().not_null())
                    .col(ColumnDef::new(ShiftTemplates::EndTime).time().not_null())
                    .col(ColumnDef::new(ShiftTemplates::Color).string().null())
                    .col(
                        ColumnDef::new(ShiftTemplates::IsOff)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ShiftTemplates::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ShiftTemplates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShiftTemplates::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Schedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Schedules::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Schedules::CompanyId).big_integer().not_null())
                    .col(ColumnDef::new(Schedules::EmployeeId).big_integer().not_null())
                    .col(ColumnDef::new(Schedules::OutletId).big_integer().null())
                    .col(ColumnDef::new(Schedules::DepartmentId).big_integer().null())
                    .col(ColumnDef::new(Schedules::ScheduleDate).date().not_null())
                    .col(
                        ColumnDef::new(Schedules::ShiftTemplateId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Schedules::StartTime).time().null())
                    .col(ColumnDef::new(Schedules::EndTime).time().null())
                    .col(
                        ColumnDef::new(Schedules::IsPublicHoliday)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Schedules::Status).string().not_null())
                    .col(ColumnDef::new(Schedules::CreatedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Schedules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Schedules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedules_shift_template_id")
                            .from(Schedules::Table, Schedules::ShiftTemplateId)
                            .to(ShiftTemplates::Table, ShiftTemplates::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Daily uniqueness: one roster row per employee per date.
        manager
            .create_index(
                Index::create()
                    .name("idx_schedules_employee_date")
                    .table(Schedules::Table)
                    .col(Schedules::EmployeeId)
                    .col(Schedules::ScheduleDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_schedules_company_date")
                    .table(Schedules::Table)
                    .col(Schedules::CompanyId)
                    .col(Schedules::ScheduleDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExtraShiftRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExtraShiftRequests::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExtraShiftRequests::CompanyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtraShiftRequests::EmployeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtraShiftRequests::ShiftDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExtraShiftRequests::ShiftTemplateId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(ExtraShiftRequests::Reason).text().null())
                    .col(ColumnDef::new(ExtraShiftRequests::Status).string().not_null())
                    .col(
                        ColumnDef::new(ExtraShiftRequests::DecidedBy)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ExtraShiftRequests::DecidedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ExtraShiftRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExtraShiftRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Schedules::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShiftTemplates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShiftTemplates {
    Table,
    Id,
    CompanyId,
    Code,
    Name,
    StartTime,
    EndTime,
    Color,
    IsOff,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Schedules {
    Table,
    Id,
    CompanyId,
    EmployeeId,
    OutletId,
    DepartmentId,
    ScheduleDate,
    ShiftTemplateId,
    StartTime,
    EndTime,
    IsPublicHoliday,
    Status,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExtraShiftRequests {
    Table,
    Id,
    CompanyId,
    EmployeeId,
    ShiftDate,
    ShiftTemplateId,
    Reason,
    Status,
    DecidedBy,
    DecidedAt,
    CreatedAt,
}
