use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240101_000010_create_notification_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PublicHolidays::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PublicHolidays::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PublicHolidays::CompanyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PublicHolidays::HolidayDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PublicHolidays::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notifications::CompanyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notifications::EmployeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notifications::Title).string().not_null())
                    .col(ColumnDef::new(Notifications::Body).text().not_null())
                    .col(ColumnDef::new(Notifications::ReferenceType).string().null())
                    .col(
                        ColumnDef::new(Notifications::ReferenceId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Notifications::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Insert-once guard for notifier reruns.
        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_employee_reference")
                    .table(Notifications::Table)
                    .col(Notifications::EmployeeId)
                    .col(Notifications::ReferenceType)
                    .col(Notifications::ReferenceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DataRetentionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DataRetentionLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DataRetentionLogs::ClockRecordId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DataRetentionLogs::FieldsCleared)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DataRetentionLogs::DeletedBy)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DataRetentionLogs::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DataRetentionLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DataRetentionLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PublicHolidays::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PublicHolidays {
    Table,
    Id,
    CompanyId,
    HolidayDate,
    Name,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    CompanyId,
    EmployeeId,
    Title,
    Body,
    ReferenceType,
    ReferenceId,
    IsRead,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DataRetentionLogs {
    Table,
    Id,
    ClockRecordId,
    FieldsCleared,
    DeletedBy,
    Verified,
    CreatedAt,
}
