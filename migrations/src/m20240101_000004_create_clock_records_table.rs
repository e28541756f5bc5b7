use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240101_000004_create_clock_records_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClockRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClockRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClockRecords::CompanyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClockRecords::EmployeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClockRecords::OutletId).big_integer().null())
                    .col(ColumnDef::new(ClockRecords::WorkDate).date().not_null())
                    .col(ColumnDef::new(ClockRecords::ClockIn1).time().null())
                    .col(ColumnDef::new(ClockRecords::ClockOut1).time().null())
                    .col(ColumnDef::new(ClockRecords::ClockIn2).time().null())
                    .col(ColumnDef::new(ClockRecords::ClockOut2).time().null())
                    .col(ColumnDef::new(ClockRecords::LocationIn1).string().null())
                    .col(ColumnDef::new(ClockRecords::LocationOut1).string().null())
                    .col(ColumnDef::new(ClockRecords::LocationIn2).string().null())
                    .col(ColumnDef::new(ClockRecords::LocationOut2).string().null())
                    .col(ColumnDef::new(ClockRecords::PhotoIn1).string().null())
                    .col(ColumnDef::new(ClockRecords::PhotoOut1).string().null())
                    .col(ColumnDef::new(ClockRecords::PhotoIn2).string().null())
                    .col(ColumnDef::new(ClockRecords::PhotoOut2).string().null())
                    .col(
                        ColumnDef::new(ClockRecords::TotalWorkMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ClockRecords::TotalBreakMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ClockRecords::OtMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ClockRecords::Status).string().not_null())
                    .col(
                        ColumnDef::new(ClockRecords::IsAutoClockOut)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ClockRecords::NeedsAdminReview)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ClockRecords::HasSchedule)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ClockRecords::OtApproved).boolean().null())
                    .col(ColumnDef::new(ClockRecords::OtDecidedBy).big_integer().null())
                    .col(
                        ColumnDef::new(ClockRecords::OtDecidedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ClockRecords::OtRejectReason).text().null())
                    .col(ColumnDef::new(ClockRecords::ApprovedBy).big_integer().null())
                    .col(
                        ColumnDef::new(ClockRecords::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ClockRecords::RejectReason).text().null())
                    .col(ColumnDef::new(ClockRecords::ReviewedBy).big_integer().null())
                    .col(
                        ColumnDef::new(ClockRecords::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ClockRecords::Notes).text().null())
                    .col(
                        ColumnDef::new(ClockRecords::MediaDeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ClockRecords::MediaRetentionEligibleAt)
                            .date()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ClockRecords::MediaDeletionLogged)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ClockRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClockRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Daily uniqueness: one attendance row per employee per date.
        manager
            .create_index(
                Index::create()
                    .name("idx_clock_records_employee_date")
                    .table(ClockRecords::Table)
                    .col(ClockRecords::EmployeeId)
                    .col(ClockRecords::WorkDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_clock_records_company_date")
                    .table(ClockRecords::Table)
                    .col(ClockRecords::CompanyId)
                    .col(ClockRecords::WorkDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClockRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClockRecords {
    Table,
    Id,
    CompanyId,
    EmployeeId,
    OutletId,
    WorkDate,
    #[sea_orm(iden = "clock_in_1")]
    ClockIn1,
    #[sea_orm(iden = "clock_out_1")]
    ClockOut1,
    #[sea_orm(iden = "clock_in_2")]
    ClockIn2,
    #[sea_orm(iden = "clock_out_2")]
    ClockOut2,
    #[sea_orm(iden = "location_in_1")]
    LocationIn1,
    #[sea_orm(iden = "location_out_1")]
    LocationOut1,
    #[sea_orm(iden = "location_in_2")]
    LocationIn2,
    #[sea_orm(iden = "location_out_2")]
    LocationOut2,
    #[sea_orm(iden = "photo_in_1")]
    PhotoIn1,
    #[sea_orm(iden = "photo_out_1")]
    PhotoOut1,
    #[sea_orm(iden = "photo_in_2")]
    PhotoIn2,
    #[sea_orm(iden = "photo_out_2")]
    PhotoOut2,
    TotalWorkMinutes,
    TotalBreakMinutes,
    OtMinutes,
    Status,
    IsAutoClockOut,
    NeedsAdminReview,
    HasSchedule,
    OtApproved,
    OtDecidedBy,
    OtDecidedAt,
    OtRejectReason,
    ApprovedBy,
    ApprovedAt,
    RejectReason,
    ReviewedBy,
    ReviewedAt,
    Notes,
    MediaDeletedAt,
    MediaRetentionEligibleAt,
    MediaDeletionLogged,
    CreatedAt,
    UpdatedAt,
}
