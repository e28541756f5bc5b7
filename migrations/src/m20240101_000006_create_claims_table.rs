use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240101_000006_create_claims_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Claims::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Claims::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Claims::CompanyId).big_integer().not_null())
                    .col(ColumnDef::new(Claims::EmployeeId).big_integer().not_null())
                    .col(ColumnDef::new(Claims::ClaimDate).date().not_null())
                    .col(ColumnDef::new(Claims::Category).string().not_null())
                    .col(ColumnDef::new(Claims::Amount).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Claims::Description).text().null())
                    .col(ColumnDef::new(Claims::ReceiptPath).string().null())
                    .col(ColumnDef::new(Claims::ReceiptHash).string().null())
                    .col(ColumnDef::new(Claims::Status).string().not_null())
                    .col(ColumnDef::new(Claims::AiAmount).decimal_len(12, 2).null())
                    .col(ColumnDef::new(Claims::AiMerchant).string().null())
                    .col(ColumnDef::new(Claims::AiDate).date().null())
                    .col(ColumnDef::new(Claims::AiConfidence).string().null())
                    .col(ColumnDef::new(Claims::AiCurrency).string().null())
                    .col(
                        ColumnDef::new(Claims::AutoApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Claims::AmountCapped)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Claims::ApprovedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Claims::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Claims::RejectReason).text().null())
                    .col(
                        ColumnDef::new(Claims::LinkedPayrollItemId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Claims::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Claims::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Receipt dedupe scans by hash within a tenant.
        manager
            .create_index(
                Index::create()
                    .name("idx_claims_company_hash")
                    .table(Claims::Table)
                    .col(Claims::CompanyId)
                    .col(Claims::ReceiptHash)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_claims_employee_status")
                    .table(Claims::Table)
                    .col(Claims::EmployeeId)
                    .col(Claims::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Claims::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Claims {
    Table,
    Id,
    CompanyId,
    EmployeeId,
    ClaimDate,
    Category,
    Amount,
    Description,
    ReceiptPath,
    ReceiptHash,
    Status,
    AiAmount,
    AiMerchant,
    AiDate,
    AiConfidence,
    AiCurrency,
    AutoApproved,
    AmountCapped,
    ApprovedBy,
    ApprovedAt,
    RejectReason,
    LinkedPayrollItemId,
    CreatedAt,
    UpdatedAt,
}
