use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Loans {
    Table,
    Id,
    Kind,
    Person,
    TotalAmountMinor,
    PaidAmountMinor,
    Currency,
    Status,
    StartDate,
    DueDate,
    Description,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Loans::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Loans::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Loans::Kind).string().not_null())
                    .col(ColumnDef::new(Loans::Person).string().not_null())
                    .col(
                        ColumnDef::new(Loans::TotalAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Loans::PaidAmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Loans::Currency).string().not_null())
                    .col(
                        ColumnDef::new(Loans::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Loans::StartDate).date().not_null())
                    .col(ColumnDef::new(Loans::DueDate).date())
                    .col(ColumnDef::new(Loans::Description).string())
                    .col(ColumnDef::new(Loans::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-loans-status")
                    .table(Loans::Table)
                    .col(Loans::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Loans::Table).to_owned())
            .await
    }
}
