//! Create cards table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cards::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Cards::CardNumber).string().not_null())
                    .col(ColumnDef::new(Cards::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Cards::ExpirationDate).date().not_null())
                    .col(
                        ColumnDef::new(Cards::Status)
                            .string_len(20)
                            .not_null()
                            .default("ACTIVE"),
                    )
                    // Minor units: SQLite has no exact decimal column
                    .col(
                        ColumnDef::new(Cards::BalanceCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cards_user")
                            .from(Cards::Table, Cards::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Owner listing
        manager
            .create_index(
                Index::create()
                    .name("idx_cards_user_id")
                    .table(Cards::Table)
                    .col(Cards::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cards_status")
                    .table(Cards::Table)
                    .col(Cards::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Cards {
    Table,
    Id,
    CardNumber,
    UserId,
    ExpirationDate,
    Status,
    BalanceCents,
}
