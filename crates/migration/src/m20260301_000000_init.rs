//! Initial schema.
//!
//! - `utility_entries`: one row per recorded usage
//! - `utility_settings`: last-used unit price per owner and type
//! - `user_preferences`: display currency per owner
//!
//! Amounts are stored as decimal strings so no precision is lost to floats.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum UtilityEntries {
    Table,
    Id,
    OwnerId,
    #[iden = "type"]
    Kind,
    UsageAmount,
    UnitPrice,
    CostAmount,
    Unit,
    Date,
    CreatedAt,
}

#[derive(Iden)]
enum UtilitySettings {
    Table,
    OwnerId,
    #[iden = "type"]
    Kind,
    UnitPrice,
    UpdatedAt,
}

#[derive(Iden)]
enum UserPreferences {
    Table,
    OwnerId,
    Currency,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UtilityEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UtilityEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UtilityEntries::OwnerId).string().not_null())
                    .col(ColumnDef::new(UtilityEntries::Kind).string().not_null())
                    .col(ColumnDef::new(UtilityEntries::UsageAmount).string().not_null())
                    .col(ColumnDef::new(UtilityEntries::UnitPrice).string())
                    .col(ColumnDef::new(UtilityEntries::CostAmount).string().not_null())
                    .col(ColumnDef::new(UtilityEntries::Unit).string().not_null())
                    .col(ColumnDef::new(UtilityEntries::Date).date().not_null())
                    .col(
                        ColumnDef::new(UtilityEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-utility_entries-owner_id")
                    .table(UtilityEntries::Table)
                    .col(UtilityEntries::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-utility_entries-owner_id-date")
                    .table(UtilityEntries::Table)
                    .col(UtilityEntries::OwnerId)
                    .col(UtilityEntries::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UtilitySettings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UtilitySettings::OwnerId).string().not_null())
                    .col(ColumnDef::new(UtilitySettings::Kind).string().not_null())
                    .col(ColumnDef::new(UtilitySettings::UnitPrice).string().not_null())
                    .col(
                        ColumnDef::new(UtilitySettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(UtilitySettings::OwnerId)
                            .col(UtilitySettings::Kind),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserPreferences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserPreferences::OwnerId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserPreferences::Currency).string().not_null())
                    .col(
                        ColumnDef::new(UserPreferences::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserPreferences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UtilitySettings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UtilityEntries::Table).to_owned())
            .await
    }
}
