use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240601_000001_create_rates_table::Migration)]
    }
}

mod m20240601_000001_create_rates_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_rates_table"
        }
    }

    #[allow(elided_lifetimes_in_paths)]
    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Rates::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Rates::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Rates::Provider).string_len(100).not_null())
                        .col(ColumnDef::new(Rates::Rate).decimal_len(12, 4).not_null())
                        .col(ColumnDef::new(Rates::Currency).string_len(3).not_null())
                        .col(
                            ColumnDef::new(Rates::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(Rates::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            // Providers are stored title-cased, so this pair index is case-insensitive
            // on provider for every record written through the entity.
            manager
                .create_index(
                    Index::create()
                        .name("idx_rates_provider_currency")
                        .table(Rates::Table)
                        .col(Rates::Provider)
                        .col(Rates::Currency)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_rates_provider")
                        .table(Rates::Table)
                        .col(Rates::Provider)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_rates_currency")
                        .table(Rates::Table)
                        .col(Rates::Currency)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Rates::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Rates {
        Table,
        Id,
        Provider,
        Rate,
        Currency,
        CreatedAt,
        UpdatedAt,
    }
}
