//! Default merch catalog.

use sea_orm::{ConnectionTrait, DbErr};
use sea_orm_migration::prelude::*;
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Merch {
    Table,
    Id,
    Name,
    Price,
}

const CATALOG: [(&str, i64); 10] = [
    ("t-shirt", 80),
    ("cup", 20),
    ("book", 50),
    ("pen", 10),
    ("powerbank", 200),
    ("hoody", 300),
    ("umbrella", 200),
    ("socks", 10),
    ("wallet", 50),
    ("pink-hoody", 500),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        let mut stmt = Query::insert()
            .into_table(Merch::Table)
            .columns([Merch::Id, Merch::Name, Merch::Price])
            .to_owned();
        for (name, price) in CATALOG {
            stmt.values_panic([Uuid::new_v4().to_string().into(), name.into(), price.into()]);
        }

        db.execute(backend.build(&stmt)).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        let stmt = Query::delete()
            .from_table(Merch::Table)
            .and_where(Expr::col(Merch::Name).is_in(CATALOG.map(|(name, _)| name)))
            .to_owned();

        db.execute(backend.build(&stmt)).await?;
        Ok(())
    }
}
