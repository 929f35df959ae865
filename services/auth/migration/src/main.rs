use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(bookly_auth_migration::Migrator).await;
}
