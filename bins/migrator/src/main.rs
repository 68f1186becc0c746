//! Database migration runner for Sairex.
//!
//! Usage:
//!   migrator up      - Create the billing schema
//!   migrator down    - Drop it again
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop everything and re-run migrations
//!
//! Reads `DATABASE_URL`, also from `.env`.

use sea_orm_migration::prelude::*;
use sairex_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The CLI sets up its own tracing
    cli::run_cli(Migrator).await;
}
