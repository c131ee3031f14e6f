//! Operator CLI for minting outside the API, e.g. pre-seeding the warehouse
//! pool before a production run.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;

use truetag::domain::model::Batch;
use truetag::infra::chain::{token_id_for_code, TagMinter};
use truetag::infra::config;
use truetag::storage::tags;
use truetag::EvmTagMinter;
use truetag::MintingService;

#[derive(Parser)]
#[command(name = "bulk_minter", about = "Mint TrueTag batches from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mint a batch into the shared warehouse pool.
    Warehouse {
        #[arg(long)]
        count: i32,
        /// Admin user id recorded on the batch.
        #[arg(long, default_value_t = 1)]
        admin_id: i64,
    },
    /// Mint a batch pre-linked to a product.
    Direct {
        #[arg(long)]
        product_id: i64,
        #[arg(long)]
        count: i32,
        #[arg(long, default_value_t = 1)]
        admin_id: i64,
    },
    /// Reassign already-minted tags to a manufacturer on-chain.
    Assign {
        #[arg(long)]
        manufacturer_id: i64,
        /// Tag codes whose tokens are reassigned.
        #[arg(long, required = true, num_args = 1..)]
        tag_codes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let minter = Arc::new(EvmTagMinter::new(
        &config::blockchain_rpc(),
        &config::contract_address(),
        &config::admin_private_key(),
        config::chain_call_timeout(),
    )?);

    match cli.command {
        Command::Warehouse { count, admin_id } => {
            let pool = connect().await?;
            let service = MintingService::new(pool.clone(), minter);
            let batch = service.mint_warehouse(admin_id, count).await?;
            print_batch(&pool, batch).await?;
        }
        Command::Direct {
            product_id,
            count,
            admin_id,
        } => {
            let pool = connect().await?;
            let service = MintingService::new(pool.clone(), minter);
            let batch = service.mint_direct(admin_id, product_id, count).await?;
            print_batch(&pool, batch).await?;
        }
        Command::Assign {
            manufacturer_id,
            tag_codes,
        } => {
            let token_ids: Vec<_> = tag_codes.iter().map(|c| token_id_for_code(c)).collect();
            let tx_hash = minter.assign_tags(&token_ids, manufacturer_id).await?;
            info!(tx_hash, manufacturer_id, count = tag_codes.len(), "tags reassigned");
        }
    }

    Ok(())
}

async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config::database_url())
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

async fn print_batch(pool: &PgPool, batch: Batch) -> Result<(), Box<dyn std::error::Error>> {
    let minted = tags::list_for_batch(pool, batch.id).await?;
    info!(
        batch_id = batch.id,
        tx_hash = batch.tx_hash.as_deref().unwrap_or(""),
        minted = minted.len(),
        "batch minted"
    );
    for tag in minted {
        println!("{}\t{}", tag.tag_code, tag.token_id);
    }
    Ok(())
}
