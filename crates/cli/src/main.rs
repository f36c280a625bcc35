//! Souq CLI - database migrations and catalog management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront migrations (and create the session table)
//! souq-cli migrate
//!
//! # Add a product
//! souq-cli product add --name "Mint tea" --price 4.50 --stock 20
//!
//! # Change a product's price and stock
//! souq-cli product edit 12 --price 5.00 --stock 8
//!
//! # Delete a product that has never been ordered
//! souq-cli product delete 12
//!
//! # List products
//! souq-cli product list
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "souq-cli")]
#[command(author, version, about = "Souq CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the product catalog
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Create a product
    Add {
        /// Product name
        #[arg(short, long)]
        name: String,

        /// Price in dollars, e.g. 4.50
        #[arg(short, long)]
        price: String,

        /// Units in stock
        #[arg(short, long, default_value_t = 0)]
        stock: i32,

        /// Product description
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Change fields of a product; omitted fields keep their value
    Edit {
        /// Product ID
        id: i32,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New price in dollars
        #[arg(short, long)]
        price: Option<String>,

        /// New units in stock
        #[arg(short, long)]
        stock: Option<i32>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a product and drop it from open carts
    Delete {
        /// Product ID
        id: i32,
    },
    /// List products, newest first
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Product { action } => match action {
            ProductAction::Add {
                name,
                price,
                stock,
                description,
            } => {
                commands::product::add(&name, &price, stock, &description).await?;
            }
            ProductAction::Edit {
                id,
                name,
                price,
                stock,
                description,
            } => {
                let edit = commands::product::ProductEdit {
                    name,
                    price,
                    stock,
                    description,
                };
                commands::product::edit(id, edit).await?;
            }
            ProductAction::Delete { id } => commands::product::delete(id).await?,
            ProductAction::List => commands::product::list().await?,
        },
    }
    Ok(())
}
