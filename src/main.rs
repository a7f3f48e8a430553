//! Command-line front end for the cart.
//!
//! Each invocation restores the cart from storage, applies one command,
//! waits for the change to be persisted and prints the resulting cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! cargo run -- list
//!
//! # Add a product (adding it again bumps its quantity)
//! cargo run -- add --id a --title "T-shirt" --image-url https://img/a.png --price 10
//!
//! # Change quantities
//! cargo run -- increment a
//! cargo run -- decrement a
//! ```
//!
//! # Environment Variables
//!
//! See [`cart_sync::config`] for storage and persistence settings.

use cart_sync::application::services::{CartStore, Mutation};
use cart_sync::config::{self, Config};
use cart_sync::domain::entities::NewCartItem;
use cart_sync::{CartError, bootstrap};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

/// Shopping cart with durable storage.
#[derive(Parser)]
#[command(name = "cart")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart
    List,

    /// Add a product, or bump its quantity if already in the cart
    Add {
        /// Product identifier
        #[arg(long)]
        id: String,

        /// Product title
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long)]
        image_url: String,

        /// Unit price
        #[arg(long, value_parser = parse_price)]
        price: f64,
    },

    /// Increase the quantity of a product
    Increment {
        /// Product identifier
        id: String,
    },

    /// Decrease the quantity of a product, removing it at zero
    Decrement {
        /// Product identifier
        id: String,
    },
}

fn parse_price(value: &str) -> Result<f64, String> {
    let price: f64 = value
        .parse()
        .map_err(|e| format!("invalid price '{value}': {e}"))?;
    if !price.is_finite() {
        return Err(format!("price must be a finite number, got '{value}'"));
    }
    Ok(price)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    init_tracing(&config);
    config.print_summary();

    let provider = bootstrap::start(&config).await?;
    let store = provider.store();

    if let Some(e) = store.restore_error() {
        println!(
            "{} {}",
            "⚠️  Saved cart could not be restored, starting empty:".yellow(),
            e
        );
    }

    let mutation = match cli.command {
        Commands::List => None,
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => Some((
            id.clone(),
            store.add_to_cart(NewCartItem::new(id, title, image_url, price)),
        )),
        Commands::Increment { id } => Some((id.clone(), store.increment(&id))),
        Commands::Decrement { id } => Some((id.clone(), store.decrement(&id))),
    };

    if let Some((id, Mutation::Unchanged)) = &mutation {
        println!("{}", format!("No product '{}' in the cart", id).dimmed());
    }

    if let Err(e) = store.flush().await {
        report_persist_error(&e);
    }

    print_cart(store);
    provider.shutdown().await;

    Ok(())
}

/// Installs the global tracing subscriber according to `LOG_FORMAT` and `RUST_LOG`.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn report_persist_error(e: &CartError) {
    println!(
        "{} {}",
        "⚠️  Change kept in memory but not saved:".yellow(),
        e
    );
}

fn print_cart(store: &CartStore) {
    let products = store.products();

    println!();
    println!("{}", "🛒 Cart".bright_blue().bold());

    if products.is_empty() {
        println!("{}", "   (empty)".dimmed());
        return;
    }

    for item in products.iter() {
        println!(
            "   {} {}  {} × {}",
            item.id.bold(),
            item.title,
            item.quantity.to_string().green(),
            item.price
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_accepts_finite_values() {
        assert_eq!(parse_price("10.5"), Ok(10.5));
        assert_eq!(parse_price("0"), Ok(0.0));
    }

    #[test]
    fn test_parse_price_rejects_non_finite_values() {
        assert!(parse_price("NaN").is_err());
        assert!(parse_price("inf").is_err());
        assert!(parse_price("-infinity").is_err());
        assert!(parse_price("ten").is_err());
    }
}
