// Command line front end for the caftan rental backend
//
// Usage:
//   caftan list [--size <size>] [--sort none|price-asc|price-desc]
//   caftan show <item-id>
//   caftan book <item-id> <customer-name> <start YYYY-MM-DD> <end YYYY-MM-DD>
//   caftan rentals
//   caftan cancel <rental-id>
//
// CAFTAN_API_URL and CAFTAN_API_TIMEOUT_MS override the backend address and
// timeout. RUST_LOG controls log output.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use caftan_rental::{
    delete_failure_message, BookingForm, BookingScreen, CacheConfig, CatalogScreen, ClientConfig,
    HttpRentalClient, RentalApi, RentalCard, RentalsScreen, SizeFilter, SortMode,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = ClientConfig::from_env().context("invalid client configuration")?;
    info!(base_url = %config.base_url, "starting caftan client");
    let client = HttpRentalClient::new(config, CacheConfig::default())?;

    match args.first().map(String::as_str) {
        Some("list") => list(&client, &args[1..]).await,
        Some("show") => show(&client, parse_id(args.get(1), "item id")?).await,
        Some("book") => book(&client, &args[1..]).await,
        Some("rentals") => rentals(&client).await,
        Some("cancel") => cancel(&client, parse_id(args.get(1), "rental id")?).await,
        _ => bail!("usage: caftan <list|show|book|rentals|cancel> [args]"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,caftan_rental=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_id(arg: Option<&String>, what: &str) -> Result<i64> {
    let text = arg.ok_or_else(|| anyhow!("missing {}", what))?;
    text.parse()
        .with_context(|| format!("{} must be a number, got {:?}", what, text))
}

async fn list(client: &HttpRentalClient, args: &[String]) -> Result<()> {
    let screen = CatalogScreen::default();
    screen
        .refresh(client)
        .await
        .map_err(|e| anyhow!("Failed to load caftans: {}", e.user_message()))?;

    let mut rest = args.iter();
    while let Some(flag) = rest.next() {
        let value = rest
            .next()
            .ok_or_else(|| anyhow!("{} needs a value", flag))?;
        match flag.as_str() {
            "--size" => {
                // Parsing a size filter cannot fail
                let size: SizeFilter = value.parse().unwrap_or_default();
                screen.set_size_filter(size);
            }
            "--sort" => {
                let sort: SortMode = value.parse()?;
                screen.set_sort(sort);
            }
            other => bail!("unknown option {}", other),
        }
    }

    let sizes: Vec<String> = screen.size_options().iter().map(ToString::to_string).collect();
    debug!(sizes = ?sizes, state = ?screen.state(), "catalog view");

    for card in screen.cards() {
        println!("#{:<4} {:<30} {:<10} {}", card.item_id, card.name, card.size, card.price);
    }
    println!("{}", screen.summary());
    println!("Sizes: {}", sizes.join(", "));
    Ok(())
}

async fn show(client: &HttpRentalClient, item_id: i64) -> Result<()> {
    let (item, rentals) = futures::try_join!(client.get_item(item_id), client.list_rentals())
        .map_err(|e| anyhow!("Failed to load caftan details: {}", e.user_message()))?;

    let booked: Vec<RentalCard> = rentals
        .iter()
        .filter(|rental| rental.caftan_id == item_id)
        .map(RentalCard::from)
        .collect();

    println!("{}", item.name);
    println!("{}", caftan_rental::size_label(item.size.as_deref()));
    println!("{}", caftan_rental::daily_price_label(&item.price));
    println!("Available: {}", if item.availability { "yes" } else { "no" });
    println!("Rentals: {}", booked.len());
    for card in booked {
        println!("  {} ({})", card.dates, card.customer);
    }
    Ok(())
}

async fn book(client: &HttpRentalClient, args: &[String]) -> Result<()> {
    let [id, name, start, end] = args else {
        bail!("usage: caftan book <item-id> <customer-name> <start> <end>");
    };
    let item_id = parse_id(Some(id), "item id")?;

    let item = client
        .get_item(item_id)
        .await
        .map_err(|e| anyhow!("Failed to load caftan details: {}", e.user_message()))?;
    let screen = BookingScreen::for_item(&item);
    let today = Local::now().date_naive();

    let created = screen
        .submit(client, &BookingForm::new(name, start, end), today)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    let card = RentalCard::from(&created.rental);
    println!("Rental created successfully!");
    println!("#{} {} | {} | {}", card.rental_id, screen.item_name(), card.dates, card.total);
    Ok(())
}

async fn rentals(client: &HttpRentalClient) -> Result<()> {
    let screen = RentalsScreen::new();
    screen
        .load(client)
        .await
        .map_err(|e| anyhow!("Failed to load rentals: {}", e.user_message()))?;

    if screen.is_empty() {
        println!("No rentals found");
        return Ok(());
    }
    for card in screen.cards() {
        println!("#{:<4} {} | {} | {} | {}", card.rental_id, card.title, card.customer, card.dates, card.total);
    }
    Ok(())
}

async fn cancel(client: &HttpRentalClient, rental_id: i64) -> Result<()> {
    let screen = RentalsScreen::new();
    screen
        .delete(client, rental_id)
        .await
        .map_err(|e| anyhow!(delete_failure_message(&e)))?;
    println!("Rental #{} cancelled", rental_id);
    Ok(())
}
