use std::sync::Arc;

use clap::{Args, Subcommand};
use jiff::{Timestamp, civil::Date};
use peony::{ids::ProductId, money::format_minor, reservation::ReservationStatus};
use peony_client::{
    api::{ApiConfig, HttpShopApi},
    cart::CartService,
};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart grouped by seller, with reservation countdowns
    Show,
    /// Add a product, reserving stock
    Add(AddArgs),
    /// Change a line's quantity
    Update(UpdateArgs),
    /// Remove a line
    Remove(ProductArg),
    /// Empty the cart
    Clear,
    /// Refresh a line's reservation
    Extend(ProductArg),
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Product id
    #[arg(long)]
    product: u64,

    /// Quantity to reserve
    #[arg(long, default_value_t = 1)]
    quantity: u32,

    /// Optional preorder delivery date (YYYY-MM-DD)
    #[arg(long)]
    preorder: Option<Date>,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Product id
    #[arg(long)]
    product: u64,

    /// New quantity (at least 1; use remove to delete)
    #[arg(long)]
    quantity: u32,
}

#[derive(Debug, Args)]
struct ProductArg {
    /// Product id
    #[arg(long)]
    product: u64,
}

pub(crate) async fn run(api: ApiConfig, command: CartCommand) -> Result<(), String> {
    let mut service = CartService::new(Arc::new(HttpShopApi::new(api)));

    service
        .load()
        .await
        .map_err(|error| format!("failed to load cart: {error}"))?;

    match command.command {
        CartSubcommand::Show => show(&service),
        CartSubcommand::Add(args) => {
            service
                .add_item(ProductId::new(args.product), args.quantity, args.preorder)
                .await
                .map_err(|error| format!("failed to add item: {error}"))?;

            show(&service);
        }
        CartSubcommand::Update(args) => {
            service
                .update_item(ProductId::new(args.product), args.quantity)
                .await
                .map_err(|error| format!("failed to update item: {error}"))?;

            show(&service);
        }
        CartSubcommand::Remove(args) => {
            service
                .remove_item(ProductId::new(args.product))
                .await
                .map_err(|error| format!("failed to remove item: {error}"))?;

            show(&service);
        }
        CartSubcommand::Clear => {
            service
                .clear()
                .await
                .map_err(|error| format!("failed to clear cart: {error}"))?;

            println!("cart cleared");
        }
        CartSubcommand::Extend(args) => {
            service
                .extend_reservation(ProductId::new(args.product))
                .await
                .map_err(|error| format!("failed to extend reservation: {error}"))?;

            show(&service);
        }
    }

    Ok(())
}

fn show(service: &CartService) {
    let now = Timestamp::now();
    let clock = service.snapshot().clock();

    for group in service.groups() {
        println!("seller {}:", group.seller_id);

        for line in &group.lines {
            let status = clock.status(line.reserved_at, now);
            let note = match status {
                ReservationStatus::Active | ReservationStatus::Expiring => {
                    format!("{}s left", clock.remaining_seconds(line.reserved_at, now))
                }
                ReservationStatus::Expired => "reservation expired".to_owned(),
                ReservationStatus::NotReserved => "not reserved".to_owned(),
            };

            println!(
                "  [{}] {} x{} @ {} ({note})",
                line.product_id,
                line.name,
                line.quantity,
                format_minor(line.price),
            );
        }

        println!("  subtotal: {}", format_minor(group.subtotal()));
    }

    println!("total: {}", format_minor(service.snapshot().grand_total()));
}
