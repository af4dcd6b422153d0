use std::sync::Arc;

use clap::{Args, Subcommand};
use peony::{checkout::ContactInfo, ids::SellerId, money::format_minor};
use peony_client::{
    api::{ApiConfig, HttpShopApi},
    cart::CartService,
    checkout::CheckoutService,
};

#[derive(Debug, Args)]
pub(crate) struct CheckoutCommand {
    #[command(subcommand)]
    command: CheckoutSubcommand,
}

#[derive(Debug, Subcommand)]
enum CheckoutSubcommand {
    /// Check whether a seller delivers to an address
    Delivery(DeliveryArgs),
    /// List a seller's delivery slots
    Slots(SlotsArgs),
    /// Resolve delivery for every seller in the cart, place the orders and
    /// create the payment
    Submit(SubmitArgs),
}

#[derive(Debug, Args)]
struct DeliveryArgs {
    /// Seller id
    #[arg(long)]
    seller: u64,

    /// Buyer address
    #[arg(long)]
    address: String,
}

#[derive(Debug, Args)]
struct SlotsArgs {
    /// Seller id
    #[arg(long)]
    seller: u64,
}

#[derive(Debug, Args)]
struct SubmitArgs {
    /// Buyer full name
    #[arg(long)]
    fio: String,

    /// Contact phone
    #[arg(long)]
    phone: String,

    /// Delivery address
    #[arg(long)]
    address: String,

    /// Order comment
    #[arg(long, default_value = "")]
    comment: String,

    /// Sellers to collect from instead of delivering (may repeat)
    #[arg(long = "pickup-seller")]
    pickup_sellers: Vec<u64>,

    /// Create the payment and print the confirmation URL
    #[arg(long)]
    pay: bool,
}

pub(crate) async fn run(api: ApiConfig, command: CheckoutCommand) -> Result<(), String> {
    let api = Arc::new(HttpShopApi::new(api));
    let mut checkout =
        CheckoutService::new(Arc::clone(&api) as Arc<dyn peony_client::api::ShopApi>);

    match command.command {
        CheckoutSubcommand::Delivery(args) => {
            let price = checkout
                .resolve_delivery(SellerId::new(args.seller), &args.address, None)
                .await
                .map_err(|error| format!("delivery check failed: {error}"))?;

            println!("delivers for {}", format_minor(price));
        }
        CheckoutSubcommand::Slots(args) => {
            let days = checkout
                .load_slots(SellerId::new(args.seller))
                .await
                .map_err(|error| format!("failed to load slots: {error}"))?;

            for day in days {
                println!("{}:", day.date);
                for window in day.windows {
                    println!("  {} - {}", window.time_from, window.time_to);
                }
            }
        }
        CheckoutSubcommand::Submit(args) => submit(api, checkout, args).await?,
    }

    Ok(())
}

async fn submit(
    api: Arc<HttpShopApi>,
    mut checkout: CheckoutService,
    args: SubmitArgs,
) -> Result<(), String> {
    let mut cart = CartService::new(api);
    cart.load()
        .await
        .map_err(|error| format!("failed to load cart: {error}"))?;

    let pickup: Vec<SellerId> = args.pickup_sellers.iter().copied().map(SellerId::new).collect();

    for group in cart.groups() {
        if pickup.contains(&group.seller_id) {
            checkout.choose_pickup(group.seller_id);
        } else {
            let price = checkout
                .resolve_delivery(group.seller_id, &args.address, None)
                .await
                .map_err(|error| format!("delivery check failed: {error}"))?;

            println!(
                "seller {}: delivery {}",
                group.seller_id,
                format_minor(price)
            );
        }
    }

    let contact = ContactInfo {
        fio: args.fio,
        phone: args.phone,
        address: args.address,
        comment: args.comment,
        district_id: None,
        district_name: None,
    };

    let receipt = checkout
        .submit(cart.snapshot(), &contact, &[])
        .await
        .map_err(|error| format!("checkout failed: {error}"))?;

    for order in &receipt.orders {
        println!(
            "order {} (seller {}): {}",
            order.order_id,
            order.seller_id,
            format_minor(order.total_price)
        );
    }
    println!("grand total: {}", format_minor(receipt.grand_total()));

    if args.pay {
        let url = checkout
            .pay(receipt.order_ids())
            .await
            .map_err(|error| format!("payment failed: {error}"))?;

        println!("confirmation_url: {url}");
    }

    Ok(())
}
