use crate::error::{AppError, AppResult};
use crate::handlers::{AppContext, respond};
use crate::models::*;
use crate::services::StorefrontBackend;
use crate::utils::format_vnd;
use crate::workflow::*;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Debug, Args)]
pub struct BookArgs {
    /// Customer name
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub phone: String,

    /// Package id, see `ticketdesk combos`
    #[arg(long, default_value = "standard")]
    pub combo: String,

    #[arg(short, long, default_value_t = 1)]
    pub quantity: u32,

    /// Comma separated seat labels
    #[arg(long, value_delimiter = ',')]
    pub seats: Vec<String>,

    /// Book for this show instead of the configured one
    #[arg(long)]
    pub show: Option<String>,

    /// Confirm payment and retry polling without prompting
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Serialize)]
struct ComboView<'a> {
    id: &'a str,
    name: &'a str,
    unit_price: u64,
    price: String,
    popular: bool,
    features: &'a [String],
}

pub fn combos(ctx: &AppContext) -> AppResult<()> {
    let catalog = ComboCatalog::new(ctx.config.combos.clone());
    let views: Vec<ComboView<'_>> = catalog
        .iter()
        .map(|c| ComboView {
            id: &c.id,
            name: &c.name,
            unit_price: c.unit_price,
            price: format_vnd(c.unit_price),
            popular: c.popular,
            features: &c.features,
        })
        .collect();
    respond(&views)
}

enum Step {
    Event(Option<FlowEvent>),
    Interrupted,
}

/// Interactive checkout in the terminal. Ctrl-C abandons the booking.
pub async fn book(ctx: &AppContext, args: BookArgs) -> AppResult<()> {
    let mut config = ctx.config.clone();
    if args.show.is_some() {
        config.storefront.show_id = args.show.clone();
    }
    let settings = CheckoutSettings::from_config(&config)?;
    let auto_confirm = args.yes;

    let backend = Arc::new(StorefrontBackend::new(ctx.api.clone()));
    let catalog = ComboCatalog::new(ctx.config.combos.clone());
    let mut flow = CheckoutFlow::new(backend, catalog, settings);

    let form = BookingForm {
        customer_name: args.name,
        phone: args.phone,
        combo_id: args.combo,
        quantity: args.quantity,
        seat_numbers: args.seats,
    };
    let selection = flow.select(&form)?;
    println!(
        "{} x{} = {}",
        selection.combo_name(),
        selection.quantity(),
        format_vnd(selection.total_price())
    );

    flow.submit().await?;
    if flow.open_payment() == PaymentEntry::Redirect {
        return Err(AppError::InternalError("Booking was not kept".to_string()));
    }
    if let CheckoutState::AwaitingPayment { booking, payment } = flow.state() {
        println!("Booking {} total {}", booking_reference(&booking.id), format_vnd(booking.total_amount));
        print_payment(payment);
        if !payment.is_usable() {
            flow.abandon();
            return Err(AppError::ValidationError(
                "Payment cannot be completed without a payment code".to_string(),
            ));
        }
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    if !auto_confirm {
        println!("Press Enter once the transfer is done, Ctrl-C to cancel");
        if !wait_for_enter(&mut stdin).await {
            flow.abandon();
            println!("Booking cancelled");
            return Ok(());
        }
    }
    flow.confirm_payment()?;
    if let CheckoutState::Processing { remaining, .. } = flow.state() {
        println!("Processing payment... {remaining}s");
    }

    loop {
        let step = tokio::select! {
            event = flow.next_event() => Step::Event(event),
            _ = tokio::signal::ctrl_c() => Step::Interrupted,
        };

        match step {
            Step::Interrupted => {
                flow.abandon();
                println!("Stopped waiting for tickets");
                return Ok(());
            }
            Step::Event(None) => return Ok(()),
            Step::Event(Some(event)) => match event {
                FlowEvent::Countdown(remaining) => println!("Processing payment... {remaining}s"),
                FlowEvent::PaymentConfirmed => println!("Payment successful"),
                FlowEvent::PollingStarted { .. } => println!("Waiting for your tickets..."),
                FlowEvent::TicketIssued(card) => {
                    println!("{}", card.render());
                    return Ok(());
                }
                FlowEvent::PollingGaveUp => {
                    println!("Tickets are taking longer than usual.");
                    if !auto_confirm {
                        println!("Press Enter to keep waiting, Ctrl-C to stop");
                        if !wait_for_enter(&mut stdin).await {
                            flow.abandon();
                            return Ok(());
                        }
                    }
                    flow.retry_polling()?;
                }
            },
        }
    }
}

fn print_payment(payment: &PaymentDisplay) {
    match payment {
        PaymentDisplay::Code { .. } => {
            if let Some(qr) = payment.render_terminal() {
                println!("{qr}");
            }
        }
        PaymentDisplay::Image { source } if source.starts_with("data:") => {
            println!("Payment QR image received ({} bytes), open it from the booking page", source.len());
        }
        PaymentDisplay::Image { source } => println!("Scan the QR code at {source}"),
        PaymentDisplay::Unavailable => {
            println!("Payment code unavailable. Please contact the box office.");
        }
    }
}

/// `false` on Ctrl-C or closed stdin.
async fn wait_for_enter(stdin: &mut Lines<BufReader<Stdin>>) -> bool {
    tokio::select! {
        line = stdin.next_line() => matches!(line, Ok(Some(_))),
        _ = tokio::signal::ctrl_c() => false,
    }
}
