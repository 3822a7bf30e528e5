use crate::error::AppResult;
use crate::handlers::AppContext;
use crate::services::BookingService;
use crate::tasks::{NewOrderDetector, OrderMonitor, PollLimits};
use crate::utils::format_vnd;
use clap::Args;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct MonitorArgs {
    /// Override polling.monitor_interval_ms
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Stop after this many fetches
    #[arg(long)]
    pub max_fetches: Option<u32>,
}

/// Print one JSON line per new booking until Ctrl-C.
pub async fn handle(ctx: &AppContext, args: MonitorArgs) -> AppResult<()> {
    ctx.authorize("/admin/monitor")?;

    let interval = args
        .interval_ms
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or_else(|| ctx.config.polling.monitor_interval());
    let limits = PollLimits {
        max_attempts: args.max_fetches,
        max_duration: None,
    };
    let feed = Arc::new(BookingService::new(ctx.api.clone()));
    let (mut monitor, mut orders) = OrderMonitor::spawn(feed, interval, limits, NewOrderDetector::new());
    log::info!("Watching for new bookings every {}ms", interval.as_millis());

    loop {
        tokio::select! {
            batch = orders.recv() => {
                let Some(batch) = batch else { break };
                for booking in &batch.bookings {
                    let line = json!({
                        "detectedAt": batch.detected_at,
                        "bookingId": booking.id,
                        "customerName": booking.customer_name,
                        "quantity": booking.quantity,
                        "total": format_vnd(booking.total_amount),
                        "paymentStatus": booking.payment_status,
                    });
                    println!("{line}");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    monitor.stop();
    Ok(())
}
