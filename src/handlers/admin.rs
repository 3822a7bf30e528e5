use crate::error::{AppError, AppResult};
use crate::handlers::{AppContext, respond, respond_with_message};
use crate::models::*;
use crate::services::*;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum ShowCommand {
    /// List every show
    List,
    /// Create a show
    Create(ShowFields),
    /// Replace a show; omitted fields keep their current value
    Update {
        id: String,
        #[command(flatten)]
        fields: ShowFields,
    },
    /// Delete a show
    Delete { id: String },
    /// Upload a banner image (png, jpg, webp) for a show
    UploadBanner { id: String, file: PathBuf },
}

#[derive(Debug, Args)]
pub struct ShowFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    /// RFC 3339, e.g. 2026-11-20T19:30:00+07:00
    #[arg(long)]
    pub starts_at: Option<DateTime<Utc>>,
    #[arg(long)]
    pub ends_at: Option<DateTime<Utc>>,
    #[arg(long)]
    pub capacity: Option<u32>,
}

impl ShowFields {
    fn into_new_input(self) -> AppResult<ShowInput> {
        let starts_at = self
            .starts_at
            .ok_or_else(|| AppError::ValidationError("--starts-at is required".to_string()))?;
        Ok(ShowInput {
            title: self.title.unwrap_or_default(),
            description: self.description,
            location: self.location.unwrap_or_default(),
            starts_at,
            ends_at: self.ends_at,
            capacity: self.capacity.unwrap_or_default(),
            banner_url: None,
        })
    }

    fn overlay(self, input: &mut ShowInput) {
        if let Some(title) = self.title {
            input.title = title;
        }
        if self.description.is_some() {
            input.description = self.description;
        }
        if let Some(location) = self.location {
            input.location = location;
        }
        if let Some(starts_at) = self.starts_at {
            input.starts_at = starts_at;
        }
        if self.ends_at.is_some() {
            input.ends_at = self.ends_at;
        }
        if let Some(capacity) = self.capacity {
            input.capacity = capacity;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum TicketTypeCommand {
    /// List ticket types, optionally for one show
    List {
        #[arg(long)]
        show: Option<String>,
    },
    /// Create a ticket type
    Create(TicketTypeFields),
    /// Replace a ticket type; omitted fields keep their current value
    Update {
        id: String,
        #[command(flatten)]
        fields: TicketTypeFields,
    },
    /// Delete a ticket type
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct TicketTypeFields {
    #[arg(long)]
    pub show: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    /// Hex color, #rgb or #rrggbb
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub price: Option<u64>,
    #[arg(long)]
    pub total: Option<u32>,
}

impl TicketTypeFields {
    fn into_new_input(self) -> TicketTypeInput {
        TicketTypeInput {
            show_id: self.show.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            color: self.color.unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            total_quantity: self.total.unwrap_or_default(),
        }
    }

    fn overlay(self, input: &mut TicketTypeInput) {
        if let Some(show) = self.show {
            input.show_id = show;
        }
        if let Some(name) = self.name {
            input.name = name;
        }
        if let Some(color) = self.color {
            input.color = color;
        }
        if let Some(price) = self.price {
            input.price = price;
        }
        if let Some(total) = self.total {
            input.total_quantity = total;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum BookingCommand {
    /// List bookings, optionally filtered by name, phone or id
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Totals per payment status, revenue and tickets sold
    Stats,
}

#[derive(Debug, Subcommand)]
pub enum TicketCommand {
    /// List tickets, optionally for one booking
    List {
        #[arg(long)]
        booking: Option<String>,
    },
    /// Mark a ticket as used
    CheckIn { id: String },
}

pub async fn shows(ctx: &AppContext, command: ShowCommand) -> AppResult<()> {
    ctx.authorize("/admin/shows")?;
    let service = ShowService::new(ctx.api.clone());

    match command {
        ShowCommand::List => respond(&service.list().await?),
        ShowCommand::Create(fields) => {
            let show = service.create(&fields.into_new_input()?).await?;
            respond_with_message(&show, "Show created")
        }
        ShowCommand::Update { id, fields } => {
            let current = service.get(&id).await?;
            let mut input = ShowInput::from(&current);
            fields.overlay(&mut input);
            let show = service.update(&id, &input).await?;
            respond_with_message(&show, "Show updated")
        }
        ShowCommand::Delete { id } => {
            service.delete(&id).await?;
            respond_with_message(&json!({ "id": id }), "Show deleted")
        }
        ShowCommand::UploadBanner { id, file } => {
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| AppError::ValidationError("Invalid banner file name".to_string()))?
                .to_string();
            let bytes = tokio::fs::read(&file).await?;
            let show = service.upload_banner(&id, &file_name, bytes).await?;
            respond_with_message(&show, "Banner uploaded")
        }
    }
}

pub async fn ticket_types(ctx: &AppContext, command: TicketTypeCommand) -> AppResult<()> {
    ctx.authorize("/admin/ticket-types")?;
    let service = TicketTypeService::new(ctx.api.clone(), BookingService::new(ctx.api.clone()));

    match command {
        TicketTypeCommand::List { show } => respond(&service.list(show.as_deref()).await?),
        TicketTypeCommand::Create(fields) => {
            let created = service.create(&fields.into_new_input()).await?;
            respond_with_message(&created, "Ticket type created")
        }
        TicketTypeCommand::Update { id, fields } => {
            let current = service
                .list(None)
                .await?
                .into_items()
                .into_iter()
                .find(|t| t.id == id)
                .ok_or_else(|| AppError::NotFound(format!("Ticket type {id} not found")))?;
            let mut input = TicketTypeInput::from(&current);
            fields.overlay(&mut input);
            let updated = service.update(&id, &input).await?;
            respond_with_message(&updated, "Ticket type updated")
        }
        TicketTypeCommand::Delete { id } => {
            service.delete(&id).await?;
            respond_with_message(&json!({ "id": id }), "Ticket type deleted")
        }
    }
}

pub async fn bookings(ctx: &AppContext, command: BookingCommand) -> AppResult<()> {
    ctx.authorize("/admin/bookings")?;
    let service = BookingService::new(ctx.api.clone());
    let bookings = service.list().await?.into_items();

    match command {
        BookingCommand::List { search } => {
            let hits = search_bookings(&bookings, search.as_deref().unwrap_or_default());
            respond(&hits)
        }
        BookingCommand::Stats => respond(&booking_stats(&bookings)),
    }
}

pub async fn tickets(ctx: &AppContext, command: TicketCommand) -> AppResult<()> {
    ctx.authorize("/admin/tickets")?;
    let service = TicketService::new(ctx.api.clone());

    match command {
        TicketCommand::List { booking: Some(booking_id) } => {
            respond(&service.for_booking(&booking_id).await?)
        }
        TicketCommand::List { booking: None } => respond(&service.list().await?),
        TicketCommand::CheckIn { id } => match service.check_in(&id).await? {
            CheckInOutcome::CheckedIn(ticket) => respond_with_message(&ticket, "Checked in"),
            CheckInOutcome::AlreadyUsed(ticket) => {
                respond_with_message(&ticket, "Ticket was already used")
            }
        },
    }
}
