use chrono::Local; // timestamp in log lines
use clap::{Parser, Subcommand};
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::process::ExitCode;

use ticketdesk::{
    config::Config,
    handlers::{
        self, AppContext,
        admin::{BookingCommand, ShowCommand, TicketCommand, TicketTypeCommand},
        auth::LoginArgs,
        monitor::MonitorArgs,
        storefront::BookArgs,
        theme::ThemeCommand,
    },
};

#[derive(Parser)]
#[command(name = "ticketdesk")]
#[command(about = "Book show tickets and manage shows from the terminal", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the packages on sale
    Combos,
    /// Book tickets, pay and wait for them to be issued
    Book(BookArgs),
    /// Log in and remember the session
    Login(LoginArgs),
    /// Forget the saved session
    Logout,
    /// Show who is logged in
    Whoami,
    /// Manage shows (admin)
    #[command(subcommand)]
    Shows(ShowCommand),
    /// Manage ticket types (admin)
    #[command(subcommand)]
    TicketTypes(TicketTypeCommand),
    /// Inspect bookings (admin)
    #[command(subcommand)]
    Bookings(BookingCommand),
    /// Inspect and check in tickets (admin)
    #[command(subcommand)]
    Tickets(TicketCommand),
    /// Site colors
    #[command(subcommand)]
    Theme(ThemeCommand),
    /// Watch for new bookings (admin)
    Monitor(MonitorArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        // stdout 留给命令输出
        .target(Target::Stderr)
        .init();

    let cli = Cli::parse();

    // 加载配置
    let config = Config::from_toml()?;
    let ctx = AppContext::init(config).await?;

    let result = match cli.command {
        Commands::Combos => handlers::storefront::combos(&ctx),
        Commands::Book(args) => handlers::storefront::book(&ctx, args).await,
        Commands::Login(args) => handlers::auth::login(&ctx, args).await,
        Commands::Logout => handlers::auth::logout(&ctx).await,
        Commands::Whoami => handlers::auth::whoami(&ctx),
        Commands::Shows(command) => handlers::admin::shows(&ctx, command).await,
        Commands::TicketTypes(command) => handlers::admin::ticket_types(&ctx, command).await,
        Commands::Bookings(command) => handlers::admin::bookings(&ctx, command).await,
        Commands::Tickets(command) => handlers::admin::tickets(&ctx, command).await,
        Commands::Theme(command) => handlers::theme::handle(&ctx, command).await,
        Commands::Monitor(args) => handlers::monitor::handle(&ctx, args).await,
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            handlers::respond_error(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}
