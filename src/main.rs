//! `storefront` command-line client.
//!
//! Browses products and plans, manages the session and places orders
//! against the storefront backend.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use storefront_client::catalog::PlanSelector;
use storefront_client::config::loader::default_config;
use storefront_client::config::load_config;
use storefront_client::observability::logging::init_logging;
use storefront_client::orders::{filter_orders, HistoryFilters, OrderTab, PaymentMethod, Receipt, TabCounts};
use storefront_client::session::EmailStatus;
use storefront_client::Storefront;

/// Environment variable read when `login` is run without `--password`.
const PASSWORD_ENV: &str = "STOREFRONT_PASSWORD";

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Command-line client for the streaming subscription storefront", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// File used to keep the session between runs.
    #[arg(short, long)]
    session: Option<String>,

    /// Content language.
    #[arg(short, long)]
    language: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List streaming products
    Products,
    /// Show the plans of a product
    Plans {
        type_id: u64,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        screen: Option<u32>,
    },
    /// Log in with email and password
    Login {
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// End the current session
    Logout,
    /// List my orders
    Orders {
        #[arg(long, value_enum, default_value_t = TabArg::All)]
        tab: TabArg,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Show my order statistics
    Stats,
    /// Order a plan and optionally upload the payment receipt
    Buy {
        type_id: u64,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        screen: Option<u32>,
        #[arg(long, default_value = "yape")]
        method: PaymentMethod,
        #[arg(long)]
        receipt: Option<PathBuf>,
    },
    /// Upload a payment receipt for an existing order
    UploadReceipt {
        order_id: String,
        path: PathBuf,
        #[arg(long)]
        reference: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TabArg {
    All,
    Processing,
    Completed,
    Dispute,
    Refunded,
    Cancelled,
}

impl From<TabArg> for OrderTab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::All => OrderTab::All,
            TabArg::Processing => OrderTab::Processing,
            TabArg::Completed => OrderTab::Completed,
            TabArg::Dispute => OrderTab::Dispute,
            TabArg::Refunded => OrderTab::Refunded,
            TabArg::Cancelled => OrderTab::Cancelled,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };
    if let Some(session) = cli.session {
        config.session.credentials_path = Some(session);
    }
    if let Some(language) = cli.language {
        config.api.language = language;
    }

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "storefront starting");

    let storefront = Storefront::init(config)?;
    let result = run(&storefront, cli.command).await;
    storefront.dispose();
    result
}

async fn run(storefront: &Storefront, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    let language = storefront.config().api.language.clone();

    match command {
        Commands::Products => {
            let catalog = storefront.content().products(&language, None).await;
            if catalog.fallback {
                eprintln!("Backend unavailable, showing sample products");
            }
            for product in catalog.products() {
                println!(
                    "{:>6}  {:<24} desde {}{}",
                    product.id, product.type_name, product.currency_icon1, product.min_price
                );
            }
        }
        Commands::Plans { type_id, month, screen } => {
            let sku = storefront.sku().sku_list(type_id, &language).await?;
            let mut selector = PlanSelector::new();
            selector.load_sku(&sku);
            if let Some(month) = month {
                selector.select_month(month)?;
            }
            if let Some(screen) = screen {
                selector.select_screen(screen)?;
            }

            println!("{}", sku.type_name);
            for option in selector.months() {
                println!("  month  {:>3}  {}", option.month_id, option.month_content);
            }
            for option in selector.screens() {
                println!("  screen {:>3}  {}", option.screen_id, option.screen_content);
            }
            match selector.header_plan() {
                Some(plan) => println!(
                    "Selected: {} / {} at {} (plan {})",
                    plan.month_content,
                    plan.screen_content,
                    plan.display_price(),
                    plan.type_plan_id
                ),
                None => println!("No plan for this month and screen combination"),
            }
        }
        Commands::Login { email, password } => {
            let password = match password.or_else(|| std::env::var(PASSWORD_ENV).ok()) {
                Some(password) => password,
                None => return Err(format!("pass --password or set {PASSWORD_ENV}").into()),
            };
            match storefront.auth().check_email(&email).await? {
                EmailStatus::Registered => {
                    let user = storefront.auth().login(&email, &password).await?;
                    println!("Logged in as {} <{}>", user.name, user.email);
                }
                EmailStatus::Unregistered => {
                    println!("{email} has no account yet; register with a verification code");
                }
            }
        }
        Commands::Logout => {
            storefront.auth().logout().await;
            println!("Logged out");
        }
        Commands::Orders { tab, search, page } => {
            let filters = HistoryFilters {
                page,
                ..HistoryFilters::default()
            };
            let history = storefront.orders().history(&filters).await?;
            let counts = TabCounts::count(&history.orders);
            let tab = OrderTab::from(tab);
            println!(
                "{} ({} of {})",
                tab.label(),
                counts.get(tab),
                history.pagination.total
            );
            for order in filter_orders(&history.orders, tab, &search) {
                println!(
                    "  {}  {:<20} {:<24} {:>8.2}  {}",
                    order.out_trade_no,
                    order.service_name,
                    order.plan_name,
                    order.total,
                    OrderTab::of(&order.order_status).label()
                );
            }
        }
        Commands::Stats => {
            let stats = storefront.orders().statistics().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Buy {
            type_id,
            month,
            screen,
            method,
            receipt,
        } => {
            let sku = storefront.sku().sku_list(type_id, &language).await?;
            let mut selector = PlanSelector::new();
            selector.load_sku(&sku);
            if let Some(month) = month {
                selector.select_month(month)?;
            }
            if let Some(screen) = screen {
                selector.select_screen(screen)?;
            }

            let checkout = storefront.checkout();
            let order = checkout.start(&sku, &selector, method).await?;
            println!(
                "Order {} created: {} {:.2} via {}",
                order.out_trade_no, order.plan_name, order.total, method
            );

            if let Some(path) = receipt {
                let receipt = Receipt::from_path(&path, &storefront.config().checkout)?;
                let order = checkout.upload_receipt(&receipt).await?;
                println!("Receipt uploaded for order {}", order.out_trade_no);
            }
        }
        Commands::UploadReceipt {
            order_id,
            path,
            reference,
            amount,
        } => {
            let receipt = Receipt::from_path(&path, &storefront.config().checkout)?;
            storefront
                .orders()
                .attach_receipt(&order_id, &receipt, reference.as_deref(), amount)
                .await?;
            println!("Receipt uploaded for order {order_id}");
        }
    }

    Ok(())
}
