//! Hearth CLI - the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from the environment or prompt-less flag)
//! HEARTH_PASSWORD=... hearth login -e ada@example.com
//!
//! # Browse and buy
//! hearth products list --search mug
//! hearth cart add 64f1c0ffee --quantity 2
//! hearth checkout --full-name "Ada Lovelace" --address "12 Main St" \
//!     --city London --postal-code SW1 --country UK
//!
//! # Community
//! hearth blog show 64f1b10g
//! hearth events join 64f1e7e7
//!
//! # Administration
//! hearth admin delete-user 64f1u5er --yes
//! ```
//!
//! # Environment Variables
//!
//! See `hearth_storefront::config` for the full list. `RUST_LOG` controls
//! log verbosity.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::exit;

use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use hearth_core::{CommentId, EventId, Money, OrderId, OrderStatus, PostId, ProductId, Role, UserId};
use hearth_storefront::config::{LogFormat, StorefrontConfig};
use hearth_storefront::models::{ProductQuery, ShippingAddress};

mod commands;
mod error;
mod output;

use commands::Context;
use error::Result;

const DEFAULT_LOG_FILTER: &str = "hearth_storefront=info,hearth_cli=info";

#[derive(Parser)]
#[command(name = "hearth")]
#[command(author, version, about = "Hearth storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(long, env = "HEARTH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(long, env = "HEARTH_PASSWORD", hide_env_values = true)]
        password: String,

        /// Avatar image file
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
    /// Sign in with a Google ID token
    LoginGoogle {
        #[arg(long, env = "HEARTH_GOOGLE_ID_TOKEN", hide_env_values = true)]
        id_token: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Edit the locally stored profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart contents
    Checkout(ShippingArgs),
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Community blog
    Blog {
        #[command(subcommand)]
        action: BlogAction,
    },
    /// Community events
    Events {
        #[command(subcommand)]
        action: EventsAction,
    },
    /// Store administration
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Update profile fields
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Avatar URL
        #[arg(long)]
        avatar: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        page: Option<u32>,
    },
    /// Show a product with its reviews
    Show { id: ProductId },
    /// Review a product
    Review {
        id: ProductId,
        #[arg(short, long)]
        rating: u8,
        #[arg(short, long)]
        comment: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        id: ProductId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove { id: ProductId },
    /// Set a product's quantity (0 or less removes it)
    Set {
        id: ProductId,
        #[arg(allow_hyphen_values = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Args)]
struct ShippingArgs {
    #[arg(long)]
    full_name: String,
    #[arg(long)]
    address: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    postal_code: String,
    #[arg(long)]
    country: String,
    #[arg(long)]
    phone: Option<String>,
}

impl From<ShippingArgs> for ShippingAddress {
    fn from(args: ShippingArgs) -> Self {
        Self {
            full_name: args.full_name,
            address: args.address,
            city: args.city,
            postal_code: args.postal_code,
            country: args.country,
            phone: args.phone,
        }
    }
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Orders you have placed
    Mine,
}

#[derive(Subcommand)]
enum BlogAction {
    /// List posts
    List,
    /// Show a post with its comment thread
    Show { id: PostId },
    /// Publish a post
    Post {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        content: String,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Like or unlike a post
    Like { id: PostId },
    /// Comment on a post
    Comment {
        post: PostId,
        #[arg(short, long)]
        content: String,
        /// Reply to this comment
        #[arg(long)]
        reply_to: Option<CommentId>,
    },
    /// Delete a post
    Delete {
        id: PostId,
        #[arg(long)]
        yes: bool,
    },
    /// Delete a comment
    DeleteComment {
        id: CommentId,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum EventsAction {
    /// List events
    List,
    /// Schedule an event
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long)]
        location: String,
        /// Start time, RFC 3339 (e.g. 2030-05-01T09:00:00Z)
        #[arg(long)]
        date: String,
        #[arg(long)]
        max_attendees: Option<u32>,
    },
    /// Join an event
    Join { id: EventId },
    /// Leave an event
    Leave { id: EventId },
    /// Delete an event
    Delete {
        id: EventId,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct ProductFields {
    #[arg(short, long)]
    title: String,
    #[arg(short, long)]
    description: String,
    #[arg(short, long)]
    price: Money,
    #[arg(short, long)]
    category: Option<String>,
    #[arg(short, long, default_value_t = 0)]
    stock: u32,
    #[arg(long)]
    image: Option<PathBuf>,
}

impl From<ProductFields> for commands::admin::ProductArgs {
    fn from(fields: ProductFields) -> Self {
        Self {
            title: fields.title,
            description: fields.description,
            price: fields.price,
            category: fields.category,
            stock: fields.stock,
            image: fields.image,
        }
    }
}

#[derive(Subcommand)]
enum AdminAction {
    /// Dashboard numbers
    Stats,
    /// List users
    Users,
    /// Change a user's role
    SetRole {
        id: UserId,
        /// `user` or `admin`
        role: Role,
    },
    /// Delete a user
    DeleteUser {
        id: UserId,
        #[arg(long)]
        yes: bool,
    },
    /// List every order
    Orders,
    /// Change an order's status
    OrderStatus {
        id: OrderId,
        /// pending, processing, shipped, delivered or cancelled
        status: OrderStatus,
    },
    /// Create a product
    CreateProduct(ProductFields),
    /// Replace a product's fields
    UpdateProduct {
        id: ProductId,
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Delete a product
    DeleteProduct {
        id: ProductId,
        #[arg(long)]
        yes: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
}

fn init_tracing(config: &StorefrontConfig) {
    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .init();
            tracing::error!("Failed to load configuration: {e}");
            exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config);
    init_tracing(&config);

    let result = match Context::init(&config).await {
        Ok(mut ctx) => {
            let result = run(&mut ctx, cli.command).await;
            ctx.dispose().await;
            result
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        e.report();
        // Flush queued Sentry events before exiting.
        drop(sentry_guard);
        exit(1);
    }
}

async fn run(ctx: &mut Context, command: Commands) -> Result<()> {
    use commands::{admin, auth, cart, catalog, community, orders};

    match command {
        Commands::Login { email, password } => {
            auth::login(ctx, &email, &SecretString::from(password)).await?;
        }
        Commands::Register {
            name,
            username,
            email,
            password,
            avatar,
        } => {
            let registration = auth::Registration {
                name,
                username,
                email,
                password: SecretString::from(password),
                avatar,
            };
            auth::register(ctx, registration).await?;
        }
        Commands::LoginGoogle { id_token } => auth::login_google(ctx, &id_token).await?,
        Commands::Logout => auth::logout(ctx).await,
        Commands::Whoami => auth::whoami(ctx)?,
        Commands::Profile {
            action:
                ProfileAction::Set {
                    name,
                    username,
                    email,
                    avatar,
                },
        } => auth::update_profile(ctx, name, username, email, avatar).await?,
        Commands::Products { action } => match action {
            ProductsAction::List {
                search,
                category,
                page,
            } => {
                let query = ProductQuery {
                    search,
                    category,
                    page,
                };
                catalog::list(ctx, &query).await?;
            }
            ProductsAction::Show { id } => catalog::show(ctx, &id).await?,
            ProductsAction::Review {
                id,
                rating,
                comment,
            } => catalog::review(ctx, &id, rating, comment).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => cart::show(ctx),
            CartAction::Add { id, quantity } => cart::add(ctx, &id, quantity).await?,
            CartAction::Remove { id } => cart::remove(ctx, &id),
            CartAction::Set { id, quantity } => cart::set(ctx, &id, quantity),
            CartAction::Clear => cart::clear(ctx),
        },
        Commands::Checkout(shipping) => cart::checkout(ctx, shipping.into()).await?,
        Commands::Orders {
            action: OrdersAction::Mine,
        } => orders::mine(ctx).await?,
        Commands::Blog { action } => match action {
            BlogAction::List => community::list_posts(ctx).await?,
            BlogAction::Show { id } => community::show_post(ctx, &id).await?,
            BlogAction::Post {
                title,
                content,
                tags,
                image,
            } => community::create_post(ctx, title, content, tags, image).await?,
            BlogAction::Like { id } => community::like(ctx, &id).await?,
            BlogAction::Comment {
                post,
                content,
                reply_to,
            } => community::comment(ctx, post, content, reply_to).await?,
            BlogAction::Delete { id, yes } => community::delete_post(ctx, &id, yes).await?,
            BlogAction::DeleteComment { id, yes } => {
                community::delete_comment(ctx, &id, yes).await?;
            }
        },
        Commands::Events { action } => match action {
            EventsAction::List => community::list_events(ctx).await?,
            EventsAction::Create {
                title,
                description,
                location,
                date,
                max_attendees,
            } => {
                community::create_event(ctx, title, description, location, &date, max_attendees)
                    .await?;
            }
            EventsAction::Join { id } => community::join(ctx, &id).await?,
            EventsAction::Leave { id } => community::leave(ctx, &id).await?,
            EventsAction::Delete { id, yes } => community::delete_event(ctx, &id, yes).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Stats => admin::stats(ctx).await?,
            AdminAction::Users => admin::users(ctx).await?,
            AdminAction::SetRole { id, role } => admin::set_role(ctx, &id, role).await?,
            AdminAction::DeleteUser { id, yes } => admin::delete_user(ctx, &id, yes).await?,
            AdminAction::Orders => admin::orders(ctx).await?,
            AdminAction::OrderStatus { id, status } => {
                admin::order_status(ctx, &id, status).await?;
            }
            AdminAction::CreateProduct(fields) => {
                admin::create_product(ctx, fields.into()).await?;
            }
            AdminAction::UpdateProduct { id, fields } => {
                admin::update_product(ctx, &id, fields.into()).await?;
            }
            AdminAction::DeleteProduct { id, yes } => {
                admin::delete_product(ctx, &id, yes).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cart_set_accepts_negative_quantity() {
        let cli = Cli::try_parse_from(["hearth", "cart", "set", "p1", "-3"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Cart {
                action: CartAction::Set { quantity: -3, .. }
            })
        ));
    }

    #[test]
    fn test_admin_role_parses() {
        let cli = Cli::try_parse_from(["hearth", "admin", "set-role", "u1", "admin"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Admin {
                action: AdminAction::SetRole {
                    role: Role::Admin,
                    ..
                }
            })
        ));
    }
}
