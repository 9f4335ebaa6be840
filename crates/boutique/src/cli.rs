//! Clap derive structures for the `boutique` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// boutique -- administer a boutique storefront from the command line
#[derive(Debug, Parser)]
#[command(
    name = "boutique",
    version,
    about = "Manage a boutique storefront catalog and reservations",
    long_about = "Administer products, categories, reservations and store settings.\n\n\
        Signed in (--access-token or a profile token), every change goes to the\n\
        remote store first. Otherwise the local cache is the only store.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Store profile to use
    #[arg(long, short = 'p', env = "BOUTIQUE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Remote store URL (overrides profile)
    #[arg(long, env = "BOUTIQUE_URL", global = true)]
    pub url: Option<String>,

    /// Public anon key of the remote store
    #[arg(long, env = "BOUTIQUE_ANON_KEY", global = true, hide_env = true)]
    pub anon_key: Option<String>,

    /// Administrator access token (signs the session in)
    #[arg(long, env = "BOUTIQUE_ACCESS_TOKEN", global = true, hide_env = true)]
    pub access_token: Option<String>,

    /// Local cache directory (overrides profile)
    #[arg(long, env = "BOUTIQUE_CACHE_DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Ignore remote credentials and work against the local cache only
    #[arg(long, global = true)]
    pub offline: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BOUTIQUE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds
    #[arg(long, env = "BOUTIQUE_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Domain value enums ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProductStatusArg {
    Available,
    Reserved,
    Sold,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReservationStatusArg {
    Pending,
    Completed,
    Cancelled,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the product catalog
    #[command(alias = "prod", alias = "p")]
    Products(ProductsArgs),

    /// Manage product categories
    #[command(alias = "cat")]
    Categories(CategoriesArgs),

    /// Reserve products and close reservations
    #[command(alias = "res", alias = "r")]
    Reservations(ReservationsArgs),

    /// View and change store settings
    Settings(SettingsArgs),

    /// Catalog and reservation counts
    Reports,

    /// Review remote writes that could not be rolled back
    Reconcile(ReconcileArgs),

    /// Print the WhatsApp reservation link for a product
    Link {
        /// Product ID (UUID) or reference
        product: String,

        /// Customer name for the pre-filled message
        #[arg(long, default_value = "")]
        name: String,

        /// Customer phone for the pre-filled message
        #[arg(long, default_value = "")]
        phone: String,
    },

    /// Stay connected and print remote changes until Ctrl-C
    Watch,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Products ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub command: ProductsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProductsCommand {
    /// List products
    #[command(alias = "ls")]
    List {
        /// Only products in this category (code or ID)
        #[arg(long, short = 'c')]
        category: Option<String>,

        /// Only products with this status
        #[arg(long, short = 's')]
        status: Option<ProductStatusArg>,

        /// Case-insensitive search over name, reference and description
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one product
    Get {
        /// Product ID (UUID) or reference
        product: String,
    },

    /// Add a product
    Add {
        /// Display name
        name: String,

        /// Price in local currency
        #[arg(long, required = true)]
        price: f64,

        /// Category code or ID
        #[arg(long, short = 'c', required = true)]
        category: String,

        /// Free-text description
        #[arg(long, default_value = "")]
        description: String,

        /// Image URI (repeat; at least four)
        #[arg(long = "image", short = 'i', required = true)]
        images: Vec<String>,
    },

    /// Update fields of a product
    Update {
        /// Product ID (UUID) or reference
        product: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        price: Option<f64>,

        #[arg(long)]
        description: Option<String>,

        /// Replace all images (repeat; at least four)
        #[arg(long = "image", short = 'i')]
        images: Vec<String>,

        /// Move to another category (code or ID)
        #[arg(long, short = 'c')]
        category: Option<String>,

        /// Change status directly (available or sold)
        #[arg(long, short = 's')]
        status: Option<ProductStatusArg>,
    },

    /// Delete a product
    #[command(alias = "rm")]
    Delete {
        /// Product ID (UUID) or reference
        product: String,
    },
}

// ── Categories ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    pub command: CategoriesCommand,
}

#[derive(Debug, Subcommand)]
pub enum CategoriesCommand {
    /// List categories
    #[command(alias = "ls")]
    List,

    /// Add a category
    Add {
        /// Display name
        name: String,

        /// Short code (2-4 letters or digits) used in product references
        code: String,
    },

    /// Rename a category or change its code
    Update {
        /// Category code or ID
        category: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        code: Option<String>,
    },

    /// Delete a category with no products
    #[command(alias = "rm")]
    Delete {
        /// Category code or ID
        category: String,
    },
}

// ── Reservations ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReservationsArgs {
    #[command(subcommand)]
    pub command: ReservationsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReservationsCommand {
    /// List reservations, newest first
    #[command(alias = "ls")]
    List {
        /// Only reservations with this status
        #[arg(long, short = 's')]
        status: Option<ReservationStatusArg>,

        /// Only reservations for this product (ID or reference)
        #[arg(long)]
        product: Option<String>,
    },

    /// Reserve an available product for a customer
    Reserve {
        /// Product ID (UUID) or reference
        product: String,

        /// Customer name
        name: String,

        /// Customer phone
        phone: String,
    },

    /// Complete a pending reservation (the product is sold)
    Complete {
        /// Reservation ID, or the reference of a reserved product
        reservation: String,
    },

    /// Cancel a pending reservation (the product is available again)
    Cancel {
        /// Reservation ID, or the reference of a reserved product
        reservation: String,
    },
}

// ── Settings ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show store settings
    Show,

    /// Change one or more settings
    Set {
        #[arg(long)]
        store_name: Option<String>,

        #[arg(long)]
        logo_url: Option<String>,

        #[arg(long)]
        slogan: Option<String>,

        /// WhatsApp number in international format
        #[arg(long)]
        whatsapp: Option<String>,

        /// Local currency units per US dollar
        #[arg(long)]
        exchange_rate: Option<f64>,
    },
}

// ── Reconcile ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    #[command(subcommand)]
    pub command: ReconcileCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReconcileCommand {
    /// List recorded issues
    #[command(alias = "ls")]
    List,

    /// Forget all recorded issues
    Clear,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a value on the active profile
    Set {
        /// Profile key (e.g., "url", "anon_key_env", "realtime")
        key: String,

        /// Value to set
        value: String,
    },

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
