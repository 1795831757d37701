/*
[INPUT]:  Raw command-line arguments
[OUTPUT]: Parsed command tree
[POS]:    CLI layer - argument definitions
[UPDATE]: When adding commands or flags
*/

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use motomarket_adapter::{PaymentMethod, PlanId};

#[derive(Parser, Debug)]
#[command(name = "motomarket", version, about = "Motorcycle marketplace client")]
pub struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn", global = true)]
    pub log_level: String,
    /// Override the server root from the config file
    #[arg(long = "base-url", value_name = "URL", global = true)]
    pub base_url: Option<String>,
    /// Validate configuration and exit without contacting the server
    #[arg(long = "dry-run", global = true)]
    pub dry_run: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a configuration file interactively
    Init {
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    #[command(subcommand)]
    Auth(AuthCommand),
    #[command(subcommand)]
    Listings(ListingCommand),
    #[command(subcommand)]
    Messages(MessageCommand),
    #[command(subcommand)]
    Payments(PaymentCommand),
    #[command(subcommand)]
    Subscriptions(SubscriptionCommand),
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    Login {
        #[arg(long)]
        email: String,
        /// Prompted when omitted
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    Whoami,
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Confirm the phone number with the SMS code
    VerifyPhone { code: String },
    /// Send a new SMS code
    ResendCode,
    VerifyEmail { token: String },
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    /// Set a new password with the token from the reset email
    ResetPassword { token: String },
    UpdateDetails {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    UpdatePassword,
}

#[derive(Subcommand, Debug)]
pub enum ListingCommand {
    Search(SearchArgs),
    Show { id: String },
    /// Listings of the signed-in seller
    Mine,
    Create(DraftArgs),
    Update {
        id: String,
        #[command(flatten)]
        draft: DraftArgs,
    },
    Delete {
        id: String,
        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
    Sold { id: String },
    Fav { id: String },
    Unfav { id: String },
    Favorites,
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Free text search
    pub query: Option<String>,
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub min_price: Option<Decimal>,
    #[arg(long)]
    pub max_price: Option<Decimal>,
    #[arg(long)]
    pub min_year: Option<u16>,
    #[arg(long)]
    pub max_year: Option<u16>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    /// e.g. `-price` or `year`
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Args, Debug, Default)]
pub struct DraftArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub year: Option<u16>,
    #[arg(long)]
    pub mileage: Option<u32>,
    #[arg(long)]
    pub price: Option<Decimal>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    /// Repeat for each feature
    #[arg(long = "feature")]
    pub features: Vec<String>,
    /// Image file to upload; repeat for several
    #[arg(long = "image", value_name = "PATH")]
    pub images: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum MessageCommand {
    /// Conversations of the signed-in user
    List,
    /// Print a thread and mark it read
    Show { conversation_id: String },
    Start { listing_id: String, message: String },
    Send { conversation_id: String, message: String },
    Read { conversation_id: String },
}

#[derive(Subcommand, Debug)]
pub enum PaymentCommand {
    List,
    Show { id: String },
    /// Pay with a credit card; card details are prompted
    Card {
        listing_id: String,
        #[arg(long, default_value = "basic")]
        plan_type: String,
    },
    Boleto {
        listing_id: String,
        #[arg(long, default_value = "basic")]
        plan_type: String,
    },
    Pix {
        listing_id: String,
        #[arg(long, default_value = "basic")]
        plan_type: String,
    },
    /// Extend a listing's publication period
    Renew {
        listing_id: String,
        #[arg(long, value_enum, default_value_t = MethodArg::Pix)]
        method: MethodArg,
    },
}

#[derive(Subcommand, Debug)]
pub enum SubscriptionCommand {
    /// Show the plan catalog
    Plans,
    List,
    Show { id: String },
    Subscribe {
        #[arg(value_enum)]
        plan: PlanArg,
        #[arg(long, value_enum, default_value_t = MethodArg::CreditCard)]
        method: MethodArg,
    },
    Cancel {
        id: String,
        #[arg(long, short = 'y')]
        yes: bool,
    },
    Renew { id: String },
    /// Show the listing quota of the active plan
    Limit,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodArg {
    CreditCard,
    Boleto,
    Pix,
}

impl From<MethodArg> for PaymentMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::CreditCard => PaymentMethod::CreditCard,
            MethodArg::Boleto => PaymentMethod::Boleto,
            MethodArg::Pix => PaymentMethod::Pix,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanArg {
    Basic,
    Standard,
    Premium,
    Unlimited,
}

impl From<PlanArg> for PlanId {
    fn from(arg: PlanArg) -> Self {
        match arg {
            PlanArg::Basic => PlanId::Basic,
            PlanArg::Standard => PlanId::Standard,
            PlanArg::Premium => PlanId::Premium,
            PlanArg::Unlimited => PlanId::Unlimited,
        }
    }
}

impl Command {
    /// Front-end route a command stands for, when it needs an account
    pub fn protected_path(&self) -> Option<&'static str> {
        match self {
            Command::Init { .. } => None,
            Command::Auth(cmd) => match cmd {
                AuthCommand::Whoami
                | AuthCommand::UpdateDetails { .. }
                | AuthCommand::UpdatePassword => Some("/dashboard/profile"),
                AuthCommand::VerifyPhone { .. } | AuthCommand::ResendCode => {
                    Some("/verification")
                }
                _ => None,
            },
            Command::Listings(cmd) => match cmd {
                ListingCommand::Search(_) | ListingCommand::Show { .. } => None,
                ListingCommand::Create(_) => Some("/dashboard/listings/create"),
                ListingCommand::Update { .. } => Some("/dashboard/listings/edit/:id"),
                ListingCommand::Favorites
                | ListingCommand::Fav { .. }
                | ListingCommand::Unfav { .. } => Some("/dashboard/favorites"),
                ListingCommand::Mine | ListingCommand::Delete { .. } | ListingCommand::Sold { .. } => {
                    Some("/dashboard/listings")
                }
            },
            Command::Messages(_) => Some("/dashboard/messages"),
            Command::Payments(_) => Some("/dashboard/payment/:id"),
            Command::Subscriptions(SubscriptionCommand::Plans) => None,
            Command::Subscriptions(_) => Some("/dashboard/subscriptions"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_with_filters() {
        let cli = Cli::try_parse_from([
            "motomarket",
            "listings",
            "search",
            "cb 500",
            "--brand",
            "Honda",
            "--max-price",
            "40000.50",
        ])
        .unwrap();

        let Some(Command::Listings(ListingCommand::Search(args))) = cli.command else {
            panic!("expected listings search");
        };
        assert_eq!(args.query.as_deref(), Some("cb 500"));
        assert_eq!(args.max_price, Some(Decimal::new(4_000_050, 2)));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "motomarket",
            "subscriptions",
            "subscribe",
            "premium",
            "--method",
            "pix",
            "--dry-run",
        ])
        .unwrap();

        assert!(cli.dry_run);
        match cli.command {
            Some(Command::Subscriptions(SubscriptionCommand::Subscribe { plan, method })) => {
                assert_eq!(PlanId::from(plan), PlanId::Premium);
                assert_eq!(PaymentMethod::from(method), PaymentMethod::Pix);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_protected_paths() {
        let search = Command::Listings(ListingCommand::Search(SearchArgs::default()));
        assert_eq!(search.protected_path(), None);

        let mine = Command::Listings(ListingCommand::Mine);
        assert_eq!(mine.protected_path(), Some("/dashboard/listings"));

        let whoami = Command::Auth(AuthCommand::Whoami);
        assert_eq!(whoami.protected_path(), Some("/dashboard/profile"));

        let favorites = Command::Listings(ListingCommand::Favorites);
        assert_eq!(favorites.protected_path(), Some("/dashboard/favorites"));

        let inbox = Command::Messages(MessageCommand::List);
        assert_eq!(inbox.protected_path(), Some("/dashboard/messages"));

        let verify = Command::Auth(AuthCommand::VerifyPhone {
            code: "123456".to_string(),
        });
        assert_eq!(verify.protected_path(), Some("/verification"));

        let plans = Command::Subscriptions(SubscriptionCommand::Plans);
        assert_eq!(plans.protected_path(), None);
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
