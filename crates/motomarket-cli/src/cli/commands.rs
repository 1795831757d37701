/*
[INPUT]:  Parsed command and a started marketplace session
[OUTPUT]: Store calls and printed results
[POS]:    CLI layer - command execution
[UPDATE]: When commands or store operations change
*/

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use console::style;
use tracing::debug;

use motomarket_adapter::{
    Access, ImageUpload, ListingDraft, ListingFilters, Location, MarketError,
    Marketplace, PaymentMethod, RegisterRequest, UpdateDetailsRequest,
};

use crate::cli::args::{
    AuthCommand, Command, DraftArgs, ListingCommand, MessageCommand, PaymentCommand, SearchArgs,
    SubscriptionCommand,
};
use crate::cli::{prompt, render};

/// Refuse commands whose route the session may not open
pub fn ensure_access(market: &Marketplace, command: &Command) -> Result<()> {
    let Some(path) = command.protected_path() else {
        return Ok(());
    };
    match market.session.access(path) {
        Access::Granted => Ok(()),
        Access::RedirectLogin => bail!("Sign in first: motomarket auth login --email <EMAIL>"),
        Access::RedirectVerification => {
            bail!("Confirm your phone first: motomarket auth verify-phone <CODE>")
        }
        Access::Pending => bail!("Session is still loading, try again"),
    }
}

pub async fn run(command: Command, market: &Marketplace) -> Result<()> {
    ensure_access(market, &command)?;
    match command {
        Command::Init { .. } => Ok(()),
        Command::Auth(cmd) => run_auth(cmd, market).await,
        Command::Listings(cmd) => run_listings(cmd, market).await,
        Command::Messages(cmd) => run_messages(cmd, market).await,
        Command::Payments(cmd) => run_payments(cmd, market).await,
        Command::Subscriptions(cmd) => run_subscriptions(cmd, market).await,
    }
}

/// Turn a store failure into the message the store recorded
fn explain(err: MarketError, recorded: Option<String>) -> anyhow::Error {
    debug!(error = %err, "command failed");
    match (err, recorded) {
        (MarketError::NotSignedIn, _) => anyhow!("Not signed in. Run `motomarket auth login` first."),
        (err, recorded) if err.is_auth_error() => {
            let message = recorded.unwrap_or_else(|| err.to_string());
            anyhow!(
                "{}. Run `motomarket auth login` to sign in again.",
                message.trim_end_matches('.')
            )
        }
        (_, Some(message)) => anyhow!(message),
        (err, None) => anyhow::Error::new(err),
    }
}

fn print_lines(lines: impl IntoIterator<Item = String>) {
    for line in lines {
        println!("{line}");
    }
}

fn success(message: &str) {
    println!("{}", style(message).bold().green());
}

async fn run_auth(cmd: AuthCommand, market: &Marketplace) -> Result<()> {
    let session = &market.session;
    let fail = |err| explain(err, session.error());

    match cmd {
        AuthCommand::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt::password("Password")?,
            };
            let user = session.login(&email, &password).await.map_err(fail)?;
            success(&format!("Signed in as {}", user.name));
            if !user.is_phone_verified() {
                println!(
                    "{}",
                    style("Phone not verified yet: motomarket auth verify-phone <CODE>").yellow()
                );
            }
        }
        AuthCommand::Logout => {
            session.logout().await;
            success("Signed out");
        }
        AuthCommand::Whoami => match session.current_user() {
            Some(user) => print_lines(render::user_lines(&user)),
            None => println!("{}", style("Not signed in").yellow()),
        },
        AuthCommand::Register { name, email, phone } => {
            let password = prompt::new_password("Password")?;
            let req = RegisterRequest {
                name,
                email,
                password,
                phone,
            };
            let user = session.register(&req).await.map_err(fail)?;
            success(&format!("Welcome, {}! Check your SMS for the verification code.", user.name));
        }
        AuthCommand::VerifyPhone { code } => {
            session.verify_phone(&code).await.map_err(fail)?;
            success("Phone verified");
        }
        AuthCommand::ResendCode => {
            session.resend_phone_verification().await.map_err(fail)?;
            success("A new code is on its way");
        }
        AuthCommand::VerifyEmail { token } => {
            session.verify_email(&token).await.map_err(fail)?;
            success("Email verified");
        }
        AuthCommand::ForgotPassword { email } => {
            session.forgot_password(&email).await.map_err(fail)?;
            success("If the address is registered, a reset link was sent");
        }
        AuthCommand::ResetPassword { token } => {
            let password = prompt::new_password("New password")?;
            let user = session.reset_password(&token, &password).await.map_err(fail)?;
            success(&format!("Password changed, signed in as {}", user.name));
        }
        AuthCommand::UpdateDetails { name, email, phone } => {
            if name.is_none() && email.is_none() && phone.is_none() {
                bail!("Nothing to update: pass --name, --email or --phone");
            }
            let req = UpdateDetailsRequest { name, email, phone };
            let user = session.update_details(&req).await.map_err(fail)?;
            print_lines(render::user_lines(&user));
        }
        AuthCommand::UpdatePassword => {
            let current = prompt::password("Current password")?;
            let new = prompt::new_password("New password")?;
            session.update_password(&current, &new).await.map_err(fail)?;
            success("Password updated");
        }
    }
    Ok(())
}

async fn run_listings(cmd: ListingCommand, market: &Marketplace) -> Result<()> {
    let store = &market.listings;
    let fail = |err| explain(err, store.state().status.error);

    match cmd {
        ListingCommand::Search(args) => {
            let page = store.search_listings(&filters_from(args)).await.map_err(fail)?;
            if page.data.is_empty() {
                println!("{}", style("No listings found").yellow());
            }
            print_lines(page.data.iter().map(render::listing_line));
            if let Some(next) = page.pagination.next {
                println!("{}", style(format!("More results: --page {}", next.page)).dim());
            }
        }
        ListingCommand::Show { id } => {
            let listing = store.get_listing(&id).await.map_err(fail)?;
            print_lines(render::listing_detail(&listing));
        }
        ListingCommand::Mine => {
            let page = store.get_user_listings().await.map_err(fail)?;
            print_lines(page.data.iter().map(render::listing_line));
        }
        ListingCommand::Create(args) => {
            let active = store.count_active_listings().await.map_err(fail)?;
            if !market.subscriptions.can_create_listing(active) {
                bail!(
                    "Listing quota reached ({}). Upgrade with `motomarket subscriptions subscribe`.",
                    render::limit_label(market.subscriptions.listing_limit())
                );
            }

            let images = read_images(&args.images).await?;
            let draft = draft_from(args);
            let listing = store.create_listing(&draft, &images).await.map_err(fail)?;
            success(&format!("Listing {} created", listing.id));
            println!("{}", render::listing_line(&listing));
        }
        ListingCommand::Update { id, draft } => {
            let images = read_images(&draft.images).await?;
            let draft = draft_from(draft);
            let listing = store.update_listing(&id, &draft, &images).await.map_err(fail)?;
            success("Listing updated");
            println!("{}", render::listing_line(&listing));
        }
        ListingCommand::Delete { id, yes } => {
            if !yes && !prompt::confirm(&format!("Delete listing {id}?"))? {
                return Ok(());
            }
            store.delete_listing(&id).await.map_err(fail)?;
            success("Listing deleted");
        }
        ListingCommand::Sold { id } => {
            store.mark_as_sold(&id).await.map_err(fail)?;
            success("Marked as sold");
        }
        ListingCommand::Fav { id } => {
            store.add_to_favorites(&id).await.map_err(fail)?;
            success("Added to favorites");
        }
        ListingCommand::Unfav { id } => {
            store.remove_from_favorites(&id).await.map_err(fail)?;
            success("Removed from favorites");
        }
        ListingCommand::Favorites => {
            let favorites = store.get_favorite_listings().await.map_err(fail)?;
            if favorites.is_empty() {
                println!("{}", style("No favorites yet").yellow());
            }
            print_lines(favorites.iter().map(render::listing_line));
        }
    }
    Ok(())
}

fn filters_from(args: SearchArgs) -> ListingFilters {
    ListingFilters {
        search: args.query,
        brand: args.brand,
        model: args.model,
        min_price: args.min_price,
        max_price: args.max_price,
        min_year: args.min_year,
        max_year: args.max_year,
        city: args.city,
        state: args.state,
        sort: args.sort,
        page: args.page,
        limit: args.limit,
        ..ListingFilters::default()
    }
}

fn draft_from(args: DraftArgs) -> ListingDraft {
    let location = if args.city.is_some() || args.state.is_some() {
        Some(Location {
            city: args.city.unwrap_or_default(),
            state: args.state.unwrap_or_default(),
        })
    } else {
        None
    };
    ListingDraft {
        title: args.title,
        description: args.description,
        brand: args.brand,
        model: args.model,
        year: args.year,
        mileage: args.mileage,
        price: args.price,
        location,
        features: (!args.features.is_empty()).then_some(args.features),
    }
}

async fn read_images(paths: &[impl AsRef<Path>]) -> Result<Vec<ImageUpload>> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("read image {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());
        images.push(ImageUpload::new(file_name, bytes));
    }
    Ok(images)
}

async fn run_messages(cmd: MessageCommand, market: &Marketplace) -> Result<()> {
    let store = &market.messages;
    let fail = |err| explain(err, store.state().status.error);

    match cmd {
        MessageCommand::List => {
            let conversations = store.get_conversations().await.map_err(fail)?;
            if conversations.is_empty() {
                println!("{}", style("No conversations yet").yellow());
            }
            print_lines(conversations.iter().map(render::conversation_line));
        }
        MessageCommand::Show { conversation_id } => {
            store.get_conversations().await.map_err(fail)?;
            let messages = store.get_messages(&conversation_id).await.map_err(fail)?;
            if let Some(conversation) = store.state().current_conversation {
                println!("{}", render::conversation_line(&conversation));
            }
            let me = market.session.current_user().map(|user| user.id);
            print_lines(
                messages
                    .iter()
                    .map(|message| render::message_line(message, me.as_deref())),
            );
            store.mark_as_read(&conversation_id).await.map_err(fail)?;
        }
        MessageCommand::Start {
            listing_id,
            message,
        } => {
            let conversation = store
                .start_conversation(&listing_id, &message)
                .await
                .map_err(fail)?;
            success(&format!("Conversation {} started", conversation.id));
        }
        MessageCommand::Send {
            conversation_id,
            message,
        } => {
            store
                .send_message(&conversation_id, &message)
                .await
                .map_err(fail)?;
            success("Sent");
        }
        MessageCommand::Read { conversation_id } => {
            store.mark_as_read(&conversation_id).await.map_err(fail)?;
            success("Marked as read");
        }
    }
    Ok(())
}

async fn run_payments(cmd: PaymentCommand, market: &Marketplace) -> Result<()> {
    let store = &market.payments;
    let fail = |err| explain(err, store.state().status.error);

    let payment = match cmd {
        PaymentCommand::List => {
            let payments = store.get_user_payments().await.map_err(fail)?;
            if payments.is_empty() {
                println!("{}", style("No payments yet").yellow());
            }
            print_lines(payments.iter().flat_map(render::payment_lines));
            return Ok(());
        }
        PaymentCommand::Show { id } => store.get_payment(&id).await.map_err(fail)?,
        PaymentCommand::Card {
            listing_id,
            plan_type,
        } => {
            let card = prompt::card_details()?;
            store
                .process_card_payment(&listing_id, &plan_type, card)
                .await
                .map_err(fail)?
        }
        PaymentCommand::Boleto {
            listing_id,
            plan_type,
        } => store
            .generate_boleto(&listing_id, &plan_type)
            .await
            .map_err(fail)?,
        PaymentCommand::Pix {
            listing_id,
            plan_type,
        } => store
            .generate_pix(&listing_id, &plan_type)
            .await
            .map_err(fail)?,
        PaymentCommand::Renew { listing_id, method } => {
            let renewal = store
                .renew_listing(&listing_id, PaymentMethod::from(method))
                .await
                .map_err(fail)?;
            if let Some(listing) = &renewal.listing {
                success("Listing renewed");
                println!("{}", render::listing_line(listing));
            }
            renewal.payment
        }
    };
    print_lines(render::payment_lines(&payment));
    Ok(())
}

async fn run_subscriptions(cmd: SubscriptionCommand, market: &Marketplace) -> Result<()> {
    let store = &market.subscriptions;
    let fail = |err| explain(err, store.state().status.error);

    match cmd {
        SubscriptionCommand::Plans => {
            for plan in store.plans() {
                print_lines(render::plan_lines(plan));
            }
        }
        SubscriptionCommand::List => {
            let subscriptions = store.get_subscriptions().await.map_err(fail)?;
            if subscriptions.is_empty() {
                println!("{}", style("No subscriptions").yellow());
            }
            print_lines(subscriptions.iter().map(render::subscription_line));
        }
        SubscriptionCommand::Show { id } => {
            let subscription = store.get_subscription(&id).await.map_err(fail)?;
            println!("{}", render::subscription_line(&subscription));
        }
        SubscriptionCommand::Subscribe { plan, method } => {
            let method = PaymentMethod::from(method);
            let details = match method {
                PaymentMethod::CreditCard => Some(prompt::card_details()?),
                _ => None,
            };
            let subscription = store
                .create_subscription(plan.into(), method, details)
                .await
                .map_err(fail)?;
            success("Subscribed");
            println!("{}", render::subscription_line(&subscription));
        }
        SubscriptionCommand::Cancel { id, yes } => {
            if !yes && !prompt::confirm(&format!("Cancel subscription {id}?"))? {
                return Ok(());
            }
            store.cancel_subscription(&id).await.map_err(fail)?;
            success("Subscription canceled");
        }
        SubscriptionCommand::Renew { id } => {
            let subscription = store.renew_subscription(&id).await.map_err(fail)?;
            success("Subscription renewed");
            println!("{}", render::subscription_line(&subscription));
        }
        SubscriptionCommand::Limit => {
            println!("{}", render::limit_label(store.listing_limit()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use motomarket_adapter::{MarketClient, MemoryTokenStorage};

    #[test]
    fn test_draft_location_only_when_given() {
        let draft = draft_from(DraftArgs {
            title: Some("XRE 300".to_string()),
            ..DraftArgs::default()
        });
        assert!(draft.location.is_none());
        assert!(draft.features.is_none());

        let draft = draft_from(DraftArgs {
            city: Some("Recife".to_string()),
            features: vec!["ABS".to_string()],
            ..DraftArgs::default()
        });
        assert_eq!(draft.location.map(|loc| loc.city), Some("Recife".to_string()));
        assert_eq!(draft.features, Some(vec!["ABS".to_string()]));
    }

    #[test]
    fn test_explain_prefers_recorded_message() {
        let err = explain(
            MarketError::InvalidResponse("bad".to_string()),
            Some("Could not load".to_string()),
        );
        assert_eq!(err.to_string(), "Could not load");

        let err = explain(MarketError::NotSignedIn, None);
        assert!(err.to_string().contains("auth login"));
    }

    #[test]
    fn test_explain_rejected_token_suggests_login() {
        let err = explain(
            MarketError::Api {
                status: 401,
                message: Some("Not authorized to access this route".to_string()),
            },
            Some("Not authorized to access this route".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "Not authorized to access this route. Run `motomarket auth login` to sign in again."
        );
    }

    #[tokio::test]
    async fn test_signed_out_cannot_open_dashboard() {
        let client = MarketClient::with_base_url("http://127.0.0.1:9").unwrap();
        let market = Marketplace::new(client, Arc::new(MemoryTokenStorage::new()));
        market.start().await;

        let err = ensure_access(&market, &Command::Listings(ListingCommand::Mine)).unwrap_err();
        assert!(err.to_string().contains("Sign in first"));

        let search = Command::Listings(ListingCommand::Search(SearchArgs::default()));
        assert!(ensure_access(&market, &search).is_ok());
    }
}
