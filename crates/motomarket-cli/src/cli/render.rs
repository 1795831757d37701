/*
[INPUT]:  Marketplace records
[OUTPUT]: Styled terminal lines
[POS]:    CLI layer - output formatting
[UPDATE]: When records gain fields worth showing
*/

use console::style;
use rust_decimal::Decimal;

use motomarket_adapter::{
    Conversation, Listing, ListingLimit, ListingStatus, Message, Payment, Plan, Subscription,
    User,
};

pub fn money(amount: Decimal) -> String {
    format!("R$ {:.2}", amount.round_dp(2))
}

pub fn listing_line(listing: &Listing) -> String {
    let year = listing
        .year
        .map(|year| year.to_string())
        .unwrap_or_else(|| "-".to_string());
    let place = listing
        .location
        .as_ref()
        .map(|loc| format!("{}/{}", loc.city, loc.state))
        .unwrap_or_default();
    format!(
        "{}  {}  {}  {}  {}  {}",
        style(&listing.id).dim(),
        style(&listing.title).bold(),
        year,
        style(money(listing.price)).green(),
        place,
        status_label(listing.status),
    )
}

pub fn listing_detail(listing: &Listing) -> Vec<String> {
    let mut lines = vec![
        style(&listing.title).bold().cyan().to_string(),
        format!("Brand/model: {} {}", listing.brand, listing.model),
        format!("Price:       {}", money(listing.price)),
        format!("Status:      {}", status_label(listing.status)),
    ];
    if let Some(year) = listing.year {
        lines.push(format!("Year:        {year}"));
    }
    if let Some(mileage) = listing.mileage {
        lines.push(format!("Mileage:     {mileage} km"));
    }
    if let Some(loc) = &listing.location {
        lines.push(format!("Location:    {}/{}", loc.city, loc.state));
    }
    if let Some(seller) = listing.seller.doc() {
        lines.push(format!("Seller:      {}", seller.name));
    }
    if !listing.features.is_empty() {
        lines.push(format!("Features:    {}", listing.features.join(", ")));
    }
    for image in &listing.images {
        lines.push(format!("Image:       {}", image.url()));
    }
    if !listing.description.is_empty() {
        lines.push(String::new());
        lines.push(listing.description.clone());
    }
    lines
}

fn status_label(status: ListingStatus) -> String {
    match status {
        ListingStatus::Active => style("active").green().to_string(),
        ListingStatus::Sold => style("sold").yellow().to_string(),
        ListingStatus::Pending => style("pending").dim().to_string(),
        ListingStatus::Expired => style("expired").red().to_string(),
        ListingStatus::Unknown => "unknown".to_string(),
    }
}

pub fn user_lines(user: &User) -> Vec<String> {
    let verified = |flag: bool| {
        if flag {
            style("verified").green().to_string()
        } else {
            style("not verified").yellow().to_string()
        }
    };
    vec![
        format!("{} <{}>", style(&user.name).bold(), user.email),
        format!("Id:    {}", user.id),
        format!("Phone: {}", user.phone.as_deref().unwrap_or("-")),
        format!("Email: {}", verified(user.verifications.email_verified)),
        format!("SMS:   {}", verified(user.verifications.phone_verified)),
    ]
}

pub fn conversation_line(conversation: &Conversation) -> String {
    let title = conversation
        .listing
        .doc()
        .map(|listing| listing.title.clone())
        .unwrap_or_else(|| conversation.listing.id().to_string());
    let preview = conversation
        .last_message
        .as_ref()
        .map(|last| last.content.clone())
        .unwrap_or_default();
    let unread = if conversation.unread_count > 0 {
        style(format!("({} new)", conversation.unread_count))
            .yellow()
            .to_string()
    } else {
        String::new()
    };
    format!(
        "{}  {}  {}  {}",
        style(&conversation.id).dim(),
        style(title).bold(),
        unread,
        preview
    )
}

pub fn message_line(message: &Message, me: Option<&str>) -> String {
    let author = match message.sender.doc() {
        Some(sender) => sender.name.clone(),
        None => message.sender.id().to_string(),
    };
    let author = if me == Some(message.sender.id()) {
        style("you".to_string()).cyan()
    } else {
        style(author).bold()
    };
    let at = message
        .created_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!("{} {}: {}", style(at).dim(), author, message.content)
}

pub fn payment_lines(payment: &Payment) -> Vec<String> {
    let mut lines = vec![format!(
        "{}  {}  {}  {:?}",
        style(&payment.id).dim(),
        payment.payment_method.as_str(),
        style(money(payment.amount)).green(),
        payment.status,
    )];
    if let Some(url) = &payment.boleto_url {
        lines.push(format!("  Boleto: {url}"));
    }
    if let Some(code) = &payment.pix_code {
        lines.push(format!("  PIX copy-and-paste: {code}"));
    }
    lines
}

pub fn subscription_line(subscription: &Subscription) -> String {
    let ends = subscription
        .end_date
        .map(|end| end.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}  {}  {:?}  until {}  auto-renew: {}",
        style(&subscription.id).dim(),
        style(Plan::find(subscription.plan).map_or("Unknown plan", |plan| plan.name)).bold(),
        subscription.status,
        ends,
        if subscription.auto_renew { "on" } else { "off" },
    )
}

pub fn plan_lines(plan: &Plan) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({})  {}/month  {}",
        style(plan.name).bold().cyan(),
        plan.id.as_str(),
        style(money(plan.price())).green(),
        style(plan.description).dim(),
    )];
    for feature in plan.features {
        let mark = if feature.included {
            style("+").green()
        } else {
            style("-").red()
        };
        lines.push(format!("  {mark} {}", feature.text));
    }
    lines
}

pub fn limit_label(limit: ListingLimit) -> String {
    match limit {
        ListingLimit::Limited(0) => "no plan quota (pay per listing)".to_string(),
        other => format!("{other} simultaneous listings"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motomarket_adapter::PlanId;

    #[test]
    fn test_money_keeps_two_places() {
        assert_eq!(money(Decimal::new(4990, 2)), "R$ 49.90");
        assert_eq!(money(Decimal::new(32900, 0)), "R$ 32900.00");
    }

    #[test]
    fn test_plan_lines_list_every_feature() {
        let plan = Plan::find(PlanId::Standard).unwrap();
        let lines = plan_lines(plan);
        assert_eq!(lines.len(), 1 + plan.features.len());
        assert!(lines[0].contains("standard"));
    }

    #[test]
    fn test_limit_label() {
        assert_eq!(
            limit_label(ListingLimit::Limited(0)),
            "no plan quota (pay per listing)"
        );
        assert_eq!(limit_label(ListingLimit::Unlimited), "unlimited simultaneous listings");
    }
}
