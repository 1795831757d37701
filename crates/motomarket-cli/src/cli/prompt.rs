/*
[INPUT]:  Interactive user input via terminal
[OUTPUT]: Secrets, card details and confirmations
[POS]:    CLI layer - dialoguer prompts
[UPDATE]: When a command needs new interactive input
*/

use anyhow::Result;
use dialoguer::{Confirm, Input, Password, theme::ColorfulTheme};

use motomarket_adapter::CardDetails;

pub fn password(prompt: &str) -> Result<String> {
    Ok(Password::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact()?)
}

/// Password typed twice
pub fn new_password(prompt: &str) -> Result<String> {
    Ok(Password::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?)
}

pub fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

pub fn card_details() -> Result<CardDetails> {
    let theme = ColorfulTheme::default();

    let card_number: String = Input::with_theme(&theme)
        .with_prompt("Card number")
        .validate_with(|input: &String| -> Result<(), &str> {
            let digits = input.chars().filter(|c| !c.is_whitespace()).count();
            if (13..=19).contains(&digits) && input.chars().all(|c| c.is_ascii_digit() || c == ' ')
            {
                Ok(())
            } else {
                Err("Enter 13 to 19 digits")
            }
        })
        .interact_text()?;

    let card_holder_name: String = Input::with_theme(&theme)
        .with_prompt("Name on card")
        .interact_text()?;

    let expiration_date: String = Input::with_theme(&theme)
        .with_prompt("Expiration (MM/YY)")
        .validate_with(|input: &String| -> Result<(), &str> {
            if is_expiration(input) {
                Ok(())
            } else {
                Err("Use MM/YY")
            }
        })
        .interact_text()?;

    let cvv = Password::with_theme(&theme).with_prompt("CVV").interact()?;

    let installments: u8 = Input::with_theme(&theme)
        .with_prompt("Installments")
        .default(1)
        .interact_text()?;

    Ok(CardDetails {
        card_number: card_number.replace(' ', ""),
        card_holder_name,
        expiration_date,
        cvv,
        installments: Some(installments),
    })
}

fn is_expiration(input: &str) -> bool {
    let Some((month, year)) = input.split_once('/') else {
        return false;
    };
    let month_ok = month
        .parse::<u8>()
        .map(|m| (1..=12).contains(&m))
        .unwrap_or(false);
    month_ok && year.len() == 2 && year.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiration_format() {
        assert!(is_expiration("01/29"));
        assert!(is_expiration("12/30"));
        assert!(!is_expiration("13/29"));
        assert!(!is_expiration("1229"));
        assert!(!is_expiration("12/2029"));
    }
}
