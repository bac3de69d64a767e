//! CLI command implementations

use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::Confirm;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::form::{Destination, SendForm, ValidationResult};
use crate::node::NodeTransactionBuilder;
use crate::submit::{SubmissionCoordinator, SubmitOutcome};
use crate::wallet::{Wallet, WalletRegistry, WalletSource};

use super::prompt::{ConsoleNotifier, TerminalSecretPrompt};

/// Arguments of the `send` command
#[derive(Debug, Clone, Default)]
pub struct SendArgs {
    pub wallet: String,
    /// Source addresses; empty selects every spendable address
    pub from: Vec<String>,
    /// `address:coins[:hours]` specs
    pub to: Vec<String>,
    pub manual_hours: bool,
    pub share_factor: Option<String>,
    pub change_address: Option<String>,
    pub force: bool,
    pub dry_run: bool,
}

async fn load_wallet(config: &Config, id: &str) -> Result<Wallet> {
    let registry = WalletRegistry::load(Path::new(&config.wallet.registry_path))
        .context("Failed to load wallet registry")?;

    registry
        .wallet(id)
        .await
        .with_context(|| format!("Wallet '{}' not in {}", id, config.wallet.registry_path))
}

/// Fill a form from command-line arguments
pub fn build_form(config: &Config, wallet: Wallet, args: &SendArgs) -> Result<SendForm> {
    if args.to.is_empty() {
        anyhow::bail!("At least one --to destination is required");
    }

    let mut form = SendForm::with_policy(config.form.hours_policy());
    form.set_wallet(wallet);

    if args.from.is_empty() {
        let all: Vec<String> = form
            .selectable_addresses()
            .iter()
            .map(|a| a.address.clone())
            .collect();
        debug!("No --from given, selecting all {} spendable addresses", all.len());
        form.select_addresses(&all)?;
    } else {
        form.select_addresses(&args.from)?;
    }

    for (index, spec) in args.to.iter().enumerate() {
        let destination = Destination::parse_spec(spec)?;
        if index > 0 {
            form.add_destination();
        }
        form.set_destination(index, destination)?;
    }

    if args.manual_hours {
        form.set_auto_hours(false);
    }

    if let Some(share) = &args.share_factor {
        form.set_share_value(share)?;
    }

    if let Some(change) = &args.change_address {
        form.set_change_address(change.clone());
    }

    Ok(form)
}

fn print_summary(form: &SendForm) {
    println!("\n=== SEND SUMMARY ===");
    if let Some(wallet) = form.wallet() {
        println!("Wallet: {}", wallet);
    }
    println!("From: {}", form.selected_addresses_label());

    for (i, d) in form.destination_payload().iter().enumerate() {
        match &d.hours {
            Some(hours) => println!(
                "  {}. {} <- {} coins, {} hours",
                i + 1,
                d.address,
                d.coins,
                hours
            ),
            None => println!("  {}. {} <- {} coins", i + 1, d.address, d.coins),
        }
    }

    println!("Total: {} coins", form.destinations().total_coins());
    if form.policy().is_auto() {
        println!("Hours: automatic (share factor {})", form.policy().share_factor());
    } else {
        println!(
            "Hours: manual ({} total)",
            form.destinations().total_hours(form.policy())
        );
    }
    if let Some(change) = form.change_address_opt() {
        println!("Change: {}", change);
    }
}

/// Build and submit a transaction
pub async fn send(config: &Config, args: SendArgs) -> Result<()> {
    let wallet = load_wallet(config, &args.wallet).await?;
    let form = build_form(config, wallet, &args)?;

    print_summary(&form);

    match form.validation() {
        ValidationResult::Valid => {}
        ValidationResult::MissingSelection => {
            anyhow::bail!("No spendable source addresses selected")
        }
        ValidationResult::Invalid { reason } => anyhow::bail!("Invalid destinations: {}", reason),
    }

    if args.dry_run {
        println!("\n=== DRY RUN ===");
        println!("Form is valid; no transaction requested");
        return Ok(());
    }

    if !args.force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Send {} coins to {} destination(s)?",
                form.destinations().total_coins(),
                form.destinations().len()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            info!("Send cancelled by user");
            return Ok(());
        }
    }

    let label = form
        .wallet()
        .map(|w| w.to_string())
        .unwrap_or_default();

    let (coordinator, mut events) = SubmissionCoordinator::new(
        NodeTransactionBuilder::from_config(&config.node)?,
        TerminalSecretPrompt::new(&label),
        ConsoleNotifier::default(),
        config.submit.settings(),
    );

    let outcome = coordinator.submit(&form).await?;
    coordinator.dispose().await;

    match outcome {
        SubmitOutcome::Submitted(_) => {
            // Disposed above, so the channel ends after the buffered event
            while let Some(event) = events.recv().await {
                println!("\n=== TRANSACTION BUILT ===");
                println!("Txid: {}", event.transaction.txid);
                println!("Amount: {} coins", event.amount);
                println!("To: {}", event.to.join(", "));
                println!("Fee: {} hours", event.transaction.fee);
                if !event.transaction.encoded.is_empty() {
                    println!("Encoded: {}", event.transaction.encoded);
                }
            }
            Ok(())
        }
        SubmitOutcome::Cancelled => {
            warn!("Password not entered, nothing sent");
            Ok(())
        }
        SubmitOutcome::Skipped(reason) => {
            anyhow::bail!("Submission skipped: {:?}", reason)
        }
        SubmitOutcome::Failed(message) => {
            error!("Transaction build failed: {}", message);
            anyhow::bail!("Transaction build failed: {}", message)
        }
    }
}

/// List spendable addresses of a wallet
pub async fn addresses(config: &Config, wallet_id: &str) -> Result<()> {
    let wallet = load_wallet(config, wallet_id).await?;
    let spendable = crate::wallet::filter_spendable(&wallet.addresses);

    println!("\n=== {} ===\n", wallet);
    if spendable.is_empty() {
        println!("No spendable addresses.");
        return Ok(());
    }

    println!("{:<40} {:>16} {:>12}", "ADDRESS", "COINS", "HOURS");
    println!("{}", "-".repeat(70));
    for address in &spendable {
        println!(
            "{:<40} {:>16.6} {:>12}",
            address.address, address.coins, address.hours
        );
    }
    println!("{}", "-".repeat(70));
    println!(
        "{:<40} {:>16.6} {:>12}",
        "TOTAL",
        wallet.total_coins(),
        wallet.total_hours()
    );

    if wallet.encrypted {
        println!("\nWallet is encrypted; sending will ask for its password.");
    }

    Ok(())
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Address;

    fn wallet() -> Wallet {
        Wallet {
            id: "main.wlt".to_string(),
            label: String::new(),
            encrypted: false,
            addresses: vec![
                Address::new("a1", 4.0, 20),
                Address::new("a2", 0.0, 90),
                Address::new("a3", 6.0, 30),
            ],
        }
    }

    #[test]
    fn test_build_form_selects_all_spendable() {
        let args = SendArgs {
            wallet: "main.wlt".to_string(),
            to: vec!["X:9.5".to_string()],
            ..Default::default()
        };

        let form = build_form(&Config::default(), wallet(), &args).unwrap();
        assert_eq!(form.selected_addresses().len(), 2);
        assert!(form.is_valid());
    }

    #[test]
    fn test_build_form_manual_hours() {
        let args = SendArgs {
            wallet: "main.wlt".to_string(),
            from: vec!["a1".to_string()],
            to: vec!["X:1:10".to_string(), "Y:2:15".to_string()],
            manual_hours: true,
            ..Default::default()
        };

        let form = build_form(&Config::default(), wallet(), &args).unwrap();
        assert_eq!(form.destinations().len(), 2);
        assert!(matches!(
            form.validation(),
            ValidationResult::Invalid { .. }
        ));
    }

    #[test]
    fn test_build_form_share_factor() {
        let args = SendArgs {
            wallet: "main.wlt".to_string(),
            to: vec!["X:1".to_string()],
            share_factor: Some("0.125".to_string()),
            ..Default::default()
        };

        let form = build_form(&Config::default(), wallet(), &args).unwrap();
        assert_eq!(form.policy().share_factor(), "0.13");
    }

    #[test]
    fn test_build_form_requires_destination() {
        let args = SendArgs {
            wallet: "main.wlt".to_string(),
            ..Default::default()
        };
        assert!(build_form(&Config::default(), wallet(), &args).is_err());
    }

    #[test]
    fn test_build_form_rejects_unspendable_source() {
        let args = SendArgs {
            wallet: "main.wlt".to_string(),
            from: vec!["a2".to_string()],
            to: vec!["X:1".to_string()],
            ..Default::default()
        };
        assert!(build_form(&Config::default(), wallet(), &args).is_err());
    }
}
