//! Tenant Billing CLI - command-line health check for the multi-tenant billing client
//!
//! Reads the client configuration from a TOML file (or `--base-url`), takes the
//! tenant's API key from `BILLING_API_KEY`, and runs a single read against the
//! billing service.
//!
//! ```text
//! BILLING_API_KEY=... tenant-billing --config tenant-billing.toml coupon SUMMER20
//! BILLING_API_KEY=... tenant-billing --base-url https://acme.billing.example.com/v2 plans
//! BILLING_API_KEY=... tenant-billing check
//! ```
//!
//! # Environment Variables
//!
//! - `BILLING_API_KEY`: tenant credential (required)
//! - `LOG_FORMAT`: `json` or `pretty` (default: `pretty`)
//! - `RUST_LOG`: log level filter (default: `warn`)

#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest"
)]

mod observability;

use std::{fmt::Debug, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tenant_billing::{BillingClient, BillingError, ClientConfig, Credential, Result, WireFormat};
use tracing::{error, info};

use crate::observability::{Check, CheckReport, CheckStatus, LogFormat, init_observability};

/// Environment variable holding the tenant credential.
const API_KEY_VAR: &str = "BILLING_API_KEY";

#[derive(Parser, Debug)]
#[command(name = "tenant-billing")]
#[command(about = "Query a subscription-billing service under one tenant's credential")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "tenant-billing.toml")]
    config: PathBuf,

    /// Base URL; overrides the configuration file
    #[arg(long)]
    base_url: Option<String>,

    /// Wire format (xml or json); overrides the configuration file
    #[arg(long)]
    format: Option<WireFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one account
    Account { account_code: String },
    /// List accounts
    Accounts,
    /// Show one coupon
    Coupon { coupon_code: String },
    /// Show one plan
    Plan { plan_code: String },
    /// List plans
    Plans,
    /// List the add-ons of a plan
    AddOns { plan_code: String },
    /// List an account's subscriptions
    Subscriptions {
        account_code: String,
        /// Only subscriptions in this state
        #[arg(long)]
        state: Option<String>,
    },
    /// List an account's invoices
    Invoices {
        account_code: String,
        /// Only invoices in this state
        #[arg(long)]
        state: Option<String>,
    },
    /// Show an account's billing info
    BillingInfo { account_code: String },
    /// Verify configuration, credential and connectivity
    Check,
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.base_url {
            Some(base_url) => ClientConfig::new(base_url.clone()),
            None => ClientConfig::from_file(&self.config)?,
        };
        if let Some(format) = self.format {
            config.format = format;
        }
        config.validate()?;
        Ok(config)
    }
}

fn credential_from_env() -> Result<Credential> {
    let key = std::env::var(API_KEY_VAR)
        .map_err(|_| BillingError::Config(format!("{API_KEY_VAR} is not set")))?;
    Credential::new(key)
}

fn print<T: Debug>(value: &T) {
    println!("{value:#?}");
}

async fn run(cli: &Cli) -> Result<ExitCode> {
    if matches!(cli.command, Command::Check) {
        return Ok(report(cli).await);
    }

    let config = cli.client_config()?;
    let credential = credential_from_env()?;
    let client = BillingClient::from_config(&config)?;
    info!(base_url = %config.base_url, format = %config.format, %credential, "client ready");

    match &cli.command {
        Command::Account { account_code } => print(&client.get_account(account_code, &credential).await?),
        Command::Accounts => print(&client.get_accounts(&credential).await?),
        Command::Coupon { coupon_code } => print(&client.get_coupon(coupon_code, &credential).await?),
        Command::Plan { plan_code } => print(&client.get_plan(plan_code, &credential).await?),
        Command::Plans => print(&client.get_plans(&credential).await?),
        Command::AddOns { plan_code } => print(&client.get_add_ons(plan_code, &credential).await?),
        Command::Subscriptions { account_code, state } => {
            print(&client.get_account_subscriptions(account_code, state.as_deref(), &credential).await?);
        }
        Command::Invoices { account_code, state } => {
            print(&client.get_account_invoices(account_code, state.as_deref(), &credential).await?);
        }
        Command::BillingInfo { account_code } => {
            print(&client.get_billing_info(account_code, &credential).await?);
        }
        Command::Check => {}
    }

    client.close();
    Ok(ExitCode::SUCCESS)
}

/// Prints the check report as JSON. Fails only when requests cannot succeed.
async fn report(cli: &Cli) -> ExitCode {
    let report = check(cli).await;
    match report.to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "cannot serialize report"),
    }
    if report.status == CheckStatus::Unhealthy {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Runs every check, continuing past failures so the report is complete.
async fn check(cli: &Cli) -> CheckReport {
    let mut checks = Vec::new();

    let config = match cli.client_config() {
        Ok(config) => {
            checks.push(Check::pass("config", format!("{} over {}", config.base_url, config.format)));
            Some(config)
        }
        Err(e) => {
            checks.push(Check::fail("config", e.to_string()));
            None
        }
    };
    let base_url = config.as_ref().map(|config| config.base_url.clone()).unwrap_or_default();

    let credential = match credential_from_env() {
        Ok(credential) => {
            checks.push(Check::pass("credential", credential.to_string()));
            Some(credential)
        }
        Err(e) => {
            checks.push(Check::fail("credential", e.to_string()));
            None
        }
    };

    if let (Some(config), Some(credential)) = (config, credential) {
        let outcome = match BillingClient::from_config(&config) {
            Ok(client) => {
                let plans = client.get_plans(&credential).await;
                client.close();
                match plans {
                    Ok(plans) if plans.is_empty() => Check::warn("service", "reachable, no plans defined"),
                    Ok(plans) => Check::pass("service", format!("reachable, {} plans", plans.len())),
                    Err(e) => Check::fail("service", e.to_string()),
                }
            }
            Err(e) => Check::fail("service", e.to_string()),
        };
        checks.push(outcome);
    }

    CheckReport::new(base_url, checks)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_observability(LogFormat::from_env());
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
