//! Resource paths of the billing service.
//!
//! Identifiers supplied by callers are percent-encoded as single path
//! segments, so a code such as `a/b` can never address a different resource.
//! Paths are relative to the service base URL and start with `/`.

use url::Url;

use crate::error::{BillingError, Result};

/// Placeholder origin used only to borrow `url`'s encoders.
const PLACEHOLDER_BASE: &str = "https://billing.invalid/";

const ACCOUNTS: &str = "accounts";
const SUBSCRIPTIONS: &str = "subscriptions";
const TRANSACTIONS: &str = "transactions";
const INVOICES: &str = "invoices";
const PLANS: &str = "plans";
const ADD_ONS: &str = "add_ons";
const COUPONS: &str = "coupons";

/// State transition of an existing subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    /// Cancel at the end of the current period.
    Cancel,
    /// Undo a pending cancellation.
    Reactivate,
}

impl SubscriptionAction {
    const fn segment(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Reactivate => "reactivate",
        }
    }
}

/// Builds a path from segments, encoding each one.
///
/// # Errors
///
/// Returns [`BillingError::InvalidInput`] for an empty, `.` or `..` segment.
///
/// # Examples
///
/// ```
/// use tenant_billing::endpoint;
///
/// assert_eq!(endpoint::path(&["coupons", "SUMMER 20"]).unwrap(), "/coupons/SUMMER%2020");
/// assert!(endpoint::path(&["coupons", ""]).is_err());
/// ```
pub fn path(segments: &[&str]) -> Result<String> {
    path_with_query(segments, &[])
}

/// Builds a path from segments and appends form-encoded query parameters.
///
/// # Errors
///
/// Returns [`BillingError::InvalidInput`] for an empty, `.` or `..` segment.
pub fn path_with_query(segments: &[&str], params: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse(PLACEHOLDER_BASE).map_err(|e| BillingError::InvalidInput(e.to_string()))?;

    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| BillingError::InvalidInput("placeholder base cannot carry a path".to_owned()))?;
        path.clear();
        for segment in segments {
            validate_segment(segment)?;
            path.push(segment);
        }
    }

    if !params.is_empty() {
        let mut query_pairs = url.query_pairs_mut();
        for (key, value) in params {
            query_pairs.append_pair(key, value);
        }
    }

    let full_path = url.path().to_owned();
    match url.query() {
        Some(query) if !query.is_empty() => Ok(format!("{full_path}?{query}")),
        _ => Ok(full_path),
    }
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.trim().is_empty() {
        return Err(BillingError::InvalidInput("path segment cannot be empty".to_owned()));
    }
    if segment == "." || segment == ".." {
        return Err(BillingError::InvalidInput(format!("path segment '{segment}' not allowed")));
    }
    Ok(())
}

fn state_filter(state: Option<&str>) -> Vec<(&'static str, &str)> {
    state.map(|state| ("state", state)).into_iter().collect()
}

/// `/accounts`
#[must_use]
pub fn accounts() -> String {
    format!("/{ACCOUNTS}")
}

/// `/accounts/{account_code}`
pub fn account(account_code: &str) -> Result<String> {
    path(&[ACCOUNTS, account_code])
}

/// `/accounts/{account_code}/billing_info`
pub fn billing_info(account_code: &str) -> Result<String> {
    path(&[ACCOUNTS, account_code, "billing_info"])
}

/// `/accounts/{account_code}/redemption`
pub fn redemption(account_code: &str) -> Result<String> {
    path(&[ACCOUNTS, account_code, "redemption"])
}

/// `/accounts/{account_code}/subscriptions`, optionally filtered by state.
pub fn account_subscriptions(account_code: &str, state: Option<&str>) -> Result<String> {
    path_with_query(&[ACCOUNTS, account_code, SUBSCRIPTIONS], &state_filter(state))
}

/// `/accounts/{account_code}/transactions`
pub fn account_transactions(account_code: &str) -> Result<String> {
    path(&[ACCOUNTS, account_code, TRANSACTIONS])
}

/// `/accounts/{account_code}/invoices`, optionally filtered by state.
pub fn account_invoices(account_code: &str, state: Option<&str>) -> Result<String> {
    path_with_query(&[ACCOUNTS, account_code, INVOICES], &state_filter(state))
}

/// `/subscriptions`
#[must_use]
pub fn subscriptions() -> String {
    format!("/{SUBSCRIPTIONS}")
}

/// `/subscriptions/{uuid}`
pub fn subscription(uuid: &str) -> Result<String> {
    path(&[SUBSCRIPTIONS, uuid])
}

/// `/subscriptions/{uuid}/cancel` or `/subscriptions/{uuid}/reactivate`
pub fn subscription_action(uuid: &str, action: SubscriptionAction) -> Result<String> {
    path(&[SUBSCRIPTIONS, uuid, action.segment()])
}

/// `/transactions`
#[must_use]
pub fn transactions() -> String {
    format!("/{TRANSACTIONS}")
}

/// `/plans`
#[must_use]
pub fn plans() -> String {
    format!("/{PLANS}")
}

/// `/plans/{plan_code}`
pub fn plan(plan_code: &str) -> Result<String> {
    path(&[PLANS, plan_code])
}

/// `/plans/{plan_code}/add_ons`
pub fn add_ons(plan_code: &str) -> Result<String> {
    path(&[PLANS, plan_code, ADD_ONS])
}

/// `/plans/{plan_code}/add_ons/{add_on_code}`
pub fn add_on(plan_code: &str, add_on_code: &str) -> Result<String> {
    path(&[PLANS, plan_code, ADD_ONS, add_on_code])
}

/// `/coupons`
#[must_use]
pub fn coupons() -> String {
    format!("/{COUPONS}")
}

/// `/coupons/{coupon_code}`
pub fn coupon(coupon_code: &str) -> Result<String> {
    path(&[COUPONS, coupon_code])
}

/// `/coupons/{coupon_code}/redeem`
pub fn coupon_redeem(coupon_code: &str) -> Result<String> {
    path(&[COUPONS, coupon_code, "redeem"])
}

/// `/recurly_js/result/{token}`, the object a hosted form produced.
///
/// Subscriptions, billing info and invoices share this path.
pub fn hosted_result(token: &str) -> Result<String> {
    path(&["recurly_js", "result", token])
}
