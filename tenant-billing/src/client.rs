//! Typed client for the billing service.
//!
//! [`BillingClient`] exposes one method per service operation. Every method
//! takes the tenant's [`Credential`] as its last argument, so a single client
//! serves any number of tenants concurrently.
//!
//! Create and update methods accept a [`Payload`]: callers may send a typed
//! entity (`entity.to_payload()`) or hand-built fields the typed model does not
//! declare.

use crate::{
    config::ClientConfig,
    endpoint::{self, SubscriptionAction},
    error::{BillingError, Result},
    mapper::WireFormat,
    model::{
        Account, Accounts, AddOn, AddOns, BillingInfo, Coupon, CouponRedeem, Invoice, Invoices, Plan, Plans,
        Redemption, Subscription, Subscriptions, Transaction, Transactions,
    },
    payload::Payload,
    session::{Credential, DispatchResponse, SessionRegistry},
    transport::{HttpTransport, Method, Transport},
};

/// Multi-tenant billing client.
///
/// # Examples
///
/// ```rust,no_run
/// use tenant_billing::{client::BillingClient, config::ClientConfig, session::Credential};
///
/// # async fn example() -> tenant_billing::error::Result<()> {
/// let client = BillingClient::from_config(&ClientConfig::new("https://acme.billing.example.com/v2"))?;
///
/// let tenant_a = Credential::new("a1b2c3d4e5f6a7b8")?;
/// let tenant_b = Credential::new("f0e1d2c3b4a59687")?;
///
/// let (plans_a, plans_b) =
///     tokio::try_join!(client.get_plans(&tenant_a), client.get_plans(&tenant_b))?;
/// println!("{} / {} plans", plans_a.len(), plans_b.len());
///
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BillingClient<T = HttpTransport> {
    registry: SessionRegistry<T>,
}

impl BillingClient<HttpTransport> {
    /// Builds a client with an [`HttpTransport`] from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::Config`] if the configuration is invalid.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::with_config(&config.base_url, &config.http)?;
        Ok(Self::with_transport(transport, config.format))
    }
}

impl<T: Transport> BillingClient<T> {
    /// Builds a client around any transport.
    #[must_use]
    pub fn with_transport(transport: T, format: WireFormat) -> Self {
        Self { registry: SessionRegistry::open(transport, format) }
    }

    /// The underlying session registry.
    #[must_use]
    pub fn registry(&self) -> &SessionRegistry<T> {
        &self.registry
    }

    /// Closes the client. Later calls fail with [`BillingError::Closed`].
    pub fn close(&self) {
        self.registry.close();
    }

    /// `POST`s `payload` to an arbitrary path.
    ///
    /// When `R` is an entity its schema shapes the body. With `R = ()` there
    /// is no schema, so an XML payload must hold a single nested field that
    /// names the root element:
    ///
    /// ```rust,no_run
    /// # use tenant_billing::{BillingClient, Credential, payload::Payload, transport::HttpTransport};
    /// # async fn example(client: BillingClient<HttpTransport>, tenant: Credential) -> tenant_billing::Result<()> {
    /// let body = Payload::new().with("redemption", Payload::new().with("account_code", "acme"));
    /// client.create::<()>("/accounts/acme/redemption", &body, &tenant).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create<R: DispatchResponse>(&self, path: &str, payload: &Payload, credential: &Credential) -> Result<R> {
        self.registry.create(credential, path, payload).await
    }

    /// `PUT`s `payload` to an arbitrary path. The body follows the same rules
    /// as [`create`](Self::create).
    pub async fn update<R: DispatchResponse>(&self, path: &str, payload: &Payload, credential: &Credential) -> Result<R> {
        self.registry.update(credential, path, payload).await
    }

    // Accounts

    /// Creates an account.
    pub async fn create_account(&self, account: &Payload, credential: &Credential) -> Result<Account> {
        self.registry.create(credential, &endpoint::accounts(), account).await
    }

    /// Lists accounts.
    pub async fn get_accounts(&self, credential: &Credential) -> Result<Accounts> {
        self.registry.list(credential, &endpoint::accounts()).await
    }

    /// Reads one account.
    pub async fn get_account(&self, account_code: &str, credential: &Credential) -> Result<Account> {
        self.registry.fetch(credential, &endpoint::account(account_code)?).await
    }

    /// Updates an account.
    pub async fn update_account(&self, account_code: &str, account: &Payload, credential: &Credential) -> Result<Account> {
        self.registry.update(credential, &endpoint::account(account_code)?, account).await
    }

    /// Closes an account. Its subscriptions are canceled by the service.
    pub async fn close_account(&self, account_code: &str, credential: &Credential) -> Result<()> {
        self.registry.delete(credential, &endpoint::account(account_code)?).await
    }

    // Subscriptions

    /// Creates a subscription.
    pub async fn create_subscription(&self, subscription: &Payload, credential: &Credential) -> Result<Subscription> {
        self.registry.create(credential, &endpoint::subscriptions(), subscription).await
    }

    /// Reads one subscription.
    pub async fn get_subscription(&self, uuid: &str, credential: &Credential) -> Result<Subscription> {
        self.registry.fetch(credential, &endpoint::subscription(uuid)?).await
    }

    /// Cancels a subscription at the end of its current period.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidInput`] if `subscription` has no uuid.
    pub async fn cancel_subscription(&self, subscription: &Subscription, credential: &Credential) -> Result<Subscription> {
        self.transition(subscription, SubscriptionAction::Cancel, credential).await
    }

    /// Reactivates a canceled subscription that has not yet expired.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidInput`] if `subscription` has no uuid.
    pub async fn reactivate_subscription(
        &self,
        subscription: &Subscription,
        credential: &Credential,
    ) -> Result<Subscription> {
        self.transition(subscription, SubscriptionAction::Reactivate, credential).await
    }

    async fn transition(
        &self,
        subscription: &Subscription,
        action: SubscriptionAction,
        credential: &Credential,
    ) -> Result<Subscription> {
        let uuid = subscription
            .uuid
            .as_deref()
            .ok_or_else(|| BillingError::InvalidInput("subscription has no uuid".to_owned()))?;
        let path = endpoint::subscription_action(uuid, action)?;
        self.registry.dispatch(credential, Method::Put, &path, None).await
    }

    /// Updates a subscription.
    pub async fn update_subscription(
        &self,
        uuid: &str,
        update: &Payload,
        credential: &Credential,
    ) -> Result<Subscription> {
        self.registry.update(credential, &endpoint::subscription(uuid)?, update).await
    }

    /// Lists an account's subscriptions, optionally only those in `state`.
    pub async fn get_account_subscriptions(
        &self,
        account_code: &str,
        state: Option<&str>,
        credential: &Credential,
    ) -> Result<Subscriptions> {
        self.registry.list(credential, &endpoint::account_subscriptions(account_code, state)?).await
    }

    // Billing info

    /// Creates or replaces an account's billing info.
    pub async fn create_or_update_billing_info(
        &self,
        billing_info: &Payload,
        account_code: &str,
        credential: &Credential,
    ) -> Result<BillingInfo> {
        self.registry.update(credential, &endpoint::billing_info(account_code)?, billing_info).await
    }

    /// Reads an account's billing info.
    pub async fn get_billing_info(&self, account_code: &str, credential: &Credential) -> Result<BillingInfo> {
        self.registry.fetch(credential, &endpoint::billing_info(account_code)?).await
    }

    /// Removes an account's billing info.
    pub async fn clear_billing_info(&self, account_code: &str, credential: &Credential) -> Result<()> {
        self.registry.delete(credential, &endpoint::billing_info(account_code)?).await
    }

    // Transactions

    /// Lists an account's transactions.
    pub async fn get_account_transactions(&self, account_code: &str, credential: &Credential) -> Result<Transactions> {
        self.registry.list(credential, &endpoint::account_transactions(account_code)?).await
    }

    /// Creates a one-time transaction.
    pub async fn create_transaction(&self, transaction: &Payload, credential: &Credential) -> Result<Transaction> {
        self.registry.create(credential, &endpoint::transactions(), transaction).await
    }

    // Invoices

    /// Lists an account's invoices, optionally only those in `state`.
    pub async fn get_account_invoices(
        &self,
        account_code: &str,
        state: Option<&str>,
        credential: &Credential,
    ) -> Result<Invoices> {
        self.registry.list(credential, &endpoint::account_invoices(account_code, state)?).await
    }

    /// Lists an account's collected invoices.
    pub async fn get_account_collected_invoices(&self, account_code: &str, credential: &Credential) -> Result<Invoices> {
        self.get_account_invoices(account_code, Some("collected"), credential).await
    }

    // Plans

    /// Creates a plan.
    pub async fn create_plan(&self, plan: &Payload, credential: &Credential) -> Result<Plan> {
        self.registry.create(credential, &endpoint::plans(), plan).await
    }

    /// Reads one plan.
    pub async fn get_plan(&self, plan_code: &str, credential: &Credential) -> Result<Plan> {
        self.registry.fetch(credential, &endpoint::plan(plan_code)?).await
    }

    /// Lists plans.
    pub async fn get_plans(&self, credential: &Credential) -> Result<Plans> {
        self.registry.list(credential, &endpoint::plans()).await
    }

    /// Deletes a plan.
    pub async fn delete_plan(&self, plan_code: &str, credential: &Credential) -> Result<()> {
        self.registry.delete(credential, &endpoint::plan(plan_code)?).await
    }

    // Add-ons

    /// Creates an add-on on a plan.
    pub async fn create_plan_add_on(&self, plan_code: &str, add_on: &Payload, credential: &Credential) -> Result<AddOn> {
        self.registry.create(credential, &endpoint::add_ons(plan_code)?, add_on).await
    }

    /// Reads one add-on of a plan.
    pub async fn get_add_on(&self, plan_code: &str, add_on_code: &str, credential: &Credential) -> Result<AddOn> {
        self.registry.fetch(credential, &endpoint::add_on(plan_code, add_on_code)?).await
    }

    /// Lists the add-ons of a plan.
    pub async fn get_add_ons(&self, plan_code: &str, credential: &Credential) -> Result<AddOns> {
        self.registry.list(credential, &endpoint::add_ons(plan_code)?).await
    }

    /// Deletes an add-on from a plan.
    pub async fn delete_add_on(&self, plan_code: &str, add_on_code: &str, credential: &Credential) -> Result<()> {
        self.registry.delete(credential, &endpoint::add_on(plan_code, add_on_code)?).await
    }

    // Coupons

    /// Creates a coupon.
    pub async fn create_coupon(&self, coupon: &Payload, credential: &Credential) -> Result<Coupon> {
        self.registry.create(credential, &endpoint::coupons(), coupon).await
    }

    /// Reads one coupon.
    pub async fn get_coupon(&self, coupon_code: &str, credential: &Credential) -> Result<Coupon> {
        self.registry.fetch(credential, &endpoint::coupon(coupon_code)?).await
    }

    /// Redeems a coupon on an account.
    pub async fn redeem_coupon(
        &self,
        coupon_code: &str,
        redeem: &Payload,
        credential: &Credential,
    ) -> Result<CouponRedeem> {
        self.registry.create(credential, &endpoint::coupon_redeem(coupon_code)?, redeem).await
    }

    /// Reads the coupon redemption active on an account.
    pub async fn get_account_redemption(&self, account_code: &str, credential: &Credential) -> Result<Redemption> {
        self.registry.fetch(credential, &endpoint::redemption(account_code)?).await
    }

    // Hosted-form results

    /// Reads the subscription a hosted form created.
    pub async fn fetch_subscription(&self, token: &str, credential: &Credential) -> Result<Subscription> {
        self.registry.fetch(credential, &endpoint::hosted_result(token)?).await
    }

    /// Reads the billing info a hosted form stored.
    pub async fn fetch_billing_info(&self, token: &str, credential: &Credential) -> Result<BillingInfo> {
        self.registry.fetch(credential, &endpoint::hosted_result(token)?).await
    }

    /// Reads the invoice a hosted form paid.
    pub async fn fetch_invoice(&self, token: &str, credential: &Credential) -> Result<Invoice> {
        self.registry.fetch(credential, &endpoint::hosted_result(token)?).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        mapper::Entity,
        transport::{Exchange, TransportResponse},
    };

    /// Records each exchange and answers with a canned body.
    #[derive(Debug, Default)]
    struct Recorder {
        body: &'static str,
        exchanges: Mutex<Vec<(Method, String, Option<String>)>>,
    }

    impl Transport for Recorder {
        async fn send<'a>(&'a self, exchange: Exchange<'a>) -> Result<TransportResponse> {
            let body = exchange.body.map(|bytes| String::from_utf8_lossy(bytes).into_owned());
            self.exchanges.lock().unwrap().push((exchange.method, exchange.path.to_owned(), body));
            Ok(TransportResponse { status: 200, body: self.body.as_bytes().to_vec(), headers: Vec::new() })
        }

        fn protocol_name(&self) -> &'static str {
            "recorder"
        }
    }

    fn client(body: &'static str) -> BillingClient<Recorder> {
        BillingClient::with_transport(Recorder { body, ..Recorder::default() }, WireFormat::Xml)
    }

    fn last_exchange(client: &BillingClient<Recorder>) -> (Method, String, Option<String>) {
        client.registry().transport().exchanges.lock().unwrap().last().cloned().unwrap()
    }

    fn tenant() -> Credential {
        Credential::new("tenant-a").unwrap()
    }

    #[tokio::test]
    async fn test_cancel_uses_uuid() {
        let client = client("<subscription><state>canceled</state></subscription>");
        let mut subscription = Subscription::default();
        subscription.uuid = Some("44f83d7c".to_owned());

        let canceled = client.cancel_subscription(&subscription, &tenant()).await.unwrap();
        assert_eq!(canceled.state.as_deref(), Some("canceled"));
        assert_eq!(last_exchange(&client), (Method::Put, "/subscriptions/44f83d7c/cancel".to_owned(), None));
    }

    #[tokio::test]
    async fn test_cancel_without_uuid() {
        let client = client("<subscription/>");
        let error = client.reactivate_subscription(&Subscription::default(), &tenant()).await.unwrap_err();
        assert!(matches!(error, BillingError::InvalidInput(_)));
        assert!(client.registry().transport().exchanges.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_account_sends_body() {
        let client = client("<account><account_code>acme</account_code></account>");
        let request = Account::with_code("acme").to_payload();

        let account = client.create_account(&request, &tenant()).await.unwrap();
        assert_eq!(account.account_code.as_deref(), Some("acme"));

        let (method, path, body) = last_exchange(&client);
        assert_eq!((method, path.as_str()), (Method::Post, "/accounts"));
        assert!(body.unwrap().contains("<account_code>acme</account_code>"));
    }

    #[tokio::test]
    async fn test_billing_info_is_put() {
        let client = client("<billing_info><first_name>Ada</first_name></billing_info>");
        let request = Payload::new().with("first_name", "Ada");
        client.create_or_update_billing_info(&request, "acme", &tenant()).await.unwrap();
        let (method, path, _) = last_exchange(&client);
        assert_eq!((method, path.as_str()), (Method::Put, "/accounts/acme/billing_info"));
    }

    #[tokio::test]
    async fn test_collected_invoices_filter() {
        let client = client("<invoices></invoices>");
        let invoices = client.get_account_collected_invoices("acme", &tenant()).await.unwrap();
        assert!(invoices.is_empty());
        let (method, path, _) = last_exchange(&client);
        assert_eq!((method, path.as_str()), (Method::Get, "/accounts/acme/invoices?state=collected"));
    }

    #[tokio::test]
    async fn test_delete_add_on_path() {
        let client = client("");
        client.delete_add_on("gold", "ip", &tenant()).await.unwrap();
        let (method, path, _) = last_exchange(&client);
        assert_eq!((method, path.as_str()), (Method::Delete, "/plans/gold/add_ons/ip"));
    }

    #[tokio::test]
    async fn test_invalid_code_rejected_before_dispatch() {
        let client = client("<coupon/>");
        assert!(client.get_coupon("", &tenant()).await.is_err());
        assert!(client.registry().transport().exchanges.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_client() {
        let client = client("<plans></plans>");
        client.close();
        assert!(matches!(client.get_plans(&tenant()).await, Err(BillingError::Closed)));
    }
}
