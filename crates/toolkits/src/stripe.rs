//! Stripe customers, catalog, payment links, invoices and balance.
//!
//! Requires `STRIPE_SECRET_KEY`, either as a context secret or in the environment.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tool_core::{
    resolve_secret, InputParameter, Param, Tool, ToolArgs, ToolContext, ToolError,
    ToolOutputSchema, ToolRequirements, ToolSecretRequirement, Toolkit,
};
use tracing::{debug, info};

use crate::http::{build_client, join_url, json_body};

pub const TOOLKIT_NAME: &str = "Stripe";
pub const STRIPE_API_URL: &str = "https://api.stripe.com/v1";
pub const STRIPE_SECRET_KEY: &str = "STRIPE_SECRET_KEY";

const MAX_LIST_LIMIT: i64 = 100;

type Form = Vec<(&'static str, String)>;

pub struct StripeClient {
    http: reqwest::Client,
    base_url: String,
}

impl StripeClient {
    pub fn new() -> Self {
        Self::with_base_url(STRIPE_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: build_client(),
            base_url: base_url.into(),
        }
    }

    /// GET sends `params` as a query string, POST as a form body.
    async fn request(
        &self,
        context: &ToolContext,
        method: Method,
        path: &str,
        params: &Form,
    ) -> Result<Value, ToolError> {
        let secret_key = resolve_secret(context, STRIPE_SECRET_KEY)?;
        let url = join_url(&self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(secret_key);
        request = if method == Method::GET {
            request.query(params)
        } else {
            request.form(params)
        };

        let response = request.send().await?;
        let status = response.status();
        let body = json_body(response).await?;
        if status.is_success() {
            return Ok(body);
        }

        let message = body["error"]["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("status {}", status));
        Err(ToolError::execution(format!("Stripe API error: {}", message))
            .with_developer_message(body.to_string()))
    }

    async fn get(
        &self,
        context: &ToolContext,
        path: &str,
        params: &Form,
    ) -> Result<Value, ToolError> {
        self.request(context, Method::GET, path, params).await
    }

    async fn post(
        &self,
        context: &ToolContext,
        path: &str,
        params: &Form,
    ) -> Result<Value, ToolError> {
        self.request(context, Method::POST, path, params).await
    }
}

impl Default for StripeClient {
    fn default() -> Self {
        Self::new()
    }
}

fn stripe_requirements() -> ToolRequirements {
    ToolRequirements {
        authorization: None,
        secrets: vec![ToolSecretRequirement {
            key: STRIPE_SECRET_KEY.to_string(),
        }],
    }
}

fn limit_param() -> InputParameter {
    Param::of::<Option<i64>>(
        "limit",
        "A limit on the number of objects to be returned. Limit can range between 1 and 100, \
         and the default is 10.",
    )
}

/// Push `limit` when given, checking Stripe's 1..=100 range.
fn push_limit(args: &ToolArgs, form: &mut Form) -> Result<(), ToolError> {
    if let Some(limit) = args.get_opt::<i64>("limit")? {
        if !(1..=MAX_LIST_LIMIT).contains(&limit) {
            return Err(ToolError::invalid_parameter("limit", "must be between 1 and 100"));
        }
        form.push(("limit", limit.to_string()));
    }
    Ok(())
}

fn push_opt(args: &ToolArgs, key: &'static str, form: &mut Form) {
    if let Some(value) = args.get_string_opt(key) {
        form.push((key, value));
    }
}

fn list_data(list: &Value, summary: fn(&Value) -> Value) -> Value {
    list["data"]
        .as_array()
        .map(|items| items.iter().map(summary).collect())
        .unwrap_or_else(Vec::new)
        .into()
}

fn id_only(object: &Value) -> Value {
    json!({"id": object.get("id")})
}

fn customer_summary(customer: &Value) -> Value {
    json!({
        "id": customer.get("id"),
        "name": customer.get("name"),
        "email": customer.get("email"),
    })
}

fn product_summary(product: &Value) -> Value {
    json!({
        "id": product.get("id"),
        "name": product.get("name"),
        "description": product.get("description"),
    })
}

fn price_summary(price: &Value) -> Value {
    json!({
        "id": price.get("id"),
        "product": price.get("product"),
        "unit_amount": price.get("unit_amount"),
        "currency": price.get("currency"),
    })
}

fn invoice_summary(invoice: &Value) -> Value {
    json!({
        "id": invoice.get("id"),
        "hosted_invoice_url": invoice.get("hosted_invoice_url"),
        "customer": invoice.get("customer"),
        "status": invoice.get("status"),
    })
}

pub struct CreateCustomer {
    client: Arc<StripeClient>,
}

#[async_trait]
impl Tool for CreateCustomer {
    fn name(&self) -> &str {
        "CreateCustomer"
    }

    fn description(&self) -> &str {
        "Create a customer in Stripe."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("name", "The name of the customer."),
            Param::of::<Option<String>>("email", "The email of the customer."),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The created customer")
    }

    fn requirements(&self) -> ToolRequirements {
        stripe_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let mut form: Form = vec![("name", args.get_string("name")?)];
        push_opt(&args, "email", &mut form);
        let customer = self.client.post(context, "customers", &form).await?;
        info!("Created Stripe customer");
        Ok(id_only(&customer))
    }
}

pub struct ListCustomers {
    client: Arc<StripeClient>,
}

#[async_trait]
impl Tool for ListCustomers {
    fn name(&self) -> &str {
        "ListCustomers"
    }

    fn description(&self) -> &str {
        "Fetch a list of customers from Stripe."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            limit_param(),
            Param::of::<Option<String>>(
                "email",
                "A case-sensitive filter on the list based on the customer's email field.",
            ),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("A list of customers")
    }

    fn requirements(&self) -> ToolRequirements {
        stripe_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let mut form = Form::new();
        push_limit(&args, &mut form)?;
        push_opt(&args, "email", &mut form);
        let list = self.client.get(context, "customers", &form).await?;
        Ok(json!({"customers": list_data(&list, customer_summary)}))
    }
}

pub struct CreateProduct {
    client: Arc<StripeClient>,
}

#[async_trait]
impl Tool for CreateProduct {
    fn name(&self) -> &str {
        "CreateProduct"
    }

    fn description(&self) -> &str {
        "Create a product in Stripe."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("name", "The name of the product."),
            Param::of::<Option<String>>("description", "The description of the product."),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The created product")
    }

    fn requirements(&self) -> ToolRequirements {
        stripe_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let mut form: Form = vec![("name", args.get_string("name")?)];
        push_opt(&args, "description", &mut form);
        let product = self.client.post(context, "products", &form).await?;
        Ok(id_only(&product))
    }
}

pub struct ListProducts {
    client: Arc<StripeClient>,
}

#[async_trait]
impl Tool for ListProducts {
    fn name(&self) -> &str {
        "ListProducts"
    }

    fn description(&self) -> &str {
        "Fetch a list of products from Stripe."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            limit_param(),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("A list of products")
    }

    fn requirements(&self) -> ToolRequirements {
        stripe_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let mut form = Form::new();
        push_limit(&args, &mut form)?;
        let list = self.client.get(context, "products", &form).await?;
        Ok(json!({"products": list_data(&list, product_summary)}))
    }
}

pub struct CreatePrice {
    client: Arc<StripeClient>,
}

#[async_trait]
impl Tool for CreatePrice {
    fn name(&self) -> &str {
        "CreatePrice"
    }

    fn description(&self) -> &str {
        "Create a price in Stripe. If a product has not already been specified, a product should be created first."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("product", "The ID of the product to create the price for."),
            Param::of::<i64>("unit_amount", "The unit amount of the price in cents."),
            Param::of::<String>("currency", "The currency of the price."),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The created price")
    }

    fn requirements(&self) -> ToolRequirements {
        stripe_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let unit_amount = args.get_i64("unit_amount")?;
        if unit_amount < 0 {
            return Err(ToolError::invalid_parameter(
                "unit_amount",
                "must not be negative",
            ));
        }
        let form: Form = vec![
            ("product", args.get_string("product")?),
            ("unit_amount", unit_amount.to_string()),
            ("currency", args.get_string("currency")?.to_lowercase()),
        ];
        let price = self.client.post(context, "prices", &form).await?;
        Ok(id_only(&price))
    }
}

pub struct ListPrices {
    client: Arc<StripeClient>,
}

#[async_trait]
impl Tool for ListPrices {
    fn name(&self) -> &str {
        "ListPrices"
    }

    fn description(&self) -> &str {
        "Fetch a list of prices from Stripe."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<Option<String>>("product", "The ID of the product to list prices for."),
            limit_param(),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("A list of prices")
    }

    fn requirements(&self) -> ToolRequirements {
        stripe_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let mut form = Form::new();
        push_opt(&args, "product", &mut form);
        push_limit(&args, &mut form)?;
        let list = self.client.get(context, "prices", &form).await?;
        Ok(json!({"prices": list_data(&list, price_summary)}))
    }
}

pub struct CreatePaymentLink {
    client: Arc<StripeClient>,
}

#[async_trait]
impl Tool for CreatePaymentLink {
    fn name(&self) -> &str {
        "CreatePaymentLink"
    }

    fn description(&self) -> &str {
        "Create a payment link in Stripe."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("price", "The ID of the price to create the payment link for."),
            Param::of::<i64>("quantity", "The quantity of the product to include."),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The created payment link")
    }

    fn requirements(&self) -> ToolRequirements {
        stripe_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let quantity = args.get_i64("quantity")?;
        if quantity < 1 {
            return Err(ToolError::invalid_parameter("quantity", "must be at least 1"));
        }
        let form: Form = vec![
            ("line_items[0][price]", args.get_string("price")?),
            ("line_items[0][quantity]", quantity.to_string()),
        ];
        let link = self.client.post(context, "payment_links", &form).await?;
        Ok(json!({"id": link.get("id"), "url": link.get("url")}))
    }
}

pub struct CreateInvoice {
    client: Arc<StripeClient>,
}

#[async_trait]
impl Tool for CreateInvoice {
    fn name(&self) -> &str {
        "CreateInvoice"
    }

    fn description(&self) -> &str {
        "Create an invoice in Stripe."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("customer", "The ID of the customer to create the invoice for."),
            Param::of::<Option<i64>>(
                "days_until_due",
                "The number of days until the invoice is due.",
            ),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The created invoice")
    }

    fn requirements(&self) -> ToolRequirements {
        stripe_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let mut form: Form = vec![("customer", args.get_string("customer")?)];
        if let Some(days) = args.get_opt::<i64>("days_until_due")? {
            form.push(("collection_method", "send_invoice".to_string()));
            form.push(("days_until_due", days.to_string()));
        }
        let invoice = self.client.post(context, "invoices", &form).await?;
        Ok(invoice_summary(&invoice))
    }
}

pub struct CreateInvoiceItem {
    client: Arc<StripeClient>,
}

#[async_trait]
impl Tool for CreateInvoiceItem {
    fn name(&self) -> &str {
        "CreateInvoiceItem"
    }

    fn description(&self) -> &str {
        "Create an invoice item in Stripe."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>(
                "customer",
                "The ID of the customer to create the invoice item for.",
            ),
            Param::of::<String>("price", "The ID of the price for the item."),
            Param::of::<String>("invoice", "The ID of the invoice to create the item for."),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The created invoice item")
    }

    fn requirements(&self) -> ToolRequirements {
        stripe_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let form: Form = vec![
            ("customer", args.get_string("customer")?),
            ("price", args.get_string("price")?),
            ("invoice", args.get_string("invoice")?),
        ];
        let item = self.client.post(context, "invoiceitems", &form).await?;
        Ok(json!({"id": item.get("id"), "invoice": item.get("invoice")}))
    }
}

pub struct FinalizeInvoice {
    client: Arc<StripeClient>,
}

#[async_trait]
impl Tool for FinalizeInvoice {
    fn name(&self) -> &str {
        "FinalizeInvoice"
    }

    fn description(&self) -> &str {
        "Finalize an invoice in Stripe."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("invoice", "The ID of the invoice to finalize."),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The finalized invoice")
    }

    fn requirements(&self) -> ToolRequirements {
        stripe_requirements()
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let invoice_id = args.get_string("invoice")?;
        let path = format!("invoices/{}/finalize", urlencoding::encode(&invoice_id));
        let invoice = self.client.post(context, &path, &Form::new()).await?;
        Ok(invoice_summary(&invoice))
    }
}

pub struct RetrieveBalance {
    client: Arc<StripeClient>,
}

#[async_trait]
impl Tool for RetrieveBalance {
    fn name(&self) -> &str {
        "RetrieveBalance"
    }

    fn description(&self) -> &str {
        "Retrieve the balance from Stripe. It takes no input."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        Vec::new()
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The account balance")
    }

    fn requirements(&self) -> ToolRequirements {
        stripe_requirements()
    }

    async fn execute(&self, context: &ToolContext, _args: ToolArgs) -> Result<Value, ToolError> {
        let balance = self.client.get(context, "balance", &Form::new()).await?;
        Ok(json!({
            "available": balance.get("available"),
            "pending": balance.get("pending"),
        }))
    }
}

pub fn toolkit() -> Toolkit {
    toolkit_with_client(StripeClient::new())
}

pub fn toolkit_with_client(client: StripeClient) -> Toolkit {
    let client = Arc::new(client);
    macro_rules! with_client {
        ($toolkit:expr, $($tool:ident),+ $(,)?) => {
            $toolkit$(.tool($tool { client: Arc::clone(&client) }))+
        };
    }
    with_client!(
        Toolkit::new(TOOLKIT_NAME, env!("CARGO_PKG_VERSION"))
            .description("Stripe customers, products, prices, payment links and invoices."),
        CreateCustomer,
        ListCustomers,
        CreateProduct,
        ListProducts,
        CreatePrice,
        ListPrices,
        CreatePaymentLink,
        CreateInvoice,
        CreateInvoiceItem,
        FinalizeInvoice,
        RetrieveBalance
    )
}
