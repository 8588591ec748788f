//! HubSpot CRM tools.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tool_core::{
    InputParameter, Param, Tool, ToolArgs, ToolAuthRequirement, ToolContext, ToolError,
    ToolOutputSchema, ToolRequirements, Toolkit,
};
use tracing::{debug, info};

use crate::http::{build_client, ensure_success, join_url, json_body};

pub const TOOLKIT_NAME: &str = "Hubspot";
pub const HUBSPOT_API_URL: &str = "https://api.hubapi.com";
pub const HUBSPOT_APP_URL: &str = "https://app.hubspot.com";

const PRIORITIES: [&str; 3] = ["high", "medium", "low"];
const COMPANY_PROPERTIES: [&str; 7] = [
    "name", "domain", "industry", "phone", "city", "state", "country",
];
const MAX_COMPANY_LIMIT: i64 = 100;

pub struct HubspotClient {
    http: reqwest::Client,
    base_url: String,
}

impl HubspotClient {
    pub fn new() -> Self {
        Self::with_base_url(HUBSPOT_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: build_client(),
            base_url: base_url.into(),
        }
    }

    async fn request(
        &self,
        context: &ToolContext,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ToolError> {
        let url = join_url(&self.base_url, path);
        debug!("{} {}", method, url);
        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(context.auth_token()?);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        json_body(ensure_success(response, "HubSpot").await?).await
    }

    pub async fn account_id(&self, context: &ToolContext) -> Result<String, ToolError> {
        let details = self
            .request(context, Method::GET, "account-info/v3/details", None)
            .await?;
        match &details["portalId"] {
            Value::Number(n) => Ok(n.to_string()),
            Value::String(s) => Ok(s.clone()),
            _ => Err(ToolError::execution("HubSpot account details have no portalId")),
        }
    }

    pub async fn contact_id_by_email(
        &self,
        context: &ToolContext,
        email: &str,
    ) -> Result<Option<String>, ToolError> {
        let payload = json!({
            "filterGroups": [
                {"filters": [{"propertyName": "email", "operator": "EQ", "value": email}]}
            ],
            "properties": ["email"],
        });
        let data = self
            .request(
                context,
                Method::POST,
                "crm/v3/objects/contacts/search",
                Some(&payload),
            )
            .await?;
        Ok(data["results"]
            .get(0)
            .and_then(|c| id_string(&c["id"])))
    }

    pub async fn associated_deal_ids(
        &self,
        context: &ToolContext,
        contact_id: &str,
    ) -> Result<Vec<String>, ToolError> {
        let path = format!("crm/v4/objects/contacts/{}/associations/deals", contact_id);
        let data = self.request(context, Method::GET, &path, None).await?;
        Ok(data["results"]
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .filter_map(|a| id_string(&a["toObjectId"]))
                    .collect()
            })
            .unwrap_or_default())
    }

    pub async fn update_deal_priority(
        &self,
        context: &ToolContext,
        deal_id: &str,
        priority: &str,
    ) -> Result<Value, ToolError> {
        let path = format!("crm/v3/objects/deals/{}", deal_id);
        let payload = json!({"properties": {"hs_priority": priority}});
        self.request(context, Method::PATCH, &path, Some(&payload))
            .await
    }

    pub async fn search_companies(
        &self,
        context: &ToolContext,
        query: &str,
        limit: i64,
    ) -> Result<Value, ToolError> {
        let payload = json!({
            "query": query,
            "limit": limit,
            "properties": COMPANY_PROPERTIES,
        });
        self.request(
            context,
            Method::POST,
            "crm/v3/objects/companies/search",
            Some(&payload),
        )
        .await
    }
}

impl Default for HubspotClient {
    fn default() -> Self {
        Self::new()
    }
}

// HubSpot returns ids as strings in v3 and as numbers in v4.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn deal_url(account_id: &str, deal_id: &str) -> String {
    format!(
        "{}/contacts/{}/record/0-3/{}",
        HUBSPOT_APP_URL, account_id, deal_id
    )
}

/// Finds the deals of a contact and sets the priority on the first one.
pub struct SetDealPriorityForContact {
    client: Arc<HubspotClient>,
}

#[async_trait]
impl Tool for SetDealPriorityForContact {
    fn name(&self) -> &str {
        "SetDealPriorityForContact"
    }

    fn description(&self) -> &str {
        "Find the deals associated with a contact by email and flag them with the given priority."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("email", "The email address of the contact"),
            Param::of::<String>("priority", "The priority to set on the deal").one_of(PRIORITIES),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<String>("The result of the operation")
    }

    fn requirements(&self) -> ToolRequirements {
        ToolRequirements {
            authorization: Some(ToolAuthRequirement::hubspot([
                "crm.objects.contacts.read",
                "crm.objects.deals.read",
                "crm.objects.deals.write",
            ])),
            secrets: Vec::new(),
        }
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let email = args.get_string("email")?;
        let priority = args.get_string("priority")?;

        let account_id = self.client.account_id(context).await?;

        let Some(contact_id) = self.client.contact_id_by_email(context, &email).await? else {
            return Ok(Value::String(format!("No contact found with email: {}", email)));
        };

        let deal_ids = self.client.associated_deal_ids(context, &contact_id).await?;
        let Some(deal_id) = deal_ids.first() else {
            return Ok(Value::String(format!(
                "No deals associated with contact ID: {}",
                contact_id
            )));
        };

        self.client
            .update_deal_priority(context, deal_id, &priority)
            .await?;
        info!("Set {} priority on deal {}", priority, deal_id);

        Ok(Value::String(format!(
            "Set {} priority on {}",
            priority,
            deal_url(&account_id, deal_id)
        )))
    }
}

pub struct SearchCompanies {
    client: Arc<HubspotClient>,
}

#[async_trait]
impl Tool for SearchCompanies {
    fn name(&self) -> &str {
        "SearchCompanies"
    }

    fn description(&self) -> &str {
        "Search HubSpot companies by name, domain or other text."
    }

    fn parameters(&self) -> Vec<InputParameter> {
        vec![
            Param::of::<String>("query", "The query to search for companies."),
            Param::of::<i64>("limit", "The maximum number of companies to return.").with_default(),
        ]
    }

    fn output(&self) -> ToolOutputSchema {
        ToolOutputSchema::returns::<Map<String, Value>>("The companies that match the query.")
    }

    fn requirements(&self) -> ToolRequirements {
        ToolRequirements {
            authorization: Some(ToolAuthRequirement::hubspot(["crm.objects.companies.read"])),
            secrets: Vec::new(),
        }
    }

    async fn execute(&self, context: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let query = args.get_string("query")?;
        let limit = args.get_i64_or("limit", 10)?;
        if !(1..=MAX_COMPANY_LIMIT).contains(&limit) {
            return Err(ToolError::invalid_parameter(
                "limit",
                format!("must be between 1 and {}", MAX_COMPANY_LIMIT),
            ));
        }

        let data = self.client.search_companies(context, &query, limit).await?;
        let companies: Vec<Value> = data["results"]
            .as_array()
            .map(|results| results.iter().map(clean_company).collect())
            .unwrap_or_default();

        Ok(json!({
            "companies": companies,
            "total": data.get("total").cloned().unwrap_or_else(|| json!(companies.len())),
        }))
    }
}

fn clean_company(company: &Value) -> Value {
    let mut cleaned = Map::new();
    cleaned.insert("id".to_string(), company["id"].clone());
    if let Some(properties) = company["properties"].as_object() {
        for key in COMPANY_PROPERTIES {
            if let Some(value) = properties.get(key).filter(|v| !v.is_null()) {
                cleaned.insert(key.to_string(), value.clone());
            }
        }
    }
    Value::Object(cleaned)
}

pub fn toolkit() -> Toolkit {
    toolkit_with_client(HubspotClient::new())
}

pub fn toolkit_with_client(client: HubspotClient) -> Toolkit {
    let client = Arc::new(client);
    Toolkit::new(TOOLKIT_NAME, env!("CARGO_PKG_VERSION"))
        .description("HubSpot CRM contacts, deals and companies.")
        .tool(SetDealPriorityForContact {
            client: Arc::clone(&client),
        })
        .tool(SearchCompanies { client })
}
