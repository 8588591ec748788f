//! Vendor toolkits built on `tool-core`.
//!
//! Each module wraps one third-party API as a [`Toolkit`]: a client with an
//! overridable base URL, one struct per tool implementing [`tool_core::Tool`],
//! and `toolkit()` / `toolkit_with_client()` constructors.
//!
//! # Toolkits
//!
//! - [`math`] - Arithmetic and number theory. Decimal-string operations use
//!   `bigdecimal`.
//! - [`search`] - Exa web search and similar-page lookup (`EXA_API_KEY`), plus
//!   Google Maps directions, Google Jobs, YouTube and Walmart via SerpAPI
//!   (`SERP_API_KEY`).
//! - [`google`] - Gmail messages, drafts, threads and labels (OAuth2 `google`).
//! - [`dropbox`] - List, search, download and upload files (OAuth2 `dropbox`).
//! - [`hubspot`] - Deal priority and company search (OAuth2 `hubspot`).
//! - [`discord`] - Users, servers, channels and messages (OAuth2 `discord`).
//! - [`images`] - OpenAI image generation (`OPENAI_API_KEY`).
//! - [`zoom`] - Upcoming meetings, invitations, summaries (OAuth2 `zoom`).
//! - [`stripe`] - Customers, catalog, payment links and invoices (`STRIPE_SECRET_KEY`).
//! - [`spotify`] - Catalog search (OAuth2 `spotify`).
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use tool_core::{ToolCallRequest, ToolExecutor, ToolReference};
//!
//! let executor = ToolExecutor::new(toolkits::default_catalog()?);
//!
//! let inputs = json!({"a": "1.5", "b": "2"}).as_object().cloned().unwrap_or_default();
//! let request = ToolCallRequest::new(ToolReference::new("Math", "Add"), inputs);
//!
//! let response = executor.call(request).await?;
//! assert_eq!(response.output.value, Some(json!("3.5")));
//! ```

pub mod discord;
pub mod dropbox;
pub mod google;
pub mod hubspot;
pub mod images;
pub mod math;
pub mod search;
pub mod spotify;
pub mod stripe;
pub mod zoom;

mod http;

use tool_core::{ToolCatalog, ToolError, Toolkit};
use tracing::info;

/// Every bundled toolkit, pointed at the production APIs.
pub fn all_toolkits() -> Vec<Toolkit> {
    vec![
        math::toolkit(),
        search::toolkit(),
        google::toolkit(),
        dropbox::toolkit(),
        hubspot::toolkit(),
        discord::toolkit(),
        images::toolkit(),
        zoom::toolkit(),
        stripe::toolkit(),
        spotify::toolkit(),
    ]
}

/// Build a catalog from a set of toolkits.
pub fn catalog_from(toolkits: &[Toolkit]) -> Result<ToolCatalog, ToolError> {
    let mut catalog = ToolCatalog::new();
    for toolkit in toolkits {
        catalog.add_toolkit(toolkit)?;
    }
    info!(
        "Catalog ready: {} tools from {} toolkits",
        catalog.len(),
        toolkits.len()
    );
    Ok(catalog)
}

/// A catalog with every bundled toolkit registered.
pub fn default_catalog() -> Result<ToolCatalog, ToolError> {
    catalog_from(&all_toolkits())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_registers_everything() {
        let catalog = default_catalog().unwrap();
        let expected: usize = all_toolkits().iter().map(|t| t.tools.len()).sum();
        assert_eq!(catalog.len(), expected);
        assert!(catalog.has_tool("Math.Add"));
        assert!(catalog.has_tool("discord.sendmessage"));
        assert!(catalog.has_tool("Zoom.GetMeetingSummary"));
        assert!(catalog.has_tool("google.sendemail"));
        assert!(catalog.has_tool("Search.SearchWalmartProducts"));
        assert!(catalog.has_tool("Stripe.FinalizeInvoice"));
        assert!(catalog.has_tool("Spotify.Search"));
    }

    #[test]
    fn test_every_definition_is_valid() {
        let catalog = default_catalog().unwrap();
        for definition in catalog.definitions() {
            definition.validate().unwrap();
        }
    }
}
