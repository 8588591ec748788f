//! Web search toolkit.
//!
//! - Exa search and similar-page lookup (`EXA_API_KEY`).
//! - Google Maps directions, Google Jobs, YouTube and Walmart through SerpAPI
//!   (`SERP_API_KEY`).

mod exa;
mod serp;

use std::sync::Arc;

use tool_core::Toolkit;

pub use exa::{check_page_url, ExaClient, ExaFindSimilar, ExaSearch, EXA_API_KEY, EXA_API_URL};
pub use serp::{
    check_country, check_language, enrich_directions, GetDirectionsByAddress,
    GetDirectionsByCoordinates, SearchJobs, SearchWalmartProducts, SearchYoutubeVideos,
    SerpClient, SERP_API_KEY, SERP_API_URL,
};

pub const TOOLKIT_NAME: &str = "Search";

pub fn toolkit() -> Toolkit {
    toolkit_with_clients(ExaClient::new(), SerpClient::new())
}

/// Exa pointed at `exa`, SerpAPI at its production host.
pub fn toolkit_with_client(exa: ExaClient) -> Toolkit {
    toolkit_with_clients(exa, SerpClient::new())
}

pub fn toolkit_with_clients(exa: ExaClient, serp: SerpClient) -> Toolkit {
    let exa = Arc::new(exa);
    let toolkit = Toolkit::new(TOOLKIT_NAME, env!("CARGO_PKG_VERSION"))
        .description("Web, maps, jobs, video and shopping search.")
        .tool(ExaSearch::new(Arc::clone(&exa), false))
        .tool(ExaSearch::new(Arc::clone(&exa), true))
        .tool(ExaFindSimilar::new(Arc::clone(&exa), false))
        .tool(ExaFindSimilar::new(exa, true));
    serp::register(toolkit, serp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolkit_names() {
        let toolkit = toolkit();
        assert_eq!(
            toolkit.tool_names(),
            vec![
                "SearchExa",
                "SearchAndContentsExa",
                "FindSimilarExa",
                "FindSimilarAndContentsExa",
                "GetDirectionsByAddress",
                "GetDirectionsByCoordinates",
                "SearchJobs",
                "SearchYoutubeVideos",
                "SearchWalmartProducts",
            ]
        );
        for tool in &toolkit.tools {
            assert!(tool.requirements().authorization.is_none());
            assert_eq!(tool.requirements().secrets.len(), 1);
        }
    }
}
