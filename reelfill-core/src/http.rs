use std::time::Duration;

use reelfill_config::{ApiCredential, AuthStyle};
use reqwest::{Client, RequestBuilder, redirect};

use crate::Result;

/// User agent for API calls.
pub const API_USER_AGENT: &str =
    concat!("reelfill/", env!("CARGO_PKG_VERSION"));

/// Review pages reject obvious bot agents, so page fetches present as a
/// desktop browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const MAX_REDIRECTS: usize = 10;

/// The two clients every run needs. Both share the same timeout; one of
/// them never follows redirects so the resolver can read `Location` itself.
#[derive(Debug, Clone)]
pub struct HttpClients {
    pub standard: Client,
    pub no_redirect: Client,
}

impl HttpClients {
    pub fn build(timeout: Duration) -> Result<Self> {
        let standard = Client::builder()
            .timeout(timeout)
            .user_agent(API_USER_AGENT)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        let no_redirect = Client::builder()
            .timeout(timeout)
            .user_agent(API_USER_AGENT)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self {
            standard,
            no_redirect,
        })
    }
}

/// Attaches `credential` to `request`: long credentials go in a bearer
/// header, short ones in the `query_param` query parameter.
pub fn authorize(
    request: RequestBuilder,
    credential: &ApiCredential,
    query_param: &str,
) -> RequestBuilder {
    match credential.auth_style() {
        AuthStyle::Bearer => request.bearer_auth(credential.expose()),
        AuthStyle::QueryKey => {
            request.query(&[(query_param, credential.expose())])
        }
    }
}
