//! Shared 401-refresh-retry policy for bearer-token providers.
//!
//! Google and Office365 calls run through [`send_with_refresh`]: issue the
//! request with the cached access token, and if the provider answers 401 (or
//! is unreachable) refresh the token once, persist it, and retry with the
//! new token. A second 401 after a successful refresh means the credentials
//! themselves are bad, and the operation fails with the auth wording.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use calbridge_core::SourceType;

use crate::access_info::AccessInfoStore;
use crate::error::{SyncError, SyncResult};
use crate::token::TokenRefresher;
use crate::transport::WireResponse;

/// Everything a retried call needs to obtain and persist a fresh token.
pub struct RefreshContext<'a> {
    pub refresher: &'a TokenRefresher,
    pub access_store: &'a Arc<AccessInfoStore>,
    pub src_type: SourceType,
    pub account: &'a str,
    pub refresh_token: &'a str,
}

fn needs_refresh(response: &Option<WireResponse>) -> bool {
    match response {
        None => true,
        Some(response) => response.status == 401,
    }
}

/// Issues a provider call and retries exactly once after a token refresh.
///
/// The refreshed token is written to the access-info store before the retry
/// so it survives even if the retried call fails.
pub async fn send_with_refresh<F, Fut>(
    ctx: RefreshContext<'_>,
    initial_token: &str,
    issue: F,
) -> SyncResult<WireResponse>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Option<WireResponse>> + Send,
{
    let first = issue(initial_token.to_string()).await;
    if !needs_refresh(&first) {
        // Unreachable-provider already filtered by needs_refresh; a Some
        // here always carries a non-401 status.
        return first.ok_or_else(|| SyncError::internal("response vanished after send"));
    }

    debug!(
        src_type = %ctx.src_type,
        account = ctx.account,
        "access token rejected, refreshing"
    );
    let fresh = ctx
        .refresher
        .refresh(ctx.refresh_token, ctx.src_type)
        .await?;
    ctx.access_store
        .update_access_token(ctx.src_type, ctx.account, &fresh)?;

    let second = issue(fresh).await;
    if needs_refresh(&second) {
        warn!(
            src_type = %ctx.src_type,
            account = ctx.account,
            "provider rejected freshly refreshed token"
        );
        return Err(SyncError::auth_failed().with_provider(ctx.src_type.as_str()));
    }
    second.ok_or_else(|| SyncError::internal("response vanished after retry"))
}
