use http::Uri;
use http::uri::{Authority, Scheme};

use crate::error::ForwardError;

/// Parsed `upstream.url`: where every request gets re-targeted.
#[derive(Clone, Debug)]
pub(crate) struct UpstreamBase {
    scheme: Scheme,
    authority: Authority,
    /// Path prefix without trailing slash, "" when the base has none.
    prefix: String,
}

impl UpstreamBase {
    pub(crate) fn parse(raw: &str) -> Result<Self, ForwardError> {
        let invalid = |reason: &str| ForwardError::InvalidTarget {
            target: raw.to_string(),
            reason: reason.to_string(),
        };

        let uri: Uri = raw.trim().parse().map_err(|_| invalid("not a valid URL"))?;
        let scheme = uri.scheme().cloned().ok_or_else(|| invalid("missing scheme"))?;
        if scheme != Scheme::HTTP {
            return Err(invalid("only http:// upstreams are supported"));
        }
        let authority = uri.authority().cloned().ok_or_else(|| invalid("missing host"))?;
        let prefix = uri.path().trim_end_matches('/').to_string();

        Ok(Self {
            scheme,
            authority,
            prefix,
        })
    }

    pub(crate) fn authority(&self) -> &Authority {
        &self.authority
    }

    /// `base + path + query`: `http://origin/api` + `/get?a=1`
    /// gives `http://origin/api/get?a=1`.
    pub(crate) fn join(&self, path_and_query: &str) -> Result<Uri, ForwardError> {
        let tail = if path_and_query.starts_with('/') {
            path_and_query.to_string()
        } else {
            format!("/{path_and_query}")
        };

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(format!("{}{}", self.prefix, tail))
            .build()
            .map_err(|e| ForwardError::InvalidTarget {
                target: path_and_query.to_string(),
                reason: e.to_string(),
            })
    }
}
