use std::collections::HashSet;

use http::{HeaderMap, header};

/// Hop-by-hop headers: meaningful for one connection only, never relayed.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Removes hop-by-hop headers plus any header named in a `Connection` token.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let tokens = connection_tokens(headers);
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    for token in tokens {
        headers.remove(token.as_str());
    }
}

fn connection_tokens(headers: &HeaderMap) -> HashSet<String> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|token| token.trim().trim_matches('"').to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}
