//! Redirect target resolution.

use wisp_core::Error;
use wisp_core::config::DEFAULT_USER_AGENT;

use crate::locator::{Locator, NetworkTarget, Target};

/// Whether a status code is a redirect the fetcher may follow.
pub fn is_redirect(code: u16) -> bool {
    matches!(code, 301 | 302 | 303 | 307 | 308)
}

/// Resolve a `location` header value against the target that produced it.
///
/// Absolute `http(s)://` and scheme-relative `//host/...` locations are
/// reparsed; headers set on the current target carry over, except `Host`,
/// which follows the new authority. Other values replace the path, with
/// relative paths joined onto the current path's directory.
pub fn resolve(current: &NetworkTarget, location: &str) -> Result<NetworkTarget, Error> {
    let location = location.trim();
    if location.is_empty() {
        return Err(Error::ProtocolFraming("redirect with empty location".into()));
    }

    if location.starts_with("//") {
        return resolve(current, &format!("{}:{location}", current.scheme));
    }

    if location.contains("://") {
        let user_agent = current.headers.get("User-Agent").unwrap_or(DEFAULT_USER_AGENT);
        let Target::Network(mut next) = Locator::parse_with_user_agent(location, user_agent)?.into_target() else {
            return Err(Error::MalformedLocator(format!("redirect to non-network location: {location}")));
        };
        for (name, value) in current.headers.iter() {
            if !name.eq_ignore_ascii_case("host") {
                next.headers.set(name, value);
            }
        }
        return Ok(next);
    }

    let path = if location.starts_with('/') {
        location.to_string()
    } else {
        let dir = match current.path.rfind('/') {
            Some(idx) => &current.path[..=idx],
            None => "/",
        };
        format!("{dir}{location}")
    };

    Ok(NetworkTarget { path, ..current.clone() })
}
