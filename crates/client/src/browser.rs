//! Fetch-then-render entry point.

use std::io::Write;

use wisp_core::Error;

use crate::fetch::Fetcher;
use crate::locator::Locator;
use crate::render::{RenderMode, render, transform};

/// Fetch `locator` and render its body to `out`.
///
/// `view-source:` locators are escaped with [`transform`] and rendered in
/// [`RenderMode::ViewSource`]; everything else renders in normal mode.
pub fn load<W: Write + ?Sized>(fetcher: &Fetcher, locator: &Locator, out: &mut W) -> Result<(), Error> {
    let (_, body) = fetcher.request(locator)?.into_parts();

    if locator.view_source() {
        render(&transform(&body), RenderMode::ViewSource, out)?;
    } else {
        render(&body, RenderMode::Normal, out)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fetch::{FILE_NOT_FOUND_BODY, FetchConfig, TcpConnector};

    fn load_to_string(raw: &str) -> String {
        let fetcher = Fetcher::with_connector(FetchConfig::default(), TcpConnector::new().unwrap());
        let mut out = Vec::new();
        load(&fetcher, &Locator::parse(raw).unwrap(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_load_data_normal() {
        assert_eq!(load_to_string("data:text/html,%3Cbody%3E%3Cp%3EHi%3C%2Fp%3E%3C%2Fbody%3E"), "Hi");
    }

    #[test]
    fn test_load_data_view_source() {
        assert_eq!(
            load_to_string("view-source:data:text/html,<body><p>&lt;b&gt;</p></body>"),
            "<body><p>&lt;b&gt;</p></body>"
        );
    }

    #[test]
    fn test_load_missing_file_renders_nothing() {
        assert_eq!(load_to_string("file:///definitely/not/here.html"), "");
        assert_eq!(load_to_string("view-source:file:///definitely/not/here.html"), FILE_NOT_FOUND_BODY);
    }
}
