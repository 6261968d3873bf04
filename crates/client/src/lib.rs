//! Client code for wisp.
//!
//! This crate provides locator parsing, the fetch pipeline (file, inline data,
//! HTTP/1.1 over TCP and TLS), and the text renderer.

pub mod browser;
pub mod fetch;
pub mod locator;
pub mod render;

pub use browser::load;
pub use fetch::{FILE_NOT_FOUND_BODY, FetchConfig, FetchResponse, Fetcher, ResponseHeaders};
pub use locator::{Locator, Scheme, Target};
pub use render::{RenderMode, render, render_to_string, transform};
