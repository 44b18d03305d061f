//! Exposures turning an `AdminHost` into a router

pub mod html;

pub use html::HtmlExposure;
