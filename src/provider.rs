//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` holds the read-only endpoint configuration ([`ProviderDescriptor`]): protocol
//! revision, endpoints, scope, and quirks such as the scope delimiter. `strategy` defines
//! [`ProviderStrategy`], the injectable hook for providers that attach tokens differently,
//! add token-request fields, or report cancellations with their own markers.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
