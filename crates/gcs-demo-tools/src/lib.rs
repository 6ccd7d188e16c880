//! Example local tools demonstrating the deterministic error shortcut:
//! `website_check` and `dns_lookup`, both read-only network probes whose
//! structured failure output the orchestration turn loop recognises
//! without a further LLM round-trip.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod dns_lookup;
mod website_check;

pub use dns_lookup::DnsLookupTool;
pub use website_check::WebsiteCheckTool;
