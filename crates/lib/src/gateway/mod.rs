//! Gateway: HTTP callback endpoints, one per tenant.
//!
//! Each tenant is bound to its own `POST /{name}/callback` route at startup;
//! the route state owns that tenant's reply and answer clients for the
//! process lifetime.

mod server;

pub use server::{build_app, run_gateway, TenantState};
