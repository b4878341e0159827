//! Client-side admin session reconciliation.
//!
//! [`AuthMachine`] keeps the last known state and decides which status
//! responses to trust; [`SessionMonitor`] runs checks through an
//! [`AuthTransport`]; [`RedirectToLogin`] listens for lost sessions.
//!
//! ```rust,ignore
//! let mut machine = AuthMachine::new(FileFallbackStore::in_dir(cache_dir));
//! machine.subscribe(RedirectToLogin::new(router_handle));
//!
//! let monitor = SessionMonitor::new(AdminClient::new(base_url)?, machine);
//! monitor.mount().await;
//! // on window focus
//! monitor.focus().await;
//! ```

mod fallback;
mod http;
mod machine;
mod monitor;
mod redirect;
mod traits;

pub use fallback::{FALLBACK_FILE, FileFallbackStore, MemoryFallbackStore};
pub use http::AdminClient;
pub use machine::{
    AuthEvent, AuthListener, AuthMachine, AuthSnapshot, Cause, CheckOutcome, CheckTicket,
    SessionState, Trigger,
};
pub use monitor::SessionMonitor;
pub use redirect::RedirectToLogin;
pub use traits::{AuthTransport, FallbackStore, Navigator};
