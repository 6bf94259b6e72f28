//! # Time Capsule Client
//!
//! Client core for a time-capsule service: people write messages and media
//! now and schedule them for delivery to a recipient at a future date. The
//! crate holds everything below the rendering layer. That covers session
//! handling, the typed API client, page controllers and the multi-step
//! authoring wizard.
//!
//! ## Architecture
//!
//! - **Session**: token and cached identity behind the [`SessionStore`](session::SessionStore) trait
//! - **Api**: typed wrappers over every backend endpoint, with token attachment
//! - **Gate**: decides whether a protected page may render, once per mount
//! - **Router**: closed route set and the [`Navigator`](router::Navigator) seam
//! - **Wizard**: five-step capsule authoring with a single-flight submit
//! - **Handlers**: one controller per page
//! - **Feedback**: the transient notice center
//! - **Scheduler**: cancellable deferred navigation and mount liveness
//!
//! ## Host Integration
//!
//! On `wasm32` the browser pieces are available: `FetchTransport`,
//! `LocalStorageSessionStore`, `HistoryNavigator`, `WorkerTimer` and
//! `LocalSpawner`. `browser_context` wires them into one [`AppContext`](context::AppContext).
//! Elsewhere the host supplies its own implementations of the same traits.
//!
//! ```text
//! host render loop
//!   └─ SessionGate / EntryGuard ── ApiClient ── HttpTransport
//!        └─ page controller ─── Feedback, Navigator, Scheduler
//! ```

use std::sync::{Arc, OnceLock};

pub mod logging;

pub mod api;
pub mod config;
pub mod constants;
pub mod context;
pub mod errors;
pub mod feedback;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod multipart;
pub mod router;
pub mod scheduler;
pub mod session;
pub mod transport;
pub mod utils;
pub mod validation;
pub mod wizard;

use config::Config;
use errors::AppResult;

static CONFIG_CACHE: OnceLock<Arc<Config>> = OnceLock::new();

/// Loads configuration once per module instance.
///
/// Later calls return the first successfully loaded value and ignore `source`.
pub fn load_config(source: Option<&str>) -> AppResult<Arc<Config>> {
    if let Some(config) = CONFIG_CACHE.get() {
        return Ok(config.clone());
    }

    let config = Arc::new(Config::load(source)?);
    let _ = CONFIG_CACHE.set(config.clone());
    Ok(config)
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        use std::rc::Rc;

        use context::AppContext;
        use router::HistoryNavigator;
        use scheduler::{LocalSpawner, Scheduler, WorkerTimer};
        use session::LocalStorageSessionStore;
        use transport::FetchTransport;

        #[worker::event(start)]
        fn start() {
            console_error_panic_hook::set_once();
        }

        /// Context over `fetch`, `localStorage`, `window.history` and `setTimeout`.
        pub fn browser_context(config_source: Option<&str>) -> AppResult<AppContext> {
            let config = load_config(config_source)?;
            let scheduler = Scheduler::new(Rc::new(WorkerTimer), Rc::new(LocalSpawner));
            Ok(AppContext::new(
                config,
                Rc::new(LocalStorageSessionStore::new()),
                Rc::new(FetchTransport),
                Rc::new(HistoryNavigator::new()),
                scheduler,
            ))
        }
    }
}
