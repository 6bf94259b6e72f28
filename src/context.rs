//! # Application Context
//!
//! The collaborators every page controller receives explicitly: configuration,
//! API client (which owns the session store), navigator, notice center and
//! scheduler. Cloning is cheap; all members are reference counted.

use std::rc::Rc;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::Config;
use crate::feedback::Feedback;
use crate::router::Navigator;
use crate::scheduler::Scheduler;
use crate::session::SessionStore;
use crate::transport::HttpTransport;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub api: ApiClient,
    pub navigator: Rc<dyn Navigator>,
    pub feedback: Rc<Feedback>,
    pub scheduler: Scheduler,
}

impl AppContext {
    pub fn new(
        config: Arc<Config>,
        store: Rc<dyn SessionStore>,
        transport: Rc<dyn HttpTransport>,
        navigator: Rc<dyn Navigator>,
        scheduler: Scheduler,
    ) -> Self {
        let feedback = Rc::new(Feedback::new(config.notice_duration(), scheduler.clone()));
        Self {
            api: ApiClient::new(Arc::clone(&config), store, transport),
            config,
            navigator,
            feedback,
            scheduler,
        }
    }
}
