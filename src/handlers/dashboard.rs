//! Owner dashboard: capsules grouped by derived status, details and deletion.

use serde_json::Value;
use std::cell::RefCell;

use crate::constants::{MSG_CAPSULES_LOAD_FAILED, MSG_CAPSULE_DELETE_FAILED};
use crate::context::AppContext;
use crate::errors::AppResult;
use crate::handlers::PageState;
use crate::log_data;
use crate::models::{id_segment, Capsule, CapsuleStatus, User};

/// What a capsule card shows.
#[derive(Clone, Debug, PartialEq)]
pub struct CapsuleCard {
    pub id: Value,
    pub title: String,
    pub status: CapsuleStatus,
    pub status_label: String,
    pub action_label: &'static str,
    pub delivery: String,
    pub privacy: String,
    pub detail_path: String,
}

impl From<&Capsule> for CapsuleCard {
    fn from(capsule: &Capsule) -> Self {
        let status = capsule.status();
        Self {
            id: capsule.id.clone(),
            title: capsule.title.clone(),
            status,
            status_label: status.label(),
            action_label: status.primary_action().label(),
            delivery: capsule.delivery_display(),
            privacy: capsule.privacy_display(),
            detail_path: capsule.detail_path(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CapsuleSection {
    pub title: &'static str,
    pub status: CapsuleStatus,
    pub cards: Vec<CapsuleCard>,
}

/// Sections in display order. Drafts have no section of their own.
pub const SECTIONS: [(CapsuleStatus, &str); 3] = [
    (CapsuleStatus::Sealed, "Sealed & Upcoming Capsules"),
    (CapsuleStatus::Delivered, "Delivered (Not Yet Opened)"),
    (CapsuleStatus::Opened, "Opened Capsules"),
];

pub struct DashboardPage {
    ctx: AppContext,
    page: PageState,
    user: Option<User>,
    capsules: RefCell<Vec<Capsule>>,
}

impl DashboardPage {
    /// `user` is the identity the session gate resolved.
    pub fn new(ctx: AppContext, user: Option<User>) -> Self {
        Self {
            ctx,
            page: PageState::new("dashboard"),
            user,
            capsules: RefCell::new(Vec::new()),
        }
    }

    pub fn state(&self) -> &PageState {
        &self.page
    }

    pub fn greeting(&self) -> String {
        let who = self.user.as_ref().map_or("User", |user| user.email.as_str());
        format!("Welcome to your personal Time Capsule dashboard, {}!", who)
    }

    pub async fn load(&self) -> AppResult<()> {
        self.page.begin();
        let result = self.ctx.api.list_capsules().await;
        if !self.page.is_alive() {
            return result.map(|_| ());
        }
        self.page.finish();

        match result {
            Ok(capsules) => {
                self.capsules.replace(capsules);
                Ok(())
            }
            Err(e) => {
                self.page
                    .fail(&self.ctx, "Loading capsules failed", &e, MSG_CAPSULES_LOAD_FAILED);
                Err(e)
            }
        }
    }

    pub fn capsules(&self) -> Vec<Capsule> {
        self.capsules.borrow().clone()
    }

    pub fn cards(&self, status: CapsuleStatus) -> Vec<CapsuleCard> {
        self.capsules
            .borrow()
            .iter()
            .filter(|capsule| capsule.status() == status)
            .map(CapsuleCard::from)
            .collect()
    }

    pub fn sections(&self) -> Vec<CapsuleSection> {
        SECTIONS
            .iter()
            .map(|(status, title)| CapsuleSection {
                title: *title,
                status: *status,
                cards: self.cards(*status),
            })
            .collect()
    }

    /// Deletes on the server, then drops the capsule from the local list.
    pub async fn delete(&self, id: &Value) -> AppResult<()> {
        let title = self
            .capsules
            .borrow()
            .iter()
            .find(|capsule| &capsule.id == id)
            .map(|capsule| capsule.title.clone())
            .unwrap_or_default();

        let result = self.ctx.api.delete_capsule(&id_segment(id)).await;
        if !self.page.is_alive() {
            return result;
        }

        match result {
            Ok(()) => {
                self.capsules.borrow_mut().retain(|capsule| &capsule.id != id);
                self.page.logger().info(
                    "Capsule deleted",
                    log_data!("id" => id_segment(id)),
                );
                self.ctx
                    .feedback
                    .success(format!("Capsule \"{}\" deleted successfully.", title));
                Ok(())
            }
            Err(e) => {
                self.page
                    .fail(&self.ctx, "Deleting capsule failed", &e, MSG_CAPSULE_DELETE_FAILED);
                Err(e)
            }
        }
    }

    pub fn unmount(&self) {
        self.page.unmount();
    }
}

/// Owner's view of a single capsule.
pub struct CapsuleDetailsPage {
    ctx: AppContext,
    page: PageState,
    capsule: RefCell<Option<Capsule>>,
}

impl CapsuleDetailsPage {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            page: PageState::new("capsule-details"),
            capsule: RefCell::new(None),
        }
    }

    pub fn state(&self) -> &PageState {
        &self.page
    }

    pub fn capsule(&self) -> Option<Capsule> {
        self.capsule.borrow().clone()
    }

    pub async fn load(&self, id: &str) -> AppResult<()> {
        self.page.begin();
        let result = self.ctx.api.get_capsule(id).await;
        if !self.page.is_alive() {
            return result.map(|_| ());
        }
        self.page.finish();

        match result {
            Ok(capsule) => {
                self.capsule.replace(Some(capsule));
                Ok(())
            }
            Err(e) => {
                self.page.fail(
                    &self.ctx,
                    "Loading capsule failed",
                    &e,
                    "Could not load capsule details.",
                );
                Err(e)
            }
        }
    }

    pub fn unmount(&self) {
        self.page.unmount();
    }
}
