//! Account profile: view, edit and password change.

use std::cell::{Cell, RefCell};

use crate::constants::*;
use crate::context::AppContext;
use crate::errors::{AppError, AppResult};
use crate::handlers::PageState;
use crate::models::{PasswordChange, Profile};
use crate::router::NavigateOptions;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

pub struct ProfilePage {
    ctx: AppContext,
    page: PageState,
    profile: RefCell<Option<Profile>>,
    editing: Cell<bool>,
    password_error: RefCell<Option<String>>,
    password_success: RefCell<Option<String>>,
    password_submitting: Cell<bool>,
}

impl ProfilePage {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            page: PageState::new("profile"),
            profile: RefCell::new(None),
            editing: Cell::new(false),
            password_error: RefCell::new(None),
            password_success: RefCell::new(None),
            password_submitting: Cell::new(false),
        }
    }

    pub fn state(&self) -> &PageState {
        &self.page
    }

    pub fn profile(&self) -> Option<Profile> {
        self.profile.borrow().clone()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.get()
    }

    pub fn start_editing(&self) {
        self.editing.set(true);
    }

    pub fn cancel_editing(&self) {
        self.editing.set(false);
        self.page.clear_error();
    }

    pub fn password_error(&self) -> Option<String> {
        self.password_error.borrow().clone()
    }

    pub fn password_success(&self) -> Option<String> {
        self.password_success.borrow().clone()
    }

    /// Loads the profile. An expired session is cleared and sent to `/login`.
    pub async fn load(&self) -> AppResult<()> {
        self.page.begin();
        let result = self.ctx.api.profile().await;
        if !self.page.is_alive() {
            return result.map(|_| ());
        }
        self.page.finish();

        match result {
            Ok(profile) => {
                self.profile.replace(Some(profile));
                Ok(())
            }
            Err(e) => {
                self.page.show_inline(MSG_PROFILE_LOAD_FAILED);
                if matches!(e, AppError::Api { status: 401, .. }) {
                    self.ctx.feedback.error(MSG_SESSION_EXPIRED);
                    self.ctx.api.store().clear();
                    self.ctx
                        .navigator
                        .navigate(ROUTE_LOGIN, NavigateOptions::default());
                }
                Err(e)
            }
        }
    }

    /// Saves profile fields. Password fields live in [`PasswordForm`] and are never sent here.
    pub async fn update(&self, profile: Profile) -> AppResult<()> {
        self.page.begin();
        self.password_error.replace(None);
        self.password_success.replace(None);
        let result = self.ctx.api.update_profile(&profile).await;
        if !self.page.is_alive() {
            return result.map(|_| ());
        }
        self.page.finish();

        match result {
            Ok(saved) => {
                self.profile.replace(Some(saved));
                self.ctx.feedback.success(MSG_PROFILE_UPDATED);
                self.editing.set(false);
                Ok(())
            }
            Err(e) => {
                self.page
                    .fail(&self.ctx, "Profile update failed", &e, MSG_PROFILE_UPDATE_FAILED);
                Err(e)
            }
        }
    }

    pub async fn change_password(&self, form: PasswordForm) -> AppResult<()> {
        self.password_error.replace(None);
        self.password_success.replace(None);
        self.page.clear_error();

        if let Err(e) = self.validate(&form) {
            self.report_password_error(e.user_message(MSG_PASSWORD_CHANGE_FAILED));
            return Err(e);
        }

        self.password_submitting.set(true);
        let change = PasswordChange {
            old_password: form.current_password,
            new_password: form.new_password,
            new_password2: form.confirm_new_password,
        };
        let result = self.ctx.api.change_password(&change).await;
        if !self.page.is_alive() {
            return result.map(|_| ());
        }
        self.password_submitting.set(false);

        match result {
            Ok(_) => {
                self.password_success
                    .replace(Some(MSG_PASSWORD_CHANGED.to_string()));
                self.ctx.feedback.success(MSG_PASSWORD_CHANGED);
                Ok(())
            }
            Err(e) => {
                self.report_password_error(e.user_message(MSG_PASSWORD_CHANGE_FAILED));
                Err(e)
            }
        }
    }

    pub fn is_changing_password(&self) -> bool {
        self.password_submitting.get()
    }

    fn validate(&self, form: &PasswordForm) -> AppResult<()> {
        if form.new_password != form.confirm_new_password {
            return Err(AppError::Validation(MSG_NEW_PASSWORDS_MISMATCH.to_string()));
        }
        let min = self.ctx.config.min_password_length;
        if form.new_password.chars().count() < min {
            return Err(AppError::Validation(format!(
                "New password must be at least {} characters long.",
                min
            )));
        }
        Ok(())
    }

    fn report_password_error(&self, message: String) {
        self.ctx.feedback.error(message.as_str());
        self.password_error.replace(Some(message));
    }

    pub fn unmount(&self) {
        self.page.unmount();
    }
}
