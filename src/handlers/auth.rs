//! Account pages: login, registration, email verification, password reset
//! and logout.

use serde_json::Value;
use std::cell::{Cell, RefCell};

use crate::constants::*;
use crate::context::AppContext;
use crate::errors::{AppError, AppResult};
use crate::handlers::PageState;
use crate::log_data;
use crate::models::{Acknowledgement, RegisterRequest};
use crate::router::NavigateOptions;
use crate::validation::FormValidation;

fn go(ctx: &AppContext, path: &str, options: NavigateOptions) {
    ctx.navigator.navigate(path, options);
}

pub struct LoginPage {
    ctx: AppContext,
    page: PageState,
}

impl LoginPage {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            page: PageState::new("login"),
        }
    }

    pub fn state(&self) -> &PageState {
        &self.page
    }

    /// Signs in and opens the dashboard.
    ///
    /// An unverified account (`needsVerification`) is sent to the OTP page
    /// after a short delay when the server echoes the email.
    pub async fn submit(&self, email: &str, password: &str) -> AppResult<()> {
        self.page.begin();
        let result = self.ctx.api.login(email, password).await;
        if !self.page.is_alive() {
            return result.map(|_| ());
        }
        self.page.finish();

        match result {
            Ok(_) => {
                self.ctx.feedback.success(MSG_LOGIN_SUCCESS);
                go(&self.ctx, ROUTE_DASHBOARD, NavigateOptions::default());
                Ok(())
            }
            Err(e) => {
                match e.body().filter(|body| needs_verification(body)) {
                    Some(body) => {
                        let message = body
                            .get("error")
                            .and_then(Value::as_str)
                            .unwrap_or(MSG_NEEDS_VERIFICATION)
                            .to_string();
                        if let Some(email) = body.get("email").and_then(Value::as_str) {
                            self.schedule_verification(email.to_string());
                        }
                        self.page.show_error(&self.ctx, message);
                    }
                    None => {
                        self.page.fail(&self.ctx, "Login failed", &e, MSG_LOGIN_FAILED);
                    }
                }
                Err(e)
            }
        }
    }

    fn schedule_verification(&self, email: String) {
        let navigator = self.ctx.navigator.clone();
        let redirect = self.ctx.scheduler.defer(
            self.ctx.config.verification_redirect_delay(),
            move || navigator.navigate(ROUTE_VERIFY_EMAIL, NavigateOptions::with_email(email)),
        );
        self.page.hold_redirect(redirect);
    }

    pub async fn google_login(&self, id_token: &str) -> AppResult<()> {
        google_sign_in(&self.ctx, &self.page, id_token).await
    }

    /// The Google widget reported a failure without a credential.
    pub fn google_failed(&self) {
        self.page.show_error(&self.ctx, MSG_GOOGLE_LOGIN_FAILED);
    }

    pub fn unmount(&self) {
        self.page.unmount();
    }
}

fn needs_verification(body: &Value) -> bool {
    body.get("needsVerification")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

async fn google_sign_in(ctx: &AppContext, page: &PageState, id_token: &str) -> AppResult<()> {
    page.begin();
    let result = ctx.api.google_login(id_token).await;
    if !page.is_alive() {
        return result.map(|_| ());
    }
    page.finish();

    match result {
        Ok(_) => {
            ctx.feedback.success(MSG_GOOGLE_LOGIN_SUCCESS);
            go(ctx, ROUTE_DASHBOARD, NavigateOptions::default());
            Ok(())
        }
        Err(e) => {
            page.fail(ctx, "Google login failed", &e, MSG_GOOGLE_LOGIN_FAILED);
            Err(e)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub email: String,
    pub name: String,
    pub password: String,
    pub password2: String,
    pub dob: Option<String>,
}

pub struct RegisterPage {
    ctx: AppContext,
    page: PageState,
}

impl RegisterPage {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            page: PageState::new("register"),
        }
    }

    pub fn state(&self) -> &PageState {
        &self.page
    }

    /// Validates locally, creates the inactive account and opens OTP verification.
    pub async fn submit(&self, form: RegisterForm) -> AppResult<()> {
        self.page.clear_error();
        if let Err(e) = FormValidation::validate_new_password(
            &form.password,
            &form.password2,
            self.ctx.config.min_password_length,
        ) {
            self.page.show_error(&self.ctx, e.user_message(MSG_REGISTER_FAILED));
            return Err(e);
        }

        self.page.begin();
        let request = RegisterRequest {
            email: form.email.clone(),
            name: form.name,
            password: form.password,
            password2: form.password2,
            dob: form.dob.filter(|dob| !dob.is_empty()),
        };
        let result = self.ctx.api.register(&request).await;
        if !self.page.is_alive() {
            return result.map(|_| ());
        }
        self.page.finish();

        match result {
            Ok(ack) => {
                self.ctx
                    .feedback
                    .success(ack.detail.as_deref().unwrap_or(MSG_REGISTER_SUCCESS));
                let email = ack.email.unwrap_or(form.email);
                go(&self.ctx, ROUTE_VERIFY_EMAIL, NavigateOptions::with_email(email));
                Ok(())
            }
            Err(e) => {
                let message = e
                    .body()
                    .and_then(registration_error_message)
                    .unwrap_or_else(|| e.user_message(MSG_REGISTER_FAILED));
                self.page.logger().warn(
                    "Registration failed",
                    log_data!("error" => e.to_string()),
                );
                self.page.show_error(&self.ctx, message);
                Err(e)
            }
        }
    }

    pub async fn google_sign_up(&self, id_token: &str) -> AppResult<()> {
        google_sign_in(&self.ctx, &self.page, id_token).await
    }

    pub fn unmount(&self) {
        self.page.unmount();
    }
}

/// Field errors rendered as `Email: a, b`; known fields first, then all of them.
pub fn registration_error_message(body: &Value) -> Option<String> {
    fn joined(value: &Value) -> String {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_string))
                .collect::<Vec<_>>()
                .join(", "),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    if let Value::String(text) = body {
        return Some(text.clone());
    }
    let object = body.as_object()?;

    for (key, label) in [("email", "Email"), ("password", "Password"), ("name", "Name")] {
        if let Some(value) = object.get(key) {
            return Some(format!("{}: {}", label, joined(value)));
        }
    }
    if let Some(detail) = object.get("detail").and_then(Value::as_str) {
        return Some(detail.to_string());
    }

    let all: Vec<String> = object
        .iter()
        .map(|(key, value)| format!("{}: {}", key, joined(value)))
        .collect();
    (!all.is_empty()).then(|| all.join("; "))
}

/// OTP confirmation for a freshly registered email.
pub struct VerifyEmailPage {
    ctx: AppContext,
    page: PageState,
    email: Option<String>,
}

impl VerifyEmailPage {
    pub fn new(ctx: AppContext, email: Option<String>) -> Self {
        Self {
            ctx,
            page: PageState::new("verify-email"),
            email: email.filter(|email| !email.is_empty()),
        }
    }

    pub fn state(&self) -> &PageState {
        &self.page
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Without an email there is nothing to verify; send the user back to registration.
    pub fn mount(&self) -> bool {
        if self.email.is_some() {
            return true;
        }
        self.ctx
            .feedback
            .error("Email not provided for verification. Please register again.");
        go(&self.ctx, ROUTE_REGISTER, NavigateOptions::default());
        false
    }

    pub async fn submit(&self, otp: &str) -> AppResult<Acknowledgement> {
        let Some(email) = self.email.clone() else {
            self.page.show_error(&self.ctx, MSG_EMAIL_MISSING);
            return Err(AppError::Validation(MSG_EMAIL_MISSING.to_string()));
        };

        self.page.begin();
        let result = self.ctx.api.verify_account(&email, otp).await;
        if !self.page.is_alive() {
            return result;
        }
        self.page.finish();

        match result {
            Ok(ack) => {
                self.ctx
                    .feedback
                    .success(ack.detail.as_deref().unwrap_or(MSG_VERIFY_SUCCESS));
                let navigator = self.ctx.navigator.clone();
                let redirect = self.ctx.scheduler.defer(self.ctx.config.redirect_delay(), move || {
                    navigator.navigate(ROUTE_LOGIN, NavigateOptions::default())
                });
                self.page.hold_redirect(redirect);
                Ok(ack)
            }
            Err(e) => {
                self.page.fail(&self.ctx, "Account verification failed", &e, MSG_VERIFY_FAILED);
                Err(e)
            }
        }
    }

    pub fn unmount(&self) {
        self.page.unmount();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetStep {
    RequestOtp,
    VerifyOtp,
    SetPassword,
}

/// Three-step password reset: email → OTP → new password.
pub struct PasswordResetPage {
    ctx: AppContext,
    page: PageState,
    step: Cell<ResetStep>,
    email: RefCell<String>,
    otp: RefCell<String>,
}

impl PasswordResetPage {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            page: PageState::new("password-reset"),
            step: Cell::new(ResetStep::RequestOtp),
            email: RefCell::new(String::new()),
            otp: RefCell::new(String::new()),
        }
    }

    pub fn state(&self) -> &PageState {
        &self.page
    }

    pub fn step(&self) -> ResetStep {
        self.step.get()
    }

    pub fn email(&self) -> String {
        self.email.borrow().clone()
    }

    pub fn otp(&self) -> String {
        self.otp.borrow().clone()
    }

    pub async fn request_otp(&self, email: &str) -> AppResult<()> {
        self.page.begin();
        let result = self.ctx.api.request_password_reset_otp(email).await;
        if !self.page.is_alive() {
            return result.map(|_| ());
        }
        self.page.finish();

        match result {
            Ok(ack) => {
                self.ctx
                    .feedback
                    .success(ack.detail.as_deref().unwrap_or(MSG_RESET_OTP_SENT));
                // The server may hand back a normalized address.
                self.email
                    .replace(ack.email.unwrap_or_else(|| email.to_string()));
                self.step.set(ResetStep::VerifyOtp);
                Ok(())
            }
            Err(e) => {
                self.page.fail(&self.ctx, "Reset OTP request failed", &e, MSG_RESET_OTP_FAILED);
                Err(e)
            }
        }
    }

    pub async fn verify_otp(&self, otp: &str) -> AppResult<()> {
        self.ensure_step(ResetStep::VerifyOtp)?;
        self.otp.replace(otp.to_string());
        self.page.begin();
        let email = self.email();
        let result = self.ctx.api.verify_password_reset_otp(&email, otp).await;
        if !self.page.is_alive() {
            return result.map(|_| ());
        }
        self.page.finish();

        match result {
            Ok(ack) => {
                self.ctx
                    .feedback
                    .success(ack.detail.as_deref().unwrap_or(MSG_RESET_OTP_VERIFIED));
                self.step.set(ResetStep::SetPassword);
                Ok(())
            }
            Err(e) => {
                self.page.fail(&self.ctx, "Reset OTP rejected", &e, MSG_RESET_OTP_INVALID);
                Err(e)
            }
        }
    }

    /// Returns to the email step, discarding the entered OTP.
    pub fn back_to_email(&self) {
        self.step.set(ResetStep::RequestOtp);
        self.otp.replace(String::new());
        self.page.clear_error();
    }

    pub async fn set_password(&self, password: &str, password2: &str) -> AppResult<()> {
        self.ensure_step(ResetStep::SetPassword)?;
        self.page.clear_error();
        if let Err(e) = FormValidation::validate_new_password(
            password,
            password2,
            self.ctx.config.min_password_length,
        ) {
            self.page.show_error(&self.ctx, e.user_message(MSG_RESET_FAILED));
            return Err(e);
        }

        self.page.begin();
        let email = self.email();
        let result = self.ctx.api.set_new_password(&email, password, password2).await;
        if !self.page.is_alive() {
            return result.map(|_| ());
        }
        self.page.finish();

        match result {
            Ok(ack) => {
                self.ctx
                    .feedback
                    .success(ack.detail.as_deref().unwrap_or(MSG_RESET_DONE));
                let navigator = self.ctx.navigator.clone();
                let redirect = self.ctx.scheduler.defer(self.ctx.config.redirect_delay(), move || {
                    navigator.navigate(ROUTE_LOGIN, NavigateOptions::default())
                });
                self.page.hold_redirect(redirect);
                Ok(())
            }
            Err(e) => {
                self.page.fail(&self.ctx, "Password reset failed", &e, MSG_RESET_FAILED);
                Err(e)
            }
        }
    }

    fn ensure_step(&self, expected: ResetStep) -> AppResult<()> {
        if self.step.get() != expected {
            return Err(AppError::InvalidStep(format!(
                "expected {:?}, at {:?}",
                expected,
                self.step.get()
            )));
        }
        Ok(())
    }

    pub fn unmount(&self) {
        self.page.unmount();
    }
}

/// Ends the session. The local session is cleared even if the server call fails.
pub async fn logout(ctx: &AppContext) {
    if let Err(e) = ctx.api.logout().await {
        crate::logging::Logger::for_component("logout").warn(
            "Server logout failed, local session cleared anyway",
            log_data!("error" => e.to_string()),
        );
    }
    ctx.feedback.info(MSG_LOGGED_OUT);
    go(ctx, ROUTE_LOGIN, NavigateOptions::default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::user_json;
    use crate::context::testing::harness;
    use crate::feedback::NoticeKind;
    use crate::session::{Session, SessionStore};
    use crate::transport::RequestBody;
    use futures::executor::block_on;
    use http::Method;
    use serde_json::json;

    fn register_form(password: &str, confirmation: &str) -> RegisterForm {
        RegisterForm {
            email: "new@example.com".into(),
            name: "New Person".into(),
            password: password.into(),
            password2: confirmation.into(),
            dob: Some(String::new()),
        }
    }

    #[test]
    fn login_opens_dashboard() {
        let h = harness(Session::default());
        h.transport.respond(
            Method::POST,
            ENDPOINT_LOGIN,
            200,
            json!({ "token": "k", "user": user_json() }),
        );
        let page = LoginPage::new(h.ctx.clone());

        block_on(page.submit("owner@example.com", "secret")).unwrap();

        assert_eq!(h.navigator.paths(), vec![ROUTE_DASHBOARD.to_string()]);
        assert_eq!(h.store.get().token(), Some("k"));
        assert_eq!(
            h.ctx.feedback.current().map(|n| n.message),
            Some(MSG_LOGIN_SUCCESS.to_string())
        );
        assert!(!page.state().is_loading());
    }

    #[test]
    fn bad_credentials_show_server_detail() {
        let h = harness(Session::default());
        h.transport.respond(
            Method::POST,
            ENDPOINT_LOGIN,
            400,
            json!({ "detail": "Invalid credentials" }),
        );
        let page = LoginPage::new(h.ctx.clone());

        assert!(block_on(page.submit("a@b.c", "nope")).is_err());
        assert_eq!(page.state().error().as_deref(), Some("Invalid credentials"));
        assert!(h.navigator.paths().is_empty());
    }

    #[test]
    fn unverified_login_redirects_to_otp_after_delay() {
        let h = harness(Session::default());
        h.transport.respond(
            Method::POST,
            ENDPOINT_LOGIN,
            403,
            json!({ "needsVerification": true, "email": "late@example.com" }),
        );
        let page = LoginPage::new(h.ctx.clone());

        assert!(block_on(page.submit("late@example.com", "pw")).is_err());
        assert_eq!(page.state().error().as_deref(), Some(MSG_NEEDS_VERIFICATION));
        assert!(h.navigator.paths().is_empty());

        assert_eq!(h.spawner.run_all(), 1);
        let visits = h.navigator.visits();
        assert_eq!(visits[0].0, ROUTE_VERIFY_EMAIL);
        assert_eq!(visits[0].1.email.as_deref(), Some("late@example.com"));
    }

    #[test]
    fn google_login_failure_keeps_user_on_page() {
        let h = harness(Session::default());
        h.transport.respond(Method::POST, ENDPOINT_GOOGLE_LOGIN, 400, json!({}));
        let page = LoginPage::new(h.ctx.clone());

        assert!(block_on(page.google_login("bad-id-token")).is_err());
        assert_eq!(page.state().error().as_deref(), Some(MSG_GOOGLE_LOGIN_FAILED));
        assert!(h.store.get().is_anonymous());
    }

    #[test]
    fn register_mismatch_blocks_request() {
        let h = harness(Session::default());
        let page = RegisterPage::new(h.ctx.clone());

        assert!(block_on(page.submit(register_form("longenough", "different1"))).is_err());
        assert_eq!(page.state().error().as_deref(), Some(MSG_PASSWORDS_MISMATCH));
        assert_eq!(h.ctx.feedback.current().map(|n| n.kind), Some(NoticeKind::Error));
        assert!(h.transport.requests().is_empty());
    }

    #[test]
    fn register_short_password_blocks_request() {
        let h = harness(Session::default());
        let page = RegisterPage::new(h.ctx.clone());

        assert!(block_on(page.submit(register_form("short", "short"))).is_err());
        assert_eq!(
            page.state().error().as_deref(),
            Some("Password must be at least 8 characters long.")
        );
        assert!(h.transport.requests().is_empty());
    }

    #[test]
    fn register_success_hands_email_to_verification() {
        let h = harness(Session::default());
        h.transport.respond(
            Method::POST,
            ENDPOINT_REGISTER,
            201,
            json!({ "detail": "OTP sent." }),
        );
        let page = RegisterPage::new(h.ctx.clone());

        block_on(page.submit(register_form("longenough", "longenough"))).unwrap();

        let visits = h.navigator.visits();
        assert_eq!(visits[0].0, ROUTE_VERIFY_EMAIL);
        assert_eq!(visits[0].1.email.as_deref(), Some("new@example.com"));
        match &h.transport.requests()[0].body {
            RequestBody::Json(body) => assert!(body.get("dob").is_none()),
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn registration_field_errors_are_labelled() {
        let body = json!({ "email": ["user with this email already exists."] });
        assert_eq!(
            registration_error_message(&body).as_deref(),
            Some("Email: user with this email already exists.")
        );
        let other = json!({ "dob": ["Invalid date."] });
        assert_eq!(
            registration_error_message(&other).as_deref(),
            Some("dob: Invalid date.")
        );
        assert_eq!(registration_error_message(&json!({})), None);
    }

    #[test]
    fn verify_without_email_sends_user_back() {
        let h = harness(Session::default());
        let page = VerifyEmailPage::new(h.ctx.clone(), None);

        assert!(!page.mount());
        assert_eq!(h.navigator.paths(), vec![ROUTE_REGISTER.to_string()]);
        assert!(block_on(page.submit("123456")).is_err());
        assert!(h.transport.requests().is_empty());
    }

    #[test]
    fn verified_account_goes_to_login() {
        let h = harness(Session::default());
        h.transport
            .respond(Method::POST, ENDPOINT_VERIFY_ACCOUNT, 200, json!({}));
        let page = VerifyEmailPage::new(h.ctx.clone(), Some("new@example.com".into()));

        assert!(page.mount());
        block_on(page.submit("123456")).unwrap();
        assert_eq!(
            h.ctx.feedback.current().map(|n| n.message),
            Some(MSG_VERIFY_SUCCESS.to_string())
        );
        assert_eq!(h.spawner.run_all(), 1);
        assert_eq!(h.navigator.paths(), vec![ROUTE_LOGIN.to_string()]);
    }

    #[test]
    fn password_reset_walks_three_steps() {
        let h = harness(Session::default());
        h.transport.respond(
            Method::POST,
            ENDPOINT_RESET_REQUEST_OTP,
            200,
            json!({ "detail": "OTP sent.", "email": "me@example.com" }),
        );
        h.transport
            .respond(Method::POST, ENDPOINT_RESET_VERIFY_OTP, 200, json!({}));
        h.transport
            .respond(Method::POST, ENDPOINT_RESET_SET_PASSWORD, 200, json!({}));
        let page = PasswordResetPage::new(h.ctx.clone());

        block_on(page.request_otp("ME@example.com")).unwrap();
        assert_eq!(page.step(), ResetStep::VerifyOtp);
        assert_eq!(page.email(), "me@example.com");

        block_on(page.verify_otp("654321")).unwrap();
        assert_eq!(page.step(), ResetStep::SetPassword);

        block_on(page.set_password("brand-new-pw", "brand-new-pw")).unwrap();
        assert_eq!(h.spawner.run_all(), 1);
        assert_eq!(h.navigator.paths(), vec![ROUTE_LOGIN.to_string()]);

        let last = h.transport.requests().pop().unwrap();
        assert_eq!(
            last.body,
            RequestBody::Json(json!({
                "email": "me@example.com",
                "password": "brand-new-pw",
                "password2": "brand-new-pw"
            }))
        );
    }

    #[test]
    fn back_from_otp_step_discards_code() {
        let h = harness(Session::default());
        h.transport
            .respond(Method::POST, ENDPOINT_RESET_REQUEST_OTP, 200, json!({}));
        h.transport.respond(
            Method::POST,
            ENDPOINT_RESET_VERIFY_OTP,
            400,
            json!({ "otp": ["Invalid OTP."] }),
        );
        let page = PasswordResetPage::new(h.ctx.clone());

        block_on(page.request_otp("me@example.com")).unwrap();
        assert!(block_on(page.verify_otp("000000")).is_err());
        assert_eq!(page.state().error().as_deref(), Some("Invalid OTP."));

        page.back_to_email();
        assert_eq!(page.step(), ResetStep::RequestOtp);
        assert_eq!(page.otp(), "");
        assert_eq!(page.state().error(), None);
    }

    #[test]
    fn set_password_before_verification_is_rejected() {
        let h = harness(Session::default());
        let page = PasswordResetPage::new(h.ctx.clone());
        assert!(matches!(
            block_on(page.set_password("brand-new-pw", "brand-new-pw")),
            Err(AppError::InvalidStep(_))
        ));
    }

    #[test]
    fn logout_clears_session_and_returns_to_login() {
        let h = harness(Session::with_token("tok"));
        h.transport.fail(Method::POST, ENDPOINT_LOGOUT, "offline");

        block_on(logout(&h.ctx));

        assert!(h.store.get().is_anonymous());
        assert_eq!(h.navigator.paths(), vec![ROUTE_LOGIN.to_string()]);
        assert_eq!(
            h.ctx.feedback.current().map(|n| n.kind),
            Some(NoticeKind::Info)
        );
    }

    #[test]
    fn unmounted_login_does_not_navigate() {
        let h = harness(Session::default());
        h.transport
            .respond(Method::POST, ENDPOINT_LOGIN, 200, json!({ "token": "k" }));
        let page = std::rc::Rc::new(LoginPage::new(h.ctx.clone()));
        let mounted = page.clone();
        h.transport.on_send(move |_| mounted.unmount());

        block_on(page.submit("a@b.c", "pw")).unwrap();
        assert!(h.navigator.paths().is_empty());
    }
}
