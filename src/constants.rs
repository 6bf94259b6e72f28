//! # Application Constants
//!
//! This module defines application-wide constants used throughout the client core.
//! Centralizing constants keeps route paths, endpoint paths and user-facing
//! fallback texts consistent across pages.
//!
//! ## Storage Keys
//!
//! Keys used in browser-local durable storage for the session.
//!
//! ## Endpoints
//!
//! Paths relative to the configured API base URL.
//!
//! ## Routes
//!
//! Client-side route paths rendered by the application shell.

/// Default API base URL when no compile-time override is provided
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/";

/// Compile-time environment variable overriding the API base URL
pub const API_BASE_URL_ENV: &str = "TIME_CAPSULE_API_BASE_URL";

/// Authorization scheme expected by the backend token authentication
pub const DEFAULT_AUTH_SCHEME: &str = "Token";

/// Storage key holding the opaque auth token
pub const STORAGE_TOKEN_KEY: &str = "authToken";

/// Storage key holding the cached user profile (JSON)
pub const STORAGE_USER_KEY: &str = "user";

/// Delay before deferred redirects (ms)
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 2_000;

/// Delay before redirecting an unverified account to verification (ms)
pub const DEFAULT_VERIFICATION_REDIRECT_DELAY_MS: u64 = 1_000;

/// Default visibility of a transient notice (ms)
pub const DEFAULT_NOTICE_DURATION_MS: u64 = 3_000;

/// Minimum password length enforced before any network call
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// Advisory accept filter for the media picker
pub const MEDIA_ACCEPT_FILTER: &str = "image/*,video/*,audio/*,.pdf,.doc,.docx,.txt";

/// HTTP header carrying the auth token
pub const HEADER_AUTHORIZATION: &str = "Authorization";

/// HTTP header for the request payload type
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";

pub const ENDPOINT_LOGIN: &str = "accounts/login/";
pub const ENDPOINT_REGISTER: &str = "accounts/register/";
pub const ENDPOINT_VERIFY_ACCOUNT: &str = "accounts/verify-account/";
pub const ENDPOINT_ME: &str = "accounts/me/";
pub const ENDPOINT_LOGOUT: &str = "accounts/logout/";
pub const ENDPOINT_RESET_REQUEST_OTP: &str = "accounts/password-reset/request-otp/";
pub const ENDPOINT_RESET_VERIFY_OTP: &str = "accounts/password-reset/verify-otp/";
pub const ENDPOINT_RESET_SET_PASSWORD: &str = "accounts/password-reset/set-new-password/";
pub const ENDPOINT_GOOGLE_LOGIN: &str = "accounts/google-login/";
pub const ENDPOINT_PROFILE: &str = "accounts/profile/";
pub const ENDPOINT_CHANGE_PASSWORD: &str = "accounts/profile/change-password/";
pub const ENDPOINT_CAPSULES: &str = "capsules/";
pub const ENDPOINT_CAPSULE_CREATE: &str = "capsules/create/";
pub const ENDPOINT_NOTIFICATIONS: &str = "capsules/notifications/";
pub const ENDPOINT_NOTIFICATIONS_UNREAD: &str = "capsules/notifications/unread-count/";
pub const ENDPOINT_NOTIFICATIONS_MARK_ALL: &str = "capsules/notifications/mark-all-read/";

/// Multipart field name for each attached media file
pub const FIELD_MEDIA_FILES: &str = "media_files";

pub const ROUTE_HOME: &str = "/";
pub const ROUTE_LOGIN: &str = "/login";
pub const ROUTE_REGISTER: &str = "/register";
pub const ROUTE_VERIFY_EMAIL: &str = "/verify-email";
pub const ROUTE_FORGOT_PASSWORD: &str = "/forgot-password";
pub const ROUTE_DASHBOARD: &str = "/dashboard";
pub const ROUTE_CREATE_CAPSULE: &str = "/create-capsule";
pub const ROUTE_NOTIFICATIONS: &str = "/notifications";
pub const ROUTE_PROFILE: &str = "/profile";

/// Generic fallback when no structured server message is available
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred. Please try again.";
pub const MSG_CAPSULE_CREATED: &str = "Capsule created successfully! Redirecting...";
pub const MSG_CAPSULE_CREATE_FAILED: &str = "Failed to create capsule";
pub const MSG_ALREADY_LOGGED_IN: &str = "You are already logged in.";
pub const MSG_ALREADY_REGISTERED: &str = "You are already registered and logged in.";
pub const MSG_PASSWORDS_MISMATCH: &str = "Passwords do not match.";
pub const MSG_NEW_PASSWORDS_MISMATCH: &str = "New passwords do not match.";
pub const MSG_LOGIN_SUCCESS: &str = "Login successful!";
pub const MSG_LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
pub const MSG_NEEDS_VERIFICATION: &str = "Account not verified. Please check your email for OTP.";
pub const MSG_GOOGLE_LOGIN_SUCCESS: &str = "Google login successful!";
pub const MSG_GOOGLE_LOGIN_FAILED: &str = "Google login failed. Please try again.";
pub const MSG_REGISTER_SUCCESS: &str = "Registration successful. Check email for OTP.";
pub const MSG_REGISTER_FAILED: &str = "Registration failed. Please try again.";
pub const MSG_EMAIL_MISSING: &str = "Email is missing. Cannot verify OTP.";
pub const MSG_VERIFY_SUCCESS: &str = "Account verified successfully! You can now log in.";
pub const MSG_VERIFY_FAILED: &str =
    "OTP verification failed. Please try again or register to get a new OTP.";
pub const MSG_OTP_RESENT: &str = "A new OTP has been sent to your email.";
pub const MSG_OTP_RESEND_FAILED: &str = "Failed to resend OTP. Please try again.";
pub const MSG_RESET_OTP_SENT: &str = "OTP sent to your email.";
pub const MSG_RESET_OTP_FAILED: &str = "Failed to send OTP. Please check the email and try again.";
pub const MSG_RESET_OTP_VERIFIED: &str = "OTP verified successfully.";
pub const MSG_RESET_OTP_INVALID: &str = "Invalid or expired OTP.";
pub const MSG_RESET_DONE: &str = "Password reset successfully. Please log in.";
pub const MSG_RESET_FAILED: &str = "Failed to reset password.";
pub const MSG_LOGGED_OUT: &str = "You have been logged out.";
pub const MSG_CAPSULES_LOAD_FAILED: &str = "Could not load capsules.";
pub const MSG_CAPSULE_DELETE_FAILED: &str = "Failed to delete capsule.";
pub const MSG_NOTIFICATIONS_LOAD_FAILED: &str = "Failed to load notifications.";
pub const MSG_PROFILE_LOAD_FAILED: &str = "Failed to load profile data. Please try again later.";
pub const MSG_SESSION_EXPIRED: &str = "Session expired. Please log in again.";
pub const MSG_PROFILE_UPDATED: &str = "Profile updated successfully!";
pub const MSG_PROFILE_UPDATE_FAILED: &str = "Failed to update profile.";
pub const MSG_PASSWORD_CHANGED: &str = "Password changed successfully!";
pub const MSG_PASSWORD_CHANGE_FAILED: &str = "Failed to change password.";
pub const MSG_NO_ACCESS_TOKEN: &str = "No access token provided.";
pub const MSG_PUBLIC_CAPSULE_FAILED: &str =
    "Could not load the time capsule. The link might be invalid or expired.";
