//! Recipient view of a capsule, opened by access token without signing in.

use std::cell::RefCell;

use crate::constants::{MSG_NO_ACCESS_TOKEN, MSG_PUBLIC_CAPSULE_FAILED};
use crate::context::AppContext;
use crate::errors::{AppError, AppResult};
use crate::handlers::PageState;
use crate::models::{ContentItem, PublicCapsule};
use crate::utils::{format_long_date, media_url};

/// One content item ready for display.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentView {
    Text(String),
    Image(String),
    Video(String),
    Audio(String),
    Document(String),
}

pub struct PublicCapsulePage {
    ctx: AppContext,
    page: PageState,
    capsule: RefCell<Option<PublicCapsule>>,
}

impl PublicCapsulePage {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            page: PageState::new("public-capsule"),
            capsule: RefCell::new(None),
        }
    }

    pub fn state(&self) -> &PageState {
        &self.page
    }

    pub fn capsule(&self) -> Option<PublicCapsule> {
        self.capsule.borrow().clone()
    }

    /// Loads by access token; contents are ordered by their `order` field.
    pub async fn load(&self, access_token: &str) -> AppResult<()> {
        if access_token.trim().is_empty() {
            self.page.show_inline(MSG_NO_ACCESS_TOKEN);
            return Err(AppError::Validation(MSG_NO_ACCESS_TOKEN.to_string()));
        }

        self.page.begin();
        let result = self.ctx.api.public_capsule(access_token).await;
        if !self.page.is_alive() {
            return result.map(|_| ());
        }
        self.page.finish();

        match result {
            Ok(mut capsule) => {
                capsule.contents.sort_by_key(|item| item.order);
                self.capsule.replace(Some(capsule));
                Ok(())
            }
            Err(e) => {
                self.page.logger().warn(
                    "Public capsule unavailable",
                    crate::log_data!("error" => e.to_string()),
                );
                self.page
                    .show_inline(e.user_message(MSG_PUBLIC_CAPSULE_FAILED));
                Err(e)
            }
        }
    }

    /// `Delivered on May 1, 2030`, when the capsule has a usable date.
    pub fn delivered_on(&self) -> Option<String> {
        let capsule = self.capsule.borrow();
        let date = capsule.as_ref()?.delivery_date.as_deref()?;
        format_long_date(date).map(|date| format!("Delivered on {}", date))
    }

    pub fn contents(&self) -> Vec<ContentView> {
        let base = self.ctx.config.api_base_url.as_str();
        self.capsule
            .borrow()
            .as_ref()
            .map(|capsule| {
                capsule
                    .contents
                    .iter()
                    .filter_map(|item| content_view(base, item))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn unmount(&self) {
        self.page.unmount();
    }
}

fn content_view(api_base_url: &str, item: &ContentItem) -> Option<ContentView> {
    let kind = item.content_type.as_deref().unwrap_or("text");
    if kind == "text" {
        return item.text_content.clone().map(ContentView::Text);
    }

    let url = media_url(api_base_url, item.file.as_deref()?);
    Some(match kind {
        "image" => ContentView::Image(url),
        "video" => ContentView::Video(url),
        "audio" => ContentView::Audio(url),
        _ => ContentView::Document(url),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HEADER_AUTHORIZATION;
    use crate::context::testing::harness;
    use crate::session::Session;
    use futures::executor::block_on;
    use http::Method;
    use serde_json::json;

    #[test]
    fn empty_token_is_rejected_without_request() {
        let h = harness(Session::default());
        let page = PublicCapsulePage::new(h.ctx.clone());

        assert!(matches!(
            block_on(page.load("")),
            Err(AppError::Validation(_))
        ));
        assert_eq!(page.state().error().as_deref(), Some(MSG_NO_ACCESS_TOKEN));
        assert!(h.transport.requests().is_empty());
    }

    #[test]
    fn contents_are_sorted_and_resolved() {
        let h = harness(Session::with_token("owner-token"));
        h.transport.respond(
            Method::GET,
            "capsules/public/capsules/abc/",
            200,
            json!({
                "title": "For Mia",
                "owner_name": "",
                "delivery_date": "2030-05-01T09:00:00Z",
                "contents": [
                    { "order": 2, "content_type": "image", "file": "/media/a.jpg" },
                    { "order": 1, "content_type": "text", "text_content": "Happy 10th birthday!" }
                ]
            }),
        );
        let page = PublicCapsulePage::new(h.ctx.clone());

        block_on(page.load("abc")).unwrap();

        assert_eq!(
            page.contents(),
            vec![
                ContentView::Text("Happy 10th birthday!".into()),
                ContentView::Image("https://api.test/media/a.jpg".into()),
            ]
        );
        assert_eq!(page.delivered_on().as_deref(), Some("Delivered on May 1, 2030"));
        assert_eq!(page.capsule().unwrap().sender_display(), "a friend");
        assert_eq!(h.transport.requests()[0].header(HEADER_AUTHORIZATION), None);
    }

    #[test]
    fn invalid_link_shows_fallback() {
        let h = harness(Session::default());
        h.transport.respond(
            Method::GET,
            "capsules/public/capsules/gone/",
            404,
            json!({}),
        );
        let page = PublicCapsulePage::new(h.ctx.clone());

        assert!(block_on(page.load("gone")).is_err());
        assert_eq!(
            page.state().error().as_deref(),
            Some(MSG_PUBLIC_CAPSULE_FAILED)
        );
    }
}
