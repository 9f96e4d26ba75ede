use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::screen::screen_model::{ScreenSignature, UiElement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Forward,
    Backward,
    /// Swipe content to the left (reveals items on the right)
    Left,
    Right,
}

impl ScrollDirection {
    pub fn reverse(self) -> Self {
        match self {
            ScrollDirection::Forward => ScrollDirection::Backward,
            ScrollDirection::Backward => ScrollDirection::Forward,
            ScrollDirection::Left => ScrollDirection::Right,
            ScrollDirection::Right => ScrollDirection::Left,
        }
    }
}

/// Everything the engine can ask the device to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScreenAction {
    Click {
        element_id: String,
    },
    Back,
    Scroll {
        container_id: String,
        direction: ScrollDirection,
    },
}

impl ScreenAction {
    pub fn click(element_id: &str) -> Self {
        ScreenAction::Click {
            element_id: element_id.to_string(),
        }
    }

    pub fn scroll(container_id: &str, direction: ScrollDirection) -> Self {
        ScreenAction::Scroll {
            container_id: container_id.to_string(),
            direction,
        }
    }
}

impl fmt::Display for ScreenAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenAction::Click { element_id } => write!(f, "click({element_id})"),
            ScreenAction::Back => f.write_str("back"),
            ScreenAction::Scroll {
                container_id,
                direction,
            } => write!(f, "scroll({container_id}, {direction:?})"),
        }
    }
}

/// The device under exploration: a live accessibility tree in production,
/// a scripted app in tests.
///
/// `perform` returns `Ok(false)` when the device refused the action (element
/// gone, nothing left to scroll, no back stack); `Err` only for failures of
/// the source itself.
#[async_trait]
pub trait ElementSource: Send + Sync {
    async fn scrape_current_screen(&self) -> Result<Vec<UiElement>, SourceError>;

    async fn current_screen_signature(&self) -> Result<ScreenSignature, SourceError>;

    async fn perform(&self, action: &ScreenAction) -> Result<bool, SourceError>;

    async fn click(&self, element_id: &str) -> Result<bool, SourceError> {
        self.perform(&ScreenAction::click(element_id)).await
    }

    async fn navigate_back(&self) -> Result<bool, SourceError> {
        self.perform(&ScreenAction::Back).await
    }
}
