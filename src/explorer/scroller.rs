//! Scroll-and-collect: reveal elements hidden in scrollable containers.

use std::collections::HashSet;

use tokio::time::sleep;
use tracing::{debug, trace};

use crate::device::source::{ElementSource, ScreenAction, ScrollDirection};
use crate::error::SourceError;
use crate::explorer::nav_graph::ExplorerConfig;
use crate::screen::screen_model::UiElement;
use crate::state::identity::element_key;

/// Two scrolls in a row that reveal nothing mean the end of the container.
const MAX_EMPTY_SCROLLS: usize = 2;

#[derive(Debug, Default)]
pub struct ScrollCollection {
    /// Every element of the initial snapshot, then the ones scrolling revealed
    pub elements: Vec<UiElement>,
    pub scrolls: usize,
}

/// Scroll every scrollable container on the current screen to its end,
/// gathering new elements, then scroll it back to where it started.
pub async fn collect_all(
    source: &dyn ElementSource,
    initial: Vec<UiElement>,
    config: &ExplorerConfig,
) -> Result<ScrollCollection, SourceError> {
    let mut seen = HashSet::new();
    let mut ids = HashSet::new();
    let mut collection = ScrollCollection::default();
    for el in initial {
        if ids.insert(el.id.clone()) {
            seen.insert(element_key(&el));
            collection.elements.push(el);
        }
    }

    let containers: Vec<UiElement> = collection
        .elements
        .iter()
        .filter(|e| e.scrollable && e.enabled)
        .cloned()
        .collect();

    for container in containers {
        let (direction, max_attempts) = if container.is_horizontal_container() {
            (ScrollDirection::Left, config.max_swipe_attempts)
        } else {
            (ScrollDirection::Forward, config.max_scroll_attempts)
        };

        let steps = scroll_container(
            source,
            &container.id,
            direction,
            max_attempts,
            config,
            &mut seen,
            &mut collection.elements,
        )
        .await?;
        collection.scrolls += steps;

        // Restore the original position
        let back = ScreenAction::scroll(&container.id, direction.reverse());
        for _ in 0..steps {
            if !source.perform(&back).await? {
                break;
            }
            sleep(config.scroll_settle()).await;
        }
    }

    Ok(collection)
}

async fn scroll_container(
    source: &dyn ElementSource,
    container_id: &str,
    direction: ScrollDirection,
    max_attempts: usize,
    config: &ExplorerConfig,
    seen: &mut HashSet<String>,
    out: &mut Vec<UiElement>,
) -> Result<usize, SourceError> {
    let action = ScreenAction::scroll(container_id, direction);
    let mut steps = 0;
    let mut empty = 0;

    while steps < max_attempts && empty < MAX_EMPTY_SCROLLS {
        if !source.perform(&action).await? {
            trace!(container = container_id, "container refused to scroll");
            break;
        }
        steps += 1;
        sleep(config.scroll_settle()).await;

        let before = out.len();
        for el in source.scrape_current_screen().await? {
            if seen.insert(element_key(&el)) {
                out.push(el);
            }
        }
        if out.len() == before {
            empty += 1;
        } else {
            empty = 0;
        }
    }

    debug!(
        container = container_id,
        steps,
        collected = out.len(),
        "scroll collection finished"
    );
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::scripted::{AppDescription, ScreenDescription, ScriptedApp, ScriptedElement};
    use crate::screen::screen_model::ElementType;

    fn item(i: usize) -> ScriptedElement {
        ScriptedElement {
            element: UiElement::new(format!("row{i}"), ElementType::Text).with_text(format!("Row {i}")),
            target: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn collects_every_page_and_scrolls_back() {
        let app = ScriptedApp::new(AppDescription::new("com.example", "feed").screen(
            "feed",
            ScreenDescription::new(".Feed").list(
                UiElement::new("list", ElementType::List).with_class("androidx.recyclerview.widget.RecyclerView"),
                (0..12).map(item).collect(),
                4,
            ),
        ))
        .expect("valid app");

        let initial = app.scrape_current_screen().await.expect("scrape");
        let collection = collect_all(&app, initial, &ExplorerConfig::default())
            .await
            .expect("collect");

        let rows = collection
            .elements
            .iter()
            .filter(|e| e.element_type == ElementType::Text)
            .count();
        assert_eq!(rows, 12);
        assert_eq!(collection.scrolls, 2);

        let visible = app.scrape_current_screen().await.expect("scrape");
        assert!(visible.iter().any(|e| e.id == "row0"));
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_lookalike_elements_of_the_first_snapshot() {
        let app = ScriptedApp::new(AppDescription::new("com.example", "home").screen(
            "home",
            ScreenDescription::new(".Home")
                .element(UiElement::new("r1", ElementType::Container).with_children(2).clickable())
                .element(UiElement::new("r2", ElementType::Container).with_children(2).clickable())
                .element(UiElement::new("reply-1", ElementType::Button).with_text("Reply").clickable())
                .element(UiElement::new("reply-2", ElementType::Button).with_text("Reply").clickable()),
        ))
        .expect("valid app");

        let mut initial = app.scrape_current_screen().await.expect("scrape");
        initial.push(initial[0].clone());
        let collection = collect_all(&app, initial, &ExplorerConfig::default())
            .await
            .expect("collect");

        let ids: Vec<&str> = collection.elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "reply-1", "reply-2"]);
        assert_eq!(collection.scrolls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn respects_attempt_bound() {
        let app = ScriptedApp::new(AppDescription::new("com.example", "feed").screen(
            "feed",
            ScreenDescription::new(".Feed").list(
                UiElement::new("list", ElementType::List),
                (0..100).map(item).collect(),
                1,
            ),
        ))
        .expect("valid app");

        let config = ExplorerConfig {
            max_scroll_attempts: 3,
            ..Default::default()
        };
        let initial = app.scrape_current_screen().await.expect("scrape");
        let collection = collect_all(&app, initial, &config).await.expect("collect");

        assert_eq!(collection.scrolls, 3);
        let rows = collection
            .elements
            .iter()
            .filter(|e| e.element_type == ElementType::Text)
            .count();
        assert_eq!(rows, 4);
    }
}
