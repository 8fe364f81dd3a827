//! Routes relayed page-control commands to the renderer of the targeted
//! page.

use std::collections::HashMap;
use std::fmt;

use slidesync_common::{PageCommandKind, PageControlCommand, SlideId};

type Handler = Box<dyn Fn(PageCommandKind) + Send + Sync>;

/// Fixed map from page id to handler. Built once, before the display
/// connects.
#[derive(Default)]
pub struct PageControlRouter {
    handlers: HashMap<SlideId, Handler>,
}

impl fmt::Debug for PageControlRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pages: Vec<_> = self.handlers.keys().map(|id| id.0).collect();
        pages.sort_unstable();
        f.debug_struct("PageControlRouter")
            .field("pages", &pages)
            .finish()
    }
}

impl PageControlRouter {
    pub fn builder() -> PageControlRouterBuilder {
        PageControlRouterBuilder::default()
    }

    /// Hand the command to the handler registered for its target page.
    /// Returns `false` when no page claims it.
    pub fn dispatch(&self, command: &PageControlCommand) -> bool {
        match self.handlers.get(&command.target_page_id) {
            Some(handler) => {
                handler(PageCommandKind::from_command(&command.command));
                true
            }
            None => false,
        }
    }

    pub fn handles(&self, page: SlideId) -> bool {
        self.handlers.contains_key(&page)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[derive(Default)]
pub struct PageControlRouterBuilder {
    handlers: HashMap<SlideId, Handler>,
}

impl PageControlRouterBuilder {
    /// Register the handler for one page. A later registration for the same
    /// page replaces the earlier one.
    pub fn on<F>(mut self, page: impl Into<SlideId>, handler: F) -> Self
    where
        F: Fn(PageCommandKind) + Send + Sync + 'static,
    {
        let page = page.into();
        if self.handlers.insert(page, Box::new(handler)).is_some() {
            tracing::warn!(%page, "Page handler replaced");
        }
        self
    }

    pub fn build(self) -> PageControlRouter {
        PageControlRouter {
            handlers: self.handlers,
        }
    }
}
