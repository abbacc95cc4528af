//! Route ↔ path mapping and the editor panel state machine

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;
use viewlinks_tree::Path;

use crate::error::NavigationError;

/// Map route segments onto a path
///
/// Segment 0 names the link, every further segment a nested field.
///
/// # Errors
/// Returns [`NavigationError`] for an empty list or a blank segment
pub fn decompose_route<S: AsRef<str>>(segments: &[S]) -> Result<Path, NavigationError> {
    let (first, rest) = segments.split_first().ok_or(NavigationError::EmptyRoute)?;
    let mut path = Path::link(first.as_ref())
        .map_err(|_| NavigationError::EmptySegment { index: 0 })?;
    for (i, segment) in rest.iter().enumerate() {
        path = path
            .child(segment.as_ref())
            .map_err(|_| NavigationError::EmptySegment { index: i + 1 })?;
    }
    Ok(path)
}

/// Raw names along `path`, link first
#[must_use]
pub fn recompose(path: &Path) -> Vec<String> {
    path.keys().map(str::to_string).collect()
}

/// `(label, path)` for every level from the link down to `path`
#[must_use]
pub fn breadcrumbs(path: &Path) -> Vec<(String, Path)> {
    path.ancestors_inclusive()
        .map(|ancestor| (ancestor.last_key().to_string(), ancestor))
        .collect()
}

/// UI route `<view>/<link>/<field>/...`
///
/// Segments are taken verbatim; percent-encoding is not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub view: String,
    pub segments: Vec<String>,
}

impl Route {
    /// Route to `path` inside `view`
    #[must_use]
    pub fn to_path(view: impl Into<String>, path: &Path) -> Self {
        Self {
            view: view.into(),
            segments: recompose(path),
        }
    }

    /// Path this route addresses; `None` for the view root
    ///
    /// # Errors
    /// Returns [`NavigationError`] for blank segments
    pub fn path(&self) -> Result<Option<Path>, NavigationError> {
        if self.segments.is_empty() {
            return Ok(None);
        }
        decompose_route(&self.segments).map(Some)
    }
}

impl FromStr for Route {
    type Err = NavigationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_matches('/');
        let mut parts = trimmed.split('/');
        let view = match parts.next() {
            Some(view) if !view.is_empty() => view.to_string(),
            _ => return Err(NavigationError::MissingView),
        };
        let segments: Vec<String> = parts.map(str::to_string).collect();
        if let Some(index) = segments.iter().position(String::is_empty) {
            return Err(NavigationError::EmptySegment { index });
        }
        Ok(Self { view, segments })
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.view)?;
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Which panel the editor shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PanelState {
    #[default]
    LinkList,
    AddNew,
    ViewParent,
}

impl PanelState {
    pub const ALL: [Self; 3] = [Self::LinkList, Self::AddNew, Self::ViewParent];
}

/// User gesture driving the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    AddClick,
    ViewLink(Path),
    Back,
}

/// Panel shown after `event`
///
/// Every event is accepted in every state; no state is terminal.
#[must_use]
pub fn transition(_from: PanelState, event: &PanelEvent) -> PanelState {
    match event {
        PanelEvent::AddClick => PanelState::AddNew,
        PanelEvent::ViewLink(_) => PanelState::ViewParent,
        PanelEvent::Back => PanelState::LinkList,
    }
}

/// States reachable from `from` in one event
#[must_use]
pub fn allowed_transitions(from: PanelState) -> Vec<PanelState> {
    match from {
        PanelState::LinkList | PanelState::AddNew | PanelState::ViewParent => {
            vec![PanelState::AddNew, PanelState::ViewParent, PanelState::LinkList]
        }
    }
}

/// Panel state plus the definition currently on screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigator {
    panel: PanelState,
    current: Option<Path>,
}

impl Navigator {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn panel(&self) -> PanelState {
        self.panel
    }

    /// Definition being viewed, if any
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<&Path> {
        self.current.as_ref()
    }

    /// Apply a user gesture
    pub fn handle(&mut self, event: PanelEvent) -> PanelState {
        self.panel = transition(self.panel, &event);
        match event {
            PanelEvent::ViewLink(path) => self.current = Some(path),
            PanelEvent::Back => self.current = None,
            PanelEvent::AddClick => {}
        }
        self.panel
    }

    /// Follow a route; an undecodable one falls back to the link list
    pub fn open_route(&mut self, route: &Route) -> PanelState {
        match route.path() {
            Ok(Some(path)) => self.handle(PanelEvent::ViewLink(path)),
            Ok(None) => self.handle(PanelEvent::Back),
            Err(err) => {
                warn!(route = %route, error = %err, "unroutable path, showing link list");
                self.handle(PanelEvent::Back)
            }
        }
    }

    /// Route for the current screen
    #[must_use]
    pub fn route(&self, view: &str) -> Route {
        match &self.current {
            Some(path) => Route::to_path(view, path),
            None => Route {
                view: view.to_string(),
                segments: Vec::new(),
            },
        }
    }

    /// Breadcrumbs for the current definition
    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<(String, Path)> {
        self.current.as_ref().map(breadcrumbs).unwrap_or_default()
    }
}
