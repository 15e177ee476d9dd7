//! Routes and the authentication-aware menu of the navigation shell.

use crate::auth::AuthContext;

pub const APP_NAME: &str = "SciLit2.0";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Upload,
    Library,
    Login,
    About,
    NotFound(String),
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        let path = path.trim();
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let normalized = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        match normalized {
            "/" => Route::Home,
            "/upload" => Route::Upload,
            "/library" => Route::Library,
            "/login" => Route::Login,
            "/about" => Route::About,
            other => Route::NotFound(other.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Home => "/",
            Route::Upload => "/upload",
            Route::Library => "/library",
            Route::Login => "/login",
            Route::About => "/about",
            Route::NotFound(path) => path,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Route::Home => "Home",
            Route::Upload => "Upload",
            Route::Library => "Library",
            Route::Login => "Log in",
            Route::About => "About",
            Route::NotFound(_) => "Not found",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Upload | Route::Library)
    }
}

/// Resolves `path` for the given auth state, sending anonymous users to the
/// login page when the route needs an account.
pub fn guard_route(auth: &AuthContext, path: &str) -> Route {
    let route = Route::from_path(path);
    if route.requires_auth() && !auth.is_authenticated {
        Route::Login
    } else if route == Route::Login && auth.is_authenticated {
        Route::Home
    } else {
        route
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuTarget {
    Route(Route),
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub target: MenuTarget,
    pub active: bool,
}

pub fn menu_entries(auth: &AuthContext, current_path: &str) -> Vec<MenuEntry> {
    let current = Route::from_path(current_path);
    let mut routes = vec![Route::Home];
    if auth.is_authenticated {
        routes.extend([Route::Upload, Route::Library]);
    }
    routes.push(Route::About);

    let mut entries: Vec<MenuEntry> = routes
        .into_iter()
        .map(|route| MenuEntry {
            label: route.title().to_string(),
            active: route == current,
            target: MenuTarget::Route(route),
        })
        .collect();

    match auth.display_name() {
        Some(name) => entries.push(MenuEntry {
            label: format!("Log out ({name})"),
            target: MenuTarget::Logout,
            active: false,
        }),
        None => entries.push(MenuEntry {
            label: Route::Login.title().to_string(),
            active: current == Route::Login,
            target: MenuTarget::Route(Route::Login),
        }),
    }
    entries
}

pub fn footer_text(year: i32) -> String {
    format!("© {year} {APP_NAME}")
}

/// Current location of the shell. Navigation always goes through
/// [`guard_route`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    location: String,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            location: Route::Home.path().to_string(),
        }
    }
}

impl Router {
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn route(&self, auth: &AuthContext) -> Route {
        guard_route(auth, &self.location)
    }

    pub fn navigate(&mut self, auth: &AuthContext, path: &str) -> Route {
        let route = guard_route(auth, path);
        tracing::debug!(requested = path, resolved = route.path(), "navigate");
        self.location = route.path().to_string();
        route
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
