use std::fmt;

use serde::Serialize;

/// Screen transitions requested by the dashboard and welcome screen. The
/// host app owns routing; these only name where to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationIntent {
    /// "Home Exercise" on the dashboard opens the game's welcome screen.
    HomeExercise,
    /// "Start Game" on the welcome screen.
    StartGame,
    /// Leave the parent dashboard for role selection.
    Logout,
}

impl NavigationIntent {
    pub fn route(self) -> &'static str {
        match self {
            Self::HomeExercise => "/WelcomePage",
            Self::StartGame => "/LoadingScreen",
            Self::Logout => "/RoleSelection",
        }
    }

    /// Logout replaces the history entry so "back" cannot return to the dashboard.
    pub fn replaces_history(self) -> bool {
        matches!(self, Self::Logout)
    }
}

/// `push /Route` or `replace /Route`, as the host router should apply it.
impl fmt::Display for NavigationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.replaces_history() { "replace" } else { "push" };
        write!(f, "{mode} {}", self.route())
    }
}
