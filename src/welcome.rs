use serde::Serialize;

use crate::navigation::NavigationIntent;

/// The game's welcome screen: logo title, current quarter and the start button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WelcomeScreen {
    pub title: &'static str,
    pub quarter_label: &'static str,
    pub start_label: &'static str,
}

impl Default for WelcomeScreen {
    fn default() -> Self {
        Self {
            title: "MATH TATAG GAME",
            quarter_label: "QUARTER 1",
            start_label: "START GAME",
        }
    }
}

impl WelcomeScreen {
    pub fn start_game(&self) -> NavigationIntent {
        NavigationIntent::StartGame
    }
}
