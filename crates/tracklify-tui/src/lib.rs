//! TUI components for tracklify
//!
//! This crate provides the terminal user interface for tracklify,
//! including state management, keybindings, event handling, and UI components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, FeedSnapshot, Screen, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{HelpOverlay, ListSelector, ListSelectorExt, StatusBar, list_nav_hints};
pub use ui::screens::{DeviceSelectScreen, LiveFeedScreen};
pub use ui::{Layout, Theme};
