//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, AppState, Tab, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Esc => app.status_message = None,

        // Tabs
        KeyCode::Char('1') => app.switch_tab(Tab::Booked),
        KeyCode::Char('2') => app.switch_tab(Tab::Schedule),
        // Schedule columns scroll sideways; elsewhere the arrows change tabs
        KeyCode::Right | KeyCode::Char('l') if app.current_tab == Tab::Schedule => {
            app.scroll_schedule_columns(1)
        }
        KeyCode::Left | KeyCode::Char('h') if app.current_tab == Tab::Schedule => {
            app.scroll_schedule_columns(-1)
        }
        KeyCode::Tab | KeyCode::Right => app.switch_tab(app.current_tab.next()),
        KeyCode::BackTab | KeyCode::Left => app.switch_tab(app.current_tab.prev()),

        // Navigation
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),

        // Actions
        KeyCode::Char('u') => app.refresh_current_tab(),
        _ => {}
    }

    Ok(false)
}
