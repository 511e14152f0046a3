use std::time::Instant;

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, AppMode};
use crate::picker::nav::NavKey;

/// Map a terminal key to the picker's navigation keys.
fn nav_key(key: &KeyEvent) -> Option<NavKey> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    Some(match key.code {
        KeyCode::Up => NavKey::Up,
        KeyCode::Down => NavKey::Down,
        KeyCode::Left => NavKey::Left,
        KeyCode::Right => NavKey::Right,
        KeyCode::Home => NavKey::Home,
        KeyCode::End => NavKey::End,
        KeyCode::PageUp => NavKey::PageUp,
        KeyCode::PageDown => NavKey::PageDown,
        KeyCode::Enter | KeyCode::Char(' ') => NavKey::Activate,
        KeyCode::Char(c) => NavKey::Char(c),
        _ => return None,
    })
}

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
            app.quit();
            return;
        }
        KeyCode::Char('r') if ctrl => {
            app.picker.refresh_focused();
            return;
        }
        _ => {}
    }

    match app.mode {
        AppMode::Search => handle_search_key(app, key),
        AppMode::Normal => handle_normal_key(app, key),
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc if app.picker.search().is_active() => app.cancel_search(),
        KeyCode::Esc => app.quit(),
        KeyCode::Char('/') => app.enter_search(),
        KeyCode::Tab => app.next_namespace(),
        _ => {
            if let Some(nav) = nav_key(&key) {
                app.picker.handle_key(nav, Instant::now());
            }
        }
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.accept_search(),
        KeyCode::Tab => app.finish_search_input(),
        KeyCode::Backspace => app.search_delete_char(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.search_input_char(c)
        }
        KeyCode::Up
        | KeyCode::Down
        | KeyCode::Left
        | KeyCode::Right
        | KeyCode::PageUp
        | KeyCode::PageDown => {
            if let Some(nav) = nav_key(&key) {
                app.picker.handle_key(nav, Instant::now());
            }
        }
        _ => {}
    }
}

/// Handle a mouse event: left click focuses and toggles, wheel scrolls focus.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let Some(area) = app.tree_area else {
                return;
            };
            let inside = mouse.column >= area.x
                && mouse.column < area.x + area.width
                && mouse.row >= area.y
                && mouse.row < area.y + area.height;
            if inside {
                app.picker.click((mouse.row - area.y) as usize);
            }
        }
        MouseEventKind::ScrollDown => app.picker.handle_key(NavKey::Down, Instant::now()),
        MouseEventKind::ScrollUp => app.picker.handle_key(NavKey::Up, Instant::now()),
        _ => {}
    }
}
