use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::fs::places::Place;
use crate::navigator::NavKey;

/// Lines moved per preview scroll step.
const PREVIEW_STEP: isize = 10;

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),
        KeyCode::Up | KeyCode::Char('k') => app.navigate(NavKey::Up),
        KeyCode::Down | KeyCode::Char('j') => app.navigate(NavKey::Down),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Backspace => app.navigate(NavKey::Left),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter | KeyCode::Char(' ') => {
            app.navigate(NavKey::Activate)
        }
        KeyCode::Home | KeyCode::Char('g') => app.navigate(NavKey::First),
        KeyCode::End | KeyCode::Char('G') => app.navigate(NavKey::Last),
        KeyCode::Char('r') | KeyCode::F(5) => app.refresh_selected(),
        KeyCode::Char('s') => app.cycle_sort_key(),
        KeyCode::Char('o') => app.reverse_order(),
        KeyCode::PageDown => app.scroll_preview(PREVIEW_STEP),
        KeyCode::PageUp => app.scroll_preview(-PREVIEW_STEP),
        KeyCode::Char(c) => {
            if let Some(place) = Place::from_key(c) {
                app.go_to_place(place);
            }
        }
        _ => {}
    }
}

/// Handle a mouse event. Only clicks and wheel scrolls inside the tree
/// panel do anything.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    let area = app.tree_area;
    let inside = mouse.column >= area.x
        && mouse.column < area.x + area.width
        && mouse.row >= area.y
        && mouse.row < area.y + area.height;
    if !inside {
        return;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            app.click(mouse.column - area.x, mouse.row - area.y)
        }
        MouseEventKind::ScrollDown => app.navigate(NavKey::Down),
        MouseEventKind::ScrollUp => app.navigate(NavKey::Up),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crossterm::event::KeyEventState;
    use ratatui::layout::Rect;
    use tokio::sync::mpsc;

    use crate::config::{AppConfig, TreeConfig};
    use crate::fs::arena::Tree;
    use crate::fs::provider::testing::FakeProvider;
    use crate::fs::provider::VolumeInfo;
    use crate::tasks::Dispatcher;

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = AppConfig {
            tree: TreeConfig {
                separator: Some("/".into()),
                ..TreeConfig::default()
            },
            ..AppConfig::default()
        };
        let provider = FakeProvider::new(&["/a", "/b", "/c"]);
        let mut app = App::new(&config, Dispatcher::new(Arc::new(provider), tx));
        app.tree_state.tree = Tree::from_volumes(
            &[
                VolumeInfo { path: "/a".into() },
                VolumeInfo { path: "/b".into() },
                VolumeInfo { path: "/c".into() },
            ],
            app.tree_state.tree.separator(),
        );
        let first = app.tree_state.tree.roots()[0];
        app.tree_state.select(first);
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn selected_name(app: &App) -> String {
        app.tree_state
            .selected_node()
            .map(|n| n.name.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn arrows_and_vim_keys_move_selection() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Down));
        assert_eq!(selected_name(&app), "b");
        handle_key_event(&mut app, key(KeyCode::Char('j')));
        assert_eq!(selected_name(&app), "c");
        handle_key_event(&mut app, key(KeyCode::Char('k')));
        assert_eq!(selected_name(&app), "b");
        handle_key_event(&mut app, key(KeyCode::Home));
        assert_eq!(selected_name(&app), "a");
        handle_key_event(&mut app, key(KeyCode::Char('G')));
        assert_eq!(selected_name(&app), "c");
    }

    #[tokio::test]
    async fn release_events_are_ignored() {
        let mut app = app();
        let release = KeyEvent {
            code: KeyCode::Down,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_key_event(&mut app, release);
        assert_eq!(selected_name(&app), "a");
    }

    #[tokio::test]
    async fn activate_starts_listing() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert!(app.tree_state.has_pending());
    }

    #[tokio::test]
    async fn sort_keys_change_order() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('s')));
        assert_eq!(app.tree_state.order().label(), "Ext ↑");
        handle_key_event(&mut app, key(KeyCode::Char('o')));
        assert_eq!(app.tree_state.order().label(), "Ext ↓");
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);

        let mut app = self::app();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn click_inside_tree_selects_row() {
        let mut app = app();
        app.tree_area = Rect::new(1, 1, 20, 10);
        app.viewport.prepare(10, 3);
        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(&mut app, click(6, 3));
        assert_eq!(selected_name(&app), "c");
        // Outside the panel.
        handle_mouse_event(&mut app, click(30, 2));
        assert_eq!(selected_name(&app), "c");
    }

    #[tokio::test]
    async fn wheel_moves_selection() {
        let mut app = app();
        app.tree_area = Rect::new(0, 0, 20, 10);
        handle_mouse_event(
            &mut app,
            MouseEvent {
                kind: MouseEventKind::ScrollDown,
                column: 3,
                row: 3,
                modifiers: KeyModifiers::NONE,
            },
        );
        assert_eq!(selected_name(&app), "b");
    }
}
