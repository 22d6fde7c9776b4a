use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use geoint_agent_core::KeyChord;

use crate::app::App;
use crate::router::Page;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn chord_pressed(chord: &KeyChord, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) => chord.matches(
            key.modifiers.contains(KeyModifiers::CONTROL),
            key.modifiers.contains(KeyModifiers::ALT),
            key.modifiers.contains(KeyModifiers::SHIFT),
            c,
        ),
        _ => false,
    }
}

/// F1..F6 jump straight to a page
fn page_for_function_key(code: KeyCode) -> Option<Page> {
    match code {
        KeyCode::F(n) if n >= 1 => Page::all().get(usize::from(n) - 1).copied(),
        _ => None,
    }
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }
    if chord_pressed(&app.toggle_chord, &key) {
        app.dispatcher.toggle();
        return;
    }
    if let Some(page) = page_for_function_key(key.code) {
        app.go(page);
        return;
    }

    let chat = app.dispatcher.snapshot();
    if chat.is_open && !chat.is_minimized {
        handle_chat_key(app, key);
    } else {
        handle_page_key(app, key, chat.is_open);
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Esc => app.dispatcher.set_minimized(true),
        KeyCode::Enter => app.submit_input(),

        KeyCode::Char('l') if ctrl => {
            app.dispatcher.clear_messages();
            app.chat_scroll = 0;
        }
        KeyCode::Char('r') if ctrl => app.retry(),

        // Alt+1..4 quick actions, Alt+5..9 suggestions
        KeyCode::Char(c @ '1'..='4') if alt => {
            app.send_quick_action(c as usize - '1' as usize);
        }
        KeyCode::Char(c @ '5'..='9') if alt => {
            app.send_suggestion(c as usize - '5' as usize);
        }

        KeyCode::PageUp => app.chat_scroll = app.chat_scroll.saturating_add(5),
        KeyCode::PageDown => app.chat_scroll = app.chat_scroll.saturating_sub(5),

        KeyCode::Char(c) if !ctrl && !alt => {
            let byte_idx = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_idx, c);
            app.cursor += 1;
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_idx = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_idx);
            }
        }
        KeyCode::Delete => {
            if app.cursor < app.input.chars().count() {
                let byte_idx = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_idx);
            }
        }
        KeyCode::Left => app.cursor = app.cursor.saturating_sub(1),
        KeyCode::Right => {
            if app.cursor < app.input.chars().count() {
                app.cursor += 1;
            }
        }
        KeyCode::Home => app.cursor = 0,
        KeyCode::End => app.cursor = app.input.chars().count(),
        _ => {}
    }
}

fn handle_page_key(app: &mut App, key: KeyEvent, chat_open: bool) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Restore a minimized chat
        KeyCode::Tab if chat_open => app.dispatcher.set_minimized(false),

        KeyCode::Char('j') | KeyCode::Down if app.page() == Page::Geoint => app.keyword_down(),
        KeyCode::Char('k') | KeyCode::Up if app.page() == Page::Geoint => app.keyword_up(),
        KeyCode::Enter if app.page() == Page::Geoint => app.select_keyword_at_cursor(),
        _ => {}
    }
}
