use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::DraftResolved(response) => app.on_draft_resolved(response),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // The notice is modal
    if app.notice.is_some() {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
            app.dismiss_notice();
        }
        return;
    }

    let view = app.view();

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('y') if view.result_visible => app.copy(),
            KeyCode::Char('s') if view.result_visible => app.send(),
            KeyCode::Char('r') if view.result_visible && view.generate_enabled => app.improve(),
            KeyCode::Char('u') => app.clear_context(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => app.insert_char('\n'),
        KeyCode::Enter => {
            // Disabled trigger while a draft is pending
            if view.generate_enabled {
                app.generate();
            }
        }
        KeyCode::Tab => app.next_tab(),
        KeyCode::BackTab => app.prev_tab(),
        KeyCode::PageDown => app.scroll_draft_down(),
        KeyCode::PageUp => app.scroll_draft_up(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_draft_down(),
        MouseEventKind::ScrollUp => app.scroll_draft_up(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drafter_core::{
        Clipboard, DraftOrchestrator, HostError, MailLauncher, Response, TabSet,
    };
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct Recorder {
        items: Mutex<Vec<String>>,
    }

    impl Clipboard for Recorder {
        fn write_text(&self, text: &str) -> Result<(), HostError> {
            self.items.lock().unwrap().push(format!("copy:{}", text));
            Ok(())
        }
    }

    impl MailLauncher for Recorder {
        fn open(&self, uri: &str) -> Result<(), HostError> {
            self.items.lock().unwrap().push(format!("open:{}", uri));
            Ok(())
        }
    }

    fn app() -> (App, mpsc::UnboundedReceiver<AppEvent>, Arc<Recorder>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let recorder = Arc::new(Recorder::default());
        let app = App::new(
            DraftOrchestrator::new(),
            TabSet::new(),
            recorder.clone(),
            recorder.clone(),
            tx,
        );
        (app, rx, recorder)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))).unwrap();
    }

    fn ctrl(app: &mut App, c: char) {
        handle_event(
            app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_enter_is_ignored_while_pending() {
        let (mut app, mut rx, _recorder) = app();
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Enter);
        assert!(app.orchestrator.in_flight());

        press(&mut app, KeyCode::Enter);
        let first = rx.recv().await.unwrap();
        handle_event(&mut app, first).unwrap();
        assert!(rx.try_recv().is_err());

        // No tabs are open, so the draft is the transport error
        assert_eq!(app.view().draft_text, "Error: no active tab. Check console.");
        assert!(app.view().generate_enabled);
    }

    #[tokio::test]
    async fn test_notice_is_modal() {
        let (mut app, _rx, _recorder) = app();
        press(&mut app, KeyCode::Enter);
        assert!(app.notice.is_some());

        press(&mut app, KeyCode::Char('a'));
        assert!(app.context_input.is_empty());

        press(&mut app, KeyCode::Esc);
        assert!(app.notice.is_none());
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_copy_and_send_need_a_result() {
        let (mut app, _rx, recorder) = app();
        ctrl(&mut app, 'y');
        ctrl(&mut app, 's');
        assert!(recorder.items.lock().unwrap().is_empty());

        app.orchestrator.begin("ctx").unwrap();
        handle_event(
            &mut app,
            AppEvent::DraftResolved(Response::Success {
                email: "hello".into(),
            }),
        )
        .unwrap();
        ctrl(&mut app, 'y');
        ctrl(&mut app, 's');

        let items = recorder.items.lock().unwrap();
        assert_eq!(items[0], "copy:hello");
        assert_eq!(items[1], "open:mailto:?subject=Quick%20Chat%3F&body=hello");
    }

    #[tokio::test]
    async fn test_ctrl_r_improves_the_shown_draft() {
        let (mut app, mut rx, _recorder) = app();
        ctrl(&mut app, 'r');
        assert!(app.notice.is_none());
        assert!(!app.orchestrator.in_flight());

        app.orchestrator.begin("ctx").unwrap();
        handle_event(
            &mut app,
            AppEvent::DraftResolved(Response::Success {
                email: "hello".into(),
            }),
        )
        .unwrap();
        press(&mut app, KeyCode::Char('x'));
        ctrl(&mut app, 'r');
        assert!(app.orchestrator.in_flight());
        assert!(app.orchestrator.draft_text().is_empty());

        // No tabs are open, so the improved draft is the transport error
        let resolved = rx.recv().await.unwrap();
        handle_event(&mut app, resolved).unwrap();
        assert_eq!(app.view().draft_text, "Error: no active tab. Check console.");
    }

    #[tokio::test]
    async fn test_ctrl_c_quits() {
        let (mut app, _rx, _recorder) = app();
        ctrl(&mut app, 'c');
        assert!(app.should_quit);
    }
}
