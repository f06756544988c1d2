use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::highlight::Highlight;
use crate::note::NoteField;
use crate::notice::Notice;
use crate::selection::SelectionController;
use crate::store::NoteStore;
use crate::ui;

pub mod state;

pub use state::{AppState, FocusPane};

enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    NewNote,
    EnterEdit,
    StartSearch,
    DeleteNote,
}

pub struct App {
    state: AppState,
    list_state: ListState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: &AppConfig, store: NoteStore) -> Self {
        let mut controller = SelectionController::new(store, Notice::new(config.notice_duration()));
        controller.set_order(config.list_order);
        let state = AppState::new(controller, Highlight::new(config.accent));
        Self {
            state,
            list_state: ListState::default(),
            should_quit: false,
            tick_rate: config.tick_rate(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| ui::draw_app(frame, &self.state, &mut self.list_state))
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    self.handle_key(key);
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick(Instant::now());
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    pub fn on_tick(&mut self, now: Instant) {
        if self.state.controller_mut().tick(now) {
            tracing::trace!("notice expired");
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.state.controller().is_delete_pending() {
            self.handle_confirm_key(key);
            return;
        }

        match self.state.focus() {
            FocusPane::Editor => self.handle_editor_key(key),
            FocusPane::Search => self.handle_search_key(key),
            FocusPane::List => {
                if let Some(action) = list_action(key) {
                    self.handle_action(action);
                }
            }
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectNext => {
                self.state.controller_mut().select_next();
            }
            Action::SelectPrevious => {
                self.state.controller_mut().select_previous();
            }
            Action::NewNote => self.state.begin_new(),
            Action::EnterEdit => {
                self.state.enter_editor();
            }
            Action::StartSearch => self.state.begin_search(),
            Action::DeleteNote => {
                self.state.request_delete();
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => self.state.confirm_delete(),
            KeyCode::Char('n') | KeyCode::Esc => self.state.cancel_delete(),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.cancel_search(),
            KeyCode::Enter | KeyCode::Down | KeyCode::Tab => self.state.finish_search(),
            KeyCode::Backspace => self.state.pop_search_char(),
            KeyCode::Char(ch) if !has_command_modifier(key) => self.state.push_search_char(ch),
            _ => {}
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('s') {
                self.state.save();
            }
            return;
        }
        if key.code == KeyCode::Esc {
            self.state.leave_editor();
            return;
        }

        let form = self.state.controller_mut().form_mut();
        match key.code {
            KeyCode::Tab => form.toggle_focus(),
            KeyCode::BackTab => form.set_focus(NoteField::Title),
            KeyCode::Enter => {
                form.insert_newline();
            }
            KeyCode::Backspace => {
                form.focused_mut().backspace();
            }
            KeyCode::Delete => {
                form.focused_mut().delete();
            }
            KeyCode::Left => {
                form.focused_mut().move_left();
            }
            KeyCode::Right => {
                form.focused_mut().move_right();
            }
            KeyCode::Up => {
                form.focused_mut().move_up();
            }
            KeyCode::Down => {
                form.focused_mut().move_down();
            }
            KeyCode::Home => {
                form.focused_mut().move_home();
            }
            KeyCode::End => {
                form.focused_mut().move_end();
            }
            KeyCode::Char(ch) if !has_command_modifier(key) => {
                form.focused_mut().insert_char(ch);
            }
            _ => {}
        }
    }
}

fn list_action(key: KeyEvent) -> Option<Action> {
    if has_command_modifier(key) {
        return None;
    }
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
        KeyCode::Char('n') | KeyCode::Char('a') => Some(Action::NewNote),
        KeyCode::Char('e') | KeyCode::Enter | KeyCode::Tab => Some(Action::EnterEdit),
        KeyCode::Char('d') | KeyCode::Delete => Some(Action::DeleteNote),
        KeyCode::Char('/') => Some(Action::StartSearch),
        _ => None,
    }
}

fn has_command_modifier(key: KeyEvent) -> bool {
    key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{EditorMode, Selection, VALIDATION_MESSAGE};
    use crate::storage::MemoryBackend;

    fn app_with(titles: &[&str]) -> anyhow::Result<(MemoryBackend, App)> {
        let backend = MemoryBackend::new();
        let mut store = NoteStore::open(Box::new(backend.clone()))?;
        for title in titles {
            store.create(title, "body")?;
        }
        Ok((backend, App::new(&AppConfig::default(), store)))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn ctrl(app: &mut App, ch: char) {
        app.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL));
    }

    #[test]
    fn create_note_through_keys() -> anyhow::Result<()> {
        let (backend, mut app) = app_with(&[])?;
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state().focus(), FocusPane::Editor);
        type_text(&mut app, "Groceries");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "eggs");
        ctrl(&mut app, 's');

        let persisted = backend.persisted();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].title, "Groceries");
        assert_eq!(
            app.state().controller().selection(),
            Selection::Viewing(persisted[0].id)
        );
        assert_eq!(app.state().focus(), FocusPane::List);
        Ok(())
    }

    #[test]
    fn saving_empty_description_shows_validation_notice() -> anyhow::Result<()> {
        let (backend, mut app) = app_with(&[])?;
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Title only");
        ctrl(&mut app, 's');

        assert!(backend.persisted().is_empty());
        assert_eq!(app.state().focus(), FocusPane::Editor);
        assert_eq!(
            app.state().controller().notice().message(),
            Some(VALIDATION_MESSAGE)
        );

        app.on_tick(Instant::now() + Duration::from_secs(3));
        assert!(!app.state().controller().notice().is_visible());
        Ok(())
    }

    #[test]
    fn escape_from_new_note_returns_to_previous() -> anyhow::Result<()> {
        let (_backend, mut app) = app_with(&["Existing"])?;
        let before = app.state().controller().selection();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "draft");
        press(&mut app, KeyCode::Esc);

        assert_eq!(app.state().controller().selection(), before);
        assert_eq!(app.state().controller().mode(), EditorMode::EditingExisting);
        assert_eq!(app.state().controller().form().title(), "Existing");
        Ok(())
    }

    #[test]
    fn delete_requires_confirmation() -> anyhow::Result<()> {
        let (backend, mut app) = app_with(&["Keep", "Remove"])?;
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(backend.persisted().len(), 2);
        assert!(!app.state().controller().is_delete_pending());

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        let remaining = backend.persisted();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "Keep");
        Ok(())
    }

    #[test]
    fn editor_keys_do_not_trigger_list_actions() -> anyhow::Result<()> {
        let (_backend, mut app) = app_with(&["Note"])?;
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::End);
        type_text(&mut app, " dq");
        assert!(!app.should_quit());
        assert_eq!(app.state().controller().form().title(), "Note dq");
        assert!(app.state().controller().form().is_dirty());

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state().controller().form().title(), "Note");
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());
        Ok(())
    }

    #[test]
    fn search_mode_captures_letters() -> anyhow::Result<()> {
        let (_backend, mut app) = app_with(&["apple", "banana"])?;
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "nan");
        assert_eq!(app.state().controller().search(), "nan");
        assert_eq!(app.state().visible_notes().len(), 1);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state().focus(), FocusPane::List);
        assert_eq!(app.state().controller().search(), "nan");
        Ok(())
    }
}
