use crate::tui::{
    inputs::{map_event, Action},
    views::{self, Pane, Status},
};
use crossterm::{
    event, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use imagedeck_core::{next_id, CollectionStore, ImageId, ImageRecord, Navigator, Notice, Route};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Stdout};
use std::sync::Arc;
use tokio::runtime::Runtime;

enum Screen {
    List,
    Detail(ImageId),
    Create { input: String },
}

pub struct TuiApp {
    store: CollectionStore,
    rt: Arc<Runtime>,
    screen: Screen,
    sel: usize,
    status: Option<(String, bool)>,
    // set whenever the study list regains focus
    needs_reload: bool,
}

impl Navigator for TuiApp {
    fn push(&mut self, route: Route) {
        tracing::debug!(path = %route.path(), "navigate");
        self.screen = match route {
            Route::Detail { id } => Screen::Detail(id),
            Route::Create => Screen::Create { input: String::new() },
        };
    }
}

impl TuiApp {
    pub fn new(store: CollectionStore, rt: Arc<Runtime>) -> Self {
        Self { store, rt, screen: Screen::List, sel: 0, status: None, needs_reload: true }
    }

    fn focus_list(&mut self) {
        self.screen = Screen::List;
        self.needs_reload = true;
    }

    fn reload(&mut self) {
        self.needs_reload = false;
        if let Err(e) = self.rt.block_on(self.store.load()) {
            self.status = Some((e.to_string(), true));
        }
        self.sel = self.sel.min(self.store.images().len().saturating_sub(1));
    }

    fn selected(&self) -> Option<ImageId> {
        self.store.images().get(self.sel).map(|r| r.id)
    }

    fn drain_notices(&mut self) {
        self.store.poll_writes();
        for n in self.store.take_notices() {
            let is_error = matches!(n, Notice::SaveFailed { .. });
            self.status = Some((n.message(), is_error));
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.mainloop(&mut terminal);

        // pending writes must land before the runtime goes away
        self.rt.block_on(self.store.flush());

        disable_raw_mode().ok();
        let mut out: Stdout = std::io::stdout();
        execute!(out, LeaveAlternateScreen).ok();
        terminal.show_cursor().ok();

        res
    }

    fn mainloop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
        loop {
            if self.needs_reload {
                terminal.draw(|f| {
                    let area = f.size();
                    views::draw_ui(f, area, Pane::Loading, None)
                })?;
                self.reload();
            }
            self.drain_notices();

            terminal.draw(|f| {
                let pane = match &self.screen {
                    Screen::List => Pane::List {
                        images: self.store.images(),
                        sel: self.sel,
                        phase: self.store.phase(),
                    },
                    Screen::Detail(id) => Pane::Detail { id: *id, record: self.store.get(*id) },
                    Screen::Create { input } => Pane::Create {
                        input,
                        next_id: next_id(self.store.images()).ok(),
                    },
                };
                let status = self
                    .status
                    .as_ref()
                    .map(|(text, is_error)| Status { text, is_error: *is_error });
                let area = f.size();
                views::draw_ui(f, area, pane, status);
            })?;

            if !event::poll(std::time::Duration::from_millis(100))? {
                continue;
            }
            let typing = matches!(self.screen, Screen::Create { .. });
            let action = map_event(event::read()?, typing);
            if action == Action::Quit {
                break;
            }
            match self.screen {
                Screen::List => self.on_list(action),
                Screen::Detail(id) => self.on_detail(id, action),
                Screen::Create { .. } => self.on_create(action),
            }
        }
        Ok(())
    }

    fn on_list(&mut self, action: Action) {
        match action {
            Action::Up => self.sel = self.sel.saturating_sub(1),
            Action::Down => {
                if self.sel + 1 < self.store.images().len() {
                    self.sel += 1;
                }
            }
            Action::Enter => {
                if let Some(route) = self.selected().and_then(|id| self.store.open(id)) {
                    self.push(route);
                }
            }
            Action::Delete => {
                if let Some(id) = self.selected() {
                    self.store.delete(id);
                    self.sel = self.sel.min(self.store.images().len().saturating_sub(1));
                }
            }
            Action::Register => {
                let route = self.store.register();
                self.push(route);
            }
            Action::Retry => {
                if self.store.retry_save().is_some() {
                    self.status = Some(("retrying save".to_string(), false));
                }
            }
            Action::Reload => self.needs_reload = true,
            _ => {}
        }
    }

    fn on_detail(&mut self, id: ImageId, action: Action) {
        match action {
            Action::Back => self.focus_list(),
            Action::Delete => {
                self.store.delete(id);
                self.focus_list();
            }
            _ => {}
        }
    }

    fn on_create(&mut self, action: Action) {
        let Screen::Create { input } = &mut self.screen else {
            return;
        };
        match action {
            Action::Char(c) => input.push(c),
            Action::Backspace => {
                input.pop();
            }
            Action::Enter => {
                let uri = input.trim().to_string();
                self.submit_new(uri);
            }
            Action::Back => self.focus_list(),
            _ => {}
        }
    }

    fn submit_new(&mut self, uri: String) {
        if uri.is_empty() {
            self.status = Some(("enter a path or URI first".to_string(), true));
            return;
        }
        let res = next_id(self.store.images())
            .and_then(|id| self.store.insert(ImageRecord::new(id, uri)));
        match res {
            Ok(_) => self.focus_list(),
            Err(e) => self.status = Some((e.to_string(), true)),
        }
    }
}
