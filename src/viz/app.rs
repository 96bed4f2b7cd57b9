use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, TryRecvError},
        Arc,
    },
    time::Duration,
};

use crossterm::event::{self, KeyCode};
use ratatui::{prelude::*, widgets::*};

use super::{
    components::{help::render_help, Board, Component, Logs, Plots},
    tui::{self, Tui},
    util::event_keycode,
    Message,
};

const TABS: [&str; 3] = ["Board", "Plots", "Logs"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum State {
    #[default]
    Running,
    /// The run has ended, keep showing the last frame until the user quits
    Finished,
    Quit,
}

/// The root TUI component which holds the main app state and runs the render loop
pub struct App {
    state: State,
    episode: usize,
    total_episodes: usize,
    selected_tab: usize,
    show_help: bool,
    board: Board,
    plots: Plots,
    logs: Logs,
    quit: Arc<AtomicBool>,
}

impl App {
    pub fn new(plots: &[&'static str], episodes: usize, quit: Arc<AtomicBool>) -> Self {
        Self {
            state: Default::default(),
            episode: 0,
            total_episodes: episodes,
            selected_tab: 0,
            show_help: false,
            board: Board::default(),
            plots: Plots::new(plots.to_vec(), episodes),
            logs: Logs::new(),
            quit,
        }
    }

    /// Run the main loop on an initialized terminal
    ///
    /// Restores the terminal on exit, even if drawing failed
    pub(crate) fn run(&mut self, mut terminal: Tui, rx: Receiver<Message>) -> io::Result<()> {
        let result = self.main_loop(&mut terminal, &rx);
        tui::restore()?;
        result
    }

    fn main_loop(&mut self, terminal: &mut Tui, rx: &Receiver<Message>) -> io::Result<()> {
        while self.state != State::Quit {
            if self.state == State::Running {
                self.drain(rx);
            }

            terminal.draw(|frame| frame.render_widget(&*self, frame.size()))?;

            if event::poll(Duration::from_millis(16))? {
                let event = event::read()?;
                self.handle_event(&event);
            }
        }
        Ok(())
    }

    fn drain(&mut self, rx: &Receiver<Message>) {
        loop {
            match rx.try_recv() {
                Ok(Message::Plot(update)) => {
                    self.episode = update.episode + 1;
                    self.plots.update(update);
                }
                Ok(Message::Board(snapshot)) => self.board.update(snapshot),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::info!("Run finished, press q to exit");
                    self.state = State::Finished;
                    break;
                }
            }
        }
    }

    fn handle_event(&mut self, event: &event::Event) {
        if self.selected_tab == 2 && !self.show_help && self.logs.handle_ui_event(event) {
            return;
        }
        if self.selected_tab == 1 && !self.show_help && self.plots.handle_ui_event(event) {
            return;
        }

        let Some(key) = event_keycode(event) else {
            return;
        };
        match key {
            KeyCode::Char('q') => {
                self.quit.store(true, Ordering::Relaxed);
                self.state = State::Quit;
            }
            KeyCode::Char('h') => self.show_help = !self.show_help,
            KeyCode::Tab => self.selected_tab = (self.selected_tab + 1) % TABS.len(),
            KeyCode::Esc => self.show_help = false,
            _ => {}
        }
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Layout
        let [menu_area, main_area, progress_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(3),
        ])
        .areas(area);

        // Menu
        Tabs::new(TABS)
            .block(Block::default().padding(Padding::uniform(1)))
            .white()
            .bold()
            .highlight_style(Style::default().light_green())
            .select(self.selected_tab)
            .render(menu_area, buf);

        // Main
        match self.selected_tab {
            0 => self.board.render_ref(main_area, buf),
            1 => self.plots.render_ref(main_area, buf),
            2 => self.logs.render_ref(main_area, buf),
            _ => {}
        }

        // Progress Bar
        let title = match self.state {
            State::Finished => "Progress (finished, q to exit)",
            _ => "Progress",
        };
        let ratio = if self.total_episodes == 0 {
            1.0
        } else {
            (self.episode as f64 / self.total_episodes as f64).min(1.0)
        };
        Gauge::default()
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .title(title),
            )
            .gauge_style(Color::Cyan)
            .ratio(ratio)
            .render(progress_area, buf);

        if self.show_help {
            render_help(area, buf, self.selected_tab);
        }
    }
}
