use ratatui::{prelude::*, widgets::*};

use crate::{
    runner::Phase,
    viz::{util::cell_color, Snapshot},
};

/// Width and height of one square in terminal cells
const SQUARE: (u16, u16) = (8, 4);

/// The most recent board snapshot with its episode statistics
#[derive(Default)]
pub struct Board {
    snapshot: Option<Snapshot>,
}

impl Board {
    pub fn update(&mut self, snapshot: Snapshot) {
        self.snapshot = Some(snapshot);
    }
}

impl WidgetRef for Board {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title("Board");
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(snapshot) = &self.snapshot else {
            Paragraph::new("Waiting for the first rendered episode...")
                .dark_gray()
                .alignment(Alignment::Center)
                .render(inner, buf);
            return;
        };

        let [grid_area, stats_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);

        let phase = match snapshot.phase {
            Phase::Train => "Training",
            Phase::Evaluate => "Testing",
        };
        let stats = Line::from(vec![
            Span::from(format!("{phase}  ")).light_green().bold(),
            Span::from(format!("Episode: {}   ", snapshot.episode)),
            Span::from(format!("Reward: {:.2}   ", snapshot.total_reward)),
            Span::from(format!("Epsilon: {:.3}", snapshot.epsilon)),
        ]);
        Paragraph::new(stats)
            .alignment(Alignment::Center)
            .render(stats_area, buf);

        let size = snapshot.grid.size() as u16;
        let (w, h) = SQUARE;
        let origin_x = grid_area.x + grid_area.width.saturating_sub(size * w) / 2;
        let origin_y = grid_area.y + grid_area.height.saturating_sub(size * h) / 2;

        for (r, row) in snapshot.grid.rows().enumerate() {
            for (c, &cell) in row.iter().enumerate() {
                let square = Rect::new(origin_x + c as u16 * w, origin_y + r as u16 * h, w, h)
                    .intersection(grid_area);
                if square.is_empty() {
                    continue;
                }
                Block::bordered()
                    .border_style(Style::new().black())
                    .style(Style::new().bg(cell_color(cell)))
                    .render(square, buf);
            }
        }
    }
}
