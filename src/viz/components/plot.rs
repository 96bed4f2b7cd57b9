use std::collections::VecDeque;

use crossterm::event::{Event, KeyCode};
use ratatui::{prelude::*, style::Stylize, widgets::*};

use crate::viz::{util::event_keycode, Update};

use super::Component;

/// Number of points in the moving average line
const SMOOTHING: usize = 50;

/// Scatter plot of one per-episode metric with its moving average
pub struct Plot {
    title: String,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    data: Vec<(f64, f64)>,
    average: Vec<(f64, f64)>,
    window: VecDeque<f64>,
}

impl Plot {
    pub fn new(title: &str, episodes: usize) -> Self {
        Self {
            title: String::from(title),
            x_bounds: [0.0, episodes.max(1) as f64],
            y_bounds: [f64::MAX, f64::MIN],
            data: Vec::new(),
            average: Vec::new(),
            window: VecDeque::with_capacity(SMOOTHING),
        }
    }

    pub fn update(&mut self, point: (f64, f64)) {
        let (x, y) = point;
        self.x_bounds[1] = self.x_bounds[1].max(x);
        self.y_bounds[0] = self.y_bounds[0].min(y);
        self.y_bounds[1] = self.y_bounds[1].max(y);
        self.data.push(point);

        if self.window.len() == SMOOTHING {
            self.window.pop_front();
        }
        self.window.push_back(y);
        let mean = self.window.iter().sum::<f64>() / self.window.len() as f64;
        self.average.push((x, mean));
    }

    fn labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
        bounds.iter().map(|x| format!("{x:.2}").bold()).collect()
    }
}

impl WidgetRef for Plot {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(self.title.as_str())
            .padding(Padding::uniform(1));

        if self.data.is_empty() {
            Paragraph::new("No episodes yet")
                .dark_gray()
                .block(block)
                .render(area, buf);
            return;
        }

        let datasets = vec![
            Dataset::default()
                .name(self.title.as_str())
                .marker(Marker::Braille)
                .graph_type(GraphType::Scatter)
                .cyan()
                .data(&self.data),
            Dataset::default()
                .name(format!("mean of last {SMOOTHING}"))
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .yellow()
                .data(&self.average),
        ];

        let x_axis = Axis::default()
            .title("Episode")
            .dark_gray()
            .labels(Self::labels(self.x_bounds))
            .bounds(self.x_bounds);

        let y_axis = Axis::default()
            .title(self.title.as_str())
            .dark_gray()
            .labels(Self::labels(self.y_bounds))
            .bounds(self.y_bounds);

        Chart::new(datasets)
            .block(block)
            .x_axis(x_axis)
            .y_axis(y_axis)
            .render(area, buf);
    }
}

/// One [`Plot`] per metric, shown one at a time
pub struct Plots {
    plot_names: Vec<&'static str>,
    plots: Vec<Plot>,
    selected: usize,
}

impl Plots {
    pub fn new(names: Vec<&'static str>, episodes: usize) -> Self {
        let plots = names.iter().map(|k| Plot::new(k, episodes)).collect();
        Self {
            plot_names: names,
            plots,
            selected: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.plot_names.len()
    }

    pub fn next_plot(&mut self) {
        self.selected = (self.selected + 1) % self.len()
    }

    pub fn prev_plot(&mut self) {
        let len = self.len();
        self.selected = (self.selected + len - 1) % len;
    }

    pub fn update(&mut self, update: Update) {
        let Update { episode, data } = update;
        for (plot, metric) in self.plots.iter_mut().zip(data) {
            plot.update((episode as f64, metric));
        }
    }
}

impl WidgetRef for Plots {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let [tabs_area, plot_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);

        Tabs::new(self.plot_names.iter().copied())
            .white()
            .highlight_style(Style::default().light_green())
            .select(self.selected)
            .render(tabs_area, buf);

        if let Some(plot) = self.plots.get(self.selected) {
            plot.render_ref(plot_area, buf);
        }
    }
}

impl Component for Plots {
    fn handle_ui_event(&mut self, event: &Event) -> bool {
        if self.len() == 0 {
            return false;
        }
        match event_keycode(event) {
            Some(KeyCode::Left) => self.prev_plot(),
            Some(KeyCode::Right) => self.next_plot(),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_tracks_bounds_and_average() {
        let mut plot = Plot::new("Reward", 10);
        plot.update((0.0, -2.0));
        plot.update((1.0, 4.0));
        assert_eq!(plot.y_bounds, [-2.0, 4.0]);
        assert_eq!(plot.x_bounds, [0.0, 10.0]);
        assert_eq!(plot.average, vec![(0.0, -2.0), (1.0, 1.0)]);

        plot.update((12.0, 0.0));
        assert_eq!(plot.x_bounds[1], 12.0, "Bounds grow past the expected episodes");
    }

    #[test]
    fn plots_cycle() {
        let mut plots = Plots::new(vec!["Reward", "Steps"], 5);
        plots.update(Update {
            episode: 0,
            data: vec![1.0, 7.0],
        });
        assert_eq!(plots.plots[1].data, vec![(0.0, 7.0)]);

        plots.next_plot();
        assert_eq!(plots.selected, 1);
        plots.next_plot();
        assert_eq!(plots.selected, 0);
        plots.prev_plot();
        assert_eq!(plots.selected, 1);
    }
}
