use ratatui::{prelude::*, widgets::*};

fn key<'a>(key: &'a str, action: &'a str) -> Vec<Span<'a>> {
    vec![
        Span::from(key).light_cyan().bold(),
        Span::raw(" : "),
        Span::raw(action),
    ]
}

/// Draw the key binding popup for the selected tab over `area`
pub fn render_help(area: Rect, buf: &mut Buffer, selected_tab: usize) {
    let common = vec![
        key("  q  ", "Stop the run and exit"),
        key("  h  ", "Toggle help popup"),
        key(" Tab ", "Switch tabs"),
    ];

    let additional = match selected_tab {
        1 => vec![key("⬅ / ➡", "Switch plots")],
        2 => vec![
            key("  s  ", "Toggle the target selector"),
            key("  f  ", "Focus on the selected target only"),
            key("⬆ / ⬇", "Switch log target"),
            key("⬅ / ➡", "Show one level less/more"),
            key("- / +", "Capture one level less/more"),
            key("PgUp ", "Page mode, scroll up"),
            key("PgDn ", "Page mode, scroll down"),
            key(" Esc ", "Leave page mode"),
            key("Space", "Hide targets that are switched off"),
        ],
        _ => vec![],
    };

    let lines = [common, additional]
        .concat()
        .into_iter()
        .map(Line::from)
        .collect::<Vec<_>>();

    let [_, center_vert, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length((lines.len() + 4) as u16),
        Constraint::Fill(1),
    ])
    .areas(area);

    let [_, center, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(60),
        Constraint::Fill(1),
    ])
    .areas(center_vert);

    Clear.render(center, buf);

    Paragraph::new(lines)
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .padding(Padding::horizontal(1))
                .title("Help"),
        )
        .render(center, buf);
}
