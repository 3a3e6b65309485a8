use crate::tui::theme::*;
use imagedeck_core::{ImageId, ImageRecord, Phase, Route};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

pub enum Pane<'a> {
    Loading,
    List { images: &'a [ImageRecord], sel: usize, phase: Phase },
    Detail { id: ImageId, record: Option<&'a ImageRecord> },
    Create { input: &'a str, next_id: Option<ImageId> },
}

/// Last acknowledgment or error shown above the key help.
pub struct Status<'a> {
    pub text: &'a str,
    pub is_error: bool,
}

pub fn draw_ui(f: &mut Frame, area: Rect, pane: Pane, status: Option<Status>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let keys = match &pane {
        Pane::Loading => " q quit ",
        Pane::List { .. } => " ↑/k ↓/j select   Enter open   d delete   n register   r retry save   g reload   q quit ",
        Pane::Detail { .. } => " Esc back   d delete   q quit ",
        Pane::Create { .. } => " type a path or URI   Enter save   Esc cancel ",
    };

    match pane {
        Pane::Loading => draw_message(f, chunks[0], "Study", "Loading..."),
        Pane::List { images, sel, phase } => draw_list(f, chunks[0], images, sel, phase),
        Pane::Detail { id, record } => draw_detail(f, chunks[0], id, record),
        Pane::Create { input, next_id } => draw_create(f, chunks[0], input, next_id),
    }

    if let Some(s) = status {
        let style = if s.is_error { error_style() } else { hint_style() };
        f.render_widget(Paragraph::new(Line::from(Span::raw(s.text).style(style))), chunks[1]);
    }
    f.render_widget(Paragraph::new(keys).style(footer_style()), chunks[2]);
}

fn draw_message(f: &mut Frame, area: Rect, title: &str, msg: &str) {
    let p = Paragraph::new(msg.to_string())
        .wrap(Wrap { trim: true })
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    f.render_widget(p, area);
}

fn draw_list(f: &mut Frame, area: Rect, images: &[ImageRecord], sel: usize, phase: Phase) {
    match phase {
        Phase::Loading => return draw_message(f, area, "Study", "Loading..."),
        Phase::Empty => return draw_message(f, area, "Study", "No images registered. Press n to add one."),
        Phase::Failed(msg) => {
            return draw_message(f, area, "Study", &format!("Could not read saved images: {msg}"))
        }
        Phase::Populated => {}
    }

    let items: Vec<_> = images
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let line = Line::from(vec![
                Span::raw(format!("Image ID: {:<6}", r.id)).style(title_style()),
                Span::raw(r.uri.clone()),
            ]);
            let line = if i == sel { line.style(selected_style()) } else { line };
            ListItem::new(line)
        })
        .collect();

    let title = format!("Study ({})", images.len());
    let list = List::new(items).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(list, area);
}

fn draw_detail(f: &mut Frame, area: Rect, id: ImageId, record: Option<&ImageRecord>) {
    let route = Route::Detail { id }.path();
    let Some(r) = record else {
        return draw_message(f, area, &route, "This image no longer exists.");
    };
    let text = vec![
        Line::from(vec![Span::raw("id:  ").style(title_style()), Span::raw(r.id.to_string())]),
        Line::from(vec![Span::raw("uri: ").style(title_style()), Span::raw(r.uri.clone())]),
    ];
    let p = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(route).borders(Borders::ALL));
    f.render_widget(p, area);
}

fn draw_create(f: &mut Frame, area: Rect, input: &str, next_id: Option<ImageId>) {
    let header = match next_id {
        Some(id) => Span::raw(format!("New image ID: {id}")).style(hint_style()),
        None => Span::raw("No image ID left to assign").style(error_style()),
    };
    let text = vec![
        Line::from(header),
        Line::from(""),
        Line::from(vec![Span::raw("uri> ").style(title_style()), Span::raw(input.to_string())]),
    ];
    let p = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(Route::Create.path()).borders(Borders::ALL));
    f.render_widget(p, area);
}
