use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = app.booked_rows();
    let title = format!(" Booked Events ({}) ", rows.len());
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    // The indicator stands in for the table until the first snapshot arrives
    if rows.is_empty() {
        let status = app.sync_status();
        let message = status.indicator.message().unwrap_or("No booked events");
        let paragraph = Paragraph::new(Line::from(Span::styled(
            format!(" {}", message),
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new([
        Cell::from("Date"),
        Cell::from("Event ID"),
        Cell::from("Customer"),
        Cell::from("Type"),
    ])
    .style(styles::title_style())
    .height(1);

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.date.as_str()),
                Cell::from(row.event_id.as_str()),
                Cell::from(row.customer_name.as_str()),
                Cell::from(row.event_type.as_str()),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(12), // Date: "10-01-2024"
        Constraint::Length(14), // Event ID
        Constraint::Fill(1),    // Customer
        Constraint::Percentage(25),
    ];

    let table = Table::new(table_rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.booked_selection));

    frame.render_stateful_widget(table, area, &mut state);
}
