use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use studiobook_core::utils::truncate_string;

use crate::app::{App, SCHEDULE_PINNED_COLUMNS};
use crate::ui::styles;

/// Width of a scrolled (non-pinned) schedule column
const SCROLL_COLUMN_WIDTH: u16 = 14;

/// Gap ratatui leaves between table columns
const COLUMN_SPACING: u16 = 1;

fn column_title(index: usize) -> String {
    match index {
        0 => "Date".to_string(),
        1 => "Event ID".to_string(),
        n => format!("Col {}", n + 1),
    }
}

fn column_width(index: usize) -> u16 {
    match index {
        0 => 12,
        1 => 14,
        _ => SCROLL_COLUMN_WIDTH,
    }
}

/// Cells drawn for a table `width` wide: the pinned ones, then as many
/// scrolled columns from `offset` as fit (at least one).
fn visible_columns(total: usize, offset: usize, width: u16) -> Vec<usize> {
    let pinned = total.min(SCHEDULE_PINNED_COLUMNS);
    let mut columns: Vec<usize> = (0..pinned).collect();

    // Borders take two cells
    let pinned_width: u16 = columns
        .iter()
        .map(|&i| column_width(i) + COLUMN_SPACING)
        .sum();
    let room = width.saturating_sub(2).saturating_sub(pinned_width);
    let fits = (room / (SCROLL_COLUMN_WIDTH + COLUMN_SPACING)).max(1) as usize;

    columns.extend((pinned + offset..total).take(fits));
    columns
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.schedule_column_count();
    let columns = visible_columns(total, app.schedule_column_offset, area.width);

    let title = match (columns.last(), total > columns.len()) {
        (Some(last), true) => format!(
            " Schedule ({}) - columns {}-{} of {}, ←/→ to scroll ",
            app.schedule.len(),
            columns.get(SCHEDULE_PINNED_COLUMNS).map(|i| i + 1).unwrap_or(1),
            last + 1,
            total
        ),
        _ => format!(" Schedule ({}) ", app.schedule.len()),
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if app.schedule.is_empty() {
        let (message, style) = match app.schedule_status.message() {
            Some(msg) if app.status_is_error() => (msg, styles::error_style()),
            Some(msg) => (msg, styles::muted_style()),
            None => ("No scheduled events", styles::muted_style()),
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(format!(" {}", message), style)))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(columns.iter().map(|&i| Cell::from(column_title(i))))
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = app
        .schedule
        .iter()
        .map(|row| {
            let cells = columns.iter().map(|&i| {
                let text = row.cells.get(i).map(String::as_str).unwrap_or("");
                Cell::from(truncate_string(text, column_width(i) as usize))
            });
            Row::new(cells).style(styles::list_item_style())
        })
        .collect();

    let widths: Vec<Constraint> = columns
        .iter()
        .map(|&i| Constraint::Length(column_width(i)))
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(COLUMN_SPACING)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.schedule_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use studiobook_core::models::ScheduleRow;
    use studiobook_core::{ApiClient, CacheManager, Config};
    use tempfile::TempDir;

    fn wide_row() -> ScheduleRow {
        ScheduleRow {
            cells: (0..24).map(|i| format!("c{:02}", i)).collect(),
        }
    }

    fn draw(app: &App, width: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, 8)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render(frame, app, area);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn test_app(dir: &TempDir) -> App {
        let api = ApiClient::new("http://127.0.0.1:9/exec").unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        let mut app = App::from_parts(Config::default(), api, cache);
        app.schedule = vec![wide_row()];
        app
    }

    #[test]
    fn test_column_titles() {
        assert_eq!(column_title(0), "Date");
        assert_eq!(column_title(1), "Event ID");
        assert_eq!(column_title(2), "Col 3");
    }

    #[test]
    fn test_visible_columns_keep_pinned_and_scroll() {
        assert_eq!(visible_columns(24, 0, 400).len(), 24);
        assert_eq!(visible_columns(24, 0, 100), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(visible_columns(24, 21, 100), vec![0, 1, 23]);
        assert_eq!(visible_columns(1, 0, 100), vec![0]);
        // Always at least one scrolled column
        assert_eq!(visible_columns(24, 6, 10), vec![0, 1, 8]);
    }

    #[test]
    fn test_wide_terminal_shows_every_column() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir);
        let screen = draw(&app, 400);
        for cell in ["c00", "c01", "c07", "c08", "c23"] {
            assert!(screen.contains(cell), "missing {}", cell);
        }
    }

    #[test]
    fn test_narrow_terminal_scrolls_to_late_date_columns() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        let screen = draw(&app, 100);
        assert!(screen.contains("c00") && screen.contains("c02"));
        assert!(!screen.contains("c08"));

        app.scroll_schedule_columns(6);
        let screen = draw(&app, 100);
        assert!(screen.contains("c08"));
        assert!(screen.contains("c01"));

        app.scroll_schedule_columns(100);
        let screen = draw(&app, 100);
        assert!(screen.contains("c23"));
        assert!(screen.contains("c00"));
    }
}
