use ratatui::backend::TestBackend;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;

use crate::worker::WorkerId;

/// Cells of a box reserved for brackets, percentage and margins around the
/// progress bar.
pub const PROGRESS_BAR_MARGIN: u16 = 14;
/// Cells of a box reserved for the pid and elapsed columns around the status.
pub const STATUS_COLUMN_MARGIN: u16 = 25;

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %I:%M:%S";

/// Fixed-width bar: `width` fill cells plus a two-decimal percentage.
/// Assumes pre-clamped input; a zero total renders as 0% with no division.
pub fn progress_bar(value: f64, total: f64, width: usize) -> String {
    let percentage = if total > 0.0 { value / total } else { 0.0 };
    let filled = ((width as f64) * percentage).floor() as usize;
    let filled = filled.min(width);
    format!(
        "[{}{}] {:>6.2}%",
        "#".repeat(filled),
        " ".repeat(width - filled),
        percentage * 100.0
    )
}

/// `<pid>`, status truncated to the box, elapsed seconds right-aligned.
pub fn status_line(id: WorkerId, status: &str, elapsed_secs: f64, box_width: u16) -> String {
    let width = usize::from(box_width.saturating_sub(STATUS_COLUMN_MARGIN));
    let display = format!("<{id}>");
    let status = status.chars().take(width).collect::<String>();
    format!("{display:<8} {status:<width$} {elapsed_secs:>10.1}s")
}

pub fn current_clock(time_format: &str) -> String {
    chrono::Local::now().format(time_format).to_string()
}

/// Worker tile: border, status row, bar row. Rendered through a test-backend
/// terminal and returned as text rows for the canvas.
pub fn render_worker_box(
    id: WorkerId,
    status: &str,
    value: f64,
    total_steps: f64,
    elapsed_secs: f64,
    width: u16,
    height: u16,
) -> Vec<String> {
    let bar_width = usize::from(width.saturating_sub(PROGRESS_BAR_MARGIN));
    let status_row = format!(" {}", status_line(id, status, elapsed_secs, width));
    let bar_row = format!(" {}", progress_bar(value, total_steps, bar_width));

    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).expect("terminal");
    terminal
        .draw(|frame| {
            let tile = Paragraph::new(vec![Line::from(status_row), Line::from(bar_row)])
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(tile, frame.size());
        })
        .expect("draw");

    let buffer = terminal.backend().buffer().clone();
    (0..height)
        .map(|y| {
            (0..width)
                .map(|x| buffer.get(x, y).symbol())
                .collect::<String>()
        })
        .collect()
}

/// Title row plus rule, clock right-aligned with a one-cell margin.
pub fn header_lines(title: &str, clock: &str, width: u16) -> [String; 2] {
    let width = usize::from(width);
    [
        split_line(&format!(" {title}"), clock, width),
        horizontal_rule(width),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct FooterView {
    pub process_count: usize,
    pub app: Option<(f64, f64)>,
    pub elapsed_secs: f64,
    pub width: u16,
}

/// Rule plus the summary row: process count and scroll legend on the left,
/// aggregate bar centered when active, total runtime on the right.
pub fn footer_lines(view: &FooterView, legend: &str) -> [String; 2] {
    let width = usize::from(view.width);
    let left = format!(" {} Processes  {legend}", view.process_count);
    let right = format!("{:>10.1}s", view.elapsed_secs);
    let bar = view.app.map(|(value, total)| {
        let bar_width = usize::from((view.width / 2).saturating_sub(PROGRESS_BAR_MARGIN));
        progress_bar(value, total, bar_width)
    });
    [
        horizontal_rule(width),
        three_way_line(&left, bar.as_deref(), &right, width),
    ]
}

pub fn horizontal_rule(width: usize) -> String {
    "─".repeat(width)
}

fn split_line(left: &str, right: &str, width: usize) -> String {
    let left_len = left.chars().count();
    let right_len = right.chars().count();
    if left_len + right_len + 2 > width {
        return left.chars().take(width).collect();
    }
    let pad = width - left_len - right_len - 1;
    format!("{left}{}{right} ", " ".repeat(pad))
}

fn three_way_line(left: &str, center: Option<&str>, right: &str, width: usize) -> String {
    let Some(center) = center else {
        return split_line(left, right, width);
    };
    let mut cells = vec![' '; width];
    write_at(&mut cells, 0, left);
    let center_len = center.chars().count();
    write_at(&mut cells, width.saturating_sub(center_len) / 2, center);
    let right_len = right.chars().count();
    write_at(
        &mut cells,
        width.saturating_sub(right_len + 1),
        right,
    );
    cells.into_iter().collect()
}

fn write_at(cells: &mut [char], start: usize, text: &str) {
    for (offset, ch) in text.chars().enumerate() {
        let Some(cell) = cells.get_mut(start + offset) else {
            return;
        };
        *cell = ch;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        footer_lines, header_lines, progress_bar, render_worker_box, status_line, FooterView,
    };

    #[test]
    fn bar_has_exactly_width_fill_cells() {
        let bar = progress_bar(42.0, 100.0, 20);
        // "[" + 20 cells + "] " + 7-char percentage
        assert_eq!(bar.chars().count(), 20 + 10);
        assert_eq!(bar.chars().filter(|c| *c == '#').count(), 8);
        assert!(bar.ends_with(" 42.00%"));
    }

    #[test]
    fn bar_is_monotonic_in_value() {
        let mut previous = 0;
        for value in 0..=100 {
            let bar = progress_bar(f64::from(value), 100.0, 33);
            let filled = bar.chars().filter(|c| *c == '#').count();
            assert!(filled >= previous, "filled dropped at value {value}");
            previous = filled;
        }
    }

    #[test]
    fn zero_total_renders_zero_percent() {
        let bar = progress_bar(0.0, 0.0, 10);
        assert!(bar.contains("0.00%"));
        assert_eq!(bar.chars().filter(|c| *c == '#').count(), 0);
    }

    #[test]
    fn full_bar_reads_one_hundred_percent() {
        let bar = progress_bar(10.0, 10.0, 10);
        assert_eq!(bar.chars().filter(|c| *c == '#').count(), 10);
        assert!(bar.ends_with("100.00%"));
    }

    #[test]
    fn status_is_truncated_to_the_box_not_in_storage() {
        let line = status_line(12, &"x".repeat(200), 3.25, 40);
        assert!(line.starts_with("<12>"));
        assert!(line.ends_with("3.2s") || line.ends_with("3.3s"));
        assert_eq!(line.chars().filter(|c| *c == 'x').count(), 15);
    }

    #[test]
    fn worker_box_is_bordered_and_sized() {
        let rows = render_worker_box(7, "Iteration #3", 3.0, 10.0, 1.0, 40, 4);
        assert_eq!(rows.len(), 4);
        for row in &rows {
            assert_eq!(row.chars().count(), 40);
        }
        assert!(rows[0].starts_with('┌'));
        assert!(rows[1].contains("<7>"));
        assert!(rows[1].contains("Iteration #3"));
        assert!(rows[2].contains('#'));
        assert!(rows[3].ends_with('┘'));
    }

    #[test]
    fn header_is_exactly_two_rows_of_screen_width() {
        let [title_row, rule] = header_lines("demo", "2015-06-01 10:00:00", 80);
        assert_eq!(title_row.chars().count(), 80);
        assert!(title_row.starts_with(" demo"));
        assert!(title_row.ends_with("2015-06-01 10:00:00 "));
        assert_eq!(rule.chars().count(), 80);
    }

    #[test]
    fn footer_shows_count_and_optional_app_bar() {
        let without_bar = footer_lines(
            &FooterView {
                process_count: 3,
                app: None,
                elapsed_secs: 12.0,
                width: 80,
            },
            "[s down  w up]",
        );
        assert!(without_bar[1].contains("3 Processes"));
        assert!(!without_bar[1].contains('#'));

        let with_bar = footer_lines(
            &FooterView {
                process_count: 3,
                app: Some((25.0, 50.0)),
                elapsed_secs: 12.0,
                width: 80,
            },
            "[s down  w up]",
        );
        assert!(with_bar[1].contains("50.00%"));
        assert_eq!(with_bar[1].chars().count(), 80);
    }
}
