//! Pretty/text renderers for board records.

use chrono::{DateTime, Local, Utc};
use kanban_core::model::{BoardSummary, BoardView, Column, Subtask, TaskView};
use std::io::{self, Write};

use crate::output::{OutputMode, Renderable, pretty_kv, pretty_rule, pretty_section, render};

fn micros_to_local_datetime(us: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(us).map_or_else(
        || us.to_string(),
        |ts| {
            ts.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        },
    )
}

fn checkbox(done: bool) -> &'static str {
    if done { "[x]" } else { "[ ]" }
}

impl Renderable for BoardSummary {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "#{:<5} {:<32} {} columns",
            self.id, self.name, self.column_count
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}\t{}\t{}", self.id, self.name, self.column_count)
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "NAME", "COLUMNS"]
    }
}

impl Renderable for Column {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "Column #{} \"{}\" at position {} on board #{}",
            self.id, self.name, self.position, self.board_id
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            self.id, self.board_id, self.position, self.name
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "BOARD", "POSITION", "NAME"]
    }
}

impl Renderable for Subtask {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{} #{} {} (task #{})",
            checkbox(self.is_completed),
            self.id,
            self.title,
            self.task_id
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            self.id,
            self.task_id,
            u8::from(self.is_completed),
            self.title
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "TASK", "DONE", "TITLE"]
    }
}

impl Renderable for TaskView {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let task = &self.task;
        pretty_section(w, &format!("#{} {}", task.id, task.title))?;
        pretty_kv(w, "Column", format!("#{}", task.column_id))?;
        pretty_kv(w, "Position", task.position.to_string())?;
        pretty_kv(w, "Created", micros_to_local_datetime(task.created_at_us))?;
        pretty_kv(
            w,
            "Subtasks",
            format!("{} of {} done", self.completed_subtasks(), self.subtasks.len()),
        )?;
        if !task.description.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", task.description)?;
        }
        if !self.subtasks.is_empty() {
            writeln!(w)?;
            for subtask in &self.subtasks {
                writeln!(
                    w,
                    "  {} #{} {}",
                    checkbox(subtask.is_completed),
                    subtask.id,
                    subtask.title
                )?;
            }
        }
        Ok(())
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let task = &self.task;
        writeln!(
            w,
            "{}\t{}\t{}\t{}/{}\t{}",
            task.id,
            task.column_id,
            task.position,
            self.completed_subtasks(),
            self.subtasks.len(),
            task.title
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "COLUMN", "POSITION", "SUBTASKS", "TITLE"]
    }
}

/// Pretty board tree: one section per column, tasks in position order.
pub fn write_board_pretty(board: &BoardView, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{} (#{})", board.board.name, board.board.id)?;
    pretty_rule(w)?;
    for view in &board.columns {
        let count = view.tasks.len();
        writeln!(
            w,
            "{} (#{}) · {count} {}",
            view.column.name,
            view.column.id,
            if count == 1 { "task" } else { "tasks" }
        )?;
        for task in &view.tasks {
            write!(w, "  {:>3}  #{:<5} {}", task.task.position, task.task.id, task.task.title)?;
            if task.subtasks.is_empty() {
                writeln!(w)?;
            } else {
                writeln!(
                    w,
                    "  [{}/{}]",
                    task.completed_subtasks(),
                    task.subtasks.len()
                )?;
            }
        }
    }
    Ok(())
}

/// Text board rows: one line per task, columns with no tasks get one line.
pub fn write_board_text(board: &BoardView, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "COLUMN_ID\tCOLUMN\tPOSITION\tTASK_ID\tTITLE")?;
    for view in &board.columns {
        if view.tasks.is_empty() {
            writeln!(w, "{}\t{}\t-\t-\t-", view.column.id, view.column.name)?;
        }
        for task in &view.tasks {
            writeln!(
                w,
                "{}\t{}\t{}\t{}\t{}",
                view.column.id, view.column.name, task.task.position, task.task.id, task.task.title
            )?;
        }
    }
    Ok(())
}

/// Render a board tree to stdout in `mode`.
pub fn render_board(board: &BoardView, mode: OutputMode) -> anyhow::Result<()> {
    render(mode, board, |board, w| match mode {
        OutputMode::Text => write_board_text(board, w),
        OutputMode::Pretty | OutputMode::Json => write_board_pretty(board, w),
    })
}
