use anyhow::Result;
use kanban_core::ordering::compactor::{DensityViolation, repair_store, verify_store};
use serde::Serialize;
use std::io::Write;

use crate::context::{Context, Reported};
use crate::output::render;

#[derive(Debug, Serialize)]
struct VerifyReport {
    ok: bool,
    violations: Vec<DensityViolation>,
}

#[derive(Debug, Serialize)]
struct RepairReport {
    renumbered: usize,
}

/// Check that every column's tasks and every board's columns hold the
/// positions `0..n`.
///
/// # Errors
///
/// Returns an error when the store cannot be read or any group is not dense.
pub fn run_verify(ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let violations = verify_store(&conn)?;
    let report = VerifyReport {
        ok: violations.is_empty(),
        violations,
    };

    render(ctx.output, &report, |report, w| {
        for violation in &report.violations {
            writeln!(
                w,
                "FAIL {} group {}: positions {:?}",
                violation.table, violation.group, violation.positions
            )?;
        }
        if report.ok {
            writeln!(w, "verify: positions are contiguous")?;
        } else {
            writeln!(w, "verify: run `kanban repair` to renumber")?;
        }
        Ok(())
    })?;

    if report.ok {
        Ok(())
    } else {
        Err(Reported(format!(
            "verify: {} group(s) out of order",
            report.violations.len()
        ))
        .into())
    }
}

/// Renumber every non-contiguous group in place.
///
/// # Errors
///
/// Returns an error when the store cannot be opened or written.
pub fn run_repair(ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let renumbered = repair_store(&conn).map_err(|err| ctx.fail(err))?;

    render(ctx.output, &RepairReport { renumbered }, |report, w| {
        if report.renumbered == 0 {
            writeln!(w, "repair: nothing to do")
        } else {
            writeln!(w, "repair: renumbered {} row(s)", report.renumbered)
        }
    })
}
