pub mod install;
pub mod reset;
pub mod restart;
pub mod start;
pub mod stop;
pub mod uninstall;
pub mod update;

use ambar::ActionReport;

/// Print best-effort failures collected during an action.
pub(crate) fn print_warnings(report: &ActionReport) {
    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }
}

/// Print where the frontend is reachable, if the action started it.
pub(crate) fn print_frontend(report: &ActionReport) {
    if let Some(frontend) = &report.frontend {
        println!("Ambar is on {}", frontend);
    }
}
