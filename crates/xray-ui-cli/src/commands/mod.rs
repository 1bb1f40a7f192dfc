//! Subcommand implementations.
//!
//! Each command opens the panel database once, runs its action and prints
//! the outcome on stdout.

pub mod geoip;
pub mod run;
pub mod setting;
pub mod v2ui;

use crate::actions::Report;

fn print_report(report: &Report) {
    for line in report.lines() {
        println!("{line}");
    }
}
