//! One-shot administrative actions.
//!
//! Actions run against any [`PanelStore`](xray_ui_core::PanelStore) and
//! collect what they did in a [`Report`] instead of printing directly, so the
//! command layer decides where output goes.

pub mod geoip;
pub mod setting;

/// Operator-facing outcome of an action.
#[derive(Debug, Default)]
pub struct Report {
    lines: Vec<String>,
    failures: usize,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an informational line.
    pub fn note(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Records a failed step.
    pub fn fail(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
        self.failures += 1;
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of steps that failed.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn is_success(&self) -> bool {
        self.failures == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_counted() {
        let mut report = Report::new();
        report.note("ok");
        assert!(report.is_success());

        report.fail("broken");
        report.fail("broken again");
        assert_eq!(report.failures(), 2);
        assert_eq!(report.lines().len(), 3);
    }
}
