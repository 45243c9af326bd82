//! Per-directory progress reporting for the ingestion loop.
//!
//! Reporting is advisory: implementations return errors, and the ingestion
//! loop logs and ignores them.

use kdam::{Bar, BarBuilder, BarExt};

pub trait Progress {
    /// Mark one more directory as processed.
    fn advance(&mut self) -> std::io::Result<()>;

    /// Called once after the last directory.
    fn finish(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Terminal progress bar on stderr showing processed/total, elapsed and ETA.
pub struct TerminalProgress {
    bar: Bar,
}

impl TerminalProgress {
    pub fn new(total: usize) -> Result<Self, String> {
        let bar = BarBuilder::default()
            .total(total)
            .desc("Indexing documents")
            .unit("dir")
            .build()?;
        Ok(Self { bar })
    }
}

impl Progress for TerminalProgress {
    fn advance(&mut self) -> std::io::Result<()> {
        self.bar.update(1).map(|_| ())
    }

    fn finish(&mut self) -> std::io::Result<()> {
        self.bar.refresh()?;
        eprintln!();
        Ok(())
    }
}

/// Reporter that shows nothing, used when the bar cannot be created.
#[derive(Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn advance(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Build the terminal bar, falling back to [`NoProgress`] if that fails.
pub fn terminal_or_silent(total: usize) -> Box<dyn Progress> {
    match TerminalProgress::new(total) {
        Ok(bar) => Box::new(bar),
        Err(e) => {
            tracing::debug!(error = %e, "progress bar unavailable");
            Box::new(NoProgress)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_reporter_accepts_every_call() {
        let mut progress = NoProgress;
        for _ in 0..3 {
            assert!(progress.advance().is_ok());
        }
        assert!(progress.finish().is_ok());
    }

    #[test]
    fn terminal_bar_counts_directories() {
        let mut progress = TerminalProgress::new(2).unwrap();
        progress.advance().unwrap();
        progress.advance().unwrap();
        assert_eq!(progress.bar.counter, 2);
        progress.finish().unwrap();
    }

    #[test]
    fn factory_handles_an_empty_tree() {
        let mut progress = terminal_or_silent(0);
        assert!(progress.finish().is_ok());
    }
}
