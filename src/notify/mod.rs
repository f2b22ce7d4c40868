pub mod smtp;

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::report::Report;

pub use smtp::SmtpNotifier;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, report: &Report) -> Result<()>;
}

/// Prints the report instead of mailing it.
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, report: &Report) -> Result<()> {
        println!("Subject: {}\n\n{}", report.subject, report.html);
        Ok(())
    }
}

/// Keeps every report in memory instead of sending it.
#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Report>>,
}

impl MemoryNotifier {
    pub fn sent(&self) -> Vec<Report> {
        self.sent
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, report: &Report) -> Result<()> {
        let mut guard = self
            .sent
            .lock()
            .map_err(|_| anyhow::anyhow!("memory notifier mutex poisoned"))?;
        guard.push(report.clone());
        Ok(())
    }
}
