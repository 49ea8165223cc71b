use std::{io::Write, sync::Arc};

use log::{debug, warn};
use serde::Serialize;
use serde_json::json;
use tokio::{
    sync::mpsc::{self, Receiver},
    task,
};

use crate::{
    CrawlReport, DependentRecord, DependentsCrawler, DependentsInfo, RepositoryEnricher,
    StdResult, Target,
};

/// The number of dependents the crawl may get ahead of the writer.
pub const DEPENDENTS_BUFFER_SIZE: usize = 32;

/// How dependents are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One `owner/name` per line.
    Plain,

    /// One JSON object per dependent.
    Json {
        /// Whether the JSON is indented.
        pretty: bool,
    },
}

/// Renders dependents and info, enriching JSON records when an enricher is set.
pub struct OutputWriter {
    format: OutputFormat,
    enricher: Option<Arc<dyn RepositoryEnricher>>,
}

impl OutputWriter {
    /// Creates a new `OutputWriter` instance.
    pub fn new(format: OutputFormat, enricher: Option<Arc<dyn RepositoryEnricher>>) -> Self {
        Self { format, enricher }
    }

    fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T, pretty: bool) -> StdResult<()> {
        if pretty {
            serde_json::to_writer_pretty(&mut *out, value)?;
        } else {
            serde_json::to_writer(&mut *out, value)?;
        }
        writeln!(out)?;

        Ok(())
    }

    /// Writes one dependent.
    pub async fn write_dependent<W: Write + Send>(
        &self,
        out: &mut W,
        dependent: &DependentRecord,
    ) -> StdResult<()> {
        match self.format {
            OutputFormat::Plain => writeln!(out, "{dependent}")?,
            OutputFormat::Json { pretty } => {
                let mut record = json!({ "full_name": dependent });
                if let Some(enricher) = &self.enricher {
                    let (owner, name) = dependent.owner_and_name()?;
                    record["repo"] = enricher.enrich(&owner, &name).await?;
                }
                Self::write_json(out, &record, pretty)?;
            }
        }

        Ok(())
    }

    /// Writes every dependent received until the sending side is dropped.
    pub async fn run<W: Write + Send>(
        self,
        mut receiver: Receiver<DependentRecord>,
        mut out: W,
    ) -> StdResult<u32> {
        let mut total_written = 0;
        while let Some(dependent) = receiver.recv().await {
            self.write_dependent(&mut out, &dependent).await?;
            total_written += 1;
        }
        out.flush()?;
        debug!("Written {total_written} dependents");

        Ok(total_written)
    }

    /// Crawls the target and writes its dependents, until the limit is reached (0 for no limit).
    ///
    /// The crawl blocks while the writer is [DEPENDENTS_BUFFER_SIZE] dependents behind,
    /// and stops once the writer fails. A crawl error takes precedence over a writer error.
    pub async fn write_crawl<W: Write + Send + 'static>(
        self,
        crawler: &dyn DependentsCrawler,
        target: &Target,
        limit: u32,
        out: W,
    ) -> StdResult<CrawlReport> {
        let (sender, receiver) = mpsc::channel(DEPENDENTS_BUFFER_SIZE);
        let writer_handle = tokio::spawn(self.run(receiver, out));

        let mut total_sent = 0;
        let crawl_result = {
            let mut callback = |dependent: DependentRecord| {
                if task::block_in_place(|| sender.blocking_send(dependent)).is_err() {
                    warn!("Output writer stopped, cancelling the crawl");
                    return false;
                }
                total_sent += 1;

                limit == 0 || total_sent < limit
            };

            crawler.crawl(target, &mut callback).await
        };
        drop(sender);

        let writer_result = writer_handle.await?;
        let report = match crawl_result {
            Ok(report) => report,
            Err(crawl_error) => {
                if let Err(writer_error) = writer_result {
                    warn!("Output writer failed: {writer_error}");
                }
                return Err(crawl_error.into());
            }
        };
        let total_written = writer_result?;
        debug!("Output writer finished after {total_written} dependents");

        Ok(report)
    }

    /// Writes the dependents info as JSON.
    pub fn write_info<W: Write>(out: &mut W, info: &DependentsInfo, pretty: bool) -> StdResult<()> {
        Self::write_json(out, &json!({ "dependents": info }), pretty)
    }
}
