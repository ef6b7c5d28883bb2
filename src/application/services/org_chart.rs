//! Org chart service
//!
//! Loads raw org charts through the filesystem boundary, runs the cleaning
//! pipeline and writes results back out.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::application::error_ext::ResultPathExt;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{rejected_labels, OrgNode, Pipeline, PipelineOptions};
use crate::infrastructure::traits::FileSystem;

/// Raw and cleaned chart from one run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub raw: OrgNode,
    pub cleaned: OrgNode,
}

/// Before/after figures of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartStats {
    pub raw_nodes: usize,
    pub cleaned_nodes: usize,
    pub raw_depth: usize,
    pub cleaned_depth: usize,
    pub raw_top_level: usize,
    pub cleaned_top_level: usize,
    /// Raw labels dropped as noise (their subtrees go with them)
    pub rejected: Vec<String>,
}

/// Service for cleaning org charts.
pub struct OrgChartService {
    fs: Arc<dyn FileSystem>,
    pipeline: Pipeline,
}

impl OrgChartService {
    /// Create a new org chart service.
    pub fn new(fs: Arc<dyn FileSystem>, options: PipelineOptions) -> Self {
        Self {
            fs,
            pipeline: Pipeline::from(options),
        }
    }

    /// Read and parse a raw org chart JSON file.
    #[instrument(skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<OrgNode> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::InputNotFound(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read org chart", path)?;
        let chart = OrgNode::from_json_str(&content)?;
        debug!(
            "load: {} top-level labels, {} nodes",
            chart.len(),
            chart.node_count()
        );
        Ok(chart)
    }

    /// Run the cleaning pipeline on an in-memory chart.
    pub fn process(&self, raw: &OrgNode) -> OrgNode {
        self.pipeline.process(raw)
    }

    /// Load and clean a chart file.
    #[instrument(skip(self))]
    pub fn process_file(&self, path: &Path) -> ApplicationResult<ProcessOutput> {
        let raw = self.load(path)?;
        let cleaned = self.process(&raw);
        info!(
            "processed {}: {} -> {} nodes",
            path.display(),
            raw.node_count(),
            cleaned.node_count()
        );
        Ok(ProcessOutput { raw, cleaned })
    }

    /// Write a chart as pretty-printed JSON.
    pub fn write_json(&self, path: &Path, chart: &OrgNode) -> ApplicationResult<()> {
        self.write(path, &to_json(chart)?)
    }

    /// Write rendered output, creating parent directories.
    #[instrument(skip(self, content))]
    pub fn write(&self, path: &Path, content: &str) -> ApplicationResult<()> {
        self.fs
            .ensure_parent(path)
            .with_path_context("create parent directory", path)?;
        self.fs
            .write(path, content)
            .with_path_context("write output", path)?;
        Ok(())
    }

    /// Compare a raw chart with its cleaned result.
    pub fn stats(&self, raw: &OrgNode, cleaned: &OrgNode) -> ChartStats {
        ChartStats {
            raw_nodes: raw.node_count(),
            cleaned_nodes: cleaned.node_count(),
            raw_depth: raw.depth(),
            cleaned_depth: cleaned.depth(),
            raw_top_level: raw.len(),
            cleaned_top_level: cleaned.len(),
            rejected: rejected_labels(raw),
        }
    }
}

/// Pretty-printed JSON with a trailing newline.
pub fn to_json(chart: &OrgNode) -> ApplicationResult<String> {
    let mut json =
        serde_json::to_string_pretty(chart).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize org chart".into(),
            source: Box::new(e),
        })?;
    json.push('\n');
    Ok(json)
}
