use crate::domain::model::{GeneratedReport, ReportResponse};
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// 寫出的檔案位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub pdf_path: PathBuf,
    pub json_path: PathBuf,
}

/// 把產生的報告寫到本機目錄
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn write_file(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        let full_path = self.base_path.join(name);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&full_path, data)?;
        tracing::debug!("Wrote {} bytes to {}", data.len(), full_path.display());
        Ok(full_path)
    }

    /// `report-<stamp>.pdf` 與 `report-<stamp>.json` (JSON 不含 PDF)
    pub fn save_report(&self, report: &GeneratedReport, stamp: &str) -> Result<SavedReport> {
        let json = serde_json::to_vec_pretty(&ReportResponse::without_document(report))?;
        let json_path = self.write_file(&format!("report-{}.json", stamp), &json)?;
        let pdf_path = self.write_file(&format!("report-{}.pdf", stamp), &report.document.bytes)?;
        Ok(SavedReport {
            pdf_path,
            json_path,
        })
    }
}
