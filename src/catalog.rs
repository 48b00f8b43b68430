//! 服务目录加载
//!
//! 启动时从 CSV 一次性加载，运行期间只读。

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// 目录中的一条修补服务记录
///
/// Column names follow the flat dataset the embedding bundle was
/// precomputed from, so row ids line up between the two files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogRecord {
    #[serde(rename = "Type of Repairer")]
    pub repairer_type: String,
    #[serde(rename = "Type of category")]
    pub category: String,
    #[serde(rename = "Type of garment in category")]
    pub garment_type: String,
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Estimated time in hours")]
    pub estimated_hours: Option<f64>,
}

/// 只读服务目录
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Arc<Vec<CatalogRecord>>,
}

impl Catalog {
    pub fn load(path: &Path) -> AppResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut records = Vec::new();
        for (row, result) in reader.deserialize::<CatalogRecord>().enumerate() {
            let record = result
                .map_err(|e| AppError::Catalog(format!("row {}: {}", row + 1, e)))?;
            if record.service.is_empty() {
                return Err(AppError::Catalog(format!("row {}: empty service name", row + 1)));
            }
            if record.price < 0.0 {
                return Err(AppError::Catalog(format!(
                    "row {}: negative price {}",
                    row + 1,
                    record.price
                )));
            }
            if record.estimated_hours.is_some_and(|h| h < 0.0) {
                return Err(AppError::Catalog(format!("row {}: negative hours", row + 1)));
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(AppError::Catalog("catalog has no rows".to_string()));
        }

        tracing::info!(rows = records.len(), "catalog loaded");

        Ok(Self {
            records: Arc::new(records),
        })
    }

    pub fn from_records(records: Vec<CatalogRecord>) -> AppResult<Self> {
        if records.is_empty() {
            return Err(AppError::Catalog("catalog has no rows".to_string()));
        }
        Ok(Self {
            records: Arc::new(records),
        })
    }

    pub fn get(&self, row_id: usize) -> Option<&CatalogRecord> {
        self.records.get(row_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::tempdir;

    use super::*;

    const SAMPLE_CSV: &str = "\
Type of Repairer,Type of category,Type of garment in category,Service,Description,Price,Estimated time in hours
Tailor,Clothing,Dress,Tear repair,Mend a tear or rip in the fabric,350,1.5
Tailor,Clothing,Jacket,Zipper replacement,Replace a broken zipper,450,2
Cobbler,Shoes,Boots,Sole repair,Replace worn out soles,600,
";

    fn write_catalog(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn load_parses_rows_and_optional_hours() {
        let (_dir, path) = write_catalog(SAMPLE_CSV);
        let catalog = Catalog::load(&path).unwrap();

        assert_eq!(catalog.len(), 3);
        let first = catalog.get(0).unwrap();
        assert_eq!(first.service, "Tear repair");
        assert_eq!(first.price, 350.0);
        assert_eq!(first.estimated_hours, Some(1.5));

        let last = catalog.get(2).unwrap();
        assert_eq!(last.repairer_type, "Cobbler");
        assert_eq!(last.estimated_hours, None);
    }

    #[test]
    fn load_rejects_negative_price() {
        let csv = "\
Type of Repairer,Type of category,Type of garment in category,Service,Description,Price,Estimated time in hours
Tailor,Clothing,Dress,Tear repair,Mend a tear,-5,1
";
        let (_dir, path) = write_catalog(csv);
        let err = Catalog::load(&path).unwrap_err();
        assert!(matches!(err, AppError::Catalog(_)));
    }

    #[test]
    fn load_rejects_empty_catalog() {
        let csv = "\
Type of Repairer,Type of category,Type of garment in category,Service,Description,Price,Estimated time in hours
";
        let (_dir, path) = write_catalog(csv);
        assert!(matches!(
            Catalog::load(&path).unwrap_err(),
            AppError::Catalog(_)
        ));
    }
}
