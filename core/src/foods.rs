//! Static food-nutrition table, loaded once from CSV and read-only afterwards.
//!
//! All values are per 100 g (or 100 ml) of the food.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FoodRecord {
    pub name: String,
    pub energy_kcal: f64,
    pub carbs_g: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    /// Absent when the table has no sodium column or the cell is empty
    pub sodium_mg: Option<f64>,
    /// Absent when the table has no sugar column or the cell is empty
    pub sugar_g: Option<f64>,
}

/// One CSV row as it appears in the source table.
#[derive(Debug, Deserialize)]
struct FoodRow {
    #[serde(rename = "식품명")]
    name: String,
    #[serde(rename = "에너지(kcal)", default, deserialize_with = "csv::invalid_option")]
    energy_kcal: Option<f64>,
    #[serde(rename = "탄수화물(g)", default, deserialize_with = "csv::invalid_option")]
    carbs_g: Option<f64>,
    #[serde(rename = "단백질(g)", default, deserialize_with = "csv::invalid_option")]
    protein_g: Option<f64>,
    #[serde(rename = "지방(g)", default, deserialize_with = "csv::invalid_option")]
    fat_g: Option<f64>,
    #[serde(rename = "나트륨(mg)", default, deserialize_with = "csv::invalid_option")]
    sodium_mg: Option<f64>,
    #[serde(rename = "당류(g)", default, deserialize_with = "csv::invalid_option")]
    sugar_g: Option<f64>,
}

impl FoodRow {
    fn into_record(self) -> Option<FoodRecord> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return None;
        }
        Some(FoodRecord {
            name,
            energy_kcal: self.energy_kcal?,
            carbs_g: self.carbs_g?,
            protein_g: self.protein_g?,
            fat_g: self.fat_g?,
            sodium_mg: self.sodium_mg,
            sugar_g: self.sugar_g,
        })
    }
}

#[derive(Debug, Error)]
pub enum FoodTableError {
    #[error("음식 데이터 파일을 찾을 수 없습니다: {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("음식 데이터 파일을 읽는 중 오류가 발생했습니다: {0}")]
    Csv(#[from] csv::Error),
    #[error("음식 데이터 파일에 유효한 음식이 없습니다")]
    Empty,
}

#[derive(Debug, Default)]
pub struct FoodTable {
    records: Vec<FoodRecord>,
    index: HashMap<String, usize>,
}

impl FoodTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FoodTableError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| FoodTableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Parse a UTF-8 CSV with Korean column headers.
    ///
    /// Rows missing any of energy/carbs/protein/fat are skipped. When a name
    /// appears twice the first row wins.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FoodTableError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut table = FoodTable::default();
        let mut skipped = 0usize;
        for row in csv_reader.deserialize::<FoodRow>() {
            let Some(record) = row?.into_record() else {
                skipped += 1;
                continue;
            };
            if table.index.contains_key(&record.name) {
                tracing::warn!(food = %record.name, "Duplicate food row ignored");
                continue;
            }
            table.index.insert(record.name.clone(), table.records.len());
            table.records.push(record);
        }

        if skipped > 0 {
            tracing::warn!(skipped, "Food rows without complete macro values were skipped");
        }
        if table.records.is_empty() {
            return Err(FoodTableError::Empty);
        }
        Ok(table)
    }

    pub fn get(&self, name: &str) -> Option<&FoodRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Food names sorted for selection lists.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.records.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_CSV: &str = "\
식품명,에너지(kcal),탄수화물(g),단백질(g),지방(g),나트륨(mg),당류(g)
닭가슴살,109,0,31,1.2,45,0
현미밥,150,33,3,1,2,0.2
김치찌개,60,4,5,3,650,1.5
초코케이크,380,50,5,18,300,35
라면,450,60,10,17,1800,4
";

    pub(crate) fn sample_table() -> FoodTable {
        FoodTable::from_reader(SAMPLE_CSV.as_bytes()).unwrap()
    }

    #[test]
    fn loads_korean_headers() {
        let table = sample_table();
        assert_eq!(table.len(), 5);
        let chicken = table.get("닭가슴살").unwrap();
        assert_eq!(chicken.protein_g, 31.0);
        assert_eq!(chicken.sodium_mg, Some(45.0));
        assert_eq!(chicken.sugar_g, Some(0.0));
    }

    #[test]
    fn optional_columns_may_be_missing() {
        let csv = "식품명,에너지(kcal),탄수화물(g),단백질(g),지방(g)\n두부,84,2,9,5\n";
        let table = FoodTable::from_reader(csv.as_bytes()).unwrap();
        let tofu = table.get("두부").unwrap();
        assert_eq!(tofu.sodium_mg, None);
        assert_eq!(tofu.sugar_g, None);
    }

    #[test]
    fn empty_optional_cells_are_absent_not_zero() {
        let csv = "식품명,에너지(kcal),탄수화물(g),단백질(g),지방(g),나트륨(mg),당류(g)\n두부,84,2,9,5,,-\n";
        let table = FoodTable::from_reader(csv.as_bytes()).unwrap();
        let tofu = table.get("두부").unwrap();
        assert_eq!(tofu.sodium_mg, None);
        assert_eq!(tofu.sugar_g, None);
    }

    #[test]
    fn rows_without_macros_are_skipped_and_duplicates_keep_first() {
        let csv = "\
식품명,에너지(kcal),탄수화물(g),단백질(g),지방(g)
사과,52,14,0.3,0.2
사과,99,1,1,1
바나나,,23,1,0.3
";
        let table = FoodTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("사과").unwrap().energy_kcal, 52.0);
        assert!(!table.contains("바나나"));
    }

    #[test]
    fn empty_table_is_an_error() {
        let csv = "식품명,에너지(kcal),탄수화물(g),단백질(g),지방(g)\n";
        let err = FoodTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, FoodTableError::Empty));
    }

    #[test]
    fn names_are_sorted() {
        let table = sample_table();
        let names = table.names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = FoodTable::from_path("/nonexistent/food1.csv").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/food1.csv"));
    }
}
