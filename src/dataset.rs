use std::collections::HashSet;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use ndarray::Array1;

use crate::errors::{MetricsError, Result};
use crate::models::{Column, CountryRecord, SCHEMA};

// The normalized table. Loaded once, never mutated afterwards; filters hand
// back fresh datasets so callers never share mutable state.
#[derive(Debug, Clone)]
pub(crate) struct Dataset {
    records: Vec<CountryRecord>,
}

impl Dataset {
    pub(crate) fn load(path: &Path) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

        let headers = reader.headers()?.clone();
        if headers.len() != SCHEMA.len() {
            return Err(MetricsError::Schema(format!(
                "expected {} columns, found {} in {}",
                SCHEMA.len(),
                headers.len(),
                path.display()
            )));
        }

        let mut records = Vec::new();
        let mut seen = HashSet::new();
        for (row, result) in reader.records().enumerate() {
            let record = result?;
            let parsed = parse_record(&record, row + 1)?;
            if !seen.insert(parsed.country.clone()) {
                return Err(MetricsError::Data(format!(
                    "duplicate country '{}' at row {}",
                    parsed.country,
                    row + 1
                )));
            }
            records.push(parsed);
        }

        Ok(Dataset { records })
    }

    pub(crate) fn from_records(records: Vec<CountryRecord>) -> Dataset {
        Dataset { records }
    }

    pub(crate) fn records(&self) -> &[CountryRecord] {
        &self.records
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn countries(&self) -> Vec<String> {
        self.records.iter().map(|r| r.country.clone()).collect()
    }

    // Order-preserving subset. An empty selection is an empty dataset, not
    // an error; statistics over it fail on their own terms.
    pub(crate) fn filter_by_countries(&self, selected: &HashSet<String>) -> Dataset {
        Dataset {
            records: self
                .records
                .iter()
                .filter(|r| selected.contains(&r.country))
                .cloned()
                .collect(),
        }
    }

    // Inclusive on both ends; lo > hi simply selects nothing.
    pub(crate) fn filter_by_range(&self, column: Column, lo: f64, hi: f64) -> Dataset {
        Dataset {
            records: self
                .records
                .iter()
                .filter(|r| {
                    let v = column.value(r);
                    lo <= v && v <= hi
                })
                .cloned()
                .collect(),
        }
    }

    pub(crate) fn column(&self, column: Column) -> Array1<f64> {
        Array1::from_iter(self.records.iter().map(|r| column.value(r)))
    }

    // Writes the normalized table, rate columns included, back out as CSV.
    pub(crate) fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

fn parse_record(record: &StringRecord, row: usize) -> Result<CountryRecord> {
    if record.len() != SCHEMA.len() {
        return Err(MetricsError::Schema(format!(
            "expected {} columns, found {} at row {}",
            SCHEMA.len(),
            record.len(),
            row
        )));
    }

    let country = record.get(0).unwrap_or("").trim().to_string();
    if country.is_empty() {
        return Err(MetricsError::Data(format!("empty country name at row {}", row)));
    }

    let mut fields = [0.0f64; 14];
    for (i, field) in fields.iter_mut().enumerate() {
        let raw = record.get(i + 1).unwrap_or("").trim();
        *field = raw.parse::<f64>().map_err(|_| {
            MetricsError::Data(format!(
                "missing or non-numeric value '{}' for {} at row {}",
                raw,
                SCHEMA[i + 1],
                row
            ))
        })?;
        if !field.is_finite() {
            return Err(MetricsError::Data(format!(
                "non-finite value for {} at row {}",
                SCHEMA[i + 1],
                row
            )));
        }
    }

    let [health_expenditure, death_rate, gdp, life_expectancy, literacy_rate, net_migration, poverty_ratio, unemployment, population, density, confirmed, deaths, recovered, active] =
        fields;

    // Population is a divisor for every rate; zero or negative would turn
    // the rates into inf/NaN downstream.
    if population <= 0.0 {
        return Err(MetricsError::Data(format!(
            "population must be positive, got {} for '{}' at row {}",
            population, country, row
        )));
    }

    Ok(CountryRecord {
        country,
        health_expenditure,
        death_rate,
        gdp,
        life_expectancy,
        literacy_rate,
        net_migration,
        poverty_ratio,
        unemployment,
        population,
        density,
        confirmed,
        deaths,
        recovered,
        active,
        confirmed_rate: confirmed / population,
        deaths_rate: deaths / population,
        recovered_rate: recovered / population,
        active_rate: active / population,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    pub(crate) const HEADER: &str = "country,health_expenditure,death_rate,gdp,life_expectancy,literacy_rate,net_migration,poverty_ratio,unemployment,population,density,confirmed,deaths,recovered,active";

    pub(crate) fn write_csv(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file
    }

    pub(crate) fn sample_file() -> NamedTempFile {
        write_csv(&[
            "Andorra,7.2,3.6,3154.0,81.8,99.0,0.0,0.0,3.7,1000,164.0,50,2,40,8",
            "Belize,5.7,4.8,1763.0,74.5,82.7,1.2,13.9,6.4,200,17.0,10,1,8,1",
            "Chile,9.1,6.2,24227.0,80.0,96.4,0.5,8.6,7.1,19000000,25.0,445000,12000,410000,23000",
        ])
    }

    #[test]
    fn load_derives_exact_rates() {
        let file = sample_file();
        let dataset = Dataset::load(file.path()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.records()[0].confirmed_rate, 0.05);
        assert_eq!(dataset.records()[0].deaths_rate, 0.002);
        assert_eq!(dataset.records()[1].confirmed_rate, 0.05);
        assert_eq!(dataset.records()[1].active_rate, 0.005);
    }

    #[test]
    fn load_rejects_wrong_column_count() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "country,population,confirmed").unwrap();
        writeln!(file, "Andorra,1000,50").unwrap();
        let err = Dataset::load(file.path()).unwrap_err();
        assert!(matches!(err, MetricsError::Schema(_)), "{:?}", err);
    }

    #[test]
    fn load_rejects_zero_population() {
        let file = write_csv(&["Nowhere,1.0,1.0,1.0,1.0,1.0,0.0,0.0,1.0,0,1.0,5,0,0,5"]);
        let err = Dataset::load(file.path()).unwrap_err();
        assert!(matches!(err, MetricsError::Data(_)), "{:?}", err);
    }

    #[test]
    fn load_rejects_duplicate_country() {
        let file = write_csv(&[
            "Andorra,7.2,3.6,3154.0,81.8,99.0,0.0,0.0,3.7,1000,164.0,50,2,40,8",
            "Andorra,7.2,3.6,3154.0,81.8,99.0,0.0,0.0,3.7,1000,164.0,50,2,40,8",
        ]);
        let err = Dataset::load(file.path()).unwrap_err();
        assert!(matches!(err, MetricsError::Data(_)), "{:?}", err);
    }

    #[test]
    fn load_rejects_non_numeric_value() {
        let file = write_csv(&["Andorra,n/a,3.6,3154.0,81.8,99.0,0.0,0.0,3.7,1000,164.0,50,2,40,8"]);
        let err = Dataset::load(file.path()).unwrap_err();
        assert!(matches!(err, MetricsError::Data(_)), "{:?}", err);
    }

    #[test]
    fn filter_by_countries_identity_and_empty() {
        let file = sample_file();
        let dataset = Dataset::load(file.path()).unwrap();

        let all: HashSet<String> = dataset.countries().into_iter().collect();
        let same = dataset.filter_by_countries(&all);
        assert_eq!(same.countries(), dataset.countries());

        let none = dataset.filter_by_countries(&HashSet::new());
        assert!(none.is_empty());
    }

    #[test]
    fn filter_by_countries_preserves_order() {
        let file = sample_file();
        let dataset = Dataset::load(file.path()).unwrap();
        let selected: HashSet<String> = ["Chile", "Andorra"].iter().map(|s| s.to_string()).collect();
        let filtered = dataset.filter_by_countries(&selected);
        assert_eq!(filtered.countries(), vec!["Andorra", "Chile"]);
    }

    #[test]
    fn filter_by_range_is_inclusive_and_idempotent() {
        let file = sample_file();
        let dataset = Dataset::load(file.path()).unwrap();

        let filtered = dataset.filter_by_range(Column::Population, 200.0, 1000.0);
        assert_eq!(filtered.countries(), vec!["Andorra", "Belize"]);

        let twice = filtered.filter_by_range(Column::Population, 200.0, 1000.0);
        assert_eq!(twice.countries(), filtered.countries());
    }

    #[test]
    fn filter_by_range_inverted_bounds_is_empty() {
        let file = sample_file();
        let dataset = Dataset::load(file.path()).unwrap();
        let filtered = dataset.filter_by_range(Column::Gdp, 10.0, 1.0);
        assert!(filtered.is_empty());
    }

    #[test]
    fn write_csv_round_trips_headers() {
        let file = sample_file();
        let dataset = Dataset::load(file.path()).unwrap();
        let out = NamedTempFile::new().unwrap();
        dataset.write_csv(out.path()).unwrap();
        let text = std::fs::read_to_string(out.path()).unwrap();
        let first = text.lines().next().unwrap();
        assert!(first.starts_with("country,health_expenditure"));
        assert!(first.ends_with("confirmed_rate,deaths_rate,recovered_rate,active_rate"));
        assert_eq!(text.lines().count(), 4);
    }
}
