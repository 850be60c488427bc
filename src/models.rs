use serde::Serialize;

// Canonical input schema: country + 10 socioeconomic indicators + 4 raw
// COVID case counts, in this order. Names are assigned positionally after
// the column count is validated, so a file with drifted headers is rejected
// instead of silently mislabeled.
pub(crate) const SCHEMA: [&str; 15] = [
    "country",
    "health_expenditure",
    "death_rate",
    "gdp",
    "life_expectancy",
    "literacy_rate",
    "net_migration",
    "poverty_ratio",
    "unemployment",
    "population",
    "density",
    "confirmed",
    "deaths",
    "recovered",
    "active",
];

// One row of the normalized table, rates included.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CountryRecord {
    pub(crate) country: String,
    pub(crate) health_expenditure: f64,
    pub(crate) death_rate: f64,
    pub(crate) gdp: f64,
    pub(crate) life_expectancy: f64,
    pub(crate) literacy_rate: f64,
    pub(crate) net_migration: f64,
    pub(crate) poverty_ratio: f64,
    pub(crate) unemployment: f64,
    pub(crate) population: f64,
    pub(crate) density: f64,
    pub(crate) confirmed: f64,
    pub(crate) deaths: f64,
    pub(crate) recovered: f64,
    pub(crate) active: f64,
    pub(crate) confirmed_rate: f64,
    pub(crate) deaths_rate: f64,
    pub(crate) recovered_rate: f64,
    pub(crate) active_rate: f64,
}

// Every numeric column a caller can select for an axis, a filter, or the
// correlation matrix. Replaces raw column indices so a chart request cannot
// point at the wrong field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Column {
    HealthExpenditure,
    DeathRate,
    Gdp,
    LifeExpectancy,
    LiteracyRate,
    NetMigration,
    PovertyRatio,
    Unemployment,
    Population,
    Density,
    Confirmed,
    Deaths,
    Recovered,
    Active,
    ConfirmedRate,
    DeathsRate,
    RecoveredRate,
    ActiveRate,
}

impl Column {
    // The socioeconomic factors offered as scatter/bubble axes.
    pub(crate) const FACTORS: [Column; 8] = [
        Column::HealthExpenditure,
        Column::DeathRate,
        Column::Gdp,
        Column::LifeExpectancy,
        Column::LiteracyRate,
        Column::NetMigration,
        Column::PovertyRatio,
        Column::Unemployment,
    ];

    // The four derived rate categories.
    pub(crate) const RATES: [Column; 4] = [
        Column::ConfirmedRate,
        Column::ActiveRate,
        Column::DeathsRate,
        Column::RecoveredRate,
    ];

    pub(crate) fn value(&self, record: &CountryRecord) -> f64 {
        match self {
            Column::HealthExpenditure => record.health_expenditure,
            Column::DeathRate => record.death_rate,
            Column::Gdp => record.gdp,
            Column::LifeExpectancy => record.life_expectancy,
            Column::LiteracyRate => record.literacy_rate,
            Column::NetMigration => record.net_migration,
            Column::PovertyRatio => record.poverty_ratio,
            Column::Unemployment => record.unemployment,
            Column::Population => record.population,
            Column::Density => record.density,
            Column::Confirmed => record.confirmed,
            Column::Deaths => record.deaths,
            Column::Recovered => record.recovered,
            Column::Active => record.active,
            Column::ConfirmedRate => record.confirmed_rate,
            Column::DeathsRate => record.deaths_rate,
            Column::RecoveredRate => record.recovered_rate,
            Column::ActiveRate => record.active_rate,
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Column::HealthExpenditure => "health_expenditure",
            Column::DeathRate => "death_rate",
            Column::Gdp => "gdp",
            Column::LifeExpectancy => "life_expectancy",
            Column::LiteracyRate => "literacy_rate",
            Column::NetMigration => "net_migration",
            Column::PovertyRatio => "poverty_ratio",
            Column::Unemployment => "unemployment",
            Column::Population => "population",
            Column::Density => "density",
            Column::Confirmed => "confirmed",
            Column::Deaths => "deaths",
            Column::Recovered => "recovered",
            Column::Active => "active",
            Column::ConfirmedRate => "confirmed_rate",
            Column::DeathsRate => "deaths_rate",
            Column::RecoveredRate => "recovered_rate",
            Column::ActiveRate => "active_rate",
        }
    }

    pub(crate) fn parse(name: &str) -> Option<Column> {
        const ALL: [Column; 18] = [
            Column::HealthExpenditure,
            Column::DeathRate,
            Column::Gdp,
            Column::LifeExpectancy,
            Column::LiteracyRate,
            Column::NetMigration,
            Column::PovertyRatio,
            Column::Unemployment,
            Column::Population,
            Column::Density,
            Column::Confirmed,
            Column::Deaths,
            Column::Recovered,
            Column::Active,
            Column::ConfirmedRate,
            Column::DeathsRate,
            Column::RecoveredRate,
            Column::ActiveRate,
        ];
        ALL.iter().copied().find(|c| c.as_str() == name)
    }

    // "health_expenditure" -> "Health Expenditure", for captions and axis labels.
    pub(crate) fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Ordinary least squares fit for a selected (x, y) pair, with the Pearson
// coefficient computed over the same points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct RegressionResult {
    pub(crate) slope: f64,
    pub(crate) intercept: f64,
    pub(crate) correlation: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_round_trip() {
        for column in Column::FACTORS.iter().chain(Column::RATES.iter()) {
            assert_eq!(Column::parse(column.as_str()), Some(*column));
        }
        assert_eq!(Column::parse("happiness"), None);
    }

    #[test]
    fn labels_are_title_cased() {
        assert_eq!(Column::HealthExpenditure.label(), "Health Expenditure");
        assert_eq!(Column::ConfirmedRate.label(), "Confirmed Rate");
        assert_eq!(Column::Gdp.label(), "Gdp");
    }

    #[test]
    fn schema_has_country_first_and_active_last() {
        assert_eq!(SCHEMA.len(), 15);
        assert_eq!(SCHEMA[0], "country");
        assert_eq!(SCHEMA[14], "active");
    }
}
