//! CSV roster import used to seed a schedule store.
//!
//! Volunteers: `name,phone,email,reliability_score`. Shifts: `date,shift_type,capacity`.
//! Headers are required; cells are trimmed and blanks read as absent.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::scheduling::{NewShift, NewVolunteer, RepositoryError, ScheduleStore, ShiftType};

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: usize, detail: String },
    Store { line: usize, source: RepositoryError },
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::InvalidRow { line, detail } => {
                write!(f, "invalid roster row on line {}: {}", line, detail)
            }
            RosterImportError::Store { line, source } => {
                write!(f, "could not store roster row on line {}: {}", line, source)
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::InvalidRow { .. } => None,
            RosterImportError::Store { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Seeds volunteers and shifts into any [`ScheduleStore`].
pub struct RosterImporter<'a, S: ScheduleStore> {
    store: &'a S,
}

impl<'a, S: ScheduleStore> RosterImporter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn volunteers_from_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<usize, RosterImportError> {
        let file = std::fs::File::open(path)?;
        self.volunteers_from_reader(file)
    }

    pub fn shifts_from_path<P: AsRef<Path>>(&self, path: P) -> Result<usize, RosterImportError> {
        let file = std::fs::File::open(path)?;
        self.shifts_from_reader(file)
    }

    pub fn volunteers_from_reader<R: Read>(&self, reader: R) -> Result<usize, RosterImportError> {
        let mut imported = 0;
        for (index, row) in csv_reader(reader).deserialize::<VolunteerRow>().enumerate() {
            let line = index + 2;
            let volunteer = row?.into_new_volunteer(line)?;

            self.store
                .insert_volunteer(volunteer)
                .map_err(|source| RosterImportError::Store { line, source })?;
            imported += 1;
        }

        info!(imported, "volunteer roster imported");
        Ok(imported)
    }

    pub fn shifts_from_reader<R: Read>(&self, reader: R) -> Result<usize, RosterImportError> {
        let mut imported = 0;
        for (index, row) in csv_reader(reader).deserialize::<ShiftRow>().enumerate() {
            let line = index + 2;
            let shift = row?.into_new_shift(line)?;

            self.store
                .insert_shift(shift)
                .map_err(|source| RosterImportError::Store { line, source })?;
            imported += 1;
        }

        info!(imported, "shift calendar imported");
        Ok(imported)
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

#[derive(Debug, Deserialize)]
struct VolunteerRow {
    name: String,
    phone: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    reliability_score: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShiftRow {
    date: String,
    shift_type: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    capacity: Option<String>,
}

impl ShiftRow {
    fn into_new_shift(self, line: usize) -> Result<NewShift, RosterImportError> {
        let invalid = |detail: String| RosterImportError::InvalidRow { line, detail };

        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|_| invalid(format!("unrecognized date '{}'", self.date)))?;
        let shift_type = ShiftType::parse(&self.shift_type)
            .ok_or_else(|| invalid(format!("unknown shift type '{}'", self.shift_type)))?;
        let capacity = match self.capacity.as_deref() {
            Some(raw) => match raw.parse::<u32>() {
                Ok(value) if value > 0 => Some(value),
                _ => {
                    return Err(invalid(format!(
                        "capacity must be a positive integer, got '{}'",
                        raw
                    )))
                }
            },
            None => None,
        };

        Ok(NewShift {
            date,
            shift_type,
            capacity,
        })
    }
}

impl VolunteerRow {
    fn into_new_volunteer(self, line: usize) -> Result<NewVolunteer, RosterImportError> {
        if self.name.is_empty() || self.phone.is_empty() {
            return Err(RosterImportError::InvalidRow {
                line,
                detail: "name and phone are required".to_string(),
            });
        }

        let reliability_score = self
            .reliability_score
            .as_deref()
            .map(|raw| {
                raw.parse::<u32>().map_err(|_| RosterImportError::InvalidRow {
                    line,
                    detail: format!(
                        "reliability_score must be a non-negative integer, got '{}'",
                        raw
                    ),
                })
            })
            .transpose()?;

        Ok(NewVolunteer {
            name: self.name,
            phone: self.phone,
            email: self.email,
            reliability_score,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
