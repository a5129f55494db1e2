//! CSV reports of a simulation run.
//!
//! A report type is any serializable row struct registered with [`define_report!`]. A
//! [`ReportWriter`] keeps one CSV file per report type, named `{prefix}{name}.csv` inside the
//! configured output directory. [`SimulationReports`] writes the two built-in reports,
//! `daily_counts` and `transitions`, from each [`DaySnapshot`].
use crate::error::OutbreakError;
use crate::hashing::HashMap;
use crate::health::HealthStatus;
use crate::layout::PopulationLayout;
use crate::schedule::Day;
use crate::snapshot::DaySnapshot;
use crate::PersonIndex;
use csv::Writer;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

pub trait Report: 'static {
    // Returns report type
    fn type_id(&self) -> TypeId;
    // Serializes the data with the correct writer
    fn serialize(&self, writer: &mut Writer<File>) -> Result<(), OutbreakError>;
}

/// Use this macro to define a unique report type
#[macro_export]
macro_rules! define_report {
    ($name:ident) => {
        impl $crate::report::Report for $name {
            fn type_id(&self) -> std::any::TypeId {
                std::any::TypeId::of::<$name>()
            }

            fn serialize(
                &self,
                writer: &mut $crate::csv::Writer<std::fs::File>,
            ) -> Result<(), $crate::error::OutbreakError> {
                writer.serialize(self)?;
                Ok(())
            }
        }
    };
}
pub use define_report;

/// Where report files go and what happens to files that are already there.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub file_prefix: String,
    pub output_dir: PathBuf,
    pub overwrite: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            file_prefix: String::new(),
            output_dir: PathBuf::from("."),
            overwrite: false,
        }
    }
}

impl ReportOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the file prefix option (e.g., "run1_")
    pub fn file_prefix(&mut self, file_prefix: String) -> &mut Self {
        self.file_prefix = file_prefix;
        self
    }

    /// Sets the directory where reports will be output
    pub fn directory(&mut self, directory: PathBuf) -> &mut Self {
        self.output_dir = directory;
        self
    }

    /// Sets whether to overwrite existing reports of the same name if they exist
    pub fn overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn path_for(&self, short_name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}{short_name}.csv", self.file_prefix))
    }
}

// Creates the file and all parent directories if they do not exist. Refuses to replace an
// existing file unless `overwrite` is set.
fn create_report_file(path: &Path, overwrite: bool) -> Result<File, OutbreakError> {
    if path.exists() && !overwrite {
        return Err(OutbreakError::ReportError(format!(
            "report file {} already exists; pass --force-overwrite to replace it",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// One CSV writer per registered report type.
pub struct ReportWriter {
    options: ReportOptions,
    file_writers: HashMap<TypeId, Writer<File>>,
}

impl ReportWriter {
    #[must_use]
    pub fn new(options: ReportOptions) -> Self {
        ReportWriter {
            options,
            file_writers: HashMap::default(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Call `add_report` with each report type, passing the short name of the report. The file
    /// is created immediately and the path is returned.
    ///
    /// # Errors
    ///
    /// Returns `OutbreakError::ReportError` if the file exists and overwriting is off, or
    /// `OutbreakError::IoError` if the file cannot be created.
    pub fn add_report<T: Report>(&mut self, short_name: &str) -> Result<PathBuf, OutbreakError> {
        let path = self.options.path_for(short_name);
        let file = create_report_file(&path, self.options.overwrite)?;
        debug!("writing report {short_name} to {}", path.display());
        self.file_writers
            .insert(TypeId::of::<T>(), Writer::from_writer(file));
        Ok(path)
    }

    /// Write a new row with columns following items in the report struct to the report file
    /// associated with the report type struct.
    ///
    /// # Errors
    ///
    /// Returns `OutbreakError::ReportError` if the report type was never added, or the CSV/IO
    /// error from writing the row.
    pub fn send_report<T: Report>(&mut self, report: &T) -> Result<(), OutbreakError> {
        let writer = self
            .file_writers
            .get_mut(&report.type_id())
            .ok_or_else(|| OutbreakError::ReportError("No writer found for the report type".into()))?;
        report.serialize(writer)
    }

    /// # Errors
    ///
    /// Returns the first IO error from flushing a writer.
    pub fn flush(&mut self) -> Result<(), OutbreakError> {
        for writer in self.file_writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// A row of the `daily_counts` report: the end-of-day counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCountsRow {
    pub day: Day,
    pub exposed: usize,
    pub new_infections: usize,
    pub recovered_today: usize,
    pub died_today: usize,
    pub total_ever_infected: usize,
    pub currently_infected: usize,
    pub recovered: usize,
    pub dead: usize,
}
define_report!(DailyCountsRow);

impl From<&DaySnapshot> for DailyCountsRow {
    fn from(snapshot: &DaySnapshot) -> Self {
        DailyCountsRow {
            day: snapshot.day,
            exposed: snapshot.exposed_count,
            new_infections: snapshot.newly_infected.len(),
            recovered_today: snapshot.recovered_today.len(),
            died_today: snapshot.died_today.len(),
            total_ever_infected: snapshot.counters.total_ever_infected,
            currently_infected: snapshot.counters.currently_infected,
            recovered: snapshot.counters.recovered,
            dead: snapshot.counters.dead,
        }
    }
}

/// A row of the `transitions` report: one individual entering `infected`, `recovered` or `dead`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionRow {
    pub day: Day,
    pub person: PersonIndex,
    pub theta: f64,
    pub r: f64,
    pub status: HealthStatus,
}
define_report!(TransitionRow);

/// Writes the `daily_counts` and `transitions` reports for a run.
pub struct SimulationReports {
    writer: ReportWriter,
    layout: PopulationLayout,
    rows_written: usize,
}

impl SimulationReports {
    /// Creates both report files.
    ///
    /// # Errors
    ///
    /// Returns any error from [`ReportWriter::add_report`].
    pub fn create(options: ReportOptions, layout: PopulationLayout) -> Result<Self, OutbreakError> {
        let mut writer = ReportWriter::new(options);
        writer.add_report::<DailyCountsRow>("daily_counts")?;
        writer.add_report::<TransitionRow>("transitions")?;
        Ok(SimulationReports {
            writer,
            layout,
            rows_written: 0,
        })
    }

    /// Appends one `daily_counts` row and a `transitions` row for every individual who changed
    /// status on the snapshot's day.
    ///
    /// # Errors
    ///
    /// Returns the first error from writing a row.
    pub fn record(&mut self, snapshot: &DaySnapshot) -> Result<(), OutbreakError> {
        self.writer
            .send_report(&DailyCountsRow::from(snapshot))?;
        self.rows_written += 1;

        let day = snapshot.day;
        for point in &snapshot.newly_infected {
            self.writer.send_report(&TransitionRow {
                day,
                person: point.index,
                theta: point.theta,
                r: point.r,
                status: HealthStatus::Infected,
            })?;
        }
        let resolved = snapshot
            .recovered_today
            .iter()
            .map(|&person| (person, HealthStatus::Recovered))
            .chain(
                snapshot
                    .died_today
                    .iter()
                    .map(|&person| (person, HealthStatus::Dead)),
            );
        for (person, status) in resolved {
            let position = self.layout.position(person);
            self.writer.send_report(&TransitionRow {
                day,
                person,
                theta: position.theta,
                r: position.r,
                status,
            })?;
        }
        Ok(())
    }

    /// Flushes both reports and returns the directory they were written to.
    ///
    /// # Errors
    ///
    /// Returns the first IO error from flushing.
    pub fn finish(mut self) -> Result<PathBuf, OutbreakError> {
        self.writer.flush()?;
        let output_dir = self.writer.options().output_dir.clone();
        info!(
            "wrote {} day(s) of reports to {}",
            self.rows_written,
            output_dir.display()
        );
        Ok(output_dir)
    }
}
