use crate::activity::{Activity, ActivityTable, split_predecessors};
use crate::error::{ScheduleError, ScheduleResult};
use crate::ingest::defaults::default_project;
use crate::ingest::localized::{LocalizedParser, split_packed_row};
use calamine::{Data, Reader, open_workbook_auto};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Duration,
    Predecessors,
}

const ALIASES: [(&str, Field); 18] = [
    ("actividad", Field::Name),
    ("activity", Field::Name),
    ("tarea", Field::Name),
    ("task", Field::Name),
    ("nombre", Field::Name),
    ("name", Field::Name),
    ("duracion", Field::Duration),
    ("duración", Field::Duration),
    ("duration", Field::Duration),
    ("dias", Field::Duration),
    ("días", Field::Duration),
    ("days", Field::Duration),
    ("predecesoras", Field::Predecessors),
    ("predecesores", Field::Predecessors),
    ("predecessors", Field::Predecessors),
    ("dependencias", Field::Predecessors),
    ("dependencies", Field::Predecessors),
    ("depends on", Field::Predecessors),
];

const LOCALIZED_NAME: [&str; 2] = ["nombre", "name"];
const LOCALIZED_DURATION: [&str; 3] = ["duracion", "duración", "duration"];
const LOCALIZED_START: [&str; 3] = ["comienzo", "inicio", "start"];

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn field_for(header: &str) -> Option<Field> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == header)
        .map(|(_, field)| *field)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularLayout {
    /// Columns mappable to name / duration / predecessors.
    Generic,
    /// Name, duration phrase, start and end phrase, possibly packed into one
    /// quoted cell per row.
    Localized,
}

#[derive(Debug, Clone)]
pub struct TabularImport {
    pub table: ActivityTable,
    pub layout: TabularLayout,
    /// First start date found in a localized file; candidate project start.
    pub discovered_start: Option<NaiveDateTime>,
}

/// Outcome of the "always produce something" import policy.
#[derive(Debug)]
pub enum Ingested {
    Parsed(TabularImport),
    /// The file could not be used and the example project stands in for it.
    Substituted {
        table: ActivityTable,
        cause: ScheduleError,
    },
}

impl Ingested {
    pub fn table(&self) -> &ActivityTable {
        match self {
            Ingested::Parsed(import) => &import.table,
            Ingested::Substituted { table, .. } => table,
        }
    }

    pub fn discovered_start(&self) -> Option<NaiveDateTime> {
        match self {
            Ingested::Parsed(import) => import.discovered_start,
            Ingested::Substituted { .. } => None,
        }
    }

    pub fn is_substituted(&self) -> bool {
        matches!(self, Ingested::Substituted { .. })
    }

    pub fn into_table(self) -> ActivityTable {
        match self {
            Ingested::Parsed(import) => import.table,
            Ingested::Substituted { table, .. } => table,
        }
    }
}

#[derive(Default)]
pub struct TabularImporter {
    parser: LocalizedParser,
}

impl TabularImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the reader from the file extension.
    pub fn import_path<P: AsRef<Path>>(&self, path: P) -> ScheduleResult<TabularImport> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        debug!(path = %path.display(), %extension, "reading tabular input");

        match extension.as_str() {
            "csv" => self.import_csv_reader(File::open(path)?),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => self.import_spreadsheet(path),
            other => Err(ScheduleError::format(format!(
                "unsupported file extension '{other}'"
            ))),
        }
    }

    /// Legacy policy: any failure yields the example project. The cause is
    /// kept in the result and logged.
    pub fn import_or_example<P: AsRef<Path>>(&self, path: P) -> Ingested {
        match self.import_path(path) {
            Ok(import) => Ingested::Parsed(import),
            Err(cause) => {
                warn!(error = %cause, "tabular import failed, substituting example project");
                Ingested::Substituted {
                    table: default_project(),
                    cause,
                }
            }
        }
    }

    pub fn import_csv_reader<R: Read>(&self, reader: R) -> ScheduleResult<TabularImport> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(ToOwned::to_owned).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(ToOwned::to_owned).collect::<Vec<_>>());
        }
        self.import_rows(&headers, &rows)
    }

    pub fn import_spreadsheet<P: AsRef<Path>>(&self, path: P) -> ScheduleResult<TabularImport> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ScheduleError::format("workbook has no sheets"))??;

        let mut sheet_rows = range.rows();
        let headers: Vec<String> = sheet_rows
            .next()
            .ok_or_else(|| ScheduleError::format("worksheet is empty"))?
            .iter()
            .map(cell_to_string)
            .collect();
        let rows: Vec<Vec<String>> = sheet_rows
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        self.import_rows(&headers, &rows)
    }

    pub fn import_rows(
        &self,
        headers: &[String],
        rows: &[Vec<String>],
    ) -> ScheduleResult<TabularImport> {
        let headers: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

        let import = if is_localized_layout(&headers) {
            debug!("detected localized name/duration/start/end layout");
            self.localized_table(&headers, rows)?
        } else {
            TabularImport {
                table: generic_table(&headers, rows)?,
                layout: TabularLayout::Generic,
                discovered_start: None,
            }
        };

        info!(
            activities = import.table.len(),
            layout = ?import.layout,
            "tabular input read"
        );
        Ok(import)
    }

    fn localized_table(
        &self,
        headers: &[String],
        rows: &[Vec<String>],
    ) -> ScheduleResult<TabularImport> {
        let column = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));
        let name_ix = column(&LOCALIZED_NAME).unwrap_or(0);
        let duration_ix = column(&LOCALIZED_DURATION);
        let start_ix = column(&LOCALIZED_START);
        let pred_ix = headers
            .iter()
            .position(|h| field_for(h) == Some(Field::Predecessors));

        let mut table = ActivityTable::new();
        let mut discovered_start: Option<NaiveDateTime> = None;

        for row in rows {
            let Some(cells) = localized_cells(row, name_ix, duration_ix, start_ix) else {
                continue;
            };
            let name = cells.name.trim();
            if name.is_empty() || name.eq_ignore_ascii_case("nan") {
                continue;
            }
            let Some(duration) = self.parser.parse_duration(&cells.duration) else {
                continue;
            };
            if duration <= 0 {
                continue;
            }
            if discovered_start.is_none() {
                discovered_start = self.parser.parse_datetime(&cells.start);
            }

            let mut activity = Activity::new(name, duration);
            if let Some(joined) = pred_ix.and_then(|ix| row.get(ix)) {
                activity.predecessors = split_predecessors(joined);
            }
            table.push(activity);
        }

        if table.is_empty() {
            return Err(ScheduleError::NoActivities(
                "no valid activities in localized file".into(),
            ));
        }
        if let Some(start) = discovered_start {
            info!(%start, "start date discovered in file");
        }

        Ok(TabularImport {
            table,
            layout: TabularLayout::Localized,
            discovered_start,
        })
    }
}

fn is_localized_layout(headers: &[String]) -> bool {
    let has = |names: &[&str]| headers.iter().any(|h| names.contains(&h.as_str()));
    has(&LOCALIZED_NAME) && has(&LOCALIZED_DURATION) && has(&LOCALIZED_START)
}

struct LocalizedCells {
    name: String,
    duration: String,
    start: String,
}

/// A row is "packed" when its first cell holds the whole record and the
/// remaining cells are blank. Project-tool exports carry seven or more packed
/// fields (name, three bookkeeping columns, duration, start, end); shorter
/// packed rows are read as name, duration, start, end.
fn localized_cells(
    row: &[String],
    name_ix: usize,
    duration_ix: Option<usize>,
    start_ix: Option<usize>,
) -> Option<LocalizedCells> {
    let first = row.first()?;
    let packed = first.contains(',') && row.iter().skip(1).all(|c| c.trim().is_empty());

    if packed {
        let fields = split_packed_row(first);
        let (name, duration, start) = match fields.len() {
            n if n >= 7 => (0, 4, 5),
            n if n >= 4 => (0, 1, 2),
            _ => return None,
        };
        return Some(LocalizedCells {
            name: fields[name].clone(),
            duration: fields[duration].clone(),
            start: fields[start].clone(),
        });
    }

    let cell = |ix: Option<usize>| {
        ix.and_then(|i| row.get(i))
            .cloned()
            .unwrap_or_default()
    };
    Some(LocalizedCells {
        name: cell(Some(name_ix)),
        duration: cell(duration_ix),
        start: cell(start_ix),
    })
}

/// Generic layout: durations are coerced to numbers (non-numbers become
/// missing) and only rows with a positive duration survive.
fn generic_table(headers: &[String], rows: &[Vec<String>]) -> ScheduleResult<ActivityTable> {
    let position = |field: Field| headers.iter().position(|h| field_for(h) == Some(field));
    let name_ix = position(Field::Name)
        .ok_or_else(|| ScheduleError::format("no activity name column (e.g. 'Actividad', 'Task')"))?;
    let duration_ix = position(Field::Duration)
        .ok_or_else(|| ScheduleError::format("no duration column (e.g. 'Duración', 'Duration')"))?;
    let pred_ix = position(Field::Predecessors);

    let cell: for<'r> fn(&'r Vec<String>, usize) -> &'r str = |row, ix| row.get(ix).map(String::as_str).unwrap_or("");
    let names: Vec<&str> = rows.iter().map(|r| cell(r, name_ix)).collect();
    let durations: Vec<&str> = rows.iter().map(|r| cell(r, duration_ix)).collect();
    let predecessors: Vec<&str> = rows
        .iter()
        .map(|r| pred_ix.map(|ix| cell(r, ix)).unwrap_or(""))
        .collect();

    let raw_durations = Series::new("duration".into(), durations);
    let durations = raw_durations.cast(&DataType::Float64)?;
    let df = DataFrame::new(vec![
        Series::new("name".into(), names).into_column(),
        durations.into_column(),
        Series::new("predecessors".into(), predecessors).into_column(),
    ])?;

    let mask = df.column("duration")?.f64()?.gt(0.0);
    let df = df.filter(&mask)?;
    debug!(
        kept = df.height(),
        dropped = rows.len() - df.height(),
        "filtered rows without a positive duration"
    );

    let names = df.column("name")?.str()?;
    let durations = df.column("duration")?.f64()?;
    let predecessors = df.column("predecessors")?.str()?;

    let mut table = ActivityTable::new();
    for idx in 0..df.height() {
        let name = names.get(idx).unwrap_or("").trim();
        let days = durations.get(idx).unwrap_or(0.0).round_ties_even() as i64;
        if name.is_empty() || days <= 0 {
            continue;
        }
        let activity =
            Activity::new(name, days).with_predecessor_list(predecessors.get(idx).unwrap_or(""));
        table.push(activity);
    }

    if table.is_empty() {
        return Err(ScheduleError::NoActivities(
            "no rows with a positive duration".into(),
        ));
    }
    Ok(table)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn spreadsheet_cells_become_plain_text() {
        assert_eq!(cell_to_string(&Data::Float(5.0)).parse::<f64>().unwrap(), 5.0);
        assert_eq!(cell_to_string(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::String(" Muros ".into())), "Muros");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn headers_are_trimmed_and_lowercased() {
        assert_eq!(normalize_header("\u{feff} Duración "), "duración");
        assert_eq!(field_for("tarea"), Some(Field::Name));
        assert_eq!(field_for("dependencias"), Some(Field::Predecessors));
        assert_eq!(field_for("comienzo"), None);
    }

    #[test]
    fn localized_layout_needs_name_duration_and_start() {
        assert!(is_localized_layout(&strings(&["nombre", "duracion", "comienzo", "fin"])));
        assert!(!is_localized_layout(&strings(&["nombre", "duracion", "predecesoras"])));
    }

    #[test]
    fn packed_rows_use_export_positions() {
        let row = strings(&[
            r#"Excavación,1,0,"No",5 días,"15 enero 2025 8:00 a. m.","20 enero 2025 5:00 p. m.""#,
            "",
            "",
        ]);
        let cells = localized_cells(&row, 0, Some(1), Some(2)).unwrap();
        assert_eq!(cells.name, "Excavación");
        assert_eq!(cells.duration, "5 días");
        assert_eq!(cells.start, "15 enero 2025 8:00 a. m.");
    }

    #[test]
    fn generic_rows_without_positive_duration_are_dropped() {
        let headers = strings(&["task", "duration", "predecessors"]);
        let rows = vec![
            strings(&["Excavation", "5", ""]),
            strings(&["Survey", "soon", ""]),
            strings(&["Foundation", "0", "Excavation"]),
            strings(&["Structure", "14.6", "Excavation, Survey"]),
        ];
        let table = generic_table(&headers, &rows).unwrap();
        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["Excavation", "Structure"]);
        assert_eq!(table.activities()[1].duration_days, 15);
        assert_eq!(
            table.activities()[1].predecessors,
            vec!["Excavation".to_string(), "Survey".to_string()]
        );
    }

    #[test]
    fn generic_table_requires_duration_column() {
        let headers = strings(&["task", "owner"]);
        let err = generic_table(&headers, &[strings(&["Excavation", "Ana"])]).unwrap_err();
        assert!(matches!(err, ScheduleError::Format(_)));
    }
}
