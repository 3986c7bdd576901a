use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

/// Splits one packed cell on commas, honouring quoted segments. Inside a
/// quoted segment a doubled quote (`""`) is a literal quote character.
/// Fields are trimmed; a trailing empty field is dropped.
pub fn split_packed_row(row: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = row.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        fields.push(current.trim().to_string());
    }
    fields
}

/// Parses the localized fields of project-tool exports: day-count phrases
/// such as `"4,5 días"` and long dates such as `"15 enero 2025 8:00 a. m."`.
pub struct LocalizedParser {
    duration_re: Regex,
    date_re: Regex,
}

impl Default for LocalizedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalizedParser {
    pub fn new() -> Self {
        Self {
            duration_re: Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:d[ií]as?|days?)")
                .expect("duration pattern compiles"),
            date_re: Regex::new(
                r"(?i)(\d{1,2})\s+(?:de\s+)?(\p{L}+)\s+(?:de\s+)?(\d{4})(?:\s+(\d{1,2}):(\d{2})(?:\s*([ap])\.?\s*m\.?)?)?",
            )
            .expect("date pattern compiles"),
        }
    }

    /// Whole days from a phrase like `"3 días"` or `"2.5 days"`, rounded half
    /// to even. A bare number is taken as days.
    pub fn parse_duration(&self, text: &str) -> Option<i64> {
        let number = match self.duration_re.captures(text) {
            Some(caps) => caps.get(1)?.as_str().replace(',', "."),
            None => {
                let bare = text.trim().replace(',', ".");
                bare.parse::<f64>().ok()?;
                bare
            }
        };
        let value: f64 = number.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(value.round_ties_even() as i64)
    }

    /// `D monthname YYYY [H:MM [am/pm]]` with Spanish or English month names.
    pub fn parse_datetime(&self, text: &str) -> Option<NaiveDateTime> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
            return None;
        }
        let caps = self.date_re.captures(trimmed)?;
        let day: u32 = caps.get(1)?.as_str().parse().ok()?;
        let month = month_number(caps.get(2)?.as_str())?;
        let year: i32 = caps.get(3)?.as_str().parse().ok()?;

        let mut hour: u32 = match caps.get(4) {
            Some(h) => h.as_str().parse().ok()?,
            None => 0,
        };
        let minute: u32 = match caps.get(5) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        match caps.get(6).map(|m| m.as_str().to_ascii_lowercase()) {
            Some(marker) if marker == "p" && hour != 12 => hour += 12,
            Some(marker) if marker == "a" && hour == 12 => hour = 0,
            _ => {}
        }

        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
    }
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "enero" | "january" => 1,
        "febrero" | "february" => 2,
        "marzo" | "march" => 3,
        "abril" | "april" => 4,
        "mayo" | "may" => 5,
        "junio" | "june" => 6,
        "julio" | "july" => 7,
        "agosto" | "august" => 8,
        "septiembre" | "setiembre" | "september" => 9,
        "octubre" | "october" => 10,
        "noviembre" | "november" => 11,
        "diciembre" | "december" => 12,
        _ => return None,
    };
    Some(month)
}
