//! The five clock units stamped into firmware sources.

use core::fmt;

/// Indentation written in front of every rewritten assignment.
pub const INDENT: &str = "        ";

/// One stamped clock unit.
///
/// Variants are declared in the order the injector checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Two-digit year minus the firmware's 2020 epoch.
    Year,
    /// Month of year, 1-12.
    Month,
    /// Day of month, 1-31.
    Day,
    /// Hour of day, 0-23.
    Hour,
    /// Minute of hour, 0-59.
    Minute,
}

impl Field {
    /// All fields, in check order.
    pub const ALL: [Field; 5] = [
        Field::Year,
        Field::Month,
        Field::Day,
        Field::Hour,
        Field::Minute,
    ];

    /// Unit name as it appears in the firmware source.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Field::Year => "year",
            Field::Month => "month",
            Field::Day => "day",
            Field::Hour => "hour",
            Field::Minute => "minute",
        }
    }

    /// Marker token, e.g. `date_time.unit.hour`.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Field::Year => "date_time.unit.year",
            Field::Month => "date_time.unit.month",
            Field::Day => "date_time.unit.day",
            Field::Hour => "date_time.unit.hour",
            Field::Minute => "date_time.unit.minute",
        }
    }

    /// Substring test against one source line.
    #[must_use]
    pub fn matches(self, line: &str) -> bool {
        line.contains(self.marker())
    }

    /// Canonical replacement line, newline included.
    #[must_use]
    pub fn assignment(self, value: i32) -> String {
        format!("{INDENT}{} = {value};\n", self.marker())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
