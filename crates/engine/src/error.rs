use std::fmt;

/// Error taxonomy shared by every stage. Boundary code matches on this, not on variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EmptyFile,
    Structural,
    EmptyAfterFiltering,
    EmptyInput,
    Numeric,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFile => write!(f, "empty_file"),
            Self::Structural => write!(f, "structural_error"),
            Self::EmptyAfterFiltering => write!(f, "empty_after_filtering"),
            Self::EmptyInput => write!(f, "empty_input"),
            Self::Numeric => write!(f, "numeric_error"),
        }
    }
}

/// Extraction failures. `Display` output is part of the contract: callers
/// show it to users and tests compare it literally.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Fewer than three rows (headers only, or less).
    EmptyFile,
    /// Fewer than six columns.
    TooFewColumns { found: usize },
    /// The two header rows don't match the expected layout.
    HeaderMismatch,
    /// Every data row was missing a required field.
    EmptyAfterFiltering,
    /// A tax figure could not be read as a number. `row` is 1-based as in the sheet.
    Numeric {
        row: usize,
        field: &'static str,
        value: String,
    },
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyFile => ErrorKind::EmptyFile,
            Self::TooFewColumns { .. } | Self::HeaderMismatch => ErrorKind::Structural,
            Self::EmptyAfterFiltering => ErrorKind::EmptyAfterFiltering,
            Self::Numeric { .. } => ErrorKind::Numeric,
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFile => write!(f, "Файл пуст. Загрузка данных невозможна."),
            Self::TooFewColumns { .. } => write!(f, "Файл должен содержать минимум 6 столбцов."),
            Self::HeaderMismatch => {
                write!(f, "Файл имеет некорректную структуру. Проверьте исходные данные.")
            }
            Self::EmptyAfterFiltering => {
                write!(f, "Файл не содержит валидных данных после удаления пустых строк.")
            }
            Self::Numeric { row, field, value } => {
                write!(f, "Строка {row}: значение «{value}» в столбце «{field}» не является числом.")
            }
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Report build failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// No records to report on. A headers-only report is never produced.
    EmptyInput,
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput => ErrorKind::EmptyInput,
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "Нет данных для формирования отчета."),
        }
    }
}

impl std::error::Error for BuildError {}
