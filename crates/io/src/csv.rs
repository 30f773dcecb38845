// CSV/TSV → RawGrid

use taxgrid_engine::{CellData, RawGrid};

use crate::grid::{GridError, ReadOptions};

/// Parse delimited text into a grid. Every non-empty field becomes a text cell;
/// numeric interpretation is left to extraction.
pub fn read_grid(
    bytes: &[u8],
    delimiter: Option<u8>,
    options: &ReadOptions,
) -> Result<RawGrid, GridError> {
    let content = decode_to_utf8(bytes);
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(content));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut width = 0usize;
    for result in reader.records() {
        let record = result.map_err(|e| GridError::Csv(e.to_string()))?;
        width = width.max(record.len());
        options.check(rows.len() + 1, width)?;
        rows.push(record.iter().map(CellData::from).collect());
    }

    tracing::debug!(delimiter = %(delimiter as char).escape_default(), rows = rows.len(), "parsed delimited text");
    Ok(RawGrid::new(rows))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// UTF-8 if valid, otherwise Windows-1251 (the usual code page of Cyrillic Excel exports).
pub fn decode_to_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1251.decode(bytes);
            tracing::debug!("input is not UTF-8, decoded as windows-1251");
            decoded.into_owned()
        }
    }
}
