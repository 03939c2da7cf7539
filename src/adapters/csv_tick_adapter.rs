//! CSV tick feed adapter.
//!
//! Reads a tick history from a CSV file with a header row. `ticker` and
//! `price` columns are required; `timestamp` (RFC 3339), `volume`,
//! `change_pct`, `high_price`, `low_price`, `open_price`, `prev_high`,
//! `prev_low` and `fear_greed_value` are optional and may be absent as
//! columns or left empty per row.

use chrono::{DateTime, Utc};
use csv::StringRecord;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::domain::error::CoinTraderError;
use crate::domain::market::Tick;
use crate::ports::tick_feed::TickFeed;

pub struct CsvTickAdapter {
    path: PathBuf,
}

impl CsvTickAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn data_error(reason: String) -> CoinTraderError {
    CoinTraderError::TickData { reason }
}

struct Columns {
    indices: HashMap<String, usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let indices = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();
        Columns { indices }
    }

    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        let index = *self.indices.get(name)?;
        record.get(index).map(str::trim).filter(|v| !v.is_empty())
    }

    fn required<'r>(
        &self,
        record: &'r StringRecord,
        name: &str,
        line: u64,
    ) -> Result<&'r str, CoinTraderError> {
        self.get(record, name)
            .ok_or_else(|| data_error(format!("line {line}: missing {name}")))
    }

    fn opt_f64(
        &self,
        record: &StringRecord,
        name: &str,
        line: u64,
    ) -> Result<Option<f64>, CoinTraderError> {
        self.get(record, name)
            .map(|v| {
                v.parse()
                    .map_err(|_| data_error(format!("line {line}: invalid {name} value {v:?}")))
            })
            .transpose()
    }

    fn opt_i64(
        &self,
        record: &StringRecord,
        name: &str,
        line: u64,
    ) -> Result<Option<i64>, CoinTraderError> {
        self.get(record, name)
            .map(|v| {
                v.parse()
                    .map_err(|_| data_error(format!("line {line}: invalid {name} value {v:?}")))
            })
            .transpose()
    }

    fn opt_timestamp(
        &self,
        record: &StringRecord,
        line: u64,
    ) -> Result<Option<DateTime<Utc>>, CoinTraderError> {
        self.get(record, "timestamp")
            .map(|v| {
                DateTime::parse_from_rfc3339(v)
                    .map(|ts| ts.with_timezone(&Utc))
                    .map_err(|e| data_error(format!("line {line}: invalid timestamp: {e}")))
            })
            .transpose()
    }
}

impl TickFeed for CsvTickAdapter {
    fn fetch_ticks(&self) -> Result<Vec<Tick>, CoinTraderError> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| {
            data_error(format!("failed to read {}: {e}", self.path.display()))
        })?;

        let headers = reader
            .headers()
            .map_err(|e| data_error(format!("CSV header error: {e}")))?
            .clone();
        let columns = Columns::from_headers(&headers);

        let mut ticks = Vec::new();
        let mut last_seen: HashMap<String, DateTime<Utc>> = HashMap::new();

        for (row, result) in reader.records().enumerate() {
            let line = row as u64 + 2; // header is line 1
            let record = result.map_err(|e| data_error(format!("CSV parse error: {e}")))?;

            let ticker = columns.required(&record, "ticker", line)?.to_string();
            let price: f64 = columns
                .required(&record, "price", line)?
                .parse()
                .map_err(|_| data_error(format!("line {line}: invalid price")))?;

            let mut tick = Tick::new(&ticker, price);
            tick.timestamp = columns.opt_timestamp(&record, line)?;
            tick.volume = columns.opt_f64(&record, "volume", line)?;
            tick.change_pct = columns.opt_f64(&record, "change_pct", line)?;
            tick.high_price = columns.opt_f64(&record, "high_price", line)?;
            tick.low_price = columns.opt_f64(&record, "low_price", line)?;
            tick.open_price = columns.opt_f64(&record, "open_price", line)?;
            tick.prev_high = columns.opt_f64(&record, "prev_high", line)?;
            tick.prev_low = columns.opt_f64(&record, "prev_low", line)?;
            tick.fear_greed_value = columns.opt_i64(&record, "fear_greed_value", line)?;

            // The engine relies on per-ticker delivery in timestamp order.
            if let Some(ts) = tick.timestamp {
                if let Some(prev) = last_seen.get(&ticker) {
                    if ts < *prev {
                        return Err(data_error(format!(
                            "line {line}: out-of-order timestamp for {ticker}: {ts} < {prev}"
                        )));
                    }
                }
                last_seen.insert(ticker.clone(), ts);
            }

            ticks.push(tick);
        }

        Ok(ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file.flush().unwrap();
        file
    }

    fn fetch(content: &str) -> Result<Vec<Tick>, CoinTraderError> {
        let file = write_csv(content);
        CsvTickAdapter::new(file.path().to_path_buf()).fetch_ticks()
    }

    #[test]
    fn parses_minimal_columns() {
        let ticks = fetch("ticker,price\nKRW-BTC,50000000\nKRW-ETH,4000000\n").unwrap();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].ticker, "KRW-BTC");
        assert_eq!(ticks[0].price, 50_000_000.0);
        assert!(ticks[0].volume.is_none());
        assert!(ticks[0].timestamp.is_none());
    }

    #[test]
    fn parses_optional_columns() {
        let ticks = fetch(
            "timestamp,ticker,price,volume,change_pct,fear_greed_value\n\
             2025-03-10T00:00:00Z,KRW-BTC,50000000,120.5,-2.5,20\n",
        )
        .unwrap();
        let tick = &ticks[0];
        assert!(tick.timestamp.is_some());
        assert_eq!(tick.volume, Some(120.5));
        assert_eq!(tick.change_pct, Some(-2.5));
        assert_eq!(tick.fear_greed_value, Some(20));
    }

    #[test]
    fn empty_cells_become_none() {
        let ticks = fetch(
            "ticker,price,volume,change_pct\nKRW-BTC,50000000,,1.5\n",
        )
        .unwrap();
        assert!(ticks[0].volume.is_none());
        assert_eq!(ticks[0].change_pct, Some(1.5));
    }

    #[test]
    fn missing_price_is_an_error() {
        let err = fetch("ticker,price\nKRW-BTC,\n").unwrap_err();
        assert!(err.to_string().contains("missing price"));
    }

    #[test]
    fn invalid_numeric_value_is_an_error() {
        let err = fetch("ticker,price,volume\nKRW-BTC,50000000,lots\n").unwrap_err();
        assert!(err.to_string().contains("invalid volume"));
    }

    #[test]
    fn out_of_order_timestamps_rejected_per_ticker() {
        let err = fetch(
            "timestamp,ticker,price\n\
             2025-03-10T01:00:00Z,KRW-BTC,50000000\n\
             2025-03-10T00:00:00Z,KRW-BTC,50100000\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("out-of-order"));
    }

    #[test]
    fn interleaved_tickers_are_ordered_independently() {
        let ticks = fetch(
            "timestamp,ticker,price\n\
             2025-03-10T02:00:00Z,KRW-BTC,50000000\n\
             2025-03-10T01:00:00Z,KRW-ETH,4000000\n\
             2025-03-10T03:00:00Z,KRW-BTC,50100000\n",
        )
        .unwrap();
        assert_eq!(ticks.len(), 3);
    }

    #[test]
    fn missing_file_is_an_error() {
        let adapter = CsvTickAdapter::new(PathBuf::from("/nonexistent/ticks.csv"));
        assert!(adapter.fetch_ticks().is_err());
    }
}
