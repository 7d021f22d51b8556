//! File-backed market data: one JSON snapshot per ticker, `<dir>/<TICKER>.json`.

use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use optstrat_core::market_data::{
    chain_from_snapshot, coerce_f64, quote_from_snapshot, MarketDataProvider, OptionsChain,
    OptionsChainProvider, StockQuote,
};
use optstrat_core::{StrategyError, StrategyResult};

pub struct SnapshotProvider {
    dir: PathBuf,
}

impl SnapshotProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SnapshotProvider { dir: dir.into() }
    }

    fn path_for(&self, ticker: &str) -> StrategyResult<PathBuf> {
        let ticker = ticker.trim().to_ascii_uppercase();
        let valid = !ticker.is_empty()
            && ticker
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^'))
            && !ticker.starts_with('.');
        if !valid {
            return Err(StrategyError::invalid("ticker", format!("invalid ticker '{}'", ticker)));
        }
        Ok(self.dir.join(format!("{}.json", ticker)))
    }

    fn load(&self, ticker: &str) -> StrategyResult<Value> {
        let path = self.path_for(ticker)?;
        debug!(path = %path.display(), "reading market snapshot");
        let contents = fs::read_to_string(&path).map_err(|e| {
            StrategyError::unavailable(
                "snapshot",
                format!("cannot read {}: {}", path.display(), e),
            )
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            StrategyError::unavailable(
                "snapshot",
                format!("malformed {}: {}", path.display(), e),
            )
        })
    }

    /// Daily closes recorded in the snapshot, oldest first.
    pub fn history(&self, ticker: &str) -> StrategyResult<Vec<f64>> {
        let snap = self.load(ticker)?;
        Ok(snap
            .get("history")
            .and_then(Value::as_array)
            .map(|h| {
                h.iter()
                    .map(|v| coerce_f64(Some(v), f64::NAN))
                    .filter(|x| x.is_finite())
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl MarketDataProvider for SnapshotProvider {
    fn quote(&self, ticker: &str) -> StrategyResult<StockQuote> {
        quote_from_snapshot(ticker, &self.load(ticker)?)
    }
}

impl OptionsChainProvider for SnapshotProvider {
    fn chain(&self, ticker: &str) -> StrategyResult<OptionsChain> {
        chain_from_snapshot(ticker, &self.load(ticker)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider_with(ticker: &str, doc: &Value) -> SnapshotProvider {
        let dir = std::env::temp_dir().join(format!("optstrat-snap-{}-{}", std::process::id(), ticker));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.json", ticker)), doc.to_string()).unwrap();
        SnapshotProvider::new(dir)
    }

    #[test]
    fn test_quote_from_file() {
        let p = provider_with(
            "ACME",
            &json!({"info": {"longName": "Acme"}, "history": [100, 101, 99.5, 100.25]}),
        );
        let q = p.quote("acme").unwrap();
        assert_eq!(q.ticker, "ACME");
        assert_eq!(q.current_price, 100.25);
        assert_eq!(p.history("ACME").unwrap().len(), 4);
    }

    #[test]
    fn test_missing_snapshot_is_upstream_failure() {
        let p = SnapshotProvider::new(std::env::temp_dir());
        let err = p.quote("NOSUCHTICKER").unwrap_err();
        assert!(matches!(err, StrategyError::UpstreamDataUnavailable { .. }));
    }

    #[test]
    fn test_path_traversal_rejected() {
        let p = SnapshotProvider::new("/tmp");
        assert!(p.chain("../etc/passwd").is_err());
        assert!(matches!(
            p.quote("..").unwrap_err(),
            StrategyError::InvalidParameter { .. }
        ));
    }
}
