//! Trade store backends.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use trading_core::error::StoreError;
use trading_core::traits::{SessionRecord, SessionUpdate, TradeRecord, TradeStore, TradeUpdate};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
}

/// A persisted trade with its latest exit record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTrade {
    pub record: TradeRecord,
    pub update: Option<TradeUpdate>,
}

/// A persisted session with its latest running totals.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub record: SessionRecord,
    pub update: Option<SessionUpdate>,
}

#[derive(Debug, Default)]
struct MemoryState {
    trades: BTreeMap<i64, StoredTrade>,
    sessions: BTreeMap<i64, StoredSession>,
}

/// In-process store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trade(&self, id: i64) -> Option<StoredTrade> {
        lock(&self.state).ok()?.trades.get(&id).cloned()
    }

    pub fn session(&self, id: i64) -> Option<StoredSession> {
        lock(&self.state).ok()?.sessions.get(&id).cloned()
    }

    pub fn trade_count(&self) -> usize {
        lock(&self.state).map(|s| s.trades.len()).unwrap_or(0)
    }
}

impl TradeStore for MemoryStore {
    fn record_trade(&self, trade: &TradeRecord) -> Result<i64, StoreError> {
        let mut state = lock(&self.state)?;
        let id = state.trades.keys().next_back().map_or(1, |last| last + 1);
        state.trades.insert(
            id,
            StoredTrade {
                record: trade.clone(),
                update: None,
            },
        );
        Ok(id)
    }

    fn update_trade(&self, trade_id: i64, update: &TradeUpdate) -> Result<(), StoreError> {
        let mut state = lock(&self.state)?;
        let trade = state
            .trades
            .get_mut(&trade_id)
            .ok_or_else(|| StoreError::NotFound(format!("trade {}", trade_id)))?;
        trade.update = Some(update.clone());
        Ok(())
    }

    fn record_session(&self, session: &SessionRecord) -> Result<i64, StoreError> {
        let mut state = lock(&self.state)?;
        let id = state.sessions.keys().next_back().map_or(1, |last| last + 1);
        state.sessions.insert(
            id,
            StoredSession {
                record: session.clone(),
                update: None,
            },
        );
        Ok(id)
    }

    fn update_session(&self, session_id: i64, update: &SessionUpdate) -> Result<(), StoreError> {
        let mut state = lock(&self.state)?;
        let session = state
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| StoreError::NotFound(format!("session {}", session_id)))?;
        session.update = Some(update.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// One line of the JSON-lines event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    TradeOpened { id: i64, trade: TradeRecord },
    TradeClosed { id: i64, update: TradeUpdate },
    SessionStarted { id: i64, session: SessionRecord },
    SessionUpdated { id: i64, update: SessionUpdate },
}

#[derive(Debug, Default)]
struct IdCounters {
    last_trade: i64,
    last_session: i64,
}

/// Append-only event log, one JSON object per line.
///
/// Every call opens the file, appends one line and closes it again. Ids
/// continue from the highest ones already present in the log.
#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
    ids: Mutex<IdCounters>,
}

impl JsonlStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut ids = IdCounters::default();
        for event in read_events(&path)? {
            match event {
                StoreEvent::TradeOpened { id, .. } => ids.last_trade = ids.last_trade.max(id),
                StoreEvent::SessionStarted { id, .. } => ids.last_session = ids.last_session.max(id),
                _ => {}
            }
        }
        debug!(path = %path.display(), last_trade = ids.last_trade, last_session = ids.last_session, "Opened trade log");

        Ok(Self {
            path,
            ids: Mutex::new(ids),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All events currently in the log, in write order.
    pub fn events(&self) -> Result<Vec<StoreEvent>, StoreError> {
        read_events(&self.path)
    }

    fn append(&self, event: &StoreEvent) -> Result<(), StoreError> {
        let line = serde_json::to_string(event).map_err(|e| StoreError::Encoding(e.to_string()))?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

fn read_events(path: &Path) -> Result<Vec<StoreEvent>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = fs::File::open(path)?;
    let mut events = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|e| StoreError::Encoding(e.to_string()))?;
        events.push(event);
    }
    Ok(events)
}

impl TradeStore for JsonlStore {
    fn record_trade(&self, trade: &TradeRecord) -> Result<i64, StoreError> {
        let mut ids = lock(&self.ids)?;
        let id = ids.last_trade + 1;
        self.append(&StoreEvent::TradeOpened {
            id,
            trade: trade.clone(),
        })?;
        ids.last_trade = id;
        Ok(id)
    }

    fn update_trade(&self, trade_id: i64, update: &TradeUpdate) -> Result<(), StoreError> {
        let ids = lock(&self.ids)?;
        if trade_id < 1 || trade_id > ids.last_trade {
            return Err(StoreError::NotFound(format!("trade {}", trade_id)));
        }
        self.append(&StoreEvent::TradeClosed {
            id: trade_id,
            update: update.clone(),
        })
    }

    fn record_session(&self, session: &SessionRecord) -> Result<i64, StoreError> {
        let mut ids = lock(&self.ids)?;
        let id = ids.last_session + 1;
        self.append(&StoreEvent::SessionStarted {
            id,
            session: session.clone(),
        })?;
        ids.last_session = id;
        Ok(id)
    }

    fn update_session(&self, session_id: i64, update: &SessionUpdate) -> Result<(), StoreError> {
        let ids = lock(&self.ids)?;
        if session_id < 1 || session_id > ids.last_session {
            return Err(StoreError::NotFound(format!("session {}", session_id)));
        }
        self.append(&StoreEvent::SessionUpdated {
            id: session_id,
            update: update.clone(),
        })
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use rust_decimal_macros::dec;
    use trading_core::traits::{SessionStatus, TradeStatus};
    use trading_core::types::{Direction, Timeframe};

    fn trade() -> TradeRecord {
        TradeRecord {
            session_id: Some(1),
            symbol: "EURUSD".into(),
            direction: Direction::Short,
            entry_price: dec!(1.0850),
            size: dec!(0.2),
            stop_loss: dec!(1.0877),
            take_profit: dec!(1.0769),
            entry_time: DateTime::<Utc>::UNIX_EPOCH,
            deal_id: "DEAL-9".into(),
        }
    }

    fn exit() -> TradeUpdate {
        TradeUpdate {
            exit_price: dec!(1.0769),
            pnl: dec!(0.0015),
            status: TradeStatus::Closed,
            exit_time: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn session() -> SessionRecord {
        SessionRecord {
            symbol: "EURUSD".into(),
            timeframe: Timeframe::Minute5,
            initial_balance: dec!(1000),
            started_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn session_update() -> SessionUpdate {
        SessionUpdate {
            status: SessionStatus::Active,
            final_balance: dec!(1000),
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            total_pnl: dec!(0),
            max_drawdown: dec!(0),
            ended_at: None,
        }
    }

    #[test]
    fn test_memory_store_ids_and_updates() {
        let store = MemoryStore::new();
        assert_eq!(store.record_trade(&trade()).unwrap(), 1);
        assert_eq!(store.record_trade(&trade()).unwrap(), 2);
        store.update_trade(2, &exit()).unwrap();

        assert!(store.trade(1).unwrap().update.is_none());
        assert_eq!(store.trade(2).unwrap().update, Some(exit()));
        assert!(matches!(store.update_trade(9, &exit()), Err(StoreError::NotFound(_))));

        let sid = store.record_session(&session()).unwrap();
        store.update_session(sid, &session_update()).unwrap();
        assert_eq!(store.session(sid).unwrap().update, Some(session_update()));
    }

    #[test]
    fn test_jsonl_store_appends_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log").join("trades.jsonl");

        let store = JsonlStore::open(&path).unwrap();
        let sid = store.record_session(&session()).unwrap();
        let tid = store.record_trade(&trade()).unwrap();
        store.update_trade(tid, &exit()).unwrap();
        store.update_session(sid, &session_update()).unwrap();
        assert!(store.update_trade(5, &exit()).is_err());

        let events = store.events().unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[1], StoreEvent::TradeOpened { id: 1, trade: trade() });

        let reopened = JsonlStore::open(&path).unwrap();
        assert_eq!(reopened.record_trade(&trade()).unwrap(), 2);
        assert_eq!(reopened.record_session(&session()).unwrap(), 2);
    }

    #[test]
    fn test_jsonl_store_rejects_corrupt_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.jsonl");
        fs::write(&path, "not json\n").unwrap();
        assert!(matches!(JsonlStore::open(&path), Err(StoreError::Encoding(_))));
    }
}
