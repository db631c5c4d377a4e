use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use log::warn;
use crate::block_state::BlockState;

mod legacy_ids;

/// First data version that uses namespaced block states instead of numeric ids.
pub const FLATTENING_DATA_VERSION: i32 = 1451;

static GLOBAL: OnceLock<BlockRegistry> = OnceLock::new();

/// How a block state maps onto a pre-1.13 numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyMapping {
    pub id: u16,
    pub data: u8,
    /// `false` when only the block name matched and the properties were dropped.
    pub exact: bool,
}

/// Canonical block-state table shared by every conversion.
///
/// The legacy tables are immutable after construction. Interned states live behind
/// a lock so concurrent conversions can add new states while sharing old ones.
pub struct BlockRegistry {
    interned: RwLock<HashSet<Arc<BlockState>>>,
    legacy_by_id: HashMap<(u16, u8), Arc<BlockState>>,
    legacy_by_state: HashMap<Arc<BlockState>, (u16, u8)>,
    legacy_by_name: HashMap<String, (u16, u8)>,
    fallback: Arc<BlockState>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        let mut registry = BlockRegistry {
            interned: RwLock::new(HashSet::new()),
            legacy_by_id: HashMap::new(),
            legacy_by_state: HashMap::new(),
            legacy_by_name: HashMap::new(),
            fallback: Arc::new(BlockState::air()),
        };
        registry.fallback = registry.intern(BlockState::air());

        for &(id, data, text) in legacy_ids::LEGACY_BLOCKS {
            let state = match BlockState::parse(text) {
                Ok(state) => registry.intern(state),
                Err(e) => {
                    warn!("skipping legacy block {}:{}: {}", id, data, e);
                    continue;
                }
            };
            registry.legacy_by_id.insert((id, data), state.clone());
            registry.legacy_by_name.entry(state.name().to_string()).or_insert((id, data));
            registry.legacy_by_state.entry(state).or_insert((id, data));
        }
        registry
    }

    pub fn global() -> &'static BlockRegistry {
        GLOBAL.get_or_init(BlockRegistry::new)
    }

    /// State substituted for anything the registry does not recognize.
    pub fn fallback(&self) -> Arc<BlockState> {
        self.fallback.clone()
    }

    /// Returns the shared instance for `state`, inserting it on first sight.
    pub fn intern(&self, state: BlockState) -> Arc<BlockState> {
        {
            let interned = self.interned.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = interned.get(&state) {
                return existing.clone();
            }
        }
        let mut interned = self.interned.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = interned.get(&state) {
            return existing.clone();
        }
        let state = Arc::new(state);
        interned.insert(state.clone());
        state
    }

    pub fn interned_count(&self) -> usize {
        self.interned.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Resolves a raw identifier as found in a file, or the fallback state.
    ///
    /// Never fails: a single unmapped block must not abort a whole conversion.
    pub fn resolve(&self, raw_identifier: &str, raw_properties: &BTreeMap<String, String>, data_version: Option<i32>) -> Arc<BlockState> {
        self.try_resolve(raw_identifier, raw_properties, data_version)
            .unwrap_or_else(|| self.fallback())
    }

    /// Like [`resolve`](Self::resolve) but reports unrecognized input as `None`.
    ///
    /// Accepts namespaced names (`minecraft:stone`), bare names (`stone`), inline
    /// property lists (`chest[facing=north]`, overridden by `raw_properties`) and,
    /// for pre-flattening data versions, numeric `id` or `id:data` identifiers.
    pub fn try_resolve(&self, raw_identifier: &str, raw_properties: &BTreeMap<String, String>, data_version: Option<i32>) -> Option<Arc<BlockState>> {
        let raw = raw_identifier.trim();
        if let Some((id, data)) = parse_numeric(raw) {
            if data_version.map_or(true, |version| version < FLATTENING_DATA_VERSION) {
                return self.resolve_legacy(id, data);
            }
            return None;
        }

        let state = BlockState::parse(raw).ok()?;
        Some(self.intern(state.with_properties(raw_properties.clone())))
    }

    /// Looks up a numeric id, retrying without the data value so at least the
    /// block type survives when the variant bits are unknown.
    pub fn resolve_legacy(&self, id: u16, data: u8) -> Option<Arc<BlockState>> {
        self.legacy_by_id.get(&(id, data))
            .or_else(|| self.legacy_by_id.get(&(id, 0)))
            .cloned()
    }

    pub fn is_exact_legacy(&self, id: u16, data: u8) -> bool {
        self.legacy_by_id.contains_key(&(id, data))
    }

    pub fn legacy_id(&self, state: &BlockState) -> Option<LegacyMapping> {
        if let Some(&(id, data)) = self.legacy_by_state.get(state) {
            return Some(LegacyMapping { id, data, exact: true });
        }
        self.legacy_by_name.get(state.name())
            .map(|&(id, data)| LegacyMapping { id, data, exact: false })
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        BlockRegistry::new()
    }
}

fn parse_numeric(raw: &str) -> Option<(u16, u8)> {
    let (id, data) = match raw.split_once(':') {
        Some((id, data)) => (id, Some(data)),
        None => (raw, None),
    };
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id = id.parse().ok()?;
    let data = match data {
        Some(data) => data.parse().ok()?,
        None => 0,
    };
    Some((id, data))
}
