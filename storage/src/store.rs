//! The indexed statement store (§3.6, §4.H).

use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

use rdf_model::{Node, Statement};
use smallvec::SmallVec;

use crate::error::{StoreError, StoreResult};
use crate::index::{self, IndexKind, Key, ScanMode};
use crate::nodes::{NodeId, Nodes};
use crate::observability::{track_operation, OperationType};
use crate::pattern::QuadPattern;

/// Which optional orderings a store maintains besides the mandatory SPO
/// index. More orderings speed up pattern lookups at the cost of memory
/// and insert/erase time; §4.H.1 leaves the choice to the implementer.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    kinds: Vec<IndexKind>,
}

impl IndexConfig {
    /// SPO only: the minimum a store needs to function.
    pub fn minimal() -> IndexConfig {
        IndexConfig { kinds: vec![IndexKind::Spo] }
    }

    /// Every ordering this crate defines.
    pub fn full() -> IndexConfig {
        IndexConfig { kinds: IndexKind::all().to_vec() }
    }

    fn kinds(&self) -> &[IndexKind] {
        &self.kinds
    }
}

impl Default for IndexConfig {
    fn default() -> IndexConfig {
        IndexConfig::full()
    }
}

/// A statement as stored: interned node ids plus an optional graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StoredKey {
    s: NodeId,
    p: NodeId,
    o: NodeId,
    g: Option<NodeId>,
}

/// An indexed, in-process (s, p, o, g?) statement store (§3.6). Single
/// threaded: `QuadStore` is neither `Sync` nor intended to be shared
/// across threads without external synchronization, matching §5's
/// single-threaded, in-process scope.
#[derive(Debug)]
pub struct QuadStore {
    nodes: Nodes,
    config: IndexConfig,
    /// At most ten orderings (`IndexKind::all().len()`) ever exist, so a
    /// `SmallVec` keeps this inline instead of a heap allocation.
    indexes: SmallVec<[(IndexKind, BTreeSet<Key>); 10]>,
    /// Canonical record of every live statement, used for equality
    /// (§4.H.4) and to drive index insertion/removal consistently.
    statements: BTreeSet<StoredKey>,
    /// Bumped on every mutation; an iterator captures the version at
    /// creation and checks it on each step (§4.H.3's "bad iterator").
    ///
    /// Shared via `Rc<Cell<_>>` rather than borrowed: a [`StatementIter`]
    /// owns a clone of this handle instead of a `&QuadStore`, so creating
    /// an iterator does not hold a live borrow across the store's
    /// subsequent `&mut self` mutations. The borrow checker therefore
    /// can't reject the invalidation scenario the way it would if the
    /// iterator borrowed the store directly; the version counter is the
    /// only mechanism left (and the one §4.H.3 actually specifies) to
    /// detect "read after a mutation that should have invalidated me".
    version: Rc<Cell<u64>>,
}

impl QuadStore {
    pub fn new() -> QuadStore {
        QuadStore::with_config(IndexConfig::default())
    }

    pub fn with_config(config: IndexConfig) -> QuadStore {
        let indexes = config
            .kinds()
            .iter()
            .copied()
            .map(|kind| (kind, BTreeSet::new()))
            .collect();
        QuadStore {
            nodes: Nodes::new(),
            config,
            indexes,
            statements: BTreeSet::new(),
            version: Rc::new(Cell::new(0)),
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Adds `subject predicate object [graph]`. Interns every node
    /// first. If an equal statement already exists the operation is a
    /// non-fatal no-op (§4.H.3: "returns a non-fatal failure status").
    pub fn add(&mut self, subject: &Node, predicate: &Node, object: &Node, graph: Option<&Node>) -> StoreResult<()> {
        track_operation(OperationType::Add, || {
            Statement::new(subject.clone(), predicate.clone(), object.clone(), graph.cloned())
                .map_err(StoreError::from)?;

            let s = self.nodes.intern(subject.clone());
            let p = self.nodes.intern(predicate.clone());
            let o = self.nodes.intern(object.clone());
            let g = graph.map(|g| self.nodes.intern(g.clone()));
            let key = StoredKey { s, p, o, g };

            if !self.statements.insert(key) {
                return Err(StoreError::Failure("statement already present".into()));
            }
            for (kind, set) in &mut self.indexes {
                set.insert(kind.make_key(s, p, o, g));
            }
            self.version.set(self.version.get() + 1);
            Ok(())
        })
    }

    /// Removes every statement matching `pattern`. Returns the number
    /// removed; removing zero matches is not itself a failure (§4.H.3
    /// treats "no iterator" mutation uniformly, unlike `add`'s duplicate
    /// case). Invalidates all outstanding iterators.
    pub fn erase(&mut self, pattern: &QuadPattern) -> StoreResult<usize> {
        track_operation(OperationType::Erase, || {
            let resolved = pattern.resolve(&self.nodes);
            if resolved.is_impossible() {
                return Ok(0);
            }
            let plan = index::plan_for(&resolved, self.config.kinds());
            let doomed: Vec<StoredKey> = self
                .scan(&plan, &resolved)
                .map(|key| self.stored_key_from(plan.kind, key))
                .collect();
            for key in &doomed {
                self.remove_stored(*key);
            }
            if !doomed.is_empty() {
                self.version.set(self.version.get() + 1);
            }
            Ok(doomed.len())
        })
    }

    /// Removes every statement whose canonical SPO key falls in
    /// `range`, a half-open pair of `(start, end)` bounds over the SPO
    /// ordering (§4.H.3's range-mutation entry point, distinct from
    /// pattern-based `erase`).
    pub fn erase_range(
        &mut self,
        lower: std::ops::Bound<(NodeId, NodeId, NodeId, Option<NodeId>)>,
        upper: std::ops::Bound<(NodeId, NodeId, NodeId, Option<NodeId>)>,
    ) -> StoreResult<usize> {
        track_operation(OperationType::EraseRange, || {
            let lower_key = lower.map(|(s, p, o, g)| (Some(s), Some(p), Some(o), g));
            let upper_key = upper.map(|(s, p, o, g)| (Some(s), Some(p), Some(o), g));
            let spo = self.spo_set();
            let doomed: Vec<StoredKey> = spo
                .range((lower_key, upper_key))
                .map(|key| self.stored_key_from(IndexKind::Spo, *key))
                .collect();
            for key in &doomed {
                self.remove_stored(*key);
            }
            if !doomed.is_empty() {
                self.version.set(self.version.get() + 1);
            }
            Ok(doomed.len())
        })
    }

    /// Counts statements matching `pattern` without allocating an
    /// iterator's worth of node clones.
    pub fn count(&self, pattern: &QuadPattern) -> StoreResult<usize> {
        track_operation(OperationType::Count, || {
            let resolved = pattern.resolve(&self.nodes);
            if resolved.is_impossible() {
                return Ok(0);
            }
            let plan = index::plan_for(&resolved, self.config.kinds());
            Ok(self.scan(&plan, &resolved).count())
        })
    }

    /// Does any statement match `pattern`?
    pub fn ask(&self, pattern: &QuadPattern) -> StoreResult<bool> {
        track_operation(OperationType::Ask, || {
            let resolved = pattern.resolve(&self.nodes);
            if resolved.is_impossible() {
                return Ok(false);
            }
            let plan = index::plan_for(&resolved, self.config.kinds());
            Ok(self.scan(&plan, &resolved).next().is_some())
        })
    }

    /// Finds every statement matching `pattern`, materialized as owned
    /// `Statement`s. Use [`QuadStore::count`]/[`QuadStore::ask`] instead
    /// when the statements themselves are not needed.
    pub fn find(&self, pattern: &QuadPattern) -> StoreResult<Vec<Statement>> {
        track_operation(OperationType::Find, || self.resolve_statements(pattern))
    }

    fn resolve_statements(&self, pattern: &QuadPattern) -> StoreResult<Vec<Statement>> {
        let resolved = pattern.resolve(&self.nodes);
        if resolved.is_impossible() {
            return Ok(Vec::new());
        }
        let plan = index::plan_for(&resolved, self.config.kinds());
        let mut out = Vec::new();
        for key in self.scan(&plan, &resolved) {
            let stored = self.stored_key_from(plan.kind, key);
            let stmt = Statement::new(
                self.nodes.get(stored.s).clone(),
                self.nodes.get(stored.p).clone(),
                self.nodes.get(stored.o).clone(),
                stored.g.map(|g| self.nodes.get(g).clone()),
            )
            .map_err(StoreError::from)?;
            out.push(stmt);
        }
        Ok(out)
    }

    /// Builds a snapshot cursor over `pattern` that reports
    /// [`StoreError::BadIterator`] on every step taken after the store
    /// mutates (§4.H.3: mutation during iteration invalidates it rather
    /// than silently returning stale or skipped results).
    ///
    /// Unlike a borrowing iterator (e.g. `std::collections`'s), this
    /// holds no reference to the store at all: its matches are resolved
    /// eagerly into owned `Statement`s and it tracks staleness through a
    /// shared `version` handle, so `QuadStore::add`/`erase` (which take
    /// `&mut self`) remain callable while an iterator is alive — exactly
    /// the scenario whose invalidation §4.H.3 specifies.
    pub fn iter(&self, pattern: &QuadPattern) -> StoreResult<StatementIter> {
        let items = self.resolve_statements(pattern)?;
        Ok(StatementIter {
            items,
            position: 0,
            version: Rc::clone(&self.version),
            snapshot: self.version.get(),
        })
    }

    /// Two stores are equal iff they hold the same set of statements:
    /// a size check, then one parallel walk of the canonical SPO index
    /// comparing resolved nodes rather than raw ids, since the two
    /// stores' interning tables assign ids independently (§4.H.4).
    pub fn statements_equal(&self, other: &QuadStore) -> bool {
        if self.statements.len() != other.statements.len() {
            return false;
        }
        self.spo_set()
            .iter()
            .zip(other.spo_set().iter())
            .all(|(a, b)| {
                let a = self.stored_key_from(IndexKind::Spo, *a);
                let b = other.stored_key_from(IndexKind::Spo, *b);
                self.nodes.get(a.s) == other.nodes.get(b.s)
                    && self.nodes.get(a.p) == other.nodes.get(b.p)
                    && self.nodes.get(a.o) == other.nodes.get(b.o)
                    && a.g.map(|g| self.nodes.get(g)) == b.g.map(|g| other.nodes.get(g))
            })
    }

    fn spo_set(&self) -> &BTreeSet<Key> {
        &self.indexes.iter().find(|(kind, _)| *kind == IndexKind::Spo).expect("SPO index always enabled").1
    }

    fn scan<'a>(&'a self, plan: &index::Plan, resolved: &'a crate::pattern::ResolvedPattern) -> impl Iterator<Item = Key> + 'a {
        let kind = plan.kind;
        let mode = plan.mode;
        let bounds = (plan.lower.clone(), plan.upper.clone());
        let set: &'a BTreeSet<Key> = &self.indexes.iter().find(|(k, _)| *k == kind).expect("planned index exists").1;
        let needs_filter = matches!(mode, ScanMode::FilterRange | ScanMode::FilterAll);
        let iter: Box<dyn Iterator<Item = Key> + 'a> = match mode {
            ScanMode::Point | ScanMode::Range | ScanMode::FilterRange => Box::new(set.range(bounds).copied()),
            ScanMode::FilterAll => Box::new(set.iter().copied()),
        };
        iter.filter(move |key| !needs_filter || resolved.matches_key(kind, key))
    }

    fn stored_key_from(&self, kind: IndexKind, key: Key) -> StoredKey {
        let (a, b, c, d) = key;
        match kind {
            IndexKind::Spo => StoredKey { s: a.unwrap(), p: b.unwrap(), o: c.unwrap(), g: d },
            IndexKind::Sop => StoredKey { s: a.unwrap(), p: c.unwrap(), o: b.unwrap(), g: d },
            IndexKind::Ops => StoredKey { s: c.unwrap(), p: b.unwrap(), o: a.unwrap(), g: d },
            IndexKind::Osp => StoredKey { s: b.unwrap(), p: c.unwrap(), o: a.unwrap(), g: d },
            IndexKind::Pso => StoredKey { s: b.unwrap(), p: a.unwrap(), o: c.unwrap(), g: d },
            IndexKind::Pos => StoredKey { s: c.unwrap(), p: a.unwrap(), o: b.unwrap(), g: d },
            IndexKind::Gspo => StoredKey { s: b.unwrap(), p: c.unwrap(), o: d.unwrap(), g: a },
            IndexKind::Gsop => StoredKey { s: b.unwrap(), p: d.unwrap(), o: c.unwrap(), g: a },
            IndexKind::Gpso => StoredKey { s: c.unwrap(), p: b.unwrap(), o: d.unwrap(), g: a },
            IndexKind::Gosp => StoredKey { s: c.unwrap(), p: d.unwrap(), o: b.unwrap(), g: a },
        }
    }

    fn remove_stored(&mut self, key: StoredKey) {
        self.statements.remove(&key);
        for (kind, set) in &mut self.indexes {
            set.remove(&kind.make_key(key.s, key.p, key.o, key.g));
        }
    }
}

impl StoredKey {
    fn to_key(self) -> Key {
        (Some(self.s), Some(self.p), Some(self.o), self.g)
    }
}

impl Default for QuadStore {
    fn default() -> QuadStore {
        QuadStore::new()
    }
}

/// A snapshot iterator over a [`QuadStore`]. Its matches are resolved
/// eagerly at construction, so it holds no borrow of the store; it tracks
/// a shared `version` handle instead, and any step taken after the store
/// mutates returns [`StoreError::BadIterator`] instead of stale or skipped
/// results.
pub struct StatementIter {
    items: Vec<Statement>,
    position: usize,
    version: Rc<Cell<u64>>,
    snapshot: u64,
}

impl Iterator for StatementIter {
    type Item = StoreResult<Statement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.items.len() {
            return None;
        }
        if self.version.get() != self.snapshot {
            return Some(Err(StoreError::BadIterator));
        }
        let stmt = self.items[self.position].clone();
        self.position += 1;
        Some(Ok(stmt))
    }
}
