//! Generic entity reconciliation.
//!
//! Each tick the simulator reports the ids of the entities it currently
//! considers alive. [`reconcile`] diffs that snapshot against the locally
//! tracked entities of one kind and issues exactly the lifecycle calls needed
//! to make them agree:
//!
//! - `to_update = live ∩ tracked` – fetch attributes, update the visual
//! - `to_remove = tracked − live` – destroy the visual, forget the entity
//! - `to_create = live − tracked` – fetch attributes, create the visual
//!
//! Groups are processed in that order, and ids inside a group in ascending
//! lexical order, so identical inputs always produce identical call
//! sequences.
//!
//! # Failure Isolation
//!
//! A [`FetchError`] only affects the id it was raised for. An update that
//! fails leaves the tracked entity untouched (it is retried next tick); a
//! create that fails inserts nothing (the id is reconsidered next tick while
//! it stays live). Removals never query the simulator and always succeed.
//!
//! # Per-Kind Behavior
//!
//! Entity kinds plug in through [`ReconcileOps`]. Adapters compose a
//! simulator, a rendering sink and the world bounds behind that trait; the
//! reconciler itself knows nothing about vehicles or traffic lights.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use crate::error::FetchError;
use crate::simulator::EntityKind;

/// Capability set of one entity kind.
pub trait ReconcileOps {
    /// Opaque visual resource owned by a tracked entity.
    type Handle;
    /// Attributes fetched from the simulator for one entity.
    type Attrs: Clone;

    /// Query the current attributes of `id`.
    ///
    /// `previous` holds the attributes recorded at the last successful
    /// create or update, and is `None` when the entity is about to be
    /// created. Kinds with static data can reuse it instead of re-querying.
    fn fetch_attributes(
        &mut self,
        id: &str,
        previous: Option<&Self::Attrs>,
    ) -> Result<Self::Attrs, FetchError>;

    fn create_visual(&mut self, id: &str, attrs: &Self::Attrs) -> Self::Handle;

    fn update_visual(&mut self, id: &str, handle: &Self::Handle, attrs: &Self::Attrs);

    /// Release a visual. The handle is consumed so it cannot be released twice.
    fn destroy_visual(&mut self, handle: Self::Handle);
}

/// A live id paired with its owned visual resource.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntity<H, A> {
    id: String,
    kind: EntityKind,
    handle: H,
    last: A,
}

impl<H, A> TrackedEntity<H, A> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Attributes recorded at the last successful create or update.
    pub fn last_attributes(&self) -> &A {
        &self.last
    }
}

/// All tracked entities of one kind, keyed by id.
#[derive(Debug, Clone)]
pub struct ReconciliationSet<H, A> {
    kind: EntityKind,
    entries: BTreeMap<String, TrackedEntity<H, A>>,
}

impl<H, A> ReconciliationSet<H, A> {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&TrackedEntity<H, A>> {
        self.entries.get(id)
    }

    /// Tracked ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedEntity<H, A>> {
        self.entries.values()
    }

    /// Forget all entities, handing each visual to `destroy` in id order.
    pub fn clear(&mut self, mut destroy: impl FnMut(H)) -> usize {
        let count = self.entries.len();
        for (_, entity) in std::mem::take(&mut self.entries) {
            destroy(entity.handle);
        }
        count
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub destroyed: Vec<String>,
    /// Ids skipped this pass because their attributes could not be fetched.
    pub failures: Vec<FetchError>,
}

impl ReconcileReport {
    /// True when the pass created or destroyed nothing.
    pub fn is_stable(&self) -> bool {
        self.created.is_empty() && self.destroyed.is_empty()
    }
}

/// The three id groups of a diff, each in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub to_create: Vec<String>,
    pub to_update: Vec<String>,
    pub to_remove: Vec<String>,
}

/// Split `tracked` and `live` into create/update/remove groups.
///
/// Both inputs are sorted, so a single merge walk suffices.
pub fn diff_ids<'a>(
    tracked: impl IntoIterator<Item = &'a str>,
    live: &BTreeSet<String>,
) -> Diff {
    let mut diff = Diff::default();
    let mut tracked = tracked.into_iter().peekable();
    let mut live = live.iter().map(String::as_str).peekable();

    loop {
        match (tracked.peek().copied(), live.peek().copied()) {
            (Some(t), Some(l)) => match t.cmp(l) {
                Ordering::Less => {
                    diff.to_remove.push(t.to_string());
                    tracked.next();
                }
                Ordering::Greater => {
                    diff.to_create.push(l.to_string());
                    live.next();
                }
                Ordering::Equal => {
                    diff.to_update.push(t.to_string());
                    tracked.next();
                    live.next();
                }
            },
            (Some(t), None) => {
                diff.to_remove.push(t.to_string());
                tracked.next();
            }
            (None, Some(l)) => {
                diff.to_create.push(l.to_string());
                live.next();
            }
            (None, None) => break,
        }
    }
    diff
}

/// Align `set` with the `live` snapshot through `ops`.
///
/// Duplicate ids in `live` are collapsed.
pub fn reconcile<O>(
    set: &mut ReconciliationSet<O::Handle, O::Attrs>,
    live: impl IntoIterator<Item = String>,
    ops: &mut O,
) -> ReconcileReport
where
    O: ReconcileOps,
{
    let live: BTreeSet<String> = live.into_iter().collect();
    let diff = diff_ids(set.ids(), &live);
    let mut report = ReconcileReport::default();

    for id in diff.to_update {
        let Some(entity) = set.entries.get_mut(&id) else {
            continue;
        };
        match ops.fetch_attributes(&id, Some(&entity.last)) {
            Ok(attrs) => {
                ops.update_visual(&id, &entity.handle, &attrs);
                entity.last = attrs;
                report.updated.push(id);
            }
            Err(e) => {
                warn!("Skipping update this tick: {}", e);
                report.failures.push(e);
            }
        }
    }

    for id in diff.to_remove {
        if let Some(entity) = set.entries.remove(&id) {
            ops.destroy_visual(entity.handle);
            report.destroyed.push(id);
        }
    }

    for id in diff.to_create {
        match ops.fetch_attributes(&id, None) {
            Ok(attrs) => {
                let handle = ops.create_visual(&id, &attrs);
                set.entries.insert(
                    id.clone(),
                    TrackedEntity {
                        id: id.clone(),
                        kind: set.kind,
                        handle,
                        last: attrs,
                    },
                );
                report.created.push(id);
            }
            Err(e) => {
                warn!("Skipping creation this tick: {}", e);
                report.failures.push(e);
            }
        }
    }

    report
}
