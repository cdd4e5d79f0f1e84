//! Litmus files
//!
//! A litmus file is a JSON description of one execution graph. Events are
//! listed in insertion order and named by `id`; `"init"` names the
//! initializer. Spawned threads `1..=threads` are created by the main
//! thread (thread `0`) before any listed event.
//!
//! ```json
//! {
//!   "name": "SB",
//!   "threads": 1,
//!   "expect": { "sc": false, "tso": true },
//!   "events": [
//!     { "id": "wx", "thread": 0, "op": "write", "addr": 0, "ordering": "rlx" },
//!     { "id": "ry", "thread": 0, "op": "read",  "addr": 8, "ordering": "rlx", "rf": "init" },
//!     { "id": "wy", "thread": 1, "op": "write", "addr": 8, "ordering": "rlx" },
//!     { "id": "rx", "thread": 1, "op": "read",  "addr": 0, "ordering": "rlx", "rf": "init" }
//!   ]
//! }
//! ```
//!
//! A plain read may name a write listed after it (load buffering); it is
//! first linked to the initializer and redirected once every event exists.

use crate::domain::checker::ModelType;
use crate::domain::graph::{
    Addr, CoPlacement, Deps, Event, EventLabel, ExecutionGraph, MemOrdering, RmwKind, ThreadId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reference to the initializer
pub const INIT_ID: &str = "init";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Failure to load or build a litmus file
#[derive(Debug, thiserror::Error)]
pub enum LitmusError {
    /// File could not be read
    #[error("cannot read litmus file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Malformed JSON or unknown fields
    #[error("invalid litmus JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Two events share an id
    #[error("duplicate event id: {0}")]
    DuplicateId(String),

    /// An event sits on a thread that was never spawned
    #[error("event {id} on unknown thread {thread}")]
    UnknownThread {
        /// Event id
        id: String,
        /// Requested thread
        thread: u32,
    },

    /// A reference does not resolve to a suitable event
    #[error("event {id} references {reference}: {reason}")]
    BadReference {
        /// Referencing event
        id: String,
        /// The reference as written
        reference: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// `rmw_write` not directly preceded by an `rmw_read` of its thread
    #[error("rmw_write {0} without a preceding rmw_read")]
    MissingRmwRead(String),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// File Format
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A litmus test: one execution graph plus expected verdicts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LitmusTest {
    /// Test name
    pub name: String,

    /// Number of threads spawned by the main thread
    #[serde(default)]
    pub threads: u32,

    /// Expected consistency verdict per model
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expect: BTreeMap<ModelType, bool>,

    /// Events in insertion order
    pub events: Vec<LitmusEvent>,
}

/// One event of a litmus test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LitmusEvent {
    /// Unique name
    pub id: String,

    /// Thread the event belongs to
    pub thread: u32,

    /// What the event does
    #[serde(flatten)]
    pub op: LitmusOp,

    /// Data dependencies (ids of earlier events)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<String>,

    /// Address dependencies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addr_deps: Vec<String>,

    /// Control dependencies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ctrl: Vec<String>,
}

/// Event operation, tagged by `op`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LitmusOp {
    /// Plain read
    Read {
        /// Location
        addr: u64,
        /// Heap location
        #[serde(default)]
        heap: bool,
        /// Ordering
        ordering: MemOrdering,
        /// Observed write
        rf: String,
    },
    /// Plain write
    Write {
        /// Location
        addr: u64,
        /// Heap location
        #[serde(default)]
        heap: bool,
        /// Ordering
        ordering: MemOrdering,
        /// Coherence predecessor; coherence-maximal when absent
        #[serde(default)]
        co_after: Option<String>,
    },
    /// Read half of an RMW
    RmwRead {
        /// Location
        addr: u64,
        /// Heap location
        #[serde(default)]
        heap: bool,
        /// Ordering
        ordering: MemOrdering,
        /// Observed write (must be listed earlier)
        rf: String,
        /// RMW flavour
        #[serde(default = "default_rmw_kind")]
        kind: RmwKind,
    },
    /// Write half of an RMW
    RmwWrite {
        /// Ordering
        ordering: MemOrdering,
    },
    /// Fence
    Fence {
        /// Ordering
        ordering: MemOrdering,
    },
    /// Allocation
    Malloc {
        /// Base address (heap)
        addr: u64,
        /// Size in bytes
        size: u64,
    },
    /// Deallocation
    Free {
        /// Base address (heap)
        addr: u64,
    },
    /// Hazard-pointer retirement
    HpRetire {
        /// Base address (heap)
        addr: u64,
    },
    /// Library method entry
    MethodBegin {
        /// Method name
        name: String,
    },
    /// Library method exit
    MethodEnd {
        /// Method name
        name: String,
    },
    /// Wait for a thread to finish
    Join {
        /// Joined thread
        child: u32,
    },
    /// Last event of a thread
    Finish,
}

const fn default_rmw_kind() -> RmwKind {
    RmwKind::FetchOp
}

const fn location(addr: u64, heap: bool) -> Addr {
    if heap {
        Addr::heap(addr)
    } else {
        Addr::global(addr)
    }
}

/// Graph built from a litmus test, with the event ids resolved
#[derive(Debug, Clone)]
pub struct LitmusGraph {
    /// The execution graph
    pub graph: ExecutionGraph,
    /// Event of every id
    pub ids: BTreeMap<String, Event>,
}

impl LitmusGraph {
    /// Event named `id` (`"init"` is the initializer)
    pub fn event(&self, id: &str) -> Option<Event> {
        if id == INIT_ID {
            return Some(Event::INIT);
        }
        self.ids.get(id).copied()
    }

    /// Id of `e`
    pub fn name_of(&self, e: Event) -> Option<&str> {
        if e.is_init() {
            return Some(INIT_ID);
        }
        self.ids
            .iter()
            .find(|(_, ev)| **ev == e)
            .map(|(id, _)| id.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Loading
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl LitmusTest {
    /// Parse a litmus test from JSON
    pub fn from_json(json: &str) -> Result<Self, LitmusError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a litmus file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LitmusError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LitmusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let test = Self::from_json(&json)?;
        debug!(name = %test.name, path = %path.display(), events = test.events.len(), "litmus file loaded");
        Ok(test)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, LitmusError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the execution graph
    ///
    /// Views are not computed; run the checker's `update_all_views` first.
    pub fn build(&self) -> Result<LitmusGraph, LitmusError> {
        let mut builder = Builder::new(self.threads);
        for event in &self.events {
            builder.add(event)?;
        }
        builder.link_deferred_reads()?;
        for event in &self.events {
            builder.attach_deps(event)?;
        }
        Ok(LitmusGraph {
            graph: builder.graph,
            ids: builder.ids.into_iter().collect(),
        })
    }
}

struct Builder {
    graph: ExecutionGraph,
    ids: HashMap<String, Event>,
    threads: u32,
    // (read id, read, write id) for reads naming a later write
    deferred: Vec<(String, Event, String)>,
}

impl Builder {
    fn new(threads: u32) -> Self {
        let mut graph = ExecutionGraph::new();
        for _ in 0..threads {
            graph.create_thread(ThreadId::MAIN);
        }
        Self {
            graph,
            ids: HashMap::new(),
            threads,
            deferred: Vec::new(),
        }
    }

    fn resolve(&self, id: &str, reference: &str) -> Result<Event, LitmusError> {
        if reference == INIT_ID {
            return Ok(Event::INIT);
        }
        self.ids
            .get(reference)
            .copied()
            .ok_or_else(|| bad_reference(id, reference, "no such earlier event"))
    }

    fn is_write_to(&self, e: Event, addr: Addr) -> bool {
        e.is_init()
            || self
                .graph
                .label(e)
                .as_write()
                .is_some_and(|w| w.addr == addr)
    }

    fn write_to(&self, id: &str, reference: &str, addr: Addr) -> Result<Event, LitmusError> {
        let e = self.resolve(id, reference)?;
        if self.is_write_to(e, addr) {
            Ok(e)
        } else {
            Err(bad_reference(id, reference, "not a write to the same location"))
        }
    }

    fn add(&mut self, event: &LitmusEvent) -> Result<(), LitmusError> {
        let id = event.id.as_str();
        if id == INIT_ID || self.ids.contains_key(id) {
            return Err(LitmusError::DuplicateId(event.id.clone()));
        }
        if event.thread > self.threads {
            return Err(LitmusError::UnknownThread {
                id: event.id.clone(),
                thread: event.thread,
            });
        }
        let t = ThreadId(event.thread);

        let e = match &event.op {
            LitmusOp::Read { addr, heap, ordering, rf } => {
                let addr = location(*addr, *heap);
                if self.ids.contains_key(rf) || rf == INIT_ID {
                    let source = self.write_to(id, rf, addr)?;
                    self.graph.add_read(t, addr, *ordering, source)
                } else {
                    let read = self.graph.add_read(t, addr, *ordering, Event::INIT);
                    self.deferred.push((event.id.clone(), read, rf.clone()));
                    read
                }
            }
            LitmusOp::Write { addr, heap, ordering, co_after } => {
                let addr = location(*addr, *heap);
                let placement = match co_after {
                    Some(pred) => CoPlacement::After(self.write_to(id, pred, addr)?),
                    None => CoPlacement::Max,
                };
                self.graph.add_write(t, addr, *ordering, placement)
            }
            LitmusOp::RmwRead { addr, heap, ordering, rf, kind } => {
                let addr = location(*addr, *heap);
                let source = self.write_to(id, rf, addr)?;
                self.graph.add_rmw_read(t, addr, *ordering, source, *kind)
            }
            LitmusOp::RmwWrite { ordering } => {
                let paired = self
                    .graph
                    .last_thread_label(t)
                    .is_some_and(EventLabel::is_rmw_read);
                if !paired {
                    return Err(LitmusError::MissingRmwRead(event.id.clone()));
                }
                self.graph.add_rmw_write(t, *ordering)
            }
            LitmusOp::Fence { ordering } => self.graph.add_fence(t, *ordering),
            LitmusOp::Malloc { addr, size } => {
                self.graph.add_malloc(t, Addr::heap(*addr), *size)
            }
            LitmusOp::Free { addr } => self.graph.add_free(t, Addr::heap(*addr)),
            LitmusOp::HpRetire { addr } => self.graph.add_hp_retire(t, Addr::heap(*addr)),
            LitmusOp::MethodBegin { name } => self.graph.add_method_begin(t, name.clone()),
            LitmusOp::MethodEnd { name } => self.graph.add_method_end(t, name.clone()),
            LitmusOp::Join { child } => {
                if *child == 0 || *child > self.threads {
                    return Err(LitmusError::UnknownThread {
                        id: event.id.clone(),
                        thread: *child,
                    });
                }
                self.graph.join_thread(t, ThreadId(*child))
            }
            LitmusOp::Finish => self.graph.finish_thread(t),
        };
        self.ids.insert(event.id.clone(), e);
        Ok(())
    }

    fn link_deferred_reads(&mut self) -> Result<(), LitmusError> {
        for (id, read, rf) in std::mem::take(&mut self.deferred) {
            let Some(addr) = self.graph.label(read).access_addr() else {
                continue;
            };
            let source = self
                .ids
                .get(&rf)
                .copied()
                .ok_or_else(|| bad_reference(&id, &rf, "no such event"))?;
            if !self.is_write_to(source, addr) {
                return Err(bad_reference(&id, &rf, "not a write to the same location"));
            }
            self.graph.change_rf(read, source);
        }
        Ok(())
    }

    fn attach_deps(&mut self, event: &LitmusEvent) -> Result<(), LitmusError> {
        if event.data.is_empty() && event.addr_deps.is_empty() && event.ctrl.is_empty() {
            return Ok(());
        }
        let e = self.ids[&event.id];
        let resolve_all = |refs: &[String]| -> Result<Vec<Event>, LitmusError> {
            refs.iter()
                .map(|r| {
                    let dep = self
                        .ids
                        .get(r)
                        .copied()
                        .ok_or_else(|| bad_reference(&event.id, r, "no such event"))?;
                    if dep.thread == e.thread && dep.index < e.index {
                        Ok(dep)
                    } else {
                        Err(bad_reference(&event.id, r, "not po-before the dependent event"))
                    }
                })
                .collect()
        };
        let deps = Deps {
            data: resolve_all(&event.data)?.into_iter().collect(),
            addr: resolve_all(&event.addr_deps)?.into_iter().collect(),
            ctrl: resolve_all(&event.ctrl)?.into_iter().collect(),
        };
        self.graph.set_deps(e, deps);
        Ok(())
    }
}

fn bad_reference(id: &str, reference: &str, reason: &'static str) -> LitmusError {
    LitmusError::BadReference {
        id: id.to_string(),
        reference: reference.to_string(),
        reason,
    }
}
