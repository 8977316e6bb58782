//! The synchronization engine.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use taskline_cache::{LineCache, Lookup, MemoStore};
use taskline_parser::{LineParser, ParsedLine, TaskLine, WikiLineParser};
use tracing::{debug, info, warn};

use crate::document::{Document, parse_line};
use crate::identity::IdentityCache;
use crate::order::DependencyGraph;
use crate::registry::{StoreConnection, StoreRegistry};
use crate::viewport::{ViewPort, ViewResolver};
use crate::wrapper::{TaskWrapper, WrapperResolver};
use crate::{Authority, Identity, SyncError, Task};

/// Lines added and removed by [`SyncEngine::evaluate_viewports`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportChanges {
    pub added: usize,
    pub removed: usize,
}

/// Keeps one document and its task stores in sync.
///
/// Owns every cache derived from the document. Structural edits must go
/// through [`SyncEngine::insert_line`], [`SyncEngine::remove_line`] and
/// [`SyncEngine::swap_lines`] so that position-keyed entries follow their
/// lines.
pub struct SyncEngine<D: Document> {
    pub(crate) document: D,
    pub(crate) parser: Box<dyn LineParser>,
    pub(crate) registry: StoreRegistry,
    pub(crate) tasks: IdentityCache,
    pub(crate) wrappers: MemoStore<usize, TaskWrapper>,
    pub(crate) viewports: MemoStore<usize, ViewPort>,
    pub(crate) lines: LineCache<ParsedLine>,
    pub(crate) authority: Authority,
}

impl<D: Document> SyncEngine<D> {
    /// Creates an engine using the wiki line parser.
    pub fn new(document: D, registry: StoreRegistry) -> Self {
        Self::with_parser(document, registry, Box::new(WikiLineParser::new()))
    }

    /// Creates an engine with a custom line parser.
    pub fn with_parser(document: D, registry: StoreRegistry, parser: Box<dyn LineParser>) -> Self {
        Self {
            document,
            parser,
            registry,
            tasks: IdentityCache::new(),
            wrappers: MemoStore::new(),
            viewports: MemoStore::new(),
            lines: LineCache::new(),
            authority: Authority::default(),
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Consumes the engine, returning the document.
    pub fn into_document(self) -> D {
        self.document
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    pub fn tasks(&self) -> &IdentityCache {
        &self.tasks
    }

    /// Stores or evicts a task snapshot.
    pub fn set_task(&mut self, identity: Identity, task: Option<Task>) {
        self.tasks.set(identity, task);
    }

    /// Current authority. Only changes for the duration of [`SyncEngine::load_wrappers`].
    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Clears task snapshots, wrappers, viewports and parsed lines.
    pub fn reset(&mut self) {
        self.tasks.reset();
        self.wrappers.reset();
        self.viewports.reset();
        self.lines.reset();
        debug!("Reset caches");
    }

    /// Classifies the line at `position`.
    pub fn parsed_line(&mut self, position: usize) -> Result<ParsedLine, SyncError> {
        parse_line(&self.document, self.parser.as_ref(), &mut self.lines, position)
    }

    /// Fetches every task referenced in the document with one call per store.
    ///
    /// Nothing is cached unless every store answers.
    pub fn batch_load_identities(&mut self) -> Result<usize, SyncError> {
        let mut wanted: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for position in 0..self.document.line_count() {
            if let ParsedLine::Task(line) = self.parsed_line(position)?
                && let Some(uuid) = line.uuid
            {
                let store = self.registry.resolve_source(line.source.as_deref())?;
                wanted
                    .entry(store.name().to_string())
                    .or_default()
                    .insert(uuid);
            }
        }

        let mut fetched = Vec::new();
        for (store, uuids) in &wanted {
            let connection = self.registry.resolve(store)?;
            let tasks = connection.handle().filter(uuids)?;
            if tasks.len() < uuids.len() {
                warn!(
                    "Store '{}' returned {} of {} referenced tasks",
                    store,
                    tasks.len(),
                    uuids.len()
                );
            }
            fetched.extend(tasks.into_iter().map(|task| (store.clone(), task)));
        }

        let count = fetched.len();
        for (store, task) in fetched {
            self.tasks
                .set(Identity::new(store, task.uuid.clone()), Some(task));
        }

        info!("Loaded {} tasks from {} store(s)", count, wanted.len());
        Ok(count)
    }

    /// Materializes the wrapper of every line under `authority`.
    ///
    /// The previous authority is restored afterwards, also when a line fails.
    pub fn load_wrappers(&mut self, authority: Authority) -> Result<usize, SyncError> {
        let previous = mem::replace(&mut self.authority, authority);
        let result = self.materialize_wrappers();
        self.authority = previous;
        result
    }

    fn materialize_wrappers(&mut self) -> Result<usize, SyncError> {
        // One resolver for the whole pass, so the uuid index is built once.
        let mut resolver = WrapperResolver::new(
            &self.document,
            self.parser.as_ref(),
            &mut self.lines,
            &self.tasks,
            &self.registry,
            self.authority,
        );
        let mut count = 0;
        for position in 0..self.document.line_count() {
            if self.wrappers.get_or_resolve(position, &mut resolver)?.is_some() {
                count += 1;
            }
        }
        debug!("Materialized {} wrappers", count);
        Ok(count)
    }

    /// Returns the wrapper for `position`, building it on first access.
    pub fn wrapper(&mut self, position: usize) -> Result<Option<&TaskWrapper>, SyncError> {
        let mut resolver = WrapperResolver::new(
            &self.document,
            self.parser.as_ref(),
            &mut self.lines,
            &self.tasks,
            &self.registry,
            self.authority,
        );
        self.wrappers.get_or_resolve(position, &mut resolver)
    }

    /// Returns the cached outcome for `position` without building anything.
    pub fn wrapper_lookup(&self, position: usize) -> Lookup<&TaskWrapper> {
        self.wrappers.lookup(&position)
    }

    /// Stores or evicts the wrapper at `position`.
    pub fn set_wrapper(&mut self, position: usize, wrapper: Option<TaskWrapper>) {
        let wrapper = wrapper.map(|mut wrapper| {
            wrapper.line_number = position;
            wrapper
        });
        self.wrappers.set(position, wrapper);
    }

    /// Materialized wrappers in line order.
    pub fn wrappers(&self) -> Vec<&TaskWrapper> {
        let mut wrappers: Vec<&TaskWrapper> = self.wrappers.values().collect();
        wrappers.sort_by_key(|wrapper| wrapper.line_number);
        wrappers
    }

    /// Builds a viewport for every view line and loads its matching tasks.
    pub fn load_viewports(&mut self) -> Result<usize, SyncError> {
        for position in 0..self.document.line_count() {
            let mut resolver = ViewResolver {
                document: &self.document,
                parser: self.parser.as_ref(),
                lines: &mut self.lines,
                registry: &self.registry,
            };
            self.viewports.get_or_resolve(position, &mut resolver)?;
        }

        let positions: Vec<usize> = self.viewports.iter().map(|(position, _)| *position).collect();
        for position in &positions {
            let Some(viewport) = self.viewports.get_mut(position) else {
                continue;
            };
            let connection = self.registry.resolve(&viewport.store)?;
            for task in viewport.load_tasks(connection)? {
                let identity = Identity::new(connection.name(), task.uuid.clone());
                self.tasks.set(identity, Some(task));
            }
        }

        info!("Loaded {} viewports", positions.len());
        Ok(positions.len())
    }

    /// Returns the viewport at `position`, if one was loaded.
    pub fn viewport(&self, position: usize) -> Option<&ViewPort> {
        self.viewports.get(&position)
    }

    /// Returns the cached viewport outcome for `position`.
    pub fn viewport_lookup(&self, position: usize) -> Lookup<&ViewPort> {
        self.viewports.lookup(&position)
    }

    /// Loaded viewports in line order.
    pub fn viewports(&self) -> Vec<&ViewPort> {
        let mut viewports: Vec<&ViewPort> = self.viewports.values().collect();
        viewports.sort_by_key(|viewport| viewport.line_number);
        viewports
    }

    /// Returns the topmost viewport whose matching set contains `identity`.
    pub fn find_viewport_containing(&self, identity: &Identity) -> Option<&ViewPort> {
        self.viewports
            .values()
            .filter(|viewport| viewport.contains(identity))
            .min_by_key(|viewport| viewport.line_number)
    }

    /// Copies each wrapper's task snapshot onto its line.
    pub fn update_wrappers_from_tasks(&mut self) -> usize {
        let mut updated = 0;
        for wrapper in self.wrappers.values_mut() {
            let snapshot = wrapper
                .identity()
                .and_then(|identity| self.tasks.get(&identity));
            if let Some(task) = snapshot {
                wrapper.apply_task(task);
                updated += 1;
            }
        }
        debug!("Updated {} wrappers from tasks", updated);
        updated
    }

    /// Copies each wrapper's line fields onto its cached task snapshot.
    ///
    /// Only known tasks are touched; nothing is written to a store.
    pub fn update_tasks_from_wrappers(&mut self) -> usize {
        let updates: Vec<(usize, Identity, Task)> = self
            .wrappers
            .values()
            .filter(|wrapper| wrapper.task.is_some())
            .filter_map(|wrapper| {
                let identity = wrapper.identity()?;
                let task = wrapper.to_task(&self.dependency_uuids(wrapper));
                Some((wrapper.line_number, identity, task))
            })
            .collect();

        let updated = updates.len();
        for (position, identity, task) in updates {
            if let Some(wrapper) = self.wrappers.get_mut(&position) {
                wrapper.task = Some(task.clone());
            }
            self.tasks.set(identity, Some(task));
        }
        debug!("Updated {} tasks from wrappers", updated);
        updated
    }

    /// Uuids of the wrappers `wrapper` must be saved after.
    fn dependency_uuids(&self, wrapper: &TaskWrapper) -> BTreeSet<String> {
        wrapper
            .add_dependencies
            .iter()
            .filter_map(|line| self.wrappers.get(line))
            .filter(|dependency| dependency.store == wrapper.store)
            .filter_map(|dependency| dependency.uuid().map(str::to_string))
            .collect()
    }

    /// Writes each wrapper's canonical line where the document differs.
    pub fn render_wrappers(&mut self) -> usize {
        let mut rendered = 0;
        for wrapper in self.wrappers.values_mut() {
            if wrapper.is_dirty() {
                let text = wrapper.render();
                self.document.set_line(wrapper.line_number, text.clone());
                wrapper.raw_text = text;
                rendered += 1;
            }
        }
        debug!("Rendered {} lines", rendered);
        rendered
    }

    /// Save order over the materialized wrappers.
    pub fn dependency_order(&self) -> Result<Vec<usize>, SyncError> {
        let mut graph = DependencyGraph::new();
        for wrapper in self.wrappers.values() {
            graph.add(
                wrapper.line_number,
                wrapper.add_dependencies.iter().copied(),
            );
        }
        graph.order()
    }

    /// Saves every materialized wrapper after the wrappers it depends on.
    ///
    /// Returns the saved lines in save order. Lines of tasks that received
    /// their uuid from the store are rewritten.
    pub fn save_in_dependency_order(&mut self) -> Result<Vec<usize>, SyncError> {
        let order = self.dependency_order()?;

        for &position in &order {
            let wrapper = self
                .wrappers
                .get(&position)
                .ok_or_else(|| SyncError::position(position, self.document.line_count()))?;
            let extra = self.dependency_uuids(wrapper);
            let implicit: BTreeSet<String> = extra
                .iter()
                .filter(|uuid| !wrapper.line.depends.contains(uuid))
                .cloned()
                .collect();
            let task = wrapper.to_task(&extra);
            let store = wrapper.store.clone();
            let was_new = wrapper.uuid().is_none();

            let saved = self.registry.resolve(&store)?.handle().save(task)?;
            debug!("Saved line {} as {}:{}", position, store, saved.uuid);

            if let Some(wrapper) = self.wrappers.get_mut(&position) {
                wrapper.implicit_depends = implicit;
                wrapper.apply_task(&saved);
                if was_new {
                    let text = wrapper.render();
                    self.document.set_line(position, text.clone());
                    wrapper.raw_text = text;
                }
            }
            self.tasks
                .set(Identity::new(store, saved.uuid.clone()), Some(saved));
        }

        info!("Saved {} tasks in dependency order", order.len());
        Ok(order)
    }

    /// Store of the materialized wrapper nearest to `cursor`, ties resolved
    /// upwards, or the default store when there is none.
    pub fn closest_store_for_cursor(&self, cursor: usize) -> &StoreConnection {
        self.wrappers
            .values()
            .min_by_key(|wrapper| {
                (
                    wrapper.line_number.abs_diff(cursor),
                    wrapper.line_number > cursor,
                )
            })
            .and_then(|wrapper| self.registry.resolve(&wrapper.store).ok())
            .unwrap_or_else(|| self.registry.default_connection())
    }

    /// Brings the task lines listed under each viewport in line with its
    /// matching set, bottom-up.
    ///
    /// A viewport lists the task lines directly following it. Listed tasks
    /// that no longer match are removed and matching tasks not yet listed are
    /// appended. New tasks without a uuid stay.
    pub fn evaluate_viewports(&mut self) -> Result<ViewportChanges, SyncError> {
        let mut changes = ViewportChanges::default();
        let mut headers: Vec<usize> = self.viewports.iter().map(|(position, _)| *position).collect();
        headers.sort_unstable_by(|a, b| b.cmp(a));

        for header in headers {
            let Some(viewport) = self.viewports.get(&header).cloned() else {
                continue;
            };

            let mut end = header + 1;
            let mut listed = BTreeSet::new();
            let mut stale = Vec::new();
            while end < self.document.line_count() {
                let identity = match self.wrapper(end)? {
                    Some(wrapper) => wrapper.identity(),
                    None => break,
                };
                match identity {
                    Some(identity) if viewport.contains(&identity) => {
                        listed.insert(identity);
                    }
                    Some(_) => stale.push(end),
                    None => {}
                }
                end += 1;
            }

            for identity in viewport.viewport_tasks.difference(&listed) {
                let Some(task) = self.tasks.get(identity) else {
                    warn!("Viewport '{}' lost task {}", viewport.name, identity);
                    continue;
                };
                let text = task_line(task, viewport.source.clone()).render();
                self.insert_line(text, end)?;
                end += 1;
                changes.added += 1;
            }

            for position in stale.into_iter().rev() {
                self.remove_line(position)?;
                changes.removed += 1;
            }
        }

        info!(
            "Viewports added {} and removed {} lines",
            changes.added, changes.removed
        );
        Ok(changes)
    }
}

/// Line listing `task` under a viewport.
fn task_line(task: &Task, source: Option<String>) -> TaskLine {
    let mut line = TaskLine::new(task.description.clone());
    line.status = task.status;
    line.priority = task.priority;
    line.depends = task.depends.iter().cloned().collect();
    line.uuid = Some(task.uuid.clone());
    line.source = source;
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryStore, LineBuffer};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn engine(lines: &[&str], tasks: Vec<Task>) -> (SyncEngine<LineBuffer>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::named("default", tasks));
        let registry = StoreRegistry::new(store.clone());
        (
            SyncEngine::new(LineBuffer::from_lines(lines.iter().copied()), registry),
            store,
        )
    }

    #[test]
    fn test_wrapper_lookup_distinguishes_absent_from_uncomputed() {
        let (mut engine, _) = engine(&["plain", "- [ ] task"], Vec::new());

        assert!(engine.wrapper_lookup(0).is_uncomputed());
        assert!(engine.wrapper(0).unwrap().is_none());
        assert!(matches!(engine.wrapper_lookup(0), Lookup::KnownAbsent));
        assert!(engine.wrapper(1).unwrap().is_some());
        assert!(engine.wrapper_lookup(1).is_present());
    }

    #[test]
    fn test_set_wrapper_none_deletes() {
        let (mut engine, _) = engine(&["- [ ] task"], Vec::new());
        engine.load_wrappers(Authority::Buffer).unwrap();

        engine.set_wrapper(0, None);
        assert!(engine.wrapper_lookup(0).is_uncomputed());
    }

    #[test]
    fn test_reset_clears_caches() {
        let (mut engine, _) = engine(
            &["- [ ] a #uuid:1"],
            vec![Task::new("a").with_uuid("1")],
        );
        engine.batch_load_identities().unwrap();
        engine.load_wrappers(Authority::Buffer).unwrap();

        engine.reset();
        assert!(engine.tasks().is_empty());
        assert!(engine.wrappers().is_empty());
        assert!(engine.lines.is_empty());
    }

    #[test]
    fn test_line_cache_does_not_grow_across_resets() {
        let (mut engine, _) = engine(&["- [ ] draft 0", "plain"], Vec::new());

        for revision in 1..=20 {
            engine.document.set_line(0, format!("- [ ] draft {}", revision));
            engine.reset();
            engine.load_wrappers(Authority::Buffer).unwrap();
        }

        assert_eq!(engine.lines.len(), 2);
    }

    /// A document counting every line read.
    struct CountingDocument {
        inner: LineBuffer,
        reads: std::cell::Cell<usize>,
    }

    impl Document for CountingDocument {
        fn line_count(&self) -> usize {
            self.inner.line_count()
        }

        fn line(&self, index: usize) -> Option<&str> {
            self.reads.set(self.reads.get() + 1);
            self.inner.line(index)
        }

        fn set_line(&mut self, index: usize, text: String) {
            self.inner.set_line(index, text);
        }

        fn insert_line(&mut self, index: usize, text: String) {
            self.inner.insert_line(index, text);
        }

        fn delete_line(&mut self, index: usize) -> String {
            self.inner.delete_line(index)
        }
    }

    #[test]
    fn test_load_wrappers_indexes_uuids_once() {
        let count = 40;
        let lines: Vec<String> = (0..count)
            .map(|i| format!("- [ ] step {} #uuid:{} dep:{}", i, i, i + 1))
            .collect();
        let document = CountingDocument {
            inner: LineBuffer::from_lines(lines),
            reads: std::cell::Cell::new(0),
        };
        let registry = StoreRegistry::new(Arc::new(InMemoryStore::new()));
        let mut engine = SyncEngine::new(document, registry);

        assert_eq!(engine.load_wrappers(Authority::Buffer).unwrap(), count);
        // A handful of reads per line plus one indexing scan.
        assert!(engine.document().reads.get() < 6 * count);
        assert_eq!(
            engine.wrapper(0).unwrap().unwrap().add_dependencies,
            BTreeSet::from([1])
        );
    }

    #[test]
    fn test_update_passes() {
        let (mut engine, _) = engine(
            &["- [ ] buffer #uuid:1"],
            vec![Task::new("store").with_uuid("1")],
        );
        engine.batch_load_identities().unwrap();
        engine.load_wrappers(Authority::Buffer).unwrap();

        assert_eq!(engine.update_tasks_from_wrappers(), 1);
        let identity = Identity::new("default", "1");
        assert_eq!(engine.tasks().get(&identity).unwrap().description, "buffer");

        let mut task = Task::new("changed").with_uuid("1");
        task.status = taskline_parser::Status::Completed;
        engine.set_task(identity, Some(task));
        assert_eq!(engine.update_wrappers_from_tasks(), 1);
        assert_eq!(engine.render_wrappers(), 1);
        assert_eq!(engine.document().lines(), &["- [X] changed #uuid:1"]);
    }

    #[test]
    fn test_save_assigns_uuid_and_rewrites_line() {
        let (mut engine, store) = engine(&["- [ ] new task"], Vec::new());
        engine.load_wrappers(Authority::Buffer).unwrap();

        assert_eq!(engine.save_in_dependency_order().unwrap(), vec![0]);

        let saved = store.tasks();
        assert_eq!(saved.len(), 1);
        assert_eq!(
            engine.document().lines()[0],
            format!("- [ ] new task #uuid:{}", saved[0].uuid)
        );
    }

    #[test]
    fn test_children_saved_first_and_linked() {
        let (mut engine, store) = engine(&["- [ ] parent", "  - [ ] child"], Vec::new());
        engine.load_wrappers(Authority::Buffer).unwrap();

        assert_eq!(engine.save_in_dependency_order().unwrap(), vec![1, 0]);

        let tasks = store.tasks();
        let child = tasks.iter().find(|t| t.description == "child").unwrap();
        let parent = tasks.iter().find(|t| t.description == "parent").unwrap();
        assert!(parent.depends.contains(&child.uuid));
        assert!(!engine.document().lines()[0].contains("dep:"));
    }

    #[test]
    fn test_closest_store_for_cursor() {
        let work = Arc::new(InMemoryStore::named("work", Vec::new()));
        let registry =
            StoreRegistry::new(Arc::new(InMemoryStore::new())).with_store("work", work);
        let document = LineBuffer::from_lines(["- [ ] a @work", "", "- [ ] b", "", ""]);
        let mut engine = SyncEngine::new(document, registry);
        assert_eq!(engine.closest_store_for_cursor(1).name(), "default");

        engine.load_wrappers(Authority::Buffer).unwrap();
        assert_eq!(engine.closest_store_for_cursor(0).name(), "work");
        assert_eq!(engine.closest_store_for_cursor(1).name(), "work");
        assert_eq!(engine.closest_store_for_cursor(2).name(), "default");
        assert_eq!(engine.closest_store_for_cursor(4).name(), "default");
    }

    #[test]
    fn test_viewports() {
        let mut home = Task::new("water plants").with_uuid("1");
        home.project = Some("home".to_string());
        let mut garden = Task::new("mow lawn").with_uuid("2");
        garden.project = Some("home".to_string());
        let office = Task::new("file report").with_uuid("3");

        let (mut engine, _) = engine(
            &[
                "== Home | project:home ==",
                "- [ ] water plants #uuid:1",
                "- [ ] file report #uuid:3",
                "",
                "== Reports | report ==",
            ],
            vec![home, garden, office],
        );
        engine.batch_load_identities().unwrap();
        engine.load_wrappers(Authority::Buffer).unwrap();
        assert_eq!(engine.load_viewports().unwrap(), 2);

        let found = engine
            .find_viewport_containing(&Identity::new("default", "3"))
            .unwrap();
        assert_eq!(found.name, "Reports");

        let changes = engine.evaluate_viewports().unwrap();
        assert_eq!(
            changes,
            ViewportChanges {
                added: 2,
                removed: 1
            }
        );
        assert_eq!(
            engine.document().lines(),
            &[
                "== Home | project:home ==",
                "- [ ] water plants #uuid:1",
                "- [ ] mow lawn #uuid:2",
                "",
                "== Reports | report ==",
                "- [ ] file report #uuid:3",
            ]
        );
        assert_eq!(engine.viewport(4).map(|v| v.name.as_str()), Some("Reports"));
        for wrapper in engine.wrappers() {
            assert_eq!(engine.wrapper_lookup(wrapper.line_number).present(), Some(wrapper));
        }
    }

    #[test]
    fn test_invalid_view_filter_is_parse_error() {
        let (mut engine, _) = engine(&["== Bad | due:today =="], Vec::new());
        assert!(matches!(engine.load_viewports(), Err(SyncError::Parse(_))));
    }
}
