//! Main FilterEngine struct tying all components together.

use crate::controls::{self, ChangeNotifier, Control, ControlHandle};
use crate::criteria::{
    field_matches, resolve, search_matches, ControlValue, CriterionSpec, FieldTest,
};
use crate::error::{EngineError, Result};
use crate::events::{
    EngineEvent, EventBus, MatchSummary, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
};
use crate::records::{parse_library, Catalog};
use crate::types::{CombineMode, LoadProgress, Record, RecordDraft, ResultView};
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, warn};

/// Capacity of the control change queue. Notifications coalesce into a
/// single pass, so a small queue suffices.
const CHANGE_QUEUE_SIZE: usize = 64;

/// Field name the search control reports changes under.
pub const SEARCH_FIELD: &str = "search";

/// Free-text search over record fields.
#[derive(Clone, Debug, Default)]
pub struct SearchConfig {
    /// Fields to search. None searches every text field.
    pub fields: Option<Vec<String>>,
}

/// Renders a record into one output row.
pub type RowTemplate = Box<dyn Fn(&Record) -> String + Send>;

/// Receives the rendered rows of each filter pass.
pub trait RenderSink: Send {
    /// Called once per pass with the rows, in catalog order.
    fn render(&mut self, rows: Vec<String>);
}

impl<F> RenderSink for F
where
    F: FnMut(Vec<String>) + Send,
{
    fn render(&mut self, rows: Vec<String>) {
        self(rows)
    }
}

/// Engine configuration.
#[derive(Debug, Default)]
pub struct EngineConfig {
    /// How active criteria combine. Default: all (AND).
    pub mode: CombineMode,

    /// Free-text search, if wanted.
    pub search: Option<SearchConfig>,

    /// Criteria to register up front.
    pub criteria: Vec<CriterionSpec>,
}

/// A registered criterion bound to its value source.
struct BoundCriterion {
    spec: CriterionSpec,
    control: Box<dyn Control>,
    /// Present only for criteria backed by the built-in shared control.
    handle: Option<ControlHandle>,
}

/// The free-text search slot, bound like a criterion.
struct BoundSearch {
    config: SearchConfig,
    control: Box<dyn Control>,
    handle: ControlHandle,
}

/// A restriction active for one pass, resolved and owned.
enum ActiveTest {
    Field { field: String, test: FieldTest },
    Query { needle: String, fields: Option<Vec<String>> },
}

impl ActiveTest {
    fn matches(&self, record: &Record) -> bool {
        match self {
            ActiveTest::Field { field, test } => field_matches(record, field, test),
            ActiveTest::Query { needle, fields } => {
                search_matches(record, needle, fields.as_deref())
            }
        }
    }
}

/// The filtering engine.
///
/// Provides a unified interface for:
/// - Holding the record catalog and streaming in additions
/// - Registering criteria bound to controls
/// - Running filter passes and rendering the results
/// - Broadcasting pass and ingestion events to subscribers
pub struct FilterEngine {
    /// The record catalog.
    catalog: Catalog,

    /// Registered criteria, in registration order.
    criteria: Vec<BoundCriterion>,

    /// Optional free-text search slot.
    search: Option<BoundSearch>,

    /// How active criteria combine.
    mode: CombineMode,

    /// Row template (None = JSON line per record).
    template: Option<RowTemplate>,

    /// Render sink receiving each pass's rows.
    sink: Option<Box<dyn RenderSink>>,

    /// Event fan-out.
    bus: EventBus,

    /// Change notifications from controls.
    changes_tx: Sender<String>,
    changes_rx: Receiver<String>,

    /// Result of the most recent pass.
    last: Option<ResultView>,
}

impl FilterEngine {
    /// Create an engine over a catalog.
    ///
    /// No pass runs yet; call [`FilterEngine::filter`] for the initial
    /// view.
    pub fn new(catalog: Catalog, config: EngineConfig) -> Result<Self> {
        let (changes_tx, changes_rx) = bounded(CHANGE_QUEUE_SIZE);

        let mut engine = Self {
            catalog,
            criteria: Vec::new(),
            search: None,
            mode: config.mode,
            template: None,
            sink: None,
            bus: EventBus::new(),
            changes_tx,
            changes_rx,
            last: None,
        };

        for spec in config.criteria {
            engine.add_criterion(spec)?;
        }
        if let Some(search) = config.search {
            engine.enable_search(search);
        }

        // Registration queues change notifications; construction should
        // leave a clean slate so the first pump is a no-op.
        while engine.changes_rx.try_recv().is_ok() {}

        Ok(engine)
    }

    /// Install a row template. Replaces the JSON-line default.
    pub fn with_template(
        mut self,
        template: impl Fn(&Record) -> String + Send + 'static,
    ) -> Self {
        self.template = Some(Box::new(template));
        self
    }

    /// Install a render sink; each pass hands it the rendered rows.
    pub fn with_render_sink(mut self, sink: impl RenderSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    // --- Criterion Operations ---

    /// Register a criterion backed by a built-in shared control.
    ///
    /// Returns the handle that drives the control's value. Fields must
    /// be non-empty and registered at most once.
    pub fn add_criterion(&mut self, spec: CriterionSpec) -> Result<ControlHandle> {
        self.check_registrable(&spec)?;

        let (control, handle) = controls::shared(
            spec.field.clone(),
            spec.initial.clone(),
            self.changes_tx.clone(),
        );

        self.register(BoundCriterion {
            spec,
            control: Box::new(control),
            handle: Some(handle.clone()),
        });

        Ok(handle)
    }

    /// Register a criterion backed by a caller-provided control.
    ///
    /// Use [`FilterEngine::notifier`] to queue change notifications
    /// when the control's value moves.
    pub fn add_criterion_with(
        &mut self,
        spec: CriterionSpec,
        control: Box<dyn Control>,
    ) -> Result<()> {
        self.check_registrable(&spec)?;
        self.register(BoundCriterion {
            spec,
            control,
            handle: None,
        });
        Ok(())
    }

    fn check_registrable(&self, spec: &CriterionSpec) -> Result<()> {
        if spec.field.is_empty() {
            return Err(EngineError::EmptyField);
        }
        if self.criteria.iter().any(|c| c.spec.field == spec.field) {
            return Err(EngineError::CriterionExists(spec.field.clone()));
        }
        // An unparsable initial range fails here instead of at the
        // first pass.
        resolve(spec.kind, &spec.initial, spec.all.as_deref())?;
        Ok(())
    }

    fn register(&mut self, criterion: BoundCriterion) {
        let field = criterion.spec.field.clone();
        self.criteria.push(criterion);

        // The next pump picks up the new restriction.
        let _ = self.changes_tx.try_send(field.clone());

        self.bus.broadcast(EngineEvent::CriterionAdded { field });
    }

    /// Enable free-text search, returning the handle that drives the
    /// query. Replaces any previous search slot.
    pub fn enable_search(&mut self, config: SearchConfig) -> ControlHandle {
        let (control, handle) =
            controls::shared(SEARCH_FIELD, ControlValue::Empty, self.changes_tx.clone());

        self.search = Some(BoundSearch {
            config,
            control: Box::new(control),
            handle: handle.clone(),
        });

        handle
    }

    /// Handle for a registered criterion's built-in control.
    ///
    /// None for unknown fields and for criteria registered with an
    /// external control.
    pub fn control(&self, field: &str) -> Option<ControlHandle> {
        self.criteria
            .iter()
            .find(|c| c.spec.field == field)
            .and_then(|c| c.handle.clone())
    }

    /// Handle driving the free-text query, when search is enabled.
    pub fn search_control(&self) -> Option<ControlHandle> {
        self.search.as_ref().map(|s| s.handle.clone())
    }

    /// Notifier for externally implemented controls.
    pub fn notifier(&self) -> ChangeNotifier {
        ChangeNotifier::new(self.changes_tx.clone())
    }

    /// Fields with registered criteria, in registration order.
    pub fn criteria(&self) -> Vec<&str> {
        self.criteria.iter().map(|c| c.spec.field.as_str()).collect()
    }

    // --- Filtering ---

    /// Run a filter pass over the whole catalog.
    ///
    /// Resolves every criterion against its control's current value,
    /// keeps the records the combined predicate admits (in catalog
    /// order), renders them into the sink, and returns the view.
    /// Subscribers hear `FilterFinished` before the sink sees the rows.
    pub fn filter(&mut self) -> ResultView {
        let total = self.catalog.len();
        self.bus.broadcast(EngineEvent::FilterStarted { total });

        let active = self.active_tests();

        let mut matched = Vec::new();
        for record in self.catalog.iter() {
            if Self::combined(self.mode, &active, record) {
                matched.push(record.clone());
            }
        }

        debug!(matched = matched.len(), total, "filter pass");

        let view = ResultView::new(matched, total);

        let summaries = view.iter().map(MatchSummary::from_record).collect();
        self.bus.broadcast(EngineEvent::FilterFinished {
            matched: summaries,
            total,
        });

        self.render(&view);

        self.last = Some(view.clone());
        view
    }

    /// Switch the combine mode and rerun the pass.
    pub fn set_mode(&mut self, mode: CombineMode) -> ResultView {
        self.mode = mode;
        self.filter()
    }

    /// Run a pass if any control changed since the last one.
    ///
    /// Drains every queued change notification first, so a burst of
    /// control updates costs a single pass. Returns None when nothing
    /// changed.
    pub fn pump(&mut self) -> Option<ResultView> {
        let mut changed = false;
        while let Ok(field) = self.changes_rx.try_recv() {
            debug!(%field, "control changed");
            changed = true;
        }

        if changed {
            Some(self.filter())
        } else {
            None
        }
    }

    /// Resolve every criterion (and the search slot) against its
    /// control's current value, keeping the active ones.
    fn active_tests(&self) -> Vec<ActiveTest> {
        let mut active = Vec::new();

        for criterion in &self.criteria {
            let value = criterion.control.current();
            match resolve(criterion.spec.kind, &value, criterion.spec.all.as_deref()) {
                Ok(Some(test)) => active.push(ActiveTest::Field {
                    field: criterion.spec.field.clone(),
                    test,
                }),
                Ok(None) => {}
                Err(err) => {
                    // A control fed us garbage mid-session; skip the
                    // criterion for this pass rather than fail it.
                    warn!(field = %criterion.spec.field, %err, "criterion skipped");
                }
            }
        }

        if let Some(search) = &self.search {
            let value = search.control.current();
            if !value.is_empty() {
                match value {
                    ControlValue::Single(needle) => active.push(ActiveTest::Query {
                        needle,
                        fields: search.config.fields.clone(),
                    }),
                    value => {
                        // A text query is single-valued; skip anything
                        // else for this pass.
                        warn!(field = SEARCH_FIELD, ?value, "search skipped");
                    }
                }
            }
        }

        active
    }

    /// The combined predicate. With no active tests every record
    /// passes, in both modes.
    fn combined(mode: CombineMode, active: &[ActiveTest], record: &Record) -> bool {
        if active.is_empty() {
            return true;
        }
        match mode {
            CombineMode::All => active.iter().all(|test| test.matches(record)),
            CombineMode::Any => active.iter().any(|test| test.matches(record)),
        }
    }

    /// Render the view's rows into the sink, if one is installed.
    fn render(&mut self, view: &ResultView) {
        let sink = match self.sink.as_mut() {
            Some(sink) => sink,
            None => return,
        };

        let template = self.template.as_ref();
        let rows: Vec<String> = view
            .iter()
            .map(|record| match template {
                Some(template) => template(record),
                None => record.json_line(),
            })
            .collect();

        sink.render(rows);
    }

    // --- Ingestion ---

    /// Append a batch of records and refresh the current view.
    ///
    /// Existing records keep their ids and relative order; the batch
    /// lands after them. A pass runs afterwards so new records show up
    /// under the active restrictions right away.
    pub fn add(&mut self, batch: impl IntoIterator<Item = RecordDraft>) -> LoadProgress {
        let batch: Vec<RecordDraft> = batch.into_iter().collect();

        self.bus.broadcast(EngineEvent::AddStarted {
            incoming: batch.len(),
        });

        let progress = self.catalog.extend(batch);

        self.bus.broadcast(EngineEvent::AddFinished { progress });

        self.filter();

        progress
    }

    /// Parse a library document and append its records.
    pub fn add_library(&mut self, text: &str) -> Result<LoadProgress> {
        let drafts = parse_library(text)?;
        Ok(self.add(drafts))
    }

    // --- Catalog Access ---

    /// Number of records in the catalog.
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// All records, in ingestion order.
    pub fn records(&self) -> &[Record] {
        self.catalog.records()
    }

    /// The backing catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The current combine mode.
    pub fn mode(&self) -> CombineMode {
        self.mode
    }

    /// Result of the most recent pass, if any.
    pub fn last_result(&self) -> Option<&ResultView> {
        self.last.as_ref()
    }

    // --- Events ---

    /// Subscribe to engine events.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        self.bus.subscribe(config)
    }

    /// Unsubscribe and clean up.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.bus.unsubscribe(id)
    }

    /// Active subscription count.
    pub fn subscription_count(&self) -> usize {
        self.bus.subscription_count()
    }
}
