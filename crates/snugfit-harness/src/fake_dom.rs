#![forbid(unsafe_code)]

//! The in-memory document double.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use ahash::AHashMap;
use snugfit_core::{
    ChangeSignals, ComputedSample, FitNotice, FrameClock, MutationFilter, SignalFn, Size,
    StylePort, WhiteSpace,
};

/// Handle to one fake element. Cheap to copy; equality is identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FakeElement(u64);

/// One recorded port interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomOp {
    /// A box measurement (parent or natural).
    ReadBox(FakeElement),
    /// The one-shot computed-style sample.
    ReadComputedStyle(FakeElement),
    /// An inline-style attribute read.
    ReadInlineStyle(FakeElement),
    /// An inline-style attribute write.
    WriteStyle(FakeElement),
    /// A fit notification delivery.
    Notify(FakeElement),
}

struct ElementState {
    parent: Size,
    /// Natural box at `base_font`, before any engine style is applied.
    base: Size,
    base_font: f32,
    detached: bool,
    inline_style: String,
    computed: ComputedSample,
    applied_font: Option<f32>,
    applied_white_space: Option<WhiteSpace>,
}

impl ElementState {
    fn natural(&self) -> Size {
        if self.detached {
            return Size::ZERO;
        }
        let font = self.applied_font.unwrap_or(self.computed.font_size);
        let scale = if self.base_font > 0.0 {
            font / self.base_font
        } else {
            0.0
        };
        let mut width = self.base.width * scale;
        if self.applied_white_space == Some(WhiteSpace::Normal) {
            width = width.min(self.parent.width);
        }
        Size::new(width, self.base.height * scale)
    }

    fn parent(&self) -> Size {
        if self.detached { Size::ZERO } else { self.parent }
    }

    /// Re-derive the applied overrides from a freshly written inline
    /// style string, the same way a document would re-resolve style.
    fn absorb_inline(&mut self, css: &str) {
        self.inline_style = css.to_owned();
        self.applied_font = None;
        self.applied_white_space = None;
        for decl in css.split(';') {
            let Some((property, value)) = decl.split_once(':') else {
                continue;
            };
            match property.trim() {
                "font-size" => {
                    if let Some(px) = value.trim().strip_suffix("px") {
                        if let Ok(parsed) = px.trim().parse::<f32>() {
                            self.applied_font = Some(parsed);
                        }
                    }
                }
                "white-space" => {
                    self.applied_white_space = Some(WhiteSpace::from_computed(value.trim()));
                }
                _ => {}
            }
        }
    }
}

struct ContentSub {
    element: FakeElement,
    filter: MutationFilter,
    signal: SignalFn,
}

struct Inner {
    elements: RefCell<AHashMap<u64, ElementState>>,
    next_element: Cell<u64>,
    next_handle: Cell<u64>,

    frames: RefCell<Vec<(u64, SignalFn)>>,
    timers: RefCell<Vec<(u64, u64, SignalFn)>>,
    now_ms: Cell<u64>,

    content_subs: RefCell<AHashMap<u64, ContentSub>>,
    viewport_subs: RefCell<Vec<(u64, SignalFn)>>,

    notices: RefCell<Vec<(FakeElement, FitNotice)>>,
    ops: RefCell<Vec<DomOp>>,

    supports_frames: Cell<bool>,
    supports_mutations: Cell<bool>,
    supports_viewport: Cell<bool>,
    observer_sees_style_writes: Cell<bool>,
}

/// The fake document. Clones share the same arena, clock, and recording,
/// so a test keeps one clone and hands another to the engine.
pub struct FakeDom {
    inner: Rc<Inner>,
}

impl Clone for FakeDom {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDom {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                elements: RefCell::new(AHashMap::new()),
                next_element: Cell::new(1),
                next_handle: Cell::new(1),
                frames: RefCell::new(Vec::new()),
                timers: RefCell::new(Vec::new()),
                now_ms: Cell::new(0),
                content_subs: RefCell::new(AHashMap::new()),
                viewport_subs: RefCell::new(Vec::new()),
                notices: RefCell::new(Vec::new()),
                ops: RefCell::new(Vec::new()),
                supports_frames: Cell::new(true),
                supports_mutations: Cell::new(true),
                supports_viewport: Cell::new(true),
                observer_sees_style_writes: Cell::new(false),
            }),
        }
    }

    /// Drop the frame primitive: `request_frame` returns `None` and the
    /// engine under test must degrade to a no-op.
    #[must_use]
    pub fn without_frames(self) -> Self {
        self.inner.supports_frames.set(false);
        self
    }

    /// Drop mutation observation: `observe_content` returns `None`.
    #[must_use]
    pub fn without_mutation_observation(self) -> Self {
        self.inner.supports_mutations.set(false);
        self
    }

    /// Drop the viewport signal: `observe_viewport` returns `None`.
    #[must_use]
    pub fn without_viewport_signal(self) -> Self {
        self.inner.supports_viewport.set(false);
        self
    }

    /// Make content subscriptions see the engine's own style writes, the
    /// way an attribute-observing mutation filter would. Each write to an
    /// observed element then fires its content signal synchronously,
    /// from inside the write.
    pub fn simulate_observer_on_style_writes(&self, enabled: bool) {
        self.inner.observer_sees_style_writes.set(enabled);
    }

    // ------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------

    /// Start building an element fixture.
    #[must_use]
    pub fn element(&self) -> ElementBuilder<'_> {
        ElementBuilder {
            dom: self,
            parent: Size::new(400.0, 100.0),
            natural: Size::new(200.0, 20.0),
            font_size: 16.0,
            display: "block".to_owned(),
            white_space: "normal".to_owned(),
            inline_style: String::new(),
        }
    }

    fn insert(&self, state: ElementState) -> FakeElement {
        let id = self.inner.next_element.get();
        self.inner.next_element.set(id + 1);
        self.inner.elements.borrow_mut().insert(id, state);
        FakeElement(id)
    }

    // ------------------------------------------------------------------
    // Mutations a test drives
    // ------------------------------------------------------------------

    /// Resize an element's parent container (does not fire any signal;
    /// pair with [`FakeDom::resize_viewport`] as the scenario needs).
    pub fn set_parent_size(&self, element: FakeElement, width: f32, height: f32) {
        if let Some(state) = self.inner.elements.borrow_mut().get_mut(&element.0) {
            state.parent = Size::new(width, height);
        }
    }

    /// Replace an element's content: its natural box at the base font
    /// size (does not fire any signal; pair with [`FakeDom::mutate`]).
    pub fn set_natural_base(&self, element: FakeElement, width: f32, height: f32) {
        if let Some(state) = self.inner.elements.borrow_mut().get_mut(&element.0) {
            state.base = Size::new(width, height);
        }
    }

    /// Detach the element: every measurement on it reads zero from now
    /// on.
    pub fn detach(&self, element: FakeElement) {
        if let Some(state) = self.inner.elements.borrow_mut().get_mut(&element.0) {
            state.detached = true;
        }
    }

    /// Fire the content signal for `element` (subscriptions whose filter
    /// observes nothing are skipped).
    pub fn mutate(&self, element: FakeElement) {
        let signals: Vec<SignalFn> = self
            .inner
            .content_subs
            .borrow()
            .values()
            .filter(|sub| {
                sub.element == element
                    && (sub.filter.subtree || sub.filter.child_list || sub.filter.character_data)
            })
            .map(|sub| Rc::clone(&sub.signal))
            .collect();
        for signal in signals {
            signal();
        }
    }

    /// Fire the global viewport signal once.
    pub fn resize_viewport(&self) {
        let signals: Vec<SignalFn> = self
            .inner
            .viewport_subs
            .borrow()
            .iter()
            .map(|(_, signal)| Rc::clone(signal))
            .collect();
        for signal in signals {
            signal();
        }
    }

    // ------------------------------------------------------------------
    // Clock and frame pump
    // ------------------------------------------------------------------

    /// Run every frame callback pending right now (callbacks scheduled
    /// while running are left for the next pump). Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let pending = std::mem::take(&mut *self.inner.frames.borrow_mut());
        let count = pending.len();
        for (_, callback) in pending {
            callback();
        }
        count
    }

    /// Advance the virtual clock, firing timers that come due in
    /// deadline order.
    pub fn advance(&self, delta: Duration) {
        let now = self.inner.now_ms.get() + delta.as_millis() as u64;
        self.inner.now_ms.set(now);

        let mut due: Vec<(u64, u64, SignalFn)> = Vec::new();
        self.inner.timers.borrow_mut().retain(|(id, deadline, signal)| {
            if *deadline <= now {
                due.push((*id, *deadline, Rc::clone(signal)));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(id, deadline, _)| (*deadline, *id));
        for (_, _, signal) in due {
            signal();
        }
    }

    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.inner.frames.borrow().len()
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// The element's inline style attribute as last written.
    #[must_use]
    pub fn inline_style_of(&self, element: FakeElement) -> String {
        self.inner
            .elements
            .borrow()
            .get(&element.0)
            .map(|state| state.inline_style.clone())
            .unwrap_or_default()
    }

    /// Font size currently applied through the inline style, if any.
    #[must_use]
    pub fn applied_font_size(&self, element: FakeElement) -> Option<f32> {
        self.inner
            .elements
            .borrow()
            .get(&element.0)
            .and_then(|state| state.applied_font)
    }

    /// White-space mode currently applied through the inline style.
    #[must_use]
    pub fn applied_white_space(&self, element: FakeElement) -> Option<WhiteSpace> {
        self.inner
            .elements
            .borrow()
            .get(&element.0)
            .and_then(|state| state.applied_white_space)
    }

    /// Fit notices delivered for `element`, in order.
    #[must_use]
    pub fn notices_for(&self, element: FakeElement) -> Vec<FitNotice> {
        self.inner
            .notices
            .borrow()
            .iter()
            .filter(|(target, _)| *target == element)
            .map(|(_, notice)| *notice)
            .collect()
    }

    pub fn clear_notices(&self) {
        self.inner.notices.borrow_mut().clear();
    }

    /// Every recorded port interaction, in order.
    #[must_use]
    pub fn ops(&self) -> Vec<DomOp> {
        self.inner.ops.borrow().clone()
    }

    pub fn clear_ops(&self) {
        self.inner.ops.borrow_mut().clear();
    }

    /// Number of style writes recorded for `element`.
    #[must_use]
    pub fn style_writes(&self, element: FakeElement) -> usize {
        self.inner
            .ops
            .borrow()
            .iter()
            .filter(|op| matches!(op, DomOp::WriteStyle(target) if *target == element))
            .count()
    }

    #[must_use]
    pub fn content_sub_count(&self) -> usize {
        self.inner.content_subs.borrow().len()
    }

    #[must_use]
    pub fn viewport_sub_count(&self) -> usize {
        self.inner.viewport_subs.borrow().len()
    }

    fn record(&self, op: DomOp) {
        self.inner.ops.borrow_mut().push(op);
    }

    fn next_handle(&self) -> u64 {
        let id = self.inner.next_handle.get();
        self.inner.next_handle.set(id + 1);
        id
    }
}

/// Fluent fixture builder returned by [`FakeDom::element`].
pub struct ElementBuilder<'a> {
    dom: &'a FakeDom,
    parent: Size,
    natural: Size,
    font_size: f32,
    display: String,
    white_space: String,
    inline_style: String,
}

impl ElementBuilder<'_> {
    /// Content box of the parent container.
    #[must_use]
    pub fn parent_size(mut self, width: f32, height: f32) -> Self {
        self.parent = Size::new(width, height);
        self
    }

    /// Natural rendered box at the computed font size.
    #[must_use]
    pub fn natural_size(mut self, width: f32, height: f32) -> Self {
        self.natural = Size::new(width, height);
        self
    }

    /// Computed font size before the engine touches the element.
    #[must_use]
    pub fn font_size(mut self, px: f32) -> Self {
        self.font_size = px;
        self
    }

    /// Computed `display` value (default `"block"`).
    #[must_use]
    pub fn display(mut self, value: &str) -> Self {
        self.display = value.to_owned();
        self
    }

    /// Computed `white-space` value (default `"normal"`).
    #[must_use]
    pub fn white_space(mut self, value: &str) -> Self {
        self.white_space = value.to_owned();
        self
    }

    /// Author-set inline style present before registration.
    #[must_use]
    pub fn inline_style(mut self, css: &str) -> Self {
        self.inline_style = css.to_owned();
        self
    }

    #[must_use]
    pub fn create(self) -> FakeElement {
        let state = ElementState {
            parent: self.parent,
            base: self.natural,
            base_font: self.font_size,
            detached: false,
            inline_style: self.inline_style,
            computed: ComputedSample {
                font_size: self.font_size,
                display: self.display,
                white_space: self.white_space,
            },
            applied_font: None,
            applied_white_space: None,
        };
        self.dom.insert(state)
    }
}

// ----------------------------------------------------------------------
// Port implementations
// ----------------------------------------------------------------------

impl StylePort for FakeDom {
    type Element = FakeElement;

    fn parent_box(&self, element: &FakeElement) -> Size {
        self.record(DomOp::ReadBox(*element));
        self.inner
            .elements
            .borrow()
            .get(&element.0)
            .map(ElementState::parent)
            .unwrap_or(Size::ZERO)
    }

    fn natural_box(&self, element: &FakeElement) -> Size {
        self.record(DomOp::ReadBox(*element));
        self.inner
            .elements
            .borrow()
            .get(&element.0)
            .map(ElementState::natural)
            .unwrap_or(Size::ZERO)
    }

    fn computed_style(&self, element: &FakeElement) -> ComputedSample {
        self.record(DomOp::ReadComputedStyle(*element));
        self.inner
            .elements
            .borrow()
            .get(&element.0)
            .map(|state| state.computed.clone())
            .unwrap_or(ComputedSample {
                font_size: 0.0,
                display: String::new(),
                white_space: String::new(),
            })
    }

    fn inline_style(&self, element: &FakeElement) -> String {
        self.record(DomOp::ReadInlineStyle(*element));
        self.inner
            .elements
            .borrow()
            .get(&element.0)
            .map(|state| state.inline_style.clone())
            .unwrap_or_default()
    }

    fn set_inline_style(&self, element: &FakeElement, css: &str) {
        self.record(DomOp::WriteStyle(*element));
        if let Some(state) = self.inner.elements.borrow_mut().get_mut(&element.0) {
            state.absorb_inline(css);
        }
        if self.inner.observer_sees_style_writes.get() {
            self.mutate(*element);
        }
    }
}

impl ChangeSignals for FakeDom {
    type ContentHandle = u64;
    type ViewportHandle = u64;

    fn observe_content(
        &self,
        element: &FakeElement,
        filter: &MutationFilter,
        signal: SignalFn,
    ) -> Option<u64> {
        if !self.inner.supports_mutations.get() {
            return None;
        }
        let id = self.next_handle();
        self.inner.content_subs.borrow_mut().insert(
            id,
            ContentSub {
                element: *element,
                filter: *filter,
                signal,
            },
        );
        Some(id)
    }

    fn unobserve_content(&self, handle: u64) {
        self.inner.content_subs.borrow_mut().remove(&handle);
    }

    fn observe_viewport(&self, signal: SignalFn) -> Option<u64> {
        if !self.inner.supports_viewport.get() {
            return None;
        }
        let id = self.next_handle();
        self.inner.viewport_subs.borrow_mut().push((id, signal));
        Some(id)
    }

    fn unobserve_viewport(&self, handle: u64) {
        self.inner
            .viewport_subs
            .borrow_mut()
            .retain(|(id, _)| *id != handle);
    }

    fn notify_fit(&self, element: &FakeElement, notice: &FitNotice) {
        self.record(DomOp::Notify(*element));
        self.inner.notices.borrow_mut().push((*element, *notice));
    }
}

impl FrameClock for FakeDom {
    type FrameHandle = u64;
    type TimerHandle = u64;

    fn request_frame(&self, callback: SignalFn) -> Option<u64> {
        if !self.inner.supports_frames.get() {
            return None;
        }
        let id = self.next_handle();
        self.inner.frames.borrow_mut().push((id, callback));
        Some(id)
    }

    fn cancel_frame(&self, handle: u64) {
        self.inner.frames.borrow_mut().retain(|(id, _)| *id != handle);
    }

    fn set_timer(&self, delay: Duration, callback: SignalFn) -> u64 {
        let id = self.next_handle();
        let deadline = self.inner.now_ms.get() + delay.as_millis() as u64;
        self.inner.timers.borrow_mut().push((id, deadline, callback));
        id
    }

    fn cancel_timer(&self, handle: u64) {
        self.inner.timers.borrow_mut().retain(|(id, _, _)| *id != handle);
    }
}
