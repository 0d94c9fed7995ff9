// Copyright 2026 the Layover Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM host.
//!
//! [`WebHost`] implements the core's [`DomProbe`] and [`Presenter`] over a
//! live document. Elements are tracked in a generational slot table indexed
//! by [`ElementId`]; slot 0 is always `document.body`. Elements the page owns
//! (custom portal hosts, affix targets, pointer-down targets) enter the
//! table through [`WebHost::register`] and leave it once disconnected.
//!
//! Browser callbacks never call back into the core. They only queue
//! [`HostEvent`]s, which the page drains once per frame with
//! [`WebHost::drain_events`] and routes to the owners:
//!
//! ```text
//!   scroll / resize listener ──► HostEvent::Layout(ListenerId)
//!   animationend             ──► HostEvent::AnimationEnd(AnimationId)
//!   keydown Escape           ──► HostEvent::Escape
//!   pointerdown (capture)    ──► HostEvent::PointerDown(ElementId)
//! ```

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use hashbrown::HashMap;
use kurbo::Rect;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;
use web_sys::{
    AddEventListenerOptions, CssStyleDeclaration, Document, Element, Event, EventTarget,
    HtmlElement, KeyboardEvent, ResizeObserver, Window,
};

use layover_core::backend::{
    ContainerRef, DomProbe, ElementRole, EventKind, Frame, Presenter,
};
use layover_core::config::OverlayBehavior;
use layover_core::id::{AnimationId, ElementId, ListenerId};
use layover_core::position::InsetInstruction;
use layover_core::time::Duration;

use crate::table::{AnimationBook, Completion, DETACHED, ElementTable, TrackedNode};

/// Attribute carrying an element's raw table id.
const ID_ATTRIBUTE: &str = "data-layover-id";

/// An event queued by a browser callback, to be routed by the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// A layout listener fired; forward to the position engine, toaster, or
    /// affix tracker that registered it.
    Layout(ListenerId),
    /// An animation completed; forward to its controller or toaster.
    AnimationEnd(AnimationId),
    /// Escape was pressed; ask the manager which overlay closes.
    Escape,
    /// A pointer went down on this element; ask the manager which overlays
    /// close.
    PointerDown(ElementId),
}

enum Raw {
    Layout(ListenerId),
    AnimationEnd(AnimationId),
    Escape,
    PointerDown(Element),
}

type Queue = Rc<RefCell<VecDeque<Raw>>>;
type EventClosure = Closure<dyn FnMut(Event)>;

enum Subscription {
    Event {
        target: EventTarget,
        name: &'static str,
        capture: bool,
        closure: EventClosure,
    },
    Observer {
        observer: ResizeObserver,
        _closure: Closure<dyn FnMut(JsValue)>,
    },
    /// The source was gone when listening; nothing to release.
    Inert,
}

impl Subscription {
    fn release(self) {
        match self {
            Self::Event {
                target,
                name,
                capture,
                closure,
            } => {
                _ = target.remove_event_listener_with_callback_and_bool(
                    name,
                    closure.as_ref().unchecked_ref(),
                    capture,
                );
            }
            Self::Observer { observer, .. } => observer.disconnect(),
            Self::Inert => {}
        }
    }
}

struct RunningAnimation {
    element: ElementId,
    node: Element,
    class: String,
    closure: EventClosure,
}

impl RunningAnimation {
    fn release(self) {
        _ = self.node.remove_event_listener_with_callback(
            "animationend",
            self.closure.as_ref().unchecked_ref(),
        );
        _ = self.node.class_list().remove_1(&self.class);
    }
}

impl TrackedNode for Element {
    fn same_node(&self, other: &Self) -> bool {
        AsRef::<JsValue>::as_ref(self) == AsRef::<JsValue>::as_ref(other)
    }

    fn is_connected(&self) -> bool {
        web_sys::Node::is_connected(self)
    }

    fn stamp(&self) -> Option<u32> {
        self.get_attribute(ID_ATTRIBUTE)?.parse().ok()
    }

    fn set_stamp(&self, raw: u32) {
        _ = self.set_attribute(ID_ATTRIBUTE, &format!("{raw}"));
    }
}

/// Browser implementation of the backend contract.
pub struct WebHost {
    window: Window,
    document: Document,
    class_prefix: &'static str,
    elements: RefCell<ElementTable<Element>>,
    queue: Queue,
    listeners: HashMap<ListenerId, Subscription>,
    next_listener: u64,
    animations: AnimationBook<RunningAnimation>,
    next_animation: u64,
    document_listeners: Vec<Subscription>,
}

impl core::fmt::Debug for WebHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebHost")
            .field("class_prefix", &self.class_prefix)
            .field("elements", &self.elements.borrow().len())
            .field("listeners", &self.listeners.len())
            .field("animations", &self.animations.len())
            .finish_non_exhaustive()
    }
}

impl WebHost {
    /// Creates a host for the window's document.
    ///
    /// Installs document-level `keydown` and capturing `pointerdown`
    /// listeners feeding [`HostEvent::Escape`] and
    /// [`HostEvent::PointerDown`].
    ///
    /// # Errors
    ///
    /// Fails if there is no document or no body, or if the browser rejects a
    /// listener.
    pub fn new(window: Window, behavior: &OverlayBehavior) -> Result<Self, JsValue> {
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        let body = document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?;
        let mut host = Self {
            window,
            document,
            class_prefix: behavior.class_name_prefix,
            elements: RefCell::new(ElementTable::new(body.into())),
            queue: Rc::new(RefCell::new(VecDeque::new())),
            listeners: HashMap::new(),
            next_listener: 0,
            animations: AnimationBook::default(),
            next_animation: 0,
            document_listeners: Vec::new(),
        };
        host.install_document_listeners()?;
        Ok(host)
    }

    /// Returns the id of a page-owned element, registering it if needed.
    pub fn register(&mut self, element: Element) -> ElementId {
        self.elements.borrow_mut().intern(element)
    }

    /// Returns the element behind an id, if it is still tracked.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<Element> {
        self.elements.borrow().get(id).cloned()
    }

    /// Takes every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<HostEvent> {
        let raw: Vec<Raw> = self.queue.borrow_mut().drain(..).collect();
        let mut events = Vec::with_capacity(raw.len());
        for event in raw {
            events.push(match event {
                Raw::Layout(id) => HostEvent::Layout(id),
                Raw::AnimationEnd(id) => match self.animations.complete(id) {
                    Completion::Ran(running) => {
                        running.release();
                        HostEvent::AnimationEnd(id)
                    }
                    Completion::Settled => HostEvent::AnimationEnd(id),
                    // Cancelled completions may queue before their listener
                    // is removed.
                    Completion::Stale => continue,
                },
                Raw::Escape => HostEvent::Escape,
                Raw::PointerDown(element) => HostEvent::PointerDown(self.register(element)),
            });
        }
        events
    }

    /// Number of live layout listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of tracked elements, the body included.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.borrow().len()
    }

    /// Number of animations whose completion is still to be delivered.
    #[must_use]
    pub fn pending_animation_count(&self) -> usize {
        self.animations.len()
    }

    fn class(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.class_prefix)
    }

    fn style(&self, id: ElementId) -> Option<CssStyleDeclaration> {
        let elements = self.elements.borrow();
        Some(elements.get(id)?.dyn_ref::<HtmlElement>()?.style())
    }

    fn create_div(&self, class: &str) -> Option<Element> {
        match self.document.create_element("div") {
            Ok(div) => {
                div.set_class_name(class);
                Some(div)
            }
            Err(err) => {
                log::warn!("create_element failed: {err:?}");
                None
            }
        }
    }

    fn append(&mut self, parent: Option<Element>, class: &str) -> ElementId {
        let Some(div) = self.create_div(class) else {
            // Every later call on a detached id is a no-op.
            return DETACHED;
        };
        match parent {
            Some(parent) => {
                if let Err(err) = parent.append_child(&div) {
                    log::warn!("append_child failed: {err:?}");
                }
            }
            None => log::warn!("parent of new `{class}` element is gone; leaving it detached"),
        }
        self.register(div)
    }

    fn install_document_listeners(&mut self) -> Result<(), JsValue> {
        let queue = Rc::clone(&self.queue);
        let keydown: EventClosure = Closure::wrap(Box::new(move |event: Event| {
            let escape = event
                .dyn_ref::<KeyboardEvent>()
                .is_some_and(|k| k.key() == "Escape");
            if escape {
                queue.borrow_mut().push_back(Raw::Escape);
            }
        }) as Box<dyn FnMut(Event)>);
        self.document
            .add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        self.document_listeners.push(Subscription::Event {
            target: self.document.clone().into(),
            name: "keydown",
            capture: false,
            closure: keydown,
        });

        let queue = Rc::clone(&self.queue);
        let pointerdown: EventClosure = Closure::wrap(Box::new(move |event: Event| {
            if let Some(element) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) {
                queue.borrow_mut().push_back(Raw::PointerDown(element));
            }
        }) as Box<dyn FnMut(Event)>);
        self.document.add_event_listener_with_callback_and_bool(
            "pointerdown",
            pointerdown.as_ref().unchecked_ref(),
            true,
        )?;
        self.document_listeners.push(Subscription::Event {
            target: self.document.clone().into(),
            name: "pointerdown",
            capture: true,
            closure: pointerdown,
        });
        Ok(())
    }

    fn release_animations_on(&mut self, freed: &[ElementId]) {
        if freed.is_empty() {
            return;
        }
        for running in self.animations.remove_where(|a| freed.contains(&a.element)) {
            running.release();
        }
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        for (_, subscription) in self.listeners.drain() {
            subscription.release();
        }
        for running in self.animations.drain() {
            running.release();
        }
        for subscription in self.document_listeners.drain(..) {
            subscription.release();
        }
    }
}

impl DomProbe for WebHost {
    fn viewport_rect(&self) -> Rect {
        let width = self.window.inner_width().ok().and_then(|v| v.as_f64());
        let height = self.window.inner_height().ok().and_then(|v| v.as_f64());
        Rect::new(0.0, 0.0, width.unwrap_or(0.0), height.unwrap_or(0.0))
    }

    fn bounding_rect(&self, element: ElementId) -> Option<Rect> {
        let elements = self.elements.borrow();
        let node = elements.get(element)?;
        if !node.is_connected() {
            return None;
        }
        let r = node.get_bounding_client_rect();
        Some(Rect::from_origin_size((r.x(), r.y()), (r.width(), r.height())))
    }

    fn is_body(&self, element: ElementId) -> bool {
        element == ElementId(0)
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let elements = self.elements.borrow();
        match (elements.get(ancestor), elements.get(node)) {
            (Some(a), Some(n)) => a.contains(Some(n.as_ref())),
            _ => false,
        }
    }

    fn scroll_parents(&self, element: ElementId) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut elements = self.elements.borrow_mut();
        let body = elements.get(ElementId(0)).cloned();
        let mut cursor = elements.get(element).and_then(|e| e.parent_element());
        while let Some(el) = cursor {
            let at_root = body.as_ref().is_some_and(|b| {
                AsRef::<JsValue>::as_ref(b) == AsRef::<JsValue>::as_ref(&el)
            }) || el.parent_element().is_none();
            if at_root {
                break;
            }
            if is_scroll_container(&self.window, &el) {
                let next = el.parent_element();
                frames.push(Frame::Element(elements.intern(el)));
                cursor = next;
            } else {
                cursor = el.parent_element();
            }
        }
        frames.push(Frame::Viewport);
        frames
    }

    fn listen(&mut self, source: Frame, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        let raw = move || Raw::Layout(id);
        let subscription = match (source, kind) {
            (Frame::Viewport, EventKind::Resize) => {
                self.subscribe_layout(self.window.clone().into(), "resize", false, id)
            }
            (Frame::Viewport, EventKind::Scroll) => {
                self.subscribe_layout(self.window.clone().into(), "scroll", true, id)
            }
            (Frame::Element(el), EventKind::Scroll) => match self.element(el) {
                Some(node) => self.subscribe_layout(node.into(), "scroll", true, id),
                None => Subscription::Inert,
            },
            (Frame::Element(el), EventKind::Resize) => match self.element(el) {
                Some(node) => self.observe_resize(&node, raw),
                None => Subscription::Inert,
            },
        };
        self.listeners.insert(id, subscription);
        id
    }

    fn unlisten(&mut self, listener: ListenerId) {
        if let Some(subscription) = self.listeners.remove(&listener) {
            subscription.release();
        }
    }
}

impl WebHost {
    fn subscribe_layout(
        &self,
        target: EventTarget,
        name: &'static str,
        passive: bool,
        id: ListenerId,
    ) -> Subscription {
        let queue = Rc::clone(&self.queue);
        let closure: EventClosure = Closure::wrap(Box::new(move |_: Event| {
            queue.borrow_mut().push_back(Raw::Layout(id));
        }) as Box<dyn FnMut(Event)>);
        let result = if passive {
            let options = AddEventListenerOptions::new();
            options.set_passive(true);
            target.add_event_listener_with_callback_and_add_event_listener_options(
                name,
                closure.as_ref().unchecked_ref(),
                &options,
            )
        } else {
            target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        };
        if let Err(err) = result {
            log::warn!("listening for `{name}` failed: {err:?}");
            return Subscription::Inert;
        }
        Subscription::Event {
            target,
            name,
            capture: false,
            closure,
        }
    }

    fn observe_resize(&self, node: &Element, raw: impl Fn() -> Raw + 'static) -> Subscription {
        let queue = Rc::clone(&self.queue);
        let closure: Closure<dyn FnMut(JsValue)> = Closure::wrap(Box::new(move |_: JsValue| {
            queue.borrow_mut().push_back(raw());
        }) as Box<dyn FnMut(JsValue)>);
        match ResizeObserver::new(closure.as_ref().unchecked_ref()) {
            Ok(observer) => {
                observer.observe(node);
                Subscription::Observer {
                    observer,
                    _closure: closure,
                }
            }
            Err(err) => {
                log::warn!("ResizeObserver unavailable: {err:?}");
                Subscription::Inert
            }
        }
    }
}

fn is_scroll_container(window: &Window, element: &Element) -> bool {
    let Ok(Some(style)) = window.get_computed_style(element) else {
        return false;
    };
    ["overflow", "overflow-x", "overflow-y"].iter().any(|prop| {
        style
            .get_property_value(prop)
            .is_ok_and(|v| matches!(v.as_str(), "auto" | "scroll" | "overlay"))
    })
}

fn role_class(role: ElementRole) -> &'static str {
    match role {
        ElementRole::Content => "content",
        ElementRole::Backdrop => "backdrop",
        ElementRole::Placeholder => "placeholder",
        ElementRole::Shrink => "shrink",
    }
}

impl Presenter for WebHost {
    fn mount_portal(&mut self, host: ContainerRef) -> ElementId {
        let parent = match host {
            ContainerRef::DocumentBody => ElementId(0),
            ContainerRef::Element(el) => el,
        };
        let class = self.class("portal");
        let parent = self.element(parent);
        self.append(parent, &class)
    }

    fn create_element(&mut self, parent: ElementId, role: ElementRole) -> ElementId {
        let class = self.class(role_class(role));
        let parent = self.element(parent);
        self.append(parent, &class)
    }

    fn remove_element(&mut self, element: ElementId) {
        if self.is_body(element) {
            return;
        }
        if let Some(node) = self.element(element) {
            node.remove();
        }
        let freed = self.elements.borrow_mut().sweep();
        self.release_animations_on(&freed);
    }

    fn play_animation(
        &mut self,
        element: ElementId,
        name: &str,
        duration: Duration,
    ) -> AnimationId {
        let id = AnimationId(self.next_animation);
        self.next_animation += 1;
        let Some(node) = self.element(element) else {
            // Nothing to animate; complete on the next drain.
            self.animations.settle(id);
            self.queue.borrow_mut().push_back(Raw::AnimationEnd(id));
            return id;
        };

        let class = self.class(&format!("animation-{name}"));
        if let Some(style) = self.style(element) {
            _ = style.set_property("animation-duration", &format!("{}ms", duration.as_millis_f64()));
        }
        let queue = Rc::clone(&self.queue);
        let own: JsValue = node.clone().into();
        let closure: EventClosure = Closure::wrap(Box::new(move |event: Event| {
            // `animationend` bubbles; ignore completions from descendants.
            if event.target().is_some_and(|t| AsRef::<JsValue>::as_ref(&t) == &own) {
                queue.borrow_mut().push_back(Raw::AnimationEnd(id));
            }
        }) as Box<dyn FnMut(Event)>);
        if let Err(err) =
            node.add_event_listener_with_callback("animationend", closure.as_ref().unchecked_ref())
        {
            log::warn!("listening for animationend failed: {err:?}");
        }
        // Restart the animation if the class is already present.
        _ = node.class_list().remove_1(&class);
        _ = node.class_list().add_1(&class);
        self.animations.start(
            id,
            RunningAnimation {
                element,
                node,
                class,
                closure,
            },
        );
        id
    }

    fn cancel_animation(&mut self, animation: AnimationId) {
        if let Some(running) = self.animations.cancel(animation) {
            running.release();
        }
    }

    fn apply_inset(&mut self, element: ElementId, inset: &InsetInstruction) {
        let Some(style) = self.style(element) else {
            return;
        };
        _ = style.set_property("position", inset.mode.as_css());
        for (prop, value) in inset.axes() {
            _ = match value {
                Some(v) => style.set_property(prop, &format!("{v}px")),
                None => style.remove_property(prop).map(drop),
            };
        }
    }

    fn set_translate_y(&mut self, element: ElementId, dy: Option<f64>) {
        let Some(style) = self.style(element) else {
            return;
        };
        _ = match dy {
            Some(dy) => style.set_property("transform", &format!("translate3d(0, {dy}px, 0)")),
            None => style.remove_property("transform").map(drop),
        };
    }

    fn set_fixed_height(&mut self, element: ElementId, height: f64) {
        if let Some(style) = self.style(element) {
            _ = style.set_property("height", &format!("{height}px"));
        }
    }

    fn set_scroll_lock(&mut self, locked: bool) {
        let class = self.class("scroll-lock");
        if let Some(body) = self.element(ElementId(0)) {
            _ = body.class_list().toggle_with_force(&class, locked);
        }
    }
}
