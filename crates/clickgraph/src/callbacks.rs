//! Host callbacks.
//!
//! Handlers are reference counted and compare by identity: two handlers are
//! equal only when they share the same allocation. Replacing a handler with a
//! new closure, even one with identical behaviour, therefore counts as a
//! change of the render inputs.

use std::{fmt, rc::Rc};

/// Called with the identifier of a clicked node.
#[derive(Clone)]
pub struct NodeClickHandler(Rc<dyn Fn(&str)>);

impl NodeClickHandler {
    pub fn new(handler: impl Fn(&str) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self, id: &str) {
        (self.0)(id)
    }
}

impl PartialEq for NodeClickHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for NodeClickHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeClickHandler({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// Called when a click lands outside every node.
#[derive(Clone)]
pub struct BackgroundClickHandler(Rc<dyn Fn()>);

impl BackgroundClickHandler {
    pub fn new(handler: impl Fn() + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self) {
        (self.0)()
    }
}

impl PartialEq for BackgroundClickHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for BackgroundClickHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BackgroundClickHandler({:p})",
            Rc::as_ptr(&self.0).cast::<()>()
        )
    }
}

/// The pair of handlers supplied by the embedding composition.
#[derive(Debug, Clone, PartialEq)]
pub struct HostCallbacks {
    on_node_click: NodeClickHandler,
    on_background_click: BackgroundClickHandler,
}

impl HostCallbacks {
    pub fn new(on_node_click: NodeClickHandler, on_background_click: BackgroundClickHandler) -> Self {
        Self {
            on_node_click,
            on_background_click,
        }
    }

    /// Callbacks that do nothing.
    pub fn noop() -> Self {
        Self::new(NodeClickHandler::new(|_| {}), BackgroundClickHandler::new(|| {}))
    }

    pub fn on_node_click(&self) -> &NodeClickHandler {
        &self.on_node_click
    }

    pub fn on_background_click(&self) -> &BackgroundClickHandler {
        &self.on_background_click
    }
}
