//! The host container.
//!
//! The container holds whatever is currently displayed (nothing, a scene or
//! an error message) together with the click listeners attached to it. Every
//! content replacement bumps a revision counter, which lets callers observe
//! that a container was, or was not, touched.
//!
//! Clicks are dispatched like DOM events: the scene is hit-tested at the
//! click position, and the event bubbles from the hit element through its
//! ancestors to the container itself. Listeners fire in that order until one
//! of them stops propagation.
//!
//! A detached container (after unmount) refuses all mutation.

use std::{collections::HashMap, fmt, rc::Rc};

use log::{error, trace};
use thiserror::Error;

use clickgraph_core::{
    geometry::{ContainerSize, Point},
    scene::{ElementId, Scene},
};

/// A click as seen by one listener on the bubble path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    target: Option<ElementId>,
    current_target: Option<ElementId>,
    current_id: Option<String>,
    propagation_stopped: bool,
}

impl ClickEvent {
    /// The element that was hit, or `None` for a click on empty container space.
    pub fn target(&self) -> Option<ElementId> {
        self.target
    }

    /// The element whose listener is running, or `None` for the container listener.
    pub fn current_target(&self) -> Option<ElementId> {
        self.current_target
    }

    /// The `id` attribute of the element whose listener is running.
    pub fn current_target_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// A click listener attached to an element or to the container.
pub type ClickListener = Rc<dyn Fn(&mut ClickEvent)>;

/// What the container currently displays.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ContainerContent {
    #[default]
    Empty,
    Scene(Scene),
    /// Plain text in place of a diagram.
    Error(String),
}

/// Mutation attempted on a detached container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("container is detached")]
pub struct DetachedContainer;

#[derive(Default)]
pub struct Container {
    content: ContainerContent,
    element_listeners: HashMap<ElementId, ClickListener>,
    background_listener: Option<ClickListener>,
    size: ContainerSize,
    revision: u64,
    detached: bool,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("content", &self.content)
            .field("element_listeners", &self.element_listeners.len())
            .field("background_listener", &self.background_listener.is_some())
            .field("size", &self.size)
            .field("revision", &self.revision)
            .field("detached", &self.detached)
            .finish()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &ContainerContent {
        &self.content
    }

    pub fn scene(&self) -> Option<&Scene> {
        match &self.content {
            ContainerContent::Scene(scene) => Some(scene),
            _ => None,
        }
    }

    pub fn error_text(&self) -> Option<&str> {
        match &self.content {
            ContainerContent::Error(text) => Some(text),
            _ => None,
        }
    }

    /// Number of content replacements so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn size(&self) -> ContainerSize {
        self.size
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Number of element listeners currently attached.
    pub fn listener_count(&self) -> usize {
        self.element_listeners.len()
    }

    pub fn has_background_listener(&self) -> bool {
        self.background_listener.is_some()
    }

    /// Records the latest measured size, used to map click positions.
    pub fn set_size(&mut self, size: ContainerSize) {
        self.size = size;
    }

    /// Removes the content and every listener, and refuses mutation from then on.
    pub fn detach(&mut self) {
        self.content = ContainerContent::Empty;
        self.element_listeners.clear();
        self.background_listener = None;
        self.detached = true;
    }

    /// Replaces the content with a scene; all previous listeners are dropped.
    pub fn show_scene(&mut self, scene: Scene) -> Result<(), DetachedContainer> {
        self.replace(ContainerContent::Scene(scene))
    }

    /// Replaces the content with plain text; all previous listeners are dropped.
    pub fn show_error(&mut self, text: impl Into<String>) -> Result<(), DetachedContainer> {
        self.replace(ContainerContent::Error(text.into()))
    }

    pub fn add_listener(
        &mut self,
        element: ElementId,
        listener: ClickListener,
    ) -> Result<(), DetachedContainer> {
        self.ensure_attached("add element listener")?;
        self.element_listeners.insert(element, listener);
        Ok(())
    }

    pub fn set_background_listener(&mut self, listener: ClickListener) -> Result<(), DetachedContainer> {
        self.ensure_attached("set background listener")?;
        self.background_listener = Some(listener);
        Ok(())
    }

    fn replace(&mut self, content: ContainerContent) -> Result<(), DetachedContainer> {
        self.ensure_attached("replace content")?;
        self.content = content;
        self.element_listeners.clear();
        self.background_listener = None;
        self.revision += 1;
        Ok(())
    }

    fn ensure_attached(&self, operation: &str) -> Result<(), DetachedContainer> {
        if self.detached {
            error!(operation; "Refusing to mutate a detached container");
            return Err(DetachedContainer);
        }
        Ok(())
    }

    /// Resolves the listeners a click at `point` reaches, in firing order.
    ///
    /// The listeners are cloned out so they can run after the container is
    /// released; a listener may then freely re-enter whoever owns it.
    pub fn bubble_path(&self, point: Point) -> Vec<PendingListener> {
        if self.detached {
            return Vec::new();
        }

        let scene = self.scene();
        let target = scene.and_then(|scene| scene.hit_test(point, self.size));
        trace!(x = point.x(), y = point.y(), target:? = target; "Resolving click path");

        let mut path: Vec<PendingListener> = match (scene, target) {
            (Some(scene), Some(target)) => scene
                .ancestors(target)
                .into_iter()
                .filter_map(|element| {
                    let listener = self.element_listeners.get(&element)?;
                    Some(PendingListener {
                        listener: Rc::clone(listener),
                        element: Some(element),
                        id: scene
                            .get(element)
                            .and_then(|e| e.attribute("id"))
                            .map(str::to_string),
                        target: Some(target),
                    })
                })
                .collect(),
            _ => Vec::new(),
        };

        if let Some(listener) = &self.background_listener {
            path.push(PendingListener {
                listener: Rc::clone(listener),
                element: None,
                id: None,
                target,
            });
        }

        path
    }
}

/// A listener resolved for one click, ready to run.
pub struct PendingListener {
    listener: ClickListener,
    element: Option<ElementId>,
    id: Option<String>,
    target: Option<ElementId>,
}

/// Runs the resolved listeners in order until one stops propagation.
///
/// Returns the number of listeners that ran.
pub fn dispatch(path: Vec<PendingListener>) -> usize {
    let Some(first) = path.first() else {
        return 0;
    };
    let mut event = ClickEvent {
        target: first.target,
        current_target: None,
        current_id: None,
        propagation_stopped: false,
    };

    let mut invoked = 0;
    for pending in path {
        event.current_target = pending.element;
        event.current_id = pending.id;
        (pending.listener)(&mut event);
        invoked += 1;
        if event.is_propagation_stopped() {
            trace!(invoked; "Click propagation stopped");
            break;
        }
    }
    invoked
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use clickgraph_core::{
        geometry::{Bounds, Size},
        scene::{Element, ElementKind, HitArea},
    };

    use super::*;

    fn scene_with_node() -> (Scene, ElementId, ElementId) {
        let mut scene = Scene::new();
        let node = scene.append(
            scene.root(),
            Element::new(ElementKind::Group)
                .with_attribute("class", "node")
                .with_attribute("id", "A"),
        );
        let shape = scene.append(
            node,
            Element::new(ElementKind::Polygon).with_hit_area(HitArea::Rect(
                Bounds::new_from_center(Point::new(50.0, 50.0), Size::new(20.0, 20.0)),
            )),
        );
        (scene, node, shape)
    }

    fn recorder(log: &Rc<RefCell<Vec<String>>>, name: &str, stop: bool) -> ClickListener {
        let log = Rc::clone(log);
        let name = name.to_string();
        Rc::new(move |event: &mut ClickEvent| {
            let id = event.current_target_id().unwrap_or("-").to_string();
            log.borrow_mut().push(format!("{name}:{id}"));
            if stop {
                event.stop_propagation();
            }
        })
    }

    #[test]
    fn test_replace_bumps_revision_and_clears_listeners() {
        let (scene, node, _) = scene_with_node();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut container = Container::new();
        container.show_scene(scene).unwrap();
        container.add_listener(node, recorder(&log, "node", true)).unwrap();
        container
            .set_background_listener(recorder(&log, "bg", false))
            .unwrap();
        assert_eq!(container.revision(), 1);
        assert_eq!(container.listener_count(), 1);

        container.show_error("boom").unwrap();
        assert_eq!(container.revision(), 2);
        assert_eq!(container.listener_count(), 0);
        assert!(!container.has_background_listener());
        assert_eq!(container.error_text(), Some("boom"));
    }

    #[test]
    fn test_node_listener_stops_propagation() {
        let (scene, node, _) = scene_with_node();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut container = Container::new();
        container.set_size(ContainerSize::new(100.0, 100.0));
        container.show_scene(scene).unwrap();
        container.add_listener(node, recorder(&log, "node", true)).unwrap();
        container
            .set_background_listener(recorder(&log, "bg", false))
            .unwrap();

        let invoked = dispatch(container.bubble_path(Point::new(50.0, 50.0)));
        assert_eq!(invoked, 1);
        assert_eq!(*log.borrow(), vec!["node:A"]);
    }

    #[test]
    fn test_miss_reaches_background() {
        let (scene, node, _) = scene_with_node();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut container = Container::new();
        container.set_size(ContainerSize::new(100.0, 100.0));
        container.show_scene(scene).unwrap();
        container.add_listener(node, recorder(&log, "node", true)).unwrap();
        container
            .set_background_listener(recorder(&log, "bg", false))
            .unwrap();

        dispatch(container.bubble_path(Point::new(5.0, 5.0)));
        assert_eq!(*log.borrow(), vec!["bg:-"]);
    }

    #[test]
    fn test_bubbling_without_stop_reaches_background() {
        let (scene, node, _) = scene_with_node();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut container = Container::new();
        container.set_size(ContainerSize::new(100.0, 100.0));
        container.show_scene(scene).unwrap();
        container.add_listener(node, recorder(&log, "node", false)).unwrap();
        container
            .set_background_listener(recorder(&log, "bg", false))
            .unwrap();

        dispatch(container.bubble_path(Point::new(50.0, 50.0)));
        assert_eq!(*log.borrow(), vec!["node:A", "bg:-"]);
    }

    #[test]
    fn test_every_listener_sees_the_hit_element() {
        let (scene, node, shape) = scene_with_node();
        let targets = Rc::new(RefCell::new(Vec::new()));
        let mut container = Container::new();
        container.set_size(ContainerSize::new(100.0, 100.0));
        container.show_scene(scene).unwrap();
        for element in [Some(node), None] {
            let targets = Rc::clone(&targets);
            let listener: ClickListener = Rc::new(move |event: &mut ClickEvent| {
                targets
                    .borrow_mut()
                    .push((event.target(), event.current_target()));
            });
            match element {
                Some(element) => container.add_listener(element, listener).unwrap(),
                None => container.set_background_listener(listener).unwrap(),
            }
        }

        dispatch(container.bubble_path(Point::new(50.0, 50.0)));
        assert_eq!(
            *targets.borrow(),
            vec![(Some(shape), Some(node)), (Some(shape), None)]
        );

        targets.borrow_mut().clear();
        dispatch(container.bubble_path(Point::new(5.0, 5.0)));
        assert_eq!(*targets.borrow(), vec![(None, None)]);
    }

    #[test]
    fn test_detached_container_refuses_mutation() {
        let mut container = Container::new();
        container.show_error("x").unwrap();
        container.detach();
        assert!(container.is_detached());
        assert_eq!(container.show_error("y"), Err(DetachedContainer));
        assert_eq!(container.revision(), 1);
        assert!(container.bubble_path(Point::new(0.0, 0.0)).is_empty());
    }
}
