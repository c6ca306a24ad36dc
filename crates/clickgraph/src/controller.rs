//! The render controller.
//!
//! [`RenderController`] turns a graph description, the container size and a
//! pair of host callbacks into an interactive scene in its container. The
//! three inputs form one [`RenderInputs`] tuple; whenever the tuple changes a
//! new render starts, tagged with a fresh [`Generation`]. Renders are never
//! queued or cancelled. A layout that completes after a newer render has
//! started is dropped without touching the container.
//!
//! All work runs on the host's local executor. The controller owns its state
//! through a shared cell; spawned tasks only hold weak references, so
//! dropping the controller ends every pending render quietly.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use futures::{
    FutureExt, StreamExt,
    future::{self, AbortHandle, Abortable},
    task::{LocalSpawn, LocalSpawnExt},
};
use log::{debug, error, info, trace};

use clickgraph_core::{
    geometry::{ContainerSize, Point},
    layout::{LayoutEngine, LayoutError},
    scene::{ElementId, Scene},
};

use crate::{
    callbacks::{BackgroundClickHandler, HostCallbacks, NodeClickHandler},
    config::ThemeConfig,
    container::{self, ClickEvent, ClickListener, Container},
    error::ClickGraphError,
    postprocess,
    size::{SizeFeed, SizeObserver},
    theme::{ThemeProvider, foreground_paint},
};

/// Identifies one render attempt. Strictly increasing per controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the controller is in its render lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderState {
    /// Nothing rendered yet.
    #[default]
    Idle,
    /// Waiting for the layout of this generation.
    Rendering(Generation),
    /// The scene of this generation is displayed.
    Active(Generation),
    /// The layout of this generation failed; its message is displayed.
    Failed(Generation),
    /// The container has been released.
    Unmounted,
}

/// The dependency tuple of a render.
///
/// Description and size compare by value, callbacks by identity.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInputs {
    description: String,
    callbacks: HostCallbacks,
    size: ContainerSize,
}

impl RenderInputs {
    pub fn new(description: impl Into<String>, callbacks: HostCallbacks, size: ContainerSize) -> Self {
        Self {
            description: description.into(),
            callbacks,
            size,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn callbacks(&self) -> &HostCallbacks {
        &self.callbacks
    }

    pub fn size(&self) -> ContainerSize {
        self.size
    }

    /// Returns the same inputs for another container size.
    pub fn with_size(self, size: ContainerSize) -> Self {
        Self { size, ..self }
    }
}

struct Shared {
    engine: Rc<dyn LayoutEngine>,
    theme: Rc<dyn ThemeProvider>,
    spawner: Rc<dyn LocalSpawn>,
    theme_config: ThemeConfig,
    container: Container,
    observer: Option<SizeObserver>,
    inputs: Option<RenderInputs>,
    failure: Option<LayoutError>,
    size: ContainerSize,
    generation: Generation,
    state: RenderState,
    completed_renders: u64,
    mounted: bool,
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.dispose();
        }
    }
}

/// Drives renders of one graph view.
pub struct RenderController {
    shared: Rc<RefCell<Shared>>,
}

impl fmt::Debug for RenderController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.borrow();
        f.debug_struct("RenderController")
            .field("state", &shared.state)
            .field("generation", &shared.generation)
            .field("size", &shared.size)
            .field("mounted", &shared.mounted)
            .field("container", &shared.container)
            .finish()
    }
}

impl RenderController {
    /// Creates an unmounted controller.
    ///
    /// `spawner` runs the render tasks and the size watcher; it must be a
    /// single-threaded executor driven by the host.
    pub fn new(
        engine: Rc<dyn LayoutEngine>,
        theme: Rc<dyn ThemeProvider>,
        spawner: Rc<dyn LocalSpawn>,
        config: ThemeConfig,
    ) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                engine,
                theme,
                spawner,
                theme_config: config,
                container: Container::new(),
                observer: None,
                inputs: None,
                failure: None,
                size: ContainerSize::default(),
                generation: Generation::default(),
                state: RenderState::Idle,
                completed_renders: 0,
                mounted: false,
            })),
        }
    }

    /// Attaches a fresh container and starts watching its size.
    ///
    /// Inputs recorded before mounting are rendered right away.
    ///
    /// # Errors
    ///
    /// Returns [`ClickGraphError::AlreadyMounted`] when called twice without
    /// an [`unmount`](Self::unmount) in between, and
    /// [`ClickGraphError::Spawn`] when the size watcher cannot be scheduled.
    pub fn mount(&self, feed: SizeFeed) -> Result<(), ClickGraphError> {
        let pending = {
            let mut guard = self.shared.borrow_mut();
            let shared = &mut *guard;
            if shared.mounted {
                return Err(ClickGraphError::AlreadyMounted);
            }

            let (abort, registration) = AbortHandle::new_pair();
            let (events, observer) = feed.into_parts(abort);
            let weak = Rc::downgrade(&self.shared);
            let watcher = Abortable::new(
                events.for_each(move |size| {
                    if let Some(shared) = weak.upgrade() {
                        resize(&shared, size);
                    }
                    future::ready(())
                }),
                registration,
            )
            .map(|_| ());

            if let Err(err) = shared.spawner.spawn_local(watcher) {
                observer.dispose();
                return Err(ClickGraphError::Spawn(err.to_string()));
            }

            shared.container = Container::new();
            shared.container.set_size(shared.size);
            shared.failure = None;
            shared.observer = Some(observer);
            shared.mounted = true;
            shared.state = RenderState::Idle;
            info!(generation:% = shared.generation; "Controller mounted");
            shared.inputs.is_some()
        };

        if pending {
            start_render(&self.shared);
        }
        Ok(())
    }

    /// Sets the caller-owned inputs, keeping the current container size.
    pub fn update(&self, description: impl Into<String>, callbacks: HostCallbacks) -> Option<Generation> {
        let size = self.shared.borrow().size;
        self.invalidate(RenderInputs::new(description, callbacks, size))
    }

    /// Starts a render for `inputs` unless they equal the current inputs.
    ///
    /// The size carried by `inputs` becomes the container size used for
    /// hit-testing and by later calls to [`update`](Self::update).
    ///
    /// Returns the generation of the started render. Before mounting, the
    /// inputs are recorded and `None` is returned; they render on mount.
    pub fn invalidate(&self, inputs: RenderInputs) -> Option<Generation> {
        invalidate(&self.shared, inputs)
    }

    /// Dispatches a click at a point in container coordinates.
    ///
    /// Returns the number of listeners that ran. Listeners run after the
    /// controller state is released, so host callbacks may call back into
    /// the controller.
    pub fn click(&self, position: Point) -> usize {
        let path = {
            let shared = self.shared.borrow();
            if !shared.mounted {
                debug!("Ignoring click on an unmounted controller");
                return 0;
            }
            shared.container.bubble_path(position)
        };
        container::dispatch(path)
    }

    /// Releases the container.
    ///
    /// Disposes the size observer, detaches the container and advances the
    /// generation so that every pending render is discarded on completion.
    pub fn unmount(&self) {
        let mut guard = self.shared.borrow_mut();
        let shared = &mut *guard;
        if !shared.mounted {
            debug!("Controller is not mounted");
            return;
        }
        if let Some(observer) = shared.observer.take() {
            observer.dispose();
        }
        shared.container.detach();
        shared.failure = None;
        shared.generation = shared.generation.next();
        shared.state = RenderState::Unmounted;
        shared.mounted = false;
        info!(generation:% = shared.generation; "Controller unmounted");
    }

    pub fn state(&self) -> RenderState {
        self.shared.borrow().state
    }

    /// The generation of the most recently started render (or unmount).
    pub fn generation(&self) -> Generation {
        self.shared.borrow().generation
    }

    /// Number of renders whose result was applied, successful or not.
    pub fn completed_renders(&self) -> u64 {
        self.shared.borrow().completed_renders
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.borrow().mounted
    }

    /// The latest container size observed.
    pub fn size(&self) -> ContainerSize {
        self.shared.borrow().size
    }

    pub fn inputs(&self) -> Option<RenderInputs> {
        self.shared.borrow().inputs.clone()
    }

    /// Serialises the displayed scene.
    pub fn svg(&self) -> Option<String> {
        self.shared.borrow().container.scene().map(Scene::to_svg)
    }

    /// The displayed layout error, if any.
    pub fn error_text(&self) -> Option<String> {
        self.shared
            .borrow()
            .container
            .error_text()
            .map(str::to_string)
    }

    /// The layout failure behind the displayed error text.
    pub fn layout_error(&self) -> Option<LayoutError> {
        self.shared.borrow().failure.clone()
    }

    /// The `viewBox` of the displayed scene.
    pub fn view_box(&self) -> Option<String> {
        let shared = self.shared.borrow();
        let scene = shared.container.scene()?;
        scene
            .get(scene.root())
            .and_then(|root| root.attribute("viewBox"))
            .map(str::to_string)
    }

    /// Number of content replacements in the current container.
    pub fn container_revision(&self) -> u64 {
        self.shared.borrow().container.revision()
    }

    /// Number of node listeners attached to the container.
    pub fn node_listener_count(&self) -> usize {
        self.shared.borrow().container.listener_count()
    }

    pub fn has_background_listener(&self) -> bool {
        self.shared.borrow().container.has_background_listener()
    }

    /// Runs `inspect` on the displayed scene.
    pub fn with_scene<R>(&self, inspect: impl FnOnce(&Scene) -> R) -> Option<R> {
        self.shared.borrow().container.scene().map(inspect)
    }
}

fn resize(shared: &Rc<RefCell<Shared>>, size: ContainerSize) {
    let inputs = {
        let mut guard = shared.borrow_mut();
        if !guard.mounted {
            return;
        }
        debug!(size:%; "Container resized");
        guard.size = size;
        guard.container.set_size(size);
        guard.inputs.clone()
    };
    if let Some(inputs) = inputs {
        invalidate(shared, inputs.with_size(size));
    }
}

fn invalidate(shared: &Rc<RefCell<Shared>>, inputs: RenderInputs) -> Option<Generation> {
    {
        let mut guard = shared.borrow_mut();
        if guard.inputs.as_ref() == Some(&inputs) {
            trace!("Render inputs unchanged");
            return None;
        }
        let size = inputs.size();
        guard.inputs = Some(inputs);
        guard.size = size;
        if !guard.mounted {
            debug!("Recorded render inputs until mount");
            return None;
        }
        guard.container.set_size(size);
    }
    start_render(shared)
}

fn start_render(shared: &Rc<RefCell<Shared>>) -> Option<Generation> {
    let mut guard = shared.borrow_mut();
    let state = &mut *guard;
    let inputs = state.inputs.clone()?;

    let generation = state.generation.next();
    state.generation = generation;
    state.state = RenderState::Rendering(generation);
    info!(generation:%, size:% = inputs.size(); "Starting render");

    let layout = state.engine.layout(inputs.description(), inputs.size());
    let weak = Rc::downgrade(shared);
    let task = async move {
        let result = layout.await;
        finish_render(&weak, generation, &inputs, result);
    };

    if let Err(err) = state.spawner.spawn_local(task) {
        error!(generation:%, err:%; "Failed to schedule render");
        let message = ClickGraphError::Spawn(err.to_string()).to_string();
        if state.container.show_error(message).is_ok() {
            state.state = RenderState::Failed(generation);
        }
    }
    Some(generation)
}

fn finish_render(
    shared: &Weak<RefCell<Shared>>,
    generation: Generation,
    inputs: &RenderInputs,
    result: Result<Scene, LayoutError>,
) {
    let Some(shared) = shared.upgrade() else {
        debug!(generation:%; "Controller dropped before render finished");
        return;
    };
    let mut guard = shared.borrow_mut();
    let state = &mut *guard;

    if !state.mounted || state.generation != generation {
        debug!(
            generation:%,
            current:% = state.generation,
            mounted = state.mounted;
            "Discarding stale render"
        );
        return;
    }

    match result {
        Ok(mut scene) => {
            let foreground = foreground_paint(state.theme.as_ref(), &state.theme_config);
            let nodes = postprocess::apply(&mut scene, inputs.size(), &foreground);
            if install(&mut state.container, scene, &nodes, inputs.callbacks()).is_err() {
                return;
            }
            state.state = RenderState::Active(generation);
            state.failure = None;
            info!(generation:%, nodes = nodes.len(); "Render finished");
        }
        Err(err) => {
            if state.container.show_error(err.to_string()).is_err() {
                return;
            }
            state.state = RenderState::Failed(generation);
            info!(generation:%, err:%; "Render failed");
            state.failure = Some(err);
        }
    }
    state.completed_renders += 1;
}

fn install(
    container: &mut Container,
    scene: Scene,
    nodes: &[(ElementId, Option<String>)],
    callbacks: &HostCallbacks,
) -> Result<(), container::DetachedContainer> {
    container.show_scene(scene)?;
    for (node, id) in nodes {
        if id.is_none() {
            trace!(element = node.index(); "Node without identifier");
        }
        container.add_listener(*node, node_listener(callbacks.on_node_click().clone()))?;
    }
    container.set_background_listener(background_listener(callbacks.on_background_click().clone()))
}

fn node_listener(handler: NodeClickHandler) -> ClickListener {
    Rc::new(move |event: &mut ClickEvent| {
        event.stop_propagation();
        match event.current_target_id().filter(|id| !id.is_empty()) {
            Some(id) => {
                trace!(id; "Node clicked");
                handler.call(id);
            }
            None => trace!("Clicked node has no identifier"),
        }
    })
}

fn background_listener(handler: BackgroundClickHandler) -> ClickListener {
    Rc::new(move |_: &mut ClickEvent| {
        trace!("Background clicked");
        handler.call();
    })
}

#[cfg(test)]
mod tests {
    use futures::executor::LocalPool;

    use clickgraph_dot::DotEngine;

    use super::*;
    use crate::{size::size_channel, theme::StaticTheme};

    fn controller(pool: &LocalPool) -> RenderController {
        RenderController::new(
            Rc::new(DotEngine::default()),
            Rc::new(StaticTheme::new()),
            Rc::new(pool.spawner()),
            ThemeConfig::default(),
        )
    }

    #[test]
    fn test_generation_display() {
        assert_eq!(Generation(3).to_string(), "#3");
        assert!(Generation(3).next() > Generation(3));
    }

    #[test]
    fn test_inputs_recorded_before_mount() {
        let mut pool = LocalPool::new();
        let controller = controller(&pool);
        let callbacks = HostCallbacks::noop();
        assert_eq!(controller.update("digraph { A }", callbacks.clone()), None);
        assert_eq!(controller.state(), RenderState::Idle);

        let (_reporter, feed) = size_channel();
        controller.mount(feed).unwrap();
        assert_eq!(controller.state(), RenderState::Rendering(Generation(1)));
        pool.run_until_stalled();
        assert_eq!(controller.state(), RenderState::Active(Generation(1)));
    }

    #[test]
    fn test_unchanged_inputs_do_not_render() {
        let mut pool = LocalPool::new();
        let controller = controller(&pool);
        let (_reporter, feed) = size_channel();
        controller.mount(feed).unwrap();
        let callbacks = HostCallbacks::noop();
        assert!(controller.update("digraph { A }", callbacks.clone()).is_some());
        assert_eq!(controller.update("digraph { A }", callbacks.clone()), None);
        assert!(controller.update("digraph { A }", HostCallbacks::noop()).is_some());
        pool.run_until_stalled();
        assert_eq!(controller.completed_renders(), 1);
    }

    #[test]
    fn test_double_mount_is_rejected() {
        let pool = LocalPool::new();
        let controller = controller(&pool);
        let (_first_reporter, first) = size_channel();
        let (_second_reporter, second) = size_channel();
        controller.mount(first).unwrap();
        assert!(matches!(
            controller.mount(second),
            Err(ClickGraphError::AlreadyMounted)
        ));
    }

    #[test]
    fn test_remount_after_unmount() {
        let mut pool = LocalPool::new();
        let controller = controller(&pool);
        let (_reporter, feed) = size_channel();
        controller.mount(feed).unwrap();
        controller.update("digraph { A }", HostCallbacks::noop());
        pool.run_until_stalled();
        controller.unmount();
        assert_eq!(controller.state(), RenderState::Unmounted);
        assert_eq!(controller.svg(), None);

        let (_reporter, feed) = size_channel();
        controller.mount(feed).unwrap();
        pool.run_until_stalled();
        assert!(matches!(controller.state(), RenderState::Active(_)));
        assert!(controller.svg().is_some());
    }

    #[test]
    fn test_click_before_mount_is_ignored() {
        let pool = LocalPool::new();
        let controller = controller(&pool);
        assert_eq!(controller.click(Point::new(1.0, 1.0)), 0);
    }
}
