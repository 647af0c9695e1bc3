//! Leptos component wrapping the traffic graph canvas.
//!
//! The component creates an HTML canvas element and wires up mouse/wheel event
//! handlers for node dragging, panning, zooming, and selection. A single
//! animation loop runs via `requestAnimationFrame` for the component's
//! lifetime; loading a new graph swaps the state it drives, so the previous
//! simulation is dropped and never ticked again.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, info};
use url::Url;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::geometry::Point;
use super::render::{self, IconCache};
use super::scale::ScaleConfig;
use super::simulation::SimulationConfig;
use super::state::ForceGraphState;
use super::theme::Theme;
use super::tooltip::Tooltip;
use crate::components::tooltip_overlay::TooltipOverlay;
use crate::graph::Graph;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Live state for the currently loaded graph plus the canvas size.
struct GraphContext {
	state: Option<ForceGraphState>,
	width: f64,
	height: f64,
}

/// Renders an interactive service/API traffic graph on a canvas element.
///
/// Pass the canonical graph via the reactive `graph` signal; `None` draws an
/// empty canvas while data is loading. The component sizes itself to its
/// parent container by default; set `fullscreen = true` to fill the viewport
/// and resize automatically with the window. Explicit `width`/`height`
/// override automatic sizing.
#[component]
pub fn ServiceGraphCanvas(
	#[prop(into)] graph: Signal<Option<Graph>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let tooltip = RwSignal::new(None::<Tooltip>);
	let context = Rc::new(RefCell::new(GraphContext {
		state: None,
		width: width.unwrap_or(800.0),
		height: height.unwrap_or(600.0),
	}));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: FrameCallback = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let next = graph.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		if animate_init.borrow().is_none() {
			let Some(ctx) = context_2d(&canvas) else {
				return;
			};
			let (w, h) = if fullscreen {
				viewport_size(&window).unwrap_or((800.0, 600.0))
			} else {
				(
					width.unwrap_or_else(|| {
						canvas
							.parent_element()
							.map(|p| p.client_width() as f64)
							.unwrap_or(800.0)
					}),
					height.unwrap_or_else(|| {
						canvas
							.parent_element()
							.map(|p| p.client_height() as f64)
							.unwrap_or(600.0)
					}),
				)
			};
			canvas.set_width(w as u32);
			canvas.set_height(h as u32);
			{
				let mut c = context_init.borrow_mut();
				c.width = w;
				c.height = h;
			}

			if fullscreen {
				let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
				*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
					let Some((nw, nh)) = web_sys::window().as_ref().and_then(viewport_size) else {
						return;
					};
					canvas_resize.set_width(nw as u32);
					canvas_resize.set_height(nh as u32);
					let mut c = context_resize.borrow_mut();
					c.width = nw;
					c.height = nh;
					if let Some(ref mut state) = c.state {
						state.resize(nw, nh);
					}
				}));
				if let Some(ref cb) = *resize_cb_init.borrow() {
					let _ = window
						.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
			}

			let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
			let theme = Theme::default();
			let mut icons = IconCache::default();
			*animate_init.borrow_mut() = Some(Closure::new(move || {
				{
					let mut c = context_anim.borrow_mut();
					let (w, h) = (c.width, c.height);
					match c.state {
						Some(ref mut state) => {
							state.tick();
							if state.is_dragging() {
								sync_tooltip(state, tooltip);
							}
							render::render(state, &ctx, &theme, &mut icons);
						}
						None => render::clear(&ctx, &theme, w, h),
					}
				}
				if let Some(ref cb) = *animate_inner.borrow() {
					if let Some(window) = web_sys::window() {
						let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
					}
				}
			}));
			if let Some(ref cb) = *animate_init.borrow() {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}

		let mut c = context_init.borrow_mut();
		if let Some(previous) = c.state.take() {
			debug!(
				"service-graph: discarding layout of {} nodes after {} ticks",
				previous.graph.nodes.len(),
				previous.simulation.ticks()
			);
		}
		tooltip.set(None);
		let (w, h) = (c.width, c.height);
		c.state = next.map(|graph| {
			info!(
				"service-graph: laying out {} nodes, {} edges ({})",
				graph.nodes.len(),
				graph.edges.len(),
				graph.kind.title()
			);
			ForceGraphState::new(
				graph,
				w,
				h,
				SimulationConfig::default(),
				ScaleConfig::default(),
			)
		});
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(at) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut state) = context_md.borrow_mut().state {
			state.pointer_down(at);
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(at) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut state) = context_mm.borrow_mut().state {
			state.pointer_move(at);
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(at) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut state) = context_mu.borrow_mut().state {
			if state.pointer_up(at) {
				sync_tooltip(state, tooltip);
			}
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut state) = context_ml.borrow_mut().state {
			state.pointer_cancel();
		}
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(at) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut state) = context_wh.borrow_mut().state {
			state.zoom_at(at, ev.delta_y());
		}
	};

	// Closing the overlay deselects.
	let context_close = context.clone();
	Effect::new(move |_| {
		if tooltip.with(Option::is_none) {
			if let Ok(mut c) = context_close.try_borrow_mut() {
				if let Some(ref mut state) = c.state {
					state.clear_selection();
				}
			}
		}
	});

	view! {
		<div class="service-graph" style="position: relative; width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				class="service-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<TooltipOverlay tooltip=tooltip on_close=move |_: ()| tooltip.set(None) />
		</div>
	}
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

fn viewport_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Pointer position relative to the canvas, in screen pixels.
fn pointer_position(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	ev: &MouseEvent,
) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// The page URL, used as the base for tooltip deep links.
fn current_page() -> Option<Url> {
	let href = web_sys::window()?.location().href().ok()?;
	Url::parse(&href).ok()
}

fn sync_tooltip(state: &ForceGraphState, tooltip: RwSignal<Option<Tooltip>>) {
	let next = state.tooltip(current_page().as_ref());
	if tooltip.with_untracked(|current| *current != next) {
		tooltip.set(next);
	}
}
